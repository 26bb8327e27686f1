//! The language-model collaborator.
//!
//! The oracle is a black box: chat messages in, text out. One blocking call
//! per pass, no retries, no streaming. [`payload::parse_candidates`] turns
//! its reply into the candidate list the reconciler consumes.

pub mod openai;
pub mod payload;
pub mod prompt;

pub use openai::OpenAiOracle;
pub use payload::{PayloadError, parse_candidates};

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Failure of the oracle call itself. Fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Transport(String),

    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("oracle response had no message content")]
    EmptyResponse,

    #[error("environment variable {0} is not set")]
    MissingApiKey(String),
}

impl OracleError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) | Self::Status { .. } => ErrorCode::OracleTransport,
            Self::EmptyResponse => ErrorCode::OracleEmptyResponse,
            Self::MissingApiKey(_) => ErrorCode::OracleMissingCredentials,
        }
    }
}

/// A synchronous text-completion service.
pub trait Oracle {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, OracleError>;
}

impl<T: Oracle + ?Sized> Oracle for &T {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, OracleError> {
        (**self).complete(messages)
    }
}

/// Oracle constructed on its first call.
///
/// Runs that never reach the oracle (blank notes, empty projects) do not need
/// its configuration to be valid. A failed build is remembered and returned
/// on every call.
pub struct LazyOracle<O, F> {
    build: F,
    inner: OnceCell<Result<O, OracleError>>,
}

impl<O, F> LazyOracle<O, F>
where
    F: Fn() -> Result<O, OracleError>,
{
    pub const fn new(build: F) -> Self {
        Self {
            build,
            inner: OnceCell::new(),
        }
    }

    /// Whether the inner oracle has been built (or failed to build).
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl<O, F> Oracle for LazyOracle<O, F>
where
    O: Oracle,
    F: Fn() -> Result<O, OracleError>,
{
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, OracleError> {
        match self.inner.get_or_init(&self.build) {
            Ok(oracle) => oracle.complete(messages),
            Err(err) => Err(err.clone()),
        }
    }
}

/// Oracle that replays queued replies, for tests and dry runs.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedOracle {
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = Result<String, OracleError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Oracle that answers every call with `reply` once.
    #[must_use]
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new([Ok(reply.into())])
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.seen.lock().map_or(0, |seen| seen.len())
    }

    /// Messages of every call received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl Oracle for ScriptedOracle {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, OracleError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        self.replies
            .lock()
            .map_err(|_| OracleError::Transport("scripted oracle poisoned".into()))?
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("no scripted reply left".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_oracle_replays_in_order() {
        let oracle = ScriptedOracle::new([Ok("first".to_string()), Err(OracleError::EmptyResponse)]);
        let msg = [ChatMessage::new(Role::User, "hi")];
        assert_eq!(oracle.complete(&msg).unwrap(), "first");
        assert_eq!(oracle.complete(&msg), Err(OracleError::EmptyResponse));
        assert!(matches!(oracle.complete(&msg), Err(OracleError::Transport(_))));
        assert_eq!(oracle.call_count(), 3);
        assert_eq!(oracle.requests()[0][0].content, "hi");
    }

    #[test]
    fn lazy_oracle_builds_on_first_call_only() {
        let builds = std::cell::Cell::new(0);
        let oracle = LazyOracle::new(|| {
            builds.set(builds.get() + 1);
            Ok(ScriptedOracle::new([Ok("a".to_string()), Ok("b".to_string())]))
        });
        assert!(!oracle.is_built());

        let msg = [ChatMessage::new(Role::User, "hi")];
        assert_eq!(oracle.complete(&msg).unwrap(), "a");
        assert_eq!(oracle.complete(&msg).unwrap(), "b");
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn lazy_oracle_repeats_build_failure() {
        let oracle = LazyOracle::new(|| -> Result<ScriptedOracle, OracleError> {
            Err(OracleError::MissingApiKey("KEY".into()))
        });
        let msg = [ChatMessage::new(Role::User, "hi")];
        assert_eq!(
            oracle.complete(&msg),
            Err(OracleError::MissingApiKey("KEY".into()))
        );
        assert!(oracle.is_built());
    }

    #[test]
    fn chat_message_serializes_openai_style() {
        let msg = ChatMessage::new(Role::System, "be brief");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "system");
        assert_eq!(value["content"], "be brief");
    }

    #[test]
    fn error_codes_map_to_oracle_family() {
        assert_eq!(
            OracleError::Status {
                status: 500,
                body: String::new()
            }
            .code(),
            ErrorCode::OracleTransport
        );
        assert_eq!(
            OracleError::MissingApiKey("X".into()).code(),
            ErrorCode::OracleMissingCredentials
        );
    }
}
