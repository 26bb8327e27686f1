//! Recover the candidate list from a free-form oracle reply.

use serde_json::Value;
use tracing::{debug, warn};

const EXCERPT_CHARS: usize = 200;

/// The reply held no usable JSON payload. Recoverable: the pass applies nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("oracle reply is empty")]
    Empty,

    #[error("no JSON list or object found in oracle reply")]
    NoStructure,

    #[error("oracle payload is not valid JSON: {0}")]
    Malformed(String),
}

/// Extract the candidate list from `raw`.
///
/// A JSON array is decoded starting at the first `[`. If there is none, or
/// it does not decode, one object is decoded starting at the first `{` and
/// wrapped into a single-element list. Decoding stops at the end of the
/// first complete value, so prose and code fences on either side are ignored.
pub fn parse_candidates(raw: &str) -> Result<Vec<Value>, PayloadError> {
    if raw.trim().is_empty() {
        return Err(PayloadError::Empty);
    }

    let list_err = match first_value(raw, '[') {
        Some(Ok(Value::Array(items))) => {
            debug!(count = items.len(), "decoded candidate list");
            return Ok(items);
        }
        Some(Ok(_)) | None => None,
        Some(Err(err)) => Some(err),
    };

    let object_err = match first_value(raw, '{') {
        Some(Ok(object @ Value::Object(_))) => {
            debug!("oracle returned a single object; wrapping it in a list");
            return Ok(vec![object]);
        }
        Some(Ok(_)) | None => None,
        Some(Err(err)) => Some(err),
    };

    match list_err.or(object_err) {
        Some(err) => {
            warn!(%err, excerpt = %excerpt(raw), "oracle payload failed to decode");
            Err(PayloadError::Malformed(err.to_string()))
        }
        None => {
            warn!(excerpt = %excerpt(raw), "no JSON structure in oracle reply");
            Err(PayloadError::NoStructure)
        }
    }
}

/// Decode the first JSON value starting at the first `open` in `raw`.
fn first_value(raw: &str, open: char) -> Option<serde_json::Result<Value>> {
    let start = raw.find(open)?;
    serde_json::Deserializer::from_str(&raw[start..])
        .into_iter::<Value>()
        .next()
}

/// First few characters of `raw`, for logs and error reports.
#[must_use]
pub fn excerpt(raw: &str) -> String {
    let mut out: String = raw.chars().take(EXCERPT_CHARS).collect();
    if raw.chars().count() > EXCERPT_CHARS {
        out.push_str("...");
    }
    out
}
