pub mod completions;
pub mod config;
pub mod list;
pub mod process;
pub mod show;
pub mod summary;

use crate::output::OutputMode;
use actrack_core::config::TrackerConfig;
use actrack_core::error::ErrorCode;
use actrack_core::lock::LockError;
use actrack_core::model::ActionItem;
use actrack_core::oracle::{LazyOracle, OpenAiOracle, OracleError};
use actrack_core::persist::{ItemRepository, JsonFileRepository, PersistError};
use actrack_core::store::{ItemStore, StoreError};
use actrack_core::tracker::TrackerError;
use anyhow::Context as _;

/// Resolved settings shared by every command.
#[derive(Debug)]
pub struct Context {
    pub config: TrackerConfig,
    pub output: OutputMode,
}

impl Context {
    pub fn repo(&self) -> JsonFileRepository {
        JsonFileRepository::new(self.config.storage.resolved_data_dir())
    }

    /// Model client, built only once a command actually calls it.
    pub fn oracle(
        &self,
    ) -> LazyOracle<OpenAiOracle, impl Fn() -> Result<OpenAiOracle, OracleError> + '_> {
        LazyOracle::new(|| OpenAiOracle::from_config(&self.config.oracle))
    }

    /// Load `project` and check it is internally consistent.
    pub fn load_store(&self, project: &str) -> anyhow::Result<ItemStore> {
        let items = self.repo().load(project)?;
        ItemStore::from_items(project, items)
            .with_context(|| format!("project '{project}' has inconsistent items"))
    }
}

/// Stable code of the first coded error in `err`'s chain.
pub fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<TrackerError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<PersistError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<OracleError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<LockError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<StoreError>() {
            Some(e.code())
        } else if cause.downcast_ref::<toml::de::Error>().is_some() {
            Some(ErrorCode::ConfigParseError)
        } else {
            None
        }
    })
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

pub fn item_json(item: &ActionItem) -> serde_json::Result<String> {
    serde_json::to_string(item)
}
