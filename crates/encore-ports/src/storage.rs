use crate::settings::CompareSettings;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SettingsDto {
    pub compare: CompareSettings,
    /// Fail a comparison when either side decodes to zero notes.
    pub require_non_empty: bool,
    /// `tracing_subscriber` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;
}
