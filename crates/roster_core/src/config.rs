//! Startup configuration and backend selection.
//!
//! # Responsibility
//! - Load layered settings (optional TOML file, then `ROSTER_*` environment).
//! - Build the configured repository once and hand it to the service.
//!
//! # Invariants
//! - Backend selection happens here only; the service never inspects which
//!   backend it holds.
//! - The `sqlite` backend requires `storage.db_path`.

use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::repo::memory_repo::MemoryStudentRepository;
use crate::repo::sqlite_repo::SqliteStudentRepository;
use crate::repo::student_repo::{RepoError, StudentRepository};
use crate::service::student_service::StudentService;
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable prefix, e.g. `ROSTER_STORAGE__BACKEND=sqlite`.
pub const ENV_PREFIX: &str = "ROSTER";

/// Service over whichever backend the configuration selected.
pub type DynStudentService = StudentService<Box<dyn StudentRepository>>;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("storage.db_path is required for the sqlite backend")]
    MissingDbPath,
    #[error("failed to open storage: {0}")]
    Storage(#[from] RepoError),
    #[error("failed to start logging: {0}")]
    Logging(#[from] LoggingError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file for the `sqlite` backend.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_level() -> String {
    default_log_level().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl RosterConfig {
    /// Loads settings from `path` (if it exists) overlaid with environment
    /// variables.
    pub fn load(path: Option<&Path>) -> Result<Self, SetupError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Starts file logging when `log.dir` is set. Returns whether it did.
    pub fn init_logging(&self) -> Result<bool, SetupError> {
        match &self.log.dir {
            Some(dir) => {
                init_logging(&self.log.level, dir)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Builds the configured repository.
    pub fn open_repository(&self) -> Result<Box<dyn StudentRepository>, SetupError> {
        let repo: Box<dyn StudentRepository> = match self.storage.backend {
            StorageBackend::Memory => Box::new(MemoryStudentRepository::new()),
            StorageBackend::Sqlite => {
                let path = self
                    .storage
                    .db_path
                    .as_deref()
                    .ok_or(SetupError::MissingDbPath)?;
                Box::new(SqliteStudentRepository::open(path)?)
            }
        };
        info!(
            "event=storage_open module=config status=ok backend={:?}",
            self.storage.backend
        );
        Ok(repo)
    }

    /// Builds the service over the configured repository.
    pub fn open_service(&self) -> Result<DynStudentService, SetupError> {
        Ok(StudentService::new(self.open_repository()?))
    }
}
