use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::DbConfig;

/// Runtime knobs for the engine. Every field has a default, so an empty
/// configuration file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Deadline for one whole compute or generate request.
    pub request_timeout_ms: u64,
    /// Deadline for each individual collaborator read.
    pub collaborator_timeout_ms: u64,
    /// Filers processed at once by bulk generation.
    pub bulk_concurrency: usize,
    pub database: DbConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            collaborator_timeout_ms: 5_000,
            bulk_concurrency: 4,
            database: DbConfig::default(),
        }
    }
}

impl EngineSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// At least one.
    pub fn bulk_concurrency(&self) -> usize {
        self.bulk_concurrency.max(1)
    }
}
