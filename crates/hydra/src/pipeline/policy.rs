use chrono::Duration;

use super::catalog::Catalog;
use super::evaluation::{EvaluationConfig, EvaluationEngine};
use super::permissions::PermissionModel;
use super::state::StateMachine;
use super::token::DEFAULT_TOKEN_TTL_DAYS;

/// Immutable rule set built once at process start and shared by reference.
#[derive(Debug, Clone)]
pub struct PipelinePolicy {
    pub permissions: PermissionModel,
    pub machine: StateMachine,
    pub catalog: Catalog,
    pub evaluation: EvaluationEngine,
    pub token_ttl: Duration,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl PipelinePolicy {
    pub fn standard() -> Self {
        Self::with_catalog(Catalog::standard())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            permissions: PermissionModel::standard(),
            machine: StateMachine::standard(),
            catalog,
            evaluation: EvaluationEngine::new(EvaluationConfig::default()),
            token_ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}
