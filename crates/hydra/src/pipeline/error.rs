use std::fmt;

use super::domain::{CandidateId, Role};
use super::permissions::Permission;
use super::repository::RepositoryError;
use super::state::{MachineRefusal, Precondition};
use super::token::TokenError;

/// What blocked a transition or a guarded staff operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeniedBy {
    Permission(Permission),
    RoleNotGranted(Role),
    AutomaticOnly,
    SourceState,
    Precondition(Precondition),
    Rule(String),
}

impl fmt::Display for DeniedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeniedBy::Permission(permission) => {
                write!(f, "missing permission `{}`", permission.label())
            }
            DeniedBy::RoleNotGranted(role) => {
                write!(f, "role `{}` may not fire this transition", role.label())
            }
            DeniedBy::AutomaticOnly => write!(f, "transition is only fired by the pipeline"),
            DeniedBy::SourceState => write!(f, "not allowed from the current status"),
            DeniedBy::Precondition(precondition) => f.write_str(precondition.label()),
            DeniedBy::Rule(detail) => f.write_str(detail),
        }
    }
}

impl From<MachineRefusal> for DeniedBy {
    fn from(value: MachineRefusal) -> Self {
        match value {
            MachineRefusal::UnknownTransition | MachineRefusal::SourceState => {
                DeniedBy::SourceState
            }
            MachineRefusal::Precondition(precondition) => DeniedBy::Precondition(precondition),
        }
    }
}

/// Typed failure of any pipeline operation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidToken(#[from] TokenError),
    #[error("invalid field `{field}`: {reason}")]
    Validation { field: String, reason: String },
    #[error("`{requested}` denied from `{from}`: {missing}")]
    TransitionDenied {
        from: String,
        requested: String,
        missing: DeniedBy,
    },
    #[error("catalog mismatch: {detail}")]
    CatalogMismatch { detail: String },
    #[error("{id} was modified concurrently; re-read and retry")]
    Conflict { id: String },
    #[error("candidate {0} has no complete interview evaluation")]
    IncompleteEvaluation(CandidateId),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Repository(RepositoryError),
}

impl PipelineError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: "required".to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn denied(
        from: impl fmt::Display,
        requested: impl fmt::Display,
        missing: DeniedBy,
    ) -> Self {
        Self::TransitionDenied {
            from: from.to_string(),
            requested: requested.to_string(),
            missing,
        }
    }

    pub(crate) fn candidate_not_found(id: &CandidateId) -> Self {
        Self::NotFound {
            entity: "candidate",
            id: id.0.clone(),
        }
    }

    /// Only stale-version conflicts are meant to be retried by re-reading.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<RepositoryError> for PipelineError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::StaleVersion { id, .. } | RepositoryError::RecruiterChanged { id } => {
                Self::Conflict { id }
            }
            other => Self::Repository(other),
        }
    }
}
