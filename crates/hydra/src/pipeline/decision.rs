use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{non_blank, StaffId};
use super::error::PipelineError;
use super::state::Transition;

/// Final verdict submitted by a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub aprobado: bool,
    #[serde(default)]
    pub justificacion: Option<String>,
}

impl DecisionRequest {
    pub fn approve() -> Self {
        Self {
            aprobado: true,
            justificacion: None,
        }
    }

    pub fn reject(justificacion: impl Into<String>) -> Self {
        Self {
            aprobado: false,
            justificacion: Some(justificacion.into()),
        }
    }
}

/// Recorded final decision. Once set it is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalDecision {
    pub aprobado: bool,
    pub justificacion: Option<String>,
    pub decided_by: StaffId,
    pub decided_at: DateTime<Utc>,
}

impl FinalDecision {
    /// Validates the request; a rejection needs non-blank justification.
    pub fn from_request(
        request: DecisionRequest,
        decided_by: StaffId,
        decided_at: DateTime<Utc>,
    ) -> Result<Self, PipelineError> {
        let justificacion = non_blank(request.justificacion);
        if !request.aprobado && justificacion.is_none() {
            return Err(PipelineError::missing("justificacion"));
        }

        Ok(Self {
            aprobado: request.aprobado,
            justificacion,
            decided_by,
            decided_at,
        })
    }

    pub fn transition(&self) -> Transition {
        if self.aprobado {
            Transition::AprobarFinal
        } else {
            Transition::RechazarFinal
        }
    }
}
