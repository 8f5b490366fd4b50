mod config;
mod rules;

pub use config::{EvaluationConfig, APPROVAL_THRESHOLD, MAX_SUBSCORE};
pub use rules::Criterion;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{non_blank, StaffId};
use super::error::PipelineError;

/// Raw scoring form. Sub-scores are optional here so that a missing one is
/// reported by field instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub saludo: Option<f64>,
    #[serde(default)]
    pub perfilamiento: Option<f64>,
    #[serde(default)]
    pub producto: Option<f64>,
    #[serde(default)]
    pub objeciones: Option<f64>,
    #[serde(default)]
    pub cierre: Option<f64>,
    #[serde(default)]
    pub razon_rechazo: Option<String>,
}

impl EvaluationRequest {
    pub fn from_scores(scores: [f64; 5]) -> Self {
        let [saludo, perfilamiento, producto, objeciones, cierre] = scores;
        Self {
            saludo: Some(saludo),
            perfilamiento: Some(perfilamiento),
            producto: Some(producto),
            objeciones: Some(objeciones),
            cierre: Some(cierre),
            razon_rechazo: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.razon_rechazo = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterviewScores {
    pub saludo: f64,
    pub perfilamiento: f64,
    pub producto: f64,
    pub objeciones: f64,
    pub cierre: f64,
}

impl InterviewScores {
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Saludo => self.saludo,
            Criterion::Perfilamiento => self.perfilamiento,
            Criterion::Producto => self.producto,
            Criterion::Objeciones => self.objeciones,
            Criterion::Cierre => self.cierre,
        }
    }

    pub fn total(&self) -> f64 {
        let hundredths: u32 = Criterion::ordered()
            .into_iter()
            .map(|criterion| rules::hundredths(self.get(criterion)))
            .sum();
        f64::from(hundredths) / 100.0
    }
}

/// Complete, recorded interview evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewEvaluation {
    pub scores: InterviewScores,
    pub total: f64,
    pub aprobado: bool,
    pub razon_rechazo: Option<String>,
    pub evaluated_by: StaffId,
    pub evaluated_at: DateTime<Utc>,
}

/// Stateless scorer applying the rubric configuration to a request.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn is_passing(&self, total: f64) -> bool {
        rules::hundredths(total) >= rules::hundredths(self.config.approval_threshold)
    }

    /// Scores a request. Partial requests are rejected, and a failing total
    /// requires a rejection reason.
    pub fn score(
        &self,
        request: EvaluationRequest,
        evaluated_by: StaffId,
        evaluated_at: DateTime<Utc>,
    ) -> Result<InterviewEvaluation, PipelineError> {
        let scores = rules::collect_scores(&request, &self.config)?;
        let total = scores.total();
        let aprobado = self.is_passing(total);
        let razon_rechazo = non_blank(request.razon_rechazo);

        if !aprobado && razon_rechazo.is_none() {
            return Err(PipelineError::missing("razon_rechazo"));
        }

        Ok(InterviewEvaluation {
            scores,
            total,
            aprobado,
            razon_rechazo,
            evaluated_by,
            evaluated_at,
        })
    }
}
