use std::fmt;

use serde::{Deserialize, Serialize};

use super::super::error::PipelineError;
use super::config::EvaluationConfig;
use super::{EvaluationRequest, InterviewScores};

/// The five interview criteria, in rubric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Saludo,
    Perfilamiento,
    Producto,
    Objeciones,
    Cierre,
}

impl Criterion {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Saludo,
            Self::Perfilamiento,
            Self::Producto,
            Self::Objeciones,
            Self::Cierre,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Saludo => "saludo",
            Self::Perfilamiento => "perfilamiento",
            Self::Producto => "producto",
            Self::Objeciones => "objeciones",
            Self::Cierre => "cierre",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn requested(request: &EvaluationRequest, criterion: Criterion) -> Option<f64> {
    match criterion {
        Criterion::Saludo => request.saludo,
        Criterion::Perfilamiento => request.perfilamiento,
        Criterion::Producto => request.producto,
        Criterion::Objeciones => request.objeciones,
        Criterion::Cierre => request.cierre,
    }
}

/// Score expressed in hundredths of a point. Totals and the threshold are
/// compared on this grid so decimal sub-scores add up exactly.
pub(crate) fn hundredths(value: f64) -> u32 {
    (value * 100.0).round() as u32
}

/// Every sub-score must be present, finite, and within `0..=max_subscore`.
/// Values are kept to two decimals.
pub(crate) fn collect_scores(
    request: &EvaluationRequest,
    config: &EvaluationConfig,
) -> Result<InterviewScores, PipelineError> {
    let mut values = [0.0_f64; 5];

    for (slot, criterion) in values.iter_mut().zip(Criterion::ordered()) {
        let value = requested(request, criterion)
            .ok_or_else(|| PipelineError::missing(criterion.label()))?;

        if !value.is_finite() || !(0.0..=config.max_subscore).contains(&value) {
            return Err(PipelineError::invalid(
                criterion.label(),
                format!("must be between 0 and {}", config.max_subscore),
            ));
        }
        *slot = f64::from(hundredths(value)) / 100.0;
    }

    let [saludo, perfilamiento, producto, objeciones, cierre] = values;
    Ok(InterviewScores {
        saludo,
        perfilamiento,
        producto,
        objeciones,
        cierre,
    })
}
