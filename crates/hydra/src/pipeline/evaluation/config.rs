use serde::{Deserialize, Serialize};

pub const APPROVAL_THRESHOLD: f64 = 71.0;
pub const MAX_SUBSCORE: f64 = 20.0;

/// Rubric bounds applied to every interview evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub approval_threshold: f64,
    pub max_subscore: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            approval_threshold: APPROVAL_THRESHOLD,
            max_subscore: MAX_SUBSCORE,
        }
    }
}
