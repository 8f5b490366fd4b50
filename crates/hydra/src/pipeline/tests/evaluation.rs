use chrono::Utc;

use crate::pipeline::domain::StaffId;
use crate::pipeline::error::PipelineError;
use crate::pipeline::evaluation::{EvaluationEngine, EvaluationRequest};

use super::common::*;

fn engine() -> EvaluationEngine {
    EvaluationEngine::default()
}

fn score(request: EvaluationRequest) -> Result<crate::pipeline::InterviewEvaluation, PipelineError> {
    engine().score(request, StaffId("sel-1".to_string()), Utc::now())
}

#[test]
fn total_is_the_sum_of_subscores() {
    let evaluation = score(passing_scores()).expect("valid scores");

    assert_eq!(evaluation.total, 73.0);
    assert!(evaluation.aprobado);
    assert!(evaluation.razon_rechazo.is_none());
}

#[test]
fn threshold_is_inclusive() {
    let at_threshold = score(EvaluationRequest::from_scores([15.0, 14.0, 14.0, 14.0, 14.0]))
        .expect("71 passes");
    assert_eq!(at_threshold.total, 71.0);
    assert!(at_threshold.aprobado);

    let below = score(
        EvaluationRequest::from_scores([15.0, 14.0, 14.0, 14.0, 13.5]).with_reason("cierre debil"),
    )
    .expect("70.5 with reason");
    assert!(!below.aprobado);
}

#[test]
fn decimal_subscores_reaching_threshold_pass() {
    let evaluation = score(EvaluationRequest::from_scores([10.1, 10.2, 19.4, 15.7, 15.6]))
        .expect("exactly 71");
    assert_eq!(evaluation.total, 71.0);
    assert!(evaluation.aprobado);

    let below = score(
        EvaluationRequest::from_scores([10.1, 10.2, 19.4, 15.7, 15.59]).with_reason("cierre"),
    )
    .expect("70.99 with reason");
    assert_eq!(below.total, 70.99);
    assert!(!below.aprobado);
}

#[test]
fn failing_total_requires_reason() {
    let err = score(failing_scores()).expect_err("reason missing");
    assert!(matches!(
        err,
        PipelineError::Validation { ref field, .. } if field == "razon_rechazo"
    ));

    let evaluation = score(failing_scores().with_reason("  objeciones sin manejo  "))
        .expect("reason supplied");
    assert_eq!(
        evaluation.razon_rechazo.as_deref(),
        Some("objeciones sin manejo")
    );
}

#[test]
fn partial_evaluation_names_the_missing_criterion() {
    let mut request = passing_scores();
    request.objeciones = None;

    let err = score(request).expect_err("partial");
    assert!(matches!(
        err,
        PipelineError::Validation { ref field, .. } if field == "objeciones"
    ));
}

#[test]
fn subscores_outside_range_are_rejected() {
    for bad in [-1.0, 20.5, f64::NAN] {
        let mut request = passing_scores();
        request.cierre = Some(bad);
        assert!(score(request).is_err(), "{bad}");
    }

    let perfect = score(EvaluationRequest::from_scores([20.0; 5])).expect("max scores");
    assert_eq!(perfect.total, 100.0);
}
