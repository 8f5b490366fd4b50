use crate::pipeline::domain::{CandidateId, Role, StaffId};
use crate::pipeline::error::{DeniedBy, PipelineError};
use crate::pipeline::repository::{PipelineRepository, ReassignmentBatch, RepositoryError};

use super::common::*;

fn rec(id: &str) -> StaffId {
    StaffId(id.to_string())
}

#[test]
fn recruiter_with_candidates_cannot_be_deactivated() {
    let harness = harness();
    for _ in 0..3 {
        create(&harness);
    }

    let err = harness
        .service
        .deactivate_recruiter(&admin(), &rec("rec-1"))
        .expect_err("candidates still assigned");
    match err {
        PipelineError::TransitionDenied {
            missing: DeniedBy::Rule(message),
            ..
        } => assert!(message.starts_with("3 candidate(s)"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }

    let user = harness
        .repository
        .fetch_staff(&rec("rec-1"))
        .expect("fetch")
        .expect("present");
    assert!(user.activo);
}

#[test]
fn reassign_then_deactivate() {
    let harness = harness();
    let ids: Vec<_> = (0..3).map(|_| create(&harness).candidate.id).collect();

    let moved = harness
        .service
        .reassign_candidates(&admin(), &rec("rec-1"), &rec("rec-2"))
        .expect("reassigned");
    assert_eq!(moved.len(), 3);

    let user = harness
        .service
        .deactivate_recruiter(&admin(), &rec("rec-1"))
        .expect("deactivated");
    assert!(!user.activo);

    for id in &ids {
        let record = harness
            .service
            .get_candidate(&selector(), id)
            .expect("candidate");
        assert_eq!(record.candidate.process.reclutador, rec("rec-2"));
        assert_eq!(record.version, 1);
    }
}

#[test]
fn reassign_and_deactivate_in_one_commit() {
    let harness = harness();
    let first = create(&harness).candidate.id;
    create(&harness);

    let user = harness
        .service
        .reassign_and_deactivate(&selector(), &rec("rec-1"), &rec("rec-2"))
        .expect("seleccion manages users");
    assert!(!user.activo);

    let record = harness
        .service
        .get_candidate(&recruiter(), &first)
        .expect("candidate");
    assert_eq!(record.candidate.process.reclutador, rec("rec-2"));
}

#[test]
fn reassignment_target_must_be_an_active_recruiter() {
    let harness = harness();
    create(&harness);

    for target in ["sel-1", "rec-1", "nobody"] {
        let err = harness
            .service
            .reassign_and_deactivate(&admin(), &rec("rec-1"), &rec(target))
            .expect_err("bad target");
        assert!(
            matches!(
                err,
                PipelineError::Validation { .. } | PipelineError::NotFound { .. }
            ),
            "{target}: {err:?}"
        );
    }

    let user = harness
        .repository
        .fetch_staff(&rec("rec-1"))
        .expect("fetch")
        .expect("present");
    assert!(user.activo);
}

#[test]
fn deactivated_recruiter_cannot_receive_candidates() {
    let harness = harness();
    harness
        .service
        .deactivate_recruiter(&admin(), &rec("rec-2"))
        .expect("no candidates assigned");
    create(&harness);

    let err = harness
        .service
        .reassign_candidates(&admin(), &rec("rec-1"), &rec("rec-2"))
        .expect_err("inactive target");
    assert!(matches!(err, PipelineError::Validation { .. }));
}

#[test]
fn only_administrador_creates_administradores() {
    let harness = harness();

    let err = harness
        .service
        .create_staff(&selector(), new_staff("adm-2", Role::Administrador))
        .expect_err("seleccion cannot mint admins");
    assert!(matches!(err, PipelineError::TransitionDenied { .. }));

    let created = harness
        .service
        .create_staff(&selector(), new_staff("rec-3", Role::Reclutador))
        .expect("seleccion creates recruiters");
    assert!(created.activo);

    harness
        .service
        .create_staff(&admin(), new_staff("adm-2", Role::Administrador))
        .expect("admin creates admins");

    let err = harness
        .service
        .create_staff(&recruiter(), new_staff("rec-4", Role::Reclutador))
        .expect_err("recruiters do not manage users");
    assert!(matches!(err, PipelineError::TransitionDenied { .. }));
}

#[test]
fn duplicate_staff_is_a_conflict() {
    let harness = harness();
    let err = harness
        .service
        .create_staff(&admin(), new_staff("rec-1", Role::Reclutador))
        .expect_err("already exists");
    assert!(matches!(err, PipelineError::Conflict { ref id } if id == "rec-1"));
}

#[test]
fn staff_email_is_validated() {
    let harness = harness();
    let mut request = new_staff("rec-9", Role::Reclutador);
    request.email = "not-an-address".to_string();

    let err = harness
        .service
        .create_staff(&admin(), request)
        .expect_err("invalid email");
    assert!(matches!(err, PipelineError::Validation { ref field, .. } if field == "email"));
    assert_eq!(harness.service.list_staff(&admin()).expect("list").len(), 4);
}

#[test]
fn only_recruiters_can_be_deactivated() {
    let harness = harness();

    for target in ["adm-1", "sel-1"] {
        let err = harness
            .service
            .deactivate_recruiter(&selector(), &rec(target))
            .expect_err("not a recruiter");
        assert!(
            matches!(
                err,
                PipelineError::TransitionDenied {
                    missing: DeniedBy::Rule(_),
                    ..
                }
            ),
            "{target}: {err:?}"
        );
        let user = harness
            .repository
            .fetch_staff(&rec(target))
            .expect("fetch")
            .expect("present");
        assert!(user.activo, "{target} stays active");
    }

    let err = harness
        .service
        .reassign_and_deactivate(&selector(), &rec("adm-1"), &rec("rec-2"))
        .expect_err("administrador is not a recruiter");
    assert!(matches!(err, PipelineError::TransitionDenied { .. }));
}

#[test]
fn deactivated_recruiter_cannot_create_candidates() {
    let harness = harness();
    harness
        .service
        .deactivate_recruiter(&admin(), &rec("rec-2"))
        .expect("no candidates assigned");

    let err = harness
        .service
        .create_candidate(&other_recruiter(), new_candidate())
        .expect_err("inactive recruiter");
    assert!(matches!(
        err,
        PipelineError::TransitionDenied {
            missing: DeniedBy::Rule(_),
            ..
        }
    ));
    assert!(harness.repository.candidates().expect("list").is_empty());
}

#[test]
fn deactivation_commit_refuses_candidates_assigned_after_read() {
    let harness = harness();
    let stale_batch = ReassignmentBatch {
        updates: Vec::new(),
        deactivate: Some(rec("rec-1")),
    };
    // Assigned between the emptiness check and the commit.
    create(&harness);

    let err = harness
        .repository
        .commit_reassignment(stale_batch)
        .expect_err("recruiter gained a candidate");
    assert!(matches!(err, RepositoryError::RecruiterChanged { ref id } if id == "rec-1"));

    let as_pipeline: PipelineError = err.into();
    assert!(as_pipeline.is_retryable());
    let user = harness
        .repository
        .fetch_staff(&rec("rec-1"))
        .expect("fetch")
        .expect("present");
    assert!(user.activo);
}

#[test]
fn inserting_for_an_inactive_recruiter_is_refused() {
    let harness = harness();
    let mut record = create(&harness);
    harness
        .service
        .reassign_and_deactivate(&admin(), &rec("rec-1"), &rec("rec-2"))
        .expect("deactivated");

    record.candidate.id = CandidateId("late-arrival".to_string());
    let err = harness
        .repository
        .insert_candidate(record)
        .expect_err("recruiter already inactive");
    assert!(matches!(err, RepositoryError::RecruiterChanged { ref id } if id == "rec-1"));
}
