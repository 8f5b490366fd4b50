use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::json;

use super::decision::DecisionRequest;
use super::domain::{
    CandidateId, CandidateUpdate, NewCandidate, NewStaffUser, Role, StaffId, StaffIdentity, WaveId,
};
use super::error::PipelineError;
use super::evaluation::EvaluationRequest;
use super::forms::FormSubmission;
use super::repository::{CandidateRecord, InvitationNotifier, PipelineRepository, RepositoryError};
use super::service::RecruitmentPipeline;
use super::state::CandidateStatus;
use super::views::{CandidateView, PublicCandidateView};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

type Shared<R, N> = State<Arc<RecruitmentPipeline<R, N>>>;

/// Router exposing the public token endpoints and the staff endpoints.
/// Staff identity arrives already authenticated in the `x-user-id` and
/// `x-user-role` headers.
pub fn pipeline_router<R, N>(service: Arc<RecruitmentPipeline<R, N>>) -> Router
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/public/forms/:token",
            get(public_view_handler::<R, N>).put(submit_form_handler::<R, N>),
        )
        .route("/api/v1/me/capabilities", get(capabilities_handler::<R, N>))
        .route(
            "/api/v1/candidates",
            get(list_handler::<R, N>).post(create_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id",
            get(get_handler::<R, N>).patch(edit_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/invitation",
            post(invitation_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/contact",
            post(contact_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interview",
            post(schedule_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/attendance",
            post(attendance_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/no-show",
            post(no_show_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interviewed",
            post(interviewed_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/evaluation",
            put(evaluation_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/decision",
            post(decision_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/hire",
            post(hire_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/disqualify",
            post(disqualify_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/wave",
            put(wave_handler::<R, N>),
        )
        .route("/api/v1/stats", get(summary_handler::<R, N>))
        .route("/api/v1/rejected", get(rejected_handler::<R, N>))
        .route(
            "/api/v1/staff",
            get(list_staff_handler::<R, N>).post(create_staff_handler::<R, N>),
        )
        .route(
            "/api/v1/staff/:staff_id/reassign",
            post(reassign_handler::<R, N>),
        )
        .route(
            "/api/v1/staff/:staff_id/deactivate",
            post(deactivate_handler::<R, N>),
        )
        .with_state(service)
}

/// Reads the caller identity forwarded by the auth layer.
pub(crate) fn caller_from_headers(headers: &HeaderMap) -> Result<StaffIdentity, Response> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(Role::parse);

    match (user_id, role) {
        (Some(user_id), Some(role)) => Ok(StaffIdentity::new(user_id, role)),
        _ => {
            let payload = json!({
                "error": "unauthenticated",
                "message": "missing or invalid caller identity headers",
            });
            Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
        }
    }
}

pub(crate) fn error_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::InvalidToken(_) => StatusCode::NOT_FOUND,
        PipelineError::Validation { .. } | PipelineError::CatalogMismatch { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PipelineError::TransitionDenied { .. } => StatusCode::FORBIDDEN,
        PipelineError::Conflict { .. } | PipelineError::IncompleteEvaluation(_) => {
            StatusCode::CONFLICT
        }
        PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
        PipelineError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PipelineError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        PipelineError::Repository(_) => StatusCode::CONFLICT,
    }
}

pub(crate) fn error_response(err: PipelineError) -> Response {
    let status = error_status(&err);
    let payload = match &err {
        PipelineError::InvalidToken(_) => json!({
            "error": "invalid_token",
            "message": err.to_string(),
        }),
        PipelineError::Validation { field, reason } => json!({
            "error": "validation",
            "field": field,
            "reason": reason,
            "message": err.to_string(),
        }),
        PipelineError::TransitionDenied {
            from,
            requested,
            missing,
        } => json!({
            "error": "transition_denied",
            "from": from,
            "requested": requested,
            "missing": missing.to_string(),
            "message": err.to_string(),
        }),
        PipelineError::CatalogMismatch { detail } => json!({
            "error": "catalog_mismatch",
            "message": detail,
        }),
        PipelineError::Conflict { id } => json!({
            "error": "conflict",
            "id": id,
            "retryable": true,
            "message": err.to_string(),
        }),
        PipelineError::IncompleteEvaluation(id) => json!({
            "error": "incomplete_evaluation",
            "id": id,
            "message": err.to_string(),
        }),
        PipelineError::NotFound { entity, id } => json!({
            "error": "not_found",
            "entity": entity,
            "id": id,
        }),
        PipelineError::Repository(_) => json!({
            "error": "repository",
            "message": err.to_string(),
        }),
    };
    (status, Json(payload)).into_response()
}

fn staff_view<R, N>(service: &RecruitmentPipeline<R, N>, record: &CandidateRecord) -> CandidateView
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    CandidateView::from_record(record, &service.policy().machine)
}

fn respond<R, N>(
    service: &RecruitmentPipeline<R, N>,
    status: StatusCode,
    result: Result<CandidateRecord, PipelineError>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    match result {
        Ok(record) => (status, Json(staff_view(service, &record))).into_response(),
        Err(err) => error_response(err),
    }
}

macro_rules! caller_or_reject {
    ($headers:expr) => {
        match caller_from_headers(&$headers) {
            Ok(caller) => caller,
            Err(response) => return response,
        }
    };
}

pub(crate) async fn public_view_handler<R, N>(
    State(service): Shared<R, N>,
    Path(token): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    match service.validate_token(&token) {
        Ok(record) => (StatusCode::OK, Json(PublicCandidateView::from_record(&record))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_form_handler<R, N>(
    State(service): Shared<R, N>,
    Path(token): Path<String>,
    Json(submission): Json<FormSubmission>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    match service.submit_form(&token, submission) {
        Ok(record) => (StatusCode::OK, Json(PublicCandidateView::from_record(&record))).into_response(),
        Err(err) => error_response(err),
    }
}

async fn capabilities_handler<R, N>(State(service): Shared<R, N>, headers: HeaderMap) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    (StatusCode::OK, Json(service.capabilities(&caller))).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    estado: Option<CandidateStatus>,
}

async fn list_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    match service.list_candidates(&caller, query.estado) {
        Ok(records) => {
            let views: Vec<CandidateView> = records
                .iter()
                .map(|record| staff_view(&service, record))
                .collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Json(request): Json<NewCandidate>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.create_candidate(&caller, request);
    respond(&service, StatusCode::CREATED, result)
}

async fn get_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.get_candidate(&caller, &CandidateId(candidate_id));
    respond(&service, StatusCode::OK, result)
}

async fn edit_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    Json(update): Json<CandidateUpdate>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.edit_candidate(&caller, &CandidateId(candidate_id), update);
    respond(&service, StatusCode::OK, result)
}

async fn invitation_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    match service.send_form_invitation(&caller, &CandidateId(candidate_id)) {
        Ok(outcome) => {
            let payload = json!({
                "candidate": staff_view(&service, &outcome.record),
                "warning": outcome.warning,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContactRequest {
    #[serde(default)]
    observaciones: Option<String>,
}

async fn contact_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    Json(request): Json<ContactRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.register_contact(&caller, &CandidateId(candidate_id), request.observaciones);
    respond(&service, StatusCode::OK, result)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleRequest {
    fecha_citacion: NaiveDateTime,
}

async fn schedule_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    Json(request): Json<ScheduleRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result =
        service.schedule_interview(&caller, &CandidateId(candidate_id), request.fecha_citacion);
    respond(&service, StatusCode::OK, result)
}

async fn attendance_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.confirm_attendance(&caller, &CandidateId(candidate_id));
    respond(&service, StatusCode::OK, result)
}

async fn no_show_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.mark_no_show(&caller, &CandidateId(candidate_id));
    respond(&service, StatusCode::OK, result)
}

async fn interviewed_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.mark_interviewed(&caller, &CandidateId(candidate_id));
    respond(&service, StatusCode::OK, result)
}

pub(crate) async fn evaluation_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    Json(request): Json<EvaluationRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.record_evaluation(&caller, &CandidateId(candidate_id), request);
    respond(&service, StatusCode::OK, result)
}

pub(crate) async fn decision_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.record_decision(&caller, &CandidateId(candidate_id), request);
    respond(&service, StatusCode::OK, result)
}

async fn hire_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.confirm_hire(&caller, &CandidateId(candidate_id));
    respond(&service, StatusCode::OK, result)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DisqualifyRequest {
    #[serde(default)]
    motivo: Option<String>,
}

async fn disqualify_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    Json(request): Json<DisqualifyRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.disqualify(&caller, &CandidateId(candidate_id), request.motivo);
    respond(&service, StatusCode::OK, result)
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaveRequest {
    oleada: WaveId,
}

pub(crate) async fn wave_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    Json(request): Json<WaveRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let result = service.assign_wave(&caller, &CandidateId(candidate_id), request.oleada);
    respond(&service, StatusCode::OK, result)
}

async fn summary_handler<R, N>(State(service): Shared<R, N>, headers: HeaderMap) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    match service.summary(&caller) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn rejected_handler<R, N>(State(service): Shared<R, N>, headers: HeaderMap) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    match service.rejected_profiles(&caller) {
        Ok(profiles) => (StatusCode::OK, Json(profiles)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_staff_handler<R, N>(State(service): Shared<R, N>, headers: HeaderMap) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    match service.list_staff(&caller) {
        Ok(staff) => (StatusCode::OK, Json(staff)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_staff_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Json(request): Json<NewStaffUser>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    match service.create_staff(&caller, request) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReassignRequest {
    #[serde(default)]
    reclutador_destino: Option<StaffId>,
}

async fn reassign_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(staff_id): Path<String>,
    Json(request): Json<ReassignRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let Some(target) = request.reclutador_destino else {
        return error_response(PipelineError::missing("reclutador_destino"));
    };
    match service.reassign_candidates(&caller, &StaffId(staff_id), &target) {
        Ok(records) => {
            let moved: Vec<&CandidateId> = records.iter().map(|record| &record.candidate.id).collect();
            (StatusCode::OK, Json(json!({ "reasignados": moved }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Deactivates a recruiter; with `reclutador_destino` the candidates are
/// moved first in the same commit.
pub(crate) async fn deactivate_handler<R, N>(
    State(service): Shared<R, N>,
    headers: HeaderMap,
    Path(staff_id): Path<String>,
    Json(request): Json<ReassignRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    let caller = caller_or_reject!(headers);
    let staff_id = StaffId(staff_id);
    let result = match request.reclutador_destino {
        Some(target) => service.reassign_and_deactivate(&caller, &staff_id, &target),
        None => service.deactivate_recruiter(&caller, &staff_id),
    };
    match result {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => error_response(err),
    }
}
