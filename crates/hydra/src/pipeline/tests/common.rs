use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::pipeline::domain::{
    CandidateId, NewCandidate, NewStaffUser, Role, StaffId, StaffIdentity, StaffUser,
};
use crate::pipeline::evaluation::EvaluationRequest;
use crate::pipeline::forms::{
    Consentimiento, DatosBasicos, Estudios, Experiencia, FormSubmission, HojaVida,
    KnowledgeLevel, Personal,
};
use crate::pipeline::memory::InMemoryPipelineRepository;
use crate::pipeline::policy::PipelinePolicy;
use crate::pipeline::repository::{
    CandidateRecord, FormInvitation, InvitationNotifier, NotifyError, PipelineRepository,
    ReassignmentBatch, RepositoryError,
};
use crate::pipeline::service::RecruitmentPipeline;
use crate::pipeline::token::ManualClock;

pub(super) type MemoryPipeline = RecruitmentPipeline<InMemoryPipelineRepository, MemoryNotifier>;

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn interview_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .expect("valid interview time")
}

pub(super) fn recruiter() -> StaffIdentity {
    StaffIdentity::new("rec-1", Role::Reclutador)
}

pub(super) fn other_recruiter() -> StaffIdentity {
    StaffIdentity::new("rec-2", Role::Reclutador)
}

pub(super) fn selector() -> StaffIdentity {
    StaffIdentity::new("sel-1", Role::Seleccion)
}

pub(super) fn admin() -> StaffIdentity {
    StaffIdentity::new("adm-1", Role::Administrador)
}

fn staff_user(identity: &StaffIdentity) -> StaffUser {
    StaffUser {
        id: identity.user_id.clone(),
        nombre_completo: format!("Usuario {}", identity.user_id),
        email: format!("{}@example.com", identity.user_id),
        role: identity.role,
        activo: true,
    }
}

pub(super) struct Harness {
    pub(super) service: MemoryPipeline,
    pub(super) repository: Arc<InMemoryPipelineRepository>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) clock: Arc<ManualClock>,
}

pub(super) fn harness() -> Harness {
    harness_with_notifier(MemoryNotifier::default())
}

pub(super) fn harness_with_notifier(notifier: MemoryNotifier) -> Harness {
    let repository = Arc::new(InMemoryPipelineRepository::new());
    for identity in [recruiter(), other_recruiter(), selector(), admin()] {
        repository
            .insert_staff(staff_user(&identity))
            .expect("seed staff");
    }

    let notifier = Arc::new(notifier);
    let clock = Arc::new(ManualClock::new(start()));
    let service = RecruitmentPipeline::new(
        Arc::new(PipelinePolicy::standard()),
        repository.clone(),
        notifier.clone(),
    )
    .with_clock(clock.clone());

    Harness {
        service,
        repository,
        notifier,
        clock,
    }
}

pub(super) fn new_candidate() -> NewCandidate {
    NewCandidate {
        nacionalidad: "Colombiana".to_string(),
        tipo_documento: Some("CC".to_string()),
        numero_documento: Some("1020304050".to_string()),
        primer_nombre: "Laura".to_string(),
        primer_apellido: "Gomez".to_string(),
        email_personal: Some("laura.gomez@example.com".to_string()),
        numero_celular: "3001234567".to_string(),
        ciudad: "Bogota".to_string(),
        cliente: "Claro".to_string(),
        cargo: "Agente Call Center".to_string(),
        fuente_reclutamiento: "Computrabajo".to_string(),
        ..NewCandidate::default()
    }
}

pub(super) fn new_staff(id: &str, role: Role) -> NewStaffUser {
    NewStaffUser {
        id: StaffId(id.to_string()),
        nombre_completo: format!("Usuario {id}"),
        email: format!("{id}@example.com"),
        role,
    }
}

pub(super) fn hoja_vida() -> FormSubmission {
    FormSubmission::HojaVida(HojaVida {
        estado_civil: Some("Soltera".to_string()),
    })
}

pub(super) fn datos_basicos() -> FormSubmission {
    FormSubmission::DatosBasicos(DatosBasicos {
        genero: Some("Femenino".to_string()),
        fecha_nacimiento: NaiveDate::from_ymd_opt(1998, 6, 14),
        grupo_sanguineo: Some("O+".to_string()),
        eps: Some("Sanitas".to_string()),
        afp: Some("Porvenir".to_string()),
        nombre_emergencia: Some("Marta Gomez".to_string()),
        numero_emergencia: Some("3109876543".to_string()),
        parentesco_emergencia: Some("Madre".to_string()),
        ..DatosBasicos::default()
    })
}

pub(super) fn estudios() -> FormSubmission {
    FormSubmission::Estudios(Estudios {
        nivel_estudios: Some("Tecnico".to_string()),
        titulo_obtenido: Some("Tecnico en ventas".to_string()),
        nombre_institucion: Some("SENA".to_string()),
        ano_finalizacion: Some(2019),
    })
}

pub(super) fn experiencia() -> Experiencia {
    Experiencia {
        nombre_empresa: Some("Contact Center SAS".to_string()),
        cargo_desempenado: Some("Asesor comercial".to_string()),
        salario_experiencia: Some(1_300_000),
        fecha_inicio_experiencia: NaiveDate::from_ymd_opt(2020, 2, 1),
        fecha_retiro_experiencia: NaiveDate::from_ymd_opt(2023, 8, 15),
        motivo_retiro: Some("Fin de contrato".to_string()),
        experiencia_comercial_certificada: Some(true),
        experiencia_comercial_no_certificada: Some(false),
        primer_empleo_formal: Some(false),
        ha_trabajado_asiste: Some(false),
    }
}

pub(super) fn personal() -> FormSubmission {
    FormSubmission::Personal(Personal {
        fortalezas: Some("Comunicacion".to_string()),
        aspectos_mejorar: Some("Puntualidad".to_string()),
        competencias_laborales: Some("Negociacion".to_string()),
        conocimiento_excel: Some(KnowledgeLevel::Intermedio),
        conocimiento_powerpoint: Some(KnowledgeLevel::Basico),
        conocimiento_word: Some(KnowledgeLevel::Avanzado),
        autoevaluacion: Some("Responsable y proactiva".to_string()),
    })
}

pub(super) fn consentimiento(acepta: bool) -> FormSubmission {
    FormSubmission::Consentimiento(Consentimiento {
        acepta,
        ciudad_consentimiento: Some("Bogota".to_string()),
        dia_consentimiento: Some(4),
        mes_consentimiento: Some(3),
        ano_consentimiento: Some(2025),
    })
}

pub(super) fn all_sections() -> Vec<FormSubmission> {
    vec![
        hoja_vida(),
        datos_basicos(),
        estudios(),
        FormSubmission::Experiencia(experiencia()),
        personal(),
        consentimiento(true),
    ]
}

pub(super) fn passing_scores() -> EvaluationRequest {
    EvaluationRequest::from_scores([15.0, 14.0, 16.0, 13.0, 15.0])
}

pub(super) fn failing_scores() -> EvaluationRequest {
    EvaluationRequest::from_scores([10.0, 12.0, 14.0, 11.0, 13.0])
}

pub(super) fn create(harness: &Harness) -> CandidateRecord {
    harness
        .service
        .create_candidate(&recruiter(), new_candidate())
        .expect("candidate created")
}

pub(super) fn complete_forms(harness: &Harness, record: &CandidateRecord) {
    for section in all_sections() {
        harness
            .service
            .submit_form(&record.token.value, section)
            .expect("section accepted");
    }
}

/// Creates a candidate and walks it to `citado`.
pub(super) fn scheduled(harness: &Harness) -> CandidateId {
    let record = create(harness);
    complete_forms(harness, &record);
    harness
        .service
        .schedule_interview(&recruiter(), &record.candidate.id, interview_at())
        .expect("interview scheduled");
    record.candidate.id
}

/// Creates a candidate and walks it to `pendiente_decision` with `scores`.
pub(super) fn evaluated(harness: &Harness, scores: EvaluationRequest) -> CandidateId {
    let id = scheduled(harness);
    harness
        .service
        .mark_interviewed(&selector(), &id)
        .expect("interviewed");
    harness
        .service
        .record_evaluation(&selector(), &id, scores)
        .expect("evaluation recorded");
    id
}

pub(super) fn advance_days(harness: &Harness, days: i64) {
    harness.clock.advance(Duration::days(days));
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    sent: Mutex<Vec<FormInvitation>>,
    fail: bool,
}

impl MemoryNotifier {
    pub(super) fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(super) fn sent(&self) -> Vec<FormInvitation> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl InvitationNotifier for MemoryNotifier {
    fn send_form_invitation(&self, invitation: FormInvitation) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport("smtp relay refused".to_string()));
        }
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(invitation);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl PipelineRepository for UnavailableRepository {
    fn insert_candidate(&self, _record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_candidate(&self, _id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save_candidate(
        &self,
        _record: CandidateRecord,
        _expected_version: u64,
    ) -> Result<CandidateRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_token(&self, _token: &str) -> Result<Option<CandidateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn candidates(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_staff(&self, _user: StaffUser) -> Result<StaffUser, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_staff(&self, _id: &StaffId) -> Result<Option<StaffUser>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn staff(&self) -> Result<Vec<StaffUser>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_reassignment(
        &self,
        _batch: ReassignmentBatch,
    ) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn unavailable_service() -> RecruitmentPipeline<UnavailableRepository, MemoryNotifier> {
    RecruitmentPipeline::new(
        Arc::new(PipelinePolicy::standard()),
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifier::default()),
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
