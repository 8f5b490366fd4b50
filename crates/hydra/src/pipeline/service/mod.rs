mod public;
mod staff;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::Catalog;
use super::decision::{DecisionRequest, FinalDecision};
use super::domain::{
    non_blank, Attendance, Candidate, CandidateId, CandidateUpdate, ContactDetails, NewCandidate,
    ProcessDetails, Role, StaffId, StaffIdentity, StatusChange, WaveId,
};
use super::error::{DeniedBy, PipelineError};
use super::evaluation::EvaluationRequest;
use super::forms::FormProgress;
use super::permissions::Permission;
use super::policy::PipelinePolicy;
use super::report::PipelineSummary;
use super::repository::{
    CandidateRecord, FormInvitation, InvitationNotifier, PipelineRepository, RepositoryError,
};
use super::state::{CandidateStatus, Transition, Trigger};
use super::token::{AccessToken, Clock, SystemClock};
use super::views::RejectedProfile;
use super::waves::{check_assignment, check_placement, ASSIGN_WAVE};

/// Facade applying every staff and candidate action to one candidate record
/// at a time, behind the permission, state, and version checks.
pub struct RecruitmentPipeline<R, N> {
    policy: Arc<PipelinePolicy>,
    repository: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

static CANDIDATE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_candidate_id() -> CandidateId {
    let id = CANDIDATE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CandidateId(format!("cand-{id:06}"))
}

/// Result of an invitation send. Delivery failures never roll back the
/// committed state and surface only as a warning.
#[derive(Debug, Clone)]
pub struct InvitationOutcome {
    pub record: CandidateRecord,
    pub warning: Option<String>,
}

/// What a caller may see and do, derived from the same tables that enforce it.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub transitions: Vec<Transition>,
}

const NO_CANDIDATE: &str = "-";

impl<R, N> RecruitmentPipeline<R, N>
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    pub fn new(policy: Arc<PipelinePolicy>, repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            policy,
            repository,
            notifier,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &PipelinePolicy {
        &self.policy
    }

    fn catalog(&self) -> &Catalog {
        &self.policy.catalog
    }

    pub fn capabilities(&self, caller: &StaffIdentity) -> Capabilities {
        let permissions = &self.policy.permissions;
        Capabilities {
            role: caller.role,
            permissions: permissions.permissions_for(caller.role),
            transitions: Transition::ordered()
                .into_iter()
                .filter(|transition| permissions.may_fire(caller.role, *transition))
                .collect(),
        }
    }

    /// Register a candidate and issue their access token.
    pub fn create_candidate(
        &self,
        caller: &StaffIdentity,
        request: NewCandidate,
    ) -> Result<CandidateRecord, PipelineError> {
        self.require(caller, Permission::CrearCandidatos, "crear_candidato", NO_CANDIDATE)?;

        let nacionalidad = required("nacionalidad", request.nacionalidad)?;
        let primer_nombre = required("primer_nombre", request.primer_nombre)?;
        let primer_apellido = required("primer_apellido", request.primer_apellido)?;
        let numero_celular = required("numero_celular", request.numero_celular)?;
        let cliente = required("cliente", request.cliente)?;
        let ciudad = required("ciudad", request.ciudad)?;
        let cargo = required("cargo", request.cargo)?;
        let fuente_reclutamiento = required("fuente_reclutamiento", request.fuente_reclutamiento)?;

        check_placement(self.catalog(), &cliente, &cargo, request.oleada.as_ref())?;
        let reclutador = self.assigned_recruiter(caller, request.reclutador)?;

        let now = self.clock.now();
        let id = next_candidate_id();
        let candidate = Candidate {
            id: id.clone(),
            contact: ContactDetails {
                nacionalidad,
                tipo_documento: non_blank(request.tipo_documento),
                numero_documento: non_blank(request.numero_documento),
                primer_nombre,
                segundo_nombre: None,
                primer_apellido,
                segundo_apellido: None,
                email_personal: non_blank(request.email_personal),
                numero_celular,
                ciudad,
            },
            process: ProcessDetails {
                cliente,
                cargo,
                oleada: request.oleada,
                reclutador,
                fuente_reclutamiento,
                fecha_citacion: request.fecha_citacion,
                observaciones_llamada: non_blank(request.observaciones_llamada),
                observaciones_generales: non_blank(request.observaciones_generales),
            },
            estado: CandidateStatus::Nuevo,
            forms: FormProgress::default(),
            asistio_citacion: Attendance::Pendiente,
            evaluation: None,
            decision: None,
            motivo_descarte: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let record = CandidateRecord {
            candidate,
            token: AccessToken::issue(now, self.policy.token_ttl),
            version: 0,
        };

        let stored = self
            .repository
            .insert_candidate(record)
            .map_err(|err| conflict_on_duplicate(err, &id.0))?;

        info!(
            candidate = %id,
            actor = %caller.user_id,
            cliente = %stored.candidate.process.cliente,
            cargo = %stored.candidate.process.cargo,
            "candidate created"
        );
        Ok(stored)
    }

    fn assigned_recruiter(
        &self,
        caller: &StaffIdentity,
        requested: Option<StaffId>,
    ) -> Result<StaffId, PipelineError> {
        if caller.role == Role::Reclutador {
            return match self.repository.fetch_staff(&caller.user_id)? {
                Some(user) if user.activo && user.role == Role::Reclutador => {
                    Ok(caller.user_id.clone())
                }
                _ => {
                    warn!(actor = %caller.user_id, "inactive recruiter tried to create a candidate");
                    Err(PipelineError::denied(
                        caller.role,
                        "crear_candidato",
                        DeniedBy::Rule(format!("`{}` is not an active recruiter", caller.user_id)),
                    ))
                }
            };
        }

        let requested = requested.ok_or_else(|| PipelineError::missing("reclutador"))?;
        match self.repository.fetch_staff(&requested)? {
            Some(user) if user.activo && user.role == Role::Reclutador => Ok(requested),
            _ => Err(PipelineError::invalid(
                "reclutador",
                format!("`{requested}` is not an active recruiter"),
            )),
        }
    }

    /// Edit staff-owned fields. Changing cliente or cargo re-validates the
    /// pair and drops a wave reference that no longer matches.
    pub fn edit_candidate(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
        update: CandidateUpdate,
    ) -> Result<CandidateRecord, PipelineError> {
        let catalog = &self.policy.catalog;
        self.mutate(id, |record, _now| {
            let candidate = &mut record.candidate;
            self.require(caller, Permission::EditarCandidatos, "editar_candidato", candidate.estado)?;

            let cliente = non_blank(update.cliente).unwrap_or_else(|| candidate.process.cliente.clone());
            let cargo = non_blank(update.cargo).unwrap_or_else(|| candidate.process.cargo.clone());
            if (cliente.as_str(), cargo.as_str()) != candidate.catalog_key() {
                if candidate.estado == CandidateStatus::Contratado {
                    return Err(PipelineError::denied(
                        candidate.estado,
                        "editar_candidato",
                        DeniedBy::Rule("cliente and cargo are fixed once hired".to_string()),
                    ));
                }
                check_placement(catalog, &cliente, &cargo, None)?;
                let stale_wave = candidate
                    .process
                    .oleada
                    .as_ref()
                    .and_then(|wave_id| catalog.wave(wave_id))
                    .map_or(true, |wave| !wave.matches(&cliente, &cargo));
                if stale_wave {
                    candidate.process.oleada = None;
                }
                candidate.process.cliente = cliente;
                candidate.process.cargo = cargo;
            }

            let contact = &mut candidate.contact;
            replace_if_present(&mut contact.numero_celular, update.numero_celular);
            replace_if_present(&mut contact.ciudad, update.ciudad);
            merge_optional(&mut contact.tipo_documento, update.tipo_documento);
            merge_optional(&mut contact.numero_documento, update.numero_documento);
            merge_optional(&mut contact.email_personal, update.email_personal);

            let process = &mut candidate.process;
            replace_if_present(&mut process.fuente_reclutamiento, update.fuente_reclutamiento);
            merge_optional(&mut process.observaciones_llamada, update.observaciones_llamada);
            merge_optional(&mut process.observaciones_generales, update.observaciones_generales);
            Ok(())
        })
    }

    pub fn get_candidate(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
    ) -> Result<CandidateRecord, PipelineError> {
        self.require(caller, Permission::VerCandidatos, "ver_candidato", NO_CANDIDATE)?;
        self.load(id)
    }

    /// Send, or resend, the form invitation. The first send moves the
    /// candidate to `formularios_enviados`; later sends keep the status and
    /// only reissue the token once it has expired.
    pub fn send_form_invitation(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
    ) -> Result<InvitationOutcome, PipelineError> {
        let record = self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let resend = matches!(
                candidate.estado,
                CandidateStatus::FormulariosEnviados | CandidateStatus::FormulariosCompletados
            );
            if resend {
                self.authorize_role(caller, candidate, Transition::EnviarFormularios)?;
            } else {
                let to = self.authorize(caller, candidate, Transition::EnviarFormularios)?;
                apply(candidate, Transition::EnviarFormularios, to, Some(caller), now);
            }

            if !record.token.is_valid_at(now) {
                record.token = AccessToken::issue(now, self.policy.token_ttl);
            }
            Ok(())
        })?;

        let candidate = &record.candidate;
        let invitation = FormInvitation {
            candidate_id: candidate.id.clone(),
            nombre: candidate.contact.full_name(),
            email: candidate.contact.email_personal.clone(),
            token: record.token.value.clone(),
            expires_at: record.token.expires_at,
        };

        let warning = match self.notifier.send_form_invitation(invitation) {
            Ok(()) => None,
            Err(err) => {
                warn!(candidate = %candidate.id, error = %err, "form invitation not delivered");
                Some(err.to_string())
            }
        };

        Ok(InvitationOutcome { record, warning })
    }

    /// `nuevo → contacto_exitoso` after a successful first call.
    pub fn register_contact(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
        observaciones: Option<String>,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let to = self.authorize(caller, candidate, Transition::RegistrarContacto)?;
            merge_optional(&mut candidate.process.observaciones_llamada, observaciones);
            apply(candidate, Transition::RegistrarContacto, to, Some(caller), now);
            Ok(())
        })
    }

    pub fn schedule_interview(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
        fecha_citacion: NaiveDateTime,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            self.authorize_role(caller, candidate, Transition::Citar)?;
            candidate.process.fecha_citacion = Some(fecha_citacion);
            let to = self.check(candidate, Transition::Citar)?;
            apply(candidate, Transition::Citar, to, Some(caller), now);
            Ok(())
        })
    }

    pub fn confirm_attendance(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let to = self.authorize(caller, candidate, Transition::ConfirmarAsistencia)?;
            candidate.asistio_citacion = Attendance::Asistio;
            apply(candidate, Transition::ConfirmarAsistencia, to, Some(caller), now);
            Ok(())
        })
    }

    pub fn mark_no_show(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let to = self.authorize(caller, candidate, Transition::MarcarNoAsistio)?;
            candidate.asistio_citacion = Attendance::NoAsistio;
            apply(candidate, Transition::MarcarNoAsistio, to, Some(caller), now);
            Ok(())
        })
    }

    /// `citado → entrevistado`. Attendance is recorded in the same write when
    /// it was still pending.
    pub fn mark_interviewed(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let to = self.authorize(caller, candidate, Transition::MarcarEntrevistado)?;
            candidate.asistio_citacion = Attendance::Asistio;
            apply(candidate, Transition::MarcarEntrevistado, to, Some(caller), now);
            Ok(())
        })
    }

    /// Score the interview and move the candidate to pending decision.
    /// Re-scoring overwrites the previous evaluation until a decision exists.
    pub fn record_evaluation(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
        request: EvaluationRequest,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let to = self.authorize(caller, candidate, Transition::RegistrarEvaluacion)?;
            let evaluation = self
                .policy
                .evaluation
                .score(request, caller.user_id.clone(), now)?;

            debug!(
                candidate = %candidate.id,
                total = evaluation.total,
                aprobado = evaluation.aprobado,
                "interview scored"
            );
            candidate.evaluation = Some(evaluation);
            apply(candidate, Transition::RegistrarEvaluacion, to, Some(caller), now);
            Ok(())
        })
    }

    /// Record the final verdict. This is the only way out of
    /// `pendiente_decision` and cannot be undone.
    pub fn record_decision(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
        request: DecisionRequest,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let transition = if request.aprobado {
                Transition::AprobarFinal
            } else {
                Transition::RechazarFinal
            };
            self.authorize_role(caller, candidate, transition)?;

            if candidate.evaluation.is_none() {
                return Err(PipelineError::IncompleteEvaluation(candidate.id.clone()));
            }

            let decision = FinalDecision::from_request(request, caller.user_id.clone(), now)?;
            let to = self.check(candidate, transition)?;
            candidate.decision = Some(decision);
            apply(candidate, transition, to, Some(caller), now);
            Ok(())
        })
    }

    pub fn confirm_hire(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let to = self.authorize(caller, candidate, Transition::Contratar)?;
            apply(candidate, Transition::Contratar, to, Some(caller), now);
            Ok(())
        })
    }

    /// Early "No apto" disqualification from any pre-interview status.
    pub fn disqualify(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
        motivo: Option<String>,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, now| {
            let candidate = &mut record.candidate;
            let to = self.authorize(caller, candidate, Transition::Descartar)?;
            let motivo = non_blank(motivo).ok_or_else(|| PipelineError::missing("motivo_descarte"))?;
            candidate.motivo_descarte = Some(motivo);
            apply(candidate, Transition::Descartar, to, Some(caller), now);
            Ok(())
        })
    }

    /// Attach (or replace) the candidate's wave. The catalog check runs
    /// before the caller's permission is consulted.
    pub fn assign_wave(
        &self,
        caller: &StaffIdentity,
        id: &CandidateId,
        wave_id: WaveId,
    ) -> Result<CandidateRecord, PipelineError> {
        self.mutate(id, |record, _now| {
            let candidate = &mut record.candidate;
            let wave = check_assignment(self.catalog(), candidate, &wave_id)?;
            self.require(caller, Permission::EditarCandidatos, ASSIGN_WAVE, candidate.estado)?;

            info!(candidate = %candidate.id, wave = %wave.id, actor = %caller.user_id, "wave assigned");
            candidate.process.oleada = Some(wave.id.clone());
            Ok(())
        })
    }

    pub fn summary(&self, caller: &StaffIdentity) -> Result<PipelineSummary, PipelineError> {
        self.require(caller, Permission::VerEstadisticas, "ver_estadisticas", NO_CANDIDATE)?;
        let records = self.repository.candidates()?;
        Ok(PipelineSummary::from_records(&records))
    }

    pub fn list_candidates(
        &self,
        caller: &StaffIdentity,
        estado: Option<CandidateStatus>,
    ) -> Result<Vec<CandidateRecord>, PipelineError> {
        self.require(caller, Permission::VerCandidatos, "ver_candidatos", NO_CANDIDATE)?;
        let mut records = self.repository.candidates()?;
        if let Some(estado) = estado {
            records.retain(|record| record.candidate.estado == estado);
        }
        records.sort_by(|left, right| right.candidate.created_at.cmp(&left.candidate.created_at));
        Ok(records)
    }

    pub fn rejected_profiles(
        &self,
        caller: &StaffIdentity,
    ) -> Result<Vec<RejectedProfile>, PipelineError> {
        self.require(caller, Permission::VerRechazados, "ver_rechazados", NO_CANDIDATE)?;
        Ok(self
            .repository
            .candidates()?
            .iter()
            .filter(|record| record.candidate.estado.is_rejection())
            .map(RejectedProfile::from_record)
            .collect())
    }

    fn load(&self, id: &CandidateId) -> Result<CandidateRecord, PipelineError> {
        self.repository
            .fetch_candidate(id)?
            .ok_or_else(|| PipelineError::candidate_not_found(id))
    }

    fn mutate<F>(&self, id: &CandidateId, action: F) -> Result<CandidateRecord, PipelineError>
    where
        F: FnOnce(&mut CandidateRecord, DateTime<Utc>) -> Result<(), PipelineError>,
    {
        let record = self.load(id)?;
        self.mutate_record(record, action)
    }

    /// Apply `action` to a freshly read record and save it against the
    /// version it was read at. A concurrent writer turns into `Conflict`.
    fn mutate_record<F>(
        &self,
        mut record: CandidateRecord,
        action: F,
    ) -> Result<CandidateRecord, PipelineError>
    where
        F: FnOnce(&mut CandidateRecord, DateTime<Utc>) -> Result<(), PipelineError>,
    {
        let expected = record.version;
        let already_logged = record.candidate.history.len();
        let now = self.clock.now();

        if let Err(err) = action(&mut record, now) {
            log_refusal(&record.candidate.id, &err);
            return Err(err);
        }
        record.candidate.updated_at = now;

        let saved = match self.repository.save_candidate(record, expected) {
            Ok(saved) => saved,
            Err(err) => {
                let err = PipelineError::from(err);
                if err.is_retryable() {
                    warn!(error = %err, "stale candidate write rejected");
                }
                return Err(err);
            }
        };

        for change in saved.candidate.history.iter().skip(already_logged) {
            info!(
                candidate = %saved.candidate.id,
                transition = %change.transition,
                from = %change.from,
                to = %change.to,
                actor = change.actor.as_ref().map(|actor| actor.0.as_str()).unwrap_or("pipeline"),
                version = saved.version,
                "candidate transition committed"
            );
        }
        Ok(saved)
    }

    fn require(
        &self,
        caller: &StaffIdentity,
        permission: Permission,
        action: &str,
        from: impl fmt::Display,
    ) -> Result<(), PipelineError> {
        if self.policy.permissions.allows(caller.role, permission) {
            Ok(())
        } else {
            Err(PipelineError::denied(from, action, DeniedBy::Permission(permission)))
        }
    }

    /// Role gate: automatic transitions are never fired by staff, and manual
    /// ones need a granted role.
    fn authorize_role(
        &self,
        caller: &StaffIdentity,
        candidate: &Candidate,
        transition: Transition,
    ) -> Result<(), PipelineError> {
        let automatic = self
            .policy
            .machine
            .rule(transition)
            .is_some_and(|rule| rule.trigger == Trigger::Automatic);
        if automatic {
            return Err(PipelineError::denied(candidate.estado, transition, DeniedBy::AutomaticOnly));
        }

        if !self.policy.permissions.may_fire(caller.role, transition) {
            return Err(PipelineError::denied(
                candidate.estado,
                transition,
                DeniedBy::RoleNotGranted(caller.role),
            ));
        }
        Ok(())
    }

    /// State gate: source status, then preconditions.
    fn check(
        &self,
        candidate: &Candidate,
        transition: Transition,
    ) -> Result<CandidateStatus, PipelineError> {
        self.policy
            .machine
            .check(candidate, transition)
            .map_err(|refusal| PipelineError::denied(candidate.estado, transition, refusal.into()))
    }

    fn authorize(
        &self,
        caller: &StaffIdentity,
        candidate: &Candidate,
        transition: Transition,
    ) -> Result<CandidateStatus, PipelineError> {
        self.authorize_role(caller, candidate, transition)?;
        self.check(candidate, transition)
    }
}

/// Append the audit entry and move to `to`.
fn apply(
    candidate: &mut Candidate,
    transition: Transition,
    to: CandidateStatus,
    actor: Option<&StaffIdentity>,
    at: DateTime<Utc>,
) {
    candidate.history.push(StatusChange {
        transition,
        from: candidate.estado,
        to,
        actor: actor.map(|identity| identity.user_id.clone()),
        at,
    });
    candidate.estado = to;
}

fn log_refusal(id: &CandidateId, err: &PipelineError) {
    match err {
        PipelineError::TransitionDenied { .. }
        | PipelineError::CatalogMismatch { .. }
        | PipelineError::IncompleteEvaluation(_) => {
            warn!(candidate = %id, error = %err, "candidate operation denied");
        }
        other => debug!(candidate = %id, error = %other, "candidate operation rejected"),
    }
}

fn required(field: &str, value: String) -> Result<String, PipelineError> {
    non_blank(Some(value)).ok_or_else(|| PipelineError::missing(field))
}

fn replace_if_present(slot: &mut String, value: Option<String>) {
    if let Some(value) = non_blank(value) {
        *slot = value;
    }
}

fn merge_optional(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = non_blank(value) {
        *slot = Some(value);
    }
}

fn conflict_on_duplicate(err: RepositoryError, id: &str) -> PipelineError {
    match err {
        RepositoryError::Conflict => PipelineError::Conflict { id: id.to_string() },
        other => other.into(),
    }
}
