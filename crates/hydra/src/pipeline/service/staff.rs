use tracing::{info, warn};

use super::super::domain::{non_blank, NewStaffUser, Role, StaffId, StaffIdentity, StaffUser};
use super::super::error::{DeniedBy, PipelineError};
use super::super::permissions::Permission;
use super::super::repository::{
    CandidateRecord, InvitationNotifier, PipelineRepository, ReassignmentBatch, RepositoryError,
};
use super::RecruitmentPipeline;

const CREATE_STAFF: &str = "crear_usuario";
const REASSIGN: &str = "reasignar_candidatos";
const DEACTIVATE: &str = "desactivar_reclutador";

/// Staff account management. Recruiter removal never leaves candidates
/// pointing at an inactive recruiter.
impl<R, N> RecruitmentPipeline<R, N>
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    pub fn create_staff(
        &self,
        caller: &StaffIdentity,
        request: NewStaffUser,
    ) -> Result<StaffUser, PipelineError> {
        self.require(caller, Permission::GestionarUsuarios, CREATE_STAFF, "-")?;
        if request.role == Role::Administrador && caller.role != Role::Administrador {
            return Err(PipelineError::denied(
                caller.role,
                CREATE_STAFF,
                DeniedBy::Rule("only an administrador may create administradores".to_string()),
            ));
        }

        let id = non_blank(Some(request.id.0)).ok_or_else(|| PipelineError::missing("id"))?;
        let nombre_completo = non_blank(Some(request.nombre_completo))
            .ok_or_else(|| PipelineError::missing("nombre_completo"))?;
        let email = non_blank(Some(request.email)).ok_or_else(|| PipelineError::missing("email"))?;
        if !email.contains('@') {
            return Err(PipelineError::invalid("email", "not an e-mail address"));
        }

        let user = StaffUser {
            id: StaffId(id.clone()),
            nombre_completo,
            email,
            role: request.role,
            activo: true,
        };
        let stored = self.repository.insert_staff(user).map_err(|err| match err {
            RepositoryError::Conflict => PipelineError::Conflict { id },
            other => other.into(),
        })?;

        info!(staff = %stored.id, role = %stored.role, actor = %caller.user_id, "staff user created");
        Ok(stored)
    }

    pub fn list_staff(&self, caller: &StaffIdentity) -> Result<Vec<StaffUser>, PipelineError> {
        self.require(caller, Permission::GestionarUsuarios, "ver_usuarios", "-")?;
        Ok(self.repository.staff()?)
    }

    /// Move every candidate of `from` to the active recruiter `to`.
    pub fn reassign_candidates(
        &self,
        caller: &StaffIdentity,
        from: &StaffId,
        to: &StaffId,
    ) -> Result<Vec<CandidateRecord>, PipelineError> {
        self.require(caller, Permission::GestionarUsuarios, REASSIGN, "-")?;
        let batch = self.reassignment_batch(from, to, REASSIGN)?;
        let moved = batch.updates.len();
        let committed = self.repository.commit_reassignment(batch)?;

        info!(from = %from, to = %to, moved, actor = %caller.user_id, "candidates reassigned");
        Ok(committed)
    }

    /// Deactivate a recruiter. Refused while any candidate is still assigned.
    pub fn deactivate_recruiter(
        &self,
        caller: &StaffIdentity,
        id: &StaffId,
    ) -> Result<StaffUser, PipelineError> {
        self.require(caller, Permission::GestionarUsuarios, DEACTIVATE, "-")?;
        let user = self.fetch_recruiter(id, DEACTIVATE)?;

        let assigned = self.assigned_to(id)?.len();
        if assigned > 0 {
            warn!(staff = %id, assigned, "recruiter deactivation refused");
            return Err(PipelineError::denied(
                "activo",
                DEACTIVATE,
                DeniedBy::Rule(format!(
                    "{assigned} candidate(s) still assigned; reassign them first"
                )),
            ));
        }

        if user.activo {
            self.repository.commit_reassignment(ReassignmentBatch {
                updates: Vec::new(),
                deactivate: Some(id.clone()),
            })?;
            info!(staff = %id, actor = %caller.user_id, "recruiter deactivated");
        }

        self.fetch_staff(id)
    }

    /// Reassign everything to `to` and deactivate `from` in one commit. If
    /// any candidate changed since it was read, nothing is applied.
    pub fn reassign_and_deactivate(
        &self,
        caller: &StaffIdentity,
        from: &StaffId,
        to: &StaffId,
    ) -> Result<StaffUser, PipelineError> {
        self.require(caller, Permission::GestionarUsuarios, DEACTIVATE, "-")?;
        let mut batch = self.reassignment_batch(from, to, DEACTIVATE)?;
        let moved = batch.updates.len();
        batch.deactivate = Some(from.clone());
        self.repository.commit_reassignment(batch)?;

        info!(
            from = %from,
            to = %to,
            moved,
            actor = %caller.user_id,
            "candidates reassigned and recruiter deactivated"
        );
        self.fetch_staff(from)
    }

    fn fetch_staff(&self, id: &StaffId) -> Result<StaffUser, PipelineError> {
        self.repository
            .fetch_staff(id)?
            .ok_or_else(|| PipelineError::NotFound {
                entity: "staff",
                id: id.0.clone(),
            })
    }

    /// Only recruiter accounts can be emptied or deactivated here.
    fn fetch_recruiter(&self, id: &StaffId, action: &str) -> Result<StaffUser, PipelineError> {
        let user = self.fetch_staff(id)?;
        if user.role != Role::Reclutador {
            warn!(staff = %id, role = %user.role, action, "recruiter operation on non-recruiter");
            return Err(PipelineError::denied(
                user.role,
                action,
                DeniedBy::Rule(format!("`{id}` is not a recruiter")),
            ));
        }
        Ok(user)
    }

    fn assigned_to(&self, id: &StaffId) -> Result<Vec<CandidateRecord>, PipelineError> {
        Ok(self
            .repository
            .candidates()?
            .into_iter()
            .filter(|record| &record.candidate.process.reclutador == id)
            .collect())
    }

    fn reassignment_batch(
        &self,
        from: &StaffId,
        to: &StaffId,
        action: &str,
    ) -> Result<ReassignmentBatch, PipelineError> {
        if from == to {
            return Err(PipelineError::invalid(
                "reclutador_destino",
                "must differ from the recruiter being replaced",
            ));
        }
        self.fetch_recruiter(from, action)?;

        let target = self.fetch_staff(to)?;
        if !target.activo || target.role != Role::Reclutador {
            return Err(PipelineError::invalid(
                "reclutador_destino",
                format!("`{to}` is not an active recruiter"),
            ));
        }

        let now = self.clock.now();
        let updates = self
            .assigned_to(from)?
            .into_iter()
            .map(|mut record| {
                let expected = record.version;
                record.candidate.process.reclutador = to.clone();
                record.candidate.updated_at = now;
                (record, expected)
            })
            .collect();

        Ok(ReassignmentBatch {
            updates,
            deactivate: None,
        })
    }
}
