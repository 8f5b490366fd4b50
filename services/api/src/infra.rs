use hydra::config::PipelineSettings;
use hydra::error::AppError;
use hydra::pipeline::{
    Catalog, FormInvitation, InvitationNotifier, NotifyError, PipelinePolicy, PipelineRepository,
    RepositoryError, Role, StaffId, StaffUser,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Id of the administrador seeded into an empty staff directory.
pub(crate) const BOOTSTRAP_ADMIN: &str = "admin";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) catalog: Arc<Catalog>,
}

/// Stands in for the mail relay: invitations are logged and kept in memory.
#[derive(Default, Clone)]
pub(crate) struct LogNotifier {
    sent: Arc<Mutex<Vec<FormInvitation>>>,
}

impl InvitationNotifier for LogNotifier {
    fn send_form_invitation(&self, invitation: FormInvitation) -> Result<(), NotifyError> {
        let Some(email) = invitation.email.as_deref() else {
            warn!(candidate = %invitation.candidate_id, "form invitation has no recipient");
            return Err(NotifyError::NoRecipient);
        };

        info!(
            candidate = %invitation.candidate_id,
            recipient = email,
            expires_at = %invitation.expires_at,
            "form invitation queued"
        );
        let mut guard = self.sent.lock().expect("notifier mutex poisoned");
        guard.push(invitation);
        Ok(())
    }
}

impl LogNotifier {
    pub(crate) fn sent(&self) -> Vec<FormInvitation> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

pub(crate) fn load_catalog(path: Option<&Path>) -> Result<Catalog, AppError> {
    match path {
        Some(path) => {
            let catalog = Catalog::from_path(path)?;
            info!(path = %path.display(), clientes = catalog.clientes.len(), "catalog loaded");
            Ok(catalog)
        }
        None => Ok(Catalog::standard()),
    }
}

pub(crate) fn build_policy(settings: &PipelineSettings) -> Result<PipelinePolicy, AppError> {
    let catalog = load_catalog(settings.catalog_path.as_deref())?;
    Ok(PipelinePolicy::with_catalog(catalog)
        .with_token_ttl(chrono::Duration::days(settings.token_ttl_days)))
}

/// Make sure someone can log in and create the rest of the staff.
pub(crate) fn seed_bootstrap_admin<R: PipelineRepository>(repository: &R) -> Result<(), RepositoryError> {
    if !repository.staff()?.is_empty() {
        return Ok(());
    }

    repository.insert_staff(StaffUser {
        id: StaffId(BOOTSTRAP_ADMIN.to_string()),
        nombre_completo: "Administrador".to_string(),
        email: "admin@localhost".to_string(),
        role: Role::Administrador,
        activo: true,
    })?;
    info!(staff = BOOTSTRAP_ADMIN, "bootstrap administrador created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hydra::pipeline::{CandidateId, InMemoryPipelineRepository};

    fn invitation(email: Option<&str>) -> FormInvitation {
        FormInvitation {
            candidate_id: CandidateId("cand-000001".to_string()),
            nombre: "Laura Gomez".to_string(),
            email: email.map(str::to_string),
            token: "abc".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn notifier_requires_recipient() {
        let notifier = LogNotifier::default();
        assert!(matches!(
            notifier.send_form_invitation(invitation(None)),
            Err(NotifyError::NoRecipient)
        ));
        notifier
            .send_form_invitation(invitation(Some("laura@example.com")))
            .expect("queued");
        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn bootstrap_admin_is_seeded_once() {
        let repository = InMemoryPipelineRepository::new();
        seed_bootstrap_admin(&repository).expect("seeded");
        seed_bootstrap_admin(&repository).expect("idempotent");

        let staff = repository.staff().expect("staff");
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].role, Role::Administrador);
    }

    #[test]
    fn policy_uses_configured_token_ttl() {
        let settings = PipelineSettings {
            token_ttl_days: 7,
            catalog_path: None,
        };
        let policy = build_policy(&settings).expect("policy");
        assert_eq!(policy.token_ttl, chrono::Duration::days(7));
        assert_eq!(policy.catalog, Catalog::standard());
    }
}
