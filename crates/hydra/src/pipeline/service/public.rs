use tracing::{info, warn};

use super::super::error::{DeniedBy, PipelineError};
use super::super::forms::FormSubmission;
use super::super::repository::{CandidateRecord, InvitationNotifier, PipelineRepository};
use super::super::state::Transition;
use super::super::token::TokenError;
use super::{apply, RecruitmentPipeline};

const SUBMIT_FORM: &str = "registrar_formulario";

/// Token-gated operations available to the unauthenticated candidate.
impl<R, N> RecruitmentPipeline<R, N>
where
    R: PipelineRepository + 'static,
    N: InvitationNotifier + 'static,
{
    /// Resolve a presented token. Unknown and expired tokens fail with the
    /// same error; the distinction is only logged.
    pub fn validate_token(&self, token: &str) -> Result<CandidateRecord, PipelineError> {
        let presented = token.trim();
        let found = if presented.is_empty() {
            None
        } else {
            self.repository.find_by_token(presented)?
        };

        let rejection = match found {
            Some(record) if record.token.is_valid_at(self.clock.now()) => return Ok(record),
            Some(record) => {
                let err = TokenError::expired();
                warn!(
                    candidate = %record.candidate.id,
                    reason = err.reason().label(),
                    "access token rejected"
                );
                err
            }
            None => {
                let err = TokenError::unknown();
                warn!(reason = err.reason().label(), "access token rejected");
                err
            }
        };

        Err(rejection.into())
    }

    /// Store one form section. Completing the sixth section advances the
    /// candidate to `formularios_completados` in the same write.
    pub fn submit_form(
        &self,
        token: &str,
        submission: FormSubmission,
    ) -> Result<CandidateRecord, PipelineError> {
        let record = self.validate_token(token)?;
        submission.validate()?;

        let machine = &self.policy.machine;
        let section = submission.section();
        let saved = self.mutate_record(record, |record, now| {
            let candidate = &mut record.candidate;
            if !candidate.estado.accepts_form_submissions() {
                return Err(PipelineError::denied(
                    candidate.estado,
                    SUBMIT_FORM,
                    DeniedBy::Rule("forms are closed for this candidate".to_string()),
                ));
            }

            candidate.forms.record(submission);
            if let Ok(to) = machine.check(candidate, Transition::CompletarFormularios) {
                apply(candidate, Transition::CompletarFormularios, to, None, now);
            }
            Ok(())
        })?;

        info!(
            candidate = %saved.candidate.id,
            section = %section,
            progreso = saved.candidate.progreso_formularios(),
            "form section recorded"
        );
        Ok(saved)
    }
}
