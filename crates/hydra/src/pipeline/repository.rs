use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Candidate, CandidateId, StaffId, StaffUser};
use super::token::AccessToken;

/// Persisted candidate together with its access token and optimistic version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate: Candidate,
    pub token: AccessToken,
    pub version: u64,
}

/// Candidate writes applied together with an optional staff deactivation.
/// Either every entry commits or none does.
#[derive(Debug, Clone, Default)]
pub struct ReassignmentBatch {
    /// Updated records paired with the version they were read at.
    pub updates: Vec<(CandidateRecord, u64)>,
    pub deactivate: Option<StaffId>,
}

/// Storage abstraction so the pipeline service can be exercised in isolation.
pub trait PipelineRepository: Send + Sync {
    fn insert_candidate(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError>;
    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError>;
    /// Stores `record` only if the persisted version still equals
    /// `expected_version`; returns the record with its bumped version.
    fn save_candidate(
        &self,
        record: CandidateRecord,
        expected_version: u64,
    ) -> Result<CandidateRecord, RepositoryError>;
    fn find_by_token(&self, token: &str) -> Result<Option<CandidateRecord>, RepositoryError>;
    fn candidates(&self) -> Result<Vec<CandidateRecord>, RepositoryError>;
    fn insert_staff(&self, user: StaffUser) -> Result<StaffUser, RepositoryError>;
    fn fetch_staff(&self, id: &StaffId) -> Result<Option<StaffUser>, RepositoryError>;
    fn staff(&self) -> Result<Vec<StaffUser>, RepositoryError>;
    fn commit_reassignment(
        &self,
        batch: ReassignmentBatch,
    ) -> Result<Vec<CandidateRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("{id} is at version {actual}, expected {expected}")]
    StaleVersion {
        id: String,
        expected: u64,
        actual: u64,
    },
    #[error("record not found")]
    NotFound,
    /// A candidate assignment and a deactivation of recruiter `id` crossed.
    #[error("assignments of recruiter {id} changed concurrently")]
    RecruiterChanged { id: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound invitation carrying the candidate's form link credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInvitation {
    pub candidate_id: CandidateId,
    pub nombre: String,
    pub email: Option<String>,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Fire-and-forget delivery of form invitations (e-mail adapters and the like).
pub trait InvitationNotifier: Send + Sync {
    fn send_form_invitation(&self, invitation: FormInvitation) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("candidate has no e-mail address on file")]
    NoRecipient,
}
