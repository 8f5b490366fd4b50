//! Candidate recruitment pipeline.
//!
//! A candidate record carries one canonical [`CandidateStatus`]. Every change
//! goes through [`RecruitmentPipeline`], which checks the caller's role
//! against the [`PermissionModel`], the current status and preconditions
//! against the [`StateMachine`] table, and saves with an optimistic version
//! check so concurrent writers on the same candidate cannot both win.

pub mod catalog;
pub mod decision;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod forms;
pub mod memory;
pub mod permissions;
pub mod policy;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod state;
pub mod token;
pub mod views;
pub mod waves;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, CatalogError, ClientEntry, Wave};
pub use decision::{DecisionRequest, FinalDecision};
pub use domain::{
    Attendance, Candidate, CandidateId, CandidateUpdate, ContactDetails, NewCandidate,
    NewStaffUser, ProcessDetails, Role, StaffId, StaffIdentity, StaffUser, StatusChange, WaveId,
};
pub use error::{DeniedBy, PipelineError};
pub use evaluation::{
    Criterion, EvaluationConfig, EvaluationEngine, EvaluationRequest, InterviewEvaluation,
    InterviewScores, APPROVAL_THRESHOLD, MAX_SUBSCORE,
};
pub use forms::{
    Consentimiento, DatosBasicos, Estudios, Experiencia, FormProgress, FormSection,
    FormSubmission, HojaVida, KnowledgeLevel, Personal, FORM_SECTION_COUNT,
};
pub use memory::InMemoryPipelineRepository;
pub use permissions::{Permission, PermissionModel};
pub use policy::PipelinePolicy;
pub use report::PipelineSummary;
pub use repository::{
    CandidateRecord, FormInvitation, InvitationNotifier, NotifyError, PipelineRepository,
    ReassignmentBatch, RepositoryError,
};
pub use router::{pipeline_router, USER_ID_HEADER, USER_ROLE_HEADER};
pub use service::{Capabilities, InvitationOutcome, RecruitmentPipeline};
pub use state::{CandidateStatus, StateMachine, Transition, TransitionRule, Trigger};
pub use token::{
    AccessToken, Clock, ManualClock, SystemClock, TokenError, DEFAULT_TOKEN_TTL_DAYS,
    MAX_TOKEN_TTL_DAYS,
};
pub use views::{CandidateView, PublicCandidateView, RejectedProfile};
