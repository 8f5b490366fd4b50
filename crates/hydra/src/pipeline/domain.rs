use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::FinalDecision;
use super::evaluation::InterviewEvaluation;
use super::forms::FormProgress;
use super::state::{CandidateStatus, Transition};

/// Server-assigned candidate identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Staff member identifier issued by the external auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(pub String);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog identifier of an oleada.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId(pub String);

impl fmt::Display for WaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three staff roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reclutador,
    Seleccion,
    Administrador,
}

impl Role {
    pub const fn ordered() -> [Self; 3] {
        [Self::Reclutador, Self::Seleccion, Self::Administrador]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Reclutador => "reclutador",
            Self::Seleccion => "seleccion",
            Self::Administrador => "administrador",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reclutador" => Some(Self::Reclutador),
            "seleccion" | "selección" => Some(Self::Seleccion),
            "administrador" | "admin" => Some(Self::Administrador),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Already-authenticated caller handed to every staff-facing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub user_id: StaffId,
    pub role: Role,
}

impl StaffIdentity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: StaffId(user_id.into()),
            role,
        }
    }
}

/// Staff account as known to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: StaffId,
    pub nombre_completo: String,
    pub email: String,
    pub role: Role,
    pub activo: bool,
}

/// Request to register a staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStaffUser {
    pub id: StaffId,
    #[serde(default)]
    pub nombre_completo: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

/// Personal contact fields captured by the recruiter and completed by the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub nacionalidad: String,
    pub tipo_documento: Option<String>,
    pub numero_documento: Option<String>,
    pub primer_nombre: String,
    pub segundo_nombre: Option<String>,
    pub primer_apellido: String,
    pub segundo_apellido: Option<String>,
    pub email_personal: Option<String>,
    pub numero_celular: String,
    pub ciudad: String,
}

impl ContactDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.primer_nombre, self.primer_apellido)
    }
}

/// Process fields owned by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDetails {
    pub cliente: String,
    pub cargo: String,
    pub oleada: Option<WaveId>,
    pub reclutador: StaffId,
    pub fuente_reclutamiento: String,
    pub fecha_citacion: Option<NaiveDateTime>,
    pub observaciones_llamada: Option<String>,
    pub observaciones_generales: Option<String>,
}

/// Whether the candidate showed up to the scheduled interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attendance {
    #[default]
    Pendiente,
    Asistio,
    NoAsistio,
}

impl Attendance {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::Asistio => "asistio",
            Self::NoAsistio => "no_asistio",
        }
    }
}

/// One committed status change, kept as an append-only trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub transition: Transition,
    pub from: CandidateStatus,
    pub to: CandidateStatus,
    pub actor: Option<StaffId>,
    pub at: DateTime<Utc>,
}

/// Canonical candidate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub contact: ContactDetails,
    pub process: ProcessDetails,
    pub estado: CandidateStatus,
    pub forms: FormProgress,
    pub asistio_citacion: Attendance,
    pub evaluation: Option<InterviewEvaluation>,
    pub decision: Option<FinalDecision>,
    pub motivo_descarte: Option<String>,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn progreso_formularios(&self) -> u8 {
        self.forms.progress()
    }

    pub fn evaluacion_total(&self) -> Option<f64> {
        self.evaluation.as_ref().map(|evaluation| evaluation.total)
    }

    pub fn evaluacion_aprobado(&self) -> Option<bool> {
        self.evaluation.as_ref().map(|evaluation| evaluation.aprobado)
    }

    pub fn aprobacion_final(&self) -> Option<bool> {
        self.decision.as_ref().map(|decision| decision.aprobado)
    }

    pub fn catalog_key(&self) -> (&str, &str) {
        (&self.process.cliente, &self.process.cargo)
    }
}

/// Recruiter-supplied data for a new candidate. Required fields default to
/// empty so that missing values surface as field-level validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    #[serde(default)]
    pub nacionalidad: String,
    #[serde(default)]
    pub tipo_documento: Option<String>,
    #[serde(default)]
    pub numero_documento: Option<String>,
    #[serde(default)]
    pub primer_nombre: String,
    #[serde(default)]
    pub primer_apellido: String,
    #[serde(default)]
    pub email_personal: Option<String>,
    #[serde(default)]
    pub numero_celular: String,
    #[serde(default)]
    pub ciudad: String,
    #[serde(default)]
    pub cliente: String,
    #[serde(default)]
    pub cargo: String,
    #[serde(default)]
    pub oleada: Option<WaveId>,
    #[serde(default)]
    pub fuente_reclutamiento: String,
    #[serde(default)]
    pub fecha_citacion: Option<NaiveDateTime>,
    #[serde(default)]
    pub observaciones_llamada: Option<String>,
    #[serde(default)]
    pub observaciones_generales: Option<String>,
    /// Recruiter to assign when the creator is not a recruiter.
    #[serde(default)]
    pub reclutador: Option<StaffId>,
}

/// Partial edit of a candidate's staff-owned fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUpdate {
    #[serde(default)]
    pub tipo_documento: Option<String>,
    #[serde(default)]
    pub numero_documento: Option<String>,
    #[serde(default)]
    pub email_personal: Option<String>,
    #[serde(default)]
    pub numero_celular: Option<String>,
    #[serde(default)]
    pub ciudad: Option<String>,
    #[serde(default)]
    pub cliente: Option<String>,
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde(default)]
    pub fuente_reclutamiento: Option<String>,
    #[serde(default)]
    pub observaciones_llamada: Option<String>,
    #[serde(default)]
    pub observaciones_generales: Option<String>,
}

/// Trimmed, non-empty text or `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
