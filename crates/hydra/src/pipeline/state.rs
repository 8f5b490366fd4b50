use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{Attendance, Candidate};
use super::forms::FORM_SECTION_COUNT;

/// Canonical pipeline status. This is the single source of truth; the form
/// completion flags and attendance are projections checked against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Nuevo,
    ContactoExitoso,
    FormulariosEnviados,
    FormulariosCompletados,
    Citado,
    NoAsistio,
    Entrevistado,
    PendienteDecision,
    AprobadoFinal,
    RechazadoFinal,
    Contratado,
    Rechazado,
}

impl CandidateStatus {
    pub const fn ordered() -> [Self; 12] {
        [
            Self::Nuevo,
            Self::ContactoExitoso,
            Self::FormulariosEnviados,
            Self::FormulariosCompletados,
            Self::Citado,
            Self::NoAsistio,
            Self::Entrevistado,
            Self::PendienteDecision,
            Self::AprobadoFinal,
            Self::RechazadoFinal,
            Self::Contratado,
            Self::Rechazado,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Nuevo => "nuevo",
            Self::ContactoExitoso => "contacto_exitoso",
            Self::FormulariosEnviados => "formularios_enviados",
            Self::FormulariosCompletados => "formularios_completados",
            Self::Citado => "citado",
            Self::NoAsistio => "no_asistio",
            Self::Entrevistado => "entrevistado",
            Self::PendienteDecision => "pendiente_decision",
            Self::AprobadoFinal => "aprobado_final",
            Self::RechazadoFinal => "rechazado_final",
            Self::Contratado => "contratado",
            Self::Rechazado => "rechazado",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == needle)
    }

    /// No transition leaves a terminal status.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::NoAsistio | Self::RechazadoFinal | Self::Contratado | Self::Rechazado
        )
    }

    /// Statuses in which the candidate may still (re)submit form sections.
    pub const fn accepts_form_submissions(self) -> bool {
        matches!(
            self,
            Self::Nuevo
                | Self::ContactoExitoso
                | Self::FormulariosEnviados
                | Self::FormulariosCompletados
        )
    }

    pub const fn is_rejection(self) -> bool {
        matches!(self, Self::Rechazado | Self::RechazadoFinal | Self::NoAsistio)
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every named move through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    RegistrarContacto,
    EnviarFormularios,
    CompletarFormularios,
    Citar,
    ConfirmarAsistencia,
    MarcarNoAsistio,
    MarcarEntrevistado,
    RegistrarEvaluacion,
    AprobarFinal,
    RechazarFinal,
    Contratar,
    Descartar,
}

impl Transition {
    pub const fn ordered() -> [Self; 12] {
        [
            Self::RegistrarContacto,
            Self::EnviarFormularios,
            Self::CompletarFormularios,
            Self::Citar,
            Self::ConfirmarAsistencia,
            Self::MarcarNoAsistio,
            Self::MarcarEntrevistado,
            Self::RegistrarEvaluacion,
            Self::AprobarFinal,
            Self::RechazarFinal,
            Self::Contratar,
            Self::Descartar,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RegistrarContacto => "registrar_contacto",
            Self::EnviarFormularios => "enviar_formularios",
            Self::CompletarFormularios => "completar_formularios",
            Self::Citar => "citar",
            Self::ConfirmarAsistencia => "confirmar_asistencia",
            Self::MarcarNoAsistio => "marcar_no_asistio",
            Self::MarcarEntrevistado => "marcar_entrevistado",
            Self::RegistrarEvaluacion => "registrar_evaluacion",
            Self::AprobarFinal => "aprobar_final",
            Self::RechazarFinal => "rechazar_final",
            Self::Contratar => "contratar",
            Self::Descartar => "descartar",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who may fire a transition: a staff member or the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Manual,
    Automatic,
}

/// Data conditions checked against the candidate before a transition applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precondition {
    InterviewDateSet,
    FormsComplete,
    AttendancePending,
    AttendanceNotMissed,
    EvaluationRecorded,
    EvaluationApproved,
    NoFinalDecision,
}

impl Precondition {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InterviewDateSet => "interview date must be set",
            Self::FormsComplete => "all six form sections must be completed",
            Self::AttendancePending => "attendance must still be pending",
            Self::AttendanceNotMissed => "candidate must not be marked as absent",
            Self::EvaluationRecorded => "interview evaluation must be recorded",
            Self::EvaluationApproved => "interview evaluation must be approved",
            Self::NoFinalDecision => "evaluation is frozen once a final decision is recorded",
        }
    }

    pub fn holds(self, candidate: &Candidate) -> bool {
        match self {
            Self::InterviewDateSet => candidate.process.fecha_citacion.is_some(),
            Self::FormsComplete => candidate.progreso_formularios() == FORM_SECTION_COUNT,
            Self::AttendancePending => candidate.asistio_citacion == Attendance::Pendiente,
            Self::AttendanceNotMissed => candidate.asistio_citacion != Attendance::NoAsistio,
            Self::EvaluationRecorded => candidate.evaluation.is_some(),
            Self::EvaluationApproved => candidate.evaluacion_aprobado() == Some(true),
            Self::NoFinalDecision => candidate.decision.is_none(),
        }
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub transition: Transition,
    pub from: &'static [CandidateStatus],
    /// `None` keeps the current status (idempotent resend, attendance capture).
    pub to: Option<CandidateStatus>,
    pub trigger: Trigger,
    pub preconditions: &'static [Precondition],
}

use CandidateStatus as S;

const PRE_INTERVIEW: &[CandidateStatus] = &[
    S::Nuevo,
    S::ContactoExitoso,
    S::FormulariosEnviados,
    S::FormulariosCompletados,
    S::Citado,
];

const STANDARD_TABLE: &[TransitionRule] = &[
    TransitionRule {
        transition: Transition::RegistrarContacto,
        from: &[S::Nuevo],
        to: Some(S::ContactoExitoso),
        trigger: Trigger::Manual,
        preconditions: &[],
    },
    TransitionRule {
        transition: Transition::EnviarFormularios,
        from: &[S::Nuevo, S::ContactoExitoso],
        to: Some(S::FormulariosEnviados),
        trigger: Trigger::Manual,
        preconditions: &[],
    },
    TransitionRule {
        transition: Transition::CompletarFormularios,
        from: &[S::Nuevo, S::ContactoExitoso, S::FormulariosEnviados],
        to: Some(S::FormulariosCompletados),
        trigger: Trigger::Automatic,
        preconditions: &[Precondition::FormsComplete],
    },
    TransitionRule {
        transition: Transition::Citar,
        from: &[S::Nuevo, S::ContactoExitoso, S::FormulariosCompletados],
        to: Some(S::Citado),
        trigger: Trigger::Manual,
        preconditions: &[Precondition::InterviewDateSet],
    },
    TransitionRule {
        transition: Transition::ConfirmarAsistencia,
        from: &[S::Citado],
        to: None,
        trigger: Trigger::Manual,
        preconditions: &[Precondition::InterviewDateSet, Precondition::AttendancePending],
    },
    TransitionRule {
        transition: Transition::MarcarNoAsistio,
        from: &[S::Citado],
        to: Some(S::NoAsistio),
        trigger: Trigger::Manual,
        preconditions: &[Precondition::InterviewDateSet, Precondition::AttendancePending],
    },
    // Attendance may still be pending here: marking the interview records
    // `asistio` in the same write, so it races a no-show on the version
    // rather than requiring a separate confirmation first.
    TransitionRule {
        transition: Transition::MarcarEntrevistado,
        from: &[S::Citado],
        to: Some(S::Entrevistado),
        trigger: Trigger::Manual,
        preconditions: &[Precondition::InterviewDateSet, Precondition::AttendanceNotMissed],
    },
    TransitionRule {
        transition: Transition::RegistrarEvaluacion,
        from: &[S::Entrevistado, S::PendienteDecision],
        to: Some(S::PendienteDecision),
        trigger: Trigger::Manual,
        preconditions: &[Precondition::NoFinalDecision],
    },
    TransitionRule {
        transition: Transition::AprobarFinal,
        from: &[S::PendienteDecision],
        to: Some(S::AprobadoFinal),
        trigger: Trigger::Manual,
        preconditions: &[
            Precondition::EvaluationRecorded,
            Precondition::EvaluationApproved,
            Precondition::NoFinalDecision,
        ],
    },
    TransitionRule {
        transition: Transition::RechazarFinal,
        from: &[S::PendienteDecision],
        to: Some(S::RechazadoFinal),
        trigger: Trigger::Manual,
        preconditions: &[Precondition::EvaluationRecorded, Precondition::NoFinalDecision],
    },
    TransitionRule {
        transition: Transition::Contratar,
        from: &[S::AprobadoFinal],
        to: Some(S::Contratado),
        trigger: Trigger::Manual,
        preconditions: &[],
    },
    TransitionRule {
        transition: Transition::Descartar,
        from: PRE_INTERVIEW,
        to: Some(S::Rechazado),
        trigger: Trigger::Manual,
        preconditions: &[],
    },
];

/// Why the machine refused a transition on a given candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineRefusal {
    UnknownTransition,
    SourceState,
    Precondition(Precondition),
}

/// Data-driven transition table.
#[derive(Debug, Clone)]
pub struct StateMachine {
    rules: Vec<TransitionRule>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::standard()
    }
}

impl StateMachine {
    pub fn standard() -> Self {
        Self {
            rules: STANDARD_TABLE.to_vec(),
        }
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    pub fn rule(&self, transition: Transition) -> Option<&TransitionRule> {
        self.rules.iter().find(|rule| rule.transition == transition)
    }

    /// Transitions whose source set contains `status`.
    pub fn available_from(&self, status: CandidateStatus) -> Vec<Transition> {
        self.rules
            .iter()
            .filter(|rule| rule.from.contains(&status))
            .map(|rule| rule.transition)
            .collect()
    }

    /// Checks the source state and every precondition, returning the target
    /// status (or the current one for status-preserving transitions).
    pub fn check(
        &self,
        candidate: &Candidate,
        transition: Transition,
    ) -> Result<CandidateStatus, MachineRefusal> {
        let rule = self
            .rule(transition)
            .ok_or(MachineRefusal::UnknownTransition)?;

        if !rule.from.contains(&candidate.estado) {
            return Err(MachineRefusal::SourceState);
        }

        if let Some(failed) = rule
            .preconditions
            .iter()
            .copied()
            .find(|precondition| !precondition.holds(candidate))
        {
            return Err(MachineRefusal::Precondition(failed));
        }

        Ok(rule.to.unwrap_or(candidate.estado))
    }
}
