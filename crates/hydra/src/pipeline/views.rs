use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use super::decision::FinalDecision;
use super::domain::{Attendance, CandidateId, ContactDetails, ProcessDetails};
use super::evaluation::InterviewEvaluation;
use super::forms::{FormAnswers, FormSection};
use super::repository::CandidateRecord;
use super::state::{CandidateStatus, StateMachine, Transition};

#[derive(Debug, Clone, Serialize)]
pub struct SectionFlag {
    pub section: FormSection,
    pub completado: bool,
}

fn section_flags(record: &CandidateRecord) -> Vec<SectionFlag> {
    record
        .candidate
        .forms
        .flags()
        .into_iter()
        .map(|(section, completado)| SectionFlag {
            section,
            completado,
        })
        .collect()
}

/// Staff-facing candidate projection. Derived fields are computed here and
/// never stored.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    pub id: CandidateId,
    pub version: u64,
    pub nombre_completo: String,
    pub contact: ContactDetails,
    pub process: ProcessDetails,
    pub estado: CandidateStatus,
    pub progreso_formularios: u8,
    pub formularios: Vec<SectionFlag>,
    pub respuestas: FormAnswers,
    pub asistio_citacion: Attendance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluacion_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluacion_aprobado: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<InterviewEvaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aprobacion_final: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<FinalDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivo_descarte: Option<String>,
    pub token_expires_at: DateTime<Utc>,
    pub transiciones_disponibles: Vec<Transition>,
    pub updated_at: DateTime<Utc>,
}

impl CandidateView {
    pub fn from_record(record: &CandidateRecord, machine: &StateMachine) -> Self {
        let candidate = &record.candidate;
        Self {
            id: candidate.id.clone(),
            version: record.version,
            nombre_completo: candidate.contact.full_name(),
            contact: candidate.contact.clone(),
            process: candidate.process.clone(),
            estado: candidate.estado,
            progreso_formularios: candidate.progreso_formularios(),
            formularios: section_flags(record),
            respuestas: candidate.forms.answers().clone(),
            asistio_citacion: candidate.asistio_citacion,
            evaluacion_total: candidate.evaluacion_total(),
            evaluacion_aprobado: candidate.evaluacion_aprobado(),
            evaluation: candidate.evaluation.clone(),
            aprobacion_final: candidate.aprobacion_final(),
            decision: candidate.decision.clone(),
            motivo_descarte: candidate.motivo_descarte.clone(),
            token_expires_at: record.token.expires_at,
            transiciones_disponibles: machine
                .available_from(candidate.estado)
                .into_iter()
                .filter(|transition| machine.check(candidate, *transition).is_ok())
                .collect(),
            updated_at: candidate.updated_at,
        }
    }
}

/// What the token holder sees: no staff notes, scores, or decisions.
#[derive(Debug, Clone, Serialize)]
pub struct PublicCandidateView {
    pub primer_nombre: String,
    pub primer_apellido: String,
    pub cliente: String,
    pub cargo: String,
    pub fecha_citacion: Option<NaiveDateTime>,
    pub progreso_formularios: u8,
    pub formularios: Vec<SectionFlag>,
    pub acepta_envios: bool,
}

impl PublicCandidateView {
    pub fn from_record(record: &CandidateRecord) -> Self {
        let candidate = &record.candidate;
        Self {
            primer_nombre: candidate.contact.primer_nombre.clone(),
            primer_apellido: candidate.contact.primer_apellido.clone(),
            cliente: candidate.process.cliente.clone(),
            cargo: candidate.process.cargo.clone(),
            fecha_citacion: candidate.process.fecha_citacion,
            progreso_formularios: candidate.progreso_formularios(),
            formularios: section_flags(record),
            acepta_envios: candidate.estado.accepts_form_submissions(),
        }
    }
}

/// Rejected candidate together with the reason recorded at the point of rejection.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedProfile {
    pub id: CandidateId,
    pub nombre_completo: String,
    pub cliente: String,
    pub cargo: String,
    pub estado: CandidateStatus,
    pub motivo: Option<String>,
    pub evaluacion_total: Option<f64>,
}

impl RejectedProfile {
    pub fn from_record(record: &CandidateRecord) -> Self {
        let candidate = &record.candidate;
        let motivo = candidate
            .decision
            .as_ref()
            .and_then(|decision| decision.justificacion.clone())
            .or_else(|| candidate.motivo_descarte.clone())
            .or_else(|| {
                candidate
                    .evaluation
                    .as_ref()
                    .and_then(|evaluation| evaluation.razon_rechazo.clone())
            });

        Self {
            id: candidate.id.clone(),
            nombre_completo: candidate.contact.full_name(),
            cliente: candidate.process.cliente.clone(),
            cargo: candidate.process.cargo.clone(),
            estado: candidate.estado,
            motivo,
            evaluacion_total: candidate.evaluacion_total(),
        }
    }
}
