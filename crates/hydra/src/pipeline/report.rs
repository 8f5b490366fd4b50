use std::collections::BTreeMap;

use serde::Serialize;

use super::forms::FORM_SECTION_COUNT;
use super::repository::CandidateRecord;
use super::state::CandidateStatus;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub estado: CandidateStatus,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressBucket {
    pub progreso: u8,
    pub count: usize,
}

/// Dashboard statistics over every candidate.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub por_estado: Vec<StatusCountEntry>,
    pub progreso: Vec<ProgressBucket>,
    pub por_cliente: BTreeMap<String, usize>,
    pub por_cargo: BTreeMap<String, usize>,
    pub promedio_evaluacion: Option<f64>,
}

impl PipelineSummary {
    pub fn from_records(records: &[CandidateRecord]) -> Self {
        let mut by_status: BTreeMap<CandidateStatus, usize> = BTreeMap::new();
        let mut buckets = vec![0usize; usize::from(FORM_SECTION_COUNT) + 1];
        let mut por_cliente = BTreeMap::new();
        let mut por_cargo = BTreeMap::new();
        let mut scores = Vec::new();

        for record in records {
            let candidate = &record.candidate;
            *by_status.entry(candidate.estado).or_default() += 1;
            buckets[usize::from(candidate.progreso_formularios())] += 1;
            *por_cliente
                .entry(candidate.process.cliente.clone())
                .or_default() += 1;
            *por_cargo.entry(candidate.process.cargo.clone()).or_default() += 1;
            if let Some(total) = candidate.evaluacion_total() {
                scores.push(total);
            }
        }

        let por_estado = CandidateStatus::ordered()
            .into_iter()
            .map(|estado| StatusCountEntry {
                estado,
                count: by_status.get(&estado).copied().unwrap_or(0),
            })
            .collect();

        let progreso = buckets
            .into_iter()
            .enumerate()
            .map(|(progreso, count)| ProgressBucket {
                progreso: progreso as u8,
                count,
            })
            .collect();

        let promedio_evaluacion = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        Self {
            total: records.len(),
            por_estado,
            progreso,
            por_cliente,
            por_cargo,
            promedio_evaluacion,
        }
    }

    pub fn count(&self, estado: CandidateStatus) -> usize {
        self.por_estado
            .iter()
            .find(|entry| entry.estado == estado)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}
