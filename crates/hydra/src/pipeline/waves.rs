use super::catalog::{Catalog, Wave};
use super::domain::{Candidate, WaveId};
use super::error::{DeniedBy, PipelineError};
use super::state::CandidateStatus;

pub const ASSIGN_WAVE: &str = "asignar_oleada";

/// Resolves `wave_id` and checks it belongs to the candidate's (cliente, cargo).
/// The caller's role plays no part here.
pub fn check_assignment<'a>(
    catalog: &'a Catalog,
    candidate: &Candidate,
    wave_id: &WaveId,
) -> Result<&'a Wave, PipelineError> {
    if candidate.estado == CandidateStatus::Contratado {
        return Err(PipelineError::denied(
            candidate.estado,
            ASSIGN_WAVE,
            DeniedBy::Rule("oleada is fixed once the candidate is hired".to_string()),
        ));
    }

    let wave = catalog.wave(wave_id).ok_or_else(|| PipelineError::NotFound {
        entity: "wave",
        id: wave_id.0.clone(),
    })?;

    let (cliente, cargo) = candidate.catalog_key();
    if !wave.matches(cliente, cargo) {
        return Err(PipelineError::CatalogMismatch {
            detail: format!(
                "wave `{}` belongs to {} / {}, candidate applies to {} / {}",
                wave.id, wave.cliente, wave.cargo, cliente, cargo
            ),
        });
    }

    Ok(wave)
}

/// Validates a (cliente, cargo) pair and an optional wave against the catalog.
pub(crate) fn check_placement(
    catalog: &Catalog,
    cliente: &str,
    cargo: &str,
    oleada: Option<&WaveId>,
) -> Result<(), PipelineError> {
    if catalog.cliente(cliente).is_none() {
        return Err(PipelineError::invalid(
            "cliente",
            format!("`{cliente}` is not in the catalog"),
        ));
    }

    if !catalog.cargo_valid(cliente, cargo) {
        return Err(PipelineError::CatalogMismatch {
            detail: format!("cargo `{cargo}` is not offered by `{cliente}`"),
        });
    }

    if let Some(wave_id) = oleada {
        let wave = catalog.wave(wave_id).ok_or_else(|| PipelineError::NotFound {
            entity: "wave",
            id: wave_id.0.clone(),
        })?;
        if !wave.matches(cliente, cargo) {
            return Err(PipelineError::CatalogMismatch {
                detail: format!(
                    "wave `{}` belongs to {} / {}, not {} / {}",
                    wave.id, wave.cliente, wave.cargo, cliente, cargo
                ),
            });
        }
    }

    Ok(())
}
