use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use super::domain::{CandidateId, StaffId, StaffUser};
use super::repository::{CandidateRecord, PipelineRepository, ReassignmentBatch, RepositoryError};

#[derive(Debug, Default)]
struct MemoryState {
    candidates: BTreeMap<CandidateId, CandidateRecord>,
    staff: BTreeMap<StaffId, StaffUser>,
}

/// Process-local repository. A single lock serialises writes, and version
/// checks happen under that lock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPipelineRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryPipelineRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_version(
    stored: Option<&CandidateRecord>,
    id: &CandidateId,
    expected: u64,
) -> Result<(), RepositoryError> {
    let stored = stored.ok_or(RepositoryError::NotFound)?;
    if stored.version != expected {
        return Err(RepositoryError::StaleVersion {
            id: id.0.clone(),
            expected,
            actual: stored.version,
        });
    }
    Ok(())
}

impl PipelineRepository for InMemoryPipelineRepository {
    fn insert_candidate(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.candidates.contains_key(&record.candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        let reclutador = &record.candidate.process.reclutador;
        if guard.staff.get(reclutador).is_some_and(|user| !user.activo) {
            return Err(RepositoryError::RecruiterChanged {
                id: reclutador.0.clone(),
            });
        }
        guard
            .candidates
            .insert(record.candidate.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.candidates.get(id).cloned())
    }

    fn save_candidate(
        &self,
        mut record: CandidateRecord,
        expected_version: u64,
    ) -> Result<CandidateRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let id = record.candidate.id.clone();
        check_version(guard.candidates.get(&id), &id, expected_version)?;

        record.version = expected_version + 1;
        guard.candidates.insert(id, record.clone());
        Ok(record)
    }

    fn find_by_token(&self, token: &str) -> Result<Option<CandidateRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .candidates
            .values()
            .find(|record| record.token.matches(token))
            .cloned())
    }

    fn candidates(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.candidates.values().cloned().collect())
    }

    fn insert_staff(&self, user: StaffUser) -> Result<StaffUser, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.staff.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.staff.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn fetch_staff(&self, id: &StaffId) -> Result<Option<StaffUser>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.staff.get(id).cloned())
    }

    fn staff(&self) -> Result<Vec<StaffUser>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.staff.values().cloned().collect())
    }

    fn commit_reassignment(
        &self,
        batch: ReassignmentBatch,
    ) -> Result<Vec<CandidateRecord>, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");

        for (record, expected) in &batch.updates {
            let id = &record.candidate.id;
            check_version(guard.candidates.get(id), id, *expected)?;
        }
        if let Some(staff_id) = &batch.deactivate {
            if !guard.staff.contains_key(staff_id) {
                return Err(RepositoryError::NotFound);
            }
            // Anything still pointing at the recruiter and not moved by this
            // batch was assigned after the batch was read.
            let moved: BTreeSet<&CandidateId> = batch
                .updates
                .iter()
                .map(|(record, _)| &record.candidate.id)
                .collect();
            let left_behind = guard.candidates.values().any(|record| {
                &record.candidate.process.reclutador == staff_id
                    && !moved.contains(&record.candidate.id)
            });
            if left_behind {
                return Err(RepositoryError::RecruiterChanged {
                    id: staff_id.0.clone(),
                });
            }
        }

        let mut committed = Vec::with_capacity(batch.updates.len());
        for (mut record, expected) in batch.updates {
            record.version = expected + 1;
            guard
                .candidates
                .insert(record.candidate.id.clone(), record.clone());
            committed.push(record);
        }
        if let Some(staff_id) = batch.deactivate {
            if let Some(user) = guard.staff.get_mut(&staff_id) {
                user.activo = false;
            }
        }

        Ok(committed)
    }
}
