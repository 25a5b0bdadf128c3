use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::info;

use crate::candidate::{Candidate, CandidateId};
use crate::error::AggregationError;

type CandidateSlot = Arc<Mutex<Candidate>>;

/// In-process candidate registry.
///
/// Each candidate sits behind its own mutex: updates to one candidate are serialized so a
/// read-modify-write blend always sees the previous result, while different candidates
/// update in parallel. The outer lock is only held long enough to look up the slot.
#[derive(Debug, Default)]
pub struct CandidateStore {
    candidates: RwLock<HashMap<CandidateId, CandidateSlot>>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, candidate: Candidate) -> Result<(), AggregationError> {
        let id = candidate.id;
        let mut map = self
            .candidates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(&id) {
            return Err(AggregationError::DuplicateCandidate(id));
        }

        map.insert(id, Arc::new(Mutex::new(candidate)));
        info!(candidate_id = %id, "candidate registered");
        Ok(())
    }

    /// Delete a candidate together with its channel totals and skill records.
    pub fn remove(&self, id: CandidateId) -> Option<Candidate> {
        let slot = self
            .candidates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)?;

        info!(candidate_id = %id, "candidate removed");
        let candidate = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Some(candidate)
    }

    pub fn contains(&self, id: CandidateId) -> bool {
        self.candidates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.candidates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: CandidateId) -> Result<CandidateSlot, AggregationError> {
        self.candidates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(AggregationError::UnknownCandidate(id))
    }

    /// Run `f` with exclusive access to one candidate.
    pub fn update<T>(
        &self,
        id: CandidateId,
        f: impl FnOnce(&mut Candidate) -> T,
    ) -> Result<T, AggregationError> {
        let slot = self.slot(id)?;
        let mut candidate = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut candidate))
    }

    pub fn snapshot(&self, id: CandidateId) -> Result<Candidate, AggregationError> {
        self.update(id, |candidate| candidate.clone())
    }

    /// Copies of every candidate, ordered by id.
    pub fn snapshots(&self) -> Vec<Candidate> {
        let slots: Vec<CandidateSlot> = self
            .candidates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut candidates: Vec<Candidate> = slots
            .iter()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect();
        candidates.sort_by_key(|c| c.id);
        candidates
    }
}
