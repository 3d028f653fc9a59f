//! Thread-safe store of prepared meshes awaiting consumption.
//!
//! The streaming engine's worker thread adds records and the main thread
//! takes them. Each logical operation holds the lock for its whole duration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::prepared::PreparedMeshRecord;

/// Prepared mesh records keyed by identifier.
///
/// Cloning is cheap; clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct PreparedMeshRepository {
    inner: Arc<Mutex<HashMap<String, PreparedMeshRecord>>>,
}

impl PreparedMeshRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record if its identifier is not already present.
    ///
    /// Returns `false` and drops `record` when an earlier record with the same
    /// identifier is still waiting to be consumed.
    pub fn insert(&self, record: PreparedMeshRecord) -> bool {
        let mut records = self.lock();
        if records.contains_key(&record.id) {
            tracing::debug!(id = %record.id, "prepared mesh already pending, keeping first");
            return false;
        }
        records.insert(record.id.clone(), record);
        true
    }

    /// Atomically remove and return the record for `id`.
    ///
    /// A second call for the same identifier returns `None`.
    pub fn try_take(&self, id: &str) -> Option<PreparedMeshRecord> {
        let record = self.lock().remove(id);
        if record.is_none() {
            tracing::warn!(id, "no prepared mesh pending");
        }
        record
    }

    /// Whether a record for `id` is pending.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of pending records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no records are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all pending records.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PreparedMeshRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use glam::DVec3;

    use super::*;
    use crate::kind::GeometryKind;

    fn record(id: &str, material: &str) -> PreparedMeshRecord {
        PreparedMeshRecord {
            id: id.to_owned(),
            kind: GeometryKind::Road,
            material_name: material.to_owned(),
            origin_ecef: DVec3::ZERO,
            chunks: Vec::new(),
        }
    }

    #[test]
    fn test_first_writer_wins() {
        let repository = PreparedMeshRepository::new();
        assert!(repository.insert(record("R1", "first")));
        assert!(!repository.insert(record("R1", "second")));
        assert_eq!(repository.len(), 1);
        assert_eq!(repository.try_take("R1").unwrap().material_name, "first");
    }

    #[test]
    fn test_take_is_one_shot() {
        let repository = PreparedMeshRepository::new();
        repository.insert(record("R1", "road"));
        assert!(repository.try_take("R1").is_some());
        assert!(repository.try_take("R1").is_none());
        assert!(repository.is_empty());
    }

    #[test]
    fn test_insert_from_worker_thread() {
        let repository = PreparedMeshRepository::new();
        let producer = repository.clone();
        thread::spawn(move || {
            for i in 0..100 {
                producer.insert(record(&format!("R{i}"), "road"));
            }
        })
        .join()
        .unwrap();

        assert_eq!(repository.len(), 100);
        assert!(repository.contains("R42"));
        assert!(repository.try_take("R99").is_some());
    }
}
