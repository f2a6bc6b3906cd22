//! In-memory Record Store.
//!
//! Single owner of the current resume record for the lifetime of the process.
//! Every write takes the write lock, so a reader sees either the snapshot
//! before a merge or the one after it, never a mix.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use super::{skeleton, Record};

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("record changed since version {expected} (now {actual})")]
    VersionConflict { expected: u64, actual: u64 },
}

struct Versioned {
    record: Record,
    version: u64,
}

/// Shared handle to the current record. Cloning shares the same state.
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<RwLock<Versioned>>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Starts from the all-empty skeleton at version 0.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Versioned {
                record: skeleton(),
                version: 0,
            })),
        }
    }

    pub fn get(&self) -> Record {
        self.inner.read().record.clone()
    }

    /// The current record together with its version.
    pub fn snapshot(&self) -> (Record, u64) {
        let guard = self.inner.read();
        (guard.record.clone(), guard.version)
    }

    #[cfg(test)]
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Shallow-merges `partial` into the current record. Fields absent from
    /// `partial` are kept; present ones are replaced wholesale.
    pub fn merge(&self, partial: Record) -> u64 {
        let mut guard = self.inner.write();
        let fields = partial.len();
        apply_merge(&mut guard.record, partial);
        guard.version += 1;
        debug!(fields, version = guard.version, "Merged partial record");
        guard.version
    }

    /// Merges only if nothing was written since `expected`.
    pub fn compare_and_merge(&self, expected: u64, partial: Record) -> Result<u64, StoreError> {
        let mut guard = self.inner.write();
        if guard.version != expected {
            return Err(StoreError::VersionConflict {
                expected,
                actual: guard.version,
            });
        }
        apply_merge(&mut guard.record, partial);
        guard.version += 1;
        Ok(guard.version)
    }

    /// Atomic read-modify-write. `f` sees the current record and may return a
    /// partial to merge; the version only moves when it does.
    pub fn update<T>(&self, f: impl FnOnce(&Record) -> (T, Option<Record>)) -> (T, u64) {
        let mut guard = self.inner.write();
        let (out, partial) = f(&guard.record);
        if let Some(partial) = partial {
            apply_merge(&mut guard.record, partial);
            guard.version += 1;
        }
        (out, guard.version)
    }

    /// Restores the all-empty skeleton.
    pub fn reset(&self) -> u64 {
        let mut guard = self.inner.write();
        guard.record = skeleton();
        guard.version += 1;
        info!(version = guard.version, "Record reset to skeleton");
        guard.version
    }
}

fn apply_merge(record: &mut Record, partial: Record) {
    for (key, value) in partial {
        record.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn partial(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_new_store_holds_skeleton() {
        let store = RecordStore::new();
        assert_eq!(store.get(), skeleton());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_merge_preserves_absent_fields() {
        let store = RecordStore::new();
        store.merge(partial(json!({"name": "Jane Doe", "yoe": "5"})));
        store.merge(partial(json!({"yoe": "6"})));

        let record = store.get();
        assert_eq!(record["name"], json!("Jane Doe"));
        assert_eq!(record["yoe"], json!("6"));
        assert_eq!(record["contact"], json!(""));
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_merge_accepts_unknown_fields() {
        let store = RecordStore::new();
        store.merge(partial(json!({"hobbies": ["chess"]})));
        assert_eq!(store.get()["hobbies"], json!(["chess"]));
    }

    #[test]
    fn test_reset_restores_skeleton() {
        let store = RecordStore::new();
        store.merge(partial(json!({"name": "Jane", "extra": 1})));
        store.reset();
        assert_eq!(store.get(), skeleton());
    }

    #[test]
    fn test_compare_and_merge_rejects_stale_version() {
        let store = RecordStore::new();
        let (_, base) = store.snapshot();
        store.merge(partial(json!({"name": "Concurrent"})));

        let err = store
            .compare_and_merge(base, partial(json!({"name": "Stale"})))
            .unwrap_err();
        assert_eq!(err, StoreError::VersionConflict { expected: 0, actual: 1 });
        assert_eq!(store.get()["name"], json!("Concurrent"));
    }

    #[test]
    fn test_compare_and_merge_accepts_current_version() {
        let store = RecordStore::new();
        let version = store.compare_and_merge(0, partial(json!({"name": "Jane"}))).unwrap();
        assert_eq!(version, 1);
        assert_eq!(store.get()["name"], json!("Jane"));
    }

    #[test]
    fn test_update_merges_only_when_asked() {
        let store = RecordStore::new();
        let (len, version) = store.update(|record| (record.len(), None));
        assert_eq!(len, skeleton().len());
        assert_eq!(version, 0);

        let (_, version) = store.update(|_| ((), Some(partial(json!({"name": "Jane"})))));
        assert_eq!(version, 1);
        assert_eq!(store.get()["name"], json!("Jane"));
    }

    #[test]
    fn test_clones_share_state() {
        let store = RecordStore::new();
        let other = store.clone();
        other.merge(partial(json!({"name": "Shared"})));
        assert_eq!(store.get()["name"], json!("Shared"));
    }

    #[tokio::test]
    async fn test_concurrent_merges_are_not_lost() {
        let store = RecordStore::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut fields = Record::new();
                    fields.insert(format!("field{i}"), json!(i));
                    store.merge(fields);
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        let record = store.get();
        assert!((0..16).all(|i| record.contains_key(&format!("field{i}"))));
        assert_eq!(store.version(), 16);
    }
}
