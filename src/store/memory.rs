//! In-memory reference store
//!
//! Collections are `BTreeMap`s keyed by identity value so scans are
//! deterministic. A transaction stages its writes in an overlay; reads merge
//! the overlay onto committed state, and commit applies the overlay behind
//! the write lock in one step.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;

use crate::filter::Predicate;
use crate::schema::TENANT_FIELD;

use super::errors::{StoreError, StoreResult};
use super::{Store, Transaction};

/// One staged write
#[derive(Debug, Clone)]
enum StagedWrite {
    Put(Value),
    Delete,
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        Ok(Box::new(MemoryTransaction {
            store: self,
            staged: HashMap::new(),
        }))
    }
}

struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    staged: HashMap<String, BTreeMap<String, StagedWrite>>,
}

impl MemoryTransaction<'_> {
    fn staged_for(&self, resource: &str, id: &str) -> Option<&StagedWrite> {
        self.staged.get(resource).and_then(|rows| rows.get(id))
    }

    fn stage(&mut self, resource: &str, id: &str, write: StagedWrite) {
        self.staged
            .entry(resource.to_string())
            .or_default()
            .insert(id.to_string(), write);
    }
}

fn owned_by(doc: &Value, tenant: &str) -> bool {
    doc.get(TENANT_FIELD).and_then(Value::as_str) == Some(tenant)
}

impl Transaction for MemoryTransaction<'_> {
    fn scan(
        &self,
        resource: &str,
        tenant: &str,
        predicate: Option<&Predicate>,
    ) -> StoreResult<Vec<Value>> {
        let collections = self
            .store
            .collections
            .read()
            .map_err(|_| StoreError::fault("lock poisoned"))?;

        let committed = collections.get(resource);
        let overlay = self.staged.get(resource);

        // Merge committed rows and the overlay, id order preserved.
        let mut merged: BTreeMap<&str, &Value> = BTreeMap::new();
        if let Some(rows) = committed {
            for (id, doc) in rows {
                merged.insert(id.as_str(), doc);
            }
        }
        if let Some(rows) = overlay {
            for (id, write) in rows {
                match write {
                    StagedWrite::Put(doc) => {
                        merged.insert(id.as_str(), doc);
                    }
                    StagedWrite::Delete => {
                        merged.remove(id.as_str());
                    }
                }
            }
        }

        Ok(merged
            .into_values()
            .filter(|doc| owned_by(doc, tenant))
            .filter(|doc| predicate.map(|p| p.matches(doc)).unwrap_or(true))
            .cloned()
            .collect())
    }

    fn exists(&self, resource: &str, tenant: &str, id: &str) -> StoreResult<bool> {
        if let Some(write) = self.staged_for(resource, id) {
            return Ok(match write {
                StagedWrite::Put(doc) => owned_by(doc, tenant),
                StagedWrite::Delete => false,
            });
        }

        let collections = self
            .store
            .collections
            .read()
            .map_err(|_| StoreError::fault("lock poisoned"))?;

        Ok(collections
            .get(resource)
            .and_then(|rows| rows.get(id))
            .map(|doc| owned_by(doc, tenant))
            .unwrap_or(false))
    }

    fn insert(&mut self, resource: &str, id: &str, doc: Value) -> StoreResult<()> {
        let taken = match self.staged_for(resource, id) {
            Some(StagedWrite::Put(_)) => true,
            Some(StagedWrite::Delete) => false,
            None => {
                let collections = self
                    .store
                    .collections
                    .read()
                    .map_err(|_| StoreError::fault("lock poisoned"))?;
                collections
                    .get(resource)
                    .map(|rows| rows.contains_key(id))
                    .unwrap_or(false)
            }
        };

        if taken {
            return Err(StoreError::DuplicateKey {
                resource: resource.to_string(),
                id: id.to_string(),
            });
        }

        self.stage(resource, id, StagedWrite::Put(doc));
        Ok(())
    }

    fn update(&mut self, resource: &str, id: &str, doc: Value) -> StoreResult<()> {
        self.stage(resource, id, StagedWrite::Put(doc));
        Ok(())
    }

    fn delete(&mut self, resource: &str, id: &str) -> StoreResult<()> {
        self.stage(resource, id, StagedWrite::Delete);
        Ok(())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut collections = self
            .store
            .collections
            .write()
            .map_err(|_| StoreError::fault("lock poisoned"))?;

        for (resource, rows) in self.staged {
            let collection = collections.entry(resource).or_default();
            for (id, write) in rows {
                match write {
                    StagedWrite::Put(doc) => {
                        collection.insert(id, doc);
                    }
                    StagedWrite::Delete => {
                        collection.remove(&id);
                    }
                }
            }
        }

        Ok(())
    }
}
