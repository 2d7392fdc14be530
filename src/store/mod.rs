//! # Persistent-store boundary
//!
//! The engine consumes the store through the `Store`/`Transaction` traits:
//! predicate scans, lightweight reference resolution, staged writes, and a
//! commit/rollback boundary. One transaction serves exactly one request and
//! is never held across requests.
//!
//! Lifecycle changes are announced to an `EventPublisher` only after a
//! successful commit; publication is fire-and-forget.

mod errors;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;

use serde_json::Value;

use crate::filter::Predicate;

/// What happened to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::Updated => "updated",
            ChangeAction::Deleted => "deleted",
        }
    }
}

/// Post-commit lifecycle notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub resource: String,
    pub id: String,
    pub action: ChangeAction,
}

/// Post-commit notification sink
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

/// Publisher that drops every event
#[derive(Debug, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: ChangeEvent) {}
}

/// Transactional document store
pub trait Store: Send + Sync {
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>>;
}

/// One request's transaction.
///
/// Reads observe committed state plus this transaction's own staged writes.
/// Every scan and existence check is tenant-scoped: rows whose tenant field
/// differs from `tenant` are invisible, regardless of predicate content.
/// Dropping a transaction without committing discards its writes.
pub trait Transaction {
    /// All visible rows of `resource` under `tenant` matching `predicate`.
    fn scan(
        &self,
        resource: &str,
        tenant: &str,
        predicate: Option<&Predicate>,
    ) -> StoreResult<Vec<Value>>;

    /// Resolve a lightweight reference: does a row with this identity exist
    /// under this tenant? Never loads the row.
    fn exists(&self, resource: &str, tenant: &str, id: &str) -> StoreResult<bool>;

    /// Stage an insert keyed by the row's identity value.
    fn insert(&mut self, resource: &str, id: &str, doc: Value) -> StoreResult<()>;

    /// Stage a full-row update.
    fn update(&mut self, resource: &str, id: &str, doc: Value) -> StoreResult<()>;

    /// Stage a delete.
    fn delete(&mut self, resource: &str, id: &str) -> StoreResult<()>;

    /// Apply staged writes atomically.
    fn commit(self: Box<Self>) -> StoreResult<()>;
}
