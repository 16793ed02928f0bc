//! # engine
//!
//! why: the stores only need point access, ordered cursors and atomic commits,
//!      so any transactional ordered key-value engine can sit underneath
//! relations: implemented by RedbEngine (durable) and BTreeEngine (volatile),
//!            consumed by log_store and fact_store
//! what: KvEngine, KvTransaction, KvCursor traits
//!
//! discarding a transaction is dropping it, closing a cursor is dropping it.
//! `commit` consumes the transaction, so nothing can be written after it.

mod btree;
mod merge;
mod options;
mod redb_store;

pub use btree::{BTreeCursor, BTreeEngine, BTreeTxn};
pub use options::EngineOptions;
pub use redb_store::{RedbCursor, RedbEngine, RedbTxn};

use crate::error::EngineError;

/// a shared, ordered, transactional key-value engine
pub trait KvEngine: Send + Sync {
    type Txn<'a>: KvTransaction
    where
        Self: 'a;

    /// open a transaction; writes fail unless `writable`
    fn begin(&self, writable: bool) -> Result<Self::Txn<'_>, EngineError>;

    /// advised maximum number of mutations in one transaction
    fn max_batch_count(&self) -> usize;
}

/// a unit of atomic work against the engine
pub trait KvTransaction {
    type Cursor<'c>: KvCursor
    where
        Self: 'c;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError>;

    fn delete(&mut self, key: &[u8]) -> Result<(), EngineError>;

    /// a cursor over this transaction's view, including its own pending writes
    fn cursor(&self, reverse: bool) -> Self::Cursor<'_>;

    fn commit(self) -> Result<(), EngineError>;
}

/// positioned iteration over keys
///
/// forward cursors seek to the smallest key `>=` the target, reverse cursors
/// to the greatest key `<=` it. `next` moves away from the seek key in the
/// cursor's direction. both may read from disk, so both can fail.
pub trait KvCursor {
    fn seek(&mut self, key: &[u8]) -> Result<(), EngineError>;

    /// positioned on a key that starts with `prefix`
    fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        self.key().is_some_and(|key| key.starts_with(prefix))
    }

    fn key(&self) -> Option<&[u8]>;

    fn value(&self) -> Option<&[u8]>;

    fn next(&mut self) -> Result<(), EngineError>;
}
