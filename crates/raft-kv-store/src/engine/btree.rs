//! # btree
//!
//! why: a volatile ordered engine so the stores can be exercised without a database file
//! relations: implements the engine traits; cursor merging shared with redb.rs via merge.rs
//! what: BTreeEngine (in-memory), BTreeTxn snapshot transactions, BTreeCursor

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::merge::{MergedCursor, Pending, WriteSet};
use super::{EngineOptions, KvEngine, KvTransaction};
use crate::error::EngineError;

type Tree = BTreeMap<Vec<u8>, Vec<u8>>;

/// ordered key-value engine backed by a copy-on-write btree
///
/// readers work on an `Arc` snapshot taken at `begin`; commits swap in the
/// new tree under the write lock, so each commit is atomic and isolated.
/// nothing survives the process, use RedbEngine for a durable store.
pub struct BTreeEngine {
    tree: RwLock<Arc<Tree>>,
    options: EngineOptions,
}

impl BTreeEngine {
    pub fn in_memory(options: EngineOptions) -> Result<Self, EngineError> {
        options.validate()?;
        Ok(Self {
            tree: RwLock::new(Arc::new(Tree::new())),
            options,
        })
    }

    /// number of committed keys across all prefixes
    pub fn key_count(&self) -> Result<usize, EngineError> {
        Ok(self.snapshot()?.len())
    }

    fn snapshot(&self) -> Result<Arc<Tree>, EngineError> {
        let tree = self.tree.read().map_err(|_| EngineError::Poisoned)?;
        Ok(Arc::clone(&tree))
    }

    fn commit(&self, pending: Pending) -> Result<(), EngineError> {
        if pending.is_empty() {
            return Ok(());
        }
        let mut guard = self.tree.write().map_err(|_| EngineError::Poisoned)?;
        debug!(mutations = pending.len(), "commit");
        let tree = Arc::make_mut(&mut *guard);
        for (key, value) in pending {
            match value {
                Some(value) => {
                    tree.insert(key, value);
                }
                None => {
                    tree.remove(&key);
                }
            }
        }
        Ok(())
    }
}

impl KvEngine for BTreeEngine {
    type Txn<'a> = BTreeTxn<'a>;

    fn begin(&self, writable: bool) -> Result<BTreeTxn<'_>, EngineError> {
        Ok(BTreeTxn {
            engine: self,
            snapshot: self.snapshot()?,
            writes: WriteSet::new(writable, self.options.max_batch_count),
        })
    }

    fn max_batch_count(&self) -> usize {
        self.options.max_batch_count
    }
}

/// snapshot transaction over a BTreeEngine
pub struct BTreeTxn<'a> {
    engine: &'a BTreeEngine,
    snapshot: Arc<Tree>,
    writes: WriteSet,
}

/// cursor over a BTreeTxn's snapshot and its pending writes
pub type BTreeCursor<'c> = MergedCursor<'c, Tree>;

impl KvTransaction for BTreeTxn<'_> {
    type Cursor<'c> = BTreeCursor<'c> where Self: 'c;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged),
            None => Ok(self.snapshot.get(key).cloned()),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        self.writes.stage(key, Some(value.to_vec()))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), EngineError> {
        self.writes.stage(key, None)
    }

    fn cursor(&self, reverse: bool) -> BTreeCursor<'_> {
        MergedCursor::new(&self.snapshot, self.writes.pending(), reverse)
    }

    fn commit(self) -> Result<(), EngineError> {
        let BTreeTxn {
            engine,
            snapshot,
            writes,
        } = self;
        // a live snapshot would force make_mut to clone the whole tree
        drop(snapshot);
        engine.commit(writes.into_pending())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::KvCursor;

    fn engine() -> BTreeEngine {
        BTreeEngine::in_memory(EngineOptions::default()).unwrap()
    }

    fn put_all(engine: &BTreeEngine, pairs: &[(&str, &str)]) {
        let mut txn = engine.begin(true).unwrap();
        for (key, value) in pairs {
            txn.set(key.as_bytes(), value.as_bytes()).unwrap();
        }
        txn.commit().unwrap();
    }

    fn walk(txn: &BTreeTxn<'_>, reverse: bool, seek: &[u8]) -> Vec<Vec<u8>> {
        let mut cursor = txn.cursor(reverse);
        cursor.seek(seek).unwrap();
        let mut keys = Vec::new();
        while let Some(key) = cursor.key() {
            keys.push(key.to_vec());
            cursor.next().unwrap();
        }
        keys
    }

    #[test]
    fn committed_writes_are_visible_to_new_transactions() {
        let engine = engine();
        put_all(&engine, &[("a", "1")]);

        let txn = engine.begin(false).unwrap();
        assert_eq!(txn.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(txn.get(b"b").unwrap(), None);
    }

    #[test]
    fn dropped_transaction_is_discarded() {
        let engine = engine();
        {
            let mut txn = engine.begin(true).unwrap();
            txn.set(b"a", b"1").unwrap();
        }
        assert_eq!(engine.key_count().unwrap(), 0);
    }

    #[test]
    fn read_only_transaction_rejects_writes() {
        let engine = engine();
        let mut txn = engine.begin(false).unwrap();

        assert!(matches!(txn.set(b"a", b"1"), Err(EngineError::ReadOnly)));
        assert!(matches!(txn.delete(b"a"), Err(EngineError::ReadOnly)));
    }

    #[test]
    fn mutation_limit_is_enforced_per_transaction() {
        let engine = BTreeEngine::in_memory(EngineOptions::default().with_max_batch_count(2)).unwrap();
        let mut txn = engine.begin(true).unwrap();
        txn.set(b"a", b"1").unwrap();
        txn.set(b"b", b"1").unwrap();
        // rewriting a staged key does not count again
        txn.set(b"a", b"2").unwrap();

        assert!(matches!(txn.set(b"c", b"1"), Err(EngineError::TxnTooBig { limit: 2 })));
    }

    #[test]
    fn snapshot_does_not_see_later_commits() {
        let engine = engine();
        let reader = engine.begin(false).unwrap();
        put_all(&engine, &[("a", "1")]);

        assert_eq!(reader.get(b"a").unwrap(), None);
    }

    #[test]
    fn forward_seek_lands_on_first_key_at_or_after() {
        let engine = engine();
        put_all(&engine, &[("b", ""), ("d", ""), ("f", "")]);
        let txn = engine.begin(false).unwrap();

        assert_eq!(walk(&txn, false, b"c"), vec![b"d".to_vec(), b"f".to_vec()]);
        assert_eq!(walk(&txn, false, b"d"), vec![b"d".to_vec(), b"f".to_vec()]);
        assert!(walk(&txn, false, b"g").is_empty());
    }

    #[test]
    fn reverse_seek_lands_on_last_key_at_or_before() {
        let engine = engine();
        put_all(&engine, &[("b", ""), ("d", ""), ("f", "")]);
        let txn = engine.begin(false).unwrap();

        assert_eq!(walk(&txn, true, b"e"), vec![b"d".to_vec(), b"b".to_vec()]);
        assert_eq!(walk(&txn, true, b"d"), vec![b"d".to_vec(), b"b".to_vec()]);
        assert!(walk(&txn, true, b"a").is_empty());
    }

    #[test]
    fn cursor_merges_pending_writes_and_deletes() {
        let engine = engine();
        put_all(&engine, &[("a", "1"), ("c", "3"), ("e", "5")]);

        let mut txn = engine.begin(true).unwrap();
        txn.delete(b"c").unwrap();
        txn.set(b"d", b"4").unwrap();
        txn.set(b"e", b"50").unwrap();

        assert_eq!(
            walk(&txn, false, b""),
            vec![b"a".to_vec(), b"d".to_vec(), b"e".to_vec()]
        );
        assert_eq!(
            walk(&txn, true, b"z"),
            vec![b"e".to_vec(), b"d".to_vec(), b"a".to_vec()]
        );

        let mut cursor = txn.cursor(false);
        cursor.seek(b"e").unwrap();
        assert_eq!(cursor.value(), Some(&b"50"[..]));
    }

    #[test]
    fn valid_for_prefix_checks_the_current_key() {
        let engine = engine();
        put_all(&engine, &[("log1", ""), ("mog1", "")]);
        let txn = engine.begin(false).unwrap();

        let mut cursor = txn.cursor(false);
        cursor.seek(b"log").unwrap();
        assert!(cursor.valid_for_prefix(b"log"));
        cursor.next().unwrap();
        assert!(!cursor.valid_for_prefix(b"log"));
        cursor.next().unwrap();
        assert!(cursor.key().is_none());
        assert!(!cursor.valid_for_prefix(b""));
    }

    #[test]
    fn zero_batch_count_is_rejected() {
        let options = EngineOptions::default().with_max_batch_count(0);
        assert!(matches!(
            BTreeEngine::in_memory(options),
            Err(EngineError::InvalidOptions(_))
        ));
    }
}
