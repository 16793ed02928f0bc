//! # log_store
//!
//! why: durable, indexed, range-deletable storage for the replicated log
//! relations: built on engine traits and keys.rs, exposed through storage::LogStorage
//! what: IndexedLogStore with boundary discovery, batched append, inclusive range delete

use std::sync::Arc;

use raft_entry::LogEntry;
use tracing::debug;

use crate::codec::{decode_entry, encode_entry};
use crate::engine::{KvCursor, KvEngine, KvTransaction};
use crate::error::{Result, StorageError};
use crate::keys::{log_index, log_key, reverse_seek_key};

/// log entries keyed by `prefix ++ be_u64(index)`
///
/// the store keeps no state besides the engine handle and its prefix; every
/// call opens and finishes its own transactions.
pub struct IndexedLogStore<E> {
    engine: Arc<E>,
    prefix: Vec<u8>,
}

impl<E: KvEngine> IndexedLogStore<E> {
    /// prefixes of stores sharing an engine must be disjoint
    pub fn new(engine: Arc<E>, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            engine,
            prefix: prefix.into(),
        }
    }

    /// smallest stored index, 0 when the log is empty
    pub fn first_index(&self) -> Result<u64> {
        let txn = self.engine.begin(false)?;
        let mut cursor = txn.cursor(false);
        cursor.seek(&self.prefix)?;
        Ok(self.boundary(&cursor))
    }

    /// largest stored index, 0 when the log is empty
    pub fn last_index(&self) -> Result<u64> {
        let txn = self.engine.begin(false)?;
        let mut cursor = txn.cursor(true);
        cursor.seek(&reverse_seek_key(&self.prefix))?;
        Ok(self.boundary(&cursor))
    }

    /// index of the key the cursor landed on
    ///
    /// only that one key is looked at: a key under the prefix whose suffix is
    /// not exactly 8 bytes reads as 0, the same as an empty log.
    fn boundary(&self, cursor: &impl KvCursor) -> u64 {
        if !cursor.valid_for_prefix(&self.prefix) {
            return 0;
        }
        cursor
            .key()
            .and_then(|key| log_index(&self.prefix, key))
            .unwrap_or(0)
    }

    /// entry stored at `index`, or `StorageError::NotFound`
    pub fn get(&self, index: u64) -> Result<LogEntry> {
        let txn = self.engine.begin(false)?;
        let bytes = txn
            .get(&log_key(&self.prefix, index))?
            .ok_or(StorageError::NotFound)?;
        Ok(decode_entry(&bytes)?)
    }

    /// write one entry atomically
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let data = encode_entry(entry)?;
        let mut txn = self.engine.begin(true)?;
        txn.set(&log_key(&self.prefix, entry.index), &data)?;
        txn.commit()?;
        debug!(index = entry.index, term = entry.term, "appended log entry");
        Ok(())
    }

    /// write entries in transactions of at most `max_batch_count` mutations
    ///
    /// each transaction is atomic on its own; when one fails, the ones before
    /// it stay committed.
    pub fn append_batch(&self, entries: &[LogEntry]) -> Result<()> {
        let limit = self.engine.max_batch_count().max(1);
        for chunk in entries.chunks(limit) {
            let mut txn = self.engine.begin(true)?;
            for entry in chunk {
                let data = encode_entry(entry)?;
                txn.set(&log_key(&self.prefix, entry.index), &data)?;
            }
            txn.commit()?;
        }
        if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
            debug!(first = first.index, last = last.index, count = entries.len(), "appended log batch");
        }
        Ok(())
    }

    /// delete every stored index in `[min, max]`
    ///
    /// deletes are committed in transactions of at most `max_batch_count`
    /// keys, with the same partial-durability caveat as `append_batch`.
    pub fn delete_range(&self, min: u64, max: u64) -> Result<()> {
        if min > max {
            return Ok(());
        }
        let limit = self.engine.max_batch_count().max(1);
        let mut from = min;
        let mut deleted = 0usize;
        loop {
            let mut txn = self.engine.begin(true)?;
            let doomed = self.collect_range(&txn, from, max, limit)?;
            let Some(&(last, _)) = doomed.last() else {
                break;
            };
            for (_, key) in &doomed {
                txn.delete(key)?;
            }
            txn.commit()?;
            deleted += doomed.len();

            if doomed.len() < limit {
                break;
            }
            match last.checked_add(1) {
                Some(next) if next <= max => from = next,
                _ => break,
            }
        }
        debug!(min, max, deleted, "deleted log range");
        Ok(())
    }

    /// up to `limit` (index, key) pairs in `[from, max]`, ascending;
    /// malformed keys under the prefix are stepped over
    fn collect_range<T: KvTransaction>(
        &self,
        txn: &T,
        from: u64,
        max: u64,
        limit: usize,
    ) -> Result<Vec<(u64, Vec<u8>)>> {
        let mut found = Vec::new();
        let mut cursor = txn.cursor(false);
        cursor.seek(&log_key(&self.prefix, from))?;
        while found.len() < limit && cursor.valid_for_prefix(&self.prefix) {
            if let Some(key) = cursor.key() {
                if let Some(index) = log_index(&self.prefix, key) {
                    if index > max {
                        break;
                    }
                    found.push((index, key.to_vec()));
                }
            }
            cursor.next()?;
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BTreeEngine, EngineOptions};

    fn store(max_batch_count: usize) -> IndexedLogStore<BTreeEngine> {
        let options = EngineOptions::default().with_max_batch_count(max_batch_count);
        let engine = Arc::new(BTreeEngine::in_memory(options).unwrap());
        IndexedLogStore::new(engine, "log")
    }

    fn entries(indices: impl IntoIterator<Item = u64>) -> Vec<LogEntry> {
        indices
            .into_iter()
            .map(|i| LogEntry::new(1, i, format!("cmd{i}").into_bytes()))
            .collect()
    }

    fn stored(store: &IndexedLogStore<BTreeEngine>, indices: impl IntoIterator<Item = u64>) -> Vec<u64> {
        indices
            .into_iter()
            .filter(|&i| store.get(i).is_ok())
            .collect()
    }

    #[test]
    fn empty_log_reports_zero_boundaries() {
        let store = store(16);
        assert_eq!(store.first_index().unwrap(), 0);
        assert_eq!(store.last_index().unwrap(), 0);
    }

    #[test]
    fn missing_index_is_not_found() {
        let store = store(16);
        assert!(store.get(100).unwrap_err().is_not_found());
    }

    #[test]
    fn append_then_get_round_trips() {
        let store = store(16);
        let entry = LogEntry::new(2, 5, b"alex".to_vec()).with_extensions(vec![7]);

        store.append(&entry).unwrap();

        assert_eq!(store.get(5).unwrap(), entry);
    }

    #[test]
    fn batch_larger_than_limit_is_fully_written() {
        let store = store(4);
        store.append_batch(&entries(1..=11)).unwrap();

        assert_eq!(stored(&store, 1..=11).len(), 11);
        assert_eq!(store.first_index().unwrap(), 1);
        assert_eq!(store.last_index().unwrap(), 11);
    }

    #[test]
    fn delete_range_spanning_several_transactions() {
        let store = store(3);
        store.append_batch(&entries(1..=20)).unwrap();

        store.delete_range(4, 15).unwrap();

        assert_eq!(stored(&store, 1..=20), vec![1, 2, 3, 16, 17, 18, 19, 20]);
    }

    #[test]
    fn delete_range_with_exact_multiple_of_limit() {
        let store = store(3);
        store.append_batch(&entries(1..=6)).unwrap();

        store.delete_range(1, 6).unwrap();

        assert_eq!(store.first_index().unwrap(), 0);
        assert_eq!(store.last_index().unwrap(), 0);
    }

    #[test]
    fn delete_range_with_inverted_bounds_is_noop() {
        let store = store(16);
        store.append_batch(&entries(1..=5)).unwrap();

        store.delete_range(5, 2).unwrap();

        assert_eq!(stored(&store, 1..=5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn malformed_first_key_reads_as_zero() {
        let store = store(16);
        store.append_batch(&entries([5, 7])).unwrap();
        let mut txn = store.engine.begin(true).unwrap();
        txn.set(b"log", b"").unwrap();
        txn.commit().unwrap();

        // the forward scan lands on the bare prefix, the reverse scan on entry 7
        assert_eq!(store.first_index().unwrap(), 0);
        assert_eq!(store.last_index().unwrap(), 7);
    }

    #[test]
    fn delete_range_up_to_max_index() {
        let store = store(2);
        store.append_batch(&entries([u64::MAX - 2, u64::MAX - 1, u64::MAX])).unwrap();

        store.delete_range(u64::MAX - 1, u64::MAX).unwrap();

        assert_eq!(store.first_index().unwrap(), u64::MAX - 2);
        assert_eq!(store.last_index().unwrap(), u64::MAX - 2);
    }
}
