//! # storage
//!
//! why: the consensus engine programs against traits, not concrete stores
//! relations: implemented by IndexedLogStore and FactStore
//! what: LogStorage and FactStorage traits, well-known fact keys

use raft_entry::LogEntry;

use crate::engine::KvEngine;
use crate::error::Result;
use crate::fact_store::FactStore;
use crate::keys::{decode_u64, encode_u64};
use crate::log_store::IndexedLogStore;

/// fact key holding the current term
pub const CURRENT_TERM_KEY: &[u8] = b"CurrentTerm";

/// fact key holding the candidate voted for in the current term
pub const VOTED_FOR_KEY: &[u8] = b"VotedFor";

/// durable replicated log
pub trait LogStorage {
    /// smallest stored index, 0 when empty
    fn first_index(&self) -> Result<u64>;

    /// largest stored index, 0 when empty
    fn last_index(&self) -> Result<u64>;

    /// entry at `index`; `StorageError::NotFound` when absent
    fn get_log(&self, index: u64) -> Result<LogEntry>;

    fn store_log(&self, entry: &LogEntry) -> Result<()>;

    fn store_logs(&self, entries: &[LogEntry]) -> Result<()>;

    /// remove `[min, max]` inclusive
    fn delete_range(&self, min: u64, max: u64) -> Result<()>;
}

/// durable key/value facts; absent keys read as zero values
pub trait FactStorage {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    fn set_u64(&self, key: &[u8], value: u64) -> Result<()>;

    fn get_u64(&self, key: &[u8]) -> Result<u64>;

    /// persist the current term and vote together
    fn save_term_and_vote(&self, term: u64, voted_for: Option<u64>) -> Result<()>;

    /// load the persisted term and vote, `(0, None)` for a new node
    fn load_term_and_vote(&self) -> Result<(u64, Option<u64>)> {
        let term = self.get_u64(CURRENT_TERM_KEY)?;
        let vote = self.get(VOTED_FOR_KEY)?;
        let voted_for = if vote.is_empty() {
            None
        } else {
            Some(decode_u64(&vote)?)
        };
        Ok((term, voted_for))
    }
}

impl<E: KvEngine> LogStorage for IndexedLogStore<E> {
    fn first_index(&self) -> Result<u64> {
        IndexedLogStore::first_index(self)
    }

    fn last_index(&self) -> Result<u64> {
        IndexedLogStore::last_index(self)
    }

    fn get_log(&self, index: u64) -> Result<LogEntry> {
        self.get(index)
    }

    fn store_log(&self, entry: &LogEntry) -> Result<()> {
        self.append(entry)
    }

    fn store_logs(&self, entries: &[LogEntry]) -> Result<()> {
        self.append_batch(entries)
    }

    fn delete_range(&self, min: u64, max: u64) -> Result<()> {
        IndexedLogStore::delete_range(self, min, max)
    }
}

impl<E: KvEngine> FactStorage for FactStore<E> {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        FactStore::set(self, key, value)
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        FactStore::get(self, key)
    }

    fn set_u64(&self, key: &[u8], value: u64) -> Result<()> {
        FactStore::set_u64(self, key, value)
    }

    fn get_u64(&self, key: &[u8]) -> Result<u64> {
        FactStore::get_u64(self, key)
    }

    fn save_term_and_vote(&self, term: u64, voted_for: Option<u64>) -> Result<()> {
        let term = encode_u64(term);
        // an empty vote value means "no vote"
        let vote = voted_for.map(encode_u64);
        let vote: &[u8] = match &vote {
            Some(bytes) => bytes,
            None => &[],
        };
        self.set_all(&[(CURRENT_TERM_KEY, &term[..]), (VOTED_FOR_KEY, vote)])
    }
}
