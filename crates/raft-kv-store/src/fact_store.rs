//! # fact_store
//!
//! why: term, vote and similar facts must survive restarts alongside the log
//! relations: built on engine traits and keys.rs, exposed through storage::FactStorage
//! what: FactStore with raw byte get/set and a big-endian u64 accessor

use std::sync::Arc;

use tracing::debug;

use crate::engine::{KvEngine, KvTransaction};
use crate::error::Result;
use crate::keys::{decode_u64, encode_u64, fact_key};

/// arbitrary key/value facts stored under `prefix ++ key`
///
/// a key that was never written reads as the zero value, never as an error.
pub struct FactStore<E> {
    engine: Arc<E>,
    prefix: Vec<u8>,
}

impl<E: KvEngine> FactStore<E> {
    pub fn new(engine: Arc<E>, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            engine,
            prefix: prefix.into(),
        }
    }

    /// upsert `key`; an empty value is stored, not treated as a delete
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut txn = self.engine.begin(true)?;
        txn.set(&fact_key(&self.prefix, key), value)?;
        txn.commit()?;
        debug!(key = %String::from_utf8_lossy(key), len = value.len(), "stored fact");
        Ok(())
    }

    /// upsert several keys in one transaction
    pub fn set_all(&self, pairs: &[(&[u8], &[u8])]) -> Result<()> {
        let mut txn = self.engine.begin(true)?;
        for (key, value) in pairs {
            txn.set(&fact_key(&self.prefix, key), value)?;
        }
        txn.commit()?;
        debug!(count = pairs.len(), "stored facts");
        Ok(())
    }

    /// stored value, or empty bytes if `key` was never set
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        Ok(self.lookup(key)?.unwrap_or_default())
    }

    /// stored value, telling an absent key apart from an empty value
    pub fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let txn = self.engine.begin(false)?;
        Ok(txn.get(&fact_key(&self.prefix, key))?)
    }

    pub fn set_u64(&self, key: &[u8], value: u64) -> Result<()> {
        self.set(key, &encode_u64(value))
    }

    /// stored u64, or 0 if `key` was never set
    ///
    /// a stored value that is not exactly 8 bytes is an encoding error.
    pub fn get_u64(&self, key: &[u8]) -> Result<u64> {
        match self.lookup(key)? {
            Some(bytes) => Ok(decode_u64(&bytes)?),
            None => Ok(0),
        }
    }
}
