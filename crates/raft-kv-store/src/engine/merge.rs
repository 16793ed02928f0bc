//! # merge
//!
//! why: both engines buffer writes per transaction and must show them to their own cursors
//! relations: used by BTreeTxn and RedbTxn
//! what: WriteSet staging buffer, OrderedSnapshot lookups, MergedCursor

use std::collections::BTreeMap;
use std::ops::Bound::{self, Excluded, Included, Unbounded};

use super::KvCursor;
use crate::error::EngineError;

/// writes buffered by a transaction; `None` marks a delete
pub(crate) type Pending = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

type Entry = (Vec<u8>, Vec<u8>);

/// committed, read-only view a transaction was opened on
pub trait OrderedSnapshot {
    /// smallest entry inside `from..`
    fn ceiling(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, EngineError>;

    /// greatest entry inside `..from`
    fn floor(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, EngineError>;

    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError>;
}

impl OrderedSnapshot for BTreeMap<Vec<u8>, Vec<u8>> {
    fn ceiling(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, EngineError> {
        Ok(self
            .range::<[u8], _>((from, Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone())))
    }

    fn floor(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, EngineError> {
        Ok(self
            .range::<[u8], _>((Unbounded, from))
            .next_back()
            .map(|(k, v)| (k.clone(), v.clone())))
    }

    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.get(key).cloned())
    }
}

/// staged mutations of one transaction, capped at the engine's batch limit
pub(crate) struct WriteSet {
    pending: Pending,
    writable: bool,
    limit: usize,
}

impl WriteSet {
    pub(crate) fn new(writable: bool, limit: usize) -> Self {
        Self {
            pending: Pending::new(),
            writable,
            limit,
        }
    }

    /// `Some(None)` when the key was deleted in this transaction
    pub(crate) fn get(&self, key: &[u8]) -> Option<Option<Vec<u8>>> {
        self.pending.get(key).cloned()
    }

    pub(crate) fn stage(&mut self, key: &[u8], value: Option<Vec<u8>>) -> Result<(), EngineError> {
        if !self.writable {
            return Err(EngineError::ReadOnly);
        }
        if !self.pending.contains_key(key) && self.pending.len() >= self.limit {
            return Err(EngineError::TxnTooBig { limit: self.limit });
        }
        self.pending.insert(key.to_vec(), value);
        Ok(())
    }

    pub(crate) fn pending(&self) -> &Pending {
        &self.pending
    }

    pub(crate) fn into_pending(self) -> Pending {
        self.pending
    }
}

/// cursor over a snapshot merged with a transaction's staged writes
pub struct MergedCursor<'c, S> {
    committed: &'c S,
    pending: &'c Pending,
    reverse: bool,
    current: Option<Entry>,
}

impl<'c, S: OrderedSnapshot> MergedCursor<'c, S> {
    pub(crate) fn new(committed: &'c S, pending: &'c Pending, reverse: bool) -> Self {
        Self {
            committed,
            pending,
            reverse,
            current: None,
        }
    }

    /// true when `a` comes before `b` in this cursor's direction
    fn precedes(&self, a: &[u8], b: &[u8]) -> bool {
        if self.reverse {
            a > b
        } else {
            a < b
        }
    }

    fn locate(&self, from: Bound<Vec<u8>>) -> Result<Option<Entry>, EngineError> {
        let pending: &'c Pending = self.pending;
        let mut from = from;
        loop {
            let bound = borrowed(&from);
            let (base, staged) = if self.reverse {
                (
                    self.committed.floor(bound)?,
                    pending.range::<[u8], _>((Unbounded, bound)).next_back(),
                )
            } else {
                (
                    self.committed.ceiling(bound)?,
                    pending.range::<[u8], _>((bound, Unbounded)).next(),
                )
            };
            let (key, value) = match (base, staged) {
                (None, None) => return Ok(None),
                (Some(entry), None) => return Ok(Some(entry)),
                (Some(entry), Some((key, _))) if self.precedes(&entry.0, key) => {
                    return Ok(Some(entry))
                }
                (_, Some((key, value))) => (key, value),
            };
            match value {
                Some(value) => return Ok(Some((key.clone(), value.clone()))),
                // deleted in this transaction, keep going past it
                None => from = Excluded(key.clone()),
            }
        }
    }
}

fn borrowed(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Included(key) => Included(key.as_slice()),
        Excluded(key) => Excluded(key.as_slice()),
        Unbounded => Unbounded,
    }
}

impl<S: OrderedSnapshot> KvCursor for MergedCursor<'_, S> {
    fn seek(&mut self, key: &[u8]) -> Result<(), EngineError> {
        self.current = self.locate(Included(key.to_vec()))?;
        Ok(())
    }

    fn key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(key, _)| key.as_slice())
    }

    fn value(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(_, value)| value.as_slice())
    }

    fn next(&mut self) -> Result<(), EngineError> {
        if let Some((key, _)) = self.current.take() {
            self.current = self.locate(Excluded(key))?;
        }
        Ok(())
    }
}
