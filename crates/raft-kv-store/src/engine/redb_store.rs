//! # redb_store
//!
//! why: the log and stable store must survive restarts without a hand-rolled file format
//! relations: implements the engine traits over a redb database; cursors merge via merge.rs
//! what: RedbEngine, RedbTxn (read snapshot plus staged writes), RedbCursor
//!
//! every store shares one `kv` table; stores are kept apart by key prefix.
//! a transaction reads from a redb read snapshot and only opens a redb write
//! transaction at commit, so readers never wait on a writer.

use std::ops::Bound::{self, Unbounded};
use std::path::Path;

use redb::{Database, Durability, ReadOnlyTable, ReadTransaction, ReadableTable, TableDefinition};
use tracing::{debug, info};

use super::merge::{MergedCursor, OrderedSnapshot, Pending, WriteSet};
use super::{EngineOptions, KvEngine, KvTransaction};
use crate::error::EngineError;

const KV_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("kv");

type KvTable = ReadOnlyTable<&'static [u8], &'static [u8]>;

fn redb_err(err: impl Into<redb::Error>) -> EngineError {
    EngineError::Redb(err.into())
}

/// durable ordered engine backed by a single redb file
pub struct RedbEngine {
    db: Database,
    options: EngineOptions,
}

impl RedbEngine {
    /// create or open the database file at `path`
    pub fn open(path: impl AsRef<Path>, options: EngineOptions) -> Result<Self, EngineError> {
        options.validate()?;
        let path = path.as_ref();
        let db = Database::create(path).map_err(redb_err)?;

        // make sure the table exists so read transactions can open it
        let write_txn = db.begin_write().map_err(redb_err)?;
        {
            let _table = write_txn.open_table(KV_TABLE).map_err(redb_err)?;
        }
        write_txn.commit().map_err(redb_err)?;

        info!(
            path = %path.display(),
            sync_writes = options.sync_writes,
            "opened redb engine"
        );
        Ok(Self { db, options })
    }

    fn commit(&self, pending: Pending) -> Result<(), EngineError> {
        if pending.is_empty() {
            return Ok(());
        }
        let mut write_txn = self.db.begin_write().map_err(redb_err)?;
        write_txn.set_durability(if self.options.sync_writes {
            Durability::Immediate
        } else {
            Durability::Eventual
        });
        let mutations = pending.len();
        {
            let mut table = write_txn.open_table(KV_TABLE).map_err(redb_err)?;
            for (key, value) in &pending {
                match value {
                    Some(value) => {
                        table
                            .insert(key.as_slice(), value.as_slice())
                            .map_err(redb_err)?;
                    }
                    None => {
                        table.remove(key.as_slice()).map_err(redb_err)?;
                    }
                }
            }
        }
        write_txn.commit().map_err(redb_err)?;
        debug!(mutations, "commit");
        Ok(())
    }
}

impl KvEngine for RedbEngine {
    type Txn<'a> = RedbTxn<'a>;

    fn begin(&self, writable: bool) -> Result<RedbTxn<'_>, EngineError> {
        let read_txn = self.db.begin_read().map_err(redb_err)?;
        let table = read_txn.open_table(KV_TABLE).map_err(redb_err)?;
        Ok(RedbTxn {
            table,
            _read_txn: read_txn,
            engine: self,
            writes: WriteSet::new(writable, self.options.max_batch_count),
        })
    }

    fn max_batch_count(&self) -> usize {
        self.options.max_batch_count
    }
}

impl OrderedSnapshot for KvTable {
    fn ceiling(&self, from: Bound<&[u8]>) -> Result<Option<(Vec<u8>, Vec<u8>)>, EngineError> {
        let mut range = self.range::<&[u8]>((from, Unbounded)).map_err(redb_err)?;
        match range.next() {
            Some(item) => {
                let (key, value) = item.map_err(redb_err)?;
                Ok(Some((key.value().to_vec(), value.value().to_vec())))
            }
            None => Ok(None),
        }
    }

    fn floor(&self, from: Bound<&[u8]>) -> Result<Option<(Vec<u8>, Vec<u8>)>, EngineError> {
        let mut range = self.range::<&[u8]>((Unbounded, from)).map_err(redb_err)?;
        match range.next_back() {
            Some(item) => {
                let (key, value) = item.map_err(redb_err)?;
                Ok(Some((key.value().to_vec(), value.value().to_vec())))
            }
            None => Ok(None),
        }
    }

    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let value = self.get(key).map_err(redb_err)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }
}

/// snapshot transaction over a RedbEngine
pub struct RedbTxn<'a> {
    // dropped before the read transaction it was opened from
    table: KvTable,
    _read_txn: ReadTransaction,
    engine: &'a RedbEngine,
    writes: WriteSet,
}

/// cursor over a RedbTxn's snapshot and its pending writes
pub type RedbCursor<'c> = MergedCursor<'c, KvTable>;

impl KvTransaction for RedbTxn<'_> {
    type Cursor<'c> = RedbCursor<'c> where Self: 'c;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged),
            None => self.table.lookup(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        self.writes.stage(key, Some(value.to_vec()))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), EngineError> {
        self.writes.stage(key, None)
    }

    fn cursor(&self, reverse: bool) -> RedbCursor<'_> {
        MergedCursor::new(&self.table, self.writes.pending(), reverse)
    }

    fn commit(self) -> Result<(), EngineError> {
        let RedbTxn {
            table,
            _read_txn,
            engine,
            writes,
        } = self;
        drop(table);
        drop(_read_txn);
        engine.commit(writes.into_pending())
    }
}
