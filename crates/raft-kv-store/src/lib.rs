//! # raft-kv-store
//!
//! why: give a consensus engine durable log and term/vote storage on top of any
//!      transactional ordered key-value engine
//! relations: stores raft-entry's LogEntry; consumed by the consensus engine through the storage traits
//! what: IndexedLogStore, FactStore, KvEngine traits, RedbEngine (durable) and BTreeEngine (volatile)
//!
//! both stores are stateless adapters: they hold an `Arc` of the engine and a
//! key prefix, and every call runs in its own transaction(s).
//!
//! ```
//! use std::sync::Arc;
//! use raft_entry::LogEntry;
//! use raft_kv_store::{EngineOptions, FactStore, IndexedLogStore, RedbEngine};
//!
//! let dir = tempfile::tempdir().map_err(raft_kv_store::EngineError::from)?;
//! let engine = Arc::new(RedbEngine::open(dir.path().join("raft.redb"), EngineOptions::default())?);
//! let log = IndexedLogStore::new(Arc::clone(&engine), "log");
//! let facts = FactStore::new(engine, "conf");
//!
//! log.append(&LogEntry::new(1, 1, b"set x 1".to_vec()))?;
//! facts.set_u64(b"CurrentTerm", 1)?;
//!
//! assert_eq!(log.last_index()?, 1);
//! assert_eq!(facts.get_u64(b"CurrentTerm")?, 1);
//! # Ok::<(), raft_kv_store::StorageError>(())
//! ```

pub mod codec;
pub mod engine;
pub mod error;
pub mod fact_store;
pub mod keys;
pub mod log_store;
pub mod storage;

pub use engine::{BTreeEngine, EngineOptions, KvCursor, KvEngine, KvTransaction, RedbEngine};
pub use error::{CodecError, EngineError, Result, StorageError};
pub use fact_store::FactStore;
pub use log_store::IndexedLogStore;
pub use storage::{FactStorage, LogStorage, CURRENT_TERM_KEY, VOTED_FOR_KEY};
