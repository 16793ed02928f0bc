//! # error
//!
//! why: give the consensus engine one error type with a recognisable not-found sentinel
//! relations: returned by every store and engine operation
//! what: StorageError, EngineError, CodecError, Result alias

use thiserror::Error;

/// result type used by both stores
pub type Result<T> = std::result::Result<T, StorageError>;

/// errors surfaced to the consensus engine
#[derive(Debug, Error)]
pub enum StorageError {
    /// no log entry is stored at the requested index
    #[error("log entry not found")]
    NotFound,

    /// stored bytes could not be encoded or decoded
    #[error("encoding error: {0}")]
    Encoding(#[from] CodecError),

    /// the key-value engine failed
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl StorageError {
    /// true for the expected "no such entry" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}

/// failures turning values into bytes and back
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("log entry codec: {0}")]
    Entry(#[from] bincode::Error),

    #[error("expected 8 bytes for a u64 value, found {0}")]
    Uint64Length(usize),
}

/// failures reported by a key-value engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("write attempted on a read-only transaction")]
    ReadOnly,

    #[error("transaction exceeds {limit} mutations")]
    TxnTooBig { limit: usize },

    #[error("redb: {0}")]
    Redb(#[from] redb::Error),

    #[error("invalid engine options: {0}")]
    InvalidOptions(String),

    #[error("engine lock poisoned")]
    Poisoned,
}
