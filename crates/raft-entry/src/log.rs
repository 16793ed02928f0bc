//! # log
//!
//! why: describe the unit the consensus engine appends to its replicated log
//! relations: encoded by raft-kv-store's codec, keyed by `index` in the log store
//! what: LogEntry struct, LogType tag

use serde::{Deserialize, Serialize};

/// Semantic kind of a log entry
///
/// The storage layer never interprets this, it only carries it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogType {
    /// A command destined for the replicated state machine
    #[default]
    Command,
    /// Establishes leadership without touching the state machine
    Noop,
    /// Legacy single-peer membership addition
    AddPeerDeprecated,
    /// Legacy single-peer membership removal
    RemovePeerDeprecated,
    /// Forces all preceding entries to be applied
    Barrier,
    /// Cluster membership configuration
    Configuration,
}

/// A single entry in the replicated log
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position of this entry in the log (1-indexed by convention)
    pub index: u64,
    /// The term when this entry was created
    pub term: u64,
    /// What kind of entry this is
    pub entry_type: LogType,
    /// Opaque payload, usually a state machine command
    pub data: Vec<u8>,
    /// Opaque engine-internal metadata
    pub extensions: Vec<u8>,
}

impl LogEntry {
    /// Create a command entry with no extensions
    pub fn new(term: u64, index: u64, data: Vec<u8>) -> Self {
        Self {
            index,
            term,
            entry_type: LogType::Command,
            data,
            extensions: Vec::new(),
        }
    }

    /// Replace the entry type
    pub fn with_type(mut self, entry_type: LogType) -> Self {
        self.entry_type = entry_type;
        self
    }

    /// Attach extension bytes
    pub fn with_extensions(mut self, extensions: Vec<u8>) -> Self {
        self.extensions = extensions;
        self
    }
}
