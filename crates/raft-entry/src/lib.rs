//! # raft-entry
//!
//! why: pin down the shape of a replicated log entry independently of where it is stored
//! relations: produced by the consensus engine, persisted by raft-kv-store
//! what: LogEntry struct, LogType enumeration

pub mod log;

pub use log::{LogEntry, LogType};
