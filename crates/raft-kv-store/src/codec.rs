//! # codec
//!
//! why: entries are stored as bytes; the same scheme must be used on write and read
//! relations: called by log_store on append and get
//! what: encode_entry, decode_entry (bincode, payloads stored as raw length-prefixed bytes)

use raft_entry::LogEntry;

use crate::error::CodecError;

pub fn encode_entry(entry: &LogEntry) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(entry)?)
}

pub fn decode_entry(bytes: &[u8]) -> Result<LogEntry, CodecError> {
    Ok(bincode::deserialize(bytes)?)
}
