//! Event slots and batch results.

use chrono::Utc;
use std::io;

/// Timestamp value the host treats as "not set by the plugin".
pub const TIMESTAMP_UNSET: u64 = u64::MAX;

/// A host-supplied destination for one produced event.
///
/// The plugin never keeps a reference to a slot past the call that handed it in.
pub trait EventWriter {
    /// Set the event timestamp in nanoseconds since the Unix epoch.
    fn set_timestamp(&mut self, ts: u64);

    /// Replace the event payload with `payload`.
    fn write_payload(&mut self, payload: &[u8]) -> io::Result<()>;
}

/// Owned event slot, used by hosts that don't bring their own buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBuffer {
    timestamp: u64,
    data: Vec<u8>,
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self {
            timestamp: TIMESTAMP_UNSET,
            data: Vec::new(),
        }
    }
}

impl EventBuffer {
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl EventWriter for EventBuffer {
    fn set_timestamp(&mut self, ts: u64) {
        self.timestamp = ts;
    }

    fn write_payload(&mut self, payload: &[u8]) -> io::Result<()> {
        self.data.clear();
        self.data.extend_from_slice(payload);
        Ok(())
    }
}

/// Whether a session can produce more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// The batch filled the caller's capacity and events remain
    More,
    /// The session has produced all of its events; every later batch is empty
    Exhausted,
}

/// Result of one `next_batch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// Number of leading slots that were filled
    pub count: usize,
    pub status: BatchStatus,
}

impl Batch {
    pub fn is_exhausted(&self) -> bool {
        self.status == BatchStatus::Exhausted
    }
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub(crate) fn now_nanos() -> u64 {
    // Out of range only past the year 2262; leave the slot for the host to fill.
    Utc::now()
        .timestamp_nanos_opt()
        .map_or(TIMESTAMP_UNSET, |ts| ts as u64)
}
