//! Record store abstraction
//!
//! The device variant retains a bounded ring; the service variant can keep
//! every record ever written. Offset resolution and the access coordinator
//! only need the operations below.

use tracing::trace;

use crate::error::LogResult;
use crate::record::Record;
use crate::ring::RingLog;

/// Ordered, append-only container of finalized records
///
/// Insertion order is retention order is read order.
pub trait RecordStore: Send {
    /// Take ownership of `record`, returning a record evicted to make room
    fn append(&mut self, record: Record) -> Option<Record>;

    /// Sum of the lengths of all retained records
    fn total_length(&self) -> u64;

    /// Number of retained records
    fn len(&self) -> usize;

    /// Whether no records are retained
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retained records, oldest first
    ///
    /// Each call starts a fresh pass over the store.
    fn records(&self) -> Box<dyn Iterator<Item = &Record> + '_>;

    /// Remove and return every record, oldest first
    fn drain(&mut self) -> Vec<Record>;
}

/// Store that never evicts
#[derive(Debug, Default)]
pub struct UnboundedLog {
    records: Vec<Record>,
    total_length: u64,
}

impl UnboundedLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for UnboundedLog {
    fn append(&mut self, record: Record) -> Option<Record> {
        self.total_length += record.len() as u64;
        self.records.push(record);
        trace!(records = self.records.len(), "Appended to unbounded log");
        None
    }

    fn total_length(&self) -> u64 {
        self.total_length
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn records(&self) -> Box<dyn Iterator<Item = &Record> + '_> {
        Box::new(self.records.iter())
    }

    fn drain(&mut self) -> Vec<Record> {
        self.total_length = 0;
        std::mem::take(&mut self.records)
    }
}

/// Retention policy chosen at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Keep at most this many records, evicting the oldest
    Bounded(usize),
    /// Keep everything
    Unbounded,
}

impl Default for Retention {
    fn default() -> Self {
        Retention::Bounded(crate::ring::DEFAULT_CAPACITY)
    }
}

/// A store whose retention policy is picked from configuration
#[derive(Debug)]
pub enum LogStore {
    /// Bounded ring with eviction
    Ring(RingLog),
    /// Growable log without eviction
    Unbounded(UnboundedLog),
}

impl LogStore {
    /// Build a store for the given retention policy
    pub fn new(retention: Retention) -> LogResult<Self> {
        Ok(match retention {
            Retention::Bounded(capacity) => LogStore::Ring(RingLog::with_capacity(capacity)?),
            Retention::Unbounded => LogStore::Unbounded(UnboundedLog::new()),
        })
    }

    /// The retention policy this store enforces
    pub fn retention(&self) -> Retention {
        match self {
            LogStore::Ring(ring) => Retention::Bounded(ring.capacity()),
            LogStore::Unbounded(_) => Retention::Unbounded,
        }
    }
}

impl Default for LogStore {
    fn default() -> Self {
        LogStore::Ring(RingLog::default())
    }
}

impl RecordStore for LogStore {
    fn append(&mut self, record: Record) -> Option<Record> {
        match self {
            LogStore::Ring(ring) => ring.append(record),
            LogStore::Unbounded(log) => log.append(record),
        }
    }

    fn total_length(&self) -> u64 {
        match self {
            LogStore::Ring(ring) => ring.total_length(),
            LogStore::Unbounded(log) => log.total_length(),
        }
    }

    fn len(&self) -> usize {
        match self {
            LogStore::Ring(ring) => ring.len(),
            LogStore::Unbounded(log) => log.len(),
        }
    }

    fn records(&self) -> Box<dyn Iterator<Item = &Record> + '_> {
        match self {
            LogStore::Ring(ring) => Box::new(ring.iter()),
            LogStore::Unbounded(log) => log.records(),
        }
    }

    fn drain(&mut self) -> Vec<Record> {
        match self {
            LogStore::Ring(ring) => ring.drain(),
            LogStore::Unbounded(log) => log.drain(),
        }
    }
}
