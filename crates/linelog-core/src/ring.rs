//! Fixed-capacity record ring
//!
//! The ring never reallocates after construction. Only the records in its
//! slots come and go; appending to a full ring hands the oldest record back
//! to the caller.

use tracing::trace;

use crate::error::{LogError, LogResult};
use crate::record::Record;
use crate::store::RecordStore;

/// Number of records retained by a default ring
pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity FIFO of records with oldest-first eviction
#[derive(Debug)]
pub struct RingLog {
    /// Record slots; `None` marks an unused slot
    slots: Box<[Option<Record>]>,
    /// Slot the next record is written to
    in_offs: usize,
    /// Slot holding the oldest record
    out_offs: usize,
    /// Set when every slot holds a record
    full: bool,
    /// Sum of the lengths of all retained records
    total_length: u64,
}

impl Default for RingLog {
    fn default() -> Self {
        Self::new_unchecked(DEFAULT_CAPACITY)
    }
}

impl RingLog {
    /// Create a ring holding at most `capacity` records
    pub fn with_capacity(capacity: usize) -> LogResult<Self> {
        if capacity == 0 {
            return Err(LogError::InvalidCapacity(capacity));
        }
        Ok(Self::new_unchecked(capacity))
    }

    fn new_unchecked(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            in_offs: 0,
            out_offs: 0,
            full: false,
            total_length: 0,
        }
    }

    /// Maximum number of records retained
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether the next append will evict
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Append a record, returning the evicted oldest record if the ring was full
    pub fn append(&mut self, record: Record) -> Option<Record> {
        let added = record.len() as u64;
        let evicted = if self.full {
            let oldest = self.slots[self.out_offs].take();
            self.out_offs = self.advance(self.out_offs);
            oldest
        } else {
            None
        };

        if let Some(ref old) = evicted {
            self.total_length -= old.len() as u64;
            trace!(evicted_len = old.len(), "Evicted oldest record");
        }

        self.slots[self.in_offs] = Some(record);
        self.in_offs = self.advance(self.in_offs);
        self.full = self.in_offs == self.out_offs;
        self.total_length += added;

        evicted
    }

    /// Iterate over retained records, oldest first
    pub fn iter(&self) -> RingIter<'_> {
        RingIter {
            ring: self,
            position: 0,
            remaining: self.len(),
        }
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        if self.full {
            self.slots.len()
        } else if self.in_offs >= self.out_offs {
            self.in_offs - self.out_offs
        } else {
            self.slots.len() - self.out_offs + self.in_offs
        }
    }

    /// Whether no records are retained
    pub fn is_empty(&self) -> bool {
        !self.full && self.in_offs == self.out_offs
    }

    /// Sum of the lengths of all retained records
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Remove every record, oldest first
    pub fn drain(&mut self) -> Vec<Record> {
        let mut drained = Vec::with_capacity(self.len());
        while !self.is_empty() {
            if let Some(record) = self.slots[self.out_offs].take() {
                drained.push(record);
            }
            self.out_offs = self.advance(self.out_offs);
            self.full = false;
        }
        self.in_offs = 0;
        self.out_offs = 0;
        self.total_length = 0;
        drained
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }
}

/// Oldest-to-newest iterator over a [`RingLog`]
pub struct RingIter<'a> {
    ring: &'a RingLog,
    position: usize,
    remaining: usize,
}

impl<'a> Iterator for RingIter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let slot = (self.ring.out_offs + self.position) % self.ring.slots.len();
            self.position += 1;
            self.remaining -= 1;
            if let Some(record) = self.ring.slots[slot].as_ref() {
                return Some(record);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<'a> IntoIterator for &'a RingLog {
    type Item = &'a Record;
    type IntoIter = RingIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl RecordStore for RingLog {
    fn append(&mut self, record: Record) -> Option<Record> {
        RingLog::append(self, record)
    }

    fn total_length(&self) -> u64 {
        self.total_length
    }

    fn len(&self) -> usize {
        RingLog::len(self)
    }

    fn records(&self) -> Box<dyn Iterator<Item = &Record> + '_> {
        Box::new(self.iter())
    }

    fn drain(&mut self) -> Vec<Record> {
        RingLog::drain(self)
    }
}
