//! Fragment assembly
//!
//! Writers may deliver a command in any number of pieces. The
//! [`PartialAssembler`] buffers bytes until it sees a terminator, then cuts
//! everything up to and including that byte into a [`Record`].

use tracing::trace;

use crate::error::{LogError, LogResult};
use crate::record::{NEWLINE, Record};

/// Turns a stream of raw byte fragments into finalized records
///
/// One assembler exists per writer context. Its pending buffer is never
/// visible to readers.
#[derive(Debug)]
pub struct PartialAssembler {
    /// Bytes received since the last terminator
    pending: Vec<u8>,
    /// Byte that ends a record
    terminator: u8,
    /// Largest size a single record may reach
    max_record_size: Option<usize>,
}

impl Default for PartialAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialAssembler {
    /// Create an assembler that splits on `\n`
    pub fn new() -> Self {
        Self::with_terminator(NEWLINE)
    }

    /// Create an assembler that splits on a custom terminator byte
    pub fn with_terminator(terminator: u8) -> Self {
        Self {
            pending: Vec::new(),
            terminator,
            max_record_size: None,
        }
    }

    /// Limit the size a single record may grow to
    pub fn with_max_record_size(mut self, limit: usize) -> Self {
        self.max_record_size = Some(limit);
        self
    }

    /// The terminator byte
    pub fn terminator(&self) -> u8 {
        self.terminator
    }

    /// Number of buffered bytes not yet part of a record
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The buffered, unterminated bytes
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Drop any buffered bytes, returning how many were discarded
    pub fn discard_pending(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending = Vec::new();
        discarded
    }

    /// Feed one fragment, returning the records it completes in arrival order.
    ///
    /// Every allocation happens before the pending buffer is touched, so an
    /// error leaves the assembler exactly as it was and the same fragment
    /// can be fed again.
    pub fn feed(&mut self, fragment: &[u8]) -> LogResult<Vec<Record>> {
        let term = self.terminator;
        let cuts = fragment.iter().filter(|&&b| b == term).count();

        let mut records = Vec::new();
        records.try_reserve_exact(cuts)?;

        let mut start = 0;
        let mut carried = self.pending.as_slice();
        for (pos, _) in fragment.iter().enumerate().filter(|&(_, &b)| b == term) {
            let piece = &fragment[start..=pos];
            let size = carried.len() + piece.len();
            self.check_size(size)?;

            let mut data = Vec::new();
            data.try_reserve_exact(size)
                .map_err(|_| LogError::out_of_memory(size))?;
            data.extend_from_slice(carried);
            data.extend_from_slice(piece);
            records.push(Record::from_vec(data));

            carried = &[];
            start = pos + 1;
        }

        let tail = &fragment[start..];
        if cuts == 0 {
            let size = self.pending.len() + tail.len();
            self.check_size(size)?;
            self.pending
                .try_reserve(tail.len())
                .map_err(|_| LogError::out_of_memory(size))?;
            self.pending.extend_from_slice(tail);
        } else {
            self.check_size(tail.len())?;
            let mut rest = Vec::new();
            rest.try_reserve_exact(tail.len())
                .map_err(|_| LogError::out_of_memory(tail.len()))?;
            rest.extend_from_slice(tail);
            self.pending = rest;
        }

        trace!(
            fragment_len = fragment.len(),
            records = records.len(),
            pending = self.pending.len(),
            "Fed fragment"
        );
        Ok(records)
    }

    fn check_size(&self, size: usize) -> LogResult<()> {
        match self.max_record_size {
            Some(limit) if size > limit => Err(LogError::out_of_memory(size)),
            _ => Ok(()),
        }
    }
}
