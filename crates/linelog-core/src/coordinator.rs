//! Serialized access to a log
//!
//! [`AccessCoordinator`] is the per-device context. It owns the partial
//! assembler and the record store behind a single lock, so every append
//! (assemble, then enqueue) and every read happens as one step with respect
//! to all other callers.
//!
//! Waiting for the lock is cancellable: every operation takes a
//! [`CancellationToken`], and a token that fires before the lock is acquired
//! fails the operation with [`LogError::Cancelled`] without touching any
//! state. Once the lock is held the operation runs to completion.

use bytes::Bytes;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::assembler::PartialAssembler;
use crate::boundary::{FragmentSource, ReadTarget};
use crate::cursor::CursorResolver;
use crate::error::{LogError, LogResult};
use crate::record::NEWLINE;
use crate::store::{LogStore, RecordStore, Retention};

/// Configuration for a log context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// How many records are retained
    pub retention: Retention,
    /// Byte that ends a record
    pub terminator: u8,
    /// Largest size a single record may reach
    pub max_record_size: Option<usize>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            retention: Retention::default(),
            terminator: NEWLINE,
            max_record_size: None,
        }
    }
}

impl CoordinatorConfig {
    /// Set the retention policy
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Set the terminator byte
    pub fn with_terminator(mut self, terminator: u8) -> Self {
        self.terminator = terminator;
        self
    }

    /// Set the record size limit
    pub fn with_max_record_size(mut self, limit: usize) -> Self {
        self.max_record_size = Some(limit);
        self
    }
}

/// What a successful append did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendOutcome {
    /// Bytes taken from the fragment (always the whole fragment)
    pub bytes_accepted: usize,
    /// Records finalized and enqueued by this append
    pub records_committed: usize,
    /// Records evicted to make room
    pub records_evicted: usize,
    /// Unterminated bytes buffered after this append
    pub pending_bytes: usize,
}

/// Snapshot of a log's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogStats {
    /// Records currently retained
    pub records: usize,
    /// Total length of retained records in bytes
    pub total_length: u64,
    /// Unterminated bytes buffered
    pub pending_bytes: usize,
    /// Records committed over the context's lifetime
    pub records_committed: u64,
    /// Records evicted over the context's lifetime
    pub records_evicted: u64,
}

/// What teardown released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownReport {
    /// Retained records released
    pub records_released: usize,
    /// Bytes held by the released records
    pub bytes_released: u64,
    /// Unterminated bytes discarded
    pub pending_discarded: usize,
}

/// State guarded by the coordinator lock
#[derive(Debug)]
struct LogState<S> {
    assembler: PartialAssembler,
    store: S,
    records_committed: u64,
    records_evicted: u64,
}

impl<S: RecordStore> LogState<S> {
    fn append(&mut self, fragment: &[u8]) -> LogResult<AppendOutcome> {
        let records = self.assembler.feed(fragment)?;
        let mut outcome = AppendOutcome {
            bytes_accepted: fragment.len(),
            records_committed: records.len(),
            ..AppendOutcome::default()
        };

        for record in records {
            if let Some(evicted) = self.store.append(record) {
                trace!(len = evicted.len(), "Releasing evicted record");
                drop(evicted);
                outcome.records_evicted += 1;
            }
        }

        self.records_committed += outcome.records_committed as u64;
        self.records_evicted += outcome.records_evicted as u64;
        outcome.pending_bytes = self.assembler.pending_len();
        Ok(outcome)
    }

    fn stats(&self) -> LogStats {
        LogStats {
            records: self.store.len(),
            total_length: self.store.total_length(),
            pending_bytes: self.assembler.pending_len(),
            records_committed: self.records_committed,
            records_evicted: self.records_evicted,
        }
    }
}

/// Single-lock monitor over a partial assembler and a record store
#[derive(Debug)]
pub struct AccessCoordinator<S = LogStore> {
    state: Mutex<LogState<S>>,
}

impl Default for AccessCoordinator<LogStore> {
    fn default() -> Self {
        Self::with_store(LogStore::default(), PartialAssembler::new())
    }
}

impl AccessCoordinator<LogStore> {
    /// Create a context retaining the default ten records
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from configuration
    pub fn from_config(config: &CoordinatorConfig) -> LogResult<Self> {
        let store = LogStore::new(config.retention)?;
        let mut assembler = PartialAssembler::with_terminator(config.terminator);
        if let Some(limit) = config.max_record_size {
            assembler = assembler.with_max_record_size(limit);
        }
        debug!(retention = ?config.retention, "Created log context");
        Ok(Self::with_store(store, assembler))
    }
}

impl<S: RecordStore> AccessCoordinator<S> {
    /// Create a context over an existing store and assembler
    pub fn with_store(store: S, assembler: PartialAssembler) -> Self {
        Self {
            state: Mutex::new(LogState {
                assembler,
                store,
                records_committed: 0,
                records_evicted: 0,
            }),
        }
    }

    async fn lock(&self, cancel: &CancellationToken) -> LogResult<MutexGuard<'_, LogState<S>>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Lock wait cancelled");
                Err(LogError::Cancelled)
            }
            guard = self.state.lock() => Ok(guard),
        }
    }

    /// Append a fragment, finalizing and enqueuing every record it completes
    #[instrument(skip(self, fragment, cancel), fields(len = fragment.len()))]
    pub async fn append(
        &self,
        fragment: &[u8],
        cancel: &CancellationToken,
    ) -> LogResult<AppendOutcome> {
        let mut state = self.lock(cancel).await?;
        let outcome = state.append(fragment)?;
        debug!(
            committed = outcome.records_committed,
            evicted = outcome.records_evicted,
            pending = outcome.pending_bytes,
            "Appended fragment"
        );
        Ok(outcome)
    }

    /// Copy up to `max_len` bytes in from `source`, then append them.
    ///
    /// The copy happens before the lock is taken, so a copy fault leaves the
    /// log untouched.
    pub async fn append_from<F>(
        &self,
        source: &mut F,
        max_len: usize,
        cancel: &CancellationToken,
    ) -> LogResult<AppendOutcome>
    where
        F: FragmentSource + ?Sized,
    {
        let mut fragment = Vec::new();
        source.copy_in(&mut fragment, max_len)?;
        self.append(&fragment, cancel).await
    }

    /// Read up to `max_len` bytes at global `offset`.
    ///
    /// Never crosses a record boundary. An empty result at an offset past
    /// the end is end of stream, not an error.
    #[instrument(skip(self, cancel))]
    pub async fn read(
        &self,
        offset: u64,
        max_len: usize,
        cancel: &CancellationToken,
    ) -> LogResult<Bytes> {
        let state = self.lock(cancel).await?;
        let chunk = CursorResolver::read(&state.store, offset, max_len);
        trace!(copied = chunk.len(), "Read chunk");
        Ok(chunk)
    }

    /// Read at `offset` into `target`, returning the number of bytes copied.
    ///
    /// The copy out runs after the lock is released; a copy fault is
    /// reported without affecting the log.
    pub async fn read_into<T>(
        &self,
        offset: u64,
        target: &mut T,
        cancel: &CancellationToken,
    ) -> LogResult<usize>
    where
        T: ReadTarget + ?Sized,
    {
        let chunk = self.read(offset, target.capacity(), cancel).await?;
        if chunk.is_empty() {
            return Ok(0);
        }
        target.copy_out(&chunk)
    }

    /// The concatenation of every retained record
    pub async fn read_all(&self, cancel: &CancellationToken) -> LogResult<Bytes> {
        let state = self.lock(cancel).await?;
        Ok(CursorResolver::read_all(&state.store))
    }

    /// Append a fragment and read back the whole store under one lock hold.
    ///
    /// Nothing another caller does can land between the write and the
    /// read-back.
    #[instrument(skip(self, fragment, cancel), fields(len = fragment.len()))]
    pub async fn append_and_snapshot(
        &self,
        fragment: &[u8],
        cancel: &CancellationToken,
    ) -> LogResult<(AppendOutcome, Bytes)> {
        let mut state = self.lock(cancel).await?;
        let outcome = state.append(fragment)?;
        let snapshot = CursorResolver::read_all(&state.store);
        debug!(
            committed = outcome.records_committed,
            snapshot_len = snapshot.len(),
            "Appended fragment with read-back"
        );
        Ok((outcome, snapshot))
    }

    /// Current counters
    pub async fn stats(&self, cancel: &CancellationToken) -> LogResult<LogStats> {
        let state = self.lock(cancel).await?;
        Ok(state.stats())
    }

    /// Release every retained record and the partial buffer.
    ///
    /// Consumes the context, so it can only happen once.
    pub fn teardown(self) -> TeardownReport {
        let mut state = self.state.into_inner();
        let pending_discarded = state.assembler.discard_pending();
        let released = state.store.drain();
        let report = TeardownReport {
            records_released: released.len(),
            bytes_released: released.iter().map(|r| r.len() as u64).sum(),
            pending_discarded,
        };
        debug!(
            records = report.records_released,
            pending = report.pending_discarded,
            "Tore down log context"
        );
        report
    }
}
