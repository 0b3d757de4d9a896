//! # Linelog Core
//!
//! A bounded, append-only log of newline-delimited records.
//!
//! Writers deliver bytes in fragments of any size; complete records are cut
//! at each terminator byte and retained in a fixed-capacity ring that evicts
//! its oldest record when full. Readers address the retained records as one
//! byte stream by global offset.
//!
//! ## Components
//!
//! - **Record**: one immutable, terminator-included command
//! - **PartialAssembler**: buffers fragments and cuts records at terminators
//! - **RingLog**: fixed-capacity FIFO with oldest-first eviction
//! - **CursorResolver**: maps a global offset to (record, local offset)
//! - **AccessCoordinator**: the per-device context; serializes every
//!   operation behind one cancellable lock
//!
//! ## Example
//!
//! ```rust,ignore
//! use linelog_core::AccessCoordinator;
//! use tokio_util::sync::CancellationToken;
//!
//! let log = AccessCoordinator::new();
//! let cancel = CancellationToken::new();
//!
//! log.append(b"hello\nwor", &cancel).await?;
//! log.append(b"ld\n", &cancel).await?;
//!
//! let all = log.read_all(&cancel).await?;
//! assert_eq!(&all[..], b"hello\nworld\n");
//!
//! let report = log.teardown();
//! assert_eq!(report.records_released, 2);
//! ```

pub mod assembler;
pub mod boundary;
pub mod coordinator;
pub mod cursor;
pub mod error;
pub mod record;
pub mod ring;
pub mod store;

// Re-exports
pub use assembler::PartialAssembler;
pub use boundary::{FragmentSource, ReadTarget, VecTarget};
pub use coordinator::{
    AccessCoordinator, AppendOutcome, CoordinatorConfig, LogStats, TeardownReport,
};
pub use cursor::{CursorResolver, Position};
pub use error::{LogError, LogResult};
pub use record::{NEWLINE, Record};
pub use ring::{DEFAULT_CAPACITY, RingIter, RingLog};
pub use store::{LogStore, RecordStore, Retention, UnboundedLog};

pub use tokio_util::sync::CancellationToken;
