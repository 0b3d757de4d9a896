//! Offset resolution
//!
//! Readers address the log as one byte stream: the concatenation of every
//! retained record, oldest first. [`CursorResolver`] maps a global offset
//! into that stream back to the record that owns it.

use bytes::{Bytes, BytesMut};

use crate::record::Record;
use crate::store::RecordStore;

/// Where a global offset lands inside the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position<'a> {
    /// Index of the owning record, 0 being the oldest retained record
    pub index: usize,
    /// The owning record
    pub record: &'a Record,
    /// Offset of the byte within the owning record
    pub local_offset: usize,
}

impl Position<'_> {
    /// Bytes left in the owning record from this position on
    pub fn remaining(&self) -> usize {
        self.record.len() - self.local_offset
    }
}

/// Resolves global offsets against a [`RecordStore`]
pub struct CursorResolver;

impl CursorResolver {
    /// Find the record holding `offset` and the offset within it.
    ///
    /// Returns `None` when `offset` is at or past the end of the stream.
    pub fn locate<S>(store: &S, offset: u64) -> Option<Position<'_>>
    where
        S: RecordStore + ?Sized,
    {
        if offset >= store.total_length() {
            return None;
        }

        let mut running = 0u64;
        for (index, record) in store.records().enumerate() {
            let len = record.len() as u64;
            if offset < running + len {
                return Some(Position {
                    index,
                    record,
                    local_offset: (offset - running) as usize,
                });
            }
            running += len;
        }
        None
    }

    /// Read up to `max_len` bytes starting at `offset`.
    ///
    /// A read never crosses a record boundary: callers advance their own
    /// cursor by the returned length and read again to continue. An empty
    /// result means end of stream (or `max_len == 0`).
    pub fn read<S>(store: &S, offset: u64, max_len: usize) -> Bytes
    where
        S: RecordStore + ?Sized,
    {
        match Self::locate(store, offset) {
            Some(pos) => {
                let count = max_len.min(pos.remaining());
                pos.record
                    .slice(pos.local_offset, pos.local_offset + count)
            }
            None => Bytes::new(),
        }
    }

    /// The full concatenation of all retained records
    pub fn read_all<S>(store: &S) -> Bytes
    where
        S: RecordStore + ?Sized,
    {
        let mut out = BytesMut::with_capacity(store.total_length() as usize);
        for record in store.records() {
            out.extend_from_slice(record.as_bytes());
        }
        out.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingLog;

    fn ring_of(items: &[&str]) -> RingLog {
        let mut ring = RingLog::default();
        for item in items {
            ring.append(Record::from_vec(item.as_bytes().to_vec()));
        }
        ring
    }

    #[test]
    fn test_locate_first_and_boundaries() {
        let ring = ring_of(&["hello\n", "world\n"]);

        let pos = CursorResolver::locate(&ring, 0).unwrap();
        assert_eq!((pos.index, pos.local_offset), (0, 0));

        let pos = CursorResolver::locate(&ring, 5).unwrap();
        assert_eq!((pos.index, pos.local_offset), (0, 5));

        let pos = CursorResolver::locate(&ring, 6).unwrap();
        assert_eq!((pos.index, pos.local_offset), (1, 0));
        assert_eq!(pos.record.as_bytes(), b"world\n");

        let pos = CursorResolver::locate(&ring, 11).unwrap();
        assert_eq!((pos.index, pos.local_offset), (1, 5));
    }

    #[test]
    fn test_locate_past_end() {
        let ring = ring_of(&["ab\n"]);
        assert!(CursorResolver::locate(&ring, 3).is_none());
        assert!(CursorResolver::locate(&ring, 1_000).is_none());
        assert!(CursorResolver::locate(&RingLog::default(), 0).is_none());
    }

    #[test]
    fn test_read_stops_at_record_boundary() {
        let ring = ring_of(&["hello\n", "world\n"]);
        assert_eq!(&CursorResolver::read(&ring, 0, 12)[..], b"hello\n");
        assert_eq!(&CursorResolver::read(&ring, 3, 100)[..], b"lo\n");
        assert_eq!(&CursorResolver::read(&ring, 6, 3)[..], b"wor");
    }

    #[test]
    fn test_read_eof_and_zero_length() {
        let ring = ring_of(&["x\n"]);
        assert!(CursorResolver::read(&ring, 2, 10).is_empty());
        assert!(CursorResolver::read(&ring, 0, 0).is_empty());
    }

    #[test]
    fn test_cursor_loop_drains_everything() {
        let ring = ring_of(&["one\n", "two\n", "three\n"]);
        let mut offset = 0u64;
        let mut collected = Vec::new();
        loop {
            let chunk = CursorResolver::read(&ring, offset, 2);
            if chunk.is_empty() {
                break;
            }
            offset += chunk.len() as u64;
            collected.extend_from_slice(&chunk);
        }
        assert_eq!(collected, b"one\ntwo\nthree\n");
        assert_eq!(&CursorResolver::read_all(&ring)[..], b"one\ntwo\nthree\n");
    }
}
