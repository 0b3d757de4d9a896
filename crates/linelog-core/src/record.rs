//! Finalized log records

use std::fmt;

use bytes::Bytes;

/// Default record terminator
pub const NEWLINE: u8 = b'\n';

/// One finalized, terminator-included command
///
/// A `Record` is immutable once built. Cloning is cheap (the payload is a
/// reference-counted [`Bytes`]), which lets reads hand out slices without
/// holding the log lock while the caller copies them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Record {
    data: Bytes,
}

impl Record {
    /// Wrap already-assembled bytes as a record.
    ///
    /// The assembler is the only producer in normal operation and guarantees
    /// the payload is non-empty and ends with the terminator.
    pub(crate) fn from_vec(data: Vec<u8>) -> Self {
        debug_assert!(!data.is_empty());
        Self {
            data: Bytes::from(data),
        }
    }

    /// Length of the record in bytes, terminator included
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: records hold at least their terminator
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The record bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// A zero-copy view of `self[start..end]`
    pub fn slice(&self, start: usize, end: usize) -> Bytes {
        self.data.slice(start..end)
    }

    /// Consume the record and return its payload
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("len", &self.data.len())
            .field("data", &String::from_utf8_lossy(&self.data))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accessors() {
        let record = Record::from_vec(b"hello\n".to_vec());
        assert_eq!(record.len(), 6);
        assert!(!record.is_empty());
        assert_eq!(record.as_bytes(), b"hello\n");
        assert_eq!(&record.slice(1, 3)[..], b"el");
    }

    #[test]
    fn test_clone_shares_payload() {
        let record = Record::from_vec(b"abc\n".to_vec());
        let copy = record.clone();
        assert_eq!(record, copy);
        assert_eq!(record.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
    }

    #[test]
    fn test_debug_shows_text() {
        let record = Record::from_vec(b"ping\n".to_vec());
        let rendered = format!("{:?}", record);
        assert!(rendered.contains("ping"));
        assert!(rendered.contains("len: 5"));
    }
}
