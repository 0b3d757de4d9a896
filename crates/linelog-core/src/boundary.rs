//! Caller-boundary copies
//!
//! Bytes enter and leave the log through caller-supplied buffers that may
//! fail to copy (an invalid user address in a driver, a closed pipe in a
//! service). Those failures surface as [`LogError::CopyFault`].

use crate::error::{LogError, LogResult};

/// Where an appended fragment is copied in from
pub trait FragmentSource {
    /// Copy at most `max_len` bytes of the fragment into `dst`
    fn copy_in(&mut self, dst: &mut Vec<u8>, max_len: usize) -> LogResult<()>;
}

/// Where read bytes are copied out to
pub trait ReadTarget {
    /// How many bytes this target accepts in one read
    fn capacity(&self) -> usize;

    /// Copy `src` into the target; `src.len()` never exceeds `capacity()`
    fn copy_out(&mut self, src: &[u8]) -> LogResult<usize>;
}

impl FragmentSource for &[u8] {
    fn copy_in(&mut self, dst: &mut Vec<u8>, max_len: usize) -> LogResult<()> {
        let take = self.len().min(max_len);
        dst.try_reserve_exact(take)
            .map_err(|_| LogError::out_of_memory(take))?;
        dst.extend_from_slice(&self[..take]);
        *self = &self[take..];
        Ok(())
    }
}

impl ReadTarget for &mut [u8] {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn copy_out(&mut self, src: &[u8]) -> LogResult<usize> {
        if src.len() > self.len() {
            return Err(LogError::copy_fault(format!(
                "{} bytes do not fit in a {} byte buffer",
                src.len(),
                self.len()
            )));
        }
        self[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }
}

/// Growable read target with a per-read limit
#[derive(Debug, Default)]
pub struct VecTarget {
    /// Bytes collected so far
    pub data: Vec<u8>,
    /// Maximum bytes accepted by one read
    pub chunk: usize,
}

impl VecTarget {
    /// Create a target accepting up to `chunk` bytes per read
    pub fn new(chunk: usize) -> Self {
        Self {
            data: Vec::new(),
            chunk,
        }
    }
}

impl ReadTarget for VecTarget {
    fn capacity(&self) -> usize {
        self.chunk
    }

    fn copy_out(&mut self, src: &[u8]) -> LogResult<usize> {
        self.data
            .try_reserve(src.len())
            .map_err(|_| LogError::copy_fault("target buffer could not grow"))?;
        self.data.extend_from_slice(src);
        Ok(src.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_source_advances() {
        let mut src: &[u8] = b"abcdef";
        let mut dst = Vec::new();
        src.copy_in(&mut dst, 4).unwrap();
        assert_eq!(dst, b"abcd");
        assert_eq!(src, b"ef");
    }

    #[test]
    fn test_slice_target_rejects_overflow() {
        let mut buf = [0u8; 2];
        let mut target: &mut [u8] = &mut buf;
        assert!(matches!(
            target.copy_out(b"abc"),
            Err(LogError::CopyFault(_))
        ));
        assert_eq!(target.copy_out(b"ab").unwrap(), 2);
        assert_eq!(&buf, b"ab");
    }

    #[test]
    fn test_vec_target_accumulates() {
        let mut target = VecTarget::new(8);
        target.copy_out(b"he").unwrap();
        target.copy_out(b"llo").unwrap();
        assert_eq!(target.data, b"hello");
        assert_eq!(target.capacity(), 8);
    }
}
