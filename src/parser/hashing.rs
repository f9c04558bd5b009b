//! Byte-counting SHA-256 reader.

use std::io::{self, Read};

use sha2::{Digest, Sha256};

/// Wraps a byte source, counting and hashing every byte delivered.
///
/// The count covers bytes handed to the caller, which for a reader sitting
/// under a `BufReader` includes bytes still waiting in that buffer.
pub struct HashingReader<R> {
    inner: R,
    bytes_read: u64,
    hasher: Sha256,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
            hasher: Sha256::new(),
        }
    }

    /// Total bytes delivered so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Finish hashing and return the SHA-256 digest of everything read.
    pub fn finalize(self) -> [u8; 32] {
        self.hasher.finalize().into()
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_hashes() {
        let data = b"subject hi\nbody 2\nok";
        let mut reader = HashingReader::new(&data[..]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
        assert_eq!(reader.bytes_read(), data.len() as u64);
        let expected: [u8; 32] = Sha256::digest(data).into();
        assert_eq!(reader.finalize(), expected);
    }

    #[test]
    fn test_partial_reads_accumulate() {
        let data = [7u8; 100];
        let mut reader = HashingReader::new(&data[..]);
        let mut buf = [0u8; 30];
        while reader.read(&mut buf).unwrap() > 0 {}
        assert_eq!(reader.bytes_read(), 100);
        let expected: [u8; 32] = Sha256::digest(data).into();
        assert_eq!(reader.finalize(), expected);
    }

    #[test]
    fn test_propagates_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk on fire"))
            }
        }
        let mut reader = HashingReader::new(Broken);
        let err = reader.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
        assert_eq!(reader.bytes_read(), 0);
    }
}
