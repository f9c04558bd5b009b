//! Attachment descriptors.
//!
//! The payload is NOT loaded while parsing.
//! Only the byte range inside the message source is stored.

/// A file carried by a message.
///
/// Content is resolved lazily through [`crate::store::reader::MessageStore`],
/// which reads `data_len` bytes at `data_start` from the original file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attachment {
    /// Declared file name (may be empty).
    pub name: String,

    /// Byte offset of the payload within the message source.
    pub data_start: u64,

    /// Payload length in bytes.
    pub data_len: u64,
}

impl Attachment {
    /// Offset one past the last payload byte.
    pub fn data_end(&self) -> u64 {
        self.data_start + self.data_len
    }
}
