//! Message identifiers: a 32-bit coarse timestamp followed by 160 bits of
//! content digest, 24 bytes in all.
//!
//! ```text
//! ┌───────────────┬──────────────────────────────────────────┐
//! │ time (u32 BE) │ SHA-256(message bytes)[..20]             │
//! │ bytes 0..4    │ bytes 4..24                              │
//! └───────────────┴──────────────────────────────────────────┘
//! ```
//!
//! The time field counts seconds since [`EPOCH_BASE`], giving the range
//! 2020-09-13 12:26:40 – 2156-10-20 18:54:55 (UTC). Since the time comes
//! first, ids sort by time as bytes. The base-62 text is not padded, so
//! text forms only sort by time between strings of equal length.

pub mod base62;
pub mod words;

use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::ErrorKind;

/// Unix time (seconds) that time field zero stands for.
pub const EPOCH_BASE: i64 = 1_600_000_000;

/// Length of an id in bytes.
pub const ID_LEN: usize = words::BYTES;

/// Number of digest bytes kept in an id.
pub const DIGEST_LEN: usize = ID_LEN - 4;

/// A message identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId([u8; ID_LEN]);

impl MessageId {
    /// Build an id from a time field and a full digest, truncated to 160 bits.
    pub fn from_parts(time_field: u32, digest: &[u8; 32]) -> Self {
        let mut id = [0u8; ID_LEN];
        BigEndian::write_u32(&mut id[..4], time_field);
        id[4..].copy_from_slice(&digest[..DIGEST_LEN]);
        Self(id)
    }

    pub fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// The raw time field.
    pub fn timestamp(&self) -> u32 {
        BigEndian::read_u32(&self.0[..4])
    }

    /// The time this id was stamped with.
    pub fn time(&self) -> DateTime<Utc> {
        time_from_field(self.timestamp())
    }

    /// The truncated content digest.
    pub fn digest(&self) -> &[u8] {
        &self.0[4..]
    }

    pub fn to_base62(&self) -> String {
        base62::encode(&self.0)
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base62())
    }
}

impl FromStr for MessageId {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        base62::decode(s).map(Self)
    }
}

impl serde::Serialize for MessageId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for MessageId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Convert a time to an id time field.
pub fn time_field(time: DateTime<Utc>) -> Result<u32, ErrorKind> {
    let secs = time.timestamp();
    if secs < EPOCH_BASE {
        return Err(ErrorKind::TimestampInPast(time));
    }
    u32::try_from(secs - EPOCH_BASE).map_err(|_| ErrorKind::TimestampOutOfRange(time))
}

/// Convert an id time field back to a time.
pub fn time_from_field(field: u32) -> DateTime<Utc> {
    DateTime::UNIX_EPOCH + TimeDelta::seconds(EPOCH_BASE + i64::from(field))
}
