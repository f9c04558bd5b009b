//! Parsed messages.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

use super::address::Author;
use super::attachment::Attachment;
use crate::id::MessageId;

/// Largest body a message may carry (8 MiB).
pub const MAX_BODY_SIZE: u64 = 8 * 1024 * 1024;

/// A fully parsed message.
///
/// Messages are only produced by [`crate::parser::message::MessageParser`],
/// which computes the id once the whole source has been read; the id cannot
/// be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Message {
    pub(crate) id: MessageId,

    /// From the `time` header, or from the source (e.g. the file name).
    pub time: DateTime<Utc>,

    /// Subject line (last `subject` header wins).
    pub subject: String,

    pub from: Author,

    pub to: Author,

    /// Body bytes, at most [`MAX_BODY_SIZE`].
    #[serde(serialize_with = "serialize_lossy")]
    pub body: Vec<u8>,

    /// Attachments in declaration order.
    pub files: Vec<Attachment>,
}

impl Message {
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Replace `time` with the (second-precision) time stored in the id.
    pub fn set_time_from_id(&mut self) {
        self.time = self.id.time();
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Sum of all attachment sizes.
    pub fn attachments_size(&self) -> u64 {
        self.files.iter().map(|f| f.data_len).sum()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}<{}>",
            self.time.format("%Y%m%d-%H%M%S"),
            self.from.address
        )
    }
}

fn serialize_lossy<S: serde::Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Message {
        Message {
            id: MessageId::from_parts(100, &[9u8; 32]),
            time: Utc.with_ymd_and_hms(2022, 8, 8, 18, 9, 3).unwrap(),
            subject: "Hello".to_string(),
            from: Author::parse("robin@address Robin").unwrap(),
            to: Author::parse("sam@address").unwrap(),
            body: b"Hi \xff".to_vec(),
            files: vec![Attachment {
                name: "a.txt".to_string(),
                data_start: 10,
                data_len: 4,
            }],
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "20220808-180903<robin@address>");
    }

    #[test]
    fn test_set_time_from_id() {
        let mut msg = sample();
        msg.set_time_from_id();
        assert_eq!(msg.time, Utc.timestamp_opt(1_600_000_100, 0).unwrap());
    }

    #[test]
    fn test_body_text_lossy() {
        assert_eq!(sample().body_text(), "Hi \u{fffd}");
        assert_eq!(sample().attachments_size(), 4);
    }

    #[test]
    fn test_serialize_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["subject"], "Hello");
        assert_eq!(json["from"]["name"], "Robin");
        assert_eq!(json["files"][0]["data_len"], 4);
        assert_eq!(json["id"], sample().id().to_string());
    }
}
