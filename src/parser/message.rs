//! Streaming message parser.
//!
//! A message is a sequence of `<key> <value>` header lines. `body` and
//! `file` headers are followed by exactly the declared number of raw bytes,
//! after which header lines resume. The whole source is read once, front to
//! back; attachment payloads are skipped, not stored, and every byte read
//! feeds the digest that becomes the message id.

use std::io::Read;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, trace};

use super::field::{is_extension, Field};
use super::lines::{Line, SectionReader};
use crate::error::{ErrorKind, MsgError, Result};
use crate::id::{self, MessageId};
use crate::model::address::Author;
use crate::model::attachment::Attachment;
use crate::model::message::{Message, MAX_BODY_SIZE};

/// `time` layout with an explicit offset, e.g. `2022-08-08 11:09:03 -0700`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// `time` layout without offset; UTC is assumed.
pub const TIME_FORMAT_UTC: &str = "%Y-%m-%d %H:%M:%S";

/// Parses message sources into [`Message`] values.
///
/// The parser holds no state between calls, so one instance may be shared
/// by any number of threads.
#[derive(Debug, Clone, Default)]
pub struct MessageParser {
    time: Option<DateTime<Utc>>,
}

impl MessageParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time to use when the message has no `time` header.
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Parse a complete message from `reader`.
    ///
    /// `approximate_size` only sizes the read buffer (0 if unknown).
    /// `source_name` prefixes error messages.
    pub fn parse<R: Read>(
        &self,
        reader: R,
        approximate_size: u64,
        source_name: &str,
    ) -> Result<Message> {
        let fail = |line: usize, kind: ErrorKind| MsgError::parse(source_name, Some(line), kind);
        let io_err = |e: std::io::Error| MsgError::io(source_name, e);

        let mut src = SectionReader::new(reader, approximate_size);
        let mut time = self.time;
        let mut subject = String::new();
        let mut from = Author::default();
        let mut to = Author::default();
        let mut body = Vec::new();
        let mut files: Vec<Attachment> = Vec::new();

        loop {
            let line_no = src.line_number() + 1;
            let line = match src.next_line().map_err(io_err)? {
                Line::End => break,
                Line::TooLong => return Err(fail(line_no, ErrorKind::FieldTooLong)),
                Line::Text(line) => line,
            };

            let (key, value) = match memchr_space(line) {
                Some(0) => return Err(fail(line_no, ErrorKind::InvalidLeadingSpace)),
                Some(p) => line.split_at(p),
                None if line.is_empty() => continue,
                None => (line, &[][..]),
            };

            let Some(field) = Field::from_key(key) else {
                let key = String::from_utf8_lossy(key).into_owned();
                if is_extension(key.as_bytes()) {
                    trace!(source = source_name, line = line_no, key = %key, "Skipping extension field");
                    continue;
                }
                return Err(fail(line_no, ErrorKind::UnknownField(key)));
            };
            let value = String::from_utf8_lossy(value).trim().to_string();

            match field {
                Field::Subject => subject = value,
                Field::From => from = Author::parse(&value).map_err(|k| fail(line_no, k))?,
                Field::To => to = Author::parse(&value).map_err(|k| fail(line_no, k))?,
                Field::Time => time = Some(parse_time(&value).map_err(|k| fail(line_no, k))?),
                Field::Body => {
                    let size = parse_size(&value).map_err(|k| fail(line_no, k))?;
                    if size > MAX_BODY_SIZE {
                        return Err(fail(line_no, ErrorKind::BodyTooLarge(size)));
                    }
                    let data = src.read_payload(size).map_err(io_err)?;
                    if (data.len() as u64) < size {
                        return Err(fail(line_no, ErrorKind::TruncatedBody(size)));
                    }
                    body = data;
                }
                Field::File => {
                    let (size_text, name) = match value.split_once(' ') {
                        Some((size, name)) => (size, name.trim()),
                        None => (value.as_str(), ""),
                    };
                    let size = parse_size(size_text).map_err(|k| fail(line_no, k))?;
                    let data_start = src.position();
                    let skipped = src.skip_payload(size).map_err(io_err)?;
                    if skipped < size {
                        return Err(fail(
                            line_no,
                            ErrorKind::TruncatedAttachment {
                                index: files.len() + 1,
                                name: name.to_string(),
                                size,
                            },
                        ));
                    }
                    files.push(Attachment {
                        name: name.to_string(),
                        data_start,
                        data_len: size,
                    });
                }
            }
        }

        let digest = src.finish();
        let time = time.unwrap_or(DateTime::UNIX_EPOCH);
        let time_field =
            id::time_field(time).map_err(|k| MsgError::parse(source_name, None, k))?;
        let id = MessageId::from_parts(time_field, &digest);

        debug!(
            source = source_name,
            id = %id,
            files = files.len(),
            body_len = body.len(),
            "Parsed message"
        );

        Ok(Message {
            id,
            time,
            subject,
            from,
            to,
            body,
            files,
        })
    }
}

/// Parse a message with no external time hint.
pub fn parse<R: Read>(reader: R, approximate_size: u64, source_name: &str) -> Result<Message> {
    MessageParser::new().parse(reader, approximate_size, source_name)
}

/// Parse a `time` value, with or without a UTC offset.
pub fn parse_time(value: &str) -> std::result::Result<DateTime<Utc>, ErrorKind> {
    if let Ok(t) = DateTime::parse_from_str(value, TIME_FORMAT) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, TIME_FORMAT_UTC)
        .map(|t| t.and_utc())
        .map_err(|_| ErrorKind::InvalidTimeFormat(value.to_string()))
}

/// Parse a payload size: decimal digits only.
fn parse_size(value: &str) -> std::result::Result<u64, ErrorKind> {
    let invalid = || ErrorKind::InvalidSize(value.to_string());
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

#[inline]
fn memchr_space(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b' ')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HELLO: &[u8] = b"subject Hello hej\n\
from robin@address Robin Smith\n\
time 2022-08-08 11:09:03 -0700\n\
to sam@address\n\
body 5\n\
Hello\n\
file 11 hello.txt\n\
Hello\n\
world\n";

    fn parse_bytes(data: &[u8]) -> Result<Message> {
        parse(data, data.len() as u64, "test.msg")
    }

    fn kind_of(data: &[u8]) -> (Option<usize>, ErrorKind) {
        match parse_bytes(data).unwrap_err() {
            MsgError::Parse { line, kind, .. } => (line, kind),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_hello() {
        let msg = parse_bytes(HELLO).unwrap();
        assert_eq!(msg.subject, "Hello hej");
        assert_eq!(msg.from.address, "robin@address");
        assert_eq!(msg.from.name, "Robin Smith");
        assert_eq!(msg.to.address, "sam@address");
        assert_eq!(msg.to.name, "");
        assert_eq!(msg.body, b"Hello");
        assert_eq!(msg.time, Utc.with_ymd_and_hms(2022, 8, 8, 18, 9, 3).unwrap());
        assert_eq!(msg.files.len(), 1);
        let file = &msg.files[0];
        assert_eq!(file.name, "hello.txt");
        assert_eq!(file.data_len, 11);
        assert_eq!(&HELLO[file.data_start as usize..file.data_end() as usize], b"Hello\nworld");
    }

    #[test]
    fn test_id_from_digest_and_time() {
        use sha2::{Digest, Sha256};
        let msg = parse_bytes(HELLO).unwrap();
        let digest: [u8; 32] = Sha256::digest(HELLO).into();
        assert_eq!(msg.id().digest(), &digest[..20]);
        assert_eq!(msg.id().time(), msg.time);
    }

    #[test]
    fn test_deterministic() {
        let a = parse_bytes(HELLO).unwrap();
        let b = parse(HELLO, 0, "other-name").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_time_without_offset_is_utc() {
        let msg = parse_bytes(b"time 2022-08-08 11:09:03\n").unwrap();
        assert_eq!(msg.time, Utc.with_ymd_and_hms(2022, 8, 8, 11, 9, 3).unwrap());
    }

    #[test]
    fn test_invalid_time() {
        let (line, kind) = kind_of(b"subject x\ntime yesterday\n");
        assert_eq!(line, Some(2));
        assert_eq!(kind, ErrorKind::InvalidTimeFormat("yesterday".into()));
    }

    #[test]
    fn test_time_hint_and_override() {
        let hint = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        let parser = MessageParser::new().with_time(hint);
        let msg = parser.parse(&b"subject a\n"[..], 0, "a").unwrap();
        assert_eq!(msg.time, hint);
        let msg = parser
            .parse(&b"time 2024-01-01 00:00:00\n"[..], 0, "a")
            .unwrap();
        assert_eq!(msg.time, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_time_is_in_the_past() {
        let (line, kind) = kind_of(b"subject nothing\n");
        assert_eq!(line, None);
        assert_eq!(kind, ErrorKind::TimestampInPast(DateTime::UNIX_EPOCH));
    }

    #[test]
    fn test_time_before_epoch_base() {
        let (_, kind) = kind_of(b"time 2019-01-01 00:00:00\n");
        assert!(matches!(kind, ErrorKind::TimestampInPast(_)));
    }

    #[test]
    fn test_time_after_range() {
        let (_, kind) = kind_of(b"time 2200-01-01 00:00:00\n");
        assert!(matches!(kind, ErrorKind::TimestampOutOfRange(_)));
    }

    #[test]
    fn test_body_too_large() {
        let (line, kind) = kind_of(b"time 2022-08-08 11:09:03\nbody 9999999999\nabc");
        assert_eq!(line, Some(2));
        assert_eq!(kind, ErrorKind::BodyTooLarge(9_999_999_999));
    }

    #[test]
    fn test_body_truncated() {
        let (line, kind) = kind_of(b"body 10\nshort");
        assert_eq!(line, Some(1));
        assert_eq!(kind, ErrorKind::TruncatedBody(10));
    }

    #[test]
    fn test_invalid_size() {
        let (_, kind) = kind_of(b"body +5\nhello");
        assert_eq!(kind, ErrorKind::InvalidSize("+5".into()));
        let (_, kind) = kind_of(b"file big name\n");
        assert_eq!(kind, ErrorKind::InvalidSize("big".into()));
    }

    #[test]
    fn test_attachment_truncated() {
        let (line, kind) = kind_of(b"file 1 a\nx\nfile 20 b.bin\nxyz");
        assert_eq!(line, Some(3));
        assert_eq!(
            kind,
            ErrorKind::TruncatedAttachment {
                index: 2,
                name: "b.bin".into(),
                size: 20
            }
        );
    }

    #[test]
    fn test_empty_from_is_invalid_address() {
        let (line, kind) = kind_of(b"subject x\nfrom \n");
        assert_eq!(line, Some(2));
        assert!(matches!(kind, ErrorKind::InvalidAddress(_)));
    }

    #[test]
    fn test_address_without_at() {
        let (_, kind) = kind_of(b"to sam Sam\n");
        assert_eq!(kind, ErrorKind::InvalidAddress("sam".into()));
    }

    #[test]
    fn test_unknown_field() {
        let (line, kind) = kind_of(b"subject x\ncolor red\n");
        assert_eq!(line, Some(2));
        assert_eq!(kind, ErrorKind::UnknownField("color".into()));
    }

    #[test]
    fn test_extension_field_ignored() {
        let msg = parse_bytes(b"x-color red\nsubject x\ntime 2022-08-08 11:09:03\n").unwrap();
        assert_eq!(msg.subject, "x");
    }

    #[test]
    fn test_leading_space() {
        let (line, kind) = kind_of(b"\n subject x\n");
        assert_eq!(line, Some(2));
        assert_eq!(kind, ErrorKind::InvalidLeadingSpace);
    }

    #[test]
    fn test_field_too_long() {
        let mut data = b"time 2022-08-08 11:09:03\nsubject ".to_vec();
        data.extend(std::iter::repeat_n(b'a', 5000));
        data.push(b'\n');
        let (line, kind) = kind_of(&data);
        assert_eq!(line, Some(2));
        assert_eq!(kind, ErrorKind::FieldTooLong);
    }

    #[test]
    fn test_last_subject_wins() {
        let msg = parse_bytes(b"subject one\nsubject  two \ntime 2022-08-08 11:09:03\n").unwrap();
        assert_eq!(msg.subject, "two");
    }

    #[test]
    fn test_line_numbers_count_payload_lines() {
        let (line, _) = kind_of(b"body 4\na\nb\n\ncolor red\n");
        assert_eq!(line, Some(5));
    }

    #[test]
    fn test_field_without_value() {
        let msg = parse_bytes(b"subject\ntime 2022-08-08 11:09:03\n").unwrap();
        assert_eq!(msg.subject, "");
    }

    #[test]
    fn test_attachment_offsets_increase() {
        let data = b"time 2022-08-08 11:09:03\nfile 3 a\nabc\nfile 0\nfile 2 c\nde";
        let msg = parse_bytes(data).unwrap();
        assert_eq!(msg.files.len(), 3);
        assert_eq!(msg.files[0].data_start, 34);
        assert_eq!(msg.files[1].name, "");
        assert!(msg.files[0].data_start < msg.files[1].data_start);
        assert!(msg.files[1].data_start < msg.files[2].data_start);
        assert_eq!(&data[msg.files[2].data_start as usize..], b"de");
        assert_eq!(msg.attachments_size(), 5);
    }
}
