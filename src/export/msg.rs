//! Write messages in the smolmsg wire format.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::{ErrorKind, MsgError, Result};
use crate::model::address::Author;
use crate::model::message::MAX_BODY_SIZE;
use crate::parser::lines::MAX_LINE_LEN;
use crate::parser::message::TIME_FORMAT;

/// An attachment whose payload is held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl DraftFile {
    /// Read a file from disk, naming the attachment after it.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| MsgError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, data })
    }
}

/// A message to be written.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub subject: String,
    pub from: Author,
    pub to: Author,
    pub time: DateTime<FixedOffset>,
    pub body: Vec<u8>,
    pub files: Vec<DraftFile>,
}

impl MessageDraft {
    pub fn new(from: Author, to: Author, time: DateTime<FixedOffset>) -> Self {
        Self {
            subject: String::new(),
            from,
            to,
            time,
            body: Vec::new(),
            files: Vec::new(),
        }
    }

    /// File name carrying the message time: `YYYYMMDD-HHMMSS.msg` (UTC).
    pub fn file_name(&self) -> String {
        format!(
            "{}.msg",
            self.time.with_timezone(&Utc).format("%Y%m%d-%H%M%S")
        )
    }
}

/// Write `draft` to `writer`, returning the number of bytes written.
///
/// Every header line is checked before anything is written, so a draft the
/// parser could not read back fails without output. Each payload is
/// followed by a newline so the next header starts on a line of its own;
/// parsers skip the resulting blank line.
pub fn write_draft<W: Write>(writer: &mut W, draft: &MessageDraft) -> Result<u64> {
    if draft.body.len() as u64 > MAX_BODY_SIZE {
        return Err(ErrorKind::BodyTooLarge(draft.body.len() as u64).into());
    }
    let subject = if draft.subject.is_empty() {
        None
    } else {
        Some(header_line("subject", format!("subject {}", draft.subject))?)
    };
    let from = header_line("from", format!("from {}", author_value(&draft.from)))?;
    let to = header_line("to", format!("to {}", author_value(&draft.to)))?;
    let files = draft
        .files
        .iter()
        .map(|file| {
            let line = if file.name.is_empty() {
                format!("file {}", file.data.len())
            } else {
                format!("file {} {}", file.data.len(), file.name)
            };
            header_line("file name", line)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = CountingWriter {
        inner: writer,
        written: 0,
    };
    if let Some(subject) = subject {
        writeln!(out, "{subject}")?;
    }
    writeln!(out, "{from}")?;
    writeln!(out, "{to}")?;
    writeln!(out, "time {}", draft.time.format(TIME_FORMAT))?;
    if !draft.body.is_empty() {
        writeln!(out, "body {}", draft.body.len())?;
        out.write_all(&draft.body)?;
        out.write_all(b"\n")?;
    }
    for (file, line) in draft.files.iter().zip(&files) {
        writeln!(out, "{line}")?;
        out.write_all(&file.data)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(out.written)
}

fn author_value(author: &Author) -> String {
    if author.name.is_empty() {
        author.address.clone()
    } else {
        format!("{} {}", author.address, author.name)
    }
}

/// A header line must fit on one physical line within [`MAX_LINE_LEN`].
fn header_line(field: &'static str, line: String) -> Result<String> {
    if line.contains(['\n', '\r']) {
        return Err(ErrorKind::InvalidValue(field).into());
    }
    if line.len() > MAX_LINE_LEN {
        return Err(ErrorKind::HeaderTooLong(field, line.len()).into());
    }
    Ok(line)
}

struct CountingWriter<'a, W> {
    inner: &'a mut W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn draft() -> MessageDraft {
        let time = DateTime::parse_from_str("2022-08-08 11:09:03 -0700", TIME_FORMAT).unwrap();
        let mut draft = MessageDraft::new(
            Author::new("Robin@Address", "Robin Smith").unwrap(),
            Author::new("sam@address", "").unwrap(),
            time,
        );
        draft.subject = "Hello hej".to_string();
        draft.body = b"Hello".to_vec();
        draft.files.push(DraftFile {
            name: "hello.txt".to_string(),
            data: b"Hello\nworld".to_vec(),
        });
        draft
    }

    #[test]
    fn test_written_message_parses_back() {
        let draft = draft();
        let mut buf = Vec::new();
        let written = write_draft(&mut buf, &draft).unwrap();
        assert_eq!(written, buf.len() as u64);

        let msg = parser::parse(&buf[..], buf.len() as u64, "draft").unwrap();
        assert_eq!(msg.subject, draft.subject);
        assert_eq!(msg.from, draft.from);
        assert_eq!(msg.to, draft.to);
        assert_eq!(msg.body, draft.body);
        assert_eq!(msg.time, draft.time.with_timezone(&Utc));
        assert_eq!(msg.files.len(), 1);
        let file = &msg.files[0];
        assert_eq!(file.name, "hello.txt");
        assert_eq!(
            &buf[file.data_start as usize..file.data_end() as usize],
            b"Hello\nworld"
        );
    }

    #[test]
    fn test_wire_layout() {
        let mut buf = Vec::new();
        write_draft(&mut buf, &draft()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "subject Hello hej\n\
from robin@address Robin Smith\n\
to sam@address\n\
time 2022-08-08 11:09:03 -0700\n\
body 5\nHello\n\
file 11 hello.txt\nHello\nworld\n"
        );
    }

    #[test]
    fn test_rejects_multiline_subject() {
        let mut draft = draft();
        draft.subject = "one\ntwo".to_string();
        let err = write_draft(&mut Vec::new(), &draft).unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::InvalidValue("subject")));
    }

    #[test]
    fn test_rejects_multiline_author_name() {
        let mut draft = draft();
        draft.to.name = "Sam\r\nsubject spoofed".to_string();
        let err = write_draft(&mut Vec::new(), &draft).unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::InvalidValue("to")));
    }

    #[test]
    fn test_longest_subject_parses_back() {
        let mut draft = draft();
        draft.subject = "s".repeat(MAX_LINE_LEN - "subject ".len());
        let mut buf = Vec::new();
        write_draft(&mut buf, &draft).unwrap();
        let msg = parser::parse(&buf[..], buf.len() as u64, "draft").unwrap();
        assert_eq!(msg.subject, draft.subject);
    }

    #[test]
    fn test_rejects_subject_over_line_limit() {
        let mut draft = draft();
        draft.subject = "s".repeat(5000);
        let mut buf = Vec::new();
        let err = write_draft(&mut buf, &draft).unwrap_err();
        assert_eq!(
            err.kind(),
            Some(&ErrorKind::HeaderTooLong("subject", 5008))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_rejects_file_name_over_line_limit() {
        let mut draft = draft();
        draft.files[0].name = "n".repeat(MAX_LINE_LEN);
        let mut buf = Vec::new();
        let err = write_draft(&mut buf, &draft).unwrap_err();
        assert!(matches!(
            err.kind(),
            Some(ErrorKind::HeaderTooLong("file name", _))
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_rejects_large_body() {
        let mut draft = draft();
        draft.body = vec![0u8; MAX_BODY_SIZE as usize + 1];
        let err = write_draft(&mut Vec::new(), &draft).unwrap_err();
        assert!(matches!(err.kind(), Some(ErrorKind::BodyTooLarge(_))));
    }

    #[test]
    fn test_file_name_is_utc() {
        assert_eq!(draft().file_name(), "20220808-180903.msg");
    }
}
