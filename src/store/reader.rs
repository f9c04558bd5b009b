//! Message files: parse a `.msg` file and read attachment payloads by offset.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::{MsgError, Result};
use crate::model::attachment::Attachment;
use crate::model::message::Message;
use crate::parser::MessageParser;

/// Layout of the time stamp at the start of a message file name.
pub const FILE_NAME_TIME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Extension of message files.
pub const MESSAGE_EXTENSION: &str = "msg";

/// Read the time from a file name like `20220808-180903.msg` (UTC).
pub fn time_from_file_name(path: &Path) -> Result<DateTime<Utc>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some((stem, _)) = name.split_once('.') else {
        return Err(MsgError::InvalidFileName(name.clone()));
    };
    NaiveDateTime::parse_from_str(stem, FILE_NAME_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|_| MsgError::InvalidFileName(name.clone()))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            MsgError::FileNotFound(path.to_path_buf())
        } else {
            MsgError::io(path, e)
        }
    })
}

/// Parse a message file.
///
/// A time stamp in the file name is used when the message has no `time`
/// header; the file size sizes the read buffer.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Message> {
    let path = path.as_ref();
    let file = open(path)?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut parser = MessageParser::new();
    match time_from_file_name(path) {
        Ok(time) => parser = parser.with_time(time),
        Err(e) => debug!(path = %path.display(), error = %e, "No time in file name"),
    }
    parser.parse(file, size, &path.display().to_string())
}

/// Opens a message file for reading attachment payloads.
pub struct MessageStore {
    path: PathBuf,
    file: File,
    len: u64,
}

impl MessageStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open(&path)?;
        let len = file.metadata().map_err(|e| MsgError::io(&path, e))?.len();
        Ok(Self { path, file, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the message stored in this file.
    pub fn message(&self) -> Result<Message> {
        parse_file(&self.path)
    }

    /// Read an attachment's payload into memory.
    pub fn read_attachment(&mut self, attachment: &Attachment) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(attachment.data_len as usize);
        self.copy_attachment(attachment, &mut buf)?;
        Ok(buf)
    }

    /// Fail unless the attachment lies within the file.
    pub fn check_range(&self, attachment: &Attachment) -> Result<()> {
        if attachment.data_end() > self.len {
            return Err(MsgError::io(
                &self.path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "attachment {:?} ends at {} but the file has {} bytes",
                        attachment.name,
                        attachment.data_end(),
                        self.len
                    ),
                ),
            ));
        }
        Ok(())
    }

    /// Stream an attachment's payload into `out`, returning the bytes copied.
    pub fn copy_attachment(&mut self, attachment: &Attachment, out: &mut impl Write) -> Result<u64> {
        debug!(
            path = %self.path.display(),
            offset = attachment.data_start,
            length = attachment.data_len,
            "Reading attachment"
        );
        self.check_range(attachment)?;
        self.file
            .seek(SeekFrom::Start(attachment.data_start))
            .map_err(|e| MsgError::io(&self.path, e))?;
        let copied = io::copy(&mut (&mut self.file).take(attachment.data_len), out)
            .map_err(|e| MsgError::io(&self.path, e))?;
        if copied < attachment.data_len {
            return Err(MsgError::io(
                &self.path,
                io::Error::from(io::ErrorKind::UnexpectedEof),
            ));
        }
        Ok(copied)
    }
}
