//! Centralized error types for smolmsg.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// What went wrong while decoding or encoding a message.
///
/// These carry no location; [`MsgError::Parse`] adds the source name and
/// line number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A header line starts with a space (empty field name).
    #[error("invalid leading space")]
    InvalidLeadingSpace,

    /// A header key that is neither known nor an `x-` extension.
    #[error("unknown field {0:?}")]
    UnknownField(String),

    /// A physical line longer than the line buffer.
    #[error("field too long")]
    FieldTooLong,

    /// An author address without the `@` separator.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// A `time` value matching neither accepted layout.
    #[error("invalid time format {0:?} (expected \"YYYY-MM-DD HH:MM:SS [+-ZZZZ]\")")]
    InvalidTimeFormat(String),

    /// A `body` or `file` size that is not a non-negative integer.
    #[error("invalid integer size {0:?}")]
    InvalidSize(String),

    /// A body larger than [`crate::model::message::MAX_BODY_SIZE`].
    #[error("body too large ({0})")]
    BodyTooLarge(u64),

    /// The stream ended before the declared body size.
    #[error("invalid body size {0} (beyond end of message file)")]
    TruncatedBody(u64),

    /// The stream ended before the declared attachment size.
    #[error("file {index} {name:?}: invalid size {size} (beyond end of message file)")]
    TruncatedAttachment { index: usize, name: String, size: u64 },

    /// The message time predates the identifier epoch base.
    #[error("invalid timestamp; {} is in the past", .0.to_rfc3339())]
    TimestampInPast(DateTime<Utc>),

    /// The message time is past the last second an identifier can hold.
    #[error("invalid timestamp; {} is out of range", .0.to_rfc3339())]
    TimestampOutOfRange(DateTime<Utc>),

    /// Text that does not decode to a 192-bit identifier.
    #[error("invalid id {0:?}")]
    InvalidId(String),

    /// A value that cannot be written on a single header line.
    #[error("invalid {0} value (contains a line break)")]
    InvalidValue(&'static str),

    /// A header line that would exceed the parser's line limit.
    #[error("{0} line too long ({1} bytes)")]
    HeaderTooLong(&'static str, usize),
}

/// All errors produced by the smolmsg library.
#[derive(Error, Debug)]
pub enum MsgError {
    /// A fatal parse error, located in its source.
    #[error("{}: {kind}", location(.origin, *.line))]
    Parse {
        origin: String,
        line: Option<usize>,
        kind: ErrorKind,
    },

    /// I/O error with the associated file path (or source name).
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("Message file not found: {0}")]
    FileNotFound(PathBuf),

    /// A message file whose name does not carry a `YYYYMMDD-HHMMSS` time.
    #[error("invalid message filename {0:?}")]
    InvalidFileName(String),

    /// A codec error outside of any parse (encoder, id decoding).
    #[error(transparent)]
    Codec(#[from] ErrorKind),
}

/// Convenience alias for `Result<T, MsgError>`.
pub type Result<T> = std::result::Result<T, MsgError>;

impl MsgError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Parse` variant.
    pub fn parse(origin: &str, line: Option<usize>, kind: ErrorKind) -> Self {
        Self::Parse {
            origin: origin.to_string(),
            line,
            kind,
        }
    }

    /// The codec error kind, if this error has one.
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            Self::Parse { kind, .. } | Self::Codec(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare; prefer `MsgError::io`).
impl From<std::io::Error> for MsgError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

fn location(origin: &str, line: Option<usize>) -> String {
    match line {
        Some(line) => format!("{origin}:{line}"),
        None => origin.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_with_line() {
        let err = MsgError::parse("inbox/a.msg", Some(3), ErrorKind::UnknownField("color".into()));
        assert_eq!(err.to_string(), "inbox/a.msg:3: unknown field \"color\"");
    }

    #[test]
    fn test_parse_error_display_without_line() {
        let err = MsgError::parse("a.msg", None, ErrorKind::FieldTooLong);
        assert_eq!(err.to_string(), "a.msg: field too long");
    }

    #[test]
    fn test_kind_accessor() {
        let err = MsgError::from(ErrorKind::InvalidId("!".into()));
        assert_eq!(err.kind(), Some(&ErrorKind::InvalidId("!".into())));
        let err = MsgError::FileNotFound(PathBuf::from("x"));
        assert!(err.kind().is_none());
    }
}
