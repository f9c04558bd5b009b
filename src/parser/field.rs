//! Header field keys.

/// Prefix of extension fields, which parsers skip.
pub const EXTENSION_PREFIX: &str = "x-";

/// A recognized header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `subject <text>`
    Subject,
    /// `from <address> [<name>]`
    From,
    /// `to <address> [<name>]`
    To,
    /// `time <datetime> [<tz offset>]`
    Time,
    /// `body <size>`, followed by `size` raw bytes
    Body,
    /// `file <size> [<name>]`, followed by `size` raw bytes
    File,
}

impl Field {
    pub fn from_key(key: &[u8]) -> Option<Self> {
        match key {
            b"subject" => Some(Self::Subject),
            b"from" => Some(Self::From),
            b"to" => Some(Self::To),
            b"time" => Some(Self::Time),
            b"body" => Some(Self::Body),
            b"file" => Some(Self::File),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::From => "from",
            Self::To => "to",
            Self::Time => "time",
            Self::Body => "body",
            Self::File => "file",
        }
    }
}

/// Whether `key` names an extension field.
pub fn is_extension(key: &[u8]) -> bool {
    key.starts_with(EXTENSION_PREFIX.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_roundtrip() {
        for field in [
            Field::Subject,
            Field::From,
            Field::To,
            Field::Time,
            Field::Body,
            Field::File,
        ] {
            assert_eq!(Field::from_key(field.key().as_bytes()), Some(field));
        }
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        assert_eq!(Field::from_key(b"Subject"), None);
        assert_eq!(Field::from_key(b"color"), None);
    }

    #[test]
    fn test_extension() {
        assert!(is_extension(b"x-color"));
        assert!(!is_extension(b"color"));
        assert!(!is_extension(b"X-color"));
    }
}
