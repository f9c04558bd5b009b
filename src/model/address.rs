//! Author addresses.

use unicode_normalization::UnicodeNormalization;

use crate::error::ErrorKind;

/// The sender or recipient of a message.
///
/// # Examples
/// - `"robin@address Robin Smith"` → `address = "robin@address"`, `name = "Robin Smith"`
/// - `"Sam@Address"` → `address = "sam@address"`, `name = ""`
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq, Hash)]
pub struct Author {
    /// Normalized address (`username@domain`, NFC, lower-case).
    pub address: String,
    /// Display name (may be empty).
    pub name: String,
}

impl Author {
    /// Build an author from a raw address and display name.
    pub fn new(address: &str, name: &str) -> Result<Self, ErrorKind> {
        Ok(Self {
            address: normalize_address(address.trim())?,
            name: name.trim().to_string(),
        })
    }

    /// Parse a `from`/`to` header value: `<address> [<name>]`.
    pub fn parse(value: &str) -> Result<Self, ErrorKind> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ErrorKind::InvalidAddress(String::new()));
        }
        match value.split_once(' ') {
            Some((address, name)) => Self::new(address, name),
            None => Self::new(value, ""),
        }
    }

    /// The display name, or the address when there is none.
    pub fn short_name(&self) -> &str {
        if self.name.is_empty() {
            &self.address
        } else {
            &self.name
        }
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{:?} {}", self.name, self.address)
        }
    }
}

/// Canonicalize an address so that equal-looking addresses compare equal.
///
/// The address is NFC-normalized (so that "café" typed with a combining
/// accent matches the precomposed form) and lower-cased. The address must
/// hold exactly one `@` and no whitespace, since a space ends the address
/// in a header value.
pub fn normalize_address(raw: &str) -> Result<String, ErrorKind> {
    let address: String = raw.nfc().collect::<String>().to_lowercase();
    if address.matches('@').count() != 1 || address.contains(char::is_whitespace) {
        return Err(ErrorKind::InvalidAddress(raw.to_string()));
    }
    Ok(address)
}
