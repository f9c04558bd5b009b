//! Fixed-width 192-bit unsigned integer, stored as six big-endian `u32` words.

use byteorder::{BigEndian, ByteOrder};

/// Number of 32-bit words.
pub const WORDS: usize = 6;

/// Number of bytes in the big-endian representation.
pub const BYTES: usize = WORDS * 4;

/// The value does not fit in 192 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// A 192-bit unsigned integer; `words[0]` is the most significant word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Words192 {
    words: [u32; WORDS],
}

impl Words192 {
    pub const ZERO: Self = Self { words: [0; WORDS] };
    pub const MAX: Self = Self {
        words: [u32::MAX; WORDS],
    };

    pub fn from_words(words: [u32; WORDS]) -> Self {
        Self { words }
    }

    pub fn from_bytes(bytes: &[u8; BYTES]) -> Self {
        let mut words = [0u32; WORDS];
        BigEndian::read_u32_into(bytes, &mut words);
        Self { words }
    }

    pub fn to_bytes(&self) -> [u8; BYTES] {
        let mut bytes = [0u8; BYTES];
        BigEndian::write_u32_into(&self.words, &mut bytes);
        bytes
    }

    pub fn words(&self) -> &[u32; WORDS] {
        &self.words
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Index of the first non-zero word (`WORDS` when the value is zero).
    fn leading_zero_words(&self) -> usize {
        self.words
            .iter()
            .position(|&w| w != 0)
            .unwrap_or(WORDS)
    }

    /// Divide in place by `divisor`, returning the remainder.
    ///
    /// Long division from the most significant word down; words that were
    /// already zero are skipped, so the work shrinks as the value does.
    ///
    /// # Panics
    /// If `divisor` is zero.
    pub fn div_rem_small(&mut self, divisor: u32) -> u32 {
        assert!(divisor != 0, "division by zero");
        let divisor = u64::from(divisor);
        let mut remainder: u64 = 0;
        let start = self.leading_zero_words();
        for word in &mut self.words[start..] {
            let value = (remainder << 32) | u64::from(*word);
            *word = (value / divisor) as u32;
            remainder = value % divisor;
        }
        remainder as u32
    }

    /// Compute `self * factor + addend` in place.
    ///
    /// On overflow the value is left unchanged.
    pub fn mul_add_small(&mut self, factor: u32, addend: u32) -> Result<(), Overflow> {
        let mut result = self.words;
        let mut carry = u64::from(addend);
        for word in result.iter_mut().rev() {
            let value = u64::from(*word) * u64::from(factor) + carry;
            *word = value as u32;
            carry = value >> 32;
        }
        if carry != 0 {
            return Err(Overflow);
        }
        self.words = result;
        Ok(())
    }
}
