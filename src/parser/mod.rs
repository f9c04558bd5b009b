//! Message parsing: field keys, the hashing line reader, and the streaming parser.

pub mod field;
pub mod hashing;
pub mod lines;
pub mod message;

pub use message::{parse, MessageParser};
