//! Core data model types: messages, authors, and attachments.

pub mod address;
pub mod attachment;
pub mod message;
