//! Writing out: new message files and extracted attachments.

pub mod attachment;
pub mod msg;
