//! Message files on disk: parsing, lazy attachment reads, and directory scans.

pub mod reader;
pub mod scan;
