//! Directory scanning: parse every message file below a directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::reader::{parse_file, MESSAGE_EXTENSION};
use crate::error::{MsgError, Result};
use crate::model::message::Message;

/// Outcome of a scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Parsed messages, newest id first.
    pub messages: Vec<Message>,
    /// Files that failed to parse, with the error.
    pub failed: Vec<(PathBuf, MsgError)>,
}

/// Parse all `*.msg` files under `dir`, recursively.
///
/// Dot files and dot directories are skipped. A file that fails to parse is
/// logged and recorded in [`ScanReport::failed`]; only an unreadable `dir`
/// itself is an error.
pub fn scan_dir(dir: impl AsRef<Path>) -> Result<ScanReport> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    collect_message_files(dir, &mut files)?;
    debug!(dir = %dir.display(), count = files.len(), "Found message files");

    let mut report = ScanReport::default();
    for path in files {
        match parse_file(&path) {
            Ok(msg) => report.messages.push(msg),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unparseable message");
                report.failed.push((path, e));
            }
        }
    }
    report.messages.sort_by(|a, b| b.id().cmp(a.id()));
    Ok(report)
}

fn collect_message_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| MsgError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| MsgError::io(dir, e))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| MsgError::io(&path, e))?;
        if file_type.is_dir() {
            if let Err(e) = collect_message_files(&path, out) {
                warn!(path = %path.display(), error = %e, "Skipping unreadable directory");
            }
        } else if path.extension().is_some_and(|ext| ext == MESSAGE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}
