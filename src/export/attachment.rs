//! Extract attachments from message files.

use std::path::{Path, PathBuf};

use crate::error::{MsgError, Result};
use crate::model::attachment::Attachment;
use crate::model::message::Message;
use crate::store::reader::MessageStore;

/// Longest file name (in characters) written for an attachment.
const MAX_FILE_NAME_LEN: usize = 150;

/// Write a single attachment into `output_dir`, returning the path written.
pub fn export_attachment(
    store: &mut MessageStore,
    attachment: &Attachment,
    index: usize,
    output_dir: &Path,
) -> Result<PathBuf> {
    store.check_range(attachment)?;
    let filename = attachment_file_name(&attachment.name, index);
    // Append a counter rather than overwrite
    let path = unique_path(&output_dir.join(filename))?;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| MsgError::io(&path, e))?;
    if let Err(e) = store.copy_attachment(attachment, &mut file) {
        drop(file);
        if let Err(rm) = std::fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %rm, "Failed to remove partial attachment");
        }
        return Err(e);
    }
    Ok(path)
}

/// Write every attachment of `message` into `output_dir`.
///
/// A failing attachment is logged and skipped.
pub fn export_attachments(
    store: &mut MessageStore,
    message: &Message,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|e| MsgError::io(output_dir, e))?;
    let mut paths = Vec::with_capacity(message.files.len());
    for (i, attachment) in message.files.iter().enumerate() {
        match export_attachment(store, attachment, i + 1, output_dir) {
            Ok(path) => paths.push(path),
            Err(e) => {
                tracing::warn!(
                    name = %attachment.name,
                    error = %e,
                    "Failed to export attachment"
                );
            }
        }
    }
    Ok(paths)
}

/// A safe file name for an attachment; `index` is 1-based and names
/// attachments that have no name of their own.
pub fn attachment_file_name(name: &str, index: usize) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect();
    let sanitized = sanitized.trim();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        format!("attachment-{index}")
    } else {
        sanitized.to_string()
    }
}

/// Attempts at a free `stem_N` name before giving up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    (1..MAX_NAME_ATTEMPTS)
        .map(|i| {
            if ext.is_empty() {
                parent.join(format!("{stem}_{i}"))
            } else {
                parent.join(format!("{stem}_{i}.{ext}"))
            }
        })
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| {
            MsgError::io(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("no free name after {MAX_NAME_ATTEMPTS} attempts"),
                ),
            )
        })
}
