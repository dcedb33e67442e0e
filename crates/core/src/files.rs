//! Resolution of download requests against the output directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors resolving a requested file.
#[derive(Debug, Error)]
pub enum FileAccessError {
    /// The name contains path separators or traversal sequences.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// No such file in the output directory.
    #[error("file not found: {0}")]
    NotFound(String),
}

/// A file ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: &'static str,
}

/// Resolves a bare file name inside `output_dir`.
///
/// Names containing `..`, `/`, `\` or NUL are rejected before touching the
/// filesystem.
pub fn resolve_download(output_dir: &Path, name: &str) -> Result<ServedFile, FileAccessError> {
    if name.is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(FileAccessError::InvalidName(name.to_string()));
    }

    let path = output_dir.join(name);
    if !path.is_file() {
        return Err(FileAccessError::NotFound(name.to_string()));
    }

    Ok(ServedFile {
        content_type: content_type_for(&path),
        file_name: name.to_string(),
        path,
    })
}

/// Content type by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "avi" | "mkv" | "mov" | "wmv" => "video/mp4",
        "webm" => "video/webm",
        "mp3" | "wav" | "m4a" | "aac" | "flac" => "audio/mpeg",
        "ogg" | "opus" => "audio/ogg",
        _ => "application/octet-stream",
    }
}
