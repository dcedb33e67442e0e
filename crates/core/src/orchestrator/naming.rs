//! Human-readable names for produced files.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::acquisition::AcquiredAssets;
use crate::extractor::AssetKind;
use crate::jobs::FileRef;

const MAX_TITLE_CHARS: usize = 80;
const SHORT_ID_CHARS: usize = 6;

/// Reduces a title to characters safe in a file name.
///
/// Keeps letters, digits, `_`, `-` and whitespace; whitespace runs become a
/// single `_`; leading and trailing `.`, `_` and `-` are stripped; the result
/// is capped at 80 characters. An empty result becomes `untitled`.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
    let trimmed = joined.trim_matches(|c| c == '.' || c == '_' || c == '-');
    let capped: String = trimmed.chars().take(MAX_TITLE_CHARS).collect();

    if capped.is_empty() {
        "untitled".to_string()
    } else {
        capped
    }
}

/// First six characters of the job id with dashes removed.
pub fn short_id(job_id: &str) -> String {
    job_id
        .chars()
        .filter(|c| *c != '-')
        .take(SHORT_ID_CHARS)
        .collect()
}

/// Final file name: `<kind>_<title>_<shortid>.<ext>`.
pub fn published_name(kind: AssetKind, title: &str, job_id: &str, ext: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        kind.as_str(),
        sanitize_title(title),
        short_id(job_id),
        ext
    )
}

/// Renames acquired files to their published names.
///
/// A failed rename keeps the original name; the file is still reported.
pub(crate) async fn publish(
    assets: &AcquiredAssets,
    title: &str,
    job_id: &str,
) -> BTreeMap<AssetKind, FileRef> {
    let mut result = BTreeMap::new();

    for (kind, path) in assets.iter() {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let target = path.with_file_name(published_name(kind, title, job_id, ext));

        let final_path = match tokio::fs::rename(path, &target).await {
            Ok(()) => {
                debug!(from = %path.display(), to = %target.display(), "Renamed output file");
                target
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to rename output file, keeping original name");
                path.to_path_buf()
            }
        };

        if let Some(name) = file_name(&final_path) {
            result.insert(kind, FileRef::new(name));
        }
    }

    result
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
