//! Types for the extractor module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The kind of asset a download produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Video,
    Audio,
}

impl AssetKind {
    /// Returns the string representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Audio => "audio",
        }
    }

    /// File extensions the extractor may produce for this kind, in probe order.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            AssetKind::Video => &["mp4", "webm", "mkv", "avi", "mov", "flv"],
            AssetKind::Audio => &["mp3", "m4a", "wav", "aac", "ogg", "opus"],
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media metadata reported by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub format_count: usize,
}

/// A single asset download.
///
/// The extractor writes `<output_dir>/<stem>.<ext>`, choosing the extension
/// itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub kind: AssetKind,
    pub output_dir: PathBuf,
    pub stem: String,
}

impl DownloadRequest {
    pub fn new(kind: AssetKind, output_dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            kind,
            output_dir: output_dir.into(),
            stem: stem.into(),
        }
    }

    /// Output template in yt-dlp syntax.
    pub fn output_template(&self) -> PathBuf {
        self.output_dir.join(format!("{}.%(ext)s", self.stem))
    }

    /// Path the asset would have with the given extension.
    pub fn path_with_extension(&self, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", self.stem, ext))
    }

    /// Finds the file this request produced, probing the known extensions.
    pub fn locate_output(&self) -> Option<PathBuf> {
        self.kind
            .extensions()
            .iter()
            .map(|ext| self.path_with_extension(ext))
            .find(|path| is_file(path))
    }
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_template() {
        let request = DownloadRequest::new(AssetKind::Video, "/tmp/out", "video_abc_01");
        assert_eq!(
            request.output_template(),
            PathBuf::from("/tmp/out/video_abc_01.%(ext)s")
        );
    }

    #[test]
    fn test_locate_output_probes_extensions() {
        let dir = TempDir::new().unwrap();
        let request = DownloadRequest::new(AssetKind::Audio, dir.path(), "audio_abc_01");
        assert!(request.locate_output().is_none());

        std::fs::write(dir.path().join("audio_abc_01.m4a"), b"data").unwrap();
        assert_eq!(
            request.locate_output(),
            Some(dir.path().join("audio_abc_01.m4a"))
        );
    }

    #[test]
    fn test_locate_output_ignores_other_kind_extensions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("clip.mp3"), b"data").unwrap();
        let request = DownloadRequest::new(AssetKind::Video, dir.path(), "clip");
        assert!(request.locate_output().is_none());
    }

    #[test]
    fn test_asset_kind_serialization() {
        assert_eq!(serde_json::to_string(&AssetKind::Video).unwrap(), "\"video\"");
        assert_eq!(AssetKind::Audio.to_string(), "audio");
    }
}
