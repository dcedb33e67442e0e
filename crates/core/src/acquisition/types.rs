//! Types for the acquisition module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::error::AcquisitionError;
use crate::extractor::AssetKind;

/// Which assets a job asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSelection {
    VideoOnly,
    AudioOnly,
    Both,
}

impl OutputSelection {
    /// Maps the request flags to a selection. Neither flag set yields `None`.
    pub fn from_flags(want_video: bool, want_audio: bool) -> Option<Self> {
        match (want_video, want_audio) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::VideoOnly),
            (false, true) => Some(Self::AudioOnly),
            (false, false) => None,
        }
    }

    pub fn wants_video(&self) -> bool {
        matches!(self, Self::VideoOnly | Self::Both)
    }

    pub fn wants_audio(&self) -> bool {
        matches!(self, Self::AudioOnly | Self::Both)
    }
}

/// Which branch of the cascade an attempt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptBranch {
    Primary,
    Retry,
    Emergency,
    Fallback,
}

impl AttemptBranch {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptBranch::Primary => "primary",
            AttemptBranch::Retry => "retry",
            AttemptBranch::Emergency => "emergency",
            AttemptBranch::Fallback => "fallback",
        }
    }
}

impl fmt::Display for AttemptBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files produced by an acquisition, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquiredAssets {
    files: BTreeMap<AssetKind, PathBuf>,
}

impl AcquiredAssets {
    pub fn insert(&mut self, kind: AssetKind, path: PathBuf) {
        self.files.insert(kind, path);
    }

    pub fn get(&self, kind: AssetKind) -> Option<&Path> {
        self.files.get(&kind).map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, &Path)> {
        self.files.iter().map(|(k, p)| (*k, p.as_path()))
    }
}

/// What to do after the two concurrent primary attempts finish.
#[derive(Debug)]
pub enum Reconciliation {
    Complete {
        video: PathBuf,
        audio: PathBuf,
    },
    DeriveAudio {
        video: PathBuf,
        audio_error: AcquisitionError,
    },
    RetryVideo {
        audio: PathBuf,
        video_error: AcquisitionError,
    },
    Emergency {
        video_error: AcquisitionError,
        audio_error: AcquisitionError,
    },
}

/// Decides the next step from the primary video and audio outcomes.
pub fn reconcile(
    video: Result<PathBuf, AcquisitionError>,
    audio: Result<PathBuf, AcquisitionError>,
) -> Reconciliation {
    match (video, audio) {
        (Ok(video), Ok(audio)) => Reconciliation::Complete { video, audio },
        (Ok(video), Err(audio_error)) => Reconciliation::DeriveAudio { video, audio_error },
        (Err(video_error), Ok(audio)) => Reconciliation::RetryVideo { audio, video_error },
        (Err(video_error), Err(audio_error)) => Reconciliation::Emergency {
            video_error,
            audio_error,
        },
    }
}
