//! Per-platform credential lookup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::Platform;

/// Credentials attached to an extractor call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    /// Netscape-format cookie file.
    pub cookies_file: PathBuf,
}

/// Source of per-platform credentials.
///
/// A missing entry is not an error: the call proceeds unauthenticated.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, platform: Platform) -> Option<CredentialBundle>;
}

/// Looks up `<platform>_cookies.txt` or `<platform>.txt` in a directory.
#[derive(Debug, Clone)]
pub struct CookieDirStore {
    dir: PathBuf,
}

impl CookieDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CredentialStore for CookieDirStore {
    fn lookup(&self, platform: Platform) -> Option<CredentialBundle> {
        [
            format!("{}_cookies.txt", platform.as_str()),
            format!("{}.txt", platform.as_str()),
        ]
        .into_iter()
        .map(|name| self.dir.join(name))
        .find(|path| path.is_file())
        .map(|cookies_file| CredentialBundle { cookies_file })
    }
}

/// A store with no credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn lookup(&self, _platform: Platform) -> Option<CredentialBundle> {
        None
    }
}
