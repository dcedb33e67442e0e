//! Fixed credential store for testing.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::platform::{CredentialBundle, CredentialStore, Platform};

/// Credential store backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    entries: HashMap<Platform, CredentialBundle>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cookie file for a platform.
    pub fn with_cookies(mut self, platform: Platform, cookies_file: impl Into<PathBuf>) -> Self {
        self.entries.insert(
            platform,
            CredentialBundle {
                cookies_file: cookies_file.into(),
            },
        );
        self
    }
}

impl CredentialStore for StaticCredentialStore {
    fn lookup(&self, platform: Platform) -> Option<CredentialBundle> {
        self.entries.get(&platform).cloned()
    }
}
