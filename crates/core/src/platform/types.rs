//! Types for platform strategies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::credentials::CredentialBundle;

/// A media host with its own acquisition strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Bilibili,
    Douyin,
    Xiaohongshu,
    Youtube,
    Tiktok,
    Generic,
}

/// Domain fragments mapped to platforms, checked in order.
const DOMAIN_TABLE: &[(&str, Platform)] = &[
    ("bilibili.com", Platform::Bilibili),
    ("b23.tv", Platform::Bilibili),
    ("douyin.com", Platform::Douyin),
    ("xiaohongshu.com", Platform::Xiaohongshu),
    ("xhslink.com", Platform::Xiaohongshu),
    ("youtube.com", Platform::Youtube),
    ("youtu.be", Platform::Youtube),
    ("tiktok.com", Platform::Tiktok),
];

impl Platform {
    /// Classifies a URL by substring match on known domains.
    pub fn detect(url: &str) -> Self {
        let url = url.to_ascii_lowercase();
        DOMAIN_TABLE
            .iter()
            .find(|(domain, _)| url.contains(domain))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Generic)
    }

    /// Returns the string representation of this platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Bilibili => "bilibili",
            Platform::Douyin => "douyin",
            Platform::Xiaohongshu => "xiaohongshu",
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Generic => "generic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered list of format selectors tried first to last.
///
/// The final clause is always unconditional (carries no `[...]` filter), so a
/// resolvable URL always matches something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatExpression {
    clauses: Vec<String>,
}

impl FormatExpression {
    /// Builds an expression, appending `best` when the last clause is filtered.
    pub fn new<I, S>(clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut clauses: Vec<String> = clauses
            .into_iter()
            .map(Into::into)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let terminated = clauses.last().is_some_and(|c| !c.contains('['));
        if !terminated {
            clauses.push("best".to_string());
        }

        Self { clauses }
    }

    /// Parses a `/`-separated selector string.
    pub fn parse(selector: &str) -> Self {
        Self::new(selector.split('/'))
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    /// The selector string passed to the extractor.
    pub fn selector(&self) -> String {
        self.clauses.join("/")
    }
}

impl fmt::Display for FormatExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector())
    }
}

/// Retry and pacing parameters for extractor calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub retries: u32,
    pub fragment_retries: u32,
    pub sleep_interval_secs: u64,
    pub max_sleep_interval_secs: u64,
}

/// A partial profile. `None` fields leave the underlying value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyLayer {
    pub video_format: Option<FormatExpression>,
    pub audio_format: Option<FormatExpression>,
    pub headers: BTreeMap<String, String>,
    pub retry: Option<RetryPolicy>,
    pub extractor_args: Option<Vec<String>>,
    pub proxy_url: Option<String>,
    pub socket_timeout_secs: Option<u64>,
    pub credentials: Option<CredentialBundle>,
}

impl StrategyLayer {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The fully resolved parameters for one extractor call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyProfile {
    pub platform: Platform,
    pub video_format: FormatExpression,
    pub audio_format: FormatExpression,
    pub headers: BTreeMap<String, String>,
    pub retry: RetryPolicy,
    pub extractor_args: Vec<String>,
    pub proxy_url: Option<String>,
    pub socket_timeout_secs: u64,
    pub credentials: Option<CredentialBundle>,
}

impl StrategyProfile {
    /// Applies a layer on top of this profile. Layer values win; headers merge.
    pub fn with_layer(mut self, layer: &StrategyLayer) -> Self {
        if let Some(format) = &layer.video_format {
            self.video_format = format.clone();
        }
        if let Some(format) = &layer.audio_format {
            self.audio_format = format.clone();
        }
        self.headers.extend(
            layer
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        if let Some(retry) = layer.retry {
            self.retry = retry;
        }
        if let Some(args) = &layer.extractor_args {
            self.extractor_args = args.clone();
        }
        if let Some(proxy) = &layer.proxy_url {
            self.proxy_url = Some(proxy.clone());
        }
        if let Some(secs) = layer.socket_timeout_secs {
            self.socket_timeout_secs = secs;
        }
        if let Some(credentials) = &layer.credentials {
            self.credentials = Some(credentials.clone());
        }
        self
    }
}
