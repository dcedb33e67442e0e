//! Strategy resolution from URL to profile.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::credentials::CredentialStore;
use super::types::{FormatExpression, Platform, RetryPolicy, StrategyLayer, StrategyProfile};
use crate::extractor::ExtractorConfig;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

/// Progressively looser video selectors, ending in the smallest available file.
const BASE_VIDEO_FORMAT: &[&str] = &[
    "best[height<=720][filesize<100M]",
    "worstvideo[height>=360]+worstaudio[acodec!=none]",
    "worstvideo+worstaudio",
    "best[height<=720]",
    "best[height<=480]",
    "worstvideo+bestaudio",
    "worst",
];

const BASE_AUDIO_FORMAT: &[&str] = &[
    "bestaudio[filesize<50M]",
    "bestaudio",
    "best[filesize<50M]",
    "best",
];

/// Resolves the strategy profile for a URL.
pub struct StrategyResolver {
    base: StrategyProfile,
    credentials: Arc<dyn CredentialStore>,
}

impl StrategyResolver {
    /// Creates a resolver whose base profile comes from the extractor config.
    pub fn new(config: &ExtractorConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            base: Self::base_profile(config),
            credentials,
        }
    }

    /// The profile used for hosts without a dedicated strategy.
    pub fn base_profile(config: &ExtractorConfig) -> StrategyProfile {
        StrategyProfile {
            platform: Platform::Generic,
            video_format: FormatExpression::new(BASE_VIDEO_FORMAT.iter().copied()),
            audio_format: FormatExpression::new(BASE_AUDIO_FORMAT.iter().copied()),
            headers: base_headers(),
            retry: RetryPolicy {
                retries: config.max_retries,
                fragment_retries: config.max_retries,
                sleep_interval_secs: config.request_sleep_interval_secs,
                max_sleep_interval_secs: config.max_request_sleep_interval_secs,
            },
            extractor_args: Vec::new(),
            proxy_url: config.proxy().map(str::to_string),
            socket_timeout_secs: config.socket_timeout_secs,
            credentials: None,
        }
    }

    /// The override layer for a platform.
    ///
    /// Rate-limited hosts get more retries and at least 2s/10s of sleep.
    pub fn platform_layer(platform: Platform, base_retry: &RetryPolicy) -> StrategyLayer {
        match platform {
            Platform::Bilibili => StrategyLayer {
                video_format: Some(FormatExpression::parse(
                    "worstvideo[height>=360]+worstaudio/worstvideo+worstaudio/worst",
                )),
                ..Default::default()
            },
            Platform::Xiaohongshu | Platform::Tiktok => StrategyLayer {
                video_format: Some(FormatExpression::parse("best[height<=720]/best")),
                ..Default::default()
            },
            Platform::Youtube => StrategyLayer {
                video_format: Some(FormatExpression::parse("best[height<=1080]/best")),
                headers: headers(&[
                    ("Referer", "https://www.youtube.com/"),
                    ("Origin", "https://www.youtube.com"),
                    ("X-YouTube-Client-Name", "1"),
                    ("X-YouTube-Client-Version", "2.20231201.01.00"),
                ]),
                retry: Some(rate_limited(base_retry)),
                extractor_args: Some(vec![
                    "youtube:player_client=android,web;skip=hls,dash".to_string(),
                ]),
                ..Default::default()
            },
            Platform::Douyin => StrategyLayer {
                video_format: Some(FormatExpression::parse("best[height<=720]/best")),
                headers: headers(&[
                    ("Referer", "https://www.douyin.com/"),
                    ("Origin", "https://www.douyin.com"),
                    ("User-Agent", MOBILE_USER_AGENT),
                ]),
                retry: Some(rate_limited(base_retry)),
                ..Default::default()
            },
            Platform::Generic => StrategyLayer::default(),
        }
    }

    /// Resolves the profile for a URL.
    ///
    /// Layers apply in order: base, platform, then per-call credentials.
    pub fn resolve(&self, url: &str) -> StrategyProfile {
        let platform = Platform::detect(url);
        let platform_layer = Self::platform_layer(platform, &self.base.retry);

        let call_layer = StrategyLayer {
            credentials: self.credentials.lookup(platform),
            ..Default::default()
        };
        if call_layer.credentials.is_none() {
            debug!(%platform, "No credentials configured, proceeding unauthenticated");
        }

        let mut profile = self
            .base
            .clone()
            .with_layer(&platform_layer)
            .with_layer(&call_layer);
        profile.platform = platform;
        profile
    }
}

fn rate_limited(base: &RetryPolicy) -> RetryPolicy {
    RetryPolicy {
        retries: 5,
        fragment_retries: 5,
        sleep_interval_secs: base.sleep_interval_secs.max(2),
        max_sleep_interval_secs: base.max_sleep_interval_secs.max(10),
    }
}

fn base_headers() -> BTreeMap<String, String> {
    headers(&[
        ("User-Agent", DESKTOP_USER_AGENT),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
        ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8"),
        ("Accept-Encoding", "gzip, deflate"),
        ("DNT", "1"),
        ("Connection", "keep-alive"),
        ("Upgrade-Insecure-Requests", "1"),
    ])
}

fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
