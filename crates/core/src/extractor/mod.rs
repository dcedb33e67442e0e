//! Media extractor capability.
//!
//! The extractor resolves a media URL into metadata and downloads a single
//! asset (video or audio) into the shared output directory. The production
//! implementation shells out to `yt-dlp`; every call is parameterized by a
//! [`StrategyProfile`](crate::platform::StrategyProfile) from the platform
//! resolver.
//!
//! Extractor calls are not trusted to report success accurately: callers check
//! that the expected output file exists via [`DownloadRequest::locate_output`].

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use traits::Extractor;
pub use types::{AssetKind, DownloadRequest, MediaMetadata};
pub use ytdlp::YtDlpExtractor;
