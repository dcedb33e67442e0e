//! Audio transcoder capability.
//!
//! Derives an audio track from a downloaded video file when direct audio
//! extraction fails. The production implementation runs ffmpeg.

mod config;
mod error;
mod ffmpeg;
mod traits;

pub use config::TranscoderConfig;
pub use error::TranscoderError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::AudioTranscoder;
