/// Clipreel - Keyword-Driven Highlight Extraction
///
/// Turns a source video and a keyword into a highlight reel: the audio is
/// transcribed, subtitle blocks matching the keyword are widened with
/// surrounding context, the matching time ranges are trimmed out with
/// ffmpeg, and the clips are concatenated into a single reel, optionally
/// with subtitles burned into the frame.

pub mod config;
pub mod errors;
pub mod pipeline;
pub mod subtitle;
pub mod timecode;
pub mod transcription;
pub mod video;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::errors::JobError;
pub use crate::pipeline::{JobOutcome, Pipeline};
pub use crate::subtitle::{select_ranges, SelectionOptions, SubtitleBlock, SubtitleDocument};
pub use crate::timecode::{TimeRange, Timecode};
pub use crate::transcription::TranscriptionClient;
pub use crate::video::VideoEncoder;
