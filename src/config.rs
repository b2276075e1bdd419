use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::subtitle::SelectionOptions;

/// Configuration for the highlight-reel pipeline.
///
/// Constructed once at process start and passed by reference into each
/// component; there are no ambient globals.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Transcription service settings
    pub transcription: TranscriptionConfig,

    /// External encoder settings
    pub encoder: EncoderConfig,

    /// Keyword selection settings
    pub selection: SelectionConfig,

    /// Output and storage settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// API endpoint for the transcription service
    pub endpoint: String,

    /// API key for the transcription service
    pub api_key: Option<String>,

    /// Model to use for transcription
    pub model: String,

    /// Language hint for transcription
    pub language: Option<String>,

    /// Timeout for transcription requests (seconds)
    pub timeout_secs: u64,

    /// Split audio longer than this many seconds into chunks before
    /// uploading
    pub chunk_duration_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            api_key: None,
            model: "whisper-1".to_string(),
            language: None,
            timeout_secs: 600,
            chunk_duration_secs: 1200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// ffmpeg binary name or path
    pub ffmpeg_bin: String,

    /// ffprobe binary name or path
    pub ffprobe_bin: String,

    /// Timeout per encoder invocation (seconds)
    pub timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Blocks of surrounding context on each side of a match
    pub context_blocks: usize,

    /// Extra lead seconds before each range (clamped at zero)
    pub lead_secs: i64,

    /// Extra trail seconds after each range
    pub trail_secs: i64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            context_blocks: 1,
            lead_secs: 0,
            trail_secs: 0,
        }
    }
}

impl SelectionConfig {
    pub fn options(&self) -> SelectionOptions {
        SelectionOptions {
            context_blocks: self.context_blocks,
            lead_secs: self.lead_secs,
            trail_secs: self.trail_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives finished reels (and per-job working
    /// directories underneath it)
    pub base_dir: PathBuf,

    /// Keep the per-job working directory after the job finishes
    pub keep_work_dir: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./clips"),
            keep_work_dir: false,
        }
    }
}

impl Config {
    /// Load configuration from the first config file found, then apply
    /// environment overrides. Falls back to defaults (plus environment)
    /// when no file exists.
    pub fn load() -> Self {
        let config_paths = [
            "clipreel.toml",
            "config/clipreel.toml",
            "~/.config/clipreel/config.toml",
        ];

        let mut config = Config::default();
        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(parsed) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config = parsed;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        config.apply_env();
        config
    }

    /// Override settings from environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("CLIPREEL_API_KEY") {
            self.transcription.api_key = Some(api_key);
        } else if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            self.transcription.api_key = Some(api_key);
        }

        if let Ok(output_dir) = std::env::var("CLIPREEL_OUTPUT_DIR") {
            self.output.base_dir = PathBuf::from(output_dir);
        }

        if let Ok(ffmpeg) = std::env::var("CLIPREEL_FFMPEG") {
            self.encoder.ffmpeg_bin = ffmpeg;
        }

        if let Ok(ffprobe) = std::env::var("CLIPREEL_FFPROBE") {
            self.encoder.ffprobe_bin = ffprobe;
        }
    }

    /// Validate configuration before a job starts.
    pub fn validate(&self) -> Result<()> {
        if self.transcription.api_key.is_none() {
            return Err(anyhow!(
                "Transcription API key is not configured (set CLIPREEL_API_KEY or OPENAI_API_KEY)"
            ));
        }

        if self.transcription.timeout_secs == 0 {
            return Err(anyhow!("transcription.timeout_secs must be greater than 0"));
        }

        if self.encoder.timeout_secs == 0 {
            return Err(anyhow!("encoder.timeout_secs must be greater than 0"));
        }

        if self.transcription.chunk_duration_secs == 0 {
            return Err(anyhow!(
                "transcription.chunk_duration_secs must be greater than 0"
            ));
        }

        if !self.output.base_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(&self.output.base_dir) {
                return Err(anyhow!("Cannot create output directory: {}", e));
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }
}

/// Builder for programmatic config creation.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.transcription.api_key = Some(api_key);
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.output.base_dir = dir;
        self
    }

    pub fn with_language(mut self, language: String) -> Self {
        self.config.transcription.language = Some(language);
        self
    }

    pub fn with_context_blocks(mut self, blocks: usize) -> Self {
        self.config.selection.context_blocks = blocks;
        self
    }

    pub fn with_encoder_timeout(mut self, secs: u64) -> Self {
        self.config.encoder.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.encoder.ffmpeg_bin, "ffmpeg");
        assert_eq!(config.selection.context_blocks, 1);
        assert_eq!(config.transcription.model, "whisper-1");
        assert_eq!(config.transcription.chunk_duration_secs, 1200);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_api_key("sk-test".to_string())
            .with_context_blocks(2)
            .with_encoder_timeout(30)
            .build();

        assert_eq!(config.transcription.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.selection.context_blocks, 2);
        assert_eq!(config.encoder.timeout_secs, 30);
    }

    #[test]
    fn test_validation_requires_api_key() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let temp = tempfile::TempDir::new().unwrap();
        let config = ConfigBuilder::new()
            .with_api_key("sk-test".to_string())
            .with_output_dir(temp.path().to_path_buf())
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            "[transcription]\napi_key = \"sk-test\"\n\n[selection]\ncontext_blocks = 3\n",
        )
        .unwrap();

        assert_eq!(config.transcription.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.transcription.model, "whisper-1");
        assert_eq!(config.selection.context_blocks, 3);
        assert_eq!(config.encoder.ffmpeg_bin, "ffmpeg");
    }
}
