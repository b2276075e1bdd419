use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::TranscriptionConfig;
use crate::subtitle::document::{render_blocks, shift_blocks, SubtitleBlock, SubtitleDocument};
use crate::video::VideoEncoder;

/// Client for the speech-to-text collaborator.
///
/// The service is an opaque remote call: audio goes up as a multipart
/// upload, an SRT document comes back. There is no retry logic; a single
/// failure aborts the job with a clear diagnostic.
pub struct TranscriptionClient {
    config: TranscriptionConfig,
    client: reqwest::Client,
}

impl TranscriptionClient {
    pub fn new(config: TranscriptionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    /// Transcribe one audio file into an SRT document at `output_path`.
    pub async fn transcribe_to_srt(
        &self,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf> {
        let srt_text = self.request_srt(audio_path).await?;
        tokio::fs::write(output_path, &srt_text).await?;

        info!(
            "💾 Transcription saved: {} ({} bytes)",
            output_path.display(),
            srt_text.len()
        );
        Ok(output_path.to_path_buf())
    }

    /// Transcribe audio of any length into an SRT document, splitting it
    /// into chunks first when it exceeds the configured chunk duration.
    /// Chunk transcriptions are shifted by the cumulative chunk durations
    /// and stitched back into one document.
    pub async fn transcribe_audio(
        &self,
        encoder: &VideoEncoder,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf> {
        let chunks = encoder
            .split_audio_chunks(audio_path, self.config.chunk_duration_secs)
            .await?;

        if chunks.len() == 1 {
            return self.transcribe_to_srt(&chunks[0], output_path).await;
        }

        info!("🎤 Transcribing {} audio chunk(s)", chunks.len());

        let mut stitched: Vec<SubtitleBlock> = Vec::new();
        let mut offset_ms = 0u64;

        for chunk in &chunks {
            let srt_text = self.request_srt(chunk).await?;
            let mut blocks = SubtitleDocument::from_bytes(srt_text.as_bytes()).blocks();
            shift_blocks(&mut blocks, offset_ms);
            stitched.extend(blocks);

            let chunk_duration = encoder.probe_duration(chunk).await?;
            offset_ms += (chunk_duration * 1000.0).round() as u64;
        }

        tokio::fs::write(output_path, render_blocks(&stitched)).await?;

        info!(
            "💾 Stitched transcription saved: {} ({} blocks)",
            output_path.display(),
            stitched.len()
        );
        Ok(output_path.to_path_buf())
    }

    /// One upload round-trip: multipart POST, SRT text back.
    async fn request_srt(&self, audio_path: &Path) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("Transcription API key not configured"))?;

        info!("🎤 Transcribing {}", audio_path.display());

        let audio_data = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio_data)
                    .file_name(file_name)
                    .mime_str("audio/mpeg")?,
            )
            .text("model", self.config.model.clone())
            .text("response_format", "srt");

        let form = if let Some(language) = &self.config.language {
            form.text("language", language.clone())
        } else {
            form
        };

        let response = timeout(
            Duration::from_secs(self.config.timeout_secs),
            self.client
                .post(&self.config.endpoint)
                .header("Authorization", format!("Bearer {}", api_key))
                .multipart(form)
                .send(),
        )
        .await
        .map_err(|_| {
            anyhow!(
                "Transcription request timed out after {}s",
                self.config.timeout_secs
            )
        })??;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Transcription service returned HTTP {}", status);
            return Err(anyhow!(
                "Transcription service error (HTTP {}): {}",
                status,
                error_text
            ));
        }

        let srt_text = response.text().await?;
        if srt_text.trim().is_empty() {
            return Err(anyhow!("Transcription service returned an empty document"));
        }

        Ok(srt_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscriptionConfig;

    #[test]
    fn test_client_creation() {
        let client = TranscriptionClient::new(TranscriptionConfig::default());
        assert_eq!(client.config.model, "whisper-1");
        assert!(client.config.api_key.is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_a_clear_diagnostic() {
        let client = TranscriptionClient::new(TranscriptionConfig::default());
        let err = client
            .request_srt(Path::new("nonexistent.mp3"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
