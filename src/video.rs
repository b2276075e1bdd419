use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::EncoderConfig;
use crate::timecode::TimeRange;

/// ffmpeg/ffprobe front-end covering the four encoder operations the
/// pipeline needs: audio-track extraction, stream-copy trims, stream-copy
/// concatenation, and subtitle burn-in.
///
/// Every invocation is a blocking external call bounded by an explicit
/// timeout; a non-zero exit is the sole failure signal.
#[derive(Debug, Clone)]
pub struct VideoEncoder {
    ffmpeg_bin: String,
    ffprobe_bin: String,
    timeout: Duration,
}

impl VideoEncoder {
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            ffmpeg_bin: config.ffmpeg_bin.clone(),
            ffprobe_bin: config.ffprobe_bin.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Extract the audio track from a video into a standalone MP3 next to
    /// the other job artifacts.
    pub async fn extract_audio(&self, video_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let stem = video_path
            .file_stem()
            .ok_or_else(|| anyhow!("Invalid video filename: {}", video_path.display()))?
            .to_string_lossy();
        let audio_path = output_dir.join(format!("{}.mp3", stem));

        info!("🎵 Extracting audio from {}", video_path.display());

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.arg("-y")
            .arg("-i")
            .arg(video_path)
            .arg("-q:a")
            .arg("0")
            .arg("-map")
            .arg("a")
            .arg(&audio_path);
        self.run(cmd, "audio extraction").await?;

        Ok(audio_path)
    }

    /// Stream-copy trim one time range out of the source video. Copy-mode
    /// trims snap to nearby keyframes, not exact frame boundaries.
    pub async fn extract_clip(
        &self,
        video_path: &Path,
        range: &TimeRange,
        output_path: &Path,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.arg("-y")
            .arg("-ss")
            .arg(range.start.to_ffmpeg())
            .arg("-to")
            .arg(range.end.to_ffmpeg())
            .arg("-i")
            .arg(video_path)
            .arg("-c")
            .arg("copy")
            .arg(output_path);
        self.run(cmd, "clip extraction").await
    }

    /// Extract one clip per range, in order. A failed range is logged and
    /// skipped; the job proceeds with the clips that worked.
    pub async fn extract_clips(
        &self,
        video_path: &Path,
        ranges: &[TimeRange],
        output_dir: &Path,
    ) -> Vec<PathBuf> {
        let mut clips = Vec::new();

        for (i, range) in ranges.iter().enumerate() {
            let clip_path = output_dir.join(format!("clip{:03}.mp4", i + 1));
            match self.extract_clip(video_path, range, &clip_path).await {
                Ok(()) => {
                    info!("✂️  Extracted clip {}/{}: {}", i + 1, ranges.len(), range);
                    clips.push(clip_path);
                }
                Err(e) => {
                    warn!("Skipping clip {}/{} ({}): {}", i + 1, ranges.len(), range, e);
                }
            }
        }

        clips
    }

    /// Stream-copy concatenate clips into one reel via an ffmpeg concat
    /// manifest. An empty clip list is rejected before any invocation;
    /// an encoder failure here is fatal to the job.
    pub async fn concat_clips(
        &self,
        clips: &[PathBuf],
        manifest_dir: &Path,
        output_path: &Path,
    ) -> Result<()> {
        if clips.is_empty() {
            return Err(anyhow!("No clips to concatenate into a reel"));
        }

        let manifest_path = manifest_dir.join("concat.txt");
        let manifest: String = clips
            .iter()
            .map(|clip| format!("file '{}'\n", clip.display()))
            .collect();
        tokio::fs::write(&manifest_path, manifest).await?;

        info!("🎬 Concatenating {} clip(s) into {}", clips.len(), output_path.display());

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.arg("-y")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(&manifest_path)
            .arg("-c")
            .arg("copy")
            .arg(output_path);
        self.run(cmd, "reel concatenation").await
    }

    /// Burn a subtitle track into the frame, copying the audio stream
    /// unchanged. Path separators are normalized for the subtitles filter.
    pub async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        let subtitle_arg = subtitle_path.to_string_lossy().replace('\\', "/");

        info!("💬 Burning subtitles into {}", output_path.display());

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.arg("-y")
            .arg("-i")
            .arg(video_path)
            .arg("-vf")
            .arg(format!("subtitles={}", subtitle_arg))
            .arg("-c:a")
            .arg("copy")
            .arg(output_path);
        self.run(cmd, "subtitle burn-in").await
    }

    /// Media duration in seconds, via ffprobe.
    pub async fn probe_duration(&self, media_path: &Path) -> Result<f64> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.ffprobe_bin)
                .arg("-v")
                .arg("error")
                .arg("-show_entries")
                .arg("format=duration")
                .arg("-of")
                .arg("default=noprint_wrappers=1:nokey=1")
                .arg(media_path)
                .output(),
        )
        .await
        .map_err(|_| anyhow!("ffprobe timed out for {}", media_path.display()))??;

        if !output.status.success() {
            return Err(anyhow!("ffprobe failed for {}", media_path.display()));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        text.trim()
            .parse::<f64>()
            .map_err(|e| anyhow!("Unparseable ffprobe duration \"{}\": {}", text.trim(), e))
    }

    /// Split an audio file into stream-copied chunks of at most
    /// `chunk_secs`. Audio already short enough is returned as-is. The
    /// produced chunks are enumerated with one directory read of the
    /// segment output, not an open-ended existence probe.
    pub async fn split_audio_chunks(
        &self,
        audio_path: &Path,
        chunk_secs: u64,
    ) -> Result<Vec<PathBuf>> {
        let duration = self.probe_duration(audio_path).await?;
        if duration <= chunk_secs as f64 {
            return Ok(vec![audio_path.to_path_buf()]);
        }

        let stem = audio_path
            .file_stem()
            .ok_or_else(|| anyhow!("Invalid audio filename: {}", audio_path.display()))?
            .to_string_lossy()
            .to_string();
        let parent = audio_path.parent().unwrap_or_else(|| Path::new("."));
        let pattern = parent.join(format!("{}_chunk%03d.mp3", stem));

        info!("✂️  Splitting {:.1}s of audio into {}s chunks", duration, chunk_secs);

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.arg("-y")
            .arg("-i")
            .arg(audio_path)
            .arg("-f")
            .arg("segment")
            .arg("-segment_time")
            .arg(chunk_secs.to_string())
            .arg("-c")
            .arg("copy")
            .arg(&pattern);
        self.run(cmd, "audio chunking").await?;

        let prefix = format!("{}_chunk", stem);
        let mut chunks = Vec::new();
        let mut entries = tokio::fs::read_dir(parent).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) && name.ends_with(".mp3") {
                chunks.push(path);
            }
        }
        chunks.sort();

        if chunks.is_empty() {
            return Err(anyhow!("Audio chunking produced no segment files"));
        }

        info!("✅ Produced {} audio chunk(s)", chunks.len());
        Ok(chunks)
    }

    /// Run one encoder invocation to completion, bounded by the configured
    /// timeout. Returns an error carrying the tail of stderr on non-zero
    /// exit.
    async fn run(&self, mut cmd: Command, what: &str) -> Result<()> {
        cmd.stdin(Stdio::null());

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(anyhow!("Failed to invoke {} for {}: {}", self.ffmpeg_bin, what, e))
            }
            Err(_) => {
                return Err(anyhow!(
                    "{} timed out after {}s",
                    what,
                    self.timeout.as_secs()
                ))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "{} exited with {}: {}",
                what,
                output.status,
                stderr_tail(&stderr)
            ));
        }

        Ok(())
    }
}

/// Last few stderr lines, enough to diagnose without dumping the full
/// encoder banner into logs.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(3);
    lines[start..].join(" | ")
}
