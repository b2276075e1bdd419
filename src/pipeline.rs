use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::JobError;
use crate::subtitle::{select_ranges, SubtitleDocument};
use crate::transcription::TranscriptionClient;
use crate::video::VideoEncoder;

/// Result of one finished job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// The reel the caller should serve.
    pub reel_path: PathBuf,
    /// Whether subtitles were burned into `reel_path`.
    pub subtitled: bool,
    /// How many clips made it into the reel.
    pub clip_count: usize,
    /// End-to-end processing time.
    pub elapsed: Duration,
}

/// The extraction core: one job runs the whole pipeline synchronously —
/// extract audio, transcribe, select keyword ranges, trim clips, assemble
/// the reel, and optionally re-transcribe and burn subtitles.
///
/// Each job gets its own working directory under the output dir, so
/// concurrent jobs never collide on clip names. The working directory is
/// removed best-effort on success and failure alike.
pub struct Pipeline {
    config: Config,
    encoder: VideoEncoder,
    transcriber: TranscriptionClient,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let encoder = VideoEncoder::new(&config.encoder);
        let transcriber = TranscriptionClient::new(config.transcription.clone());
        Self {
            config,
            encoder,
            transcriber,
        }
    }

    /// Run one job end to end.
    pub async fn run(
        &self,
        video_path: &Path,
        keyword: &str,
        burn_subtitles: bool,
    ) -> Result<JobOutcome, JobError> {
        let started = Instant::now();

        if !video_path.exists() {
            return Err(JobError::Input(format!(
                "Video file not found: {}",
                video_path.display()
            )));
        }
        if keyword.trim().is_empty() {
            return Err(JobError::Input("Keyword must not be empty".to_string()));
        }

        tokio::fs::create_dir_all(&self.config.output.base_dir)
            .await
            .map_err(|e| JobError::Internal(e.into()))?;

        // Job-scoped working directory: unique name per job, removed on
        // drop along with every intermediate artifact inside it.
        let work = tempfile::Builder::new()
            .prefix("job-")
            .tempdir_in(&self.config.output.base_dir)
            .map_err(|e| JobError::Internal(e.into()))?;
        let job_id = work
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "job".to_string());

        info!("🚀 Starting job {} for keyword \"{}\"", job_id, keyword);

        let result = self
            .run_in_workspace(video_path, keyword, burn_subtitles, work.path(), &job_id)
            .await;

        match &result {
            Ok(outcome) => info!(
                "🎉 Job {} finished in {:.1}s: {} clip(s), subtitles {}",
                job_id,
                outcome.elapsed.as_secs_f64(),
                outcome.clip_count,
                if outcome.subtitled { "burned in" } else { "omitted" }
            ),
            Err(e) => error!("❌ Job {} failed: {}", job_id, source_chain(e)),
        }

        if self.config.output.keep_work_dir {
            let kept = work.into_path();
            info!("📁 Keeping working directory: {}", kept.display());
        }

        result.map(|mut outcome| {
            outcome.elapsed = started.elapsed();
            outcome
        })
    }

    async fn run_in_workspace(
        &self,
        video_path: &Path,
        keyword: &str,
        burn_subtitles: bool,
        work_dir: &Path,
        job_id: &str,
    ) -> Result<JobOutcome, JobError> {
        let started = Instant::now();

        // Audio out of the source video, then a subtitle track out of the
        // audio.
        let audio_path = self
            .encoder
            .extract_audio(video_path, work_dir)
            .await
            .map_err(|e| JobError::collaborator("audio extraction", e))?;

        let transcript_path = work_dir.join("transcript.srt");
        self.transcriber
            .transcribe_audio(&self.encoder, &audio_path, &transcript_path)
            .await
            .map_err(|e| JobError::collaborator("transcription", e))?;

        // Keyword search over the parsed blocks. Parse failures are
        // absorbed upstream, so an unreadable document surfaces here as
        // "no matches".
        let document = SubtitleDocument::load(&transcript_path).await;
        let blocks = document.blocks();
        let ranges = select_ranges(&blocks, keyword, &self.config.selection.options());

        if ranges.is_empty() {
            return Err(JobError::Input(format!(
                "No subtitle blocks matched keyword \"{}\"",
                keyword
            )));
        }

        info!("🔍 {} range(s) selected for keyword \"{}\"", ranges.len(), keyword);

        // Trim one clip per range; individual failures are absorbed. The
        // assembler rejects an empty clip list before invoking the
        // encoder, so an all-failed extraction still fails loudly.
        let clips = self.encoder.extract_clips(video_path, &ranges, work_dir).await;

        let reel_path = self
            .config
            .output
            .base_dir
            .join(format!("{}_reel.mp4", job_id));
        self.encoder
            .concat_clips(&clips, work_dir, &reel_path)
            .await
            .map_err(|e| JobError::collaborator("reel assembly", e))?;

        info!("✅ Reel assembled: {}", reel_path.display());

        // Burn-in re-transcribes the assembled reel from scratch so
        // subtitle timing matches the reel, not the source video. If any
        // of that fails the plain reel is still a valid result, so the
        // job degrades instead of failing.
        let mut outcome = JobOutcome {
            reel_path: reel_path.clone(),
            subtitled: false,
            clip_count: clips.len(),
            elapsed: started.elapsed(),
        };

        if burn_subtitles {
            match self.burn_reel_subtitles(&reel_path, work_dir).await {
                Ok(subtitled_path) => {
                    outcome.reel_path = subtitled_path;
                    outcome.subtitled = true;
                }
                Err(e) => {
                    warn!(
                        "Subtitle burn-in failed, serving reel without subtitles: {:#}",
                        e
                    );
                }
            }
        }

        outcome.elapsed = started.elapsed();
        Ok(outcome)
    }

    /// Re-transcribe the finished reel and render the fresh subtitles
    /// into the frame.
    async fn burn_reel_subtitles(
        &self,
        reel_path: &Path,
        work_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        let reel_audio = self.encoder.extract_audio(reel_path, work_dir).await?;

        let reel_srt = work_dir.join("reel.srt");
        self.transcriber
            .transcribe_audio(&self.encoder, &reel_audio, &reel_srt)
            .await?;

        let stem = reel_path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "reel".to_string());
        let subtitled_path = reel_path.with_file_name(format!("{}_subtitled.mp4", stem));

        self.encoder
            .burn_subtitles(reel_path, &reel_srt, &subtitled_path)
            .await?;

        Ok(subtitled_path)
    }
}

/// Full error detail for the log; the `Display` of `JobError::Internal`
/// stays generic for the caller.
fn source_chain(err: &JobError) -> String {
    match err {
        JobError::Internal(inner) => format!("{:#}", inner),
        other => other.to_string(),
    }
}
