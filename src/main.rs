use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::{error, info, warn};

use clipreel::{Config, JobError, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("clipreel=info,warn")
        .init();

    let matches = Command::new("clipreel")
        .version("0.1.0")
        .about("Keyword-driven highlight reel extraction from video")
        .arg(
            Arg::new("video")
                .value_name("VIDEO")
                .help("Source video file")
                .required(true),
        )
        .arg(
            Arg::new("keyword")
                .value_name("KEYWORD")
                .help("Keyword to search for in the transcript")
                .required(true),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory for the finished reel"),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .value_name("LANG")
                .help("Spoken language hint for transcription (e.g. en)"),
        )
        .arg(
            Arg::new("context-blocks")
                .long("context-blocks")
                .value_name("NUM")
                .help("Subtitle blocks of surrounding context per match"),
        )
        .arg(
            Arg::new("burn-subtitles")
                .short('s')
                .long("burn-subtitles")
                .help("Re-transcribe the reel and burn subtitles into it")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("keep-work-dir")
                .long("keep-work-dir")
                .help("Keep the per-job working directory for inspection")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let video_path = PathBuf::from(matches.get_one::<String>("video").unwrap());
    let keyword = matches.get_one::<String>("keyword").unwrap().clone();
    let burn_subtitles = matches.get_flag("burn-subtitles");

    // Load configuration, then layer CLI overrides on top
    let mut config = Config::load();
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output.base_dir = PathBuf::from(dir);
    }
    if let Some(lang) = matches.get_one::<String>("language") {
        config.transcription.language = Some(lang.clone());
    }
    if let Some(blocks) = matches.get_one::<String>("context-blocks") {
        config.selection.context_blocks = blocks.parse()?;
    }
    if matches.get_flag("keep-work-dir") {
        config.output.keep_work_dir = true;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }

    info!("🚀 clipreel starting...");
    info!("🎬 Video: {}", video_path.display());
    info!("🔑 Keyword: \"{}\"", keyword);
    info!("📂 Output directory: {}", config.output.base_dir.display());

    let pipeline = Pipeline::new(config);
    match pipeline.run(&video_path, &keyword, burn_subtitles).await {
        Ok(outcome) => {
            info!(
                "🎉 Done in {:.1}s: {} clip(s) in {}",
                outcome.elapsed.as_secs_f64(),
                outcome.clip_count,
                outcome.reel_path.display()
            );
            if burn_subtitles && !outcome.subtitled {
                warn!("Reel was produced without subtitles (burn-in failed)");
            }
            Ok(())
        }
        Err(JobError::Input(message)) => {
            error!("Invalid request: {}", message);
            Err(anyhow::anyhow!(message))
        }
        Err(e) => {
            error!("Job failed: {}", e);
            Err(e.into())
        }
    }
}
