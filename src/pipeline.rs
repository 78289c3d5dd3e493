use crate::config::Config;
use crate::error::{PalfixError, Result};
use crate::timing::Rescaler;
use crate::toolkit::{audio_retimes, MediaToolkit};
use crate::tracks::{plan, SyncDirective};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const OLD_CHAPTERS: &str = "chapters-old.xml";
const NEW_CHAPTERS: &str = "chapters-new.xml";
const REMUXED: &str = "remuxed.mkv";
const FINISHED: &str = "finished.mkv";

/// Statistics from one re-timing run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub total_time: Duration,
    pub remux_time: Duration,
    pub audio_time: Duration,
    pub tracks: usize,
    pub audio_tracks: usize,
    /// Chapter lines whose timestamp changed.
    pub chapter_lines_rewritten: usize,
}

/// Result of re-timing a file.
#[derive(Debug)]
pub struct PipelineResult {
    pub output_path: PathBuf,
    pub directives: Vec<SyncDirective>,
    pub chapters_rewritten: bool,
    pub stats: PipelineStats,
}

/// Removes the work directory however the run ends.
struct TempCleanupGuard {
    temp_dir: Option<TempDir>,
    cancelled: Arc<AtomicBool>,
}

impl TempCleanupGuard {
    fn path(&self) -> &Path {
        self.temp_dir
            .as_ref()
            .map(|d| d.path())
            .unwrap_or_else(|| Path::new("."))
    }
}

impl Drop for TempCleanupGuard {
    fn drop(&mut self) {
        if let Some(temp_dir) = self.temp_dir.take() {
            let path = temp_dir.path().to_path_buf();
            if self.cancelled.load(Ordering::Relaxed) {
                warn!("Cancelled, cleaning up temp files: {:?}", path);
            } else {
                debug!("Cleaning up temp directory: {:?}", path);
            }
            if let Err(e) = temp_dir.close() {
                warn!("Failed to remove {:?}: {}", path, e);
            }
        }
    }
}

fn resolve(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

/// Check the input is a regular file and the output is somewhere we may
/// write to without clobbering the input.
pub fn validate_paths(input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        return Err(PalfixError::FileNotFound(input.display().to_string()));
    }
    if !input.is_file() {
        return Err(PalfixError::InvalidPath(format!(
            "{} is not a regular file",
            input.display()
        )));
    }
    if output.is_dir() {
        return Err(PalfixError::InvalidPath(format!(
            "{} is a directory",
            output.display()
        )));
    }
    if resolve(input) == resolve(output) {
        return Err(PalfixError::InvalidPath(
            "input and output paths are identical".to_string(),
        ));
    }
    Ok(())
}

/// Put the finished file at `output`. Only complete files ever land there.
async fn move_into_place(finished: &Path, output: &Path) -> Result<()> {
    if tokio::fs::rename(finished, output).await.is_ok() {
        return Ok(());
    }

    // Different filesystem: copy, and don't leave a truncated copy behind.
    debug!("Rename to {:?} failed, copying instead", output);
    if let Err(e) = tokio::fs::copy(finished, output).await {
        if let Err(rm) = tokio::fs::remove_file(output).await {
            debug!("Could not remove partial {:?}: {}", output, rm);
        }
        return Err(e.into());
    }
    Ok(())
}

fn ensure_running(cancelled: &AtomicBool) -> Result<()> {
    if cancelled.load(Ordering::Relaxed) {
        Err(PalfixError::Cancelled)
    } else {
        Ok(())
    }
}

fn spinner(multi_progress: Option<&MultiProgress>, message: &'static str) -> Option<ProgressBar> {
    multi_progress.map(|mp| {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    })
}

/// Slow a Matroska file down by `config.factor`.
///
/// Non-audio tracks and chapters are stretched by the factor, audio tracks
/// are re-rated by its reciprocal, and the result is written to `output`.
pub async fn retime_file(
    input: &Path,
    output: &Path,
    config: &Config,
    toolkit: &dyn MediaToolkit,
) -> Result<PipelineResult> {
    let cancelled = Arc::new(AtomicBool::new(false));
    retime_file_with_cancel(input, output, config, toolkit, cancelled).await
}

/// [`retime_file`] that stops between stages once `cancelled` is set.
pub async fn retime_file_with_cancel(
    input: &Path,
    output: &Path,
    config: &Config,
    toolkit: &dyn MediaToolkit,
    cancelled: Arc<AtomicBool>,
) -> Result<PipelineResult> {
    let result = run_stages(input, output, config, toolkit, cancelled.clone()).await;

    // An interrupt kills the child tools too, so report their failure as a cancel.
    match result {
        Err(_) if cancelled.load(Ordering::Relaxed) => Err(PalfixError::Cancelled),
        other => other,
    }
}

async fn run_stages(
    input: &Path,
    output: &Path,
    config: &Config,
    toolkit: &dyn MediaToolkit,
    cancelled: Arc<AtomicBool>,
) -> Result<PipelineResult> {
    let start_time = Instant::now();
    let factor = config.factor;

    config.validate()?;
    validate_paths(input, output)?;
    toolkit.check().await?;

    let guard = TempCleanupGuard {
        temp_dir: Some(TempDir::with_prefix("palfix-")?),
        cancelled: cancelled.clone(),
    };
    let temp_path = guard.path().to_path_buf();
    debug!("Using temp directory: {:?}", temp_path);

    let multi_progress = config.show_progress.then(MultiProgress::new);

    ensure_running(&cancelled)?;

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 1: Track identification and planning
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 1/4: Reading tracks from {:?}", input);

    let mut identification = toolkit.identify(input).await?;
    if !identification.audio_missing_rates().is_empty() {
        debug!(
            "Audio tracks {:?} have no sample rate, asking mkvinfo",
            identification.audio_missing_rates()
        );
        let rates = toolkit.sampling_frequencies(input).await?;
        identification.fill_sample_rates(&rates);
    }

    let directives = plan(&identification.tracks, &factor)?;
    for directive in &directives {
        info!("  {}", directive);
    }

    let audio = audio_retimes(&directives);
    if audio.len() > 1 {
        info!("Re-rating {} audio tracks independently", audio.len());
    }

    ensure_running(&cancelled)?;

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 2: Chapters
    // ═══════════════════════════════════════════════════════════════════════
    let mut chapter_lines_rewritten = 0;
    let new_chapters = if identification.has_chapters {
        info!("Stage 2/4: Re-timing chapters by {}", factor);

        let old_path = temp_path.join(OLD_CHAPTERS);
        let new_path = temp_path.join(NEW_CHAPTERS);

        toolkit.extract_chapters(input, &old_path).await?;
        let text = tokio::fs::read_to_string(&old_path).await?;
        let rescaled = Rescaler::new(factor).rescale_text(&text)?;
        tokio::fs::write(&new_path, &rescaled.text).await?;

        chapter_lines_rewritten = rescaled.rewritten;
        info!("Re-timed {} chapter timestamps", rescaled.rewritten);
        Some(new_path)
    } else {
        info!("Stage 2/4: No chapters to re-time");
        None
    };

    ensure_running(&cancelled)?;

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 3: Remux with stretched timestamps
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 3/4: Stretching video and subtitle timestamps");
    let remux_start = Instant::now();
    let remux_pb = spinner(multi_progress.as_ref(), "Remuxing...");

    let remuxed = temp_path.join(REMUXED);
    toolkit
        .remux(input, &remuxed, &directives, new_chapters.as_deref())
        .await?;

    if let Some(pb) = remux_pb {
        pb.finish_with_message("✓ Remuxed");
    }
    let remux_time = remux_start.elapsed();

    ensure_running(&cancelled)?;

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 4: Audio
    // ═══════════════════════════════════════════════════════════════════════
    let audio_start = Instant::now();
    let finished = if audio.is_empty() {
        info!("Stage 4/4: No audio tracks");
        remuxed
    } else {
        info!("Stage 4/4: Re-rating {} audio track(s)", audio.len());
        let audio_pb = spinner(multi_progress.as_ref(), "Re-encoding audio...");

        let finished = temp_path.join(FINISHED);
        toolkit.retime_audio(&remuxed, &finished, &audio).await?;

        if let Some(pb) = audio_pb {
            pb.finish_with_message("✓ Audio re-rated");
        }
        finished
    };
    let audio_time = audio_start.elapsed();

    ensure_running(&cancelled)?;
    move_into_place(&finished, output).await?;

    info!("Wrote {:?}", output);

    let stats = PipelineStats {
        total_time: start_time.elapsed(),
        remux_time,
        audio_time,
        tracks: identification.tracks.len(),
        audio_tracks: audio.len(),
        chapter_lines_rewritten,
    };

    Ok(PipelineResult {
        output_path: output.to_path_buf(),
        directives,
        chapters_rewritten: new_chapters.is_some(),
        stats,
    })
}

/// Print a summary of the run.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Speedup Correction Complete               ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", result.output_path.display());
    println!(
        "  Tracks:     {} ({} audio)",
        result.stats.tracks, result.stats.audio_tracks
    );
    if result.chapters_rewritten {
        println!(
            "  Chapters:   {} timestamps re-timed",
            result.stats.chapter_lines_rewritten
        );
    }
    println!();
    for directive in &result.directives {
        println!("    {}", directive);
    }
    println!();
    println!("  Timing:");
    println!(
        "    Remux:       {:.2}s",
        result.stats.remux_time.as_secs_f64()
    );
    println!(
        "    Audio:       {:.2}s",
        result.stats.audio_time.as_secs_f64()
    );
    println!(
        "    Total:       {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
