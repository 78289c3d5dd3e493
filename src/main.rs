use anyhow::{Context, Result};
use clap::Parser;
use palfix::config::Config;
use palfix::interactive::{confirm_overwrite, print_header};
use palfix::pipeline::{print_summary, retime_file_with_cancel, validate_paths};
use palfix::timing::RationalFactor;
use palfix::toolkit::MkvToolkit;
use palfix::PalfixError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "palfix")]
#[command(version, about = "Slow down a Matroska video to correct for PAL speedup")]
#[command(long_about = "Stretch video, subtitle and chapter timestamps by a correction factor \
(25/24 by default) and re-rate audio to match, using mkvtoolnix and FFmpeg.")]
struct Cli {
    /// The file to be processed
    input: PathBuf,

    /// The filename for the new, processed file
    output: PathBuf,

    /// Correction factor as N/D (overrides config and PALFIX_FACTOR)
    #[arg(short, long)]
    factor: Option<RationalFactor>,

    /// Overwrite the output file without asking
    #[arg(short, long)]
    yes: bool,

    /// Hide progress spinners
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(factor) = cli.factor {
        config.factor = factor;
    }
    if cli.no_progress {
        config.show_progress = false;
    }
    config.validate().context("Configuration validation failed")?;

    validate_paths(&cli.input, &cli.output)?;

    if !confirm_overwrite(&cli.output, cli.yes)? {
        println!("Stopping.");
        return Ok(());
    }

    print_header(&cli.input, &cli.output, &config.factor);

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received, stopping after the current step...");
            cancelled.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl+C handler")?;
    }

    let toolkit = MkvToolkit::new(config.tools.clone());

    match retime_file_with_cancel(&cli.input, &cli.output, &config, &toolkit, cancelled).await {
        Ok(result) => {
            print_summary(&result);
            Ok(())
        }
        Err(PalfixError::Cancelled) => {
            info!("Cancelled, no output written");
            std::process::exit(130);
        }
        Err(e) => Err(e).context("Speedup correction failed"),
    }
}
