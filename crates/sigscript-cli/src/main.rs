use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sigscript_runtime::{
    BridgeError, Domain, FunctionExecutor, Kwargs, RuntimeSession, TransformOptions,
};
use tracing_subscriber::{EnvFilter, fmt};

mod blocks;
mod catalog;
mod config;
mod error;

use catalog::SignalCatalog;
use config::SigscriptConfig;
use error::CliError;

#[derive(Parser)]
#[command(
    name = "sigscript",
    version,
    about = "sigscript: run Python signal functions on recorded signals"
)]
struct Cli {
    /// Config file (default: ~/.sigscript/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a script and print the entry function's signature as JSON
    Inspect {
        /// Python source file
        script: PathBuf,
    },
    /// Call a script's entry function on a signal and print the result as JSON
    Run {
        /// Python source file
        script: PathBuf,

        /// Signal JSON file, or the name/title of a catalog signal
        #[arg(long)]
        signal: String,

        /// Hand the function time-domain samples or their spectrum
        #[arg(long)]
        domain: Option<Domain>,

        /// Apply a Hann window before the spectrum is taken
        #[arg(long, overrides_with = "no_window")]
        window: bool,

        /// Take the spectrum without a window, even if the config enables one
        #[arg(long, overrides_with = "window")]
        no_window: bool,

        /// Keyword arguments as a JSON object
        #[arg(long)]
        kwargs: Option<String>,

        /// Analyse only this block of the signal
        #[arg(long, conflicts_with = "at_sample")]
        block: Option<usize>,

        /// Analyse only the block nearest to this sample
        #[arg(long)]
        at_sample: Option<f64>,

        /// Block size in samples
        #[arg(long)]
        block_size: Option<usize>,

        /// Distance between block starts in samples
        #[arg(long)]
        step: Option<usize>,
    },
    /// List the signals in the catalog directory
    Signals {
        /// Catalog directory (overrides the config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON results
    let filter = EnvFilter::from_env("SIGSCRIPT_LOG");
    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = SigscriptConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Inspect { script } => inspect(&script).await,
        Command::Run {
            script,
            signal,
            domain,
            window,
            no_window,
            kwargs,
            block,
            at_sample,
            block_size,
            step,
        } => {
            let options = transform_options(
                config.transform,
                domain,
                window_flag(window, no_window),
            );

            let kwargs = match kwargs {
                Some(raw) => serde_json::from_str::<Kwargs>(&raw)
                    .context("--kwargs must be a JSON object")?,
                None => Kwargs::new(),
            };

            let selection = match (block, at_sample) {
                (Some(index), _) => Selection::Block(index),
                (None, Some(sample)) => Selection::AtSample(sample),
                (None, None) => Selection::Whole,
            };
            let geometry = (
                block_size.unwrap_or(config.blocks.size),
                step.unwrap_or(config.blocks.step),
            );
            if geometry.1 == 0 {
                bail!("--step must be at least 1");
            }

            let catalog = SignalCatalog::new(config.signals.dir);
            let (title, samples) = resolve_signal(&catalog, &signal).await?;
            let data = select_block(samples, selection, geometry)?;

            tracing::info!(
                signal = %title,
                samples = data.len(),
                domain = %options.domain,
                window = options.apply_window,
                "Running script"
            );
            run(&script, data, options, kwargs).await
        }
        Command::Signals { dir } => {
            let catalog = SignalCatalog::new(dir.unwrap_or(config.signals.dir));
            let entries = catalog.list().await?;
            if entries.is_empty() {
                eprintln!("No signals in {}", catalog.dir().display());
            }
            for entry in entries {
                println!("{}\t{}", entry.name, entry.title);
            }
            Ok(())
        }
    }
}

/// `--window` / `--no-window`, whichever came last; `None` when neither was given.
fn window_flag(window: bool, no_window: bool) -> Option<bool> {
    match (window, no_window) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Command-line choices layered over the configured transform.
fn transform_options(
    configured: TransformOptions,
    domain: Option<Domain>,
    window: Option<bool>,
) -> TransformOptions {
    TransformOptions {
        domain: domain.unwrap_or(configured.domain),
        apply_window: window.unwrap_or(configured.apply_window),
    }
}

#[derive(Debug, Clone, Copy)]
enum Selection {
    Whole,
    Block(usize),
    AtSample(f64),
}

fn select_block(
    samples: Vec<f32>,
    selection: Selection,
    (bsize, ssize): (usize, usize),
) -> Result<Vec<f32>, CliError> {
    let len = samples.len();
    let index = match selection {
        Selection::Whole => return Ok(samples),
        Selection::Block(index) => {
            let last = blocks::number_of_blocks(len, bsize, ssize);
            if index > last {
                return Err(CliError::BlockOutOfRange {
                    index,
                    available: last + 1,
                });
            }
            index
        }
        Selection::AtSample(sample) => {
            tracing::debug!(
                sample,
                snapped = blocks::sample_to_block_center(sample, bsize, ssize, Some(len)),
                "Snapping sample to block center"
            );
            blocks::sample_to_block_index(sample, bsize, ssize, Some(len))
        }
    };
    let range = blocks::block_range(index, bsize, ssize, len);
    tracing::debug!(
        block = index,
        start = range.start,
        end = range.end,
        center = blocks::block_index_to_center(index, bsize, ssize),
        "Selected block"
    );
    Ok(samples[range].to_vec())
}

async fn resolve_signal(catalog: &SignalCatalog, key: &str) -> Result<(String, Vec<f32>)> {
    let path = Path::new(key);
    if path.is_file() {
        return Ok(catalog::read_signal(path).await?);
    }
    let entry = catalog.find(key).await?;
    let data = catalog.load(&entry).await?;
    Ok((entry.title, data))
}

async fn read_script(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read script {}", path.display()))
}

async fn inspect(script: &Path) -> Result<()> {
    let code = read_script(script).await?;
    let session = RuntimeSession::create().await?;

    let signature = tokio::task::spawn_blocking(move || -> Result<_, BridgeError> {
        let executor = FunctionExecutor::load(session, code)?;
        executor.inspect()
    })
    .await??;

    println!("{}", serde_json::to_string_pretty(&signature)?);
    Ok(())
}

async fn run(
    script: &Path,
    data: Vec<f32>,
    options: TransformOptions,
    kwargs: Kwargs,
) -> Result<()> {
    let code = read_script(script).await?;
    let session = RuntimeSession::create().await?;

    let result = tokio::task::spawn_blocking(move || -> Result<_, BridgeError> {
        let executor = FunctionExecutor::load(session, code)?;
        executor.invoke(&data, options, &kwargs)?.to_json()
    })
    .await??;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }

    #[test]
    fn whole_signal_is_passed_through() {
        let out = select_block(ramp(10), Selection::Whole, (4, 2)).unwrap();
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn block_selects_its_range() {
        let out = select_block(ramp(10), Selection::Block(2), (4, 2)).unwrap();
        assert_eq!(out, vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn block_past_the_end_is_rejected() {
        let err = select_block(ramp(10), Selection::Block(4), (4, 2)).unwrap_err();
        assert!(matches!(
            err,
            CliError::BlockOutOfRange {
                index: 4,
                available: 4
            }
        ));
    }

    #[test]
    fn at_sample_picks_nearest_block() {
        // centers: 2, 4, 6, 8
        let out = select_block(ramp(10), Selection::AtSample(6.2), (4, 2)).unwrap();
        assert_eq!(out, vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn short_signal_yields_clipped_first_block() {
        let out = select_block(ramp(3), Selection::Block(0), (4, 2)).unwrap();
        assert_eq!(out, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "sigscript",
            "run",
            "gain.py",
            "--signal",
            "sine",
            "--domain",
            "spectrum",
            "--window",
            "--block",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                domain,
                window,
                block,
                ..
            } => {
                assert_eq!(domain, Some(Domain::Spectrum));
                assert!(window);
                assert_eq!(block, Some(3));
            }
            _ => panic!("expected run"),
        }
    }

    fn run_flags(args: &[&str]) -> (Option<Domain>, Option<bool>) {
        let mut argv = vec!["sigscript", "run", "gain.py", "--signal", "sine"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run {
                domain,
                window,
                no_window,
                ..
            } => (domain, window_flag(window, no_window)),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn no_window_overrides_configured_window() {
        let configured = TransformOptions::spectrum(true);
        let (domain, window) = run_flags(&["--no-window"]);
        assert_eq!(
            transform_options(configured, domain, window),
            TransformOptions::spectrum(false)
        );
    }

    #[test]
    fn config_applies_when_flags_are_absent() {
        let configured = TransformOptions::spectrum(true);
        let (domain, window) = run_flags(&[]);
        assert_eq!(window, None);
        assert_eq!(transform_options(configured, domain, window), configured);
    }

    #[test]
    fn last_window_flag_wins() {
        assert_eq!(run_flags(&["--window", "--no-window"]).1, Some(false));
        assert_eq!(run_flags(&["--no-window", "--window"]).1, Some(true));
    }

    #[test]
    fn domain_flag_overrides_config() {
        let (domain, window) = run_flags(&["--domain", "signal"]);
        assert_eq!(
            transform_options(TransformOptions::spectrum(true), domain, window),
            TransformOptions {
                domain: Domain::Signal,
                apply_window: true,
            }
        );
    }

    #[test]
    fn block_and_at_sample_conflict() {
        let parsed = Cli::try_parse_from([
            "sigscript",
            "run",
            "gain.py",
            "--signal",
            "sine",
            "--block",
            "1",
            "--at-sample",
            "100",
        ]);
        assert!(parsed.is_err());
    }
}
