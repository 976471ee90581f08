use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, error};
use modpack::{Bundler, Config, DedupeStrategy};

#[derive(Parser, Debug)]
#[command(name = "modpack", version, about = "Bundle an ES module graph into one script")]
struct Cli {
    /// Entry module
    entry: PathBuf,

    /// Output file (default: bundle.js)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (default: ./modpack.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How repeated imports of one file are handled
    #[arg(long, value_enum)]
    dedupe: Option<DedupeStrategy>,

    /// Throw on re-entrant require of a module that is still initializing
    #[arg(long)]
    strict_circular_requires: bool,

    /// Print the bundle instead of writing a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let mut config =
        Config::load(cli.config.as_deref(), &cwd).context("Failed to load configuration")?;

    if let Some(dedupe) = cli.dedupe {
        config.dedupe = dedupe;
    }
    if cli.strict_circular_requires {
        config.strict_circular_requires = true;
    }
    if let Some(output) = cli.output {
        config.output = Some(output);
    }

    let entry = if cli.entry.is_absolute() {
        cli.entry
    } else {
        cwd.join(&cli.entry)
    };
    let bundler = Bundler::new(config);

    if cli.stdout {
        let text = bundler
            .bundle(&entry)
            .with_context(|| format!("Failed to bundle {}", entry.display()))?;
        io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .context("Failed to write bundle to stdout")?;
        return Ok(());
    }

    let output = bundler.config().output_path(&cwd);
    bundler
        .bundle_to_file(&entry, &output)
        .with_context(|| format!("Failed to bundle {}", entry.display()))?;
    Ok(())
}
