#![forbid(unsafe_code)]

//! simfx showcase binary entry point.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use simfx_core::random::SeededRandom;
use simfx_demo::cli::{self, Command, Opts};
use simfx_demo::error::DemoError;
use simfx_demo::{config_file, runner};
use tracing_subscriber::EnvFilter;

fn main() {
    let opts = match Opts::parse() {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            println!("{}", cli::HELP_TEXT);
            return;
        }
        Ok(Command::Version) => {
            println!("simfx-demo {}", cli::VERSION);
            return;
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&opts) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(opts: &Opts) -> Result<(), DemoError> {
    init_logging(opts.log.as_deref(), opts.headless)?;

    let mut config = config_file::load(opts.config.as_deref())?;
    if let Some(theme) = opts.theme {
        config.theme = theme;
    }
    let seed = opts.seed.unwrap_or_else(|| SeededRandom::from_entropy().seed());
    tracing::info!(seed, headless = opts.headless, "starting showcase");

    if opts.headless {
        for line in runner::run_headless(config, seed, opts)? {
            println!("{line}");
        }
        Ok(())
    } else {
        runner::run_terminal(config, seed, opts)
    }
}

/// Log to `path` when given. Headless runs fall back to stderr; the
/// interactive UI owns the terminal, so it logs nowhere without a file.
fn init_logging(path: Option<&Path>, headless: bool) -> Result<(), DemoError> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = path {
        let file = File::create(path).map_err(|source| DemoError::LogFile {
            path: path.to_path_buf(),
            source,
        })?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else if headless {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init();
    }
    Ok(())
}
