#![forbid(unsafe_code)]

//! Command-line argument parsing for the showcase.
//!
//! Parses args by hand. Environment variables with the `SIMFX_DEMO_*` prefix
//! override defaults; explicit flags override both.

use std::env;
use std::path::PathBuf;

use simfx_core::theme::Theme;
use thiserror::Error;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
simfx showcase: animated landing-page dashboards in the terminal

USAGE:
    simfx-demo [OPTIONS]

OPTIONS:
    --config=PATH        Load a JSON showcase config
    --log=PATH           Write tracing output to PATH
    --theme=NAME         business (default), analyst, developer or research
    --seed=N             Seed for the random source (default: from the OS)
    --frame-ms=N         Redraw interval in milliseconds (default: 50)
    --exit-after-ms=N    Quit after N milliseconds (0 = never)
    --headless           Run in virtual time and print the final page
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS:
    Up / Down, j / k     Scroll one line
    PgUp / PgDn, Space   Scroll one page
    Home                 Back to the top
    Tab                  Next theme
    s                    Start / pause the Monte-Carlo run
    m                    Toggle market intelligence
    r                    Tear down and remount every section
    q / Esc / Ctrl+C     Quit

ENVIRONMENT VARIABLES:
    SIMFX_DEMO_CONFIG         Override --config
    SIMFX_DEMO_LOG            Override --log
    SIMFX_DEMO_THEME          Override --theme
    SIMFX_DEMO_SEED           Override --seed
    SIMFX_DEMO_EXIT_AFTER_MS  Override --exit-after-ms
    RUST_LOG                  Log filter (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    pub config: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub theme: Option<Theme>,
    pub seed: Option<u64>,
    pub frame_ms: u64,
    /// 0 disables auto-exit.
    pub exit_after_ms: u64,
    pub headless: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            config: None,
            log: None,
            theme: None,
            seed: None,
            frame_ms: 50,
            exit_after_ms: 0,
            headless: false,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("invalid {flag} value: {value}")]
    Invalid { flag: &'static str, value: String },
    #[error("unknown argument: {0}\nRun with --help for usage information.")]
    Unknown(String),
}

impl Opts {
    /// Parse the process arguments and environment.
    pub fn parse() -> Result<Command, CliError> {
        Self::parse_from(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parse `args` (without the program name), looking variables up with `var`.
    pub fn parse_from<I, S, F>(args: I, var: F) -> Result<Command, CliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        if let Some(val) = var("SIMFX_DEMO_CONFIG") {
            opts.config = Some(PathBuf::from(val));
        }
        if let Some(val) = var("SIMFX_DEMO_LOG") {
            opts.log = Some(PathBuf::from(val));
        }
        if let Some(val) = var("SIMFX_DEMO_THEME")
            && let Some(theme) = Theme::from_name(&val)
        {
            opts.theme = Some(theme);
        }
        if let Some(val) = var("SIMFX_DEMO_SEED")
            && let Ok(n) = val.parse()
        {
            opts.seed = Some(n);
        }
        if let Some(val) = var("SIMFX_DEMO_EXIT_AFTER_MS")
            && let Ok(n) = val.parse()
        {
            opts.exit_after_ms = n;
        }

        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                "--headless" => opts.headless = true,
                other => {
                    if let Some(val) = other.strip_prefix("--config=") {
                        opts.config = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--log=") {
                        opts.log = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--theme=") {
                        let theme = Theme::from_name(val).ok_or_else(|| invalid("--theme", val))?;
                        opts.theme = Some(theme);
                    } else if let Some(val) = other.strip_prefix("--seed=") {
                        opts.seed = Some(val.parse().map_err(|_| invalid("--seed", val))?);
                    } else if let Some(val) = other.strip_prefix("--frame-ms=") {
                        match val.parse() {
                            Ok(n) if n > 0 => opts.frame_ms = n,
                            _ => return Err(invalid("--frame-ms", val)),
                        }
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        opts.exit_after_ms =
                            val.parse().map_err(|_| invalid("--exit-after-ms", val))?;
                    } else {
                        return Err(CliError::Unknown(other.to_string()));
                    }
                }
            }
        }

        Ok(Command::Run(opts))
    }
}

fn invalid(flag: &'static str, value: &str) -> CliError {
    CliError::Invalid {
        flag,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> Result<Command, CliError> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Opts::parse_from(args.iter().copied(), |key| env.get(key).cloned())
    }

    fn run(args: &[&str], env: &[(&str, &str)]) -> Opts {
        match parse(args, env) {
            Ok(Command::Run(opts)) => opts,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn default_opts() {
        let opts = run(&[], &[]);
        assert_eq!(opts, Opts::default());
        assert_eq!(opts.frame_ms, 50);
        assert!(!opts.headless);
    }

    #[test]
    fn env_overrides_defaults() {
        let opts = run(
            &[],
            &[
                ("SIMFX_DEMO_THEME", "analyst"),
                ("SIMFX_DEMO_SEED", "42"),
                ("SIMFX_DEMO_CONFIG", "/tmp/page.json"),
            ],
        );
        assert_eq!(opts.theme, Some(Theme::Analyst));
        assert_eq!(opts.seed, Some(42));
        assert_eq!(opts.config, Some(PathBuf::from("/tmp/page.json")));
    }

    #[test]
    fn flags_override_env() {
        let opts = run(
            &["--theme=research", "--exit-after-ms=500"],
            &[
                ("SIMFX_DEMO_THEME", "analyst"),
                ("SIMFX_DEMO_EXIT_AFTER_MS", "9000"),
            ],
        );
        assert_eq!(opts.theme, Some(Theme::Research));
        assert_eq!(opts.exit_after_ms, 500);
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let opts = run(&[], &[("SIMFX_DEMO_SEED", "many")]);
        assert_eq!(opts.seed, None);
    }

    #[test]
    fn bad_flag_values_are_errors() {
        assert_eq!(
            parse(&["--seed=x"], &[]),
            Err(CliError::Invalid {
                flag: "--seed",
                value: "x".into()
            })
        );
        assert!(parse(&["--frame-ms=0"], &[]).is_err());
        assert!(parse(&["--theme=marketing"], &[]).is_err());
        assert_eq!(
            parse(&["--bogus"], &[]),
            Err(CliError::Unknown("--bogus".into()))
        );
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse(&["--headless", "-h"], &[]), Ok(Command::Help));
        assert_eq!(parse(&["-V", "--bogus"], &[]), Ok(Command::Version));
    }

    #[test]
    fn help_text_lists_env_vars() {
        assert!(HELP_TEXT.contains("SIMFX_DEMO_CONFIG"));
        assert!(HELP_TEXT.contains("SIMFX_DEMO_EXIT_AFTER_MS"));
        assert!(!VERSION.is_empty());
    }
}
