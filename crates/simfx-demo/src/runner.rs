#![forbid(unsafe_code)]

//! Event loops: the interactive terminal loop and the headless virtual-time run.

use std::time::Duration;

use simfx_core::config::ShowcaseConfig;
use simfx_runtime::clock::{Clock, ManualClock, SystemClock};
use simfx_runtime::subscription::{Every, Subscription, SubscriptionManager};

use crate::app::{App, Msg};
use crate::cli::Opts;
use crate::error::DemoError;
use crate::input::InputSubscription;
use crate::terminal::TerminalSession;

/// Virtual run length when `--headless` is given without `--exit-after-ms`.
pub const HEADLESS_DEFAULT_MS: u64 = 5_000;

const HEADLESS_WIDTH: u16 = 96;
const HEADLESS_HEIGHT: u16 = 40;

/// Step a fresh app through virtual time and return the whole page.
pub fn run_headless(
    config: ShowcaseConfig,
    seed: u64,
    opts: &Opts,
) -> Result<Vec<String>, DemoError> {
    let mut app = App::new(config, seed, HEADLESS_WIDTH, HEADLESS_HEIGHT)?;
    let clock = ManualClock::new();
    let frame = Duration::from_millis(opts.frame_ms);
    let total = Duration::from_millis(if opts.exit_after_ms == 0 {
        HEADLESS_DEFAULT_MS
    } else {
        opts.exit_after_ms
    });

    app.tick(&clock);
    let mut fired = 0;
    while clock.now() < total {
        clock.advance(frame.min(total - clock.now()));
        fired += app.tick(&clock);
    }
    tracing::info!(
        elapsed_ms = total.as_millis() as u64,
        transitions = fired,
        "headless run finished"
    );

    let screen = app.view();
    let (page, _) = app.page();
    let mut out = Vec::with_capacity(page.len() + 1);
    out.push(screen.header);
    out.extend(page);
    Ok(out)
}

/// Drive the app against the real terminal until quit or exit-after.
pub fn run_terminal(config: ShowcaseConfig, seed: u64, opts: &Opts) -> Result<(), DemoError> {
    let (width, height) = crossterm::terminal::size()?;
    let mut app = App::new(config, seed, width, height)?;
    let clock = SystemClock::new();
    let frame = Duration::from_millis(opts.frame_ms);
    let exit_after = (opts.exit_after_ms > 0).then(|| Duration::from_millis(opts.exit_after_ms));

    let mut subs = SubscriptionManager::new();
    let mut active: Vec<Box<dyn Subscription<Msg>>> = Vec::with_capacity(2);
    active.push(Box::new(InputSubscription));
    active.push(Box::new(Every::new(frame, || Msg::Tick)));
    subs.reconcile(active);

    let mut session = TerminalSession::enter()?;
    app.tick(&clock);
    session.draw(&app.view())?;

    loop {
        let Some(first) = subs.recv_timeout(frame) else {
            continue;
        };
        let mut tick = false;
        for msg in std::iter::once(first).chain(subs.drain_messages()) {
            match msg {
                Msg::Tick => tick = true,
                other => app.update(other),
            }
        }
        if tick {
            app.tick(&clock);
        }
        if app.should_quit() || exit_after.is_some_and(|limit| clock.now() >= limit) {
            break;
        }
        session.draw(&app.view())?;
    }

    subs.stop_all();
    drop(session);
    tracing::info!(elapsed_ms = clock.now().as_millis() as u64, "showcase closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_run_prints_every_section() {
        let opts = Opts {
            exit_after_ms: 2_000,
            ..Opts::default()
        };
        let lines = run_headless(ShowcaseConfig::default(), 3, &opts).unwrap();
        assert!(lines[0].contains("simfx"));
        let titles = [
            "Ask anything",
            "Market Intelligence",
            "Parameter Tuning",
            "Risk Analysis",
            "Data Sources",
            "Monte-Carlo Run",
            "How It Works",
        ];
        for title in titles {
            assert!(lines.iter().any(|l| l.contains(title)), "{title} missing");
        }
    }

    #[test]
    fn headless_run_is_deterministic_per_seed() {
        let opts = Opts::default();
        let a = run_headless(ShowcaseConfig::default(), 11, &opts).unwrap();
        let b = run_headless(ShowcaseConfig::default(), 11, &opts).unwrap();
        assert_eq!(a, b);
    }
}
