#![forbid(unsafe_code)]

//! The showcase model: a long virtual page of animated sections.
//!
//! The page is laid out top to bottom from the current snapshots. Scrolling
//! moves a viewport over it; after every scroll, resize or tick the viewport
//! geometry is fed back to the sections that react to it: the step explainer
//! gets the scroll position and the visibility-triggered sections get the
//! fraction of their block on screen.
//!
//! # Invariants
//!
//! 1. `scroll` never exceeds the last page row that can fill the viewport.
//! 2. Every section is reached only through the token it was mounted with;
//!    a reset drops all tokens before remounting.

use simfx_core::carousel::Carousel;
use simfx_core::config::ShowcaseConfig;
use simfx_core::controller::{Controller, Input, Snapshot};
use simfx_core::error::ConfigError;
use simfx_core::loader::SequentialLoader;
use simfx_core::monte_carlo::MonteCarloRun;
use simfx_core::progress::DriftEngine;
use simfx_core::random::SeededRandom;
use simfx_core::risk_matrix::RiskMatrix;
use simfx_core::scroll_steps::{ScrollInput, StepSequencer};
use simfx_core::sequence::ScriptedSequence;
use simfx_core::theme::Theme;
use simfx_core::toggle::ProcessingToggle;
use simfx_core::tuning::ParameterTuner;
use simfx_core::typing::TypingAnimator;
use simfx_runtime::clock::Clock;
use simfx_runtime::stage::{SectionToken, Stage};

use crate::render;

/// Sections of the page, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Hero,
    Intel,
    Dashboard,
    Walkthrough,
    Tuning,
    Risk,
    Forecast,
    Loader,
    Integrations,
    Market,
    MonteCarlo,
    Steps,
}

impl SectionId {
    pub const ALL: [SectionId; 12] = [
        SectionId::Hero,
        SectionId::Intel,
        SectionId::Dashboard,
        SectionId::Walkthrough,
        SectionId::Tuning,
        SectionId::Risk,
        SectionId::Forecast,
        SectionId::Loader,
        SectionId::Integrations,
        SectionId::Market,
        SectionId::MonteCarlo,
        SectionId::Steps,
    ];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Hero => "Ask anything",
            Self::Intel => "Market Intelligence",
            Self::Dashboard => "Live Simulation Dashboard",
            Self::Walkthrough => "Analyzing Your Query",
            Self::Tuning => "Parameter Tuning",
            Self::Risk => "Risk Analysis",
            Self::Forecast => "Forecast Search",
            Self::Loader => "Data Sources",
            Self::Integrations => "Data Integration",
            Self::Market => "Market Vision",
            Self::MonteCarlo => "Monte-Carlo Run",
            Self::Steps => "How It Works",
        }
    }
}

/// User intent decoded from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Top,
    NextTheme,
    ToggleRun,
    ToggleIntel,
    Reset,
    Quit,
}

/// Messages delivered to the loop by subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    Tick,
    Action(Action),
    Resize { width: u16, height: u16 },
}

/// Where a section sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub id: SectionId,
    pub start: usize,
    pub height: usize,
}

/// What the terminal should show.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub header: String,
    pub body: Vec<String>,
    pub accent: (u8, u8, u8),
}

pub struct App {
    config: ShowcaseConfig,
    theme: Theme,
    stage: Stage,
    /// Draws made while constructing controllers (series seeds, first interval).
    seed_rng: SeededRandom,
    sections: Vec<(SectionId, SectionToken)>,
    width: u16,
    height: u16,
    scroll: usize,
    quit: bool,
    resets: u32,
}

impl App {
    /// Validate `config` and mount every section.
    pub fn new(
        config: ShowcaseConfig,
        seed: u64,
        width: u16,
        height: u16,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut app = Self {
            theme: config.theme,
            config,
            stage: Stage::new(SeededRandom::from_seed(seed)),
            seed_rng: SeededRandom::from_seed(seed.wrapping_add(1)),
            sections: Vec::new(),
            width,
            height,
            scroll: 0,
            quit: false,
            resets: 0,
        };
        app.mount_all()?;
        app.feed_geometry();
        tracing::info!(seed, width, height, theme = app.theme.label(), "showcase mounted");
        Ok(app)
    }

    fn build(&mut self, id: SectionId) -> Result<Box<dyn Controller>, ConfigError> {
        let cfg = &self.config;
        let controller: Box<dyn Controller> = match id {
            SectionId::Hero => Box::new(TypingAnimator::new(cfg.typing.clone())?),
            SectionId::Forecast => Box::new(TypingAnimator::new(cfg.forecast.clone())?),
            SectionId::Intel => Box::new(ProcessingToggle::new(cfg.intel.clone())?),
            SectionId::Steps => Box::new(StepSequencer::new(cfg.steps.clone())?),
            SectionId::Dashboard => Box::new(DriftEngine::new(
                cfg.progress.clone(),
                cfg.metrics.clone(),
                &cfg.series,
                &mut self.seed_rng,
            )?),
            SectionId::Walkthrough => Box::new(ScriptedSequence::new(cfg.sequence.clone())?),
            SectionId::Tuning => Box::new(ParameterTuner::new(cfg.tuning.clone())?),
            SectionId::Risk => Box::new(RiskMatrix::new(cfg.risk_matrix.clone())?),
            SectionId::Loader => Box::new(SequentialLoader::new(cfg.loader.clone())?),
            SectionId::Integrations => Box::new(Carousel::new(cfg.carousel.clone())?),
            SectionId::Market => Box::new(Carousel::new(cfg.market.clone())?),
            SectionId::MonteCarlo => Box::new(MonteCarloRun::new(cfg.monte_carlo.clone())?),
        };
        Ok(controller)
    }

    fn mount_all(&mut self) -> Result<(), ConfigError> {
        for id in SectionId::ALL {
            let controller = self.build(id)?;
            let token = self.stage.mount_boxed(id.title(), controller);
            self.sections.push((id, token));
        }
        Ok(())
    }

    /// Tear everything down and mount fresh sections.
    fn reset(&mut self) {
        self.stage.clear();
        self.sections.clear();
        self.resets += 1;
        if let Err(err) = self.mount_all() {
            tracing::error!(%err, "remount failed");
            return;
        }
        tracing::info!(resets = self.resets, "sections remounted");
    }

    /// Apply a message that does not need the clock.
    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Tick => {}
            Msg::Resize { width, height } => {
                self.width = width;
                self.height = height;
            }
            Msg::Action(action) => self.apply(action),
        }
        self.clamp_scroll();
        self.feed_geometry();
    }

    fn apply(&mut self, action: Action) {
        let page = self.viewport().max(1);
        match action {
            Action::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            Action::ScrollDown => self.scroll += 1,
            Action::PageUp => self.scroll = self.scroll.saturating_sub(page),
            Action::PageDown => self.scroll += page,
            Action::Top => self.scroll = 0,
            Action::NextTheme => {
                self.theme = self.theme.next();
                tracing::debug!(theme = self.theme.label(), "theme switched");
            }
            Action::ToggleRun => self.send(SectionId::MonteCarlo, &Input::Start),
            Action::ToggleIntel => self.send(SectionId::Intel, &Input::Start),
            Action::Reset => self.reset(),
            Action::Quit => self.quit = true,
        }
    }

    /// Advance every section to the clock's current time.
    pub fn tick(&mut self, clock: &dyn Clock) -> u64 {
        let fired = self.stage.sync(clock);
        self.clamp_scroll();
        self.feed_geometry();
        fired
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    #[must_use]
    pub fn token(&self, id: SectionId) -> Option<SectionToken> {
        self.sections
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, token)| *token)
    }

    #[must_use]
    pub fn snapshot(&self, id: SectionId) -> Option<Snapshot> {
        self.token(id).and_then(|t| self.stage.snapshot(t).ok())
    }

    fn send(&mut self, id: SectionId, input: &Input) {
        let Some(token) = self.token(id) else {
            return;
        };
        if let Err(err) = self.stage.handle(token, input) {
            tracing::warn!(%err, section = id.title(), "input dropped");
        }
    }

    /// Rows available to the page (one row is the header).
    fn viewport(&self) -> usize {
        usize::from(self.height.saturating_sub(1))
    }

    fn steps_span(&self) -> usize {
        let steps = &self.config.steps;
        let span = f64::from(steps.step_count + 1) * steps.step_height * self.viewport() as f64;
        span.ceil() as usize
    }

    fn section_lines(&self, id: SectionId, width: usize) -> Vec<String> {
        let mut lines = vec![render::fit(&format!("── {} ──", id.title()), width)];
        if id == SectionId::Hero {
            lines.push(render::fit(&format!("  {}", self.theme.headline()), width));
        }
        match self.snapshot(id) {
            Some(Snapshot::Steps(step)) => {
                let titles = &self.config.steps.titles;
                lines.extend(
                    render::steps(&step, titles, width)
                        .into_iter()
                        .map(|l| render::fit(&l, width)),
                );
            }
            Some(snap) => lines.extend(render::snapshot(&snap, width)),
            None => {}
        }
        if id == SectionId::Steps {
            let span = self.steps_span();
            if lines.len() < span {
                lines.resize(span, String::new());
            }
        }
        lines.push(String::new());
        lines
    }

    /// The whole page plus where each section landed.
    #[must_use]
    pub fn page(&self) -> (Vec<String>, Vec<Block>) {
        let width = usize::from(self.width.max(1));
        let mut lines = Vec::new();
        let mut blocks = Vec::with_capacity(self.sections.len());
        for (id, _) in &self.sections {
            let section = self.section_lines(*id, width);
            blocks.push(Block {
                id: *id,
                start: lines.len(),
                height: section.len(),
            });
            lines.extend(section);
        }
        (lines, blocks)
    }

    fn clamp_scroll(&mut self) {
        let (lines, _) = self.page();
        let max = lines.len().saturating_sub(self.viewport());
        self.scroll = self.scroll.min(max);
    }

    /// Tell the geometry-driven sections where the viewport is.
    fn feed_geometry(&mut self) {
        let (_, blocks) = self.page();
        let viewport = self.viewport();
        let top = self.scroll;
        let bottom = top + viewport;
        for block in blocks {
            match block.id {
                SectionId::Steps => {
                    let input = Input::Scroll(ScrollInput {
                        scroll_offset: top as f64,
                        section_start: block.start as f64,
                        viewport_height: viewport as f64,
                    });
                    self.send(SectionId::Steps, &input);
                }
                SectionId::Walkthrough | SectionId::Risk => {
                    let end = block.start + block.height;
                    let overlap = bottom.min(end).saturating_sub(top.max(block.start));
                    let ratio = if block.height == 0 {
                        0.0
                    } else {
                        overlap as f64 / block.height as f64
                    };
                    self.send(block.id, &Input::Visibility(ratio));
                }
                _ => {}
            }
        }
    }

    /// Header plus the visible slice of the page.
    #[must_use]
    pub fn view(&self) -> Screen {
        let width = usize::from(self.width.max(1));
        let step = match self.snapshot(SectionId::Steps) {
            Some(Snapshot::Steps(step)) => step.step_index + 1,
            _ => 1,
        };
        let header = format!(
            " simfx · {} · step {}/{} · Tab theme · s run · m intel · r reset · q quit",
            self.theme.label(),
            step,
            self.config.steps.step_count + 1
        );
        let (lines, _) = self.page();
        let viewport = self.viewport();
        let mut body: Vec<String> = lines.into_iter().skip(self.scroll).take(viewport).collect();
        body.resize(viewport, String::new());
        Screen {
            header: render::fit(&header, width),
            body,
            accent: self.theme.accent_rgb(),
        }
    }
}
