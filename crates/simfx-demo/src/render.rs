#![forbid(unsafe_code)]

//! Plain-text renderers for controller snapshots.
//!
//! Every function here is pure: snapshot in, lines out. Width is counted in
//! `char`s; all glyphs used are single-cell.

use simfx_core::carousel::{CarouselPhase, CarouselView};
use simfx_core::controller::Snapshot;
use simfx_core::loader::{ItemStatus, LoaderView, SourceKind};
use simfx_core::metrics::{Direction, Trend};
use simfx_core::monte_carlo::{LogLevel, MonteCarloView};
use simfx_core::progress::DriftSnapshot;
use simfx_core::risk_matrix::RiskMatrixView;
use simfx_core::scroll_steps::ScrollStep;
use simfx_core::sequence::{SequenceView, StepStatus};
use simfx_core::toggle::{ToggleState, ToggleView};
use simfx_core::tuning::{ParamStatus, TuningView};
use simfx_core::typing::TypingState;

const SPARK_CHARS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

const SCATTER_COLS: usize = 32;
const SCATTER_ROWS: usize = 6;

/// Horizontal bar, `width` cells wide.
#[must_use]
pub fn progress_bar(percent: f64, width: usize) -> String {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat_n('█', filled));
    bar.extend(std::iter::repeat_n('░', width - filled));
    bar
}

/// One glyph per point, scaled between the series' own min and max.
#[must_use]
pub fn sparkline(points: &[f64]) -> String {
    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let range = max - min;
    points
        .iter()
        .map(|v| {
            if !(range > 0.0) {
                return SPARK_CHARS[4];
            }
            let idx = (((v - min) / range) * 7.0).round() as usize + 1;
            SPARK_CHARS[idx.min(8)]
        })
        .collect()
}

#[must_use]
pub fn trend_arrow(trend: Trend) -> char {
    match trend.direction {
        Direction::Up => '▲',
        Direction::Down => '▼',
        Direction::None => '·',
    }
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Cut a line to `width` chars.
#[must_use]
pub fn fit(line: &str, width: usize) -> String {
    line.chars().take(width).collect()
}

pub fn typing(state: &TypingState) -> Vec<String> {
    vec![format!("  ⌕ {}▌", state.text())]
}

/// One row per stage title, then the progress bar of the current stage.
///
/// Without titles only the current stage number is shown.
pub fn steps(step: &ScrollStep, titles: &[String], width: usize) -> Vec<String> {
    let bar_width = width.saturating_sub(14).min(40);
    if titles.is_empty() {
        return vec![
            format!("  ▸ Step {}", step.step_index + 1),
            format!(
                "    {} {:>3.0}%",
                progress_bar(step.fractional_progress * 100.0, bar_width),
                step.fractional_progress * 100.0
            ),
        ];
    }
    let mut lines: Vec<String> = titles
        .iter()
        .enumerate()
        .map(|(idx, title)| {
            let marker = match (idx as u32).cmp(&step.step_index) {
                std::cmp::Ordering::Less => '✓',
                std::cmp::Ordering::Equal => '▸',
                std::cmp::Ordering::Greater => ' ',
            };
            format!("  {marker} {}. {title}", idx + 1)
        })
        .collect();
    lines.push(format!(
        "    {} {:>3.0}%",
        progress_bar(step.fractional_progress * 100.0, bar_width),
        step.fractional_progress * 100.0
    ));
    lines
}

pub fn drift(snap: &DriftSnapshot, width: usize) -> Vec<String> {
    let bar_width = width.saturating_sub(24).min(48);
    let status = if snap.progress.is_stuck() {
        "waiting"
    } else {
        "running"
    };
    let mut lines = vec![
        format!(
            "  Run {:<5} {} {:>5.1}%  ETA {}",
            snap.runs + 1,
            progress_bar(snap.progress.percent, bar_width),
            snap.progress.percent,
            snap.eta_label()
        ),
        format!(
            "  Total Runs {} {}   ({status}, tick {} ms)",
            snap.primary,
            trend_arrow(snap.primary_trend),
            snap.tick_interval.as_millis()
        ),
    ];
    for pair in snap.metrics.chunks(2) {
        let cells: Vec<String> = pair
            .iter()
            .map(|m| {
                format!(
                    "{:<22} {:>7} {}",
                    m.name,
                    number(m.stat.value),
                    trend_arrow(m.stat.trend)
                )
            })
            .collect();
        lines.push(format!("  {}", cells.join("   ")));
    }
    for series in &snap.series {
        let last = series.points.last().copied().unwrap_or_default();
        lines.push(format!(
            "  {:<18} {} {:>5.1}",
            series.name,
            sparkline(&series.points),
            last
        ));
    }
    lines
}

pub fn sequence(view: &SequenceView, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = view
        .steps
        .iter()
        .map(|(text, status)| {
            let marker = match status {
                StepStatus::Completed => '✓',
                StepStatus::Active => '▸',
                StepStatus::Upcoming => '·',
            };
            let suffix = if *status == StepStatus::Active { "…" } else { "" };
            format!("  {marker} {text}{suffix}")
        })
        .collect();
    let bar_width = width.saturating_sub(12).min(40);
    lines.push(format!(
        "    {} {:>3}%",
        progress_bar(f64::from(view.completion), bar_width),
        view.completion
    ));
    lines
}

pub fn loader(view: &LoaderView) -> Vec<String> {
    let mut lines: Vec<String> = view
        .items
        .iter()
        .map(|(item, status)| {
            let icon = match item.kind {
                SourceKind::Spreadsheet => '▦',
                SourceKind::Pdf => '▤',
                SourceKind::Database => '◫',
            };
            let state = match status {
                ItemStatus::Loaded => "✓ loaded",
                ItemStatus::Processing => "… processing",
                ItemStatus::Pending => "",
            };
            format!("  {icon} {:<28} {state}", item.name)
        })
        .collect();
    lines.push(format!("  {}/{} sources ready", view.loaded, view.items.len()));
    lines
}

pub fn carousel(view: &CarouselView) -> Vec<String> {
    let cells: Vec<String> = view
        .window
        .iter()
        .map(|(offset, item)| {
            if *offset == 0 {
                let mark = match view.phase {
                    CarouselPhase::Processing => '⟳',
                    CarouselPhase::Completed => '✓',
                };
                format!("[{item} {mark}]")
            } else {
                item.clone()
            }
        })
        .collect();
    vec![format!("  {}", cells.join("  ·  "))]
}

pub fn tuning(view: &TuningView, width: usize) -> Vec<String> {
    let bar_width = width.saturating_sub(44).min(24);
    view.params
        .iter()
        .map(|p| {
            let state = match p.status {
                ParamStatus::Waiting => "",
                ParamStatus::Optimizing => "⟳ optimizing",
                ParamStatus::Optimized => "✓ optimized",
            };
            let value = if p.value < 1.0 {
                format!("{:.3}", p.value)
            } else {
                number(p.value)
            };
            format!(
                "  {:<14} {} {:>6}  {state}",
                p.name,
                progress_bar(p.position * 100.0, bar_width),
                value
            )
        })
        .collect()
}

pub fn risk_matrix(view: &RiskMatrixView) -> Vec<String> {
    if !view.started {
        return vec!["  (scroll here to start the analysis)".into()];
    }
    let mut grid = vec![vec!['·'; SCATTER_COLS]; SCATTER_ROWS];
    for (idx, p) in view.points.iter().enumerate() {
        if !p.analyzed {
            continue;
        }
        let col = ((p.impact / 100.0) * SCATTER_COLS as f64) as usize;
        let row = ((p.probability / 100.0) * SCATTER_ROWS as f64) as usize;
        let row = SCATTER_ROWS - 1 - row.min(SCATTER_ROWS - 1);
        let glyph = if view.highlighted == Some(idx) {
            '◉'
        } else if p.risk >= 0.66 {
            '●'
        } else if p.risk >= 0.33 {
            '◐'
        } else {
            '○'
        };
        grid[row][col.min(SCATTER_COLS - 1)] = glyph;
    }
    let mut lines: Vec<String> = grid
        .into_iter()
        .map(|row| format!("  │{}", String::from_iter(row)))
        .collect();
    let focus = view
        .highlighted
        .and_then(|idx| view.points.get(idx))
        .map(|p| format!("  ▸ {} risk", p.category))
        .unwrap_or_default();
    lines.push(format!("  {} risks analyzed{focus}", view.analyzed));
    lines
}

pub fn toggle(view: &ToggleView) -> Vec<String> {
    let (switch, state) = match view.state {
        ToggleState::Off => ("[ ○    ]", "off (press m)"),
        ToggleState::Processing => ("[  ⟳   ]", "processing…"),
        ToggleState::On => ("[    ● ]", "on"),
    };
    vec![format!("  {} {switch} {state}", view.label)]
}

pub fn monte_carlo(view: &MonteCarloView, width: usize) -> Vec<String> {
    let state = if view.running {
        "running"
    } else if view.progress >= 100.0 {
        "complete"
    } else if view.iteration == 0 {
        "idle (press s to start)"
    } else {
        "paused"
    };
    let bar_width = width.saturating_sub(30).min(40);
    let mut lines = vec![format!(
        "  {} {:>5.1}%  iteration {}  {state}",
        progress_bar(view.progress, bar_width),
        view.progress,
        view.iteration
    )];

    let mut grid = vec![vec!['·'; SCATTER_COLS]; SCATTER_ROWS];
    for p in &view.points {
        let col = ((p.x / 100.0) * SCATTER_COLS as f64) as usize;
        let row = ((p.y / 100.0) * SCATTER_ROWS as f64) as usize;
        let row = SCATTER_ROWS - 1 - row.min(SCATTER_ROWS - 1);
        grid[row][col.min(SCATTER_COLS - 1)] = '•';
    }
    lines.extend(grid.into_iter().map(|row| format!("  │{}", String::from_iter(row))));

    for entry in &view.log {
        let tag = match entry.level {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Success => " OK ",
        };
        lines.push(format!("  [{tag}] {}", entry.message));
    }
    lines
}

/// Render any snapshot.
pub fn snapshot(snap: &Snapshot, width: usize) -> Vec<String> {
    let lines = match snap {
        Snapshot::Typing(state) => typing(state),
        Snapshot::Steps(step) => steps(step, &[], width),
        Snapshot::Drift(d) => drift(d, width),
        Snapshot::Sequence(view) => sequence(view, width),
        Snapshot::Loader(view) => loader(view),
        Snapshot::Carousel(view) => carousel(view),
        Snapshot::MonteCarlo(view) => monte_carlo(view, width),
        Snapshot::Tuning(view) => tuning(view, width),
        Snapshot::RiskMatrix(view) => risk_matrix(view),
        Snapshot::Toggle(view) => toggle(view),
    };
    lines.into_iter().map(|l| fit(&l, width)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use simfx_core::monte_carlo::{LogLine, ScatterPoint};
    use simfx_core::risk_matrix::{RiskPhase, RiskPoint};
    use simfx_core::scroll_steps::StepConfig;
    use simfx_core::tuning::{ParamView, TuningPhase};

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(50.0, 4), "██░░");
        assert_eq!(progress_bar(100.0, 4), "████");
        assert_eq!(progress_bar(250.0, 4), "████");
        assert_eq!(progress_bar(50.0, 0), "");
    }

    #[test]
    fn sparkline_scales_to_range() {
        assert_eq!(sparkline(&[0.0, 5.0, 10.0]), "▁▅█");
        assert_eq!(sparkline(&[3.0, 3.0]), "▄▄");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn trend_arrows() {
        let up = Trend {
            delta: 1.0,
            direction: Direction::Up,
        };
        assert_eq!(trend_arrow(up), '▲');
        assert_eq!(trend_arrow(Trend::default()), '·');
    }

    #[test]
    fn numbers_drop_zero_fraction() {
        assert_eq!(number(847.0), "847");
        assert_eq!(number(92.1), "92.1");
    }

    #[test]
    fn steps_mark_current_stage() {
        let titles = StepConfig::default().titles;
        let lines = steps(
            &ScrollStep {
                step_index: 2,
                fractional_progress: 0.5,
            },
            &titles,
            60,
        );
        assert_eq!(lines.len(), titles.len() + 1);
        assert!(lines[1].starts_with("  ✓"));
        assert!(lines[2].starts_with("  ▸ 3. Retrieve"));
        assert!(lines[3].starts_with("    4."));
        assert!(lines[7].ends_with(" 50%"));
    }

    #[test]
    fn steps_follow_configured_titles() {
        let titles: Vec<String> = ["Plan", "Run"].map(String::from).to_vec();
        let step = ScrollStep {
            step_index: 1,
            fractional_progress: 0.0,
        };
        let lines = steps(&step, &titles, 60);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "  ▸ 2. Run");

        let bare = steps(&step, &[], 60);
        assert_eq!(bare[0], "  ▸ Step 2");
    }

    #[test]
    fn tuning_shows_status_per_parameter() {
        let view = TuningView {
            phase: TuningPhase::Optimizing { index: 1 },
            params: vec![
                ParamView {
                    name: "Learning Rate".into(),
                    value: 0.005,
                    position: 0.04,
                    status: ParamStatus::Optimized,
                },
                ParamView {
                    name: "Batch Size".into(),
                    value: 64.0,
                    position: 0.2,
                    status: ParamStatus::Optimizing,
                },
            ],
            cycle: 0,
        };
        let lines = tuning(&view, 80);
        assert!(lines[0].contains("0.005"));
        assert!(lines[0].ends_with("✓ optimized"));
        assert!(lines[1].contains("    64"));
        assert!(lines[1].ends_with("⟳ optimizing"));
    }

    #[test]
    fn risk_matrix_plots_only_analyzed_points() {
        let point = |impact, analyzed| RiskPoint {
            impact,
            probability: 0.0,
            risk: 0.9,
            category: "Market".into(),
            analyzed,
        };
        let view = RiskMatrixView {
            phase: RiskPhase::Analyzing { next: 1 },
            points: vec![point(0.0, true), point(99.0, false)],
            highlighted: Some(0),
            analyzed: 1,
            started: true,
        };
        let lines = risk_matrix(&view);
        assert_eq!(lines.len(), SCATTER_ROWS + 1);
        assert!(lines[SCATTER_ROWS - 1].starts_with("  │◉"));
        assert!(lines[SCATTER_ROWS - 1].ends_with('·'));
        assert_eq!(lines[SCATTER_ROWS], "  1 risks analyzed  ▸ Market risk");
    }

    #[test]
    fn toggle_labels_each_state() {
        let view = |state| ToggleView {
            label: "Market Intelligence".into(),
            state,
        };
        assert!(toggle(&view(ToggleState::Off))[0].ends_with("off (press m)"));
        assert!(toggle(&view(ToggleState::Processing))[0].contains('⟳'));
        assert!(toggle(&view(ToggleState::On))[0].ends_with(" on"));
    }

    #[test]
    fn monte_carlo_plots_points_and_log() {
        let view = MonteCarloView {
            running: true,
            progress: 10.0,
            iteration: 3,
            points: vec![ScatterPoint { x: 0.0, y: 0.0 }, ScatterPoint { x: 99.9, y: 99.9 }],
            log: vec![LogLine {
                level: LogLevel::Warning,
                message: "High variance in results".into(),
            }],
        };
        let lines = monte_carlo(&view, 80);
        assert_eq!(lines.len(), 1 + SCATTER_ROWS + 1);
        assert!(lines[1].ends_with('•'));
        assert!(lines[SCATTER_ROWS].starts_with("  │•"));
        assert_eq!(lines.last().unwrap(), "  [WARN] High variance in results");
    }

    #[test]
    fn snapshot_lines_fit_width() {
        let lines = snapshot(
            &Snapshot::Steps(ScrollStep::default()),
            12,
        );
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
    }
}
