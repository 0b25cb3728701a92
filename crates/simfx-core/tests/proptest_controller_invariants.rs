//! Property-based invariant tests for the animation controllers.
//!
//! 1. Progress percent stays within [0, 100] for any seed and tick count.
//! 2. Drifted metrics never leave their configured bounds.
//! 3. Step index is monotonic in scroll offset and bounded by N.
//! 4. Series windows keep their length through any number of updates.
//! 5. Typed text is always a prefix of the current source.
//! 6. One large advance fires the same transitions as many small ones.
//! 7. Monte-Carlo progress never exceeds 100 and its log never exceeds 5 lines.
//! 8. Carousel index stays below the item count.

use std::time::Duration;

use proptest::prelude::*;
use simfx_core::carousel::{Carousel, CarouselConfig};
use simfx_core::controller::{Controller, Input, Timed};
use simfx_core::metrics::{MetricDrift, MetricsConfig};
use simfx_core::monte_carlo::{MonteCarloConfig, MonteCarloRun};
use simfx_core::progress::{DriftEngine, ProgressConfig};
use simfx_core::random::SeededRandom;
use simfx_core::scroll_steps::{ScrollInput, ScrollStep, StepConfig};
use simfx_core::series::{SeriesConfig, SeriesDrift};
use simfx_core::typing::{TypingAnimator, TypingConfig};

// ── Helpers ─────────────────────────────────────────────────────────────

fn source_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zé日 ]{1,12}").expect("valid regex")
}

fn typing_config(sources: Vec<String>) -> TypingConfig {
    TypingConfig {
        sources,
        type_delay: Duration::from_millis(10),
        delete_delay: Duration::from_millis(7),
        pause: Duration::from_millis(30),
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Progress percent bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn progress_percent_bounded(seed in any::<u64>(), ticks in 0usize..2_000) {
        let mut rng = SeededRandom::from_seed(seed);
        let mut engine = DriftEngine::new(
            ProgressConfig::default(),
            MetricsConfig::default(),
            &SeriesConfig::default(),
            &mut rng,
        )
        .unwrap();
        for _ in 0..ticks {
            engine.tick(&mut rng);
            let p = engine.run().percent;
            prop_assert!((0.0..=100.0).contains(&p), "percent out of range: {}", p);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Metric bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn metrics_stay_within_bounds(seed in any::<u64>(), updates in 0usize..3_000) {
        let mut rng = SeededRandom::from_seed(seed);
        let mut metrics = MetricDrift::new(MetricsConfig::default()).unwrap();
        let start = metrics.primary();
        for _ in 0..updates {
            metrics.update(&mut rng);
        }
        prop_assert!(metrics.within_bounds());
        prop_assert_eq!(metrics.primary(), start + updates as u64);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Step index monotonic in scroll offset
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn step_index_monotonic(
        a in -5_000.0f64..20_000.0,
        b in -5_000.0f64..20_000.0,
        section_start in 0.0f64..5_000.0,
        viewport in 0.0f64..2_000.0,
    ) {
        let config = StepConfig::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let at = |offset| {
            ScrollStep::compute(
                &ScrollInput {
                    scroll_offset: offset,
                    section_start,
                    viewport_height: viewport,
                },
                &config,
            )
        };
        let s_lo = at(lo);
        let s_hi = at(hi);
        prop_assert!(s_lo.step_index <= s_hi.step_index);
        prop_assert!(s_hi.step_index <= config.step_count);
        prop_assert!((0.0..1.0).contains(&s_hi.fractional_progress));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Series window length
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn series_length_invariant(seed in any::<u64>(), window in 1usize..40, steps in 0usize..200) {
        let mut rng = SeededRandom::from_seed(seed);
        let config = SeriesConfig { window, ..SeriesConfig::default() };
        let mut drift = SeriesDrift::seeded(&config, &mut rng).unwrap();
        for _ in 0..steps {
            drift.step(&mut rng);
        }
        for w in drift.windows() {
            prop_assert_eq!(w.len(), window);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Typed text is a prefix of the current source
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn typing_text_is_prefix(
        sources in prop::collection::vec(source_strategy(), 1..4),
        steps in prop::collection::vec(0u64..120, 1..200),
    ) {
        let mut rng = SeededRandom::from_seed(0);
        let mut typing = Timed::new(TypingAnimator::new(typing_config(sources.clone())).unwrap());
        for ms in steps {
            typing.advance(Duration::from_millis(ms), &mut rng);
            let state = typing.inner().state();
            prop_assert!(state.source_index() < sources.len());
            prop_assert!(
                sources[state.source_index()].starts_with(state.text()),
                "{:?} is not a prefix of {:?}",
                state.text(),
                sources[state.source_index()]
            );
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Advance granularity does not matter
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn large_advance_equals_small_advances(
        sources in prop::collection::vec(source_strategy(), 1..4),
        total_ms in 0u64..2_000,
        chunk_ms in 1u64..50,
    ) {
        let mut rng = SeededRandom::from_seed(0);
        let config = typing_config(sources);
        let mut big = Timed::new(TypingAnimator::new(config.clone()).unwrap());
        let mut small = Timed::new(TypingAnimator::new(config).unwrap());

        big.advance(Duration::from_millis(total_ms), &mut rng);
        let mut left = total_ms;
        while left > 0 {
            let step = left.min(chunk_ms);
            small.advance(Duration::from_millis(step), &mut rng);
            left -= step;
        }
        prop_assert_eq!(big.inner().state(), small.inner().state());
        prop_assert_eq!(big.transitions(), small.transitions());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Monte-Carlo bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn monte_carlo_bounded(seed in any::<u64>(), ticks in 0u64..400, restarts in 0usize..3) {
        let mut rng = SeededRandom::from_seed(seed);
        let mut run = Timed::new(MonteCarloRun::new(MonteCarloConfig::default()).unwrap());
        for _ in 0..=restarts {
            if !run.inner().is_running() {
                run.handle(&Input::Start);
            }
            for _ in 0..ticks {
                run.advance(Duration::from_millis(200), &mut rng);
                let view = run.inner().view();
                prop_assert!(view.progress <= 100.0);
                prop_assert!(view.log.len() <= 5);
                prop_assert!(view.points.len() <= 50);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Carousel index bounded
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn carousel_index_bounded(fires in 0usize..500) {
        let mut rng = SeededRandom::from_seed(0);
        let config = CarouselConfig::default();
        let len = config.items.len();
        let mut carousel = Carousel::new(config).unwrap();
        for _ in 0..fires {
            carousel.fire(&mut rng);
            prop_assert!(carousel.index() < len);
        }
        prop_assert_eq!(carousel.index(), (fires / 2) % len);
    }
}
