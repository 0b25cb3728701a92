//! Drives the showcase model without a terminal.

use std::time::Duration;

use proptest::prelude::*;
use simfx_core::config::ShowcaseConfig;
use simfx_core::controller::Snapshot;
use simfx_core::theme::Theme;
use simfx_demo::app::{Action, App, Msg, SectionId};
use simfx_demo::config_file;
use simfx_runtime::clock::{Clock, ManualClock};

fn run_for(app: &mut App, clock: &ManualClock, total: Duration, step: Duration) {
    let end = clock.now() + total;
    while clock.now() < end {
        clock.advance(step);
        app.tick(clock);
    }
}

#[test]
fn loader_finishes_after_all_delays() {
    let mut app = App::new(ShowcaseConfig::default(), 5, 80, 24).unwrap();
    let clock = ManualClock::new();
    app.tick(&clock);
    run_for(&mut app, &clock, Duration::from_secs(30), Duration::from_millis(50));
    match app.snapshot(SectionId::Loader) {
        Some(Snapshot::Loader(view)) => assert_eq!(view.loaded, view.items.len()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn hero_types_first_prompt() {
    let mut app = App::new(ShowcaseConfig::default(), 5, 80, 24).unwrap();
    let clock = ManualClock::new();
    app.tick(&clock);
    run_for(&mut app, &clock, Duration::from_millis(500), Duration::from_millis(10));
    match app.snapshot(SectionId::Hero) {
        Some(Snapshot::Typing(state)) => {
            let source = &ShowcaseConfig::default().typing.sources[0];
            assert!(!state.text().is_empty());
            assert!(source.starts_with(state.text()));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn configured_theme_is_shown() {
    let cfg = config_file::from_json(
        std::path::Path::new("page.json"),
        r#"{"theme": "research"}"#,
    )
    .unwrap();
    let app = App::new(cfg, 1, 80, 24).unwrap();
    assert_eq!(app.theme(), Theme::Research);
    let screen = app.view();
    assert!(screen.header.contains("Research"));
    assert_eq!(screen.accent, Theme::Research.accent_rgb());
}

#[test]
fn resize_keeps_view_in_step() {
    let mut app = App::new(ShowcaseConfig::default(), 5, 80, 24).unwrap();
    app.update(Msg::Resize {
        width: 40,
        height: 10,
    });
    let screen = app.view();
    assert_eq!(screen.body.len(), 9);
    assert!(screen.body.iter().all(|l| l.chars().count() <= 40));
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::ScrollUp),
        Just(Action::ScrollDown),
        Just(Action::PageUp),
        Just(Action::PageDown),
        Just(Action::Top),
        Just(Action::NextTheme),
        Just(Action::ToggleRun),
        Just(Action::ToggleIntel),
        Just(Action::Reset),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn scroll_stays_on_page(actions in prop::collection::vec(action(), 1..60), height in 4u16..50) {
        let mut app = App::new(ShowcaseConfig::default(), 9, 72, height).unwrap();
        let clock = ManualClock::new();
        app.tick(&clock);
        for action in actions {
            app.update(Msg::Action(action));
            clock.advance(Duration::from_millis(120));
            app.tick(&clock);

            let (page, _) = app.page();
            let viewport = usize::from(height - 1);
            prop_assert!(app.scroll() <= page.len().saturating_sub(viewport));
            prop_assert_eq!(app.view().body.len(), viewport);
            prop_assert_eq!(app.stage().len(), SectionId::ALL.len());
        }
    }
}
