#![forbid(unsafe_code)]

//! Keyboard and resize events as a subscription.

use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use simfx_runtime::subscription::{StopSignal, SubId, Subscription};

use crate::app::{Action, Msg};

/// Stable id so reconciliation keeps a single reader alive.
const INPUT_SUB_ID: SubId = 0x696e_7075_7400_0001;

/// How long one poll blocks before the stop signal is rechecked.
const POLL: Duration = Duration::from_millis(25);

/// Reads terminal events on a background thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputSubscription;

impl Subscription<Msg> for InputSubscription {
    fn id(&self) -> SubId {
        INPUT_SUB_ID
    }

    fn run(&self, sender: mpsc::Sender<Msg>, stop: StopSignal) {
        while !stop.is_stopped() {
            match event::poll(POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    tracing::warn!(%err, "event poll failed");
                    break;
                }
            }
            let ev = match event::read() {
                Ok(ev) => ev,
                Err(err) => {
                    tracing::warn!(%err, "event read failed");
                    break;
                }
            };
            if let Some(msg) = map_event(&ev)
                && sender.send(msg).is_err()
            {
                break;
            }
        }
        tracing::debug!("input subscription stopped");
    }
}

/// Translate a terminal event. Key releases and unbound keys map to `None`.
#[must_use]
pub fn map_event(ev: &Event) -> Option<Msg> {
    match ev {
        Event::Key(key) => map_key(key).map(Msg::Action),
        Event::Resize(width, height) => Some(Msg::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }
    Some(match key.code {
        KeyCode::Up | KeyCode::Char('k') => Action::ScrollUp,
        KeyCode::Down | KeyCode::Char('j') => Action::ScrollDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown | KeyCode::Char(' ') => Action::PageDown,
        KeyCode::Home => Action::Top,
        KeyCode::Tab => Action::NextTheme,
        KeyCode::Char('s') => Action::ToggleRun,
        KeyCode::Char('m') => Action::ToggleIntel,
        KeyCode::Char('r') => Action::Reset,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    })
}
