#![forbid(unsafe_code)]

//! Terminal session guard and frame drawing.
//!
//! Entering the session switches to raw mode, the alternate screen and a
//! hidden cursor. Dropping it restores all three, and a panic hook does the
//! same on the way out of a panic (the release profile aborts, so `Drop`
//! alone is not enough).

use std::io::{self, Stdout, Write};
use std::sync::OnceLock;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::app::Screen;

#[derive(Debug)]
pub struct TerminalSession {
    stdout: Stdout,
    alternate_screen: bool,
}

impl TerminalSession {
    /// Enter raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal refuses raw mode or the screen switch.
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut session = Self {
            stdout: io::stdout(),
            alternate_screen: false,
        };
        execute!(session.stdout, EnterAlternateScreen, Hide)?;
        session.alternate_screen = true;
        tracing::info!("alternate screen enabled");
        Ok(session)
    }

    /// Paint one frame: an accent-colored header row and the body rows.
    pub fn draw(&mut self, screen: &Screen) -> io::Result<()> {
        let (r, g, b) = screen.accent;
        queue!(
            self.stdout,
            MoveTo(0, 0),
            SetForegroundColor(Color::Rgb { r, g, b }),
            SetAttribute(Attribute::Bold),
            Print(&screen.header),
            SetAttribute(Attribute::Reset),
            ResetColor,
            Clear(ClearType::UntilNewLine),
        )?;
        for (row, line) in screen.body.iter().enumerate() {
            let y = u16::try_from(row + 1).unwrap_or(u16::MAX);
            queue!(
                self.stdout,
                MoveTo(0, y),
                Print(line),
                Clear(ClearType::UntilNewLine)
            )?;
        }
        self.stdout.flush()
    }

    fn cleanup(&mut self) {
        let _ = execute!(self.stdout, Show);
        if self.alternate_screen {
            let _ = execute!(self.stdout, LeaveAlternateScreen);
            self.alternate_screen = false;
            tracing::info!("alternate screen disabled");
        }
        let _ = terminal::disable_raw_mode();
        tracing::info!("terminal raw mode disabled");
        let _ = self.stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}
