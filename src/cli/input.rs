//! Keyboard and mouse input handling using crossterm
//!
//! Features:
//! - Non-blocking event polling
//! - Mouse capture for the pointer tracker and calibration clicks
//! - Ctrl+C / Esc / q graceful exit

use crate::session::SessionMode;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::execute;
use std::io::{stdout, Result as IoResult};
use std::time::Duration;

/// BPM change per arrow key press
pub const BPM_STEP: i32 = 5;

/// Trainer commands bound to keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SelectMode(SessionMode),
    /// Start, stop, or dismiss results
    Toggle,
    AdjustBpm(i32),
    ResetCalibration,
    Quit,
}

/// One decoded terminal event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Command(Command),
    /// Left click at a terminal cell
    Click { col: u16, row: u16 },
    /// Pointer moved (or dragged) to a terminal cell
    Pointer { col: u16, row: u16 },
    Resize { cols: u16, rows: u16 },
}

/// Handles user input from terminal
pub struct InputHandler {
    /// Upper bound on how long one poll may block
    poll_timeout: Duration,
}

impl InputHandler {
    pub fn new(poll_timeout: Duration) -> Self {
        InputHandler { poll_timeout }
    }

    /// Raw mode plus mouse reporting
    pub fn enable() -> IoResult<()> {
        crossterm::terminal::enable_raw_mode()?;
        execute!(stdout(), EnableMouseCapture)
    }

    /// Restore the terminal
    pub fn disable() -> IoResult<()> {
        execute!(stdout(), DisableMouseCapture)?;
        crossterm::terminal::disable_raw_mode()
    }

    /// Wait up to `timeout` (capped by the poll timeout) for one event
    pub fn read_event(&self, timeout: Duration) -> IoResult<Option<InputEvent>> {
        if !event::poll(timeout.min(self.poll_timeout))? {
            return Ok(None);
        }
        Ok(Self::decode(event::read()?))
    }

    /// Map a raw crossterm event onto a trainer event
    pub fn decode(event: Event) -> Option<InputEvent> {
        match event {
            Event::Key(key) => Self::map_key(&key).map(InputEvent::Command),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::Click {
                    col: mouse.column,
                    row: mouse.row,
                }),
                MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(InputEvent::Pointer {
                    col: mouse.column,
                    row: mouse.row,
                }),
                _ => None,
            },
            Event::Resize(cols, rows) => Some(InputEvent::Resize { cols, rows }),
            _ => None,
        }
    }

    /// Key bindings; releases and repeats are ignored
    pub fn map_key(key: &KeyEvent) -> Option<Command> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Quit)
            }
            KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            KeyCode::Char('1') => Some(Command::SelectMode(SessionMode::Hold)),
            KeyCode::Char('2') => Some(Command::SelectMode(SessionMode::Follow)),
            KeyCode::Char(' ') => Some(Command::Toggle),
            KeyCode::Up => Some(Command::AdjustBpm(BPM_STEP)),
            KeyCode::Down => Some(Command::AdjustBpm(-BPM_STEP)),
            KeyCode::Char('r') => Some(Command::ResetCalibration),
            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}
