use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::trace;

use emu8::constants::KEY_COUNT;
use emu8::Keypad;

use crate::keymap::keymap;

/// Terminals without key release reporting only send presses (and autorepeats), so a press keeps
/// its key down for this many frames.
pub const KEY_HOLD_FRAMES: u32 = 10;

/// Where the keys held down for each step come from.
pub trait KeySource {
    /// Keys held down for the next step, `None` once the user has asked to quit.
    fn poll(&mut self) -> Result<Option<Keypad>>;

    /// Called once per 60Hz frame.
    fn end_frame(&mut self) {}

    /// Whether the held keys can change while running, so a key wait may end.
    fn is_live(&self) -> bool;
}

/// The same keys held down for a whole run.
pub struct HeldKeys(pub Keypad);

impl KeySource for HeldKeys {
    fn poll(&mut self) -> Result<Option<Keypad>> {
        Ok(Some(self.0))
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// # Terminal keys
/// Live keypad state built from crossterm key events.
///
/// Escape or Ctrl-C quits. Keys named on the command line stay held throughout.
pub struct TerminalKeys {
    held: Keypad,
    frames_left: [u32; KEY_COUNT],
    quit: bool,
}

impl TerminalKeys {
    pub fn new(held: Keypad) -> Self {
        TerminalKeys {
            held,
            frames_left: [0; KEY_COUNT],
            quit: false,
        }
    }

    /// Applies a single terminal event to the keypad.
    pub fn handle(&mut self, event: &Event) {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = *event
        else {
            return;
        };
        match code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
            KeyCode::Char(c) => {
                if let Some(key) = keymap(c) {
                    trace!("{:?} {:X}", kind, key);
                    self.frames_left[usize::from(key)] = match kind {
                        KeyEventKind::Press | KeyEventKind::Repeat => KEY_HOLD_FRAMES,
                        KeyEventKind::Release => 0,
                    };
                }
            }
            _ => {}
        }
    }

    pub fn keypad(&self) -> Keypad {
        let mut keypad = self.held;
        for (key, frames) in (0u8..).zip(self.frames_left) {
            if frames > 0 {
                keypad.press(key);
            }
        }
        keypad
    }
}

impl KeySource for TerminalKeys {
    fn poll(&mut self) -> Result<Option<Keypad>> {
        while event::poll(Duration::ZERO)? {
            self.handle(&event::read()?);
        }
        Ok((!self.quit).then(|| self.keypad()))
    }

    fn end_frame(&mut self) {
        for frames in self.frames_left.iter_mut() {
            *frames = frames.saturating_sub(1);
        }
    }

    fn is_live(&self) -> bool {
        true
    }
}
