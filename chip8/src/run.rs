use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::{debug, info, warn};

use display::Display;
use emu8::{Chip8, Quirks, StepResult};

use crate::input::{HeldKeys, KeySource, TerminalKeys};
use crate::keymap::parse_keys;

/// Chip-8 timers count down at 60Hz
const FRAME_TIME: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// How a run is configured.
pub struct RunOptions {
    pub rom: PathBuf,
    /// Stop after this many steps, `None` runs until the program stops itself or the user quits
    pub steps: Option<u64>,
    pub steps_per_frame: u32,
    /// QWERTY characters held down for the whole run
    pub keys: String,
    pub seed: Option<u64>,
    pub quirks: Quirks,
    /// Don't hold each frame to 60Hz
    pub fast: bool,
    /// Don't take over the terminal; frames are appended to stdout and only `keys` are pressed
    pub headless: bool,
}

/// Why a run stopped without an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    StepLimit,
    Quit,
    /// A headless run reached `LD Vx, K` without the key it needs held
    WaitingForKey { register: usize, pc: u16 },
}

/// Raw mode and the alternate screen for as long as this lives.
struct Terminal {
    enhanced: bool,
}

impl Terminal {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        // key release events where the terminal can report them
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        Ok(Terminal { enhanced })
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let restored = if self.enhanced {
            execute!(stdout, PopKeyboardEnhancementFlags)
        } else {
            Ok(())
        }
        .and_then(|_| execute!(stdout, Show, LeaveAlternateScreen))
        .and_then(|_| terminal::disable_raw_mode());
        if let Err(e) = restored {
            warn!("unable to restore the terminal: {}", e);
        }
    }
}

pub fn run(options: RunOptions) -> Result<Halt> {
    let program = fs::read(&options.rom)
        .with_context(|| format!("unable to read ROM {}", options.rom.display()))?;
    let mut chip8 = Chip8::load(&program)
        .with_context(|| format!("unable to load ROM {}", options.rom.display()))?
        .with_quirks(options.quirks);
    if let Some(seed) = options.seed {
        chip8 = chip8.with_seed(seed);
    }
    info!(
        "loaded {} bytes from {}",
        program.len(),
        options.rom.display()
    );

    let held = parse_keys(&options.keys)?;
    if options.headless {
        let mut display = Display::new(io::stdout(), false);
        run_frames(&mut chip8, &options, &mut HeldKeys(held), &mut display)
    } else {
        let _terminal = Terminal::enter().context("unable to set up the terminal")?;
        let mut display = Display::new(io::stdout(), true);
        run_frames(&mut chip8, &options, &mut TerminalKeys::new(held), &mut display)
    }
}

/// Steps `chip8` a frame at a time, rendering whenever the frame changes.
///
/// While the program waits for a key the loop keeps stepping, so a live source can supply one.
/// A source whose keys never change can't end the wait, so the run halts there instead.
fn run_frames<S: KeySource, W: Write>(
    chip8: &mut Chip8,
    options: &RunOptions,
    keys: &mut S,
    display: &mut Display<W>,
) -> Result<Halt> {
    let mut steps: u64 = 0;

    let halt = 'frame: loop {
        let frame_start = Instant::now();

        for _ in 0..options.steps_per_frame.max(1) {
            if options.steps.map_or(false, |limit| steps >= limit) {
                break 'frame Halt::StepLimit;
            }
            let keypad = match keys.poll()? {
                Some(keypad) => keypad,
                None => break 'frame Halt::Quit,
            };
            let pc = chip8.state().pc;
            let result = chip8
                .step(keypad)
                .with_context(|| format!("step {} failed at {:#05X}", steps, pc))?;
            steps += 1;
            if let StepResult::WaitingForKey { register } = result {
                if !keys.is_live() {
                    break 'frame Halt::WaitingForKey { register, pc };
                }
                // nothing changes until a key arrives, so idle out the rest of the frame
                break;
            }
        }
        keys.end_frame();

        // If the draw flag is set, unset it and render the current frame
        if let Some(frame) = chip8.take_frame() {
            display.render(&frame).context("unable to render frame")?;
        }

        // Handle timing
        let elapsed = frame_start.elapsed();
        if !options.fast && FRAME_TIME > elapsed {
            thread::sleep(FRAME_TIME - elapsed);
        }
    };

    if let Some(frame) = chip8.take_frame() {
        display.render(&frame).context("unable to render frame")?;
    }
    debug!("stopped after {} steps: {:?}", steps, halt);
    Ok(halt)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use emu8::Keypad;

    use super::*;

    fn write_rom(name: &str, program: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "chip8-run-{}-{}.ch8",
            name,
            std::process::id()
        ));
        fs::write(&path, program).unwrap();
        path
    }

    fn options(rom: PathBuf) -> RunOptions {
        RunOptions {
            rom,
            steps: None,
            steps_per_frame: 10,
            keys: String::new(),
            seed: Some(0),
            quirks: Quirks::default(),
            fast: true,
            headless: true,
        }
    }

    /// Hands out a scripted keypad per poll, then quits once the script runs out
    struct ScriptedKeys {
        script: VecDeque<Keypad>,
        frames: usize,
    }

    impl KeySource for ScriptedKeys {
        fn poll(&mut self) -> Result<Option<Keypad>> {
            Ok(self.script.pop_front())
        }

        fn end_frame(&mut self) {
            self.frames += 1;
        }

        fn is_live(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_run_stops_at_step_limit() {
        // JP 0x200
        let rom = write_rom("limit", &[0x12, 0x00]);
        let halt = run(RunOptions {
            steps: Some(25),
            ..options(rom.clone())
        });
        fs::remove_file(rom).unwrap();
        assert_eq!(halt.unwrap(), Halt::StepLimit);
    }

    #[test]
    fn test_headless_run_stops_on_key_wait() {
        // CLS; LD V2, K
        let rom = write_rom("wait", &[0x00, 0xE0, 0xF2, 0x0A]);
        let halt = run(options(rom.clone()));
        fs::remove_file(rom).unwrap();
        assert_eq!(
            halt.unwrap(),
            Halt::WaitingForKey {
                register: 0x2,
                pc: 0x202
            }
        );
    }

    #[test]
    fn test_run_held_key_satisfies_wait() {
        // LD V2, K; JP 0x202
        let rom = write_rom("held", &[0xF2, 0x0A, 0x12, 0x02]);
        let halt = run(RunOptions {
            steps: Some(5),
            keys: "w".to_string(),
            ..options(rom.clone())
        });
        fs::remove_file(rom).unwrap();
        assert_eq!(halt.unwrap(), Halt::StepLimit);
    }

    #[test]
    fn test_live_keys_idle_through_key_wait() {
        // LD V2, K; LD V3, 0x01; JP 0x204
        let program = [0xF2, 0x0A, 0x63, 0x01, 0x12, 0x04];
        let mut chip8 = Chip8::load(&program).unwrap();
        let mut script: VecDeque<Keypad> = std::iter::repeat(Keypad::default()).take(3).collect();
        script.push_back(Keypad::from_keys(&[0x9]));
        script.extend(std::iter::repeat(Keypad::default()).take(2));
        let mut keys = ScriptedKeys { script, frames: 0 };
        let mut out = Vec::new();

        let halt = run_frames(
            &mut chip8,
            &options(PathBuf::new()),
            &mut keys,
            &mut Display::new(&mut out, false),
        )
        .unwrap();

        assert_eq!(halt, Halt::Quit);
        // one waiting step in each of the first three frames, the fourth ends on quit
        assert_eq!(keys.frames, 3);
        assert!(!chip8.is_waiting_for_key());
        assert_eq!(chip8.state().v[0x2], 0x9);
        assert_eq!(chip8.state().v[0x3], 0x1);
    }

    #[test]
    fn test_live_keys_reach_each_step() {
        // SKP V0 (V0 = 0); LD V1, 0x01; JP 0x200
        let program = [0xE0, 0x9E, 0x61, 0x01, 0x12, 0x00];
        let mut chip8 = Chip8::load(&program).unwrap();
        let script = VecDeque::from([Keypad::from_keys(&[0x0])]);
        let mut keys = ScriptedKeys { script, frames: 0 };
        let mut out = Vec::new();

        let halt = run_frames(
            &mut chip8,
            &options(PathBuf::new()),
            &mut keys,
            &mut Display::new(&mut out, false),
        )
        .unwrap();

        assert_eq!(halt, Halt::Quit);
        assert_eq!(chip8.state().pc, 0x204);
        assert_eq!(chip8.state().v[0x1], 0x0);
    }

    #[test]
    fn test_run_renders_drawn_frames() {
        // LD F, V0; DRW V0, V0, 5
        let program = [0xF0, 0x29, 0xD0, 0x05];
        let mut chip8 = Chip8::load(&program).unwrap();
        let mut out = Vec::new();
        let halt = run_frames(
            &mut chip8,
            &RunOptions {
                steps: Some(2),
                ..options(PathBuf::new())
            },
            &mut HeldKeys(Keypad::default()),
            &mut Display::new(&mut out, false),
        )
        .unwrap();

        assert_eq!(halt, Halt::StepLimit);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("█▀▀█ "));
        assert!(chip8.take_frame().is_none());
    }

    #[test]
    fn test_run_reports_step_errors() {
        // RET
        let rom = write_rom("error", &[0x00, 0xEE]);
        let error = run(options(rom.clone())).unwrap_err();
        fs::remove_file(rom).unwrap();
        assert_eq!(error.to_string(), "step 0 failed at 0x200");
        assert_eq!(
            error.downcast_ref::<emu8::Error>(),
            Some(&emu8::Error::StackUnderflow)
        );
    }

    #[test]
    fn test_run_missing_rom() {
        let error = run(options(PathBuf::from("/nonexistent/rom.ch8"))).unwrap_err();
        assert!(error.to_string().starts_with("unable to read ROM"));
    }
}
