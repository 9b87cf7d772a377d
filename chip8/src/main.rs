use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use emu8::{disassemble, Quirks};

use crate::run::{run, Halt, RunOptions};

mod input;
mod keymap;
mod run;

#[derive(Parser, Debug)]
#[command(version, about = "A headless Chip-8 interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a ROM in the terminal, reading the keypad from the keyboard (Esc quits)
    Run {
        /// Path to the ROM file to run
        rom: PathBuf,

        /// Stop after this many steps, 0 runs until the program stops
        #[arg(long, default_value_t = 0)]
        steps: u64,

        /// Instructions executed per 60Hz frame
        #[arg(long, default_value_t = 10)]
        steps_per_frame: u32,

        /// QWERTY keys held down for the whole run, e.g. "qw"
        #[arg(short, long, default_value = "")]
        keys: String,

        /// Seed for RND, random when not given
        #[arg(long)]
        seed: Option<u64>,

        /// Wrap sprites around the screen edges instead of clipping them
        #[arg(long)]
        wrap_sprites: bool,

        /// Shift Vy into Vx for SHR and SHL
        #[arg(long)]
        shift_vy: bool,

        /// Run as fast as possible instead of at 60 frames a second
        #[arg(long)]
        fast: bool,

        /// Append frames to stdout without taking over the terminal. Only --keys are pressed,
        /// so a key wait ends the run
        #[arg(long)]
        headless: bool,
    },
    /// Print a listing of a ROM
    Disasm {
        /// Path to the ROM file to list
        rom: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    match Cli::parse().command {
        Command::Run {
            rom,
            steps,
            steps_per_frame,
            keys,
            seed,
            wrap_sprites,
            shift_vy,
            fast,
            headless,
        } => {
            let halt = run(RunOptions {
                rom,
                steps: (steps > 0).then_some(steps),
                steps_per_frame,
                keys,
                seed,
                quirks: Quirks {
                    wrap_sprites,
                    shift_uses_vy: shift_vy,
                },
                fast,
                headless,
            })?;
            match halt {
                Halt::StepLimit | Halt::Quit => Ok(ExitCode::SUCCESS),
                Halt::WaitingForKey { register, pc } => {
                    eprintln!(
                        "waiting for a key press into V{:X} at {:#05X}, pass --keys to supply one",
                        register, pc
                    );
                    Ok(ExitCode::from(2))
                }
            }
        }
        Command::Disasm { rom } => {
            let program =
                fs::read(&rom).with_context(|| format!("unable to read ROM {}", rom.display()))?;
            let mut out = BufWriter::new(io::stdout().lock());
            for line in disassemble(&program) {
                writeln!(out, "{}", line)?;
            }
            out.flush()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
