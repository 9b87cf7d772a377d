use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::Result;
use crate::frame_buffer::FrameBuffer;
use crate::instruction::Instruction;
use crate::keypad::Keypad;
use crate::opcode::Opcode;
use crate::operations::{self, Context};
use crate::quirks::Quirks;
use crate::state::{check_address, State};

/// What a single call to `Chip8::step` did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// The instruction ran to completion.
    Executed(Instruction),
    /// The Chip-8 is idling on `LD Vx, K` until a step supplies a pressed key.
    WaitingForKey { register: usize },
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the loaded `program` so that it can be reset
///  - the `quirks` it runs with and the random number generator behind `RND`
///
/// Supplies interfaces for:
/// - loading programs
/// - advancing the CPU and its timers one instruction at a time
/// - inspecting its state and frame buffer for rendering by some display
///
/// Scheduling is left to the host: every call to `step` executes one instruction and ticks
/// the timers once.
pub struct Chip8 {
    state: State,
    program: Vec<u8>,
    quirks: Quirks,
    rng: StdRng,
}

impl Chip8 {
    /// A Chip-8 with empty program memory.
    pub fn new() -> Self {
        Chip8 {
            state: State::new(),
            program: Vec::new(),
            quirks: Quirks::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// A Chip-8 with `program` loaded and default quirks.
    pub fn load(program: &[u8]) -> Result<Self> {
        let mut chip8 = Chip8::new();
        chip8.load_program(program)?;
        Ok(chip8)
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// Makes `RND` deterministic.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replaces the whole state with a fresh one holding `program`
    ///
    /// # Arguments
    /// * `program` raw program bytes to be placed at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.state = State::load(program)?;
        self.program = program.to_vec();
        debug!("loaded {} byte program", program.len());
        Ok(())
    }

    /// Starts the loaded program over from a fresh state.
    pub fn reset(&mut self) {
        // the program was already accepted once so it still fits
        self.state = State::load(&self.program).unwrap_or_default();
        debug!("reset");
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Returns the FrameBuffer if it has changed since it was last taken
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn is_waiting_for_key(&self) -> bool {
        self.state.register_needing_key.is_some()
    }

    /// Advances the CPU by a single instruction
    /// - completes a pending key wait if a key is pressed, otherwise idles
    /// - gets, decodes and executes the next opcode
    /// - ticks the timers
    ///
    /// A failed step leaves the state untouched.
    ///
    /// # Arguments
    /// * `keys` the keys held down for the duration of this step
    pub fn step<K: Into<Keypad>>(&mut self, keys: K) -> Result<StepResult> {
        let keypad = keys.into();

        if let Some(register) = self.state.register_needing_key {
            let mut next = self.state;
            let result = match keypad.first_pressed() {
                Some(key) => {
                    debug!("key {:X} pressed for V{:X}", key, register);
                    next.v[register] = key;
                    next.pc += 0x2;
                    next.register_needing_key = None;
                    StepResult::Executed(Instruction::WaitKey { x: register })
                }
                None => StepResult::WaitingForKey { register },
            };
            advance_timers(&mut next);
            self.state = next;
            return Ok(result);
        }

        let op = self.get_op()?;
        let result = self.execute(op, &keypad);
        if let Err(e) = &result {
            warn!("{:04X} at {:04X} failed: {}", op.raw(), self.state.pc, e);
        }
        result
    }

    fn execute(&mut self, op: Opcode, keypad: &Keypad) -> Result<StepResult> {
        let instruction = Instruction::decode(op)?;
        trace!(
            "{:04X} {} {:<16} v{:02X?} i{:04X}",
            self.state.pc,
            op,
            instruction.to_string(),
            self.state.v,
            self.state.i
        );

        let advanced = State {
            pc: self.state.pc + 0x2,
            ..self.state
        };
        let mut context = Context {
            keypad,
            quirks: self.quirks,
            rng: &mut self.rng,
        };
        let mut next = operations::execute(instruction, &advanced, &mut context)?;
        check_address(next.pc)?;

        let result = match next.register_needing_key {
            Some(register) => {
                debug!("waiting for a key for V{:X}", register);
                StepResult::WaitingForKey { register }
            }
            None => StepResult::Executed(instruction),
        };
        advance_timers(&mut next);
        self.state = next;
        Ok(result)
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    fn get_op(&self) -> Result<Opcode> {
        let bytes = self.state.read_memory(self.state.pc, 2)?;
        Ok(Opcode::from_bytes(bytes[0], bytes[1]))
    }
}

/// Decrements both timers towards 0
fn advance_timers(state: &mut State) {
    state.delay_timer = state.delay_timer.saturating_sub(1);
    state.sound_timer = state.sound_timer.saturating_sub(1);
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
