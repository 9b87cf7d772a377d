use std::ops::Range;

use crate::constants::{
    MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START, REGISTER_COUNT, SPRITE_SHEET, STACK_DEPTH,
};
use crate::error::{Error, Result};
use crate::frame_buffer::FrameBuffer;

/// A snapshot of the Chip8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is also written as a flag by arithmetic, shift and draw instructions
/// - (i) a 16-bit memory address register, of which 12 bits are used
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Timers
/// - 2 8-bit timers (delay & sound) that count down to 0
///
/// ## Memory
/// - a stack of up to 16 return addresses, kept apart from main memory
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the font sprite sheet
///     - programs are loaded from 0x200
/// - 32x64 frame buffer
///
/// ## Input
/// - Emulation halts while `register_needing_key` names a register awaiting a keypress
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: Stack,
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub register_needing_key: Option<usize>,
}

impl State {
    /// A zeroed state with the sprite sheet in place and no program.
    pub fn new() -> Self {
        // 0x000 - 0x050 is reserved for the sprite sheet
        let mut memory = [0; MEMORY_SIZE];
        memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            delay_timer: 0,
            sound_timer: 0,
            stack: Stack::new(),
            memory,
            frame_buffer: FrameBuffer::new(),
            draw_flag: false,
            register_needing_key: None,
        }
    }

    /// A fresh state with `program` copied into memory at `PROGRAM_START`.
    ///
    /// # Arguments
    /// * `program` raw program bytes; at most `MAX_PROGRAM_SIZE` of them
    pub fn load(program: &[u8]) -> Result<Self> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        let mut state = State::new();
        let start = usize::from(PROGRAM_START);
        state.memory[start..start + program.len()].copy_from_slice(program);
        Ok(state)
    }

    /// Borrows `len` bytes of memory starting at `address`.
    pub fn read_memory(&self, address: u16, len: usize) -> Result<&[u8]> {
        let range = memory_range(address, len)?;
        Ok(&self.memory[range])
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// The range of `len` bytes starting at `start`, if all of them are in memory.
pub fn memory_range(start: u16, len: usize) -> Result<Range<usize>> {
    let start = usize::from(start);
    let end = start + len;
    if end > MEMORY_SIZE {
        Err(Error::AddressOutOfRange {
            address: start.max(MEMORY_SIZE),
        })
    } else {
        Ok(start..end)
    }
}

/// Fails unless `address` can be used as a program counter.
pub fn check_address(address: u16) -> Result<u16> {
    if usize::from(address) < MEMORY_SIZE {
        Ok(address)
    } else {
        Err(Error::AddressOutOfRange {
            address: usize::from(address),
        })
    }
}

/// # Stack
/// Return addresses of the active subroutines, most recent last.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Stack {
    frames: [u16; STACK_DEPTH],
    depth: usize,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            frames: [0; STACK_DEPTH],
            depth: 0,
        }
    }

    pub fn push(&mut self, address: u16) -> Result<()> {
        let frame = self
            .frames
            .get_mut(self.depth)
            .ok_or(Error::StackOverflow)?;
        *frame = address;
        self.depth += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16> {
        if self.depth == 0 {
            return Err(Error::StackUnderflow);
        }
        self.depth -= 1;
        Ok(self.frames[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.frames[..self.depth]
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_holds_sprite_sheet() {
        let state = State::new();
        assert_eq!(state.memory[0x000..0x005], [0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(state.memory[0x005..0x00A], [0x20, 0x60, 0x20, 0x20, 0x70]);
        assert_eq!(state.memory[0x04B..0x050], [0xF0, 0x80, 0xF0, 0x80, 0x80]);
        assert!(state.memory[0x050..].iter().all(|&byte| byte == 0));
        assert_eq!(state.pc, 0x200);
    }

    #[test]
    fn test_load_copies_program() {
        let state = State::load(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(state.memory[0x200..0x204], [0x12, 0x34, 0x56, 0x00]);
    }

    #[test]
    fn test_load_accepts_full_program_region() {
        let program = vec![0xAB; MAX_PROGRAM_SIZE];
        let state = State::load(&program).unwrap();
        assert_eq!(state.memory[MEMORY_SIZE - 1], 0xAB);
    }

    #[test]
    fn test_load_rejects_oversized_program() {
        let program = vec![0; MAX_PROGRAM_SIZE + 1];
        assert_eq!(
            State::load(&program),
            Err(Error::ProgramTooLarge {
                size: 3585,
                max: 3584
            })
        );
    }

    #[test]
    fn test_memory_range_bounds() {
        assert_eq!(memory_range(0xFFD, 3), Ok(0xFFD..0x1000));
        assert_eq!(
            memory_range(0xFFE, 3),
            Err(Error::AddressOutOfRange { address: 0x1000 })
        );
    }

    #[test]
    fn test_check_address() {
        assert_eq!(check_address(0xFFF), Ok(0xFFF));
        assert_eq!(
            check_address(0x1000),
            Err(Error::AddressOutOfRange { address: 0x1000 })
        );
    }

    #[test]
    fn test_stack_is_lifo() {
        let mut stack = Stack::new();
        stack.push(0x202).unwrap();
        stack.push(0x304).unwrap();
        assert_eq!(stack.as_slice(), &[0x202, 0x304]);
        assert_eq!(stack.pop(), Ok(0x304));
        assert_eq!(stack.pop(), Ok(0x202));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_stack_bounds() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(Error::StackUnderflow));
        for address in 0..STACK_DEPTH as u16 {
            stack.push(address).unwrap();
        }
        assert_eq!(stack.push(0x200), Err(Error::StackOverflow));
        assert_eq!(stack.depth(), STACK_DEPTH);
    }
}
