pub use chip8::{Chip8, StepResult};
pub use disassembler::{disassemble, Line};
pub use error::{Error, Result};
pub use frame_buffer::FrameBuffer;
pub use instruction::Instruction;
pub use keypad::Keypad;
pub use opcode::Opcode;
pub use quirks::Quirks;

mod chip8;
pub mod constants;
mod disassembler;
mod error;
mod frame_buffer;
mod instruction;
mod keypad;
mod opcode;
mod operations;
mod quirks;
pub mod state;
