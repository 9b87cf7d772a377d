use thiserror::Error;

use crate::constants::STACK_DEPTH;

/// Everything that can stop the Chip-8 from loading a program or completing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("program is {size} bytes but at most {max} bytes fit in memory")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("opcode {opcode:#06X} is not implemented")]
    UnimplementedOpcode { opcode: u16 },

    #[error("call stack overflow: subroutines nested more than {} deep", STACK_DEPTH)]
    StackOverflow,

    #[error("call stack underflow: returned with no active subroutine")]
    StackUnderflow,

    #[error("address {address:#06X} is outside of memory")]
    AddressOutOfRange { address: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
