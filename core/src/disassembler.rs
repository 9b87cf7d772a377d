use std::fmt;

use crate::constants::PROGRAM_START;
use crate::instruction::Instruction;
use crate::opcode::Opcode;

/// # Disassembly
/// One line of a program listing: a decoded instruction, a word that doesn't decode, or a
/// trailing odd byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Line {
    Instruction {
        address: u16,
        opcode: Opcode,
        instruction: Instruction,
    },
    Data {
        address: u16,
        opcode: Opcode,
    },
    Byte {
        address: u16,
        byte: u8,
    },
}

impl Line {
    pub fn address(&self) -> u16 {
        match *self {
            Line::Instruction { address, .. }
            | Line::Data { address, .. }
            | Line::Byte { address, .. } => address,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Instruction {
                address,
                opcode,
                instruction,
            } => write!(f, "{:04X}  {}  {}", address, opcode, instruction),
            Line::Data { address, opcode } => {
                write!(f, "{:04X}  {}  DW {:#06X}", address, opcode, opcode.raw())
            }
            Line::Byte { address, byte } => {
                write!(f, "{:04X}  {:02X}    DB {:#04X}", address, byte, byte)
            }
        }
    }
}

/// Lists a program two bytes at a time, as it would sit in memory from `PROGRAM_START`.
///
/// Data mixed in with code is decoded like everything else; the listing doesn't follow jumps.
///
/// # Arguments
/// * `program` raw program bytes
pub fn disassemble(program: &[u8]) -> impl Iterator<Item = Line> + '_ {
    program.chunks(2).enumerate().map(|(index, chunk)| {
        let address = PROGRAM_START.wrapping_add((index * 2) as u16);
        match *chunk {
            [high, low] => {
                let opcode = Opcode::from_bytes(high, low);
                match Instruction::decode(opcode) {
                    Ok(instruction) => Line::Instruction {
                        address,
                        opcode,
                        instruction,
                    },
                    Err(_) => Line::Data { address, opcode },
                }
            }
            [byte] => Line::Byte { address, byte },
            _ => unreachable!("chunks(2) yields one or two bytes"),
        }
    })
}
