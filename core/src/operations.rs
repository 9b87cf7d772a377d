use rand::{Rng, RngCore};

use crate::constants::{FLAG_REGISTER, FONT_SPRITE_SIZE};
use crate::error::{Error, Result};
use crate::instruction::Instruction;
use crate::keypad::Keypad;
use crate::quirks::Quirks;
use crate::state::{check_address, memory_range, State};

const VF: usize = FLAG_REGISTER;

/// Everything besides the state that an instruction may consult while it executes.
pub struct Context<'a> {
    pub keypad: &'a Keypad,
    pub quirks: Quirks,
    pub rng: &'a mut dyn RngCore,
}

/// Applies a decoded instruction to a state whose pc already points past it.
pub fn execute(instruction: Instruction, state: &State, context: &mut Context) -> Result<State> {
    use Instruction::*;

    let quirks = context.quirks;
    let state = match instruction {
        Sys { addr } => {
            return Err(Error::UnimplementedOpcode { opcode: addr });
        }
        Clear => clr(state),
        Return => rts(state)?,
        Jump { addr } => jump(state, addr),
        Call { addr } => call(state, addr)?,
        SkipEqualByte { x, kk } => ske(state, x, kk),
        SkipNotEqualByte { x, kk } => skne(state, x, kk),
        SkipEqualRegister { x, y } => skre(state, x, y),
        LoadByte { x, kk } => load(state, x, kk),
        AddByte { x, kk } => add(state, x, kk),
        Move { x, y } => mv(state, x, y),
        Or { x, y } => or(state, x, y),
        And { x, y } => and(state, x, y),
        Xor { x, y } => xor(state, x, y),
        AddRegister { x, y } => addr(state, x, y),
        Sub { x, y } => sub(state, x, y),
        ShiftRight { x, y } => shr(state, x, y, quirks),
        SubNegated { x, y } => subn(state, x, y),
        ShiftLeft { x, y } => shl(state, x, y, quirks),
        SkipNotEqualRegister { x, y } => skrne(state, x, y),
        LoadIndex { addr } => loadi(state, addr),
        JumpOffset { addr } => jumpi(state, addr)?,
        Random { x, kk } => rnd(state, x, kk, context.rng.gen()),
        Draw { x, y, n } => draw(state, x, y, n, quirks)?,
        SkipPressed { x } => skpr(state, x, context.keypad),
        SkipNotPressed { x } => skup(state, x, context.keypad),
        LoadDelay { x } => moved(state, x),
        WaitKey { x } => keyd(state, x, context.keypad),
        SetDelay { x } => loads(state, x),
        SetSound { x } => ld(state, x),
        AddIndex { x } => addi(state, x),
        LoadFont { x } => ldspr(state, x),
        StoreBcd { x } => bcd(state, x)?,
        StoreRegisters { x } => stor(state, x)?,
        LoadRegisters { x } => read(state, x)?,
    };
    Ok(state)
}

/// Skips the next instruction when `condition` holds
fn skip_if(state: &State, condition: bool) -> State {
    if condition {
        State {
            pc: state.pc + 0x2,
            ..*state
        }
    } else {
        *state
    }
}

/// Writes `result` to Vx and then `flag` to VF, so the flag wins when x is F
fn with_flag(state: &State, x: usize, result: u8, flag: bool) -> State {
    let mut v = state.v;
    v[x] = result;
    v[VF] = u8::from(flag);
    State { v, ..*state }
}

/// clear
pub fn clr(state: &State) -> State {
    let mut frame_buffer = state.frame_buffer;
    frame_buffer.clear();
    State {
        frame_buffer,
        draw_flag: true,
        ..*state
    }
}

/// PC = STACK.pop()
pub fn rts(state: &State) -> Result<State> {
    let mut stack = state.stack;
    let pc = stack.pop()?;
    Ok(State { pc, stack, ..*state })
}

/// PC = addr
pub fn jump(state: &State, addr: u16) -> State {
    State { pc: addr, ..*state }
}

/// STACK.push(PC); PC = addr
pub fn call(state: &State, addr: u16) -> Result<State> {
    let mut stack = state.stack;
    stack.push(state.pc)?;
    Ok(State {
        pc: addr,
        stack,
        ..*state
    })
}

/// if Vx == kk then pc += 2
pub fn ske(state: &State, x: usize, kk: u8) -> State {
    skip_if(state, state.v[x] == kk)
}

/// if Vx != kk then pc += 2
pub fn skne(state: &State, x: usize, kk: u8) -> State {
    skip_if(state, state.v[x] != kk)
}

/// if Vx == Vy then pc += 2
pub fn skre(state: &State, x: usize, y: usize) -> State {
    skip_if(state, state.v[x] == state.v[y])
}

/// Vx = kk
pub fn load(state: &State, x: usize, kk: u8) -> State {
    let mut v = state.v;
    v[x] = kk;
    State { v, ..*state }
}

/// Vx += kk
/// Overflow wraps and VF is left alone
pub fn add(state: &State, x: usize, kk: u8) -> State {
    let mut v = state.v;
    v[x] = v[x].wrapping_add(kk);
    State { v, ..*state }
}

/// Vx = Vy
pub fn mv(state: &State, x: usize, y: usize) -> State {
    let mut v = state.v;
    v[x] = v[y];
    State { v, ..*state }
}

/// Vx |= Vy
pub fn or(state: &State, x: usize, y: usize) -> State {
    let mut v = state.v;
    v[x] |= v[y];
    State { v, ..*state }
}

/// Vx &= Vy
pub fn and(state: &State, x: usize, y: usize) -> State {
    let mut v = state.v;
    v[x] &= v[y];
    State { v, ..*state }
}

/// Vx ^= Vy
pub fn xor(state: &State, x: usize, y: usize) -> State {
    let mut v = state.v;
    v[x] ^= v[y];
    State { v, ..*state }
}

/// Vx += Vy; VF = overflow
pub fn addr(state: &State, x: usize, y: usize) -> State {
    let (res, over) = state.v[x].overflowing_add(state.v[y]);
    with_flag(state, x, res, over)
}

/// Vx -= Vy; VF = !underflow
pub fn sub(state: &State, x: usize, y: usize) -> State {
    let (res, under) = state.v[x].overflowing_sub(state.v[y]);
    with_flag(state, x, res, !under)
}

/// Vx >>= 1; VF = the bit shifted out
pub fn shr(state: &State, x: usize, y: usize, quirks: Quirks) -> State {
    let source = if quirks.shift_uses_vy {
        state.v[y]
    } else {
        state.v[x]
    };
    with_flag(state, x, source >> 1, source & 0x1 == 0x1)
}

/// Vx = Vy - Vx; VF = !underflow
pub fn subn(state: &State, x: usize, y: usize) -> State {
    let (res, under) = state.v[y].overflowing_sub(state.v[x]);
    with_flag(state, x, res, !under)
}

/// Vx <<= 1; VF = the bit shifted out
pub fn shl(state: &State, x: usize, y: usize, quirks: Quirks) -> State {
    let source = if quirks.shift_uses_vy {
        state.v[y]
    } else {
        state.v[x]
    };
    with_flag(state, x, source << 1, source & 0x80 == 0x80)
}

/// if Vx != Vy then pc +=2
pub fn skrne(state: &State, x: usize, y: usize) -> State {
    skip_if(state, state.v[x] != state.v[y])
}

/// I = addr
pub fn loadi(state: &State, addr: u16) -> State {
    State { i: addr, ..*state }
}

/// PC = V0 + addr
pub fn jumpi(state: &State, addr: u16) -> Result<State> {
    let pc = check_address(u16::from(state.v[0x0]) + addr)?;
    Ok(State { pc, ..*state })
}

/// Vx = random_byte & kk
pub fn rnd(state: &State, x: usize, kk: u8, random_byte: u8) -> State {
    let mut v = state.v;
    v[x] = random_byte & kk;
    State { v, ..*state }
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite in memory I..I+n onto the FrameBuffer at position Vx, Vy.
/// Sets VF if any pixels were erased
pub fn draw(state: &State, x: usize, y: usize, n: u8, quirks: Quirks) -> Result<State> {
    let sprite = state.read_memory(state.i, usize::from(n))?;
    let mut frame_buffer = state.frame_buffer;
    let collided = frame_buffer.blit(
        usize::from(state.v[x]),
        usize::from(state.v[y]),
        sprite,
        quirks.wrap_sprites,
    );

    let mut v = state.v;
    v[VF] = u8::from(collided);
    Ok(State {
        v,
        frame_buffer,
        draw_flag: true,
        ..*state
    })
}

/// if Vx.pressed then pc += 2
pub fn skpr(state: &State, x: usize, keypad: &Keypad) -> State {
    skip_if(state, keypad.is_pressed(state.v[x]))
}

/// if !Vx.pressed then pc += 2
pub fn skup(state: &State, x: usize, keypad: &Keypad) -> State {
    skip_if(state, !keypad.is_pressed(state.v[x]))
}

/// Vx = DT
pub fn moved(state: &State, x: usize) -> State {
    let mut v = state.v;
    v[x] = state.delay_timer;
    State { v, ..*state }
}

/// Vx = key
/// With no key down the pc is rewound onto this instruction and the state waits for one
pub fn keyd(state: &State, x: usize, keypad: &Keypad) -> State {
    match keypad.first_pressed() {
        Some(key) => load(state, x, key),
        None => State {
            pc: state.pc - 0x2,
            register_needing_key: Some(x),
            ..*state
        },
    }
}

/// DT = Vx
pub fn loads(state: &State, x: usize) -> State {
    State {
        delay_timer: state.v[x],
        ..*state
    }
}

/// ST = Vx
pub fn ld(state: &State, x: usize) -> State {
    State {
        sound_timer: state.v[x],
        ..*state
    }
}

/// I += Vx
pub fn addi(state: &State, x: usize) -> State {
    State {
        i: (state.i + u16::from(state.v[x])) & 0x0FFF,
        ..*state
    }
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for digit Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(state: &State, x: usize) -> State {
    State {
        i: u16::from(state.v[x]) * FONT_SPRITE_SIZE,
        ..*state
    }
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(state: &State, x: usize) -> Result<State> {
    let value = state.v[x];
    let digits = [value / 100, value / 10 % 10, value % 10];
    let mut memory = state.memory;
    memory[memory_range(state.i, digits.len())?].copy_from_slice(&digits);
    Ok(State { memory, ..*state })
}

/// mem[I..=I+x] = V0..=Vx
pub fn stor(state: &State, x: usize) -> Result<State> {
    let mut memory = state.memory;
    memory[memory_range(state.i, x + 1)?].copy_from_slice(&state.v[..=x]);
    Ok(State { memory, ..*state })
}

/// V0..=Vx = mem[I..=I+x]
pub fn read(state: &State, x: usize) -> Result<State> {
    let mut v = state.v;
    v[..=x].copy_from_slice(state.read_memory(state.i, x + 1)?);
    Ok(State { v, ..*state })
}
