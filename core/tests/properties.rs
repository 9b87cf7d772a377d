use emu8::{Chip8, Keypad};
use proptest::prelude::*;

/// Loads `ops`, presets V0..=VE and runs one step per op
fn run(registers: &[u8], ops: &[u16]) -> Chip8 {
    let mut program: Vec<u8> = Vec::new();
    for (x, &value) in registers.iter().enumerate() {
        program.extend_from_slice(&[0x60 | x as u8, value]);
    }
    for op in ops {
        program.extend_from_slice(&op.to_be_bytes());
    }
    let mut chip8 = Chip8::load(&program).unwrap();
    for _ in 0..registers.len() + ops.len() {
        chip8.step(Keypad::default()).unwrap();
    }
    chip8
}

proptest! {
    #[test]
    fn add_wraps_and_flags_carry(a in any::<u8>(), b in any::<u8>()) {
        let chip8 = run(&[a, b], &[0x8014]);
        let sum = u16::from(a) + u16::from(b);
        prop_assert_eq!(chip8.state().v[0x0], (sum % 256) as u8);
        prop_assert_eq!(chip8.state().v[0xF], u8::from(sum > 255));
    }

    #[test]
    fn sub_wraps_and_flags_no_borrow(a in any::<u8>(), b in any::<u8>()) {
        let chip8 = run(&[a, b], &[0x8015]);
        prop_assert_eq!(chip8.state().v[0x0], a.wrapping_sub(b));
        prop_assert_eq!(chip8.state().v[0xF], u8::from(a >= b));
    }

    #[test]
    fn subn_wraps_and_flags_no_borrow(a in any::<u8>(), b in any::<u8>()) {
        let chip8 = run(&[a, b], &[0x8017]);
        prop_assert_eq!(chip8.state().v[0x0], b.wrapping_sub(a));
        prop_assert_eq!(chip8.state().v[0xF], u8::from(b >= a));
    }

    #[test]
    fn shifts_flag_the_bit_shifted_out(a in any::<u8>()) {
        let chip8 = run(&[a], &[0x8006]);
        prop_assert_eq!(chip8.state().v[0x0], a >> 1);
        prop_assert_eq!(chip8.state().v[0xF], a & 0x1);

        let chip8 = run(&[a], &[0x800E]);
        prop_assert_eq!(chip8.state().v[0x0], a << 1);
        prop_assert_eq!(chip8.state().v[0xF], a >> 7);
    }

    #[test]
    fn bcd_digits_rebuild_the_value(a in any::<u8>()) {
        // LD I, 0x400; LD B, V0
        let chip8 = run(&[a], &[0xA400, 0xF033]);
        let digits = &chip8.state().memory[0x400..0x403];
        let value = u16::from(digits[0]) * 100 + u16::from(digits[1]) * 10 + u16::from(digits[2]);
        prop_assert!(digits.iter().all(|&digit| digit < 10));
        prop_assert_eq!(value, u16::from(a));
    }

    #[test]
    fn store_then_load_round_trips(
        registers in proptest::collection::vec(any::<u8>(), 15),
        x in 0usize..15,
    ) {
        // LD I, 0x400; LD [I], Vx; then reload into freshly cleared registers
        let mut ops = vec![0xA400, 0xF055 | ((x as u16) << 8)];
        ops.extend((0..=x as u16).map(|r| 0x6000 | (r << 8)));
        ops.push(0xF065 | ((x as u16) << 8));
        let chip8 = run(&registers, &ops);
        prop_assert_eq!(&chip8.state().v[..=x], &registers[..=x]);
    }
}
