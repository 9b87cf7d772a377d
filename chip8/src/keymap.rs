use anyhow::{bail, Result};

use emu8::Keypad;

/// # Keymap
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// This original layout is mapped to the left 4 alphanumeric columns.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
pub fn keymap(key: char) -> Option<u8> {
    match key.to_ascii_uppercase() {
        'X' => Some(0x0),
        '1' => Some(0x1),
        '2' => Some(0x2),
        '3' => Some(0x3),
        'Q' => Some(0x4),
        'W' => Some(0x5),
        'E' => Some(0x6),
        'A' => Some(0x7),
        'S' => Some(0x8),
        'D' => Some(0x9),
        'Z' => Some(0xA),
        'C' => Some(0xB),
        '4' => Some(0xC),
        'R' => Some(0xD),
        'F' => Some(0xE),
        'V' => Some(0xF),
        _ => None,
    }
}

/// Builds the keypad held down for a whole run from a string of keyboard characters.
pub fn parse_keys(keys: &str) -> Result<Keypad> {
    let mut keypad = Keypad::default();
    for key in keys.chars() {
        match keymap(key) {
            Some(kc) => keypad.press(kc),
            None => bail!("{:?} is not mapped to a Chip-8 key", key),
        }
    }
    Ok(keypad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_layout() {
        let layout = "1234QWERASDFZXCV";
        let keys: Vec<u8> = layout.chars().filter_map(keymap).collect();
        assert_eq!(
            keys,
            [0x1, 0x2, 0x3, 0xC, 0x4, 0x5, 0x6, 0xD, 0x7, 0x8, 0x9, 0xE, 0xA, 0x0, 0xB, 0xF]
        );
    }

    #[test]
    fn test_keymap_ignores_case() {
        assert_eq!(keymap('v'), Some(0xF));
        assert_eq!(keymap('5'), None);
    }

    #[test]
    fn test_parse_keys() {
        let keypad = parse_keys("qV").unwrap();
        assert!(keypad.is_pressed(0x4));
        assert!(keypad.is_pressed(0xF));
        assert_eq!(keypad.first_pressed(), Some(0x4));
        assert!(parse_keys("").unwrap().first_pressed().is_none());
    }

    #[test]
    fn test_parse_keys_rejects_unmapped() {
        assert!(parse_keys("q!").is_err());
    }
}
