use crate::constants::KEY_COUNT;

/// # Keypad
/// Chip-8 input is generated with a hexadecimal keypad of 16 keys, 0..F.
///
/// The host owns the keypad and hands a fresh copy to the Chip-8 on every step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new(keys: [bool; KEY_COUNT]) -> Self {
        Keypad { keys }
    }

    /// A keypad with exactly `keys` held down; values above 0xF are ignored.
    pub fn from_keys(keys: &[u8]) -> Self {
        let mut keypad = Keypad::default();
        keys.iter().for_each(|&key| keypad.press(key));
        keypad
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was pressed
    pub fn press(&mut self, key: u8) {
        if let Some(pressed) = self.keys.get_mut(usize::from(key)) {
            *pressed = true;
        }
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was released
    pub fn release(&mut self, key: u8) {
        if let Some(pressed) = self.keys.get_mut(usize::from(key)) {
            *pressed = false;
        }
    }

    /// Registers can name keys that don't exist; those are never pressed.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys.get(usize::from(key)).copied().unwrap_or(false)
    }

    /// The lowest key currently held down.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys
            .iter()
            .position(|&pressed| pressed)
            .map(|key| key as u8)
    }
}

impl From<[bool; KEY_COUNT]> for Keypad {
    fn from(keys: [bool; KEY_COUNT]) -> Self {
        Keypad::new(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keys_ignores_illegal_keys() {
        let keypad = Keypad::from_keys(&[0x3, 0x10, 0xFF]);
        assert!(keypad.is_pressed(0x3));
        assert!(!keypad.is_pressed(0x10));
        assert_eq!(keypad, Keypad::from_keys(&[0x3]));
    }

    #[test]
    fn test_press_and_release() {
        let mut keypad = Keypad::default();
        keypad.press(0xE);
        assert!(keypad.is_pressed(0xE));
        keypad.release(0xE);
        assert!(!keypad.is_pressed(0xE));
    }

    #[test]
    fn test_first_pressed() {
        assert_eq!(Keypad::default().first_pressed(), None);
        assert_eq!(Keypad::from_keys(&[0xC, 0x5]).first_pressed(), Some(0x5));
    }
}
