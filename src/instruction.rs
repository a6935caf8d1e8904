//! Pure encoding of the ST7032 instruction set.

use crate::{Config, InstructionSet};

const CLEAR: u8 = 1 << 0;
const HOME: u8 = 1 << 1;
const ENTRY_MODE: u8 = 1 << 2;
const DISPLAY_CONTROL: u8 = 1 << 3;
const SHIFT: u8 = 1 << 4;
const FUNCTION_SET: u8 = 1 << 5;
const CGRAM_ADDR: u8 = 1 << 6;
const DDRAM_ADDR: u8 = 1 << 7;

// entry mode
const ENTRY_INCREMENT: u8 = 1 << 1;
const ENTRY_SHIFT: u8 = 1 << 0;

// display control
const DISPLAY_ON: u8 = 1 << 2;
const CURSOR_ON: u8 = 1 << 1;
const CURSOR_BLINK: u8 = 1 << 0;

// cursor / display shift, normal instruction table only
const SHIFT_SCREEN: u8 = 1 << 3;
const SHIFT_RIGHT: u8 = 1 << 2;

// function set
const FUNC_8BIT: u8 = 1 << 4;
const FUNC_2LINE: u8 = 1 << 3;
const FUNC_EXTENDED: u8 = 1 << 0;

// extended instruction table
const OSC_FREQUENCY: u8 = 0x10;
const CONTRAST_LOW: u8 = 0x70;
const POWER_ICON_CONTRAST: u8 = 0x50;
const POWER_ICON: u8 = 1 << 3;
const POWER_BOOSTER: u8 = 1 << 2;
const FOLLOWER: u8 = 0x60;
const FOLLOWER_ON: u8 = 1 << 3;

pub(crate) const fn clear() -> u8 {
    CLEAR
}

pub(crate) const fn home() -> u8 {
    HOME
}

pub(crate) const fn entry_mode(increment: bool, shift: bool) -> u8 {
    let mut op = ENTRY_MODE;
    if increment {
        op |= ENTRY_INCREMENT;
    }
    if shift {
        op |= ENTRY_SHIFT;
    }
    op
}

pub(crate) const fn display_control(on: bool, cursor: bool, blink: bool) -> u8 {
    let mut op = DISPLAY_CONTROL;
    if on {
        op |= DISPLAY_ON;
    }
    if cursor {
        op |= CURSOR_ON;
    }
    if blink {
        op |= CURSOR_BLINK;
    }
    op
}

/// Moves the visible window (`screen`) or the cursor marker by one position.
pub(crate) const fn shift(screen: bool, right: bool) -> u8 {
    let mut op = SHIFT;
    if screen {
        op |= SHIFT_SCREEN;
    }
    if right {
        op |= SHIFT_RIGHT;
    }
    op
}

/// 8 bit interface, two lines, 5x8 font. Only the instruction table varies.
pub(crate) const fn function_set(set: InstructionSet) -> u8 {
    let op = FUNCTION_SET | FUNC_8BIT | FUNC_2LINE;
    match set {
        InstructionSet::Normal => op,
        InstructionSet::Extended => op | FUNC_EXTENDED,
    }
}

pub(crate) const fn cgram_address(addr: u8) -> u8 {
    CGRAM_ADDR | (addr & 0x3F)
}

pub(crate) const fn ddram_address(addr: u8) -> u8 {
    DDRAM_ADDR | addr
}

pub(crate) const fn osc_frequency(frequency: u8) -> u8 {
    OSC_FREQUENCY | (frequency & 0x07)
}

/// Low nibble of the 6 bit contrast.
pub(crate) const fn contrast_low(contrast: u8) -> u8 {
    CONTRAST_LOW | (contrast & 0x0F)
}

/// Icon and booster switches together with the two high contrast bits.
pub(crate) const fn power_icon_contrast(contrast: u8, icon: bool, booster: bool) -> u8 {
    let mut op = POWER_ICON_CONTRAST | ((contrast >> 4) & 0x03);
    if icon {
        op |= POWER_ICON;
    }
    if booster {
        op |= POWER_BOOSTER;
    }
    op
}

pub(crate) const fn follower(ratio: u8) -> u8 {
    FOLLOWER | FOLLOWER_ON | (ratio & 0x07)
}

/// Instructions following the two function-set writes, sent as one batch.
pub(crate) fn power_on_sequence(config: &Config) -> [u8; 7] {
    [
        osc_frequency(config.osc_frequency),
        contrast_low(config.contrast),
        power_icon_contrast(config.contrast, config.icon, config.booster),
        follower(config.follower_ratio),
        display_control(true, false, false),
        clear(),
        entry_mode(true, false),
    ]
}

/// Status byte read back from the controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Busy flag, bit 7.
    pub fn is_busy(self) -> bool {
        self.0 & 0x80 != 0
    }

    /// Current DDRAM or CGRAM address counter.
    pub fn address(self) -> u8 {
        self.0 & 0x7F
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOLS: [bool; 2] = [false, true];

    #[test]
    fn display_control_bits() {
        for &on in BOOLS.iter() {
            for &cursor in BOOLS.iter() {
                for &blink in BOOLS.iter() {
                    let op = display_control(on, cursor, blink);
                    assert_eq!(op & 0xF8, DISPLAY_CONTROL);
                    assert_eq!(op & 0x04 != 0, on);
                    assert_eq!(op & 0x02 != 0, cursor);
                    assert_eq!(op & 0x01 != 0, blink);
                }
            }
        }
    }

    #[test]
    fn entry_mode_bits() {
        for &inc in BOOLS.iter() {
            for &shift in BOOLS.iter() {
                let op = entry_mode(inc, shift);
                assert_eq!(op & 0xFC, ENTRY_MODE);
                assert_eq!(op & 0x02 != 0, inc);
                assert_eq!(op & 0x01 != 0, shift);
            }
        }
        assert_eq!(entry_mode(true, false), 0x06);
    }

    #[test]
    fn screen_shift_differs_only_in_direction() {
        let right = shift(true, true);
        let left = shift(true, false);
        assert_eq!(right ^ left, 0x04);
        assert_eq!(left, 0x18);
        assert_eq!(shift(false, true), 0x14);
        assert_eq!(shift(false, false), 0x10);
    }

    #[test]
    fn function_set_tables() {
        assert_eq!(function_set(InstructionSet::Normal), 0x38);
        assert_eq!(function_set(InstructionSet::Extended), 0x39);
    }

    #[test]
    fn contrast_is_split_over_two_instructions() {
        assert_eq!(contrast_low(0x2A), 0x7A);
        assert_eq!(power_icon_contrast(0x2A, false, false), 0x52);
        assert_eq!(power_icon_contrast(0x3F, true, true), 0x5F);
    }

    #[test]
    fn addresses() {
        assert_eq!(ddram_address(0x40), 0xC0);
        assert_eq!(ddram_address(0x00), 0x80);
        assert_eq!(cgram_address(0x3F), 0x7F);
    }

    #[test]
    fn status_decoding() {
        let status = Status(0xC5);
        assert!(status.is_busy());
        assert_eq!(status.address(), 0x45);

        let status = Status(0x7F);
        assert!(!status.is_busy());
        assert_eq!(status.address(), 0x7F);
    }
}
