//! Tri-state change registers.
//!
//! Each option group hands the apply engine one 32-bit word. The low half is
//! the set-mask: a bit there means the option carries an explicit new value.
//! The high half is the reset-mask: the same bit shifted by 16 means the
//! option must go back to its documented default.
//!
//! Boolean options with an explicit "no" form (`trace`/`notrace`) own two
//! adjacent bits. Setting either form clears both bits in both halves before
//! asserting one of them, and resetting asserts both in both halves. That is
//! what lets the engine tell "set to off" from "reset" from "untouched".

use core::fmt;
use serde::{Deserialize, Serialize};

/// Low half of a register: explicit-value bits.
pub const SET_MASK: u32 = 0x0000_FFFF;

/// High half of a register: reset-to-default bits.
pub const RESET_MASK: u32 = 0xFFFF_0000;

/// On/off state of a paired boolean option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Toggle {
    /// The positive form (`trace`, `quota`, `nosuid`).
    On,
    /// The negated form (`notrace`, `noquota`, `suid`).
    Off,
}

impl Toggle {
    /// Returns true for [`Toggle::On`].
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

impl From<bool> for Toggle {
    fn from(on: bool) -> Self {
        if on {
            Toggle::On
        } else {
            Toggle::Off
        }
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Toggle::On => write!(f, "on"),
            Toggle::Off => write!(f, "off"),
        }
    }
}

/// Bit positions owned by one option inside its group's register.
///
/// Positions are expressed in the low half; the reset bits are derived by
/// shifting left 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldBits {
    on: u16,
    off: u16,
}

impl FieldBits {
    /// An option with a single change bit.
    pub const fn single(bit: u16) -> Self {
        Self { on: bit, off: 0 }
    }

    /// A boolean option with distinct "on" and "off" change bits.
    pub const fn paired(on: u16, off: u16) -> Self {
        Self { on, off }
    }

    /// True when the option has a separate "off" bit.
    pub const fn is_paired(&self) -> bool {
        self.off != 0
    }

    /// The "on" (or only) bit.
    pub const fn on_bit(&self) -> u32 {
        self.on as u32
    }

    /// The "off" bit, zero for single-bit options.
    pub const fn off_bit(&self) -> u32 {
        self.off as u32
    }

    /// Union of the option's bits in the low half.
    pub const fn set_mask(&self) -> u32 {
        (self.on | self.off) as u32
    }

    /// The option's bits in both halves, i.e. `bits | bits << 16`.
    pub const fn clear_pattern(&self) -> u32 {
        let mask = self.set_mask();
        mask | (mask << 16)
    }

    /// True if the two options share any bit.
    pub const fn overlaps(&self, other: &FieldBits) -> bool {
        self.set_mask() & other.set_mask() != 0
    }

    fn chosen(&self, toggle: Toggle) -> u32 {
        match toggle {
            Toggle::Off if self.is_paired() => self.off_bit(),
            _ => self.on_bit(),
        }
    }
}

/// Returns the indices of the first two entries sharing a bit, if any.
pub fn first_overlap(layout: &[FieldBits]) -> Option<(usize, usize)> {
    for (i, a) in layout.iter().enumerate() {
        if a.set_mask() == 0 {
            return Some((i, i));
        }
        for (j, b) in layout.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Decoded state of one option within a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterState {
    /// Neither half carries the option's bits.
    Untouched,
    /// Explicit value. Single-bit options always decode as `Set(On)`.
    Set(Toggle),
    /// Restore the documented default; the stored value is meaningless.
    Reset,
}

/// One group's 32-bit change word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeRegister(u32);

impl ChangeRegister {
    /// An empty register: every option untouched.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Wraps a raw word received from elsewhere.
    pub const fn from_bits(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw word handed to the apply engine.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// True when no option in the group was touched.
    pub fn is_clear(&self) -> bool {
        self.0 == 0
    }

    /// The low (set) half.
    pub fn set_mask(&self) -> u16 {
        (self.0 & SET_MASK) as u16
    }

    /// The high (reset) half, shifted down.
    pub fn reset_mask(&self) -> u16 {
        ((self.0 & RESET_MASK) >> 16) as u16
    }

    /// Marks an option as explicitly set. For paired options the toggle
    /// picks which bit is asserted; single-bit options ignore it.
    pub fn set(&mut self, bits: FieldBits, toggle: Toggle) {
        self.0 = (self.0 & !bits.clear_pattern()) | bits.chosen(toggle);
    }

    /// Marks an option as reset to default. Idempotent.
    pub fn reset(&mut self, bits: FieldBits) {
        self.0 |= bits.clear_pattern();
    }

    /// Decodes the state of one option.
    pub fn state(&self, bits: FieldBits) -> RegisterState {
        let mask = bits.set_mask();
        if (self.0 >> 16) & mask != 0 {
            return RegisterState::Reset;
        }
        let low = self.0 & mask;
        if bits.is_paired() && low & bits.off_bit() != 0 {
            RegisterState::Set(Toggle::Off)
        } else if low & bits.on_bit() != 0 {
            RegisterState::Set(Toggle::On)
        } else {
            RegisterState::Untouched
        }
    }
}

impl fmt::Display for ChangeRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: FieldBits = FieldBits::paired(0x0008, 0x0010);
    const STRIPE: FieldBits = FieldBits::single(0x0020);
    const SUID: FieldBits = FieldBits::paired(0x0004, 0x0002);

    #[test]
    fn test_clear_pattern_matches_header_constants() {
        assert_eq!(TRACE.clear_pattern(), 0x0018_0018);
        assert_eq!(STRIPE.clear_pattern(), 0x0020_0020);
        assert_eq!(SUID.clear_pattern(), 0x0006_0006);
        assert_eq!(FieldBits::paired(0x4000, 0x8000).clear_pattern(), 0xC000_C000);
    }

    #[test]
    fn test_new_register_is_untouched() {
        let reg = ChangeRegister::new();
        assert!(reg.is_clear());
        assert_eq!(reg.state(TRACE), RegisterState::Untouched);
        assert_eq!(reg.state(STRIPE), RegisterState::Untouched);
    }

    #[test]
    fn test_set_single_bit() {
        let mut reg = ChangeRegister::new();
        reg.set(STRIPE, Toggle::On);
        assert_eq!(reg.bits(), 0x0000_0020);
        assert_eq!(reg.state(STRIPE), RegisterState::Set(Toggle::On));
    }

    #[test]
    fn test_single_bit_ignores_off_toggle() {
        let mut reg = ChangeRegister::new();
        reg.set(STRIPE, Toggle::Off);
        assert_eq!(reg.bits(), 0x0000_0020);
        assert_eq!(reg.state(STRIPE), RegisterState::Set(Toggle::On));
    }

    #[test]
    fn test_paired_set_on_then_off() {
        let mut reg = ChangeRegister::new();
        reg.set(TRACE, Toggle::On);
        assert_eq!(reg.bits(), 0x0000_0008);
        reg.set(TRACE, Toggle::Off);
        assert_eq!(reg.bits(), 0x0000_0010);
        assert_eq!(reg.state(TRACE), RegisterState::Set(Toggle::Off));
    }

    #[test]
    fn test_reset_sets_both_halves() {
        let mut reg = ChangeRegister::new();
        reg.set(TRACE, Toggle::On);
        reg.reset(TRACE);
        assert_eq!(reg.bits(), 0x0018_0018);
        assert_eq!(reg.state(TRACE), RegisterState::Reset);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut reg = ChangeRegister::new();
        reg.reset(STRIPE);
        let once = reg;
        reg.reset(STRIPE);
        assert_eq!(reg, once);
    }

    #[test]
    fn test_set_after_reset_clears_reset_half() {
        let mut reg = ChangeRegister::new();
        reg.reset(TRACE);
        reg.set(TRACE, Toggle::Off);
        assert_eq!(reg.reset_mask(), 0);
        assert_eq!(reg.set_mask(), 0x0010);
    }

    #[test]
    fn test_neighbours_are_not_disturbed() {
        let mut reg = ChangeRegister::new();
        reg.set(SUID, Toggle::On);
        reg.reset(STRIPE);
        reg.set(TRACE, Toggle::Off);
        reg.reset(TRACE);
        reg.set(TRACE, Toggle::On);
        assert_eq!(reg.state(SUID), RegisterState::Set(Toggle::On));
        assert_eq!(reg.state(STRIPE), RegisterState::Reset);
        assert_eq!(reg.state(TRACE), RegisterState::Set(Toggle::On));
    }

    #[test]
    fn test_first_overlap_detects_shared_bit() {
        assert_eq!(first_overlap(&[TRACE, STRIPE, SUID]), None);
        let clash = FieldBits::single(0x0010);
        assert_eq!(first_overlap(&[TRACE, STRIPE, clash]), Some((0, 2)));
    }

    #[test]
    fn test_first_overlap_rejects_empty_bits() {
        assert_eq!(first_overlap(&[FieldBits::single(0)]), Some((0, 0)));
    }

    #[test]
    fn test_toggle_from_bool() {
        assert_eq!(Toggle::from(true), Toggle::On);
        assert_eq!(Toggle::from(false), Toggle::Off);
        assert!(Toggle::On.is_on());
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(ChangeRegister::from_bits(0x0018_0018).to_string(), "0x00180018");
    }
}
