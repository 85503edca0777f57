//! Kilobyte magnitudes and their human display units.
//!
//! Size options are stored in kilobytes. For display they are re-expressed
//! in the largest power-of-1024 unit that divides them evenly, so `4096` is
//! shown as `4M` and `1536` stays `1536K`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Legacy marker for "no magnitude". Accepted on input; never produced.
pub const UNSET_MAGNITUDE: i64 = i64::MIN;

/// Display unit. Every unit is 1024 times the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeUnit {
    /// Kilobytes, the base unit.
    Kb,
    /// Megabytes.
    Mb,
    /// Gigabytes.
    Gb,
    /// Terabytes.
    Tb,
    /// Petabytes.
    Pb,
}

impl SizeUnit {
    /// All units, smallest first.
    pub const ALL: [SizeUnit; 5] = [SizeUnit::Kb, SizeUnit::Mb, SizeUnit::Gb, SizeUnit::Tb, SizeUnit::Pb];

    /// Number of kilobytes in one of this unit.
    pub const fn factor(self) -> i64 {
        match self {
            SizeUnit::Kb => 1,
            SizeUnit::Mb => 1 << 10,
            SizeUnit::Gb => 1 << 20,
            SizeUnit::Tb => 1 << 30,
            SizeUnit::Pb => 1 << 40,
        }
    }

    /// One-letter suffix used in samfs.cmd values.
    pub fn suffix(self) -> &'static str {
        match self {
            SizeUnit::Kb => "K",
            SizeUnit::Mb => "M",
            SizeUnit::Gb => "G",
            SizeUnit::Tb => "T",
            SizeUnit::Pb => "P",
        }
    }

    /// Long name (`KB`, `MB`, ...).
    pub fn name(self) -> &'static str {
        match self {
            SizeUnit::Kb => "KB",
            SizeUnit::Mb => "MB",
            SizeUnit::Gb => "GB",
            SizeUnit::Tb => "TB",
            SizeUnit::Pb => "PB",
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SizeUnit {
    type Err = SizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "K" | "KB" => Ok(SizeUnit::Kb),
            "M" | "MB" => Ok(SizeUnit::Mb),
            "G" | "GB" => Ok(SizeUnit::Gb),
            "T" | "TB" => Ok(SizeUnit::Tb),
            "P" | "PB" => Ok(SizeUnit::Pb),
            other => Err(SizeParseError::Unit(other.to_string())),
        }
    }
}

/// Failure to parse a size string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeParseError {
    /// Nothing to parse.
    #[error("empty size")]
    Empty,
    /// The numeric part is missing, negative or malformed.
    #[error("invalid magnitude: {0}")]
    Magnitude(String),
    /// The suffix is not a known unit.
    #[error("unknown size unit: {0}")]
    Unit(String),
    /// The value does not fit in kilobytes.
    #[error("size overflows: {0}")]
    Overflow(String),
}

fn is_unset(kb: i64) -> bool {
    kb <= 0 || kb == UNSET_MAGNITUDE
}

/// Largest unit that divides `kb` evenly. `None` for zero, negative, or
/// unset magnitudes.
pub fn best_fit(kb: i64) -> Option<SizeUnit> {
    if is_unset(kb) {
        return None;
    }
    SizeUnit::ALL
        .iter()
        .rev()
        .copied()
        .find(|unit| kb % unit.factor() == 0)
}

/// Re-expresses `kb` in `unit`. `None` when the result is not integral.
pub fn in_unit(kb: i64, unit: SizeUnit) -> Option<i64> {
    if kb == UNSET_MAGNITUDE || kb % unit.factor() != 0 {
        return None;
    }
    Some(kb / unit.factor())
}

/// Converts `value` from one unit to another. `None` on overflow or when
/// the result is not integral.
pub fn convert(value: i64, from: SizeUnit, to: SizeUnit) -> Option<i64> {
    let kb = value.checked_mul(from.factor())?;
    in_unit(kb, to)
}

/// Parses `"4M"`, `"16k"`, `"2 GB"` or a bare kilobyte count.
pub fn parse_kb(text: &str) -> Result<i64, SizeParseError> {
    let size: DisplaySize = text.parse()?;
    size.to_kb()
        .ok_or_else(|| SizeParseError::Overflow(text.trim().to_string()))
}

/// A magnitude paired with its display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySize {
    /// Count of `unit`.
    pub magnitude: i64,
    /// Display unit.
    pub unit: SizeUnit,
}

impl DisplaySize {
    /// `kb` in its best-fit unit.
    pub fn best_fit(kb: i64) -> Option<Self> {
        let unit = best_fit(kb)?;
        Some(Self {
            magnitude: kb / unit.factor(),
            unit,
        })
    }

    /// Back to kilobytes; `None` on overflow.
    pub fn to_kb(&self) -> Option<i64> {
        self.magnitude.checked_mul(self.unit.factor())
    }
}

impl fmt::Display for DisplaySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

impl FromStr for DisplaySize {
    type Err = SizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SizeParseError::Empty);
        }
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, suffix) = s.split_at(split);
        if digits.is_empty() {
            return Err(SizeParseError::Magnitude(s.to_string()));
        }
        let magnitude = digits
            .parse::<i64>()
            .map_err(|_| SizeParseError::Overflow(s.to_string()))?;
        let unit = suffix.parse()?;
        Ok(Self { magnitude, unit })
    }
}

/// A size option's value kept as a consistent (magnitude, unit) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedField {
    kb: Option<i64>,
    unit: SizeUnit,
}

impl SizedField {
    /// Wraps a kilobyte value, picking the best unit. Unset magnitudes give
    /// an empty field shown in kilobytes.
    pub fn new(kb: i64) -> Self {
        match best_fit(kb) {
            Some(unit) => Self { kb: Some(kb), unit },
            None if kb == 0 => Self {
                kb: Some(0),
                unit: SizeUnit::Kb,
            },
            None => Self {
                kb: None,
                unit: SizeUnit::Kb,
            },
        }
    }

    /// Value in kilobytes.
    pub fn kilobytes(&self) -> Option<i64> {
        self.kb
    }

    /// Value in the current unit.
    pub fn magnitude(&self) -> Option<i64> {
        self.kb.and_then(|kb| in_unit(kb, self.unit))
    }

    /// Current unit.
    pub fn unit(&self) -> SizeUnit {
        self.unit
    }

    /// Assigns a magnitude in the current unit, then moves to the best unit
    /// for the new value. Negative, unset, or overflowing input is ignored.
    pub fn set_magnitude(&mut self, magnitude: i64) {
        if magnitude < 0 {
            return;
        }
        if let Some(kb) = magnitude.checked_mul(self.unit.factor()) {
            self.set_kilobytes(kb);
        }
    }

    /// Assigns a kilobyte value and picks its best unit, as [`new`](Self::new)
    /// does. Negative or unset input is ignored.
    pub fn set_kilobytes(&mut self, kb: i64) {
        if kb < 0 {
            return;
        }
        *self = Self::new(kb);
    }

    /// Changes the display unit, keeping the kilobyte value. Ignored when the
    /// value is not a whole number of the new unit.
    pub fn set_unit(&mut self, unit: SizeUnit) {
        match self.kb {
            None => self.unit = unit,
            Some(kb) if in_unit(kb, unit).is_some() => self.unit = unit,
            Some(_) => {}
        }
    }

    /// Display form, if a magnitude is present.
    pub fn display(&self) -> Option<DisplaySize> {
        Some(DisplaySize {
            magnitude: self.magnitude()?,
            unit: self.unit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_fit_examples() {
        assert_eq!(best_fit(1), Some(SizeUnit::Kb));
        assert_eq!(best_fit(1536), Some(SizeUnit::Kb));
        assert_eq!(best_fit(4096), Some(SizeUnit::Mb));
        assert_eq!(best_fit(1 << 20), Some(SizeUnit::Gb));
        assert_eq!(best_fit(3 << 30), Some(SizeUnit::Tb));
        assert_eq!(best_fit(1 << 50), Some(SizeUnit::Pb));
    }

    #[test]
    fn test_best_fit_unset() {
        assert_eq!(best_fit(0), None);
        assert_eq!(best_fit(-5), None);
        assert_eq!(best_fit(UNSET_MAGNITUDE), None);
    }

    #[test]
    fn test_in_unit() {
        assert_eq!(in_unit(4096, SizeUnit::Mb), Some(4));
        assert_eq!(in_unit(4096, SizeUnit::Gb), None);
        assert_eq!(in_unit(UNSET_MAGNITUDE, SizeUnit::Kb), None);
        assert_eq!(in_unit(0, SizeUnit::Tb), Some(0));
    }

    #[test]
    fn test_convert() {
        assert_eq!(convert(2, SizeUnit::Gb, SizeUnit::Mb), Some(2048));
        assert_eq!(convert(1536, SizeUnit::Mb, SizeUnit::Gb), None);
        assert_eq!(convert(i64::MAX, SizeUnit::Pb, SizeUnit::Kb), None);
    }

    #[test]
    fn test_display_size_format() {
        assert_eq!(DisplaySize::best_fit(4096).unwrap().to_string(), "4M");
        assert_eq!(DisplaySize::best_fit(1536).unwrap().to_string(), "1536K");
        assert!(DisplaySize::best_fit(0).is_none());
    }

    #[test]
    fn test_parse_sizes() {
        assert_eq!(parse_kb("4M"), Ok(4096));
        assert_eq!(parse_kb("16k"), Ok(16));
        assert_eq!(parse_kb("2 GB"), Ok(2 << 20));
        assert_eq!(parse_kb("512"), Ok(512));
        assert_eq!(parse_kb(" 1t "), Ok(1 << 30));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_kb(""), Err(SizeParseError::Empty));
        assert!(matches!(parse_kb("M"), Err(SizeParseError::Magnitude(_))));
        assert!(matches!(parse_kb("-4M"), Err(SizeParseError::Magnitude(_))));
        assert!(matches!(parse_kb("4X"), Err(SizeParseError::Unit(_))));
        assert!(matches!(parse_kb("9999999999P"), Err(SizeParseError::Overflow(_))));
    }

    #[test]
    fn test_sized_field_new() {
        let f = SizedField::new(4096);
        assert_eq!(f.unit(), SizeUnit::Mb);
        assert_eq!(f.magnitude(), Some(4));
        let unset = SizedField::new(UNSET_MAGNITUDE);
        assert_eq!(unset.kilobytes(), None);
        assert_eq!(unset.display(), None);
    }

    #[test]
    fn test_sized_field_set_unit_reexpresses() {
        let mut f = SizedField::new(4096);
        f.set_unit(SizeUnit::Kb);
        assert_eq!(f.magnitude(), Some(4096));
        assert_eq!(f.kilobytes(), Some(4096));
    }

    #[test]
    fn test_sized_field_set_unit_rejects_inexact() {
        let mut f = SizedField::new(1536);
        f.set_unit(SizeUnit::Mb);
        assert_eq!(f.unit(), SizeUnit::Kb);
        assert_eq!(f.magnitude(), Some(1536));
    }

    #[test]
    fn test_sized_field_set_magnitude() {
        let mut f = SizedField::new(4096);
        f.set_magnitude(16);
        assert_eq!(f.kilobytes(), Some(16 * 1024));
        assert_eq!(f.unit(), SizeUnit::Mb);
        f.set_magnitude(-1);
        assert_eq!(f.kilobytes(), Some(16 * 1024));
        f.set_magnitude(UNSET_MAGNITUDE);
        assert_eq!(f.kilobytes(), Some(16 * 1024));
    }

    #[test]
    fn test_sized_field_magnitude_change_regroups_unit() {
        let mut f = SizedField::new(1536);
        assert_eq!(f.unit(), SizeUnit::Kb);
        f.set_magnitude(2048);
        assert_eq!(f.unit(), SizeUnit::Mb);
        assert_eq!(f.display().unwrap().to_string(), "2M");

        let mut f = SizedField::new(4096);
        f.set_magnitude(1024);
        assert_eq!(f.unit(), SizeUnit::Gb);
        assert_eq!(f.magnitude(), Some(1));
    }

    #[test]
    fn test_sized_field_set_kilobytes() {
        let mut f = SizedField::new(4096);
        f.set_kilobytes(1536);
        assert_eq!(f.unit(), SizeUnit::Kb);
        assert_eq!(f.magnitude(), Some(1536));
        f.set_kilobytes(0);
        assert_eq!(f.display().unwrap().to_string(), "0K");
        f.set_kilobytes(-1);
        assert_eq!(f.kilobytes(), Some(0));
    }

    #[test]
    fn test_sized_field_overflow_is_ignored() {
        let mut f = SizedField::new(1 << 40);
        assert_eq!(f.unit(), SizeUnit::Pb);
        f.set_magnitude(i64::MAX);
        assert_eq!(f.kilobytes(), Some(1 << 40));
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!("mb".parse::<SizeUnit>(), Ok(SizeUnit::Mb));
        assert_eq!("".parse::<SizeUnit>(), Ok(SizeUnit::Kb));
        assert!("XB".parse::<SizeUnit>().is_err());
    }
}
