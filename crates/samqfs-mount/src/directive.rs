//! samfs.cmd style option directives.
//!
//! Accepted forms:
//!
//! * `trace`, `notrace`, `shared_reader` (bare boolean keyword)
//! * `high = 85`, `readahead = 4M`
//! * `trace = off`, `qwrite = on`
//! * `low = default` (reset)
//!
//! Text after `#` is ignored.

use core::str::FromStr;

use crate::error::{MountError, MountResult};
use crate::fields::{Field, FieldKind, OptionValue};
use crate::options::MountOptions;
use crate::units::parse_kb;

/// What a directive does to its Field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveAction {
    /// Assign a value.
    Set(OptionValue),
    /// Reset to the default.
    Reset,
}

/// A parsed directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    /// Target option.
    pub field: Field,
    /// Requested change.
    pub action: DirectiveAction,
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl FromStr for Directive {
    type Err = MountError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.split('#').next().unwrap_or("").trim();
        let (key, value) = match line.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (line, None),
        };
        let (field, implied) = Field::lookup(key).ok_or_else(|| MountError::UnknownOption {
            name: key.to_string(),
        })?;
        let invalid = |value: &str| MountError::InvalidValue {
            field,
            value: value.to_string(),
        };

        let action = match value {
            None => DirectiveAction::Set(OptionValue::Bool(implied.ok_or_else(|| invalid(""))?)),
            Some(v) if v.eq_ignore_ascii_case("default") => DirectiveAction::Reset,
            Some(v) => {
                let value = match field.kind() {
                    FieldKind::Flag | FieldKind::Toggle => {
                        let b = parse_bool(v).ok_or_else(|| invalid(v))?;
                        // `notrace = on` means trace off.
                        OptionValue::Bool(if implied == Some(false) { !b } else { b })
                    }
                    FieldKind::Size => OptionValue::Int(parse_kb(v).map_err(|_| invalid(v))?),
                    FieldKind::Integer => {
                        OptionValue::Int(v.parse::<i64>().map_err(|_| invalid(v))?)
                    }
                };
                DirectiveAction::Set(value)
            }
        };
        Ok(Directive { field, action })
    }
}

impl MountOptions {
    /// Parses and applies one directive, returning the Field it touched.
    pub fn apply_directive(&mut self, line: &str) -> MountResult<Field> {
        let directive: Directive = line.parse()?;
        match directive.action {
            DirectiveAction::Set(value) => self.set_value(directive.field, value)?,
            DirectiveAction::Reset => self.reset(directive.field),
        }
        Ok(directive.field)
    }

    /// Applies every non-blank, non-comment line. Stops at the first error;
    /// earlier lines stay applied.
    pub fn apply_directives(&mut self, text: &str) -> MountResult<Vec<Field>> {
        text.lines()
            .map(|l| l.split('#').next().unwrap_or("").trim())
            .filter(|l| !l.is_empty())
            .map(|l| self.apply_directive(l))
            .collect()
    }
}
