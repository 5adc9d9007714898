use std::fmt;
use std::str::FromStr;

use thiserror::Error;

bitflags::bitflags! {
    /// Material and render properties of a cell.
    ///
    /// Bits this type doesn't name are kept as-is, so a record written by a newer editor survives
    /// a load/save cycle unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellFlags: i32 {
        const SOLID = 1;
        const TRANSPARENT = 1 << 1;
        const DYNAMIC = 1 << 2;
        const DO_NOT_RENDER = 1 << 3;
        const LIQUID = 1 << 4;
        const VISCOUS = 1 << 5;
        const MULTI_SIDED = 1 << 6;
        const UV_TURB = 1 << 7;
        const WAVING = 1 << 8;
        const DOUBLE_SIDED = 1 << 9;
        const PICKABLE = 1 << 10;
        const ON_USE_REPLACE = 1 << 11;
        const LADDER = 1 << 12;

        // Anything else a writer sets
        const _ = !0;
    }
}

impl Default for CellFlags {
    fn default() -> Self {
        Self::SOLID
    }
}

impl CellFlags {
    /// Bits set that have no name here.
    pub fn unknown_bits(&self) -> i32 {
        let named = <Self as bitflags::Flags>::FLAGS
            .iter()
            .filter(|f| f.is_named())
            .fold(0, |acc, f| acc | f.value().bits());

        self.bits() & !named
    }
}

/// How new flags combine with the ones a cell already has.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FlagsEdit {
    #[default]
    Replace,
    Add,
    Remove,
}

impl FlagsEdit {
    pub fn apply(self, current: CellFlags, flags: CellFlags) -> CellFlags {
        match self {
            FlagsEdit::Replace => flags,
            FlagsEdit::Add => current | flags,
            FlagsEdit::Remove => current - flags,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagsParseError {
    #[error("Empty flag between '|'")]
    EmptyFlag,

    #[error("Invalid hex flag \"{got}\"")]
    InvalidHex { got: String },

    #[error("Unknown flag \"{got}\"")]
    UnknownName { got: String },
}

/// Formats as `SOLID | LIQUID`, with unnamed bits as a trailing hex literal.
///
/// The hex literal is the unsigned 32 bit pattern, so the sign bit prints as `0x80000000`.
impl fmt::Display for CellFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }

        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }

        let unknown = self.unknown_bits();
        if unknown != 0 {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{:#x}", unknown as u32)?;
        }

        Ok(())
    }
}

impl FromStr for CellFlags {
    type Err = FlagsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "(none)" {
            return Ok(Self::empty());
        }

        let mut flags = Self::empty();
        for token in s.split('|').map(str::trim) {
            if token.is_empty() {
                return Err(FlagsParseError::EmptyFlag);
            }

            let flag = if let Some(hex) = token.strip_prefix("0x").or(token.strip_prefix("0X")) {
                let Ok(bits) = u32::from_str_radix(hex, 16) else {
                    return Err(FlagsParseError::InvalidHex {
                        got: token.to_string(),
                    });
                };

                Self::from_bits_retain(bits as i32)
            } else {
                let Some(flag) = Self::from_name(token) else {
                    return Err(FlagsParseError::UnknownName {
                        got: token.to_string(),
                    });
                };

                flag
            };

            flags |= flag;
        }

        Ok(flags)
    }
}
