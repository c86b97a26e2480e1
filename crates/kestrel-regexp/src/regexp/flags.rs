//! RegExp flag bits
//!
//! The bit layout is shared with the compiled program header, which the
//! fast replace path reads directly.

use std::fmt;

use crate::error::{VmError, VmResult};
use crate::string::JsString;

/// Parsed RegExp flags
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegExpFlags(u32);

impl RegExpFlags {
    pub const GLOBAL: u32 = 1 << 0;
    pub const IGNORE_CASE: u32 = 1 << 1;
    pub const MULTILINE: u32 = 1 << 2;
    pub const DOT_ALL: u32 = 1 << 3;
    pub const UNICODE: u32 = 1 << 4;
    pub const STICKY: u32 = 1 << 5;

    const ALL: u32 = 0x3F;

    /// Flag letters in canonical output order, paired with their bit
    const ORDER: [(char, u32); 6] = [
        ('g', Self::GLOBAL),
        ('i', Self::IGNORE_CASE),
        ('m', Self::MULTILINE),
        ('s', Self::DOT_ALL),
        ('u', Self::UNICODE),
        ('y', Self::STICKY),
    ];

    /// No flags
    pub const fn empty() -> Self {
        Self(0)
    }

    /// From raw bits; unknown bits are dropped
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    /// Copy with `bit` set
    pub const fn with(self, bit: u32) -> Self {
        Self(self.0 | (bit & Self::ALL))
    }

    pub const fn global(self) -> bool {
        self.contains(Self::GLOBAL)
    }

    pub const fn ignore_case(self) -> bool {
        self.contains(Self::IGNORE_CASE)
    }

    pub const fn multiline(self) -> bool {
        self.contains(Self::MULTILINE)
    }

    pub const fn dot_all(self) -> bool {
        self.contains(Self::DOT_ALL)
    }

    pub const fn unicode(self) -> bool {
        self.contains(Self::UNICODE)
    }

    pub const fn sticky(self) -> bool {
        self.contains(Self::STICKY)
    }

    /// Parse flag text, rejecting unknown and repeated letters
    pub fn parse(text: &JsString) -> VmResult<Self> {
        let mut bits = 0u32;
        for unit in text.as_utf16() {
            let bit = char::from_u32(u32::from(*unit))
                .and_then(|c| Self::ORDER.iter().find(|(letter, _)| *letter == c))
                .map(|(_, bit)| *bit)
                .ok_or_else(|| invalid_flags(text))?;
            if bits & bit != 0 {
                return Err(invalid_flags(text));
            }
            bits |= bit;
        }
        Ok(Self(bits))
    }

    /// Canonical flag text in `gimsuy` order
    pub fn to_js_string(self) -> JsString {
        JsString::from(self.to_string())
    }
}

fn invalid_flags(text: &JsString) -> VmError {
    VmError::syntax_error(format!(
        "Invalid flags supplied to RegExp constructor '{text}'"
    ))
}

impl fmt::Display for RegExpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (letter, bit) in Self::ORDER {
            if self.contains(bit) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for RegExpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegExpFlags({self})")
    }
}
