//! Immutable UTF-16 JavaScript strings
//!
//! Strings store code units behind an `Arc` and carry a precomputed content
//! hash, so equality checks and cache keys never rescan the buffer twice.

use rustc_hash::FxHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Storage encoding tag handed to the matcher.
///
/// `Latin1` means every code unit fits in one byte; the buffer itself is
/// always UTF-16.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringEncoding {
    /// All code units are <= 0xFF
    Latin1,
    /// At least one code unit is > 0xFF
    Utf16,
}

/// A JavaScript string value
#[derive(Clone)]
pub struct JsString {
    units: Arc<[u16]>,
    hash: u32,
    encoding: StringEncoding,
}

impl JsString {
    /// Create from UTF-16 code units
    pub fn from_utf16(units: Vec<u16>) -> Self {
        Self::from_units(Arc::from(units))
    }

    fn from_units(units: Arc<[u16]>) -> Self {
        let hash = Self::compute_hash(&units);
        let encoding = if units.iter().all(|&u| u <= 0xFF) {
            StringEncoding::Latin1
        } else {
            StringEncoding::Utf16
        };
        Self {
            units,
            hash,
            encoding,
        }
    }

    /// The empty string
    pub fn empty() -> Self {
        Self::from_utf16(Vec::new())
    }

    /// Compute the content hash of a code unit buffer
    pub fn compute_hash(units: &[u16]) -> u32 {
        let mut hasher = FxHasher::default();
        units.hash(&mut hasher);
        let h = hasher.finish();
        (h ^ (h >> 32)) as u32
    }

    /// Code units
    pub fn as_utf16(&self) -> &[u16] {
        &self.units
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Code unit at `index`
    pub fn code_unit_at(&self, index: usize) -> Option<u16> {
        self.units.get(index).copied()
    }

    /// Content hash
    pub fn hash_code(&self) -> u32 {
        self.hash
    }

    /// Encoding tag
    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    /// Substring by code unit range, clamped to the string bounds
    pub fn substring(&self, start: usize, end: usize) -> JsString {
        let len = self.units.len();
        let end = end.min(len);
        let start = start.min(end);
        if start == 0 && end == len {
            return self.clone();
        }
        Self::from_utf16(self.units[start..end].to_vec())
    }

    /// Lossy conversion to a Rust string
    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }

    /// Compare against Rust text without allocating
    pub fn eq_str(&self, s: &str) -> bool {
        self.units.iter().copied().eq(s.encode_utf16())
    }

    /// Check whether both handles share the same buffer
    pub fn ptr_eq(&self, other: &JsString) -> bool {
        Arc::ptr_eq(&self.units, &other.units)
    }
}

impl PartialEq for JsString {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.hash == other.hash && self.units == other.units)
    }
}

impl Eq for JsString {}

impl Hash for JsString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self::from_utf16(s.encode_utf16().collect())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rust_string())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_rust_string())
    }
}

/// Accumulates code units for a result string
#[derive(Default)]
pub struct StringBuilder {
    units: Vec<u16>,
}

impl StringBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with room for `capacity` code units
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            units: Vec::with_capacity(capacity),
        }
    }

    /// Append a whole string
    pub fn push_str(&mut self, s: &JsString) {
        self.units.extend_from_slice(s.as_utf16());
    }

    /// Append `s[start..end]`, clamped
    pub fn push_range(&mut self, s: &JsString, start: usize, end: usize) {
        let units = s.as_utf16();
        let end = end.min(units.len());
        if start < end {
            self.units.extend_from_slice(&units[start..end]);
        }
    }

    /// Append one code unit
    pub fn push_unit(&mut self, unit: u16) {
        self.units.push(unit);
    }

    /// Append ASCII/Rust text
    pub fn push_rust_str(&mut self, s: &str) {
        self.units.extend(s.encode_utf16());
    }

    /// Current length in code units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Finish into a string
    pub fn finish(self) -> JsString {
        JsString::from_utf16(self.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_content() {
        let a = JsString::from("hello");
        let b = JsString::from_utf16("hello".encode_utf16().collect());
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, JsString::from("hellO"));
    }

    #[test]
    fn test_encoding_tag() {
        assert_eq!(JsString::from("abc").encoding(), StringEncoding::Latin1);
        assert_eq!(JsString::from("caf\u{e9}").encoding(), StringEncoding::Latin1);
        assert_eq!(JsString::from("\u{1F600}").encoding(), StringEncoding::Utf16);
    }

    #[test]
    fn test_substring_clamps() {
        let s = JsString::from("abcdef");
        assert_eq!(s.substring(1, 3).to_string(), "bc");
        assert_eq!(s.substring(4, 100).to_string(), "ef");
        assert_eq!(s.substring(5, 2).to_string(), "");
        assert!(s.substring(0, 6).ptr_eq(&s));
    }

    #[test]
    fn test_surrogate_pair_length() {
        let s = JsString::from("\u{1F600}");
        assert_eq!(s.len(), 2);
        assert_eq!(s.code_unit_at(0), Some(0xD83D));
        assert_eq!(s.code_unit_at(1), Some(0xDE00));
        assert_eq!(s.code_unit_at(2), None);
    }

    #[test]
    fn test_builder() {
        let src = JsString::from("xABy");
        let mut b = StringBuilder::new();
        b.push_unit(b'[' as u16);
        b.push_range(&src, 1, 3);
        b.push_rust_str("]");
        b.push_range(&src, 3, 99);
        assert_eq!(b.finish().to_string(), "[AB]y");
    }
}
