//! Matcher contract
//!
//! The core never looks inside a compiled program except for its header,
//! whose flag bits the fast replace path reads directly.

use smallvec::SmallVec;
use std::any::Any;
use std::fmt;

use crate::error::VmResult;
use crate::regexp::flags::RegExpFlags;
use crate::string::{JsString, StringEncoding};

/// Size of the fixed program header, in bytes
pub const PROGRAM_HEADER_SIZE: usize = 16;
/// Offset of the capture count (u32 LE)
pub const NUM_CAPTURE_OFFSET: usize = 4;
/// Offset of the backtrack stack estimate (u32 LE)
pub const NUM_STACK_OFFSET: usize = 8;
/// Offset of the flag bits (u32 LE)
pub const FLAGS_OFFSET: usize = 12;

/// A compiled pattern: fixed header plus engine-owned code
pub struct CompiledProgram {
    header: [u8; PROGRAM_HEADER_SIZE],
    code: Box<dyn Any + Send + Sync>,
}

impl CompiledProgram {
    /// Build a program, writing the header fields
    pub fn new(
        flags: RegExpFlags,
        capture_count: u32,
        stack_size: u32,
        code: Box<dyn Any + Send + Sync>,
    ) -> Self {
        let mut header = [0u8; PROGRAM_HEADER_SIZE];
        header[..4].copy_from_slice(&(PROGRAM_HEADER_SIZE as u32).to_le_bytes());
        header[NUM_CAPTURE_OFFSET..NUM_CAPTURE_OFFSET + 4]
            .copy_from_slice(&capture_count.to_le_bytes());
        header[NUM_STACK_OFFSET..NUM_STACK_OFFSET + 4].copy_from_slice(&stack_size.to_le_bytes());
        header[FLAGS_OFFSET..FLAGS_OFFSET + 4].copy_from_slice(&flags.bits().to_le_bytes());
        Self { header, code }
    }

    /// Raw header bytes
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.header[offset..offset + 4]);
        u32::from_le_bytes(word)
    }

    /// Flag bits stored in the header
    pub fn flag_bits(&self) -> RegExpFlags {
        RegExpFlags::from_bits(self.read_u32(FLAGS_OFFSET))
    }

    /// Number of capture groups, not counting the whole match
    pub fn capture_count(&self) -> u32 {
        self.read_u32(NUM_CAPTURE_OFFSET)
    }

    /// Engine code, if it is of type `T`
    pub fn code<T: 'static>(&self) -> Option<&T> {
        self.code.downcast_ref::<T>()
    }
}

impl fmt::Debug for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledProgram")
            .field("flags", &self.flag_bits())
            .field("captures", &self.capture_count())
            .finish()
    }
}

/// Outcome of one match attempt
#[derive(Clone, Debug, Default)]
pub struct MatchResult {
    pub success: bool,
    /// Start of the whole match, in code units
    pub index: usize,
    /// End of the whole match, in code units
    pub end_index: usize,
    /// Slot 0 is the whole match; `None` marks a group that did not participate
    pub captures: SmallVec<[Option<JsString>; 4]>,
}

impl MatchResult {
    /// A failed attempt
    pub fn failure() -> Self {
        Self::default()
    }

    /// Whole matched substring
    pub fn matched(&self) -> Option<&JsString> {
        self.captures.first().and_then(Option::as_ref)
    }
}

/// A regular-expression engine
pub trait Matcher: Send + Sync {
    /// Compile `source` under `flags`; invalid patterns are a SyntaxError
    fn compile(&self, source: &JsString, flags: RegExpFlags) -> VmResult<CompiledProgram>;

    /// Attempt one match at or after `start` (exactly at `start` when sticky)
    fn execute(
        &self,
        program: &CompiledProgram,
        input: &JsString,
        encoding: StringEncoding,
        start: usize,
    ) -> MatchResult;
}
