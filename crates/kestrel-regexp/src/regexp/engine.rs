//! Default matcher backed by `regress`

use regress::{Flags, Regex};

use crate::error::{VmError, VmResult};
use crate::regexp::flags::RegExpFlags;
use crate::regexp::matcher::{CompiledProgram, MatchResult, Matcher};
use crate::string::{JsString, StringEncoding};

/// Backtracking matcher over UTF-16 input.
///
/// Unicode programs iterate by code point (`find_from_utf16`); all others
/// see raw code units (`find_from_ucs2`).
#[derive(Debug, Default, Clone, Copy)]
pub struct RegressMatcher;

impl RegressMatcher {
    pub fn new() -> Self {
        Self
    }
}

fn regress_flags(flags: RegExpFlags) -> Flags {
    let mut text = String::with_capacity(4);
    if flags.ignore_case() {
        text.push('i');
    }
    if flags.multiline() {
        text.push('m');
    }
    if flags.dot_all() {
        text.push('s');
    }
    if flags.unicode() {
        text.push('u');
    }
    Flags::from(text.as_str())
}

impl Matcher for RegressMatcher {
    fn compile(&self, source: &JsString, flags: RegExpFlags) -> VmResult<CompiledProgram> {
        let pattern = source.to_rust_string();
        let regex = Regex::with_flags(&pattern, regress_flags(flags)).map_err(|err| {
            VmError::syntax_error(format!("Invalid regular expression: /{pattern}/: {err}"))
        })?;
        let captures = count_capture_groups(&pattern);
        Ok(CompiledProgram::new(flags, captures, 0, Box::new(regex)))
    }

    fn execute(
        &self,
        program: &CompiledProgram,
        input: &JsString,
        _encoding: StringEncoding,
        start: usize,
    ) -> MatchResult {
        let Some(regex) = program.code::<Regex>() else {
            tracing::warn!("program was not compiled by RegressMatcher");
            return MatchResult::failure();
        };
        let units = input.as_utf16();
        if start > units.len() {
            return MatchResult::failure();
        }
        let flags = program.flag_bits();
        let found = if flags.unicode() {
            regex.find_from_utf16(units, start).next()
        } else {
            regex.find_from_ucs2(units, start).next()
        };
        let Some(mat) = found.filter(|m| !flags.sticky() || m.start() == start) else {
            return MatchResult::failure();
        };

        let captures = (0..=mat.captures.len())
            .map(|idx| {
                mat.group(idx)
                    .map(|range| input.substring(range.start, range.end))
            })
            .collect();
        MatchResult {
            success: true,
            index: mat.start(),
            end_index: mat.end(),
            captures,
        }
    }
}

/// Count capturing groups: plain `(` and named `(?<name>`, skipping
/// escapes, character classes, lookbehinds and other `(?` forms.
fn count_capture_groups(pattern: &str) -> u32 {
    let chars: Vec<char> = pattern.chars().collect();
    let mut count = 0;
    let mut in_class = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            ']' if in_class => in_class = false,
            '[' if !in_class => in_class = true,
            '(' if !in_class => {
                if chars.get(i + 1) != Some(&'?') {
                    count += 1;
                } else if chars.get(i + 2) == Some(&'<')
                    && !matches!(chars.get(i + 3), Some('=') | Some('!'))
                {
                    count += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    count
}
