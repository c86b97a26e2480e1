//! RegExp objects and the built-in matching algorithms

pub mod advance;
pub mod cache;
pub mod engine;
pub mod exec;
pub mod fast_replace;
pub mod flags;
pub mod iterator;
pub mod matcher;
pub mod replace;
pub mod search;
pub mod split;
pub mod substitution;

pub use advance::advance_string_index;
pub use cache::{CacheConfig, CacheKey, CacheKind, CacheStats, CachedResult, ResultCache};
pub use engine::RegressMatcher;
pub use exec::{FlagAccess, regexp_builtin_exec, regexp_exec};
pub use flags::RegExpFlags;
pub use matcher::{CompiledProgram, MatchResult, Matcher};
pub use substitution::get_substitution;

use crate::context::NativeContext;
use crate::object::JsObject;
use crate::string::JsString;

/// Internal slots of a RegExp instance
#[derive(Debug)]
pub struct JsRegExp {
    /// Pattern text as given to the constructor
    source: JsString,
    /// Flags parsed at construction
    flags: RegExpFlags,
    /// Compiled program
    program: CompiledProgram,
}

impl JsRegExp {
    pub fn new(source: JsString, flags: RegExpFlags, program: CompiledProgram) -> Self {
        Self {
            source,
            flags,
            program,
        }
    }

    pub fn source(&self) -> &JsString {
        &self.source
    }

    pub fn flags(&self) -> RegExpFlags {
        self.flags
    }

    pub fn program(&self) -> &CompiledProgram {
        &self.program
    }

    /// Source text as reported by the `source` getter: `/` and line
    /// terminators escaped, `(?:)` for the empty pattern.
    pub fn escaped_source(&self) -> JsString {
        if self.source.is_empty() {
            return JsString::from("(?:)");
        }
        let pattern = self.source.to_rust_string();
        let mut result = String::with_capacity(pattern.len());
        let mut escaped = false;
        for ch in pattern.chars() {
            match ch {
                '/' if !escaped => result.push_str("\\/"),
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\u{2028}' => result.push_str("\\u2028"),
                '\u{2029}' => result.push_str("\\u2029"),
                _ => result.push(ch),
            }
            escaped = ch == '\\' && !escaped;
        }
        JsString::from(result)
    }
}

/// Cache key for `obj` and `input` when an operation of `kind` may use the
/// result cache: caching is enabled, the receiver is canonical and the input
/// passes the length admission.
pub(crate) fn cache_key_for(
    ncx: &NativeContext<'_>,
    obj: &JsObject,
    input: &JsString,
    kind: CacheKind,
) -> Option<CacheKey> {
    let realm = ncx.realm();
    if !realm.config().enable_result_cache || !realm.is_canonical_regexp(obj) {
        return None;
    }
    let re = obj.as_regexp()?;
    if !realm.result_cache().admits(kind, input.len()) {
        return None;
    }
    Some(CacheKey::new(re.source().clone(), re.flags(), input.clone()))
}
