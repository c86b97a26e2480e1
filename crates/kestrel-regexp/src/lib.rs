//! # Kestrel RegExp
//!
//! The RegExp built-ins of the Kestrel JavaScript runtime: the single-match
//! driver, global match, replace, split and search algorithms, plus the
//! per-realm result cache that short-circuits repeated work.
//!
//! ## Design Principles
//!
//! - **Pluggable matcher**: the algorithms drive a [`Matcher`]; the default is
//!   backed by `regress` over UTF-16 code units
//! - **Observable protocol**: non-canonical receivers go through property
//!   lookup and user `exec`, so subclasses and overridden accessors work
//! - **Shape-checked fast paths**: the fast replace path and the result cache
//!   only engage for unmodified RegExp instances of the realm

#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod intrinsics;
pub mod intrinsics_impl;
pub mod object;
pub mod realm;
pub mod regexp;
pub mod string;
pub mod value;

pub use context::NativeContext;
pub use error::{VmError, VmResult};
pub use intrinsics::Intrinsics;
pub use object::{JsObject, PropertyKey, WellKnownSymbol};
pub use realm::{Realm, RealmConfig};
pub use regexp::iterator::regexp_match;
pub use regexp::replace::regexp_replace;
pub use regexp::search::regexp_search;
pub use regexp::split::regexp_split;
pub use regexp::{
    CacheConfig, CacheStats, Matcher, RegExpFlags, RegressMatcher, ResultCache,
    advance_string_index, get_substitution,
};
pub use string::JsString;
pub use value::Value;
