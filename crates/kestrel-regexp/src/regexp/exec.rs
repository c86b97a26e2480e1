//! Single-match driver: RegExpBuiltinExec and RegExpExec

use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::{VmError, VmResult};
use crate::object::{JsObject, PropertyKey};
use crate::regexp::flags::RegExpFlags;
use crate::regexp::matcher::MatchResult;
use crate::string::JsString;
use crate::value::Value;

/// How the algorithms read a receiver's flags.
///
/// Chosen once per call. `Canonical` holds the flag bits of an unmodified
/// built-in RegExp; `Generic` goes through the property protocol so that
/// overridden accessors and subclass getters are honoured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagAccess {
    Canonical(RegExpFlags),
    Generic,
}

impl FlagAccess {
    /// Classify `obj` by shape and prototype identity
    pub fn classify(ncx: &NativeContext<'_>, obj: &JsObject) -> Self {
        match obj.as_regexp() {
            Some(re) if ncx.realm().is_canonical_regexp(obj) => Self::Canonical(re.flags()),
            _ => Self::Generic,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Canonical(_))
    }

    /// Read one flag
    pub fn flag(&self, ncx: &mut NativeContext<'_>, obj: &Arc<JsObject>, bit: u32) -> VmResult<bool> {
        match self {
            Self::Canonical(flags) => Ok(flags.contains(bit)),
            Self::Generic => Ok(ncx.get_named(obj, flag_property_name(bit))?.to_boolean()),
        }
    }
}

/// Property name of a single flag bit
pub fn flag_property_name(bit: u32) -> &'static str {
    match bit {
        RegExpFlags::GLOBAL => "global",
        RegExpFlags::IGNORE_CASE => "ignoreCase",
        RegExpFlags::MULTILINE => "multiline",
        RegExpFlags::DOT_ALL => "dotAll",
        RegExpFlags::UNICODE => "unicode",
        _ => "sticky",
    }
}

pub(crate) fn last_index_key() -> PropertyKey {
    PropertyKey::string("lastIndex")
}

const MAX_SAFE_LENGTH: f64 = 9007199254740991.0;

/// ToLength(Get(obj, "lastIndex"))
pub fn read_last_index(ncx: &mut NativeContext<'_>, obj: &Arc<JsObject>) -> VmResult<usize> {
    let raw = ncx.get(obj, &last_index_key())?;
    if let Some(n) = raw.as_number()
        && n >= 0.0
        && n.fract() == 0.0
        && n <= MAX_SAFE_LENGTH
    {
        return Ok(n as usize);
    }
    Ok(ncx.to_length(&raw)? as usize)
}

/// Set(obj, "lastIndex", index, true)
pub fn write_last_index(
    ncx: &mut NativeContext<'_>,
    obj: &Arc<JsObject>,
    index: usize,
) -> VmResult<()> {
    ncx.set(obj, &last_index_key(), Value::number(index as f64))
}

/// Build the match record array: captures as elements, plus `index` and
/// `input`. Non-participating groups are `undefined`.
pub fn build_match_record(
    ncx: &NativeContext<'_>,
    input: &JsString,
    result: &MatchResult,
) -> Arc<JsObject> {
    let elements = result
        .captures
        .iter()
        .map(|c| c.clone().map(Value::string).unwrap_or_else(Value::undefined))
        .collect();
    let record = ncx.create_array(elements);
    record.set(PropertyKey::string("index"), Value::number(result.index as f64));
    record.set(PropertyKey::string("input"), Value::string(input.clone()));
    record
}

/// RegExpBuiltinExec: one match attempt at `lastIndex`.
///
/// Returns `None` for no match. Fails with TypeError if `obj` has no
/// matcher state.
pub fn regexp_builtin_exec(
    ncx: &mut NativeContext<'_>,
    obj: &Arc<JsObject>,
    input: &JsString,
) -> VmResult<Option<Arc<JsObject>>> {
    if obj.as_regexp().is_none() {
        return Err(VmError::type_error(
            "RegExp exec called on an object without [[RegExpMatcher]]",
        ));
    }
    let access = FlagAccess::classify(ncx, obj);

    let mut last_index = read_last_index(ncx, obj)?;
    let global = access.flag(ncx, obj, RegExpFlags::GLOBAL)?;
    let sticky = access.flag(ncx, obj, RegExpFlags::STICKY)?;
    let updates_last_index = global || sticky;
    if !updates_last_index {
        last_index = 0;
    }

    if last_index > input.len() {
        write_last_index(ncx, obj, 0)?;
        return Ok(None);
    }

    let realm = ncx.realm();
    let Some(re) = obj.as_regexp() else {
        return Err(VmError::internal("RegExp lost its matcher state"));
    };
    let result = realm
        .matcher()
        .execute(re.program(), input, input.encoding(), last_index);

    if !result.success {
        if updates_last_index {
            write_last_index(ncx, obj, 0)?;
        }
        return Ok(None);
    }
    if updates_last_index {
        write_last_index(ncx, obj, result.end_index)?;
    }
    Ok(Some(build_match_record(ncx, input, &result)))
}

/// RegExpExec: dispatch through a user `exec` when the receiver is not a
/// canonical RegExp, validating its result.
pub fn regexp_exec(
    ncx: &mut NativeContext<'_>,
    obj: &Arc<JsObject>,
    input: &JsString,
) -> VmResult<Option<Arc<JsObject>>> {
    if FlagAccess::classify(ncx, obj).is_canonical() {
        return regexp_builtin_exec(ncx, obj, input);
    }

    let exec = ncx.get_named(obj, "exec")?;
    if exec.is_callable() {
        let result = ncx.call_function(
            &exec,
            Value::object(obj.clone()),
            &[Value::string(input.clone())],
        )?;
        return match result {
            Value::Null => Ok(None),
            Value::Object(record) => Ok(Some(record)),
            _ => Err(VmError::type_error(
                "RegExp exec method returned non-object, non-null value",
            )),
        };
    }

    regexp_builtin_exec(ncx, obj, input)
}
