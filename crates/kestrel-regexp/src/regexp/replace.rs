//! ReplaceEngine: `RegExp.prototype[Symbol.replace]`

use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::VmResult;
use crate::object::{JsObject, PropertyKey};
use crate::regexp::advance::advance_string_index;
use crate::regexp::cache::{CacheKind, CachedResult};
use crate::regexp::cache_key_for;
use crate::regexp::exec::{FlagAccess, read_last_index, regexp_exec, write_last_index};
use crate::regexp::fast_replace::replace_all_empty;
use crate::regexp::flags::RegExpFlags;
use crate::regexp::substitution::get_substitution;
use crate::string::{JsString, StringBuilder};
use crate::value::Value;

/// Replace matches of `obj` in `input` with `replace_value`.
///
/// A callable `replace_value` is invoked per match with
/// `(matched, ...captures, position, input)`; anything else is converted to a
/// string template and expanded with [`get_substitution`]. Non-global
/// receivers replace only the first match.
pub fn regexp_replace(
    ncx: &mut NativeContext<'_>,
    obj: &Arc<JsObject>,
    input: &JsString,
    replace_value: &Value,
) -> VmResult<JsString> {
    let template = if replace_value.is_callable() {
        None
    } else {
        Some(ncx.to_string_value(replace_value)?)
    };

    let access = FlagAccess::classify(ncx, obj);
    let global = access.flag(ncx, obj, RegExpFlags::GLOBAL)?;
    let mut unicode = false;
    if global {
        unicode = access.flag(ncx, obj, RegExpFlags::UNICODE)?;
        write_last_index(ncx, obj, 0)?;
    }

    let mut cache_key = None;
    if global
        && access.is_canonical()
        && let Some(template) = &template
    {
        if template.is_empty() && ncx.realm().config().enable_fast_replace {
            tracing::debug!(input_len = input.len(), "empty replacement, taking fast path");
            return replace_all_empty(ncx, obj, input);
        }
        cache_key = cache_key_for(ncx, obj, input, CacheKind::Replace)
            .map(|key| key.with_extend(template.clone()));
        if let Some(key) = &cache_key {
            let hit = ncx.realm().result_cache().lookup(key, CacheKind::Replace);
            if let Some(hit) = hit
                && let CachedResult::Replace(result) = hit.result
            {
                write_last_index(ncx, obj, hit.last_index)?;
                return Ok(result);
            }
        }
    }

    let mut records = Vec::new();
    while let Some(record) = regexp_exec(ncx, obj, input)? {
        if !global {
            records.push(record);
            break;
        }
        let first = ncx.get(&record, &PropertyKey::Index(0))?;
        if ncx.to_string_value(&first)?.is_empty() {
            let this_index = read_last_index(ncx, obj)?;
            write_last_index(ncx, obj, advance_string_index(input, this_index, unicode))?;
        }
        records.push(record);
    }

    let mut out = StringBuilder::with_capacity(input.len());
    let mut next_source_position = 0;
    for record in &records {
        let length = ncx.get_named(record, "length")?;
        let capture_count = (ncx.to_length(&length)? as usize).saturating_sub(1);

        let first = ncx.get(record, &PropertyKey::Index(0))?;
        let matched = ncx.to_string_value(&first)?;

        let index = ncx.get_named(record, "index")?;
        let position = ncx
            .to_integer_or_infinity(&index)?
            .clamp(0.0, input.len() as f64) as usize;

        let mut captures = Vec::with_capacity(capture_count);
        for n in 1..=capture_count {
            let capture = ncx.get(record, &PropertyKey::Index(n as u32))?;
            captures.push(if capture.is_undefined() {
                None
            } else {
                Some(ncx.to_string_value(&capture)?)
            });
        }

        let replacement = match &template {
            Some(template) => get_substitution(&matched, input, position, &captures, template),
            None => {
                let mut args = Vec::with_capacity(capture_count + 3);
                args.push(Value::string(matched.clone()));
                args.extend(
                    captures
                        .iter()
                        .map(|c| c.clone().map(Value::string).unwrap_or_else(Value::undefined)),
                );
                args.push(Value::number(position as f64));
                args.push(Value::string(input.clone()));
                let value = ncx.call_function(replace_value, Value::undefined(), &args)?;
                ncx.to_string_value(&value)?
            }
        };

        if position >= next_source_position {
            out.push_range(input, next_source_position, position);
            out.push_str(&replacement);
            next_source_position = position + matched.len();
        } else {
            tracing::trace!(position, next_source_position, "skipping overlapping match record");
        }
    }
    out.push_range(input, next_source_position, input.len());
    let result = out.finish();

    if let Some(key) = cache_key {
        let last_index = read_last_index(ncx, obj)?;
        ncx.realm()
            .result_cache()
            .insert(key, CachedResult::Replace(result.clone()), last_index);
    }
    Ok(result)
}
