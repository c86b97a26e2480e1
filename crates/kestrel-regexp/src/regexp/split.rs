//! SplitEngine: `RegExp.prototype[Symbol.split]`

use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::{VmError, VmResult};
use crate::object::{JsObject, PropertyKey};
use crate::regexp::advance::advance_string_index;
use crate::regexp::cache::{CacheKey, CacheKind, CachedResult};
use crate::regexp::cache_key_for;
use crate::regexp::exec::{read_last_index, regexp_exec, write_last_index};
use crate::string::{JsString, StringBuilder};
use crate::value::Value;

/// Split `input` around matches of `obj`.
///
/// The splitting is done by a sticky clone built through the receiver's
/// species constructor, so subclasses see `new C(rx, flags + "y")`.
/// Captures of each separator match are spliced into the result.
pub fn regexp_split(
    ncx: &mut NativeContext<'_>,
    obj: &Arc<JsObject>,
    input: &JsString,
    limit: &Value,
) -> VmResult<Arc<JsObject>> {
    let default_constructor = ncx.realm().intrinsics().regexp_constructor.clone();
    let constructor = ncx.species_constructor(obj, &default_constructor)?;
    let default_species = constructor == default_constructor;
    if !default_species {
        tracing::debug!("splitting with a species constructor");
    }

    let flags_value = ncx.get_named(obj, "flags")?;
    let flags = if flags_value.is_undefined() {
        JsString::empty()
    } else {
        ncx.to_string_value(&flags_value)?
    };
    let flags_text = flags.to_rust_string();
    let unicode_matching = flags_text.contains('u');
    let new_flags = if flags_text.contains('y') {
        flags
    } else {
        let mut builder = StringBuilder::with_capacity(flags.len() + 1);
        builder.push_str(&flags);
        builder.push_unit(u16::from(b'y'));
        builder.finish()
    };

    let lim = if limit.is_undefined() {
        u32::MAX
    } else {
        ncx.to_uint32(limit)?
    };

    // A user splitter decides the parts, so its result must not be cached
    // under the receiver's key.
    let cache_key = if limit.is_undefined() && default_species {
        cache_key_for(ncx, obj, input, CacheKind::Split)
    } else {
        None
    };
    if let Some(key) = &cache_key {
        let hit = ncx.realm().result_cache().lookup(key, CacheKind::Split);
        if let Some(hit) = hit
            && let CachedResult::Split(parts) = hit.result
        {
            return Ok(ncx.create_array(parts));
        }
    }

    if lim == 0 {
        return Ok(ncx.create_array(Vec::new()));
    }
    let lim = lim as usize;

    let splitter = ncx
        .construct(
            &constructor,
            &[Value::object(obj.clone()), Value::string(new_flags)],
        )?
        .as_object()
        .cloned()
        .ok_or_else(|| VmError::type_error("species constructor did not return an object"))?;

    let size = input.len();
    if size == 0 {
        let parts = if regexp_exec(ncx, &splitter, input)?.is_some() {
            Vec::new()
        } else {
            vec![Value::string(input.clone())]
        };
        return Ok(ncx.create_array(parts));
    }

    let mut parts = Vec::new();
    let mut p = 0;
    let mut q = 0;
    while q < size {
        write_last_index(ncx, &splitter, q)?;
        let Some(record) = regexp_exec(ncx, &splitter, input)? else {
            q = advance_string_index(input, q, unicode_matching);
            continue;
        };
        let e = read_last_index(ncx, &splitter)?.min(size);
        if e == p {
            q = advance_string_index(input, q, unicode_matching);
            continue;
        }

        parts.push(Value::string(input.substring(p, q)));
        if parts.len() == lim {
            return Ok(ncx.create_array(parts));
        }
        p = e;

        let length = ncx.get_named(&record, "length")?;
        let capture_count = (ncx.to_length(&length)? as usize).saturating_sub(1);
        for i in 1..=capture_count {
            parts.push(ncx.get(&record, &PropertyKey::Index(i as u32))?);
            if parts.len() == lim {
                return Ok(ncx.create_array(parts));
            }
        }
        q = p;
    }
    parts.push(Value::string(input.substring(p, size)));

    store(ncx, cache_key, &parts);
    Ok(ncx.create_array(parts))
}

fn store(ncx: &NativeContext<'_>, key: Option<CacheKey>, parts: &[Value]) {
    if let Some(key) = key {
        tracing::trace!(parts = parts.len(), "caching split result");
        ncx.realm()
            .result_cache()
            .insert(key, CachedResult::Split(parts.to_vec()), 0);
    }
}
