//! FastPathReplacer: replace-all with an empty replacement on a canonical
//! RegExp, driving the matcher directly.

use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::{VmError, VmResult};
use crate::object::JsObject;
use crate::regexp::advance::advance_string_index;
use crate::regexp::cache::{CacheKind, CachedResult};
use crate::regexp::cache_key_for;
use crate::regexp::exec::{read_last_index, write_last_index};
use crate::string::{JsString, StringBuilder};

/// Delete every match of `obj` from `input`.
///
/// Flags come from the compiled program header. The receiver must be a
/// canonical RegExp; `lastIndex` is read and written directly since no user
/// code can observe it.
pub fn replace_all_empty(
    ncx: &mut NativeContext<'_>,
    obj: &Arc<JsObject>,
    input: &JsString,
) -> VmResult<JsString> {
    let realm = ncx.realm();
    let Some(re) = obj.as_regexp() else {
        return Err(VmError::internal("fast replace on a non-RegExp receiver"));
    };
    let flags = re.program().flag_bits();
    let updates_last_index = flags.global() || flags.sticky();
    let mut last_index = if updates_last_index {
        read_last_index(ncx, obj)?
    } else {
        0
    };

    let cache_key = if last_index == 0 {
        cache_key_for(ncx, obj, input, CacheKind::Replace).map(|key| key.with_extend(JsString::empty()))
    } else {
        None
    };
    if let Some(key) = &cache_key {
        let hit = realm.result_cache().lookup(key, CacheKind::Replace);
        if let Some(hit) = hit
            && let CachedResult::Replace(result) = hit.result
        {
            write_last_index(ncx, obj, hit.last_index)?;
            return Ok(result);
        }
    }

    let mut out = StringBuilder::with_capacity(input.len());
    let mut next_position = 0;
    while last_index <= input.len() {
        let result = realm
            .matcher()
            .execute(re.program(), input, input.encoding(), last_index);
        if !result.success {
            if updates_last_index {
                write_last_index(ncx, obj, 0)?;
            }
            break;
        }

        let (start, end) = (result.index, result.end_index);
        if next_position < start {
            out.push_range(input, next_position, start);
        }
        next_position = end;

        if !flags.global() {
            write_last_index(ncx, obj, end)?;
            break;
        }
        last_index = if start == end {
            advance_string_index(input, end, flags.unicode())
        } else {
            end
        };
    }
    out.push_range(input, next_position, input.len());
    let result = out.finish();

    if let Some(key) = cache_key {
        let stored = read_last_index(ncx, obj)?;
        realm
            .result_cache()
            .insert(key, CachedResult::Replace(result.clone()), stored);
    }
    Ok(result)
}
