//! MatchIterator: `RegExp.prototype[Symbol.match]`

use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::VmResult;
use crate::object::{JsObject, PropertyKey};
use crate::regexp::advance::advance_string_index;
use crate::regexp::cache::{CacheKind, CachedResult};
use crate::regexp::cache_key_for;
use crate::regexp::exec::{FlagAccess, read_last_index, regexp_exec, write_last_index};
use crate::regexp::flags::RegExpFlags;
use crate::string::JsString;
use crate::value::Value;

/// Non-global: the single match record or `null`. Global: an array of every
/// matched substring, or `null` when nothing matched.
pub fn regexp_match(
    ncx: &mut NativeContext<'_>,
    obj: &Arc<JsObject>,
    input: &JsString,
) -> VmResult<Value> {
    let access = FlagAccess::classify(ncx, obj);
    if !access.flag(ncx, obj, RegExpFlags::GLOBAL)? {
        return Ok(regexp_exec(ncx, obj, input)?
            .map(Value::object)
            .unwrap_or_else(Value::null));
    }

    let unicode = access.flag(ncx, obj, RegExpFlags::UNICODE)?;
    write_last_index(ncx, obj, 0)?;

    let cache_key = cache_key_for(ncx, obj, input, CacheKind::Match);
    if let Some(key) = &cache_key {
        let hit = ncx.realm().result_cache().lookup(key, CacheKind::Match);
        if let Some(hit) = hit
            && let CachedResult::Match(values) = hit.result
        {
            write_last_index(ncx, obj, hit.last_index)?;
            return Ok(Value::object(ncx.create_array(values)));
        }
    }

    let mut matches = Vec::new();
    while let Some(record) = regexp_exec(ncx, obj, input)? {
        let first = ncx.get(&record, &PropertyKey::Index(0))?;
        let matched = ncx.to_string_value(&first)?;
        if matched.is_empty() {
            let this_index = read_last_index(ncx, obj)?;
            write_last_index(ncx, obj, advance_string_index(input, this_index, unicode))?;
        }
        matches.push(Value::string(matched));
    }

    if matches.is_empty() {
        return Ok(Value::null());
    }
    if let Some(key) = cache_key {
        let last_index = read_last_index(ncx, obj)?;
        ncx.realm()
            .result_cache()
            .insert(key, CachedResult::Match(matches.clone()), last_index);
    }
    Ok(Value::object(ncx.create_array(matches)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Realm;

    fn strings(array: &Value) -> Vec<String> {
        array
            .as_object()
            .unwrap()
            .array_elements()
            .iter()
            .map(|v| v.as_string().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_global_empty_matches_terminate() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let re = realm.new_regexp("a*", "g").unwrap();
        let result = regexp_match(&mut ncx, &re, &JsString::from("baaab")).unwrap();
        assert_eq!(strings(&result), vec!["", "aaa", "", ""]);
        assert_eq!(read_last_index(&mut ncx, &re).unwrap(), 0);
    }

    #[test]
    fn test_global_no_match_is_null() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let re = realm.new_regexp("z", "g").unwrap();
        assert!(regexp_match(&mut ncx, &re, &JsString::from("abc")).unwrap().is_null());
    }

    #[test]
    fn test_non_global_returns_record() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let re = realm.new_regexp("(b)(c)?", "").unwrap();
        let result = regexp_match(&mut ncx, &re, &JsString::from("abd")).unwrap();
        let record = result.as_object().unwrap();
        assert_eq!(record.array_length(), 3);
        assert_eq!(record.get(&PropertyKey::Index(2)), Some(Value::undefined()));
    }

    #[test]
    fn test_unicode_advances_by_code_point() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let re = realm.new_regexp("", "gu").unwrap();
        let result = regexp_match(&mut ncx, &re, &JsString::from("\u{1F600}")).unwrap();
        // empty matches at 0 and 2 only; never between the surrogates
        assert_eq!(result.as_object().unwrap().array_length(), 2);
    }

    #[test]
    fn test_cached_global_match() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let re = realm.new_regexp("\\d+", "g").unwrap();
        let input = JsString::from("a1b22c333");
        let first = regexp_match(&mut ncx, &re, &input).unwrap();
        let second = regexp_match(&mut ncx, &re, &input).unwrap();
        assert_eq!(strings(&first), vec!["1", "22", "333"]);
        assert_eq!(strings(&first), strings(&second));
        assert!(!Arc::ptr_eq(first.as_object().unwrap(), second.as_object().unwrap()));
        assert_eq!(realm.cache_stats().hits, 1);
    }
}
