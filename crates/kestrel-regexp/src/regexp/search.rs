//! `RegExp.prototype[Symbol.search]`

use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::VmResult;
use crate::object::JsObject;
use crate::regexp::exec::{last_index_key, regexp_exec};
use crate::string::JsString;
use crate::value::Value;

/// Index of the first match, or -1. `lastIndex` is restored afterwards.
pub fn regexp_search(
    ncx: &mut NativeContext<'_>,
    obj: &Arc<JsObject>,
    input: &JsString,
) -> VmResult<Value> {
    let key = last_index_key();
    let previous = ncx.get(obj, &key)?;
    let zero = Value::number(0.0);
    if !previous.same_value(&zero) {
        ncx.set(obj, &key, zero)?;
    }

    let result = regexp_exec(ncx, obj, input)?;

    let current = ncx.get(obj, &key)?;
    if !current.same_value(&previous) {
        ncx.set(obj, &key, previous)?;
    }

    match result {
        Some(record) => ncx.get_named(&record, "index"),
        None => Ok(Value::number(-1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Realm;
    use crate::regexp::exec::{read_last_index, write_last_index};

    #[test]
    fn test_search_restores_last_index() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let re = realm.new_regexp("c", "g").unwrap();
        write_last_index(&mut ncx, &re, 3).unwrap();
        let index = regexp_search(&mut ncx, &re, &JsString::from("abcabc")).unwrap();
        assert_eq!(index, Value::number(2.0));
        assert_eq!(read_last_index(&mut ncx, &re).unwrap(), 3);
    }

    #[test]
    fn test_search_no_match() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let re = realm.new_regexp("z", "").unwrap();
        let index = regexp_search(&mut ncx, &re, &JsString::from("abc")).unwrap();
        assert_eq!(index, Value::number(-1.0));
    }
}
