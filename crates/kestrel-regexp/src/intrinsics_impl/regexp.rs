//! RegExp constructor and prototype methods
//!
//! - Instance methods: exec, test, toString
//! - Symbol methods: [Symbol.match], [Symbol.replace], [Symbol.search], [Symbol.split]
//! - Accessor getters: flags, source, global, ignoreCase, multiline, dotAll, unicode, sticky

use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::{VmError, VmResult};
use crate::intrinsics::Intrinsics;
use crate::object::{
    JsObject, NativeFn, PropertyAttributes, PropertyDescriptor, PropertyKey, WellKnownSymbol,
};
use crate::regexp::exec::{regexp_builtin_exec, regexp_exec};
use crate::regexp::flags::RegExpFlags;
use crate::regexp::iterator::regexp_match;
use crate::regexp::replace::regexp_replace;
use crate::regexp::search::regexp_search;
use crate::regexp::split::regexp_split;
use crate::string::{JsString, StringBuilder};
use crate::value::Value;

// ============================================================================
// Helpers
// ============================================================================

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_else(Value::undefined)
}

/// `this` as an object, or TypeError
fn this_object(this: &Value, method: &str) -> VmResult<Arc<JsObject>> {
    this.as_object().cloned().ok_or_else(|| {
        VmError::type_error(format!(
            "RegExp.prototype.{method} called on incompatible receiver {}",
            this.to_display_string()
        ))
    })
}

/// ToString of an argument, treating a missing argument as `undefined`
fn string_arg(ncx: &mut NativeContext<'_>, args: &[Value], index: usize) -> VmResult<JsString> {
    ncx.to_string_value(&arg(args, index))
}

fn is_regexp_prototype(ncx: &NativeContext<'_>, obj: &Arc<JsObject>) -> bool {
    Arc::ptr_eq(obj, &ncx.realm().intrinsics().regexp_prototype)
}

// ============================================================================
// Constructor
// ============================================================================

fn parse_flags(ncx: &mut NativeContext<'_>, flags: &Value) -> VmResult<RegExpFlags> {
    if flags.is_undefined() {
        return Ok(RegExpFlags::empty());
    }
    let text = ncx.to_string_value(flags)?;
    RegExpFlags::parse(&text)
}

/// `new RegExp(pattern, flags)`
fn regexp_construct(args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let pattern = arg(args, 0);
    let flags = arg(args, 1);

    let (source, flags) = match pattern.as_object().and_then(|o| o.as_regexp()) {
        Some(re) => {
            let flags = if flags.is_undefined() {
                re.flags()
            } else {
                parse_flags(ncx, &flags)?
            };
            (re.source().clone(), flags)
        }
        None => {
            let source = if pattern.is_undefined() {
                JsString::empty()
            } else {
                ncx.to_string_value(&pattern)?
            };
            (source, parse_flags(ncx, &flags)?)
        }
    };

    let realm = ncx.realm();
    let prototype = realm.intrinsics().regexp_prototype.clone();
    Ok(Value::object(realm.regexp_alloc(prototype, source, flags)?))
}

/// `RegExp(pattern, flags)` without `new`
fn regexp_call(_this: &Value, args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let pattern = arg(args, 0);
    if let Some(obj) = pattern.as_object()
        && obj.as_regexp().is_some()
        && arg(args, 1).is_undefined()
    {
        let constructor = ncx.get_named(obj, "constructor")?;
        if constructor == ncx.realm().intrinsics().regexp_constructor {
            return Ok(pattern.clone());
        }
    }
    regexp_construct(args, ncx)
}

fn regexp_species(this: &Value, _args: &[Value], _ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    Ok(this.clone())
}

/// Create `%RegExp%` and link it with `RegExp.prototype`
pub fn create_regexp_constructor(intrinsics: &Intrinsics) -> Value {
    let constructor = intrinsics.function(
        "RegExp",
        2,
        Arc::new(regexp_call),
        Some(Arc::new(regexp_construct)),
    );
    let proto = &intrinsics.regexp_prototype;
    if let Some(ctor) = constructor.as_object() {
        ctor.define_property(
            PropertyKey::string("prototype"),
            PropertyDescriptor::data_with_attrs(
                Value::object(proto.clone()),
                PropertyAttributes::frozen(),
            ),
        );
        intrinsics.define_getter(ctor, WellKnownSymbol::Species, Arc::new(regexp_species));
    }
    proto.define_property(
        PropertyKey::string("constructor"),
        PropertyDescriptor::data_with_attrs(constructor.clone(), PropertyAttributes::builtin_method()),
    );
    constructor
}

// ============================================================================
// Instance methods
// ============================================================================

fn proto_exec(this: &Value, args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let obj = this_object(this, "exec")?;
    if obj.as_regexp().is_none() {
        return Err(VmError::type_error(
            "RegExp.prototype.exec called on incompatible receiver",
        ));
    }
    let input = string_arg(ncx, args, 0)?;
    Ok(regexp_builtin_exec(ncx, &obj, &input)?
        .map(Value::object)
        .unwrap_or_else(Value::null))
}

fn proto_test(this: &Value, args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let obj = this_object(this, "test")?;
    let input = string_arg(ncx, args, 0)?;
    Ok(Value::boolean(regexp_exec(ncx, &obj, &input)?.is_some()))
}

fn proto_to_string(this: &Value, _args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let obj = this_object(this, "toString")?;
    let source = ncx.get_named(&obj, "source")?;
    let source = ncx.to_string_value(&source)?;
    let flags = ncx.get_named(&obj, "flags")?;
    let flags = ncx.to_string_value(&flags)?;

    let mut out = StringBuilder::with_capacity(source.len() + flags.len() + 2);
    out.push_unit(u16::from(b'/'));
    out.push_str(&source);
    out.push_unit(u16::from(b'/'));
    out.push_str(&flags);
    Ok(Value::string(out.finish()))
}

// ============================================================================
// Symbol methods
// ============================================================================

fn proto_symbol_match(this: &Value, args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let obj = this_object(this, "[Symbol.match]")?;
    let input = string_arg(ncx, args, 0)?;
    regexp_match(ncx, &obj, &input)
}

fn proto_symbol_replace(
    this: &Value,
    args: &[Value],
    ncx: &mut NativeContext<'_>,
) -> VmResult<Value> {
    let obj = this_object(this, "[Symbol.replace]")?;
    let input = string_arg(ncx, args, 0)?;
    Ok(Value::string(regexp_replace(ncx, &obj, &input, &arg(args, 1))?))
}

fn proto_symbol_search(this: &Value, args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let obj = this_object(this, "[Symbol.search]")?;
    let input = string_arg(ncx, args, 0)?;
    regexp_search(ncx, &obj, &input)
}

fn proto_symbol_split(this: &Value, args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let obj = this_object(this, "[Symbol.split]")?;
    let input = string_arg(ncx, args, 0)?;
    Ok(Value::object(regexp_split(ncx, &obj, &input, &arg(args, 1))?))
}

// ============================================================================
// Accessors
// ============================================================================

/// Getter for one flag bit. `RegExp.prototype` itself reports `undefined`.
fn flag_getter(bit: u32, name: &'static str) -> NativeFn {
    Arc::new(move |this: &Value, _args: &[Value], ncx: &mut NativeContext<'_>| -> VmResult<Value> {
        let obj = this_object(this, name)?;
        if let Some(re) = obj.as_regexp() {
            return Ok(Value::boolean(re.flags().contains(bit)));
        }
        if is_regexp_prototype(ncx, &obj) {
            return Ok(Value::undefined());
        }
        Err(VmError::type_error(format!(
            "RegExp.prototype.{name} getter called on non-RegExp object"
        )))
    })
}

fn proto_source(this: &Value, _args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let obj = this_object(this, "source")?;
    if let Some(re) = obj.as_regexp() {
        return Ok(Value::string(re.escaped_source()));
    }
    if is_regexp_prototype(ncx, &obj) {
        return Ok(Value::string(JsString::from("(?:)")));
    }
    Err(VmError::type_error(
        "RegExp.prototype.source getter called on non-RegExp object",
    ))
}

/// Generic `flags` getter: reads each flag property in turn
fn proto_flags(this: &Value, _args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    const FLAG_PROPERTIES: [(&str, u8); 6] = [
        ("global", b'g'),
        ("ignoreCase", b'i'),
        ("multiline", b'm'),
        ("dotAll", b's'),
        ("unicode", b'u'),
        ("sticky", b'y'),
    ];
    let obj = this_object(this, "flags")?;
    let mut out = StringBuilder::with_capacity(FLAG_PROPERTIES.len());
    for (name, ch) in FLAG_PROPERTIES {
        if ncx.get_named(&obj, name)?.to_boolean() {
            out.push_unit(u16::from(ch));
        }
    }
    Ok(Value::string(out.finish()))
}

/// Populate `RegExp.prototype`
pub fn init_regexp_prototype(intrinsics: &Intrinsics) {
    let proto = &intrinsics.regexp_prototype;

    intrinsics.define_method(proto, "exec", 1, Arc::new(proto_exec));
    intrinsics.define_method(proto, "test", 1, Arc::new(proto_test));
    intrinsics.define_method(proto, "toString", 0, Arc::new(proto_to_string));

    intrinsics.define_method(proto, WellKnownSymbol::Match, 1, Arc::new(proto_symbol_match));
    intrinsics.define_method(proto, WellKnownSymbol::Replace, 2, Arc::new(proto_symbol_replace));
    intrinsics.define_method(proto, WellKnownSymbol::Search, 1, Arc::new(proto_symbol_search));
    intrinsics.define_method(proto, WellKnownSymbol::Split, 2, Arc::new(proto_symbol_split));

    intrinsics.define_getter(proto, "flags", Arc::new(proto_flags));
    intrinsics.define_getter(proto, "source", Arc::new(proto_source));
    for (bit, name) in [
        (RegExpFlags::GLOBAL, "global"),
        (RegExpFlags::IGNORE_CASE, "ignoreCase"),
        (RegExpFlags::MULTILINE, "multiline"),
        (RegExpFlags::DOT_ALL, "dotAll"),
        (RegExpFlags::UNICODE, "unicode"),
        (RegExpFlags::STICKY, "sticky"),
    ] {
        intrinsics.define_getter(proto, name, flag_getter(bit, name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Realm;

    fn call_method(realm: &Realm, this: &Value, key: PropertyKey, args: &[Value]) -> VmResult<Value> {
        let mut ncx = realm.context();
        let proto = realm.intrinsics().regexp_prototype.clone();
        let method = ncx.get(&proto, &key)?;
        ncx.call_function(&method, this.clone(), args)
    }

    fn s(text: &str) -> Value {
        Value::string(JsString::from(text))
    }

    #[test]
    fn test_constructor_from_regexp_keeps_source() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let ctor = realm.intrinsics().regexp_constructor.clone();
        let original = Value::object(realm.new_regexp("a+", "g").unwrap());
        let copy = ncx.construct(&ctor, &[original, s("iy")]).unwrap();
        let re = copy.as_object().unwrap().as_regexp().unwrap();
        assert_eq!(re.source().to_string(), "a+");
        assert_eq!(re.flags().to_string(), "iy");
    }

    #[test]
    fn test_constructor_rejects_bad_flags() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let ctor = realm.intrinsics().regexp_constructor.clone();
        let err = ncx.construct(&ctor, &[s("a"), s("gg")]).unwrap_err();
        assert!(matches!(err, VmError::SyntaxError(_)));
    }

    #[test]
    fn test_constructed_instances_are_canonical() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let ctor = realm.intrinsics().regexp_constructor.clone();
        let re = ncx.construct(&ctor, &[s("x")]).unwrap();
        assert!(realm.is_canonical_regexp(re.as_object().unwrap()));
    }

    #[test]
    fn test_to_string_and_flags() {
        let realm = Realm::new();
        let re = Value::object(realm.new_regexp("a/b", "yg").unwrap());
        let text = call_method(&realm, &re, PropertyKey::string("toString"), &[]).unwrap();
        assert_eq!(text.as_string().unwrap().to_string(), "/a\\/b/gy");
    }

    #[test]
    fn test_flag_getters_on_prototype() {
        let realm = Realm::new();
        let mut ncx = realm.context();
        let proto = realm.intrinsics().regexp_prototype.clone();
        assert!(ncx.get_named(&proto, "global").unwrap().is_undefined());
        let source = ncx.get_named(&proto, "source").unwrap();
        assert_eq!(source.as_string().unwrap().to_string(), "(?:)");
        let flags = ncx.get_named(&proto, "flags").unwrap();
        assert!(flags.as_string().unwrap().is_empty());
    }

    #[test]
    fn test_flag_getter_rejects_plain_object() {
        let realm = Realm::new();
        let plain = Value::object(realm.new_object());
        let proto = realm.intrinsics().regexp_prototype.clone();
        let desc = proto
            .get_own_property(&PropertyKey::string("global"))
            .unwrap();
        let PropertyDescriptor::Accessor { get, .. } = desc else {
            panic!("expected accessor");
        };
        let mut ncx = realm.context();
        let err = ncx.call_function(&get.unwrap(), plain, &[]).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_exec_and_test() {
        let realm = Realm::new();
        let re = Value::object(realm.new_regexp("b(c)", "").unwrap());
        let record = call_method(&realm, &re, PropertyKey::string("exec"), &[s("abc")]).unwrap();
        let record = record.as_object().unwrap();
        assert_eq!(record.get(&PropertyKey::string("index")), Some(Value::number(1.0)));
        assert_eq!(record.get(&PropertyKey::Index(1)), Some(s("c")));
        let hit = call_method(&realm, &re, PropertyKey::string("test"), &[s("xbc")]).unwrap();
        assert_eq!(hit, Value::boolean(true));
    }

    #[test]
    fn test_symbol_methods() {
        let realm = Realm::new();
        let re = Value::object(realm.new_regexp(",", "g").unwrap());
        let replaced = call_method(
            &realm,
            &re,
            WellKnownSymbol::Replace.into(),
            &[s("a,b"), s(";")],
        )
        .unwrap();
        assert_eq!(replaced, s("a;b"));
        let parts = call_method(&realm, &re, WellKnownSymbol::Split.into(), &[s("a,b")]).unwrap();
        assert_eq!(parts.as_object().unwrap().array_elements(), vec![s("a"), s("b")]);
        let index = call_method(&realm, &re, WellKnownSymbol::Search.into(), &[s("ab,")]).unwrap();
        assert_eq!(index, Value::number(2.0));
    }

    #[test]
    fn test_symbol_method_on_primitive_throws() {
        let realm = Realm::new();
        let err = call_method(&realm, &s("x"), WellKnownSymbol::Match.into(), &[s("x")]).unwrap_err();
        assert!(err.is_type_error());
    }
}
