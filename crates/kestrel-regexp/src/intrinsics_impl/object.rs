//! Object.prototype and Array.prototype conversions
//!
//! Only the members the coercion protocol needs: `toString` and `valueOf`.

use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::VmResult;
use crate::intrinsics::Intrinsics;
use crate::object::ObjectKind;
use crate::string::{JsString, StringBuilder};
use crate::value::Value;

fn object_to_string(this: &Value, _args: &[Value], _ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let tag = match this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Object(obj) => match obj.kind() {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::RegExp(_) => "RegExp",
        },
        Value::Boolean(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
    };
    Ok(Value::string(JsString::from(format!("[object {tag}]"))))
}

fn object_value_of(this: &Value, _args: &[Value], _ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    Ok(this.clone())
}

/// Array.prototype.toString, joining with `,`
fn array_to_string(this: &Value, _args: &[Value], ncx: &mut NativeContext<'_>) -> VmResult<Value> {
    let Some(array) = this.as_object().filter(|o| o.is_array()) else {
        return object_to_string(this, &[], ncx);
    };
    let mut out = StringBuilder::new();
    for (i, element) in array.array_elements().iter().enumerate() {
        if i > 0 {
            out.push_unit(u16::from(b','));
        }
        if !element.is_nullish() {
            let s = ncx.to_string_value(element)?;
            out.push_str(&s);
        }
    }
    Ok(Value::string(out.finish()))
}

pub fn init_object_prototype(intrinsics: &Intrinsics) {
    let proto = &intrinsics.object_prototype;
    intrinsics.define_method(proto, "toString", 0, Arc::new(object_to_string));
    intrinsics.define_method(proto, "valueOf", 0, Arc::new(object_value_of));
}

pub fn init_array_prototype(intrinsics: &Intrinsics) {
    intrinsics.define_method(
        &intrinsics.array_prototype,
        "toString",
        0,
        Arc::new(array_to_string),
    );
}
