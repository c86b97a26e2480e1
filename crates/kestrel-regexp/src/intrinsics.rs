//! Intrinsic objects of a realm

use std::sync::Arc;

use crate::intrinsics_impl;
use crate::object::{
    FunctionData, JsObject, NativeConstructFn, NativeFn, ObjectKind, PropertyAttributes,
    PropertyDescriptor, PropertyKey,
};
use crate::string::JsString;
use crate::value::Value;

/// The realm's built-in prototypes and constructors
pub struct Intrinsics {
    pub object_prototype: Arc<JsObject>,
    pub function_prototype: Arc<JsObject>,
    pub array_prototype: Arc<JsObject>,
    pub regexp_prototype: Arc<JsObject>,
    /// `%RegExp%`
    pub regexp_constructor: Value,
}

impl Intrinsics {
    /// Allocate the intrinsic objects without populating them
    pub fn new() -> Self {
        let object_prototype = Arc::new(JsObject::new(None));
        let function_prototype = Arc::new(JsObject::new(Some(object_prototype.clone())));
        let array_prototype = Arc::new(JsObject::new(Some(object_prototype.clone())));
        let regexp_prototype = Arc::new(JsObject::new(Some(object_prototype.clone())));
        for proto in [
            &object_prototype,
            &function_prototype,
            &array_prototype,
            &regexp_prototype,
        ] {
            proto.mark_as_prototype();
        }
        let mut intrinsics = Self {
            object_prototype,
            function_prototype,
            array_prototype,
            regexp_prototype,
            regexp_constructor: Value::undefined(),
        };
        intrinsics.regexp_constructor = intrinsics_impl::regexp::create_regexp_constructor(&intrinsics);
        intrinsics
    }

    /// Populate prototypes and constructors
    pub fn install(&self) {
        intrinsics_impl::object::init_object_prototype(self);
        intrinsics_impl::object::init_array_prototype(self);
        intrinsics_impl::regexp::init_regexp_prototype(self);
    }

    /// Create a native function object with `name` and `length`
    pub fn function(
        &self,
        name: &str,
        length: u32,
        call: NativeFn,
        construct: Option<NativeConstructFn>,
    ) -> Value {
        let name = JsString::from(name);
        let func = Arc::new(JsObject::with_kind(
            Some(self.function_prototype.clone()),
            ObjectKind::Function(FunctionData {
                name: name.clone(),
                call,
                construct,
            }),
        ));
        let attrs = PropertyAttributes {
            writable: false,
            enumerable: false,
            configurable: true,
        };
        func.define_property(
            PropertyKey::string("length"),
            PropertyDescriptor::data_with_attrs(Value::number(f64::from(length)), attrs),
        );
        func.define_property(
            PropertyKey::string("name"),
            PropertyDescriptor::data_with_attrs(Value::string(name), attrs),
        );
        Value::object(func)
    }

    /// Define a built-in method on `target`
    pub fn define_method(
        &self,
        target: &JsObject,
        key: impl Into<PropertyKey>,
        length: u32,
        call: NativeFn,
    ) {
        let key = key.into();
        let name = match &key {
            PropertyKey::Symbol(sym) => format!("[{}]", sym.description()),
            PropertyKey::String(s) => s.to_rust_string(),
            PropertyKey::Index(i) => i.to_string(),
        };
        let func = self.function(&name, length, call, None);
        target.define_property(
            key,
            PropertyDescriptor::data_with_attrs(func, PropertyAttributes::builtin_method()),
        );
    }

    /// Define a built-in getter on `target`
    pub fn define_getter(&self, target: &JsObject, key: impl Into<PropertyKey>, get: NativeFn) {
        let key = key.into();
        let name = match &key {
            PropertyKey::Symbol(sym) => format!("get [{}]", sym.description()),
            PropertyKey::String(s) => format!("get {s}"),
            PropertyKey::Index(i) => format!("get {i}"),
        };
        let getter = self.function(&name, 0, get, None);
        target.define_property(key, PropertyDescriptor::getter(getter));
    }
}

impl Default for Intrinsics {
    fn default() -> Self {
        Self::new()
    }
}
