//! Native call context: the generic property protocol and coercions
//!
//! Everything here may run user code (getters, setters, `toString`,
//! `valueOf`), so every operation returns a `VmResult` and callers propagate
//! failures with `?`.

use std::sync::Arc;

use crate::error::{VmError, VmResult};
use crate::object::{JsObject, PropertyDescriptor, PropertyKey, WellKnownSymbol};
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::Value;

/// Preferred type for ToPrimitive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferredType {
    String,
    Number,
}

/// Context handed to native functions
pub struct NativeContext<'a> {
    realm: &'a Realm,
    depth: usize,
}

impl<'a> NativeContext<'a> {
    pub fn new(realm: &'a Realm) -> Self {
        Self { realm, depth: 0 }
    }

    /// The realm this context runs in
    pub fn realm(&self) -> &'a Realm {
        self.realm
    }

    // ========================================================================
    // Property protocol
    // ========================================================================

    /// Get(O, P)
    pub fn get(&mut self, obj: &Arc<JsObject>, key: &PropertyKey) -> VmResult<Value> {
        self.get_with_receiver(obj, key, &Value::object(obj.clone()))
    }

    /// Get(O, P) with an explicit receiver for getter calls
    pub fn get_with_receiver(
        &mut self,
        obj: &Arc<JsObject>,
        key: &PropertyKey,
        receiver: &Value,
    ) -> VmResult<Value> {
        match obj.lookup_property_descriptor(key) {
            Some(PropertyDescriptor::Data { value, .. }) => Ok(value),
            Some(PropertyDescriptor::Accessor { get, .. }) => match get {
                Some(getter) if !getter.is_undefined() => {
                    self.call_function(&getter, receiver.clone(), &[])
                }
                _ => Ok(Value::undefined()),
            },
            None => Ok(Value::undefined()),
        }
    }

    /// Get by string name
    pub fn get_named(&mut self, obj: &Arc<JsObject>, name: &str) -> VmResult<Value> {
        self.get(obj, &PropertyKey::string(name))
    }

    /// Set(O, P, V, true)
    pub fn set(&mut self, obj: &Arc<JsObject>, key: &PropertyKey, value: Value) -> VmResult<()> {
        match obj.lookup_property_descriptor(key) {
            Some(PropertyDescriptor::Accessor { set, .. }) => match set {
                Some(setter) if !setter.is_undefined() => {
                    self.call_function(&setter, Value::object(obj.clone()), &[value])?;
                    Ok(())
                }
                _ => Err(VmError::type_error(format!(
                    "Cannot set property {} which has only a getter",
                    key_display(key)
                ))),
            },
            Some(PropertyDescriptor::Data { attributes, .. }) if !attributes.writable => {
                Err(VmError::type_error(format!(
                    "Cannot assign to read only property '{}'",
                    key_display(key)
                )))
            }
            _ => {
                if obj.set(key.clone(), value) {
                    Ok(())
                } else {
                    Err(VmError::type_error(format!(
                        "Cannot assign to property {}",
                        key_display(key)
                    )))
                }
            }
        }
    }

    /// Set by string name
    pub fn set_named(&mut self, obj: &Arc<JsObject>, name: &str, value: Value) -> VmResult<()> {
        self.set(obj, &PropertyKey::string(name), value)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn enter(&mut self) -> VmResult<()> {
        if self.depth >= self.realm.config().max_call_depth {
            return Err(VmError::StackOverflow);
        }
        self.depth += 1;
        Ok(())
    }

    /// Call(F, this, args)
    pub fn call_function(&mut self, func: &Value, this: Value, args: &[Value]) -> VmResult<Value> {
        let Some(call) = func
            .as_object()
            .and_then(|o| o.as_function())
            .map(|f| f.call.clone())
        else {
            return Err(VmError::type_error(format!(
                "{} is not a function",
                func.to_display_string()
            )));
        };
        self.enter()?;
        let result = call(&this, args, self);
        self.depth -= 1;
        result
    }

    /// Construct(C, args)
    pub fn construct(&mut self, ctor: &Value, args: &[Value]) -> VmResult<Value> {
        let Some(construct) = ctor
            .as_object()
            .and_then(|o| o.as_function())
            .and_then(|f| f.construct.clone())
        else {
            return Err(VmError::type_error(format!(
                "{} is not a constructor",
                ctor.to_display_string()
            )));
        };
        self.enter()?;
        let result = construct(args, self);
        self.depth -= 1;
        let value = result?;
        if !value.is_object() {
            return Err(VmError::type_error("constructor did not return an object"));
        }
        Ok(value)
    }

    /// SpeciesConstructor(O, defaultConstructor)
    pub fn species_constructor(
        &mut self,
        obj: &Arc<JsObject>,
        default_constructor: &Value,
    ) -> VmResult<Value> {
        let c = self.get_named(obj, "constructor")?;
        if c.is_undefined() {
            return Ok(default_constructor.clone());
        }
        let Some(c_obj) = c.as_object().cloned() else {
            return Err(VmError::type_error("object.constructor is not an object"));
        };
        let species = self.get(&c_obj, &PropertyKey::Symbol(WellKnownSymbol::Species))?;
        if species.is_nullish() {
            return Ok(default_constructor.clone());
        }
        if species.is_constructor() {
            return Ok(species);
        }
        Err(VmError::type_error(
            "object.constructor[Symbol.species] is not a constructor",
        ))
    }

    // ========================================================================
    // Coercions
    // ========================================================================

    /// ToPrimitive
    pub fn to_primitive(&mut self, value: &Value, hint: PreferredType) -> VmResult<Value> {
        let Some(obj) = value.as_object() else {
            return Ok(value.clone());
        };
        let order = match hint {
            PreferredType::String => ["toString", "valueOf"],
            PreferredType::Number => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get_named(obj, name)?;
            if method.is_callable() {
                let result = self.call_function(&method, value.clone(), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(VmError::type_error("Cannot convert object to primitive value"))
    }

    /// ToString
    pub fn to_string_value(&mut self, value: &Value) -> VmResult<JsString> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                self.to_string_value(&prim)
            }
            other => Ok(JsString::from(other.to_display_string())),
        }
    }

    /// ToNumber
    pub fn to_number_value(&mut self, value: &Value) -> VmResult<f64> {
        match value {
            Value::Undefined => Ok(f64::NAN),
            Value::Null => Ok(0.0),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Ok(*n),
            Value::String(s) => Ok(string_to_number(s)),
            Value::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::Number)?;
                self.to_number_value(&prim)
            }
        }
    }

    /// ToLength
    pub fn to_length(&mut self, value: &Value) -> VmResult<f64> {
        Ok(to_length(self.to_number_value(value)?))
    }

    /// ToIntegerOrInfinity
    pub fn to_integer_or_infinity(&mut self, value: &Value) -> VmResult<f64> {
        Ok(to_integer_or_infinity(self.to_number_value(value)?))
    }

    /// ToUint32
    pub fn to_uint32(&mut self, value: &Value) -> VmResult<u32> {
        Ok(to_uint32(self.to_number_value(value)?))
    }

    /// Create an array in this realm
    pub fn create_array(&self, values: Vec<Value>) -> Arc<JsObject> {
        self.realm.new_array(values)
    }
}

fn key_display(key: &PropertyKey) -> String {
    match key {
        PropertyKey::String(s) => s.to_rust_string(),
        PropertyKey::Symbol(sym) => format!("[{}]", sym.description()),
        PropertyKey::Index(i) => i.to_string(),
    }
}

/// ToLength: clamp to [0, 2^53 - 1] integer
pub fn to_length(n: f64) -> f64 {
    if n.is_nan() || n <= 0.0 {
        return 0.0;
    }
    n.trunc().min(9007199254740991.0)
}

/// ToIntegerOrInfinity
pub fn to_integer_or_infinity(n: f64) -> f64 {
    if n.is_nan() {
        return 0.0;
    }
    if n == 0.0 || n.is_infinite() {
        return n;
    }
    n.trunc()
}

/// ToUint32
pub fn to_uint32(n: f64) -> u32 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32
}

/// StringToNumber for decimal, hex/octal/binary and `Infinity` literals
pub fn string_to_number(s: &JsString) -> f64 {
    let text = s.to_rust_string();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) =>
        {
            trimmed.parse::<f64>().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}
