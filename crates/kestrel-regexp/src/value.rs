//! JavaScript values

use std::fmt;
use std::sync::Arc;

use crate::object::JsObject;
use crate::string::JsString;

/// A JavaScript value
#[derive(Clone)]
pub enum Value {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Boolean(bool),
    /// IEEE-754 number
    Number(f64),
    /// String
    String(JsString),
    /// Object (ordinary, array, function or regexp)
    Object(Arc<JsObject>),
}

impl Value {
    /// `undefined`
    pub const fn undefined() -> Self {
        Self::Undefined
    }

    /// `null`
    pub const fn null() -> Self {
        Self::Null
    }

    /// Boolean value
    pub const fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    /// Number value
    pub const fn number(n: f64) -> Self {
        Self::Number(n)
    }

    /// String value
    pub fn string(s: JsString) -> Self {
        Self::String(s)
    }

    /// Object value
    pub fn object(obj: Arc<JsObject>) -> Self {
        Self::Object(obj)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Check if this value can be called
    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(|o| o.is_callable())
    }

    /// Check if this value can be used with `new`
    pub fn is_constructor(&self) -> bool {
        self.as_object().is_some_and(|o| o.is_constructor())
    }

    pub fn as_object(&self) -> Option<&Arc<JsObject>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// ToBoolean (infallible)
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Number(n) => !(n.is_nan() || *n == 0.0),
            Self::String(s) => !s.is_empty(),
            Self::Object(_) => true,
        }
    }

    /// SameValue
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                a == b && a.is_sign_negative() == b.is_sign_negative()
            }
            _ => self == other,
        }
    }

    /// `typeof` result
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "object",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(o) if o.is_callable() => "function",
            Self::Object(_) => "object",
        }
    }

    /// Side-effect free rendering, used for error messages
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => s.to_rust_string(),
            Self::Object(o) if o.is_callable() => "[object Function]".to_string(),
            Self::Object(o) if o.is_array() => "[object Array]".to_string(),
            Self::Object(_) => "[object Object]".to_string(),
        }
    }
}

/// Number::toString for radix 10
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{}", n as i128);
    }
    format!("{n}")
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            _ => f.write_str(&self.to_display_string()),
        }
    }
}

impl From<JsString> for Value {
    fn from(s: JsString) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(JsString::from(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Arc<JsObject>> for Value {
    fn from(obj: Arc<JsObject>) -> Self {
        Self::Object(obj)
    }
}
