//! JavaScript objects with shape identity
//!
//! Every object carries a [`ShapeId`] that changes whenever its layout
//! changes: a key is added or deleted, a descriptor is redefined, or the
//! prototype is swapped. Objects marked as prototypes also change shape on
//! every value write. Writing an existing writable data property of an
//! ordinary instance keeps its shape, so `lastIndex` updates never knock a
//! regexp off the fast path.

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::NativeContext;
use crate::error::VmResult;
use crate::regexp::JsRegExp;
use crate::string::JsString;
use crate::value::Value;

/// Well-known symbols used by the RegExp built-ins
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WellKnownSymbol {
    Species,
    Match,
    Replace,
    Search,
    Split,
}

impl WellKnownSymbol {
    /// Description, as printed by `Symbol.prototype.toString`
    pub fn description(self) -> &'static str {
        match self {
            Self::Species => "Symbol.species",
            Self::Match => "Symbol.match",
            Self::Replace => "Symbol.replace",
            Self::Search => "Symbol.search",
            Self::Split => "Symbol.split",
        }
    }
}

/// Property key (string, symbol or array index)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String property key
    String(JsString),
    /// Well-known symbol key
    Symbol(WellKnownSymbol),
    /// Integer index (for arrays)
    Index(u32),
}

impl PropertyKey {
    /// Create a string property key
    pub fn string(s: &str) -> Self {
        Self::String(JsString::from(s))
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::Index(i)
    }
}

impl From<WellKnownSymbol> for PropertyKey {
    fn from(sym: WellKnownSymbol) -> Self {
        Self::Symbol(sym)
    }
}

/// Property attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyAttributes {
    /// Property is writable
    pub writable: bool,
    /// Property is enumerable
    pub enumerable: bool,
    /// Property is configurable
    pub configurable: bool,
}

impl PropertyAttributes {
    /// Default data property attributes
    pub const fn data() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Built-in method attributes (writable, configurable, not enumerable)
    pub const fn builtin_method() -> Self {
        Self {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Built-in accessor attributes (configurable, not enumerable)
    pub const fn builtin_accessor() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: true,
        }
    }

    /// Non-writable, non-enumerable, non-configurable
    pub const fn frozen() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }
}

/// Property descriptor
#[derive(Clone, Debug)]
pub enum PropertyDescriptor {
    /// Data property
    Data {
        /// The value
        value: Value,
        /// Attributes
        attributes: PropertyAttributes,
    },
    /// Accessor property
    Accessor {
        /// Getter function
        get: Option<Value>,
        /// Setter function
        set: Option<Value>,
        /// Attributes
        attributes: PropertyAttributes,
    },
}

impl PropertyDescriptor {
    /// Create a data property
    pub fn data(value: Value) -> Self {
        Self::Data {
            value,
            attributes: PropertyAttributes::data(),
        }
    }

    /// Create a data property with specific attributes
    pub fn data_with_attrs(value: Value, attributes: PropertyAttributes) -> Self {
        Self::Data { value, attributes }
    }

    /// Create a getter-only accessor
    pub fn getter(get: Value) -> Self {
        Self::Accessor {
            get: Some(get),
            set: None,
            attributes: PropertyAttributes::builtin_accessor(),
        }
    }

    /// Get the value (for data properties)
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Check if writable
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { attributes, .. } => attributes.writable,
            Self::Accessor { .. } => false,
        }
    }

    /// Check if configurable
    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { attributes, .. } | Self::Accessor { attributes, .. } => {
                attributes.configurable
            }
        }
    }
}

/// Hidden-class identity of an object layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeId(u64);

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

impl ShapeId {
    /// Allocate a shape id never handed out before
    pub fn fresh() -> Self {
        Self(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Native call behaviour: `(this, args, ncx)`
pub type NativeFn =
    Arc<dyn Fn(&Value, &[Value], &mut NativeContext<'_>) -> VmResult<Value> + Send + Sync>;

/// Native construct behaviour: `(args, ncx)`
pub type NativeConstructFn =
    Arc<dyn Fn(&[Value], &mut NativeContext<'_>) -> VmResult<Value> + Send + Sync>;

/// Internal slots of a native function object
pub struct FunctionData {
    /// Function name
    pub name: JsString,
    /// [[Call]]
    pub call: NativeFn,
    /// [[Construct]], if the function is a constructor
    pub construct: Option<NativeConstructFn>,
}

/// What kind of exotic (or not) object this is
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Dense array
    Array(RwLock<Vec<Value>>),
    /// Native function
    Function(FunctionData),
    /// RegExp instance
    RegExp(JsRegExp),
}

/// Object flags
#[derive(Clone, Copy, Debug)]
pub struct ObjectFlags {
    /// Used as a prototype: every write changes its shape
    pub is_prototype: bool,
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self {
            is_prototype: false,
        }
    }
}

type PropertyMap = IndexMap<PropertyKey, PropertyDescriptor, FxBuildHasher>;

/// A JavaScript object
///
/// Thread-safe with interior mutability.
pub struct JsObject {
    /// Properties storage, in insertion order
    properties: RwLock<PropertyMap>,
    /// Prototype (None for the root of the chain)
    prototype: RwLock<Option<Arc<JsObject>>>,
    /// Kind and internal slots
    kind: ObjectKind,
    /// Current shape
    shape: AtomicU64,
    /// Object flags
    flags: RwLock<ObjectFlags>,
}

impl JsObject {
    /// Create a new empty object
    pub fn new(prototype: Option<Arc<JsObject>>) -> Self {
        Self::with_kind(prototype, ObjectKind::Ordinary)
    }

    /// Create an object of the given kind with a fresh shape
    pub fn with_kind(prototype: Option<Arc<JsObject>>, kind: ObjectKind) -> Self {
        Self::from_parts(prototype, kind, Vec::new(), ShapeId::fresh())
    }

    /// Create an object with pre-populated own properties and a known shape.
    ///
    /// Objects built from the same property list and shape id are layout
    /// compatible; the realm uses this for its canonical RegExp instances.
    pub fn from_parts(
        prototype: Option<Arc<JsObject>>,
        kind: ObjectKind,
        properties: Vec<(PropertyKey, PropertyDescriptor)>,
        shape: ShapeId,
    ) -> Self {
        Self {
            properties: RwLock::new(properties.into_iter().collect()),
            prototype: RwLock::new(prototype),
            kind,
            shape: AtomicU64::new(shape.0),
            flags: RwLock::new(ObjectFlags::default()),
        }
    }

    /// Create a new array holding `values`
    pub fn array(prototype: Option<Arc<JsObject>>, values: Vec<Value>) -> Self {
        Self::with_kind(prototype, ObjectKind::Array(RwLock::new(values)))
    }

    /// Kind and internal slots
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// RegExp internal slots, if this is a RegExp instance
    pub fn as_regexp(&self) -> Option<&JsRegExp> {
        match &self.kind {
            ObjectKind::RegExp(re) => Some(re),
            _ => None,
        }
    }

    /// Function internal slots, if this is a function
    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        self.as_function().is_some_and(|f| f.construct.is_some())
    }

    /// Check if object is an array
    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array(_))
    }

    /// Current shape
    pub fn shape(&self) -> ShapeId {
        ShapeId(self.shape.load(Ordering::Acquire))
    }

    fn transition(&self) {
        self.shape.store(ShapeId::fresh().0, Ordering::Release);
    }

    /// Mark this object as a prototype
    pub fn mark_as_prototype(&self) {
        self.flags.write().is_prototype = true;
        self.transition();
    }

    /// Get prototype
    pub fn prototype(&self) -> Option<Arc<JsObject>> {
        self.prototype.read().clone()
    }

    /// Replace prototype
    pub fn set_prototype(&self, prototype: Option<Arc<JsObject>>) {
        *self.prototype.write() = prototype;
        self.transition();
    }

    /// Own property descriptor, including array elements and `length`
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        if let ObjectKind::Array(elements) = &self.kind {
            match key {
                PropertyKey::Index(i) => {
                    return elements
                        .read()
                        .get(*i as usize)
                        .cloned()
                        .map(PropertyDescriptor::data);
                }
                PropertyKey::String(s) if s.eq_str("length") => {
                    let len = elements.read().len();
                    return Some(PropertyDescriptor::data_with_attrs(
                        Value::number(len as f64),
                        PropertyAttributes {
                            writable: true,
                            enumerable: false,
                            configurable: false,
                        },
                    ));
                }
                _ => {}
            }
        }
        self.properties.read().get(key).cloned()
    }

    /// Find a descriptor on this object or its prototype chain
    pub fn lookup_property_descriptor(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        if let Some(desc) = self.get_own_property(key) {
            return Some(desc);
        }
        let mut current = self.prototype();
        while let Some(obj) = current {
            if let Some(desc) = obj.get_own_property(key) {
                return Some(desc);
            }
            current = obj.prototype();
        }
        None
    }

    /// Get a data value by key, walking the prototype chain.
    ///
    /// Accessors are not invoked; use `NativeContext::get` for that.
    pub fn get(&self, key: &PropertyKey) -> Option<Value> {
        self.lookup_property_descriptor(key)
            .and_then(|desc| desc.value().cloned())
    }

    /// Set an own data property, creating it if absent
    pub fn set(&self, key: PropertyKey, value: Value) -> bool {
        if let (ObjectKind::Array(elements), PropertyKey::Index(i)) = (&self.kind, &key) {
            let mut elements = elements.write();
            let idx = *i as usize;
            if idx < elements.len() {
                elements[idx] = value;
                return true;
            }
            elements.resize(idx + 1, Value::undefined());
            elements[idx] = value;
            return true;
        }

        let is_prototype = self.flags.read().is_prototype;
        let mut props = self.properties.write();
        let added = match props.get_mut(&key) {
            Some(PropertyDescriptor::Data {
                value: slot,
                attributes,
            }) if attributes.writable => {
                *slot = value;
                false
            }
            Some(_) => return false,
            None => {
                props.insert(key, PropertyDescriptor::data(value));
                true
            }
        };
        drop(props);
        if added || is_prototype {
            self.transition();
        }
        true
    }

    /// Define a property with descriptor
    pub fn define_property(&self, key: PropertyKey, desc: PropertyDescriptor) -> bool {
        if let (ObjectKind::Array(_), PropertyKey::Index(_), PropertyDescriptor::Data { value, .. }) =
            (&self.kind, &key, &desc)
        {
            return self.set(key, value.clone());
        }
        {
            let mut props = self.properties.write();
            match props.get_mut(&key) {
                Some(existing) => {
                    if !existing.is_configurable() {
                        return false;
                    }
                    *existing = desc;
                }
                None => {
                    props.insert(key, desc);
                }
            }
        }
        self.transition();
        true
    }

    /// Delete property
    pub fn delete(&self, key: &PropertyKey) -> bool {
        {
            let mut props = self.properties.write();
            match props.get(key) {
                Some(desc) if !desc.is_configurable() => return false,
                Some(_) => {
                    props.shift_remove(key);
                }
                None => return true,
            }
        }
        self.transition();
        true
    }

    /// Check if object has own property
    pub fn has_own(&self, key: &PropertyKey) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Check if object has property (including prototype chain)
    pub fn has(&self, key: &PropertyKey) -> bool {
        self.lookup_property_descriptor(key).is_some()
    }

    /// Get array length (for arrays)
    pub fn array_length(&self) -> usize {
        match &self.kind {
            ObjectKind::Array(elements) => elements.read().len(),
            _ => 0,
        }
    }

    /// Snapshot of the array elements
    pub fn array_elements(&self) -> Vec<Value> {
        match &self.kind {
            ObjectKind::Array(elements) => elements.read().clone(),
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Debug for JsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            ObjectKind::Ordinary => "Ordinary",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::RegExp(_) => "RegExp",
        };
        f.debug_struct("JsObject")
            .field("kind", &kind)
            .field("properties", &self.properties.read().len())
            .field("shape", &self.shape())
            .finish()
    }
}
