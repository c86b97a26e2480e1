//! Realm: intrinsics, matcher and the shared result cache

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use crate::context::NativeContext;
use crate::error::VmResult;
use crate::intrinsics::Intrinsics;
use crate::object::{
    JsObject, NativeConstructFn, NativeFn, ObjectKind, PropertyAttributes, PropertyDescriptor,
    PropertyKey, ShapeId,
};
use crate::regexp::{
    CacheConfig, CacheStats, JsRegExp, Matcher, RegExpFlags, RegressMatcher, ResultCache,
};
use crate::string::JsString;
use crate::value::Value;

/// Realm configuration
#[derive(Debug, Clone)]
pub struct RealmConfig {
    /// Maximum nesting of native calls before `StackOverflow`
    pub max_call_depth: usize,
    /// Consult and populate the replace/split/match result cache
    pub enable_result_cache: bool,
    /// Take the empty-replacement fast path for canonical global regexps
    pub enable_fast_replace: bool,
    /// Result cache sizing and admission
    pub cache: CacheConfig,
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 512,
            enable_result_cache: true,
            enable_fast_replace: true,
            cache: CacheConfig::default(),
        }
    }
}

/// A realm owns the intrinsic objects and per-runtime regexp state
pub struct Realm {
    config: RealmConfig,
    intrinsics: Intrinsics,
    matcher: Arc<dyn Matcher>,
    result_cache: Mutex<ResultCache>,
    /// Shape shared by every unmodified RegExp instance of this realm
    regexp_instance_shape: ShapeId,
    /// Shape of `RegExp.prototype` right after setup
    regexp_prototype_shape: ShapeId,
}

impl Realm {
    /// Create a realm with default configuration
    pub fn new() -> Self {
        Self::with_config(RealmConfig::default())
    }

    /// Create a realm with custom configuration
    pub fn with_config(config: RealmConfig) -> Self {
        Self::with_matcher(config, Arc::new(RegressMatcher::new()))
    }

    /// Create a realm that compiles and runs patterns with `matcher`
    pub fn with_matcher(config: RealmConfig, matcher: Arc<dyn Matcher>) -> Self {
        let intrinsics = Intrinsics::new();
        intrinsics.install();
        let regexp_prototype_shape = intrinsics.regexp_prototype.shape();
        tracing::debug!(
            cache_capacity = config.cache.initial_capacity,
            fast_replace = config.enable_fast_replace,
            "realm initialized"
        );
        Self {
            result_cache: Mutex::new(ResultCache::new(config.cache.clone())),
            config,
            intrinsics,
            matcher,
            regexp_instance_shape: ShapeId::fresh(),
            regexp_prototype_shape,
        }
    }

    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    /// A fresh native context
    pub fn context(&self) -> NativeContext<'_> {
        NativeContext::new(self)
    }

    /// Lock the result cache
    pub fn result_cache(&self) -> MutexGuard<'_, ResultCache> {
        self.result_cache.lock()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.result_cache.lock().stats()
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// New ordinary object inheriting from `Object.prototype`
    pub fn new_object(&self) -> Arc<JsObject> {
        Arc::new(JsObject::new(Some(self.intrinsics.object_prototype.clone())))
    }

    /// New array inheriting from `Array.prototype`
    pub fn new_array(&self, values: Vec<Value>) -> Arc<JsObject> {
        Arc::new(JsObject::array(
            Some(self.intrinsics.array_prototype.clone()),
            values,
        ))
    }

    /// New native function
    pub fn new_function<F>(&self, name: &str, length: u32, f: F) -> Value
    where
        F: Fn(&Value, &[Value], &mut NativeContext<'_>) -> VmResult<Value> + Send + Sync + 'static,
    {
        self.intrinsics.function(name, length, Arc::new(f), None)
    }

    /// New native constructor
    pub fn new_constructor<F, C>(&self, name: &str, length: u32, call: F, construct: C) -> Value
    where
        F: Fn(&Value, &[Value], &mut NativeContext<'_>) -> VmResult<Value> + Send + Sync + 'static,
        C: Fn(&[Value], &mut NativeContext<'_>) -> VmResult<Value> + Send + Sync + 'static,
    {
        let call: NativeFn = Arc::new(call);
        let construct: NativeConstructFn = Arc::new(construct);
        self.intrinsics.function(name, length, call, Some(construct))
    }

    /// RegExpAlloc + RegExpInitialize with already-coerced source and flags.
    ///
    /// Instances whose prototype is this realm's `RegExp.prototype` share the
    /// canonical instance shape; any other prototype gets a fresh shape.
    pub fn regexp_alloc(
        &self,
        prototype: Arc<JsObject>,
        source: JsString,
        flags: RegExpFlags,
    ) -> VmResult<Arc<JsObject>> {
        let program = self.matcher.compile(&source, flags)?;
        let shape = if Arc::ptr_eq(&prototype, &self.intrinsics.regexp_prototype) {
            self.regexp_instance_shape
        } else {
            ShapeId::fresh()
        };
        let last_index = (
            PropertyKey::string("lastIndex"),
            PropertyDescriptor::data_with_attrs(
                Value::number(0.0),
                PropertyAttributes {
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            ),
        );
        Ok(Arc::new(JsObject::from_parts(
            Some(prototype),
            ObjectKind::RegExp(JsRegExp::new(source, flags, program)),
            vec![last_index],
            shape,
        )))
    }

    /// `new RegExp(source, flags)` from Rust text
    pub fn new_regexp(&self, source: &str, flags: &str) -> VmResult<Arc<JsObject>> {
        let flags = RegExpFlags::parse(&JsString::from(flags))?;
        self.regexp_alloc(
            self.intrinsics.regexp_prototype.clone(),
            JsString::from(source),
            flags,
        )
    }

    /// Whether `obj` is an unmodified RegExp instance of this realm whose
    /// prototype is still pristine
    pub fn is_canonical_regexp(&self, obj: &JsObject) -> bool {
        obj.as_regexp().is_some()
            && obj.shape() == self.regexp_instance_shape
            && self.intrinsics.regexp_prototype.shape() == self.regexp_prototype_shape
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}
