//! Content-addressed result cache for replace, split and match
//!
//! A power-of-two table probed at two slots: `hash & mask` and
//! `(hash + 1) & mask`. The table starts small and grows once to its
//! maximum size the first time a secondary slot is needed; existing entries
//! keep their positions when it grows.
//!
//! When both probe slots hold other keys, the secondary slot is cleared and
//! the primary slot is overwritten with the new key, so both previous
//! occupants are lost.

use crate::regexp::flags::RegExpFlags;
use crate::string::JsString;
use crate::value::Value;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Slots allocated up front (power of two)
    pub initial_capacity: usize,
    /// Slots after the one-time growth (power of two, >= initial)
    pub max_capacity: usize,
    /// Inputs at most this long stop being cached once the large-string
    /// budget runs out
    pub min_input_length: usize,
    /// Number of inputs longer than `min_input_length` seen before the
    /// length threshold switches on
    pub large_string_budget: u32,
    /// Double collisions tolerated before match caching switches off
    pub conflict_budget: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0x10,
            max_capacity: 0x1000,
            min_input_length: 1000,
            large_string_budget: 10,
            conflict_budget: 100,
        }
    }
}

/// Operation whose result a slot holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKind {
    Replace,
    Split,
    Match,
}

/// A cached result value
#[derive(Clone, Debug, PartialEq)]
pub enum CachedResult {
    /// Result string of a global replace
    Replace(JsString),
    /// Elements of a split result
    Split(Vec<Value>),
    /// Matched substrings of a global match
    Match(Vec<Value>),
}

impl CachedResult {
    pub fn kind(&self) -> CacheKind {
        match self {
            Self::Replace(_) => CacheKind::Replace,
            Self::Split(_) => CacheKind::Split,
            Self::Match(_) => CacheKind::Match,
        }
    }
}

/// Cache key: pattern source, flag bits, input and an optional extra
/// component (the replacement template for replace results)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKey {
    pub pattern: JsString,
    pub flags: RegExpFlags,
    pub input: JsString,
    pub extend: Option<JsString>,
}

impl CacheKey {
    pub fn new(pattern: JsString, flags: RegExpFlags, input: JsString) -> Self {
        Self {
            pattern,
            flags,
            input,
            extend: None,
        }
    }

    /// Same key with an extra component
    pub fn with_extend(mut self, extend: JsString) -> Self {
        self.extend = Some(extend);
        self
    }

    /// Slot hash; the extra component does not take part
    pub fn hash(&self) -> u32 {
        self.pattern
            .hash_code()
            .wrapping_add(self.flags.bits())
            .wrapping_add(self.input.hash_code())
    }
}

/// A hit: the cached value and the `lastIndex` recorded with it
#[derive(Clone, Debug, PartialEq)]
pub struct CacheHit {
    pub result: CachedResult,
    pub last_index: usize,
}

#[derive(Debug)]
struct CacheEntry {
    key: CacheKey,
    last_index: usize,
    replace: Option<JsString>,
    split: Option<Vec<Value>>,
    matches: Option<Vec<Value>>,
}

impl CacheEntry {
    fn new(key: CacheKey, last_index: usize) -> Self {
        Self {
            key,
            last_index,
            replace: None,
            split: None,
            matches: None,
        }
    }

    fn store(&mut self, result: CachedResult, last_index: usize) {
        self.last_index = last_index;
        match result {
            CachedResult::Replace(s) => self.replace = Some(s),
            CachedResult::Split(v) => self.split = Some(v),
            CachedResult::Match(v) => self.matches = Some(v),
        }
    }

    fn load(&self, kind: CacheKind) -> Option<CachedResult> {
        match kind {
            CacheKind::Replace => self.replace.clone().map(CachedResult::Replace),
            CacheKind::Split => self.split.clone().map(CachedResult::Split),
            CacheKind::Match => self.matches.clone().map(CachedResult::Match),
        }
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub capacity: usize,
    /// Occupancy counter. Double-collision evictions drop two entries but
    /// decrement this once, so it can run ahead of the real occupancy.
    pub count: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub large_string_budget: u32,
    pub conflict_budget: u32,
    pub length_threshold: usize,
}

/// Two-probe result cache
#[derive(Debug)]
pub struct ResultCache {
    config: CacheConfig,
    slots: Vec<Option<CacheEntry>>,
    count: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    large_string_budget: u32,
    conflict_budget: u32,
    length_threshold: usize,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        debug_assert!(config.initial_capacity.is_power_of_two());
        debug_assert!(config.max_capacity.is_power_of_two());
        debug_assert!(config.max_capacity >= config.initial_capacity);
        let slots = std::iter::repeat_with(|| None)
            .take(config.initial_capacity)
            .collect();
        Self {
            large_string_budget: config.large_string_budget,
            conflict_budget: config.conflict_budget,
            config,
            slots,
            count: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            length_threshold: 0,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether an operation of `kind` on an input of `input_len` code units
    /// may use the cache.
    ///
    /// Each call on an input longer than `min_input_length` spends one unit
    /// of the large-string budget; once the budget is gone only inputs longer
    /// than `min_input_length` qualify. Match caching also stops when either
    /// budget is exhausted.
    pub fn admits(&mut self, kind: CacheKind, input_len: usize) -> bool {
        if self.large_string_budget != 0 {
            if input_len > self.config.min_input_length {
                self.large_string_budget -= 1;
            }
        } else {
            self.length_threshold = self.config.min_input_length;
        }
        if input_len <= self.length_threshold {
            return false;
        }
        match kind {
            CacheKind::Match => self.large_string_budget != 0 && self.conflict_budget != 0,
            CacheKind::Replace | CacheKind::Split => true,
        }
    }

    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    fn slot_matches(&self, index: usize, key: &CacheKey) -> bool {
        self.slots[index]
            .as_ref()
            .is_some_and(|entry| entry.key == *key)
    }

    /// Look up a `kind` result for `key`
    pub fn lookup(&mut self, key: &CacheKey, kind: CacheKind) -> Option<CacheHit> {
        let hash = key.hash() as usize;
        let mut index = hash & self.mask();
        if !self.slot_matches(index, key) {
            index = (index + 1) & self.mask();
            if !self.slot_matches(index, key) {
                self.misses += 1;
                return None;
            }
        }
        let entry = self.slots[index].as_ref()?;
        let Some(result) = entry.load(kind) else {
            self.misses += 1;
            return None;
        };
        self.hits += 1;
        tracing::trace!(slot = index, ?kind, "regexp result cache hit");
        Some(CacheHit {
            result,
            last_index: entry.last_index,
        })
    }

    /// Record `result` for `key`
    pub fn insert(&mut self, key: CacheKey, result: CachedResult, last_index: usize) {
        let hash = key.hash() as usize;
        let entry = hash & self.mask();
        tracing::trace!(slot = entry, kind = ?result.kind(), "regexp result cache insert");

        if self.slots[entry].is_none() {
            self.count += 1;
            self.put(entry, key, result, last_index);
            return;
        }
        if self.slot_matches(entry, &key) {
            self.update(entry, result, last_index);
            return;
        }

        let mut entry2 = (entry + 1) & self.mask();
        if self.slots.len() < self.config.max_capacity {
            self.grow();
            entry2 = hash & self.mask();
        }

        if self.slots[entry2].is_none() {
            self.count += 1;
            self.put(entry2, key, result, last_index);
        } else if self.slot_matches(entry2, &key) {
            self.update(entry2, result, last_index);
        } else {
            self.conflict_budget = self.conflict_budget.saturating_sub(1);
            self.count = self.count.saturating_sub(1);
            self.evictions += 1;
            tracing::debug!(
                primary = entry,
                secondary = entry2,
                conflict_budget = self.conflict_budget,
                "regexp result cache double collision, evicting"
            );
            self.slots[entry2] = None;
            self.put(entry, key, result, last_index);
        }
    }

    fn put(&mut self, index: usize, key: CacheKey, result: CachedResult, last_index: usize) {
        let mut fresh = CacheEntry::new(key, last_index);
        fresh.store(result, last_index);
        self.slots[index] = Some(fresh);
    }

    fn update(&mut self, index: usize, result: CachedResult, last_index: usize) {
        if let Some(existing) = self.slots[index].as_mut() {
            existing.store(result, last_index);
        }
    }

    fn grow(&mut self) {
        let target = self.config.max_capacity;
        tracing::debug!(
            from = self.slots.len(),
            to = target,
            "growing regexp result cache"
        );
        self.slots.resize_with(target, || None);
    }

    /// Drop every entry and reset counters and budgets
    pub fn clear(&mut self) {
        self.slots = std::iter::repeat_with(|| None)
            .take(self.config.initial_capacity)
            .collect();
        self.count = 0;
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
        self.large_string_budget = self.config.large_string_budget;
        self.conflict_budget = self.config.conflict_budget;
        self.length_threshold = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.slots.len(),
            count: self.count,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            large_string_budget: self.large_string_budget,
            conflict_budget: self.conflict_budget,
            length_threshold: self.length_threshold,
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(capacity: usize) -> ResultCache {
        ResultCache::new(CacheConfig {
            initial_capacity: capacity,
            max_capacity: capacity,
            ..CacheConfig::default()
        })
    }

    fn key(pattern: &str, input: &str) -> CacheKey {
        CacheKey::new(
            JsString::from(pattern),
            RegExpFlags::from_bits(RegExpFlags::GLOBAL),
            JsString::from(input),
        )
    }

    /// Find `n` distinct keys sharing the primary slot of the first one
    fn colliding_keys(capacity: usize, n: usize) -> Vec<CacheKey> {
        let mask = capacity - 1;
        let first = key("a", "input-0");
        let slot = first.hash() as usize & mask;
        let mut keys = vec![first];
        let mut i = 1;
        while keys.len() < n {
            let candidate = key("a", &format!("input-{i}"));
            if candidate.hash() as usize & mask == slot {
                keys.push(candidate);
            }
            i += 1;
        }
        keys
    }

    fn replace(s: &str) -> CachedResult {
        CachedResult::Replace(JsString::from(s))
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut cache = ResultCache::default();
        let k = key("b", "abcabc");
        assert!(cache.lookup(&k, CacheKind::Replace).is_none());
        cache.insert(k.clone(), replace("acac"), 0);
        let hit = cache.lookup(&k, CacheKind::Replace).unwrap();
        assert_eq!(hit.result, replace("acac"));
        assert_eq!(hit.last_index, 0);
        assert!(cache.lookup(&k, CacheKind::Split).is_none());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_independent_kind_slots() {
        let mut cache = ResultCache::default();
        let k = key(",", "a,b");
        cache.insert(k.clone(), replace("ab"), 0);
        cache.insert(
            k.clone(),
            CachedResult::Split(vec![Value::from("a"), Value::from("b")]),
            0,
        );
        assert_eq!(
            cache.lookup(&k, CacheKind::Replace).unwrap().result,
            replace("ab")
        );
        assert!(matches!(
            cache.lookup(&k, CacheKind::Split).unwrap().result,
            CachedResult::Split(ref v) if v.len() == 2
        ));
        assert_eq!(cache.stats().count, 1);
    }

    #[test]
    fn test_extend_is_part_of_key() {
        let mut cache = ResultCache::default();
        let base = key("b", "abc");
        cache.insert(base.clone().with_extend(JsString::from("x")), replace("axc"), 0);
        assert!(
            cache
                .lookup(&base.clone().with_extend(JsString::from("y")), CacheKind::Replace)
                .is_none()
        );
        assert!(
            cache
                .lookup(&base.with_extend(JsString::from("x")), CacheKind::Replace)
                .is_some()
        );
    }

    #[test]
    fn test_two_colliding_keys_both_retained() {
        let mut cache = fixed(16);
        let keys = colliding_keys(16, 2);
        cache.insert(keys[0].clone(), replace("first"), 0);
        cache.insert(keys[1].clone(), replace("second"), 0);
        assert_eq!(
            cache.lookup(&keys[0], CacheKind::Replace).unwrap().result,
            replace("first")
        );
        assert_eq!(
            cache.lookup(&keys[1], CacheKind::Replace).unwrap().result,
            replace("second")
        );
        assert_eq!(cache.stats().count, 2);
    }

    #[test]
    fn test_third_colliding_key_evicts() {
        let mut cache = fixed(16);
        let keys = colliding_keys(16, 3);
        cache.insert(keys[0].clone(), replace("first"), 0);
        cache.insert(keys[1].clone(), replace("second"), 0);
        cache.insert(keys[2].clone(), replace("third"), 0);

        assert_eq!(
            cache.lookup(&keys[2], CacheKind::Replace).unwrap().result,
            replace("third")
        );
        assert!(cache.lookup(&keys[0], CacheKind::Replace).is_none());
        assert!(cache.lookup(&keys[1], CacheKind::Replace).is_none());

        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.conflict_budget, CacheConfig::default().conflict_budget - 1);
    }

    #[test]
    fn test_grows_on_first_collision() {
        let mut cache = ResultCache::new(CacheConfig {
            initial_capacity: 16,
            max_capacity: 64,
            ..CacheConfig::default()
        });
        let first = key("a", "input-0");
        let slot = first.hash() as usize & 15;
        // collides in the small table, lands elsewhere in the grown one
        let second = (1..)
            .map(|i| key("a", &format!("input-{i}")))
            .find(|k| k.hash() as usize & 15 == slot && k.hash() as usize & 63 != slot)
            .unwrap();
        cache.insert(first, replace("first"), 0);
        cache.insert(second.clone(), replace("second"), 0);
        assert_eq!(cache.capacity(), 64);
        assert_eq!(
            cache.lookup(&second, CacheKind::Replace).unwrap().result,
            replace("second")
        );
    }

    #[test]
    fn test_adaptive_length_threshold() {
        let mut cache = ResultCache::new(CacheConfig {
            min_input_length: 10,
            large_string_budget: 2,
            ..CacheConfig::default()
        });
        assert!(!cache.admits(CacheKind::Replace, 0));
        assert!(cache.admits(CacheKind::Replace, 5));
        assert!(cache.admits(CacheKind::Match, 11));
        assert!(cache.admits(CacheKind::Replace, 11));
        // budget exhausted: threshold switches on and match caching stops
        assert!(!cache.admits(CacheKind::Replace, 5));
        assert!(cache.admits(CacheKind::Replace, 11));
        assert!(!cache.admits(CacheKind::Match, 11));
        assert_eq!(cache.stats().length_threshold, 10);
    }

    #[test]
    fn test_clear() {
        let mut cache = ResultCache::default();
        let k = key("b", "abc");
        cache.insert(k.clone(), replace("ac"), 0);
        cache.clear();
        assert!(cache.lookup(&k, CacheKind::Replace).is_none());
        assert_eq!(cache.stats().count, 0);
    }
}
