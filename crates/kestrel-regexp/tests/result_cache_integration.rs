//! Result Cache Integration Tests
//!
//! Repeated replace/split/match calls on canonical RegExps are served from
//! the realm's result cache; these tests check hits, `lastIndex` restoration
//! and the conditions under which the cache is bypassed.

use kestrel_regexp::regexp::CacheConfig;
use kestrel_regexp::{
    JsString, PropertyKey, Realm, RealmConfig, Value, regexp_match, regexp_replace, regexp_split,
};

fn s(text: &str) -> Value {
    Value::string(JsString::from(text))
}

#[test]
fn test_replace_hit_restores_last_index() {
    let realm = Realm::new();
    let re = realm.new_regexp("a", "g").unwrap();
    let input = JsString::from("banana");
    let mut ncx = realm.context();

    let first = regexp_replace(&mut ncx, &re, &input, &s("o")).unwrap();
    re.set(PropertyKey::string("lastIndex"), Value::number(4.0));
    let second = regexp_replace(&mut ncx, &re, &input, &s("o")).unwrap();

    assert_eq!(first.to_string(), "bonono");
    assert_eq!(first, second);
    assert_eq!(re.get(&PropertyKey::string("lastIndex")), Some(Value::number(0.0)));
    let stats = realm.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.count, 1);
}

#[test]
fn test_fast_path_results_are_cached() {
    let realm = Realm::new();
    let re = realm.new_regexp("\\s", "g").unwrap();
    let input = JsString::from("a b c");
    let mut ncx = realm.context();
    for _ in 0..3 {
        let out = regexp_replace(&mut ncx, &re, &input, &s("")).unwrap();
        assert_eq!(out.to_string(), "abc");
    }
    assert_eq!(realm.cache_stats().hits, 2);
}

#[test]
fn test_split_and_match_share_an_entry() {
    let realm = Realm::new();
    let re = realm.new_regexp(",", "g").unwrap();
    let input = JsString::from("1,2,3");
    let mut ncx = realm.context();

    regexp_split(&mut ncx, &re, &input, &Value::undefined()).unwrap();
    let matched = regexp_match(&mut ncx, &re, &input).unwrap();
    assert_eq!(matched.as_object().unwrap().array_length(), 2);

    let parts = regexp_split(&mut ncx, &re, &input, &Value::undefined()).unwrap();
    assert_eq!(parts.array_elements(), vec![s("1"), s("2"), s("3")]);
    let matched = regexp_match(&mut ncx, &re, &input).unwrap();
    assert_eq!(matched.as_object().unwrap().array_elements(), vec![s(","), s(",")]);

    let stats = realm.cache_stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.count, 1);
}

#[test]
fn test_split_with_limit_bypasses_cache() {
    let realm = Realm::new();
    let re = realm.new_regexp(",", "").unwrap();
    let input = JsString::from("a,b");
    let mut ncx = realm.context();
    for _ in 0..2 {
        regexp_split(&mut ncx, &re, &input, &Value::number(5.0)).unwrap();
    }
    let stats = realm.cache_stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.count, 0);
}

#[test]
fn test_non_canonical_receiver_bypasses_cache() {
    let realm = Realm::new();
    let re = realm.new_regexp("a", "g").unwrap();
    re.set(PropertyKey::string("extra"), Value::boolean(true));
    let input = JsString::from("aaa");
    let mut ncx = realm.context();
    for _ in 0..2 {
        regexp_replace(&mut ncx, &re, &input, &s("b")).unwrap();
    }
    assert_eq!(realm.cache_stats().count, 0);
}

#[test]
fn test_modified_prototype_bypasses_cache() {
    let realm = Realm::new();
    let re = realm.new_regexp("a", "g").unwrap();
    let proto = realm.intrinsics().regexp_prototype.clone();
    proto.set(PropertyKey::string("marker"), Value::null());
    assert!(!realm.is_canonical_regexp(&re));
    let mut ncx = realm.context();
    regexp_replace(&mut ncx, &re, &JsString::from("aa"), &s("b")).unwrap();
    assert_eq!(realm.cache_stats().count, 0);
}

#[test]
fn test_disabled_cache() {
    let realm = Realm::with_config(RealmConfig {
        enable_result_cache: false,
        ..RealmConfig::default()
    });
    let re = realm.new_regexp("a", "g").unwrap();
    let input = JsString::from("aaa");
    let mut ncx = realm.context();
    for _ in 0..3 {
        regexp_replace(&mut ncx, &re, &input, &s("b")).unwrap();
    }
    let stats = realm.cache_stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
}

#[test]
fn test_short_inputs_dropped_after_large_budget_spent() {
    let realm = Realm::with_config(RealmConfig {
        cache: CacheConfig {
            min_input_length: 4,
            large_string_budget: 1,
            ..CacheConfig::default()
        },
        ..RealmConfig::default()
    });
    let re = realm.new_regexp("b", "g").unwrap();
    let short = JsString::from("ab");
    let long = JsString::from("abababab");
    let mut ncx = realm.context();

    regexp_replace(&mut ncx, &re, &short, &s("x")).unwrap();
    regexp_replace(&mut ncx, &re, &short, &s("x")).unwrap();
    assert_eq!(realm.cache_stats().hits, 1);

    regexp_replace(&mut ncx, &re, &long, &s("x")).unwrap();
    let out = regexp_replace(&mut ncx, &re, &short, &s("x")).unwrap();
    assert_eq!(out.to_string(), "ax");
    let stats = realm.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.large_string_budget, 0);
    assert_eq!(stats.length_threshold, 4);
}

#[test]
fn test_clear_resets_entries() {
    let realm = Realm::new();
    let re = realm.new_regexp("a", "g").unwrap();
    let mut ncx = realm.context();
    regexp_replace(&mut ncx, &re, &JsString::from("aa"), &s("b")).unwrap();
    assert_eq!(realm.cache_stats().count, 1);
    realm.result_cache().clear();
    assert_eq!(realm.cache_stats().count, 0);
}
