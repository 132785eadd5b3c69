//! End-to-end behavioural properties of classification, coercion and
//! delegate adaptation

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::Mutex;

use morph_core::classify;
use morph_core::{
    narrow, widen, AdaptError, Coercer, CoerceError, FunctionRegistry, MetadataCache, Reflect,
    TypeHandle, TypedFn, Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
enum Level {
    Low = 1,
    Mid = 2,
    High = 3,
}

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Point {
    x: i32,
    y: i32,
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_classification_is_idempotent() {
    let cache = MetadataCache::new();
    let ty = TypeHandle::of::<Option<u16>>();
    let first = classify::is_numeric_in(&cache, &ty, false);
    for _ in 0..10 {
        assert_eq!(classify::is_numeric_in(&cache, &ty, false), first);
    }
    assert!(first);
    assert!(classify::is_nullable_in(&cache, &ty));
    assert!(!classify::is_collection_in(&cache, &ty));
}

#[test]
fn test_concurrent_first_classification() {
    let cache = Arc::new(MetadataCache::new());
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let points = TypeHandle::of::<Vec<Point>>();
                (
                    classify::is_collection_in(&cache, &points),
                    classify::is_basic_in(&cache, &points),
                    cache.descriptor(&TypeHandle::of::<Point>()),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (is_collection, is_basic, descriptor) in &results {
        assert!(is_collection);
        assert!(!is_basic);
        assert!(Arc::ptr_eq(descriptor, &results[0].2));
    }
}

#[test]
fn test_classification_table() {
    assert!(classify::is_numeric(&TypeHandle::of::<f32>(), true));
    assert!(!classify::is_numeric(&TypeHandle::of::<f32>(), false));
    assert!(classify::is_boolean(&TypeHandle::of::<Option<bool>>()));
    assert!(classify::is_date(&TypeHandle::of::<chrono::NaiveDate>()));
    assert!(classify::is_dictionary(&TypeHandle::of::<HashMap<String, Point>>()));
    assert!(classify::is_tuple(&TypeHandle::of::<(i32, String)>()));
    assert!(classify::is_enum(&TypeHandle::of::<Level>()));
    assert!(classify::is_delegate(&TypeHandle::of::<TypedFn<(i32,), i32>>()));
    assert!(classify::is_basic(&TypeHandle::of::<String>()));
    assert!(!classify::is_basic(&TypeHandle::of::<Point>()));
    assert_eq!(
        classify::element_type(&TypeHandle::of::<BTreeSet<Level>>()),
        Some(TypeHandle::of::<Level>())
    );
}

// ============================================================================
// Coercion
// ============================================================================

#[test]
fn test_coercion_identity() {
    let coercer = Coercer::global();
    let samples = [
        (Value::I32(7), TypeHandle::of::<i32>()),
        (Value::String("x".into()), TypeHandle::of::<String>()),
        (Value::Bool(false), TypeHandle::of::<bool>()),
        (Value::list(vec![Value::Null]), TypeHandle::of::<Vec<Value>>()),
    ];
    for (value, ty) in samples {
        assert!(coercer.is_instance(&value, &ty));
        assert_eq!(coercer.coerce(value.clone(), &ty).unwrap(), value);
    }
}

#[test]
fn test_absent_values_for_nullable_targets() {
    let coercer = Coercer::global();
    for absent in [Value::Null, Value::DbNull, Value::F64(f64::NAN)] {
        let out: Option<Level> = coercer.coerce_into(absent.clone()).unwrap();
        assert_eq!(out, None);
        let out: Option<String> = coercer.coerce_into(absent).unwrap();
        assert_eq!(out, None);
    }
}

#[test]
fn test_enum_round_trip() {
    let coercer = Coercer::global();
    for level in [Level::Low, Level::Mid, Level::High] {
        let name = format!("{:?}", level);
        let by_name: Level = coercer.coerce_into(Value::String(name)).unwrap();
        assert_eq!(by_name, level);

        let number = level as i64;
        let by_number: Level = coercer.coerce_into(Value::I64(number)).unwrap();
        assert_eq!(by_number, level);
        let back: i64 = coercer
            .coerce_into(morph_core::IntoValue::into_value(level))
            .unwrap();
        assert_eq!(back, number);
    }
}

#[test]
fn test_narrowing_overflow() {
    let err = Coercer::global()
        .coerce(Value::I64(300), &TypeHandle::of::<u8>())
        .unwrap_err();
    assert_eq!(
        err,
        CoerceError::TypeConversion {
            from: "i64".into(),
            to: "u8".into(),
            value: "300".into(),
        }
    );
    let ok: u8 = Coercer::global().coerce_into(Value::I64(255)).unwrap();
    assert_eq!(ok, 255);
}

#[test]
fn test_struct_from_tuple_like_list_fails() {
    assert!(Coercer::global()
        .coerce(Value::list(vec![Value::I32(1)]), &TypeHandle::of::<Point>())
        .is_err());
}

// ============================================================================
// Delegates
// ============================================================================

#[test]
fn test_argument_count_validation() {
    let f = widen(|a: i32, b: i32, c: i32| a * b * c);
    assert_eq!(
        f.call(&[Value::I32(2), Value::I32(3)]).unwrap_err(),
        AdaptError::ArgumentCount {
            expected: 3,
            got: Some(2)
        }
    );
    assert_eq!(
        f.call_opt(None).unwrap_err(),
        AdaptError::ArgumentCount {
            expected: 3,
            got: None
        }
    );
    assert_eq!(
        f.call(&[Value::I32(2), Value::I32(3), Value::I32(4)]).unwrap(),
        Value::I32(24)
    );
}

#[test]
fn test_end_to_end_invocation() {
    let seen = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&seen);
    let f = widen(move |a: i32, b: String| {
        *sink.lock() = format!("{}:{}", a, b);
        a
    });

    let out = f
        .call(&[Value::String("42".into()), Value::I32(7)])
        .unwrap();
    assert_eq!(out, Value::I32(42));
    assert_eq!(*seen.lock(), "42:7");
}

#[test]
fn test_registry_dispatch() {
    let mut registry = FunctionRegistry::new();
    registry.register_fn("scale", |p: Point, k: i32| Point { x: p.x * k, y: p.y * k });
    registry.register_fn("level", |n: u8| n > 1);

    let point = Value::map([("x", Value::I32(1)), ("y", Value::String("2".into()))]);
    let scaled = registry.call("scale", &[point, Value::String("3".into())]).unwrap();
    let scaled: Point = Coercer::global().coerce_into(scaled).unwrap();
    assert_eq!(scaled, Point { x: 3, y: 6 });

    let typed: TypedFn<(Level,), bool> = narrow(registry.get("level").unwrap());
    assert!(typed.call((Level::High,)).unwrap());
    assert!(!typed.call((Level::Low,)).unwrap());

    assert_eq!(
        registry.call("missing", &[]).unwrap_err(),
        AdaptError::UnknownFunction("missing".into())
    );
}
