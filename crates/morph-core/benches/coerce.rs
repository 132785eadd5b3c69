use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use morph_core::{widen, Coercer, MetadataCache, Reflect, TypeHandle, Value};

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
enum Tier {
    Free = 0,
    Pro = 1,
    Team = 2,
}

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Account {
    id: u64,
    name: String,
    balance: f64,
    tier: Tier,
    tags: Vec<String>,
}

fn account_map() -> Value {
    Value::map([
        ("ID", Value::String("1024".into())),
        ("name", Value::String("bench".into())),
        ("Balance", Value::String("1,5".into())),
        ("tier", Value::String("team".into())),
        (
            "tags",
            Value::list(vec![Value::String("a".into()), Value::I32(2)]),
        ),
    ])
}

fn bench_primitives(c: &mut Criterion) {
    let coercer = Coercer::global();
    let mut group = c.benchmark_group("primitives");

    let cases = [
        ("text_to_i32", Value::String("123456".into()), TypeHandle::of::<i32>()),
        ("text_to_f64", Value::String("1234.5678".into()), TypeHandle::of::<f64>()),
        ("i64_to_u8", Value::I64(200), TypeHandle::of::<u8>()),
        ("text_to_date", Value::String("2024-02-29".into()), TypeHandle::of::<chrono::NaiveDate>()),
        ("identity", Value::I32(7), TypeHandle::of::<i32>()),
    ];

    for (name, value, target) in cases {
        group.bench_with_input(BenchmarkId::new("coerce", name), &value, |b, value| {
            b.iter(|| coercer.coerce(black_box(value.clone()), &target).unwrap());
        });
    }

    group.finish();
}

fn bench_structs(c: &mut Criterion) {
    let coercer = Coercer::global();
    let input = account_map();

    c.bench_function("map_to_struct", |b| {
        b.iter(|| {
            coercer
                .coerce_into::<Account>(black_box(input.clone()))
                .unwrap()
        });
    });
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");

    group.bench_function("descriptor_hit", |b| {
        let cache = MetadataCache::new();
        let ty = TypeHandle::of::<Account>();
        cache.descriptor(&ty);
        b.iter(|| cache.descriptor(black_box(&ty)));
    });

    group.bench_function("descriptor_cold", |b| {
        let ty = TypeHandle::of::<Account>();
        b.iter(|| {
            let cache = MetadataCache::new();
            cache.descriptor(black_box(&ty))
        });
    });

    group.finish();
}

fn bench_adapter(c: &mut Criterion) {
    let f = widen(|a: i32, b: String, c: f64| a as f64 + b.len() as f64 + c);
    let args = [Value::String("42".into()), Value::I32(7), Value::F32(0.5)];

    c.bench_function("widened_call", |b| {
        b.iter(|| f.call(black_box(&args)).unwrap());
    });
}

criterion_group!(benches, bench_primitives, bench_structs, bench_cache, bench_adapter);
criterion_main!(benches);
