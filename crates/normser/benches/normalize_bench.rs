use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use normser::{Context, Data, Serializer, TypedNormalizer};
use serde::{Deserialize, Serialize};
use std::hint::black_box;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Row {
    id: u64,
    name: String,
    tags: Vec<String>,
}

fn typed_rows(rows: usize) -> Data {
    Data::mapping([(
        "rows",
        Data::Sequence(
            (0..rows)
                .map(|i| {
                    Data::object(Row {
                        id: i as u64,
                        name: format!("row-{i}"),
                        tags: vec!["a".into(), "b".into()],
                    })
                })
                .collect(),
        ),
    )])
}

fn plain_nested(depth: usize, breadth: usize) -> Data {
    fn rec(d: usize, b: usize) -> Data {
        if d == 0 {
            return Data::from(1);
        }
        Data::Mapping((0..b).map(|i| (format!("k{i}"), rec(d - 1, b))).collect())
    }
    rec(depth, breadth)
}

pub fn normalize_benchmarks(c: &mut Criterion) {
    let serializer = Serializer::builder()
        .normalizer(TypedNormalizer::<Row>::new())
        .default_codecs()
        .build();
    let ctx = Context::new();

    let mut group = c.benchmark_group("normalize");
    for rows in [10usize, 1_000] {
        let data = typed_rows(rows);
        group.bench_function(format!("typed_rows::{rows}"), |b| {
            b.iter(|| black_box(serializer.normalize(&data, "json", &ctx).unwrap()))
        });
    }
    let nested = plain_nested(4, 6);
    group.bench_function("plain_nested", |b| {
        b.iter(|| black_box(serializer.normalize(&nested, "json", &ctx).unwrap()))
    });
    group.finish();

    let mut group = c.benchmark_group("serialize");
    for format in ["json", "xml"] {
        group.bench_function(format!("typed_rows_1k::{format}"), |b| {
            b.iter_batched(
                || typed_rows(1_000),
                |data| black_box(serializer.serialize(&data, format, &ctx).unwrap()),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, normalize_benchmarks);
criterion_main!(benches);
