//! Benchmarks for the qualifier codec and record walker

use std::collections::{BTreeMap, BTreeSet};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trellis::{
    decode_qualifier, encode_qualifier, read_values, walk, Cell, FieldDef, ModelSchema,
    PathSegment, PropertyPath, PropertyType, ReadConfig, ScalarType, SchemaRegistry, Value,
    ValueTree,
};

fn bench_schema() -> SchemaRegistry {
    let item = ModelSchema::new("item")
        .with_field(FieldDef::new(1, "label", PropertyType::Scalar(ScalarType::Text)))
        .with_field(FieldDef::new(2, "count", PropertyType::Scalar(ScalarType::U32)));
    let record = ModelSchema::new("record")
        .with_field(FieldDef::new(1, "id", PropertyType::Scalar(ScalarType::U32)))
        .with_field(FieldDef::new(
            2,
            "items",
            PropertyType::List(Box::new(PropertyType::Model("item".into()))),
        ))
        .with_field(FieldDef::new(
            3,
            "attrs",
            PropertyType::Map {
                key: ScalarType::Text,
                value: Box::new(PropertyType::Scalar(ScalarType::U32)),
            },
        ))
        .with_field(FieldDef::new(4, "tags", PropertyType::Set(ScalarType::U32)));

    let mut registry = SchemaRegistry::new();
    registry.register(item).unwrap();
    registry.register(record).unwrap();
    registry
}

fn bench_tree() -> ValueTree {
    let items: Vec<Value> = (0..32)
        .map(|i| {
            Value::Object(
                ValueTree::new()
                    .with(1, Value::Text(format!("item-{i}")))
                    .with(2, Value::Number(i)),
            )
        })
        .collect();
    let attrs: BTreeMap<Value, Value> = (0..16)
        .map(|i| (Value::Text(format!("key-{i:02}")), Value::Number(i)))
        .collect();
    let tags: BTreeSet<Value> = (0..16).map(Value::Number).collect();

    ValueTree::new()
        .with(1, Value::Number(42))
        .with(2, Value::List(items))
        .with(3, Value::Map(attrs))
        .with(4, Value::Set(tags))
}

fn codec_benchmarks(c: &mut Criterion) {
    let registry = bench_schema();
    let model = registry.get("record").unwrap();

    let deep_path = PropertyPath::field(2)
        .child(PathSegment::ListIndex(17))
        .child(PathSegment::Field(1));
    c.bench_function("encode_qualifier/deep_path", |b| {
        b.iter(|| encode_qualifier(black_box(&deep_path), model, &registry).unwrap())
    });

    let encoded = encode_qualifier(&deep_path, model, &registry).unwrap();
    c.bench_function("decode_qualifier/deep_path", |b| {
        b.iter(|| decode_qualifier(black_box(&encoded), model, &registry).unwrap())
    });

    let tree = bench_tree();
    c.bench_function("walk/medium_record", |b| {
        b.iter(|| {
            walk(model, &registry, black_box(tree.clone()))
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
        })
    });

    let cells: Vec<Cell> = walk(model, &registry, tree)
        .map(|op| op.unwrap().into_cell(1))
        .collect();
    let config = ReadConfig::default();
    c.bench_function("read_values/medium_record", |b| {
        b.iter(|| {
            read_values(black_box(cells.clone()), model, &registry, None, &config).unwrap()
        })
    });
}

criterion_group!(benches, codec_benchmarks);
criterion_main!(benches);
