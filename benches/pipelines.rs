use criterion::{black_box, criterion_group, criterion_main, Criterion};
use frame_transformers::execution::{Pipeline, PipelineOptions};
use frame_transformers::transformers::TransformerConfig;
use frame_transformers::types::{DataFrame, Field, FieldType, Value};
use serde_json::json;

fn long_frame(rows: usize, servers: usize) -> DataFrame {
    let time = (0..rows).map(|i| Value::from((i / servers * 1000) as f64)).collect();
    let server = (0..rows).map(|i| Value::from(format!("server-{}", i % servers))).collect();
    let value = (0..rows).map(|i| Value::from((i % 97) as f64)).collect();
    DataFrame::new(vec![
        Field::new("Time", FieldType::Time, time),
        Field::new("Server", FieldType::String, server),
        Field::new("Value", FieldType::Number, value),
    ])
}

fn configs() -> Vec<TransformerConfig> {
    serde_json::from_value(json!([
        { "id": "filterByValue", "options": {
            "type": "exclude",
            "filters": [{ "fieldName": "Value", "config": { "id": "lower", "options": { "value": 5 } } }]
        } },
        { "id": "groupingToMatrix", "options": {
            "columnField": "Server", "rowField": "Time", "valueField": "Value", "emptyValue": "null"
        } },
        { "id": "organize", "options": { "excludeByName": { "server-0": true } } }
    ]))
    .unwrap_or_default()
}

fn benchmark_pivot_pipeline(c: &mut Criterion) {
    let frame = long_frame(10_000, 20);
    let pipeline = Pipeline::new(&configs(), PipelineOptions::default());
    c.bench_function("filter_pivot_organize_10k_rows", |b| {
        b.iter(|| black_box(pipeline.apply(std::slice::from_ref(&frame))))
    });
}

fn benchmark_batches(c: &mut Criterion) {
    let batches: Vec<Vec<DataFrame>> = (0..32).map(|_| vec![long_frame(2_000, 10)]).collect();
    let pipeline = Pipeline::new(&configs(), PipelineOptions::default());
    c.bench_function("apply_batches_32x2k_rows", |b| {
        b.iter(|| black_box(pipeline.apply_batches(&batches)))
    });
}

criterion_group!(benches, benchmark_pivot_pipeline, benchmark_batches);
criterion_main!(benches);
