//! Criterion benchmarks for scribe

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use parking_lot::Mutex;
use scribe::core::field::flatten;
use scribe::prelude::*;
use std::io;
use std::sync::Arc;

struct NullBatchWriter;

impl BatchWriter for NullBatchWriter {
    fn write_batch(&self, batch: &[u8]) -> Result<usize> {
        Ok(black_box(batch).len())
    }
}

fn sample_fields() -> Vec<Field> {
    vec![
        Field::node("node1"),
        Field::service("consensus"),
        Field::uint64("block-height", 1_234_567),
        Field::bytes("block-hash", vec![0xab; 32]),
        Field::string("request-id", "req-000042"),
        Field::function("scribe::bench"),
        Field::source("benches/logger_benchmarks.rs:1"),
    ]
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatters(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatters");
    group.throughput(Throughput::Elements(1));

    let record = Record::new(LogLevel::Info, "block committed", sample_fields());
    let json = JsonFormatter::new();
    let human = HumanReadableFormatter::new();

    group.bench_function("json", |b| {
        b.iter(|| black_box(json.format_record(black_box(&record))))
    });

    group.bench_function("human_readable", |b| {
        b.iter(|| black_box(human.format_record(black_box(&record))))
    });

    group.finish();
}

// ============================================================================
// Field Benchmarks
// ============================================================================

fn bench_flatten(c: &mut Criterion) {
    let nested = vec![
        Field::aggregate(
            "block",
            vec![
                Field::uint64("height", 7),
                Field::aggregate("proposer", vec![Field::node("node2"), Field::int("term", 3)]),
            ],
        ),
        Field::string("phase", "commit"),
    ];

    c.bench_function("flatten_nested", |b| {
        b.iter(|| black_box(flatten(black_box(nested.clone()))))
    });
}

// ============================================================================
// Delivery Benchmarks
// ============================================================================

fn bench_delivery(c: &mut Criterion) {
    let mut group = c.benchmark_group("delivery");
    group.throughput(Throughput::Elements(1));

    let stream_logger = Logger::builder()
        .output(FormattingOutput::new(io::sink(), JsonFormatter::new()))
        .build();
    group.bench_function("stream_json", |b| {
        b.iter(|| stream_logger.info(black_box("block committed"), sample_fields()))
    });

    let bulk = BulkOutput::new(NullBatchWriter, JsonFormatter::new(), 500).expect("valid bulk size");
    let bulk_logger = Logger::builder().output(bulk).build();
    group.bench_function("bulk_append", |b| {
        b.iter(|| bulk_logger.info(black_box("block committed"), sample_fields()))
    });

    let filtered_logger = stream_logger.with_filters(vec![Arc::new(OnlyErrors)]);
    group.bench_function("filtered_out", |b| {
        b.iter(|| filtered_logger.info(black_box("dropped"), sample_fields()))
    });

    group.finish();
}

fn bench_concurrent_bulk(c: &mut Criterion) {
    let buffer = Arc::new(Mutex::new(io::sink()));
    let bulk = BulkOutput::new(buffer, JsonFormatter::new(), 1000).expect("valid bulk size");
    let logger = Logger::builder().output(bulk).build();

    c.bench_function("bulk_4_threads_x_250", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let logger = logger.clone();
                    std::thread::spawn(move || {
                        for i in 0..250 {
                            logger.info("concurrent", vec![Field::int("i", i)]);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().expect("bench thread panicked");
            }
        })
    });
}

criterion_group!(
    benches,
    bench_formatters,
    bench_flatten,
    bench_delivery,
    bench_concurrent_bulk
);
criterion_main!(benches);
