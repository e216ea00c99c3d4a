//! Record text codec benchmarks.

use chanvault_bench::{random_data, random_hash};
use chanvault_codec::{parse_record, peek_key_hash, serialize_record, DataLocation, EncodedRecord};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn record(size: usize) -> EncodedRecord {
    let hash = random_hash();
    match DataLocation::for_payload(hash.len(), size) {
        DataLocation::Inline => EncodedRecord::inline(hash, random_data(12), random_data(size)),
        DataLocation::OutOfBand => EncodedRecord::out_of_band(hash, random_data(12)),
    }
}

/// Benchmark serializing records of increasing payload size.
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for size in [16, 256, 960, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let record = record(size);
            b.iter(|| black_box(serialize_record(black_box(&record))));
        });
    }
    group.finish();
}

/// Benchmark parsing the same records back.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for size in [16, 256, 960].iter() {
        let text = serialize_record(&record(*size));
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| black_box(parse_record(black_box(text)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark the key-hash precheck a scan runs on every record.
fn bench_peek(c: &mut Criterion) {
    let text = serialize_record(&record(960));
    c.bench_function("peek_key_hash", |b| {
        b.iter(|| black_box(peek_key_hash(black_box(&text))));
    });
}

criterion_group!(benches, bench_serialize, bench_parse, bench_peek);
criterion_main!(benches);
