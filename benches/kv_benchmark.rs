//! Performance benchmarks for typed-kv
//!
//! This benchmark suite measures:
//! - Façade operations over the in-memory backend (put, get hit/miss)
//! - Memory cache hits vs store reads
//! - Codec cost (JSON vs postcard) across payload sizes
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use typed_kv::backend::InMemoryBackend;
use typed_kv::codec::{Codec, JsonCodec, PostcardCodec};
use typed_kv::{RawType, TypedKv};

// ============================================================================
// Benchmark Fixtures
// ============================================================================

/// Benchmark value with configurable data size
#[derive(Clone, Serialize, Deserialize)]
struct BenchValue {
    id: String,
    data: Vec<u8>,
}

impl BenchValue {
    fn new(id: &str, size: usize) -> Self {
        BenchValue {
            id: id.to_string(),
            data: vec![0u8; size],
        }
    }
}

fn store(memcache: bool) -> TypedKv<InMemoryBackend, BenchValue> {
    TypedKv::builder(InMemoryBackend::new())
        .prefix("bench:")
        .memcache(memcache)
        .build()
        .expect("Failed to build store")
}

// ============================================================================
// Group 1: Façade Operations
// ============================================================================

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed_kv");

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        // PUT operation
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("put", size), size, |b, &size| {
                let kv = store(false);
                let value = BenchValue::new("bench", size);

                b.to_async(&rt).iter(|| async {
                    kv.put(black_box("key"), black_box(value.clone()))
                        .await
                        .expect("Failed to put")
                });
            });

        // GET operation (store read + decode)
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_store", size), size, |b, &size| {
                let kv = store(false);
                rt.block_on(async {
                    kv.put("key", BenchValue::new("bench", size))
                        .await
                        .expect("Failed to put");
                });

                b.to_async(&rt)
                    .iter(|| async { kv.get(black_box("key")).await });
            });

        // GET operation (memory cache hit, no decode)
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_memcache", size), size, |b, &size| {
                let kv = store(true);
                rt.block_on(async {
                    kv.put("key", BenchValue::new("bench", size))
                        .await
                        .expect("Failed to put");
                });

                b.to_async(&rt)
                    .iter(|| async { kv.get(black_box("key")).await });
            });
    }

    // GET miss - size doesn't matter for misses
    group.bench_function("get_miss", |b| {
        let kv = store(false);
        b.to_async(&rt)
            .iter(|| async { kv.get(black_box("nonexistent_key")).await });
    });

    // LIST over 1000 keys
    group.bench_function("list_1000", |b| {
        let kv = store(false);
        rt.block_on(async {
            for i in 0..1000 {
                kv.put(&format!("k{:04}", i), BenchValue::new("bench", 16))
                    .await
                    .expect("Failed to put");
            }
        });

        b.to_async(&rt)
            .iter(|| async { kv.list(black_box("k")).await });
    });

    group.finish();
}

// ============================================================================
// Group 2: Codecs
// ============================================================================

fn codec_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let value = BenchValue::new("test_id", *size);

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("json_encode", size), &value, |b, value| {
                b.iter(|| Codec::<BenchValue>::encode(&JsonCodec, black_box(value), RawType::Text));
            });

        let postcard = PostcardCodec::new();
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(
                BenchmarkId::new("postcard_encode", size),
                &value,
                |b, value| {
                    b.iter(|| {
                        Codec::<BenchValue>::encode(&postcard, black_box(value), RawType::Binary)
                    });
                },
            );

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("json_decode", size), &value, |b, value| {
                b.to_async(&rt).iter(|| async {
                    let raw = Codec::<BenchValue>::encode(&JsonCodec, value, RawType::Text)
                        .expect("Failed to encode");
                    let decoded: BenchValue = JsonCodec.decode(raw).await.expect("Failed to decode");
                    decoded
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(
                BenchmarkId::new("postcard_decode", size),
                &value,
                |b, value| {
                    b.to_async(&rt).iter(|| async {
                        let raw = Codec::<BenchValue>::encode(&postcard, value, RawType::Binary)
                            .expect("Failed to encode");
                        let decoded: BenchValue =
                            postcard.decode(raw).await.expect("Failed to decode");
                        decoded
                    });
                },
            );
    }

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(benches, store_benchmarks, codec_benchmarks);
criterion_main!(benches);
