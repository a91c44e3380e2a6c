//! Benchmarks for the query cache and the invoker's hit path
//!
//! This benchmark measures:
//! - Raw cache lookups at different cache sizes
//! - Write-once inserts against existing keys
//! - A full `invoke` served from the cache

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chat_search::cache::QueryCache;
use chat_search::resilience::ResilientInvoker;
use chat_search::tools::FnTool;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn filled_cache(rt: &Runtime, entries: usize) -> QueryCache {
    let cache = QueryCache::new();
    rt.block_on(async {
        for i in 0..entries {
            cache
                .put(format!("query number {}", i), format!("result {}", i))
                .await;
        }
    });
    cache
}

fn bench_cache_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("query_cache_get");
    group.throughput(Throughput::Elements(1));

    for size in [10usize, 1_000, 100_000] {
        let cache = filled_cache(&rt, size);
        let key = format!("query number {}", size / 2);
        group.bench_with_input(BenchmarkId::new("hit", size), &key, |b, key| {
            b.iter(|| cache.get(black_box(key)))
        });
        group.bench_with_input(BenchmarkId::new("miss", size), &size, |b, _| {
            b.iter(|| cache.get(black_box("not cached")))
        });
    }

    group.finish();
}

fn bench_cache_put_existing(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = filled_cache(&rt, 1_000);

    c.bench_function("query_cache_put_existing", |b| {
        b.to_async(&rt)
            .iter(|| cache.put(black_box("query number 500"), black_box("ignored")))
    });
}

fn bench_invoke_hit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let invoker = ResilientInvoker::new(Arc::new(filled_cache(&rt, 1_000)));
    let tool = FnTool::new("unused", "", |q: &str| Ok(q.to_string()));

    c.bench_function("invoke_cache_hit", |b| {
        b.to_async(&rt)
            .iter(|| async { invoker.invoke(&tool, black_box("query number 42")).await })
    });
}

criterion_group!(
    benches,
    bench_cache_get,
    bench_cache_put_existing,
    bench_invoke_hit,
);
criterion_main!(benches);
