//! Cache Operation Benchmarks
//!
//! Disk format encode/parse and memory tier put/get.
//!
//! Run with: `cargo bench --bench cache_operations`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use docview_cache::cache::{compute_hash, format, BoundedCache};
use docview_cache::CacheEntry;

/// Markdown-ish document of roughly `size` bytes
fn create_document(size: usize) -> String {
    let paragraph = "## Section\n\nLorem ipsum dolor sit amet, *consectetur* adipiscing elit.\n\n";
    paragraph.repeat(size / paragraph.len() + 1)
}

fn create_entry(size: usize) -> CacheEntry {
    let content = create_document(size);
    CacheEntry {
        content_hash: compute_hash(content.as_bytes()),
        processed_html: Some(format!("<article>{}</article>", content)),
        source_size: content.len() as u64,
        content,
        last_modified_source: 1_700_000_000_000,
        cached_at: 1_700_000_100_000,
    }
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("disk_format");

    for size in [1024, 64 * 1024, 1024 * 1024] {
        let entry = create_entry(size);
        let encoded = format::encode(&entry);
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &entry, |b, entry| {
            b.iter(|| format::encode(black_box(entry)))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, text| {
            b.iter(|| format::decode(black_box(text)))
        });
    }

    group.finish();
}

fn bench_hash(c: &mut Criterion) {
    let content = create_document(64 * 1024);
    c.bench_function("compute_hash_64k", |b| {
        b.iter(|| compute_hash(black_box(content.as_bytes())))
    });
}

fn bench_memory_tier(c: &mut Criterion) {
    let entry = create_entry(1024);
    let paths: Vec<String> = (0..40).map(|i| format!("/docs/{}.md", i)).collect();

    c.bench_function("memory_put_evicting", |b| {
        let cache = BoundedCache::new(20);
        b.iter(|| {
            for path in &paths {
                cache.put(path.clone(), entry.clone());
            }
        })
    });

    c.bench_function("memory_get_hit", |b| {
        let cache = BoundedCache::new(20);
        for path in &paths[..20] {
            cache.put(path.clone(), entry.clone());
        }
        b.iter(|| cache.get(black_box(&paths[10])))
    });
}

criterion_group!(benches, bench_format, bench_hash, bench_memory_tier);
criterion_main!(benches);
