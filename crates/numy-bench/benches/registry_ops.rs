//! Criterion micro-benchmarks for the handle registry and persistence.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use numy_bench::mixed_tensor;
use numy_core::Shape;
use numy_registry::{BufferRegistry, RegistryConfig};
use numy_test_utils::TestRegistryBuilder;

/// Benchmark: allocate then destroy a 1K-element tensor.
fn bench_allocate_destroy(c: &mut Criterion) {
    let registry = BufferRegistry::new(RegistryConfig::default()).unwrap();
    let shape = Shape::new(&[32, 32]).unwrap();

    c.bench_function("registry_allocate_destroy_1k", |b| {
        b.iter(|| {
            let h = registry.allocate(shape.clone()).unwrap();
            registry.destroy(black_box(h)).unwrap();
        });
    });
}

/// Benchmark: lock two operands and add them.
fn bench_pair_add(c: &mut Criterion) {
    let (registry, handles) = TestRegistryBuilder::new()
        .with_tensor(&[1000])
        .with_tensor(&[1000])
        .build();

    c.bench_function("registry_pair_add_1k", |b| {
        b.iter(|| {
            registry
                .with_operands(handles[0], handles[1], |x, y| {
                    black_box(numy_ops::add(x.data_mut(), y.data()))
                })
                .unwrap()
        });
    });
}

/// Benchmark: encode and decode a 10K-element tensor in memory.
fn bench_codec_round_trip_10k(c: &mut Criterion) {
    let tensor = mixed_tensor(10_000, 9);

    c.bench_function("codec_round_trip_10k", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(tensor.byte_size() + numy_io::HEADER_LEN);
            numy_io::write_tensor(&mut buf, &tensor).unwrap();
            black_box(numy_io::read_tensor(&mut buf.as_slice()).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_allocate_destroy,
    bench_pair_add,
    bench_codec_round_trip_10k
);
criterion_main!(benches);
