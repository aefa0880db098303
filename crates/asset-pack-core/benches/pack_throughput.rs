use asset_pack_core::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use image::RgbaImage;

fn generate_sizes(count: usize, min_size: u32, max_size: u32) -> Vec<(String, u32, u32)> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            (format!("tex_{}", i), w, h)
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let cfg = PackerConfig::builder().margin(2).max_dimension(4096).build();

    for count in [50, 200, 1000] {
        let sizes = generate_sizes(count, 8, 96);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("Guillotine", count), &sizes, |b, sizes| {
            b.iter(|| black_box(pack_layout(sizes.clone(), &cfg).ok()));
        });
    }

    group.finish();
}

fn bench_build_atlas(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_atlas");

    for count in [50, 200] {
        let sprites: Vec<Sprite> = generate_sizes(count, 8, 64)
            .into_iter()
            .filter_map(|(k, w, h)| Sprite::new(k, RgbaImage::new(w, h)).ok())
            .collect();
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("sequential", count), &sprites, |b, sprites| {
            let cfg = PackerConfig::builder().margin(2).max_dimension(4096).build();
            b.iter(|| black_box(build_atlas(sprites.clone(), &cfg).ok()));
        });

        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", count), &sprites, |b, sprites| {
            let cfg = PackerConfig::builder()
                .margin(2)
                .max_dimension(4096)
                .parallel(true)
                .build();
            b.iter(|| black_box(build_atlas(sprites.clone(), &cfg).ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout, bench_build_atlas);
criterion_main!(benches);
