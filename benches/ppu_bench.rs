// PPU Benchmarks
// Performance benchmarks for the per-dot renderer

use criterion::{criterion_group, criterion_main, Criterion};
use snes_rs::Ppu;
use std::hint::black_box;

/// A PPU with a mode-1 background and full brightness configured.
fn configured_ppu() -> Ppu {
    let mut ppu = Ppu::new();

    ppu.write(0x2100, 0x0F); // INIDISP: full brightness
    ppu.write(0x2105, 0x01); // BGMODE 1
    ppu.write(0x212C, 0x11); // TM: BG1 + sprites

    // BG1 tilemap at word 0x1000, characters at word 0x2000
    ppu.write(0x2107, 0x10);
    ppu.write(0x210B, 0x02);

    ppu
}

fn bench_ppu_dots(c: &mut Criterion) {
    let mut group = c.benchmark_group("ppu_rendering");

    // Single dot-unit advance
    group.bench_function("dot", |b| {
        let mut ppu = configured_ppu();

        b.iter(|| {
            black_box(ppu.run());
        });
    });

    // One whole scanline worth of dots
    group.bench_function("scanline", |b| {
        let mut ppu = configured_ppu();

        b.iter(|| {
            for _ in 0..341 {
                ppu.run();
            }
            ppu.take_events();
        });
    });

    // Forced blanking is the fast path
    group.bench_function("scanline_forced_blank", |b| {
        let mut ppu = configured_ppu();
        ppu.write(0x2100, 0x80);

        b.iter(|| {
            for _ in 0..341 {
                ppu.run();
            }
            ppu.take_events();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_ppu_dots);
criterion_main!(benches);
