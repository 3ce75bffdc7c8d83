// CPU Benchmarks
// Performance benchmarks for 65816 instruction execution

use criterion::{criterion_group, criterion_main, Criterion};
use snes_rs::{AddressingType, Cpu, Membus};
use std::hint::black_box;

/// LowROM bus with a looping program at $00:8000.
fn bus_with_program(program: &[u8]) -> Membus {
    let mut bus = Membus::new(AddressingType::LowRom, false);
    bus.rom = vec![0; 512 * 1024];
    bus.rom[..program.len()].copy_from_slice(program);

    // Reset vector -> $8000
    bus.rom[0x7FFC] = 0x00;
    bus.rom[0x7FFD] = 0x80;
    bus
}

/// Benchmark CPU instruction execution
/// Tests common instruction patterns to measure dispatch and execution
/// performance
fn bench_cpu_instructions(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_instructions");

    // NOP spin (simplest dispatch path): NOP ; JMP $8000
    group.bench_function("nop", |b| {
        let mut bus = bus_with_program(&[0xEA, 0x4C, 0x00, 0x80]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        b.iter(|| {
            cpu.step(black_box(&mut bus));
        });
    });

    // Immediate load: LDA #$42 ; JMP $8000
    group.bench_function("lda_immediate", |b| {
        let mut bus = bus_with_program(&[0xA9, 0x42, 0x4C, 0x00, 0x80]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        b.iter(|| {
            cpu.step(black_box(&mut bus));
        });
    });

    // Arithmetic: ADC #$01 ; JMP $8000
    group.bench_function("adc_immediate", |b| {
        let mut bus = bus_with_program(&[0x69, 0x01, 0x4C, 0x00, 0x80]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        b.iter(|| {
            cpu.step(black_box(&mut bus));
        });
    });

    // Memory round trip through WRAM: LDA $0100 ; STA $0102 ; JMP $8000
    group.bench_function("wram_load_store", |b| {
        let mut bus = bus_with_program(&[0xAD, 0x00, 0x01, 0x8D, 0x02, 0x01, 0x4C, 0x00, 0x80]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        b.iter(|| {
            cpu.step(black_box(&mut bus));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cpu_instructions);
criterion_main!(benches);
