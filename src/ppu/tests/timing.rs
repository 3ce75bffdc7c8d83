// PPU dot timing and event tests

use crate::bus::HvIrqMode;
use crate::ppu::constants::*;
use crate::ppu::{
    Ppu, EVENT_HBLANK_START, EVENT_HV_IRQ, EVENT_SCAN_ENDED, EVENT_SCAN_STARTED,
    EVENT_VBLANK_START,
};

fn run_dots(ppu: &mut Ppu, dots: u32) -> u32 {
    let mut events = 0;
    for _ in 0..dots {
        ppu.run();
        events |= ppu.take_events();
    }
    events
}

#[test]
fn test_dot_costs_four_cycles() {
    let mut ppu = Ppu::new();
    assert_eq!(ppu.run(), 4);
}

#[test]
fn test_line_and_frame_wrap() {
    let mut ppu = Ppu::new();

    run_dots(&mut ppu, DOTS_PER_LINE as u32);
    assert_eq!(ppu.h_pos(), 0);
    assert_eq!(ppu.v_pos(), 1);

    run_dots(&mut ppu, (DOTS_PER_LINE as u32) * (LINES_PER_FRAME as u32 - 1));
    assert_eq!(ppu.v_pos(), 0, "frame wraps after 262 lines");
}

#[test]
fn test_scan_events_once_per_frame() {
    let mut ppu = Ppu::new();

    let mut scan_started = 0;
    let mut scan_ended = 0;
    let mut vblank_start = 0;

    for _ in 0..(DOTS_PER_LINE as u32 * LINES_PER_FRAME as u32) {
        ppu.run();
        let events = ppu.take_events();
        if events & EVENT_SCAN_STARTED != 0 {
            scan_started += 1;
        }
        if events & EVENT_SCAN_ENDED != 0 {
            scan_ended += 1;
        }
        if events & EVENT_VBLANK_START != 0 {
            vblank_start += 1;
        }
    }

    assert_eq!(scan_started, 1);
    assert_eq!(scan_ended, 1);
    assert_eq!(vblank_start, 1);
}

#[test]
fn test_vblank_starts_on_line_225() {
    let mut ppu = Ppu::new();

    // Run up to the last dot of line 224: no v-blank yet
    let events = run_dots(
        &mut ppu,
        DOTS_PER_LINE as u32 * VBLANK_START_LINE as u32 - 1,
    );
    assert_eq!(events & EVENT_VBLANK_START, 0);
    assert!(!ppu.in_vblank());

    // The next dot enters line 225
    ppu.run();
    ppu.run();
    let events = ppu.take_events();
    assert_ne!(events & EVENT_VBLANK_START, 0);
    assert!(ppu.in_vblank());
}

#[test]
fn test_hblank_flag_window() {
    let mut ppu = Ppu::new();

    run_dots(&mut ppu, HBLANK_START_DOT as u32);
    assert!(ppu.in_hblank(), "dot 256 starts h-blank");

    let events = run_dots(&mut ppu, 1);
    assert_ne!(events & EVENT_HBLANK_START, 0);

    run_dots(&mut ppu, (DOTS_PER_LINE - HBLANK_START_DOT - 1) as u32);
    assert!(!ppu.in_hblank(), "h-blank ends at the next line start");
}

#[test]
fn test_hv_irq_hv_mode_fires_at_target() {
    let mut ppu = Ppu::new();
    ppu.set_hv_irq_config(HvIrqMode::HV, 100, 50);

    // Up to line 50, dot 100 (exclusive): no IRQ
    let dots_before = DOTS_PER_LINE as u32 * 50 + 100;
    let events = run_dots(&mut ppu, dots_before);
    assert_eq!(events & EVENT_HV_IRQ, 0);

    let events = run_dots(&mut ppu, 1);
    assert_ne!(events & EVENT_HV_IRQ, 0, "match at (100, 50)");

    // Only once per frame in HV mode
    let rest = DOTS_PER_LINE as u32 * LINES_PER_FRAME as u32 - dots_before - 1;
    let events = run_dots(&mut ppu, rest);
    assert_eq!(events & EVENT_HV_IRQ, 0);
}

#[test]
fn test_hv_irq_v_mode_fires_once_per_frame() {
    let mut ppu = Ppu::new();
    ppu.set_hv_irq_config(HvIrqMode::V, 0, 10);

    let mut hits = 0;
    for _ in 0..(DOTS_PER_LINE as u32 * LINES_PER_FRAME as u32) {
        ppu.run();
        if ppu.take_events() & EVENT_HV_IRQ != 0 {
            hits += 1;
        }
    }

    assert_eq!(hits, 1);
}

#[test]
fn test_hv_irq_h_mode_fires_every_line() {
    let mut ppu = Ppu::new();
    ppu.set_hv_irq_config(HvIrqMode::H, 20, 0);

    let mut hits = 0;
    for _ in 0..(DOTS_PER_LINE as u32 * 4) {
        ppu.run();
        if ppu.take_events() & EVENT_HV_IRQ != 0 {
            hits += 1;
        }
    }

    assert_eq!(hits, 4, "H mode matches once per line");
}
