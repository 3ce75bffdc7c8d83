// PPU register decode tests

use crate::ppu::Ppu;
use crate::registers::*;

#[test]
fn test_inidisp_brightness_and_blanking() {
    let mut ppu = Ppu::new();

    ppu.write(INIDISP, 0x8F);
    assert!(ppu.forced_blanking());
    assert_eq!(ppu.brightness(), 0x0F);

    ppu.write(INIDISP, 0x05);
    assert!(!ppu.forced_blanking());
    assert_eq!(ppu.brightness(), 0x05);
}

#[test]
fn test_bg_scroll_shared_latch() {
    let mut ppu = Ppu::new();

    // Vertical scroll assembles (new << 8) | old
    ppu.write(BG1VOFS, 0x34);
    ppu.write(BG1VOFS, 0x01);

    assert_eq!(ppu.backgrounds[0].v_offset, 0x0134);
}

#[test]
fn test_bgmode_tile_sizes() {
    let mut ppu = Ppu::new();

    // Mode 1, BG1 16x16 tiles
    ppu.write(BGMODE, 0x11);

    assert!(ppu.backgrounds[0].tile_size16);
    assert!(!ppu.backgrounds[1].tile_size16);
}

#[test]
fn test_tilemap_and_tile_bases() {
    let mut ppu = Ppu::new();

    ppu.write(BG1SC, 0x7C); // base 0x1F (1K-word units), 32x32
    assert_eq!(ppu.backgrounds[0].tilemap_base, 0x1F);
    assert_eq!(ppu.backgrounds[0].tilemap_size, 0);

    ppu.write(BG12NBA, 0x42);
    assert_eq!(ppu.backgrounds[0].tile_base, 0x2000);
    assert_eq!(ppu.backgrounds[1].tile_base, 0x4000);
}

#[test]
fn test_mode7_matrix_latch_and_multiply() {
    let mut ppu = Ppu::new();

    // M7A = 0x0180 (1.5 in 8.8), then M7B's top byte drives MPY
    ppu.write(M7A, 0x80);
    ppu.write(M7A, 0x01);

    ppu.write(M7B, 0x00);
    ppu.write(M7B, 0x02);

    // MPY = 0x0180 * 2
    assert_eq!(ppu.read(MPYL), 0x00);
    assert_eq!(ppu.read(MPYM), 0x03);
    assert_eq!(ppu.read(MPYH), 0x00);
}

#[test]
fn test_mode7_multiply_signed() {
    let mut ppu = Ppu::new();

    // M7A = -2
    ppu.write(M7A, 0xFE);
    ppu.write(M7A, 0xFF);

    // multiplier = -1
    ppu.write(M7B, 0x00);
    ppu.write(M7B, 0xFF);

    // -2 * -1 = 2
    assert_eq!(ppu.read(MPYL), 0x02);
    assert_eq!(ppu.read(MPYM), 0x00);
    assert_eq!(ppu.read(MPYH), 0x00);
}

#[test]
fn test_coldata_accumulates_channels() {
    let mut ppu = Ppu::new();

    ppu.write(COLDATA, 0x20 | 0x10); // red = 16
    ppu.write(COLDATA, 0x40 | 0x08); // green = 8
    ppu.write(COLDATA, 0x80 | 0x1F); // blue = 31

    // Internal fixed color is 0BBBBBGG GGGRRRRR
    // (observed through color math; checked here via state dump)
    let mut state = Vec::new();
    ppu.dump_state(&mut state);
    // Not asserting the buffer layout; just exercising the path
    assert!(!state.is_empty());
}

#[test]
fn test_position_latch_read() {
    let mut ppu = Ppu::new();

    // Advance a few dots so the counters are non-zero
    for _ in 0..10 {
        ppu.run();
    }

    ppu.read(SLHV);
    let low = ppu.read(OPHCT);
    let high = ppu.read(OPHCT);
    let h = low as u16 | ((high as u16 & 1) << 8);

    assert_eq!(h, 10);
}

#[test]
fn test_stat_versions() {
    let mut ppu = Ppu::new();
    assert_eq!(ppu.read(STAT77) & 0x0F, 1);
    assert_eq!(ppu.read(STAT78) & 0x0F, 1);
}
