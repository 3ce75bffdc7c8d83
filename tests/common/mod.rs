// Shared helpers for integration tests

use std::cell::RefCell;
use std::rc::Rc;

use snes_rs::renderer::{Color, Renderer};

pub const LOWROM_HEADER: usize = 0x7FC0;

/// Build a minimal LowROM image with a valid header, reset vector $8000
/// and NMI vector $9000.
pub fn make_lowrom_image() -> Vec<u8> {
    let mut rom = vec![0u8; 512 * 1024];
    let h = LOWROM_HEADER;

    for i in 0..21 {
        rom[h + i] = b' ';
    }
    rom[h..h + 9].copy_from_slice(b"TEST CART");

    rom[h + 0x15] = 0x00; // LowROM, SlowROM
    rom[h + 0x17] = 9; // 512 KiB
    rom[h + 0x18] = 3; // 8 KiB SRAM

    // checksum + complement = 0xFFFF
    rom[h + 0x1C] = 0xFF;
    rom[h + 0x1D] = 0x5A;
    rom[h + 0x1E] = 0x00;
    rom[h + 0x1F] = 0xA5;

    // NMI vector at $00FFEA -> $9000, reset vector at $00FFFC -> $8000
    rom[h + 0x2A] = 0x00;
    rom[h + 0x2B] = 0x90;
    rom[h + 0x3C] = 0x00;
    rom[h + 0x3D] = 0x80;

    rom
}

/// Install a program at $00:8000 (ROM offset 0).
pub fn with_program(mut rom: Vec<u8>, program: &[u8]) -> Vec<u8> {
    rom[..program.len()].copy_from_slice(program);
    rom
}

/// Renderer that counts callbacks for frame-shape assertions.
#[derive(Default)]
pub struct CountingRenderer {
    pub state: Rc<RefCell<RenderStats>>,
}

#[derive(Default)]
pub struct RenderStats {
    pub scan_started: u32,
    pub scan_ended: u32,
    pub pixels: u64,
    pub last_pixel: Color,
    pub audio_sample_pairs: u64,
}

impl Renderer for CountingRenderer {
    fn scan_started(&mut self) {
        self.state.borrow_mut().scan_started += 1;
    }

    fn draw_pixel(&mut self, color: Color) {
        let mut stats = self.state.borrow_mut();
        stats.pixels += 1;
        stats.last_pixel = color;
    }

    fn scan_ended(&mut self) {
        self.state.borrow_mut().scan_ended += 1;
    }

    fn play_audio_samples(&mut self, samples: &[i16]) {
        self.state.borrow_mut().audio_sample_pairs += (samples.len() / 2) as u64;
    }
}
