// Console integration tests
//
// Drives whole frames through the public facade: frame emission shape,
// NMI delivery on v-blank, schedule monotonicity and save states.

mod common;

use std::rc::Rc;

use common::{make_lowrom_image, with_program, CountingRenderer};
use snes_rs::{Cartridge, Console, Controller, SaveStateError};

/// Boot program: enable NMI + auto-joypad, then spin.
///
/// ```text
/// 8000: A9 81      LDA #$81
/// 8002: 8D 00 42   STA $4200
/// 8005: 4C 05 80   JMP $8005
/// ```
/// NMI handler at $9000 (ROM offset 0x1000):
/// ```text
/// 9000: A9 42      LDA #$42
/// 9002: 8D 00 01   STA $0100
/// 9005: 40         RTI
/// ```
fn boot_rom() -> Vec<u8> {
    let mut rom = with_program(
        make_lowrom_image(),
        &[0xA9, 0x81, 0x8D, 0x00, 0x42, 0x4C, 0x05, 0x80],
    );
    rom[0x1000..0x1006].copy_from_slice(&[0xA9, 0x42, 0x8D, 0x00, 0x01, 0x40]);
    rom
}

fn console_with_boot_rom() -> Console {
    let mut console = Console::new();
    console.plug_cartridge(Cartridge::from_bytes(boot_rom()).expect("valid image"));
    console
}

#[test]
fn frame_emission_shape() {
    let mut console = console_with_boot_rom();

    let renderer = CountingRenderer::default();
    let stats = Rc::clone(&renderer.state);
    console.add_renderer(Box::new(renderer));

    console.render_single_frame(true);

    let stats = stats.borrow();
    assert_eq!(stats.scan_started, 1);
    assert_eq!(stats.scan_ended, 1);
    assert_eq!(stats.pixels, 256 * 224, "57,344 draw_pixel calls per frame");
}

#[test]
fn fast_forward_skips_rendering() {
    let mut console = console_with_boot_rom();

    let renderer = CountingRenderer::default();
    let stats = Rc::clone(&renderer.state);
    console.add_renderer(Box::new(renderer));

    console.render_single_frame(false);

    assert_eq!(stats.borrow().pixels, 0, "skip mode issues no callbacks");

    // Rendering resumes on the next frame
    console.render_single_frame(true);
    assert_eq!(stats.borrow().pixels, 256 * 224);
}

#[test]
fn nmi_dispatched_on_vblank() {
    let mut console = console_with_boot_rom();

    // Two frames: the first ends before v-blank, the second crosses it
    console.render_single_frame(true);
    console.render_single_frame(true);

    // The NMI handler stored a witness byte in WRAM
    assert_eq!(console.bus_fault_count(), 0);
    assert_eq!(
        console.peek_u8(0x7E0100),
        0x42,
        "NMI handler ran during v-blank"
    );
}

#[test]
fn controller_autoread_packs_start_button() {
    let mut console = console_with_boot_rom();

    console.set_controller1(Controller {
        start: true,
        ..Controller::default()
    });

    // Cross a v-blank so the auto-read strobes (the boot program enables
    // it through NMITIMEN bit 0)
    console.render_single_frame(true);
    console.render_single_frame(true);

    // Start is bit 12 of the packed word
    assert_eq!(console.peek_u8(0x004218), 0x00);
    assert_eq!(console.peek_u8(0x004219), 0x10);
}

#[test]
fn master_clock_is_monotonic() {
    let mut console = console_with_boot_rom();

    let mut last = console.master_clock();
    for _ in 0..100_000 {
        console.step();
        let now = console.master_clock();
        assert!(now >= last, "master clock went backwards");
        last = now;
    }

    assert!(last > 0, "the schedule makes progress");
}

#[test]
fn frame_duration_in_master_cycles() {
    let mut console = console_with_boot_rom();

    // Let the first frame start cleanly
    console.render_single_frame(true);
    let start = console.master_clock();
    console.render_single_frame(true);
    let elapsed = console.master_clock() - start;

    // One frame is 341 dots x 262 lines x 4 cycles; the boundary lands
    // within a CPU instruction of the exact count
    let expected = 341 * 262 * 4;
    let slack = 200;
    assert!(
        (expected - slack..=expected + slack).contains(&elapsed),
        "frame took {} cycles, expected about {}",
        elapsed,
        expected
    );
}

#[test]
fn save_state_roundtrip() {
    let mut console = console_with_boot_rom();

    console.render_single_frame(true);
    let saved = console.save_state_bytes();

    // Diverge, then restore
    console.render_single_frame(true);
    console.render_single_frame(true);
    assert_ne!(console.save_state_bytes(), saved);

    console.load_state_bytes(&saved).expect("load succeeds");
    assert_eq!(console.save_state_bytes(), saved, "state restored exactly");
}

#[test]
fn save_state_rejects_bad_magic() {
    let mut console = console_with_boot_rom();

    let mut state = console.save_state_bytes();
    state[0] = b'X';

    match console.load_state_bytes(&state) {
        Err(SaveStateError::BadMagic) => {}
        other => panic!("expected BadMagic, got {:?}", other.err()),
    }
}

#[test]
fn save_state_rejects_mapper_mismatch() {
    let mut console = console_with_boot_rom();

    let before = console.save_state_bytes();
    let mut state = before.clone();
    state[8] = 1; // claim HighROM

    match console.load_state_bytes(&state) {
        Err(SaveStateError::MapperMismatch) => {}
        other => panic!("expected MapperMismatch, got {:?}", other.err()),
    }

    // The failed load left the console untouched
    assert_eq!(console.save_state_bytes(), before);
}

#[test]
fn save_state_rejects_truncation() {
    let mut console = console_with_boot_rom();

    let state = console.save_state_bytes();
    let truncated = &state[..state.len() - 100];

    match console.load_state_bytes(truncated) {
        Err(SaveStateError::Truncated) => {}
        other => panic!("expected Truncated, got {:?}", other.err()),
    }
}

#[test]
fn audio_samples_flow_each_frame() {
    let mut console = console_with_boot_rom();

    let renderer = CountingRenderer::default();
    let stats = Rc::clone(&renderer.state);
    console.add_renderer(Box::new(renderer));

    // Cross two v-blanks so the APU bridge drains at least once
    for _ in 0..3 {
        console.render_single_frame(true);
    }

    let pairs = stats.borrow().audio_sample_pairs;
    assert!(pairs > 0, "the silent core still paces samples");

    // ~533 pairs per 60 Hz frame; allow generous slack for frame phase
    assert!(pairs >= 400, "got only {} sample pairs", pairs);
}
