// Memory bus integration tests
//
// Exercises the LowROM decoding paths through the public bus API: WRAM
// mirroring, ROM linearization, SRAM bank folding and I/O routing.

use snes_rs::{AddressingType, Membus, Sram};

fn lowrom_bus() -> Membus {
    let mut bus = Membus::new(AddressingType::LowRom, false);
    bus.rom = vec![0; 4 * 1024 * 1024];
    bus.sram = Some(Sram::new(512 * 1024));
    bus
}

#[test]
fn lowrom_ram() {
    let mut bus = lowrom_bus();
    let mut cycles = 0;

    // Bank 0x00 mirrored WRAM
    bus.write_u8(0x001234, 0x43, &mut cycles);
    assert_eq!(bus.wram.read(0x1234), 0x43);
    assert_eq!(bus.read_u8(0x001234, &mut cycles), 0x43);
    assert_eq!(bus.read_u8(0x7E1234, &mut cycles), 0x43);

    // Bank 0x7E
    bus.write_u8(0x7E123A, 0x43, &mut cycles);
    assert_eq!(bus.wram.read(0x123A), 0x43);
    assert_eq!(bus.read_u8(0x00123A, &mut cycles), 0x43);

    // Bank 0x7F
    bus.write_u8(0x7F223A, 0x43, &mut cycles);
    assert_eq!(bus.wram.read(0x1223A), 0x43);
    assert_eq!(bus.read_u8(0x7F223A, &mut cycles), 0x43);

    // write_u16 is low byte first
    bus.write_u16(0x001334, 0x4243, &mut cycles);
    assert_eq!(bus.wram.read(0x1334), 0x43);
    assert_eq!(bus.wram.read(0x1335), 0x42);
    assert_eq!(bus.read_u16(0x001334, &mut cycles), 0x4243);
    assert_eq!(bus.read_u16(0x7E1334, &mut cycles), 0x4243);
}

#[test]
fn lowrom_rom() {
    let mut bus = lowrom_bus();
    let mut cycles = 0;

    bus.rom[0x0] = 0x43;
    assert_eq!(bus.read_u8(0x008000, &mut cycles), 0x43);
    assert_eq!(bus.read_u8(0x808000, &mut cycles), 0x43);

    bus.rom[0x80010] = 0x53;
    assert_eq!(bus.read_u8(0x108010, &mut cycles), 0x53);
    assert_eq!(bus.read_u8(0x908010, &mut cycles), 0x53);

    // Multi-byte reads walk across the bank boundary
    bus.rom[0x7FFF] = 0x48;
    bus.rom[0x8000] = 0x49;
    bus.rom[0x8001] = 0x4A;
    assert_eq!(bus.read_u8(0x00FFFF, &mut cycles), 0x48);
    assert_eq!(bus.read_u8(0x018000, &mut cycles), 0x49);
    assert_eq!(bus.read_u16(0x00FFFF, &mut cycles), 0x4948);
    assert_eq!(bus.read_u24(0x00FFFF, &mut cycles), 0x4A4948);

    bus.rom[0x3FFFFE] = 0x80;
    bus.rom[0x3FFFFF] = 0x81;
    assert_eq!(bus.read_u16(0xFFFFFE, &mut cycles), 0x8180);
}

#[test]
fn lowrom_sram() {
    let mut bus = lowrom_bus();
    let mut cycles = 0;

    // Bank 0x72
    bus.write_u8(0x724343, 0x43, &mut cycles);
    assert_eq!(bus.sram.as_ref().unwrap().read(0x14343), 0x43);
    assert_eq!(bus.read_u8(0x724343, &mut cycles), 0x43);

    // Bank 0xFF
    bus.write_u8(0xFF6666, 0x43, &mut cycles);
    assert_eq!(bus.sram.as_ref().unwrap().read(0x7E666), 0x43);
    assert_eq!(bus.read_u8(0xFF6666, &mut cycles), 0x43);
}

#[test]
fn lowrom_apu_ports() {
    let mut bus = lowrom_bus();
    let mut cycles = 0;

    // The APU mailbox echoes the CPU side; banks fold into $2140-$2143
    bus.write_u8(0x002140, 0x43, &mut cycles);
    assert_eq!(bus.read_u8(0x002140, &mut cycles), 0x43);
    assert_eq!(bus.read_u8(0x3F2140, &mut cycles), 0x43);

    bus.write_u8(0x002141, 0x44, &mut cycles);
    assert_eq!(bus.read_u16(0x002140, &mut cycles), 0x4443);
}

#[test]
fn cycle_accounting() {
    let mut bus = lowrom_bus();

    let mut one = 0;
    bus.read_u8(0x001234, &mut one);

    let mut two = 0;
    bus.read_u16(0x001234, &mut two);
    assert_eq!(two, one * 2, "u16 costs two byte accesses");

    let mut three = 0;
    bus.read_u24(0x001234, &mut three);
    assert_eq!(three, one * 3, "u24 costs three byte accesses");
}

#[test]
fn fault_counter() {
    let mut bus = lowrom_bus();
    let mut cycles = 0;

    assert_eq!(bus.fault_count(), 0);

    // Unmapped hole in the system area
    bus.read_u8(0x005432, &mut cycles);
    assert_eq!(bus.fault_count(), 1);

    // Write to read-only ROM
    bus.write_u8(0x00C000, 0x00, &mut cycles);
    assert_eq!(bus.fault_count(), 2);
}
