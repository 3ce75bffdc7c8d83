// Bus module - 24-bit memory bus implementation
//
// This module implements the main memory bus that connects the CPU to all
// memory-mapped components. The 24-bit address space is partitioned into
// 256 banks of 64 KiB; an ordered list of ranges per bank routes each
// access to a component, charges its access cycles, and converts the
// bank/offset pair into a component-local address.
//
// # Memory Map (LowROM)
//
// ```text
// $00-$3F:$0000-$1FFF  WRAM mirror (first 8 KiB)
// $00-$3F:$2100-$213F  PPU registers
// $00-$3F:$2140-$217F  APU mailbox ports
// $00-$3F:$2180-$2183  WRAM indirect window
// $00-$3F:$4016-$421F  Joypads / IRQ / math / DMA enables
// $00-$3F:$4300-$437F  DMA channel registers
// $00-$7D:$8000-$FFFF  ROM
// $70-$7D:$0000-$7FFF  SRAM
// $7E-$7F:$0000-$FFFF  WRAM
// $80-$FD              Mirrors of $00-$7D
// $FE-$FF              ROM / SRAM tail
// ```
//
// The first 32 KiB of banks $00-$3F (the "system area") is identical in
// every bank, so it is decoded through a dense 32 KiB lookup table;
// everything else goes through the per-bank range list.

use crate::apu::Apu;
use crate::cartridge::AddressingType;
use crate::debug;
use crate::dma::Dma;
use crate::input::ControllerPorts;
use crate::math::Math;
use crate::ppu::Ppu;
use crate::ram::{Sram, Wram};
use crate::registers;
use crate::timings;

const TAG: &str = "membus";

/// Access directions allowed by a memory range.
pub const ACCESS_R: u8 = 1 << 0;
pub const ACCESS_W: u8 = 1 << 1;
pub const ACCESS_RW: u8 = ACCESS_R | ACCESS_W;

/// Components addressable through the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Ram,
    IndirectRam,
    Sram,
    Rom,
    Ppu,
    Apu,
    Dma,
    Irq,
    Math,
    Joypads,
    /// Registers handled by the bus itself ($420D)
    Membus,
}

/// One contiguous mapping entry: a bank range crossed with an offset
/// range, the component it routes to, and the access cost.
#[derive(Debug)]
pub struct MemoryRange {
    pub bank_start: u8,
    pub bank_end: u8,
    pub offset_start: u16,
    pub offset_end: u16,
    pub target: Target,
    pub access: u8,
    /// Master cycles per byte; 0 for ROM (fast/slow selected at access time)
    pub cycles: u32,
}

/// Bank substitution rule applied before range lookup.
#[derive(Debug)]
pub struct BankMirror {
    pub src_bank_start: u8,
    pub src_bank_end: u8,
    pub target_bank_start: u8,
    pub target_bank_end: u8,
}

struct MemoryMap {
    components: &'static [MemoryRange],
    mirrors: &'static [BankMirror],
}

macro_rules! range {
    ($bs:expr, $be:expr, $os:expr, $oe:expr, $target:ident, $access:expr, $cycles:expr) => {
        MemoryRange {
            bank_start: $bs,
            bank_end: $be,
            offset_start: $os,
            offset_end: $oe,
            target: Target::$target,
            access: $access,
            cycles: $cycles,
        }
    };
}

#[rustfmt::skip]
static LOWROM_MAP: MemoryMap = MemoryMap {
    components: &[
        // WRAM direct access
        range!(0x00, 0x3F, 0x0000, 0x1FFF, Ram, ACCESS_RW, timings::RAM_ACCESS),
        range!(0x7E, 0x7F, 0x0000, 0xFFFF, Ram, ACCESS_RW, timings::RAM_ACCESS),

        // WRAM indirect access
        range!(0x00, 0x3F, 0x2180, 0x2180, IndirectRam, ACCESS_RW, timings::RAM_ACCESS),
        range!(0x00, 0x3F, 0x2181, 0x2183, IndirectRam, ACCESS_W, timings::RAM_ACCESS),

        // PPU
        range!(0x00, 0x3F, 0x2100, 0x2133, Ppu, ACCESS_W, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x2134, 0x213F, Ppu, ACCESS_R, timings::IO_FAST_ACCESS),

        // APU
        range!(0x00, 0x3F, 0x2140, 0x217F, Apu, ACCESS_RW, timings::IO_FAST_ACCESS),

        // DMA
        range!(0x00, 0x3F, 0x4300, 0x437F, Dma, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x420B, 0x420C, Dma, ACCESS_RW, timings::IO_FAST_ACCESS),

        // Math unit
        range!(0x00, 0x3F, 0x4202, 0x4206, Math, ACCESS_W, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4214, 0x4217, Math, ACCESS_R, timings::IO_FAST_ACCESS),

        // IRQ configuration
        range!(0x00, 0x3F, 0x4200, 0x4200, Irq, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4207, 0x420A, Irq, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4210, 0x4212, Irq, ACCESS_RW, timings::IO_FAST_ACCESS),

        // ROM (cycles selected from the fast/slow flag at access time)
        range!(0x00, 0x7D, 0x8000, 0xFFFF, Rom, ACCESS_R, 0),
        range!(0x40, 0x6F, 0x0000, 0x7FFF, Rom, ACCESS_R, 0),
        range!(0xFE, 0xFF, 0x8000, 0xFFFF, Rom, ACCESS_R, 0),

        // SRAM
        range!(0x70, 0x7D, 0x0000, 0x7FFF, Sram, ACCESS_RW, timings::RAM_ACCESS),
        range!(0xFE, 0xFF, 0x0000, 0x7FFF, Sram, ACCESS_RW, timings::RAM_ACCESS),

        // Bus-internal registers
        range!(0x00, 0x3F, 0x420D, 0x420D, Membus, ACCESS_RW, timings::IO_FAST_ACCESS),

        // Joypads
        range!(0x00, 0x3F, 0x4016, 0x4017, Joypads, ACCESS_RW, timings::IO_SLOW_ACCESS),
        range!(0x00, 0x3F, 0x4201, 0x4201, Joypads, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4213, 0x4213, Joypads, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4218, 0x421F, Joypads, ACCESS_RW, timings::IO_FAST_ACCESS),
    ],
    mirrors: &[
        BankMirror { src_bank_start: 0x80, src_bank_end: 0xFD, target_bank_start: 0x00, target_bank_end: 0x7D },
    ],
};

#[rustfmt::skip]
static HIGHROM_MAP: MemoryMap = MemoryMap {
    components: &[
        // WRAM direct access
        range!(0x00, 0x3F, 0x0000, 0x1FFF, Ram, ACCESS_RW, timings::RAM_ACCESS),
        range!(0x7E, 0x7F, 0x0000, 0xFFFF, Ram, ACCESS_RW, timings::RAM_ACCESS),

        // WRAM indirect access
        range!(0x00, 0x3F, 0x2180, 0x2180, IndirectRam, ACCESS_RW, timings::RAM_ACCESS),
        range!(0x00, 0x3F, 0x2181, 0x2183, IndirectRam, ACCESS_W, timings::RAM_ACCESS),

        // PPU
        range!(0x00, 0x3F, 0x2100, 0x2133, Ppu, ACCESS_W, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x2134, 0x213F, Ppu, ACCESS_R, timings::IO_FAST_ACCESS),

        // APU
        range!(0x00, 0x3F, 0x2140, 0x217F, Apu, ACCESS_RW, timings::IO_FAST_ACCESS),

        // DMA
        range!(0x00, 0x3F, 0x4300, 0x437F, Dma, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x420B, 0x420C, Dma, ACCESS_RW, timings::IO_FAST_ACCESS),

        // Math unit
        range!(0x00, 0x3F, 0x4202, 0x4206, Math, ACCESS_W, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4214, 0x4217, Math, ACCESS_R, timings::IO_FAST_ACCESS),

        // IRQ configuration
        range!(0x00, 0x3F, 0x4200, 0x4200, Irq, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4207, 0x420A, Irq, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4210, 0x4212, Irq, ACCESS_RW, timings::IO_FAST_ACCESS),

        // ROM
        range!(0x00, 0x3F, 0x8000, 0xFFFF, Rom, ACCESS_R, 0),
        range!(0x40, 0x7D, 0x0000, 0xFFFF, Rom, ACCESS_R, 0),
        range!(0xFE, 0xFF, 0x0000, 0xFFFF, Rom, ACCESS_R, 0),

        // SRAM
        range!(0x20, 0x3F, 0x6000, 0x7FFF, Sram, ACCESS_RW, timings::RAM_ACCESS),

        // Bus-internal registers
        range!(0x00, 0x3F, 0x420D, 0x420D, Membus, ACCESS_RW, timings::IO_FAST_ACCESS),

        // Joypads
        range!(0x00, 0x3F, 0x4016, 0x4017, Joypads, ACCESS_RW, timings::IO_SLOW_ACCESS),
        range!(0x00, 0x3F, 0x4201, 0x4201, Joypads, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4213, 0x4213, Joypads, ACCESS_RW, timings::IO_FAST_ACCESS),
        range!(0x00, 0x3F, 0x4218, 0x421F, Joypads, ACCESS_RW, timings::IO_FAST_ACCESS),
    ],
    mirrors: &[
        BankMirror { src_bank_start: 0x80, src_bank_end: 0x9F, target_bank_start: 0x00, target_bank_end: 0x1F },
        BankMirror { src_bank_start: 0xA0, src_bank_end: 0xBF, target_bank_start: 0x20, target_bank_end: 0x3F },
        BankMirror { src_bank_start: 0xC0, src_bank_end: 0xFD, target_bank_start: 0x40, target_bank_end: 0x7D },
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BankType {
    Invalid,
    Direct,
    Mirrored,
}

struct Bank {
    bank_type: BankType,
    target_bank: u8,
    ranges: Vec<&'static MemoryRange>,
}

/// Main memory bus.
///
/// Owns every memory-mapped component; the CPU and the console drive it
/// through `read_u8`/`write_u8` and the component fields.
pub struct Membus {
    addressing_type: AddressingType,

    banks: Vec<Bank>,
    system_area: Vec<Option<&'static MemoryRange>>,

    /// MEMSEL ($420D): ROM accesses use fast timing when set
    fast_rom: bool,

    /// Invalid-map accesses observed so far (see error handling policy)
    fault_count: u64,

    /// Master-clock snapshot, refreshed by the console before dispatch.
    /// Needed by the APU bridge to convert elapsed time into SPC cycles.
    pub clock: u64,

    // Components
    pub wram: Wram,
    pub sram: Option<Sram>,
    pub rom: Vec<u8>,
    pub ppu: Ppu,
    pub apu: Apu,
    pub dma: Dma,
    pub math: Math,
    pub joypads: ControllerPorts,
    pub irq: InterruptControl,
}

impl Membus {
    /// Build a bus for the given addressing layout.
    ///
    /// Components start in their power-on state; ROM and SRAM contents are
    /// installed by the console when a cartridge is plugged.
    pub fn new(addressing_type: AddressingType, fast_rom: bool) -> Self {
        let map = match addressing_type {
            AddressingType::LowRom => &LOWROM_MAP,
            AddressingType::HighRom => &HIGHROM_MAP,
        };

        let mut banks: Vec<Bank> = (0..256)
            .map(|_| Bank {
                bank_type: BankType::Invalid,
                target_bank: 0,
                ranges: Vec::new(),
            })
            .collect();
        let mut system_area: Vec<Option<&'static MemoryRange>> = vec![None; 0x8000];

        for component in map.components {
            for bank in component.bank_start..=component.bank_end {
                let entry = &mut banks[bank as usize];
                debug_assert_ne!(entry.bank_type, BankType::Mirrored);
                entry.bank_type = BankType::Direct;
                entry.ranges.push(component);

                // Dense LUT for the hot path
                if bank <= 0x3F && component.offset_end <= 0x7FFF {
                    for offset in component.offset_start..=component.offset_end {
                        system_area[offset as usize] = Some(component);
                    }
                }
            }
        }

        for mirror in map.mirrors {
            debug_assert_eq!(
                mirror.src_bank_end - mirror.src_bank_start,
                mirror.target_bank_end - mirror.target_bank_start
            );

            for bank in mirror.src_bank_start..=mirror.src_bank_end {
                let entry = &mut banks[bank as usize];
                entry.bank_type = BankType::Mirrored;
                entry.target_bank = mirror.target_bank_start + (bank - mirror.src_bank_start);
            }
        }

        Membus {
            addressing_type,
            banks,
            system_area,
            fast_rom,
            fault_count: 0,
            clock: 0,
            wram: Wram::new(),
            sram: None,
            rom: Vec::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            dma: Dma::new(),
            math: Math::new(),
            joypads: ControllerPorts::new(),
            irq: InterruptControl::new(),
        }
    }

    pub fn addressing_type(&self) -> AddressingType {
        self.addressing_type
    }

    /// Number of invalid-map accesses observed so far.
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    pub fn fast_rom(&self) -> bool {
        self.fast_rom
    }

    /// Decode an address into (target, resolved bank, offset) and charge
    /// the access cycles. Returns `None` on a map fault.
    fn decode(&mut self, addr: u32, access: u8, cycles: &mut u32) -> Option<(Target, u8, u16)> {
        let bank_id = (addr >> 16) as u8;
        let offset = (addr & 0xFFFF) as u16;

        // Resolve mirroring
        let bank = &self.banks[bank_id as usize];
        let target_bank = match bank.bank_type {
            BankType::Mirrored => bank.target_bank,
            _ => bank_id,
        };

        let range = if target_bank <= 0x3F && offset <= 0x7FFF {
            self.system_area[offset as usize]
        } else {
            self.banks[target_bank as usize]
                .ranges
                .iter()
                .copied()
                .find(|range| range.offset_start <= offset && offset <= range.offset_end)
        };

        let range = match range {
            Some(range) if range.access & access != 0 => range,
            Some(_) => {
                self.fault_count += 1;
                debug::warn(
                    TAG,
                    format!("Access mask violation at {:06X} (access={})", addr, access),
                );
                return None;
            }
            None => {
                self.fault_count += 1;
                debug::warn(TAG, format!("Unmapped access at {:06X}", addr));
                return None;
            }
        };

        *cycles += if range.target == Target::Rom {
            self.rom_timing(bank_id)
        } else {
            range.cycles
        };

        Some((range.target, target_bank, offset))
    }

    /// ROM access cost for a bank.
    ///
    /// The MEMSEL flag is applied unconditionally; on hardware fast timing
    /// only reaches banks >= $80.
    fn rom_timing(&self, _bank: u8) -> u32 {
        if self.fast_rom {
            timings::ROM_FAST_ACCESS
        } else {
            timings::ROM_SLOW_ACCESS
        }
    }

    /// Convert a resolved (bank, offset) pair into a ROM-local address.
    fn rom_address(&self, bank: u8, offset: u16) -> u32 {
        let bank = bank as u32;
        let offset = offset as u32;

        match self.addressing_type {
            AddressingType::LowRom => {
                if bank <= 0x7D && offset >= 0x8000 {
                    bank * 0x8000 + (offset - 0x8000)
                } else if (0x40..=0x6F).contains(&bank) && offset < 0x8000 {
                    bank * 0x8000 + offset
                } else if bank >= 0xFE {
                    (bank - 0xFE + 0x7E) * 0x8000 + (offset - 0x8000)
                } else {
                    debug_assert!(false, "unreachable ROM mapping {:02X}:{:04X}", bank, offset);
                    0
                }
            }
            AddressingType::HighRom => {
                let quadrant = match bank {
                    0x00..=0x3F => bank,
                    0x40..=0x7D => bank - 0x40,
                    0x80..=0xBF => bank - 0x80,
                    _ => bank - 0xC0,
                };
                (quadrant << 16) + offset
            }
        }
    }

    /// Convert a resolved (bank, offset) pair into an SRAM-local address.
    fn sram_address(&self, bank: u8, offset: u16) -> u32 {
        let bank = bank as u32;
        let offset = offset as u32;

        match self.addressing_type {
            AddressingType::LowRom => {
                if bank >= 0xFE {
                    (bank - 0xFE + 0x0E) * 0x8000 + offset
                } else {
                    (bank - 0x70) * 0x8000 + offset
                }
            }
            AddressingType::HighRom => (bank - 0x20) * 0x2000 + (offset - 0x6000),
        }
    }

    /// Convert a resolved (bank, offset) pair into a WRAM-local address.
    fn ram_address(&self, bank: u8, offset: u16) -> u32 {
        if (0x7E..=0x7F).contains(&bank) {
            (bank as u32 - 0x7E) * 0x10000 + offset as u32
        } else {
            // Short window in the system area
            offset as u32
        }
    }

    /// Read one byte, charging the target's access cycles.
    pub fn read_u8(&mut self, addr: u32, cycles: &mut u32) -> u8 {
        let (target, bank, offset) = match self.decode(addr, ACCESS_R, cycles) {
            Some(decoded) => decoded,
            None => return 0,
        };

        match target {
            Target::Ram => {
                let local = self.ram_address(bank, offset);
                self.wram.read(local)
            }
            Target::IndirectRam => match offset {
                registers::WMDATA => self.wram.read_indirect(),
                _ => 0,
            },
            Target::Sram => match &self.sram {
                Some(sram) => sram.read(self.sram_address(bank, offset) & 0xFFFFFF),
                // Games without SRAM read the open bus as 0
                None => 0,
            },
            Target::Rom => {
                let local = self.rom_address(bank, offset) as usize;
                if self.rom.is_empty() {
                    0
                } else {
                    self.rom[local % self.rom.len()]
                }
            }
            Target::Ppu => self.ppu.read(offset),
            Target::Apu => self.apu.read_port(self.clock, offset),
            Target::Dma => self.dma.read(offset),
            Target::Irq => self.irq_read(offset),
            Target::Math => self.math.read(offset),
            Target::Joypads => self.joypads.read(offset),
            Target::Membus => self.internal_read(offset),
        }
    }

    /// Read a 16-bit little-endian word as two sequential byte accesses.
    pub fn read_u16(&mut self, addr: u32, cycles: &mut u32) -> u16 {
        let lo = self.read_u8(addr, cycles) as u16;
        let hi = self.read_u8(addr + 1, cycles) as u16;
        (hi << 8) | lo
    }

    /// Read a 24-bit little-endian value as three sequential byte accesses.
    pub fn read_u24(&mut self, addr: u32, cycles: &mut u32) -> u32 {
        let lo = self.read_u8(addr, cycles) as u32;
        let mid = self.read_u8(addr + 1, cycles) as u32;
        let hi = self.read_u8(addr + 2, cycles) as u32;
        (hi << 16) | (mid << 8) | lo
    }

    /// Write one byte, charging the target's access cycles.
    pub fn write_u8(&mut self, addr: u32, value: u8, cycles: &mut u32) {
        let (target, bank, offset) = match self.decode(addr, ACCESS_W, cycles) {
            Some(decoded) => decoded,
            None => return,
        };

        match target {
            Target::Ram => {
                let local = self.ram_address(bank, offset);
                self.wram.write(local, value);
            }
            Target::IndirectRam => match offset {
                registers::WMDATA => self.wram.write_indirect(value),
                registers::WMADDL => self.wram.set_indirect_address_byte(0, value),
                registers::WMADDM => self.wram.set_indirect_address_byte(1, value),
                registers::WMADDH => self.wram.set_indirect_address_byte(2, value),
                _ => {}
            },
            Target::Sram => {
                let local = self.sram_address(bank, offset);
                if let Some(sram) = &mut self.sram {
                    sram.write(local, value);
                }
            }
            Target::Rom => {
                // Unreachable: the map refuses ROM writes
            }
            Target::Ppu => self.ppu.write(offset, value),
            Target::Apu => self.apu.write_port(self.clock, offset, value),
            Target::Dma => self.dma.write(offset, value),
            Target::Irq => self.irq_write(offset, value),
            Target::Math => self.math.write(offset, value),
            Target::Joypads => self.joypads.write(offset, value),
            Target::Membus => self.internal_write(offset, value),
        }
    }

    /// Write a 16-bit little-endian word as two sequential byte accesses.
    pub fn write_u16(&mut self, addr: u32, value: u16, cycles: &mut u32) {
        self.write_u8(addr, (value & 0xFF) as u8, cycles);
        self.write_u8(addr + 1, (value >> 8) as u8, cycles);
    }

    fn internal_read(&mut self, offset: u16) -> u8 {
        match offset {
            registers::MEMSEL => self.fast_rom as u8,
            _ => {
                debug::warn(TAG, format!("Ignore read at {:04X}", offset));
                0
            }
        }
    }

    fn internal_write(&mut self, offset: u16, value: u8) {
        match offset {
            registers::MEMSEL => {
                self.fast_rom = value & 1 != 0;
            }
            _ => {
                debug::warn(TAG, format!("Ignore write {:02X} at {:04X}", value, offset));
            }
        }
    }

    fn irq_read(&mut self, offset: u16) -> u8 {
        match offset {
            registers::NMITIMEN => self.irq.nmitimen,

            registers::RDNMI => {
                // Bit 7: NMI flag (cleared on read), low bits: CPU version
                let value = ((self.irq.nmi_flag as u8) << 7) | 0x02;
                self.irq.nmi_flag = false;
                value
            }

            registers::TIMEUP => {
                // Bit 7: H/V IRQ flag, cleared on read (acks the IRQ)
                let value = (self.irq.irq_flag as u8) << 7;
                self.irq.irq_flag = false;
                value
            }

            registers::HVBJOY => {
                let mut value = 0;
                if self.ppu.in_vblank() {
                    value |= 1 << 7;
                }
                if self.ppu.in_hblank() {
                    value |= 1 << 6;
                }
                if self.irq.joypad_busy {
                    value |= 1;
                }
                value
            }

            registers::HTIMEL | registers::HTIMEH | registers::VTIMEL | registers::VTIMEH => 0,

            _ => {
                debug::warn(TAG, format!("Ignore IRQ read at {:04X}", offset));
                0
            }
        }
    }

    fn irq_write(&mut self, offset: u16, value: u8) {
        match offset {
            registers::NMITIMEN => {
                self.irq.nmitimen = value;
                self.push_hv_irq_config();
            }

            registers::HTIMEL => {
                self.irq.htime = (self.irq.htime & 0x100) | value as u16;
                self.push_hv_irq_config();
            }
            registers::HTIMEH => {
                self.irq.htime = (self.irq.htime & 0xFF) | (((value & 1) as u16) << 8);
                self.push_hv_irq_config();
            }
            registers::VTIMEL => {
                self.irq.vtime = (self.irq.vtime & 0x100) | value as u16;
                self.push_hv_irq_config();
            }
            registers::VTIMEH => {
                self.irq.vtime = (self.irq.vtime & 0xFF) | (((value & 1) as u16) << 8);
                self.push_hv_irq_config();
            }

            registers::RDNMI | registers::TIMEUP | registers::HVBJOY => {
                // Read-side registers; writes accepted and dropped
            }

            _ => {
                debug::warn(TAG, format!("Ignore IRQ write {:02X} at {:04X}", value, offset));
            }
        }
    }

    fn push_hv_irq_config(&mut self) {
        self.ppu
            .set_hv_irq_config(self.irq.hv_irq_mode(), self.irq.htime, self.irq.vtime);
    }
}

/// NMI / H-V IRQ / joypad auto-read configuration block ($4200-$4212).
pub struct InterruptControl {
    /// NMITIMEN: bit 7 NMI enable, bits 4-5 H/V IRQ mode, bit 0 auto-read
    pub nmitimen: u8,

    pub htime: u16,
    pub vtime: u16,

    /// RDNMI bit 7
    pub nmi_flag: bool,
    /// TIMEUP bit 7
    pub irq_flag: bool,
    /// HVBJOY bit 0
    pub joypad_busy: bool,
}

/// H/V IRQ trigger mode (NMITIMEN bits 4-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvIrqMode {
    Disabled,
    H,
    V,
    HV,
}

impl InterruptControl {
    pub fn new() -> Self {
        InterruptControl {
            nmitimen: 0,
            htime: 0x1FF,
            vtime: 0x1FF,
            nmi_flag: false,
            irq_flag: false,
            joypad_busy: false,
        }
    }

    pub fn nmi_enabled(&self) -> bool {
        self.nmitimen & 0x80 != 0
    }

    pub fn joypad_autoread(&self) -> bool {
        self.nmitimen & 1 != 0
    }

    pub fn hv_irq_mode(&self) -> HvIrqMode {
        match (self.nmitimen >> 4) & 0b11 {
            0 => HvIrqMode::Disabled,
            1 => HvIrqMode::H,
            2 => HvIrqMode::V,
            _ => HvIrqMode::HV,
        }
    }

    pub fn dump_state(&self, out: &mut Vec<u8>) {
        out.push(self.nmitimen);
        out.extend_from_slice(&self.htime.to_le_bytes());
        out.extend_from_slice(&self.vtime.to_le_bytes());
        out.push(self.nmi_flag as u8);
        out.push(self.irq_flag as u8);
        out.push(self.joypad_busy as u8);
    }

    pub fn restore_state(&mut self, state: &mut crate::emulator::save_state::StateReader) {
        self.nmitimen = state.read_u8();
        self.htime = state.read_u16();
        self.vtime = state.read_u16();
        self.nmi_flag = state.read_u8() != 0;
        self.irq_flag = state.read_u8() != 0;
        self.joypad_busy = state.read_u8() != 0;
    }
}

impl Default for InterruptControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowrom_bus() -> Membus {
        let mut bus = Membus::new(AddressingType::LowRom, false);
        bus.rom = vec![0; 4 * 1024 * 1024];
        bus.sram = Some(Sram::new(512 * 1024));
        bus
    }

    // ========================================
    // Decode and mirroring
    // ========================================

    #[test]
    fn test_wram_mirror_banks() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        bus.write_u8(0x001234, 0x43, &mut cycles);
        assert_eq!(bus.read_u8(0x001234, &mut cycles), 0x43);
        assert_eq!(bus.read_u8(0x7E1234, &mut cycles), 0x43, "bank $00 mirrors WRAM");
        assert_eq!(bus.read_u8(0x801234, &mut cycles), 0x43, "bank $80 mirrors bank $00");
    }

    #[test]
    fn test_wram_bank_7f() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        bus.write_u8(0x7F223A, 0x43, &mut cycles);
        assert_eq!(bus.wram.read(0x1223A), 0x43);
        assert_eq!(bus.read_u8(0x7F223A, &mut cycles), 0x43);
    }

    #[test]
    fn test_rom_linearization() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        bus.rom[0x0] = 0x43;
        assert_eq!(bus.read_u8(0x008000, &mut cycles), 0x43);
        assert_eq!(bus.read_u8(0x808000, &mut cycles), 0x43);

        bus.rom[0x80010] = 0x53;
        assert_eq!(bus.read_u8(0x108010, &mut cycles), 0x53);
        assert_eq!(bus.read_u8(0x908010, &mut cycles), 0x53);
    }

    #[test]
    fn test_rom_multi_byte_reads_cross_banks() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        bus.rom[0x7FFF] = 0x48;
        bus.rom[0x8000] = 0x49;
        bus.rom[0x8001] = 0x4A;

        assert_eq!(bus.read_u8(0x00FFFF, &mut cycles), 0x48);
        assert_eq!(bus.read_u8(0x018000, &mut cycles), 0x49);
        assert_eq!(bus.read_u16(0x00FFFF, &mut cycles), 0x4948);
        assert_eq!(bus.read_u24(0x00FFFF, &mut cycles), 0x4A4948);
    }

    #[test]
    fn test_rom_tail_banks() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        bus.rom[0x3FFFFE] = 0x80;
        bus.rom[0x3FFFFF] = 0x81;
        assert_eq!(bus.read_u16(0xFFFFFE, &mut cycles), 0x8180);
    }

    #[test]
    fn test_sram_mirror_bank() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        bus.write_u8(0x724343, 0x43, &mut cycles);
        assert_eq!(bus.sram.as_ref().unwrap().read(0x14343), 0x43);
        assert_eq!(bus.read_u8(0x724343, &mut cycles), 0x43);

        bus.write_u8(0xFF6666, 0x43, &mut cycles);
        assert_eq!(bus.sram.as_ref().unwrap().read(0x7E666), 0x43);
        assert_eq!(bus.read_u8(0xFF6666, &mut cycles), 0x43);
    }

    #[test]
    fn test_missing_sram_reads_zero() {
        let mut bus = lowrom_bus();
        bus.sram = None;
        let mut cycles = 0;

        bus.write_u8(0x700000, 0x43, &mut cycles);
        assert_eq!(bus.read_u8(0x700000, &mut cycles), 0);
        assert_eq!(bus.fault_count(), 0, "missing SRAM is not a fault");
    }

    #[test]
    fn test_write_u16_order() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        bus.write_u16(0x001334, 0x4243, &mut cycles);
        assert_eq!(bus.read_u8(0x001334, &mut cycles), 0x43);
        assert_eq!(bus.read_u8(0x001335, &mut cycles), 0x42);
        assert_eq!(bus.read_u16(0x7E1334, &mut cycles), 0x4243);
    }

    // ========================================
    // Cycle accounting
    // ========================================

    #[test]
    fn test_u16_costs_twice_u8() {
        let mut bus = lowrom_bus();

        let mut single = 0;
        bus.read_u8(0x001234, &mut single);

        let mut double = 0;
        bus.read_u16(0x001234, &mut double);

        assert_eq!(double, single * 2);
    }

    #[test]
    fn test_rom_fast_slow_timing() {
        let mut bus = lowrom_bus();

        let mut slow = 0;
        bus.read_u8(0x008000, &mut slow);
        assert_eq!(slow, 8);

        let mut cycles = 0;
        bus.write_u8(0x00420D, 1, &mut cycles);

        let mut fast = 0;
        bus.read_u8(0x008000, &mut fast);
        assert_eq!(fast, 6);
    }

    #[test]
    fn test_joypad_slow_io_timing() {
        let mut bus = lowrom_bus();

        let mut cycles = 0;
        bus.read_u8(0x004016, &mut cycles);
        assert_eq!(cycles, 12);
    }

    // ========================================
    // Faults
    // ========================================

    #[test]
    fn test_unmapped_access_faults() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        // $00:5000 decodes to nothing in LowROM
        assert_eq!(bus.read_u8(0x005000, &mut cycles), 0);
        assert_eq!(bus.fault_count(), 1);
    }

    #[test]
    fn test_access_mask_violation_faults() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        // ROM is read-only
        bus.write_u8(0x008000, 0xFF, &mut cycles);
        assert_eq!(bus.fault_count(), 1);
        assert_eq!(bus.read_u8(0x008000, &mut cycles), 0, "ROM unchanged");
    }

    #[test]
    fn test_memsel_roundtrip() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        assert_eq!(bus.read_u8(0x00420D, &mut cycles), 0);
        bus.write_u8(0x00420D, 0x01, &mut cycles);
        assert_eq!(bus.read_u8(0x00420D, &mut cycles), 1);
    }

    // ========================================
    // Indirect WRAM window
    // ========================================

    #[test]
    fn test_indirect_wram_window() {
        let mut bus = lowrom_bus();
        let mut cycles = 0;

        bus.write_u8(0x002181, 0x34, &mut cycles);
        bus.write_u8(0x002182, 0x12, &mut cycles);
        bus.write_u8(0x002183, 0x00, &mut cycles);

        bus.write_u8(0x002180, 0x77, &mut cycles);
        assert_eq!(bus.wram.read(0x1234), 0x77);

        // Reading back through the window continues at the next address
        bus.write_u8(0x002181, 0x34, &mut cycles);
        bus.write_u8(0x002182, 0x12, &mut cycles);
        bus.write_u8(0x002183, 0x00, &mut cycles);
        assert_eq!(bus.read_u8(0x002180, &mut cycles), 0x77);
    }
}
