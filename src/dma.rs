// DMA module - General-purpose DMA and HDMA engines
//
// Eight channels share a 16-byte register file each at $43x0-$43xF:
//
// ```text
// $43x0  DMAP  mode (bits 0-2), A-bus step (bits 3-4), indirect (bit 6),
//              direction (bit 7)
// $43x1  BBAD  B-bus address (byte offset into $21xx)
// $43x2-4 A1T  A-bus address (24-bit)
// $43x5-6 DAS  transfer byte count
// $43x7  DASB  HDMA indirect bank
// $43x8-9 A2A  HDMA current table address (scratch)
// $43xA  NLTR  HDMA line counter (scratch)
// ```
//
// Writing a bitmask to $420B (MDMAEN) starts general-purpose transfers;
// the scheduler then drains one unit per slice while the CPU is paused.
// Writing $420C (HDMAEN) arms per-scanline table walking, serviced by the
// console at the start of each visible line.

use crate::bus::Membus;
use crate::debug;
use crate::registers;
use crate::scheduler::{TaskState, IDLE};
use crate::timings;

const TAG: &str = "dma";

const CHANNEL_COUNT: usize = 8;

/// Channel register offsets within $43x0-$43xF.
mod reg {
    pub const DMAP: usize = 0x0;
    pub const BBAD: usize = 0x1;
    pub const A1TL: usize = 0x2;
    pub const A1TH: usize = 0x3;
    pub const A1B: usize = 0x4;
    pub const DASL: usize = 0x5;
    pub const DASH: usize = 0x6;
    pub const DASB: usize = 0x7;
}

/// Transfer direction (DMAP bit 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    AToB,
    BToA,
}

/// A-bus address stepping (DMAP bits 3-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ABusStep {
    Increment,
    Decrement,
    Fixed,
}

/// Decoded per-channel runtime state.
#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    direction_b_to_a: bool,
    indirect: bool,
    a_step: u8,
    mode: u8,

    b_address: u8,
    a_address: u32,
    byte_counter: u16,

    // HDMA scratch
    hdma_bank: u8,
    hdma_current: u16,
    hdma_line_counter: u8,
    hdma_repeat: bool,
    hdma_indirect_address: u16,
    hdma_active: bool,
}

impl Channel {
    fn direction(&self) -> Direction {
        if self.direction_b_to_a {
            Direction::BToA
        } else {
            Direction::AToB
        }
    }

    fn a_bus_step(&self) -> ABusStep {
        match self.a_step {
            0 => ABusStep::Increment,
            2 => ABusStep::Decrement,
            _ => ABusStep::Fixed,
        }
    }
}

/// B-bus offset pattern of each transfer mode, one entry per byte moved.
fn mode_pattern(mode: u8) -> &'static [u8] {
    match mode & 0b111 {
        0 => &[0],
        1 => &[0, 1],
        2 | 6 => &[0, 0],
        3 | 7 => &[0, 0, 1, 1],
        4 => &[0, 1, 2, 3],
        _ => &[0, 1], // mode 5 alternates like mode 1
    }
}

/// DMA/HDMA register file and transfer state.
pub struct Dma {
    channel_registers: [u8; 0x80],
    channels: [Channel; CHANNEL_COUNT],

    /// MDMAEN: channels with a general-purpose transfer pending
    active_channels: u8,
    /// HDMAEN: channels armed for per-line servicing
    hdma_channels: u8,

    /// Channel currently being drained by the scheduler
    running: Option<usize>,

    /// Set by an MDMAEN write; the console re-arms the task and clears it
    resume_requested: bool,

    pub task: TaskState,
}

impl Dma {
    pub fn new() -> Self {
        Dma {
            channel_registers: [0; 0x80],
            channels: [Channel::default(); CHANNEL_COUNT],
            active_channels: 0,
            hdma_channels: 0,
            running: None,
            resume_requested: false,
            task: TaskState::new(),
        }
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            registers::MDMAEN => self.active_channels,
            registers::HDMAEN => self.hdma_channels,
            registers::DMA_START..=registers::DMA_END => {
                self.channel_registers[(addr - registers::DMA_START) as usize]
            }
            _ => {
                debug::warn(TAG, format!("Unsupported read at {:04X}", addr));
                0
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            registers::MDMAEN => {
                debug::debug(TAG, format!("Start DMA: {:02X}", value));
                self.active_channels = value;
                if value != 0 {
                    self.resume_requested = true;
                }
            }
            registers::HDMAEN => {
                debug::debug(TAG, format!("Arm HDMA: {:02X}", value));
                self.hdma_channels = value;
            }
            registers::DMA_START..=registers::DMA_END => {
                self.channel_registers[(addr - registers::DMA_START) as usize] = value;
            }
            _ => {
                debug::warn(TAG, format!("Unsupported write at {:04X}", addr));
            }
        }
    }

    /// True while a general-purpose transfer is draining; the CPU is
    /// paused for its whole duration.
    pub fn gp_dma_active(&self) -> bool {
        self.active_channels != 0
    }

    /// Take the pending resume request raised by an MDMAEN write.
    pub fn take_resume_request(&mut self) -> bool {
        std::mem::take(&mut self.resume_requested)
    }

    fn channel_config(&self, id: usize) -> &[u8] {
        &self.channel_registers[id * 16..id * 16 + 16]
    }

    /// Decode the register file into the runtime state of one channel.
    fn decode_channel(&self, id: usize) -> Channel {
        let cfg = self.channel_config(id);
        let dmap = cfg[reg::DMAP];

        Channel {
            direction_b_to_a: dmap & (1 << 7) != 0,
            indirect: dmap & (1 << 6) != 0,
            a_step: (dmap >> 3) & 0b11,
            mode: dmap & 0b111,

            b_address: cfg[reg::BBAD],
            a_address: cfg[reg::A1TL] as u32
                | (cfg[reg::A1TH] as u32) << 8
                | (cfg[reg::A1B] as u32) << 16,
            byte_counter: cfg[reg::DASL] as u16 | (cfg[reg::DASH] as u16) << 8,

            hdma_bank: cfg[reg::A1B],
            hdma_current: cfg[reg::A1TL] as u16 | (cfg[reg::A1TH] as u16) << 8,
            hdma_line_counter: 0,
            hdma_repeat: false,
            hdma_indirect_address: 0,
            hdma_active: false,
        }
    }

    pub fn dump_state(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.channel_registers);
        out.push(self.active_channels);
        out.push(self.hdma_channels);
        out.push(self.running.map(|id| id as u8).unwrap_or(0xFF));

        for channel in &self.channels {
            out.extend_from_slice(&channel.a_address.to_le_bytes());
            out.extend_from_slice(&channel.byte_counter.to_le_bytes());
            out.extend_from_slice(&channel.hdma_current.to_le_bytes());
            out.push(channel.hdma_line_counter);
            out.push(channel.hdma_repeat as u8);
            out.extend_from_slice(&channel.hdma_indirect_address.to_le_bytes());
            out.push(channel.hdma_active as u8);
        }
    }

    /// Serialized size of `dump_state`, in bytes.
    pub const STATE_LEN: usize = 0x80 + 3 + CHANNEL_COUNT * 13;

    pub fn restore_state(&mut self, state: &mut crate::emulator::save_state::StateReader) {
        state.read_exact(&mut self.channel_registers);
        self.active_channels = state.read_u8();
        self.hdma_channels = state.read_u8();
        let running = state.read_u8();
        self.running = if running == 0xFF {
            None
        } else {
            Some(running as usize % CHANNEL_COUNT)
        };

        for id in 0..CHANNEL_COUNT {
            // Re-derive the decoded configuration, then overlay scratch
            let mut channel = self.decode_channel(id);
            channel.a_address = state.read_u32();
            channel.byte_counter = state.read_u16();
            channel.hdma_current = state.read_u16();
            channel.hdma_line_counter = state.read_u8();
            channel.hdma_repeat = state.read_u8() != 0;
            channel.hdma_indirect_address = state.read_u16();
            channel.hdma_active = state.read_u8() != 0;
            self.channels[id] = channel;
        }
    }
}

impl Default for Dma {
    fn default() -> Self {
        Self::new()
    }
}

// The engines live on the bus so transfers can reach every component the
// CPU can.
impl Membus {
    /// Scheduler entry for general-purpose DMA: move one unit of the
    /// running channel, or start the next active one.
    ///
    /// Returns the cycles consumed, or the idle sentinel once every
    /// channel has drained.
    pub fn dma_run(&mut self) -> u32 {
        if self.dma.active_channels == 0 {
            return IDLE;
        }

        if let Some(id) = self.dma.running {
            if self.dma.channels[id].byte_counter > 0 {
                return self.dma_transfer_unit(id);
            }

            self.dma.active_channels &= !(1 << id);
            self.dma.running = None;
        }

        // Look for the next channel to run
        for id in 0..CHANNEL_COUNT {
            if self.dma.active_channels & (1 << id) != 0 {
                debug::debug(TAG, format!("Start DMA channel {}", id));

                let channel = self.dma.decode_channel(id);
                self.dma.channels[id] = channel;
                self.dma.running = Some(id);

                if channel.byte_counter == 0 {
                    // A zero count still clears the enable bit
                    self.dma.active_channels &= !(1 << id);
                    self.dma.running = None;
                    continue;
                }

                return timings::DMA_START;
            }
        }

        IDLE
    }

    /// Move one unit (1-4 bytes, per transfer mode) of channel `id`.
    fn dma_transfer_unit(&mut self, id: usize) -> u32 {
        let mut channel = self.dma.channels[id];
        let pattern = mode_pattern(channel.mode);
        let mut cycles = 0;

        for &b_offset in pattern {
            let b_address = 0x2100 | (channel.b_address.wrapping_add(b_offset)) as u32;
            let mut io_cycles = 0;

            match channel.direction() {
                Direction::AToB => {
                    let value = self.read_u8(channel.a_address, &mut io_cycles);
                    self.write_u8(b_address, value, &mut io_cycles);
                }
                Direction::BToA => {
                    let value = self.read_u8(b_address, &mut io_cycles);
                    self.write_u8(channel.a_address, value, &mut io_cycles);
                }
            }

            step_a_bus(&mut channel);
            cycles += timings::DMA_ACCESS;

            channel.byte_counter -= 1;
            if channel.byte_counter == 0 {
                break;
            }
        }

        self.dma.channels[id] = channel;
        cycles
    }

    /// Reload the HDMA table walkers; the console calls this once per
    /// frame, at vertical blank.
    pub fn hdma_reload(&mut self) {
        for id in 0..CHANNEL_COUNT {
            if self.dma.hdma_channels & (1 << id) != 0 {
                let mut channel = self.dma.decode_channel(id);
                channel.hdma_active = true;
                self.dma.channels[id] = channel;
            }
        }
    }

    /// Service every armed channel for the scanline that is starting.
    ///
    /// Per line and channel: on an expired line counter a one-byte header
    /// `{repeat flag, count}` is fetched from the table (a zero header
    /// disarms the channel for the rest of the frame), followed by a
    /// 16-bit indirect address when DMAP bit 6 is set, and one unit is
    /// transferred. Continuation lines transfer a fresh unit only when
    /// the repeat flag is set; the counter decrements either way.
    pub fn hdma_run_line(&mut self) -> u32 {
        let mut cycles = 0;

        for id in 0..CHANNEL_COUNT {
            if self.dma.hdma_channels & (1 << id) == 0 || !self.dma.channels[id].hdma_active {
                continue;
            }

            let mut channel = self.dma.channels[id];
            let do_transfer;

            if channel.hdma_line_counter == 0 {
                let table = ((channel.hdma_bank as u32) << 16) | channel.hdma_current as u32;
                let header = self.read_u8(table, &mut cycles);
                channel.hdma_current = channel.hdma_current.wrapping_add(1);

                if header == 0 {
                    // Table exhausted until the next frame
                    channel.hdma_active = false;
                    self.dma.channels[id] = channel;
                    continue;
                }

                channel.hdma_repeat = header & 0x80 != 0;
                channel.hdma_line_counter = header & 0x7F;

                if channel.indirect {
                    let table =
                        ((channel.hdma_bank as u32) << 16) | channel.hdma_current as u32;
                    channel.hdma_indirect_address = self.read_u16(table, &mut cycles);
                    channel.hdma_current = channel.hdma_current.wrapping_add(2);
                }

                do_transfer = true;
            } else {
                do_transfer = channel.hdma_repeat;
            }

            if do_transfer {
                cycles += self.hdma_transfer_unit(id, &mut channel);
            }

            channel.hdma_line_counter = channel.hdma_line_counter.saturating_sub(1);
            self.dma.channels[id] = channel;
        }

        cycles
    }

    /// Transfer one unit from the table (direct) or through the indirect
    /// pointer to the channel's B-bus target.
    fn hdma_transfer_unit(&mut self, id: usize, channel: &mut Channel) -> u32 {
        let pattern = mode_pattern(channel.mode);
        let mut cycles = 0;

        if channel.direction() == Direction::BToA {
            debug::warn(TAG, "HDMA B->A direction is not supported");
            return cycles;
        }

        for &b_offset in pattern {
            let source = if channel.indirect {
                let bank = self.dma.channel_registers[id * 16 + reg::DASB];
                let address = ((bank as u32) << 16) | channel.hdma_indirect_address as u32;
                channel.hdma_indirect_address = channel.hdma_indirect_address.wrapping_add(1);
                address
            } else {
                let address = ((channel.hdma_bank as u32) << 16) | channel.hdma_current as u32;
                channel.hdma_current = channel.hdma_current.wrapping_add(1);
                address
            };

            let mut io_cycles = 0;
            let value = self.read_u8(source, &mut io_cycles);
            let b_address = 0x2100 | (channel.b_address.wrapping_add(b_offset)) as u32;
            self.write_u8(b_address, value, &mut io_cycles);

            cycles += timings::DMA_ACCESS;
        }

        cycles
    }
}

fn step_a_bus(channel: &mut Channel) {
    match channel.a_bus_step() {
        ABusStep::Increment => channel.a_address = channel.a_address.wrapping_add(1) & 0xFFFFFF,
        ABusStep::Decrement => channel.a_address = channel.a_address.wrapping_sub(1) & 0xFFFFFF,
        ABusStep::Fixed => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::AddressingType;
    use crate::scheduler::IDLE;

    fn test_bus() -> Membus {
        let mut bus = Membus::new(AddressingType::LowRom, false);
        bus.rom = vec![0; 512 * 1024];
        bus
    }

    /// Configure channel 0 for a WRAM -> PPU VRAM-port transfer.
    fn setup_vram_dma(bus: &mut Membus, mode: u8, count: u16, source: u32) {
        let mut cycles = 0;
        bus.write_u8(0x004300, mode, &mut cycles); // DMAP: A->B, increment
        bus.write_u8(0x004301, 0x18, &mut cycles); // BBAD: $2118 (VMDATAL)
        bus.write_u8(0x004302, (source & 0xFF) as u8, &mut cycles);
        bus.write_u8(0x004303, ((source >> 8) & 0xFF) as u8, &mut cycles);
        bus.write_u8(0x004304, ((source >> 16) & 0xFF) as u8, &mut cycles);
        bus.write_u8(0x004305, (count & 0xFF) as u8, &mut cycles);
        bus.write_u8(0x004306, (count >> 8) as u8, &mut cycles);
    }

    fn drain_dma(bus: &mut Membus) -> (u32, u64) {
        let mut slices = 0;
        let mut cycles = 0u64;
        loop {
            let consumed = bus.dma_run();
            if consumed == IDLE {
                break;
            }
            cycles += consumed as u64;
            slices += 1;
            assert!(slices < 500_000, "DMA failed to terminate");
        }
        (slices, cycles)
    }

    #[test]
    fn test_gp_dma_mode1_writes_vram() {
        let mut bus = test_bus();
        let mut cycles = 0;

        // VRAM word address 0, increment on high write
        bus.write_u8(0x002115, 0x80, &mut cycles); // VMAIN
        bus.write_u8(0x002116, 0x00, &mut cycles);
        bus.write_u8(0x002117, 0x00, &mut cycles);

        for i in 0..6 {
            bus.wram.write(0x1000 + i, 0x10 + i as u8);
        }

        setup_vram_dma(&mut bus, 0x01, 6, 0x7E1000);
        let mut io = 0;
        bus.write_u8(0x00420B, 0x01, &mut io); // MDMAEN channel 0

        assert!(bus.dma.gp_dma_active());
        drain_dma(&mut bus);
        assert!(!bus.dma.gp_dma_active());

        // Three VRAM words written through $2118/$2119
        assert_eq!(bus.ppu.vram()[0], 0x10);
        assert_eq!(bus.ppu.vram()[1], 0x11);
        assert_eq!(bus.ppu.vram()[2], 0x12);
        assert_eq!(bus.ppu.vram()[3], 0x13);
        assert_eq!(bus.ppu.vram()[4], 0x14);
        assert_eq!(bus.ppu.vram()[5], 0x15);
    }

    #[test]
    fn test_gp_dma_unit_count() {
        // count = K with a u-byte mode makes ceil(K/u) unit slices
        for &(mode, count, unit) in &[(0u8, 5u16, 1u16), (1, 5, 2), (4, 6, 4), (2, 4, 2)] {
            let mut bus = test_bus();
            let mut cycles = 0;
            bus.write_u8(0x002115, 0x80, &mut cycles);

            setup_vram_dma(&mut bus, mode, count, 0x7E0000);
            let mut io = 0;
            bus.write_u8(0x00420B, 0x01, &mut io);

            let (slices, _) = drain_dma(&mut bus);
            let expected_units = count.div_ceil(unit) as u32;
            // One extra slice for channel startup
            assert_eq!(
                slices,
                expected_units + 1,
                "mode {} count {} unit {}",
                mode,
                count,
                unit
            );
            assert_eq!(bus.dma.channels[0].byte_counter, 0);
        }
    }

    #[test]
    fn test_gp_dma_fixed_source() {
        let mut bus = test_bus();
        let mut cycles = 0;
        bus.write_u8(0x002115, 0x80, &mut cycles);
        bus.wram.write(0x0000, 0x5A);

        // DMAP step bits = 0b01 -> fixed A-bus address
        setup_vram_dma(&mut bus, 0x08, 4, 0x7E0000);
        let mut io = 0;
        bus.write_u8(0x00420B, 0x01, &mut io);
        drain_dma(&mut bus);

        assert_eq!(bus.ppu.vram()[0], 0x5A);
        assert_eq!(bus.ppu.vram()[1], 0x5A);
        assert_eq!(bus.ppu.vram()[2], 0x5A);
        assert_eq!(bus.ppu.vram()[3], 0x5A);
    }

    #[test]
    fn test_hdma_header_walks_table() {
        let mut bus = test_bus();
        let mut cycles = 0;

        // Table in WRAM at $7E:1000: two lines writing INIDISP ($2100),
        // then terminator.
        bus.wram.write(0x1000, 0x01); // header: 1 line
        bus.wram.write(0x1001, 0x0F); // data
        bus.wram.write(0x1002, 0x01); // header: 1 line
        bus.wram.write(0x1003, 0x05); // data
        bus.wram.write(0x1004, 0x00); // terminator

        bus.write_u8(0x004300, 0x00, &mut cycles); // mode 0, direct
        bus.write_u8(0x004301, 0x00, &mut cycles); // BBAD $2100
        bus.write_u8(0x004302, 0x00, &mut cycles);
        bus.write_u8(0x004303, 0x10, &mut cycles);
        bus.write_u8(0x004304, 0x7E, &mut cycles);
        bus.write_u8(0x00420C, 0x01, &mut cycles); // HDMAEN

        bus.hdma_reload();

        bus.hdma_run_line();
        assert_eq!(bus.ppu.brightness(), 0x0F);

        bus.hdma_run_line();
        // Second line consumed its own header + data
        assert_eq!(bus.ppu.brightness(), 0x05);

        bus.hdma_run_line();
        assert!(!bus.dma.channels[0].hdma_active, "terminator disarms");
    }
}
