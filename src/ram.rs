// RAM module - Work RAM and save RAM buffers
//
// Three plain byte stores live behind the bus:
//
// - `Wram`: 128 KiB of work RAM. Mapped directly at banks $7E-$7F and
//   mirrored into the first 8 KiB of banks $00-$3F (and their upper-half
//   mirror banks).
// - The indirect WRAM window: a 17-bit address latch plus a data port at
//   $2180-$2183, letting code stream through WRAM without changing the
//   data bank.
// - `Sram`: battery-backed cartridge RAM, size from the ROM header,
//   mirrored by masking the address with `size - 1`.

/// Work RAM size in bytes (banks $7E-$7F).
pub const WRAM_SIZE: usize = 128 * 1024;

/// 128 KiB work RAM with the $2180-$2183 indirect access window.
#[derive(Clone)]
pub struct Wram {
    data: Vec<u8>,

    /// 17-bit address latch for the indirect window.
    indirect_address: u32,
}

impl Wram {
    pub fn new() -> Self {
        Wram {
            data: vec![0; WRAM_SIZE],
            indirect_address: 0,
        }
    }

    #[inline]
    pub fn read(&self, address: u32) -> u8 {
        self.data[address as usize % WRAM_SIZE]
    }

    #[inline]
    pub fn write(&mut self, address: u32, value: u8) {
        self.data[address as usize % WRAM_SIZE] = value;
    }

    /// Read through the indirect window (WMDATA), post-incrementing the
    /// address latch.
    pub fn read_indirect(&mut self) -> u8 {
        let value = self.read(self.indirect_address);
        self.indirect_address = (self.indirect_address + 1) & 0x1FFFF;
        value
    }

    /// Write through the indirect window (WMDATA), post-incrementing the
    /// address latch.
    pub fn write_indirect(&mut self, value: u8) {
        self.write(self.indirect_address, value);
        self.indirect_address = (self.indirect_address + 1) & 0x1FFFF;
    }

    /// Set one byte of the indirect address latch (0 = low, 1 = mid,
    /// 2 = high). The result is wrapped to 17 bits.
    pub fn set_indirect_address_byte(&mut self, byte: u32, value: u8) {
        let shift = byte * 8;
        self.indirect_address &= !(0xFF << shift);
        self.indirect_address |= (value as u32) << shift;
        self.indirect_address &= 0x1FFFF;
    }

    pub fn indirect_address(&self) -> u32 {
        self.indirect_address
    }

    pub fn dump_state(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.indirect_address.to_le_bytes());
        out.extend_from_slice(&self.data);
    }

    pub fn restore_state(&mut self, state: &mut crate::emulator::save_state::StateReader) {
        self.indirect_address = state.read_u32();
        state.read_exact(&mut self.data);
    }
}

impl Default for Wram {
    fn default() -> Self {
        Self::new()
    }
}

/// Battery-backed cartridge RAM.
///
/// Sizes are powers of two; accesses wrap by masking with `size - 1`.
#[derive(Clone)]
pub struct Sram {
    data: Vec<u8>,
    address_mask: u32,
}

impl Sram {
    pub fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Sram {
            data: vec![0; size],
            address_mask: (size - 1) as u32,
        }
    }

    #[inline]
    pub fn read(&self, address: u32) -> u8 {
        self.data[(address & self.address_mask) as usize]
    }

    #[inline]
    pub fn write(&mut self, address: u32, value: u8) {
        self.data[(address & self.address_mask) as usize] = value;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    pub fn load_contents(&mut self, contents: &[u8]) {
        let len = contents.len().min(self.data.len());
        self.data[..len].copy_from_slice(&contents[..len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wram_read_write() {
        let mut wram = Wram::new();
        wram.write(0x1234, 0x42);
        assert_eq!(wram.read(0x1234), 0x42);
    }

    #[test]
    fn test_wram_wraps_at_128k() {
        let mut wram = Wram::new();
        wram.write(0x1FFFF, 0x77);
        assert_eq!(wram.read(0x1FFFF), 0x77);
        assert_eq!(wram.read(0x3FFFF), 0x77, "reads past the end wrap");
    }

    #[test]
    fn test_indirect_window_post_increment() {
        let mut wram = Wram::new();

        wram.set_indirect_address_byte(0, 0x00);
        wram.set_indirect_address_byte(1, 0x10);
        wram.set_indirect_address_byte(2, 0x00);

        wram.write_indirect(0x11);
        wram.write_indirect(0x22);

        assert_eq!(wram.read(0x1000), 0x11);
        assert_eq!(wram.read(0x1001), 0x22);
        assert_eq!(wram.indirect_address(), 0x1002);
    }

    #[test]
    fn test_indirect_address_wraps_to_17_bits() {
        let mut wram = Wram::new();

        wram.set_indirect_address_byte(0, 0xFF);
        wram.set_indirect_address_byte(1, 0xFF);
        wram.set_indirect_address_byte(2, 0x01);
        assert_eq!(wram.indirect_address(), 0x1FFFF);

        wram.write_indirect(0x55);
        assert_eq!(wram.indirect_address(), 0);
    }

    #[test]
    fn test_sram_mirror_mask() {
        let mut sram = Sram::new(8 * 1024);

        sram.write(0x0000, 0x43);
        assert_eq!(sram.read(0x0000), 0x43);
        assert_eq!(sram.read(0x2000), 0x43, "8 KiB SRAM mirrors every 0x2000");

        sram.write(0x7E666, 0x99);
        assert_eq!(sram.read(0x7E666 & 0x1FFF), 0x99);
    }
}
