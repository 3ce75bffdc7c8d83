// Timing constants, in master-clock cycles
//
// The master clock runs at ~21.477 MHz. Every access cost in the memory
// maps, the DMA engine and the PPU dot clock is expressed in this unit.

/// Internal CPU operation (no bus access)
pub const CPU_ONE_CYCLE: u32 = 6;

/// ROM access, slow timing
pub const ROM_SLOW_ACCESS: u32 = 8;
/// ROM access, fast timing (MEMSEL)
pub const ROM_FAST_ACCESS: u32 = 6;

/// WRAM / SRAM access
pub const RAM_ACCESS: u32 = 8;

/// I/O ports
pub const IO_FAST_ACCESS: u32 = 6;
pub const IO_SLOW_ACCESS: u32 = 12;

/// DMA channel setup / per-byte transfer
pub const DMA_START: u32 = 8;
pub const DMA_ACCESS: u32 = 8;

/// One PPU dot
pub const PPU_DOT: u32 = 4;
