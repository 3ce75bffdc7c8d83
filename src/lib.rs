// SNES Emulator Library
// Core library for the Super Famicom emulation engine

// Public modules
pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod debug;
pub mod dma;
pub mod emulator;
pub mod input;
pub mod math;
pub mod ppu;
pub mod ram;
pub mod registers;
pub mod renderer;
pub mod scheduler;
pub mod timings;

// Re-export main types for convenience
pub use apu::{Apu, NullSpc, Spc700Core};
pub use bus::{HvIrqMode, InterruptControl, Membus, Target};
pub use cartridge::{AddressingType, Cartridge, CartridgeError, RomHeader};
pub use cpu::Cpu;
pub use debug::{ExecutionLog, LogLevel};
pub use dma::Dma;
pub use emulator::{
    Console, EmulatorConfig, RecentRomsList, SaveStateError, SpeedMode, StateReader,
};
pub use input::{Controller, ControllerMailbox, ControllerPorts};
pub use math::Math;
pub use ppu::Ppu;
pub use ram::{Sram, Wram};
pub use renderer::{Color, Renderer, RendererList, SnesConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_components() {
        // Test that all components can be instantiated
        let _cpu = Cpu::new();
        let _ppu = Ppu::new();
        let _apu = Apu::new();
        let _dma = Dma::new();
        let _math = Math::new();
        let _wram = Wram::new();
        let _ports = ControllerPorts::new();
        let _bus = Membus::new(AddressingType::LowRom, false);
        let _console = Console::new();
    }
}
