// Emulator module - Console facade and scheduler
//
// `Console` owns every component, wires them together when a cartridge is
// plugged, and runs the cooperative schedule: PPU, DMA and APU carry a
// next-run cycle against the shared master clock; the outer loop runs
// whichever is due first (tie-break PPU > DMA > APU) and lets the CPU
// execute one instruction whenever no task is due. A general-purpose DMA
// pauses CPU dispatch until its transfer drains.
//
// PPU events collected after each slice drive the NMI latch, the H/V
// IRQ line, joypad auto-read and HDMA table servicing.

mod config;
mod recent_roms;
pub mod save_state;

pub use config::{EmulatorConfig, LogConfig, SaveStateConfig, SpeedMode, SramConfig, VideoConfig};
pub use recent_roms::{RecentRomEntry, RecentRomsList};
pub use save_state::{SaveStateError, StateReader};

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::bus::Membus;
use crate::cartridge::{Cartridge, CartridgeError, RomHeader};
use crate::cpu::Cpu;
use crate::debug;
use crate::input::{Controller, ControllerMailbox};
use crate::ppu;
use crate::ppu::constants::VBLANK_START_LINE;
use crate::ram::Sram;
use crate::renderer::{Renderer, RendererList, SnesConfig};
use crate::scheduler::IDLE;

const TAG: &str = "console";

/// Joypad auto-read keeps HVBJOY busy through these v-blank lines.
const JOYPAD_AUTOREAD_END_LINE: u16 = 228;

/// The emulated console: components, wiring and the scheduler loop.
pub struct Console {
    pub(crate) cpu: Cpu,
    pub(crate) bus: Membus,
    pub(crate) master_clock: u64,

    renderers: RendererList,

    /// Header of the plugged cartridge
    header: Option<RomHeader>,
    rom_path: Option<PathBuf>,

    config: EmulatorConfig,
    speed_mode: SpeedMode,

    /// Set when the PPU finishes a visible frame
    frame_ready: bool,
}

impl Console {
    /// Create a console with no cartridge plugged.
    pub fn new() -> Self {
        let config = EmulatorConfig::load_or_default();
        debug::set_log_level(config.log.level());

        Console {
            cpu: Cpu::new(),
            bus: Membus::new(crate::cartridge::AddressingType::LowRom, false),
            master_clock: 0,
            renderers: Rc::new(RefCell::new(Vec::new())),
            header: None,
            rom_path: None,
            config,
            speed_mode: SpeedMode::Normal,
            frame_ready: false,
        }
    }

    /// Fixed output characteristics.
    pub fn config(&self) -> SnesConfig {
        SnesConfig::default()
    }

    pub fn emulator_config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn set_speed_mode(&mut self, mode: SpeedMode) {
        self.speed_mode = mode;
    }

    pub fn speed_mode(&self) -> SpeedMode {
        self.speed_mode
    }

    // ========================================
    // Renderers and input
    // ========================================

    /// Attach a renderer; all attached renderers receive every frame.
    pub fn add_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderers.borrow_mut().push(renderer);
    }

    /// Detach every renderer.
    pub fn clear_renderers(&mut self) {
        self.renderers.borrow_mut().clear();
    }

    /// Shared handle for frontends that publish controller state from
    /// another thread.
    pub fn controller1_mailbox(&self) -> ControllerMailbox {
        self.bus.joypads.mailbox()
    }

    /// Publish the current controller snapshot.
    pub fn set_controller1(&mut self, controller: Controller) {
        self.bus.joypads.set_controller1(controller);
    }

    // ========================================
    // Cartridge handling
    // ========================================

    /// Plug a cartridge image; components are rebuilt around its memory
    /// mapping and the CPU restarts from the reset vector.
    pub fn plug_cartridge(&mut self, cartridge: Cartridge) {
        let header = cartridge.header;

        let mut bus = Membus::new(header.addressing_type, header.fast_rom);
        bus.rom = cartridge.rom;
        if header.sram_size > 0 {
            bus.sram = Some(Sram::new(header.sram_size));
        }

        bus.ppu.set_renderers(Rc::clone(&self.renderers));
        bus.apu.set_renderers(Rc::clone(&self.renderers));

        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        // The PPU drives the schedule from cycle zero
        bus.ppu.task.set_next_run_cycle(0);

        self.cpu = cpu;
        self.bus = bus;
        self.master_clock = 0;
        self.frame_ready = false;
        self.header = Some(header);
    }

    /// Load a cartridge from disk and track it in the recent-ROM list.
    pub fn plug_cartridge_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CartridgeError> {
        let path = path.as_ref();
        let cartridge = Cartridge::from_file(path)?;

        self.plug_cartridge(cartridge);
        self.rom_path = Some(path.to_path_buf());

        let mut recent = RecentRomsList::load_or_default();
        recent.add(path);
        let _ = recent.save();

        if self.config.sram.auto_save {
            let _ = self.load_sram(self.sram_path());
        }

        Ok(())
    }

    /// Unplug the current cartridge, persisting SRAM when configured.
    pub fn unplug_cartridge(&mut self) {
        if self.config.sram.auto_save && self.header.is_some() {
            let _ = self.save_sram(self.sram_path());
        }

        self.header = None;
        self.rom_path = None;
        self.bus = Membus::new(crate::cartridge::AddressingType::LowRom, false);
        self.cpu = Cpu::new();
        self.master_clock = 0;
    }

    pub fn header(&self) -> Option<&RomHeader> {
        self.header.as_ref()
    }

    /// Base name of the loaded ROM, if any.
    pub fn rom_basename(&self) -> Option<String> {
        self.rom_path
            .as_ref()
            .and_then(|path| path.file_stem())
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
    }

    fn sram_path(&self) -> PathBuf {
        let name = self.rom_basename().unwrap_or_else(|| "cartridge".into());
        self.config.sram.directory.join(format!("{}.srm", name))
    }

    /// Write the cartridge SRAM to disk.
    pub fn save_sram<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let Some(sram) = &self.bus.sram else {
            return Ok(());
        };

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug::info(TAG, format!("Saving SRAM to {}", path.as_ref().display()));
        std::fs::write(path, sram.contents())
    }

    /// Load the cartridge SRAM from disk.
    pub fn load_sram<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<()> {
        let contents = std::fs::read(path.as_ref())?;
        if let Some(sram) = &mut self.bus.sram {
            debug::info(TAG, format!("Loading SRAM from {}", path.as_ref().display()));
            sram.load_contents(&contents);
        }
        Ok(())
    }

    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    /// Read one byte through the bus without charging cycles.
    ///
    /// Meant for tests and debugging frontends; register reads keep
    /// their side effects.
    pub fn peek_u8(&mut self, addr: u32) -> u8 {
        let mut cycles = 0;
        self.bus.read_u8(addr, &mut cycles)
    }

    /// Observable bus fault counter (invalid-map accesses).
    pub fn bus_fault_count(&self) -> u64 {
        self.bus.fault_count()
    }

    // ========================================
    // Scheduler
    // ========================================

    /// Run one scheduler slice: the due task with the highest priority,
    /// or one CPU instruction when nothing is due.
    pub fn step(&mut self) {
        self.bus.clock = self.master_clock;

        // Register writes re-arm tasks between instructions
        if self.bus.dma.take_resume_request() {
            self.bus.dma.task.set_next_run_cycle(self.master_clock + 1);
        }

        // Smallest next-run cycle wins; ties resolve PPU > DMA > APU
        #[derive(Clone, Copy, PartialEq)]
        enum Task {
            Ppu,
            Dma,
            Apu,
        }

        let mut due: Option<(Task, u64)> = None;
        for (task, state) in [
            (Task::Ppu, &self.bus.ppu.task),
            (Task::Dma, &self.bus.dma.task),
            (Task::Apu, &self.bus.apu.task),
        ] {
            if state.is_running() && due.map_or(true, |(_, cycle)| state.next_run_cycle() < cycle)
            {
                due = Some((task, state.next_run_cycle()));
            }
        }

        match due {
            Some((task, cycle)) if cycle <= self.master_clock => {
                let consumed = match task {
                    Task::Ppu => self.bus.ppu.run(),
                    Task::Dma => self.bus.dma_run(),
                    Task::Apu => self.bus.apu.run(self.master_clock),
                };

                if consumed == IDLE {
                    match task {
                        Task::Ppu => self.bus.ppu.task.set_idle(),
                        Task::Dma => self.bus.dma.task.set_idle(),
                        Task::Apu => self.bus.apu.task.set_idle(),
                    }
                } else {
                    let next = cycle + consumed as u64;
                    match task {
                        Task::Ppu => self.bus.ppu.task.set_next_run_cycle(next),
                        Task::Dma => self.bus.dma.task.set_next_run_cycle(next),
                        Task::Apu => self.bus.apu.task.set_next_run_cycle(next),
                    }
                }
            }

            // CPU dispatch is paused for the whole GP-DMA drain
            Some((_, cycle)) if self.bus.dma.gp_dma_active() => {
                self.master_clock = self.master_clock.max(cycle);
            }

            _ => {
                self.master_clock += self.cpu.step(&mut self.bus) as u64;
            }
        }

        self.dispatch_ppu_events();

        // The IRQ line follows the TIMEUP flag; a TIMEUP read acks it
        self.cpu.set_irq_line(self.bus.irq.irq_flag);
    }

    /// Route PPU events raised during the last slice.
    fn dispatch_ppu_events(&mut self) {
        let events = self.bus.ppu.take_events();
        if events == 0 {
            return;
        }

        if events & ppu::EVENT_SCAN_STARTED != 0 {
            // Leaving v-blank clears the RDNMI flag
            self.bus.irq.nmi_flag = false;
        }

        if events & ppu::EVENT_VBLANK_START != 0 {
            self.bus.irq.nmi_flag = true;
            if self.bus.irq.nmi_enabled() {
                self.cpu.set_nmi();
            }

            if self.bus.irq.joypad_autoread() {
                self.bus.joypads.read_controller();
                self.bus.irq.joypad_busy = true;
            }

            // HDMA tables re-arm for the next frame
            self.bus.hdma_reload();

            // Drain one frame of audio
            self.bus.apu.task.set_next_run_cycle(self.master_clock + 1);
        }

        if events & ppu::EVENT_HBLANK_END != 0 {
            let line = self.bus.ppu.v_pos();

            // HDMA services every visible line at its start
            if line < VBLANK_START_LINE {
                let cycles = self.bus.hdma_run_line();
                self.master_clock += cycles as u64;
            }

            if self.bus.irq.joypad_busy && line >= JOYPAD_AUTOREAD_END_LINE {
                self.bus.irq.joypad_busy = false;
            }
        }

        if events & ppu::EVENT_HV_IRQ != 0 {
            self.bus.irq.irq_flag = true;
        }

        if events & ppu::EVENT_SCAN_ENDED != 0 {
            self.frame_ready = true;
        }
    }

    /// Run the schedule until the PPU completes one visible frame.
    ///
    /// With `render_ppu` cleared the frame is emulated but renderer
    /// callbacks are suppressed (fast-forward).
    pub fn render_single_frame(&mut self, render_ppu: bool) {
        self.bus.ppu.set_draw(render_ppu);

        self.frame_ready = false;
        while !self.frame_ready {
            self.step();
        }

        self.bus.ppu.set_draw(true);
    }

    /// Run one frame honoring the current speed mode.
    pub fn run_frame(&mut self) {
        match self.speed_mode {
            SpeedMode::Paused => {}
            SpeedMode::Normal => self.render_single_frame(true),
            SpeedMode::FastForward => self.render_single_frame(false),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
