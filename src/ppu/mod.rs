// PPU module - Picture processing unit
//
// The PPU owns 64 KiB of VRAM, the 256-entry CGRAM palette and the
// 512+32-byte OAM, and renders one dot per scheduler slice (4 master
// cycles). Visible dots go straight to the attached renderers through
// `draw_pixel`; timing milestones (v-blank, h-blank, scan start/end, H/V
// IRQ match) are published as an event bitmask the console consumes after
// each slice.
//
// Register decoding lives in `registers.rs`, the VRAM/CGRAM/OAM port
// latches in `memory.rs`, and the per-dot compositor in `rendering.rs`.

pub mod constants;
mod memory;
mod registers;
mod rendering;

#[cfg(test)]
mod tests;

use crate::bus::HvIrqMode;
use crate::renderer::{Color, RendererList};
use crate::scheduler::TaskState;
use crate::timings;

use constants::*;

// Events published to the console
pub const EVENT_VBLANK_START: u32 = 1 << 0;
pub const EVENT_HBLANK_START: u32 = 1 << 1;
pub const EVENT_HBLANK_END: u32 = 1 << 2;
pub const EVENT_SCAN_STARTED: u32 = 1 << 3;
pub const EVENT_SCAN_ENDED: u32 = 1 << 4;
pub const EVENT_HV_IRQ: u32 = 1 << 5;

/// Per-background configuration ($2105-$2114).
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Background {
    /// Tilemap base, in 1 K-word units
    pub tilemap_base: u16,
    /// Tilemap size select (32x32 .. 64x64)
    pub tilemap_size: u8,
    /// Character base, in words
    pub tile_base: u16,
    /// 16x16 tiles when set
    pub tile_size16: bool,

    pub h_offset: u16,
    pub v_offset: u16,
}

/// Window membership selected per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum WindowArea {
    #[default]
    Disabled,
    Inside,
    Outside,
}

/// How the two windows combine ($212A/$212B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum WindowLogic {
    #[default]
    Or,
    And,
    Xor,
    Xnor,
}

/// One window: geometry plus its per-layer membership config.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct WindowConfig {
    pub left: u8,
    pub right: u8,

    pub background: [WindowArea; BACKGROUND_COUNT],
    pub obj: WindowArea,
    pub math: WindowArea,
}

/// Main/sub screen layer enables and window disables.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ScreenConfig {
    pub bg_enabled: [bool; BACKGROUND_COUNT],
    pub obj_enabled: bool,

    pub window_bg_disable: [bool; BACKGROUND_COUNT],
    pub window_obj_disable: bool,
}

/// Window-gated enables used by CGWSEL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum ColorMathGate {
    #[default]
    Never,
    NotMathWindow,
    MathWindow,
    Always,
}

/// A sprite decoded out of OAM.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ObjProperty {
    pub x: i16,
    pub y: u8,
    pub width: u16,
    pub height: u16,
    pub tile: u16,
    pub palette: u8,
    pub priority: u8,
    pub h_flip: bool,
    pub v_flip: bool,
}

/// The picture processing unit.
pub struct Ppu {
    renderers: Option<RendererList>,
    /// Cleared to run frames without issuing renderer callbacks
    draw: bool,
    events: u32,

    // Dot position
    h_pos: u16,
    v_pos: u16,

    // INIDISP
    forced_blanking: bool,
    brightness: u8,

    // VRAM port
    vram: Vec<u8>,
    vram_increment_high: bool,
    vram_address_translate: u8,
    vram_increment_step: u8,
    vram_address: u16,
    vram_prefetch: u16,

    // CGRAM port
    cgram: [u16; CGRAM_SIZE],
    cgram_address: u8,
    cgram_lsb_set: bool,
    cgram_lsb: u8,
    cgram_read_flip: bool,

    // OAM port
    oam: [u8; OAM_SIZE],
    oam_address: u16,
    oam_address_reload: u16,
    oam_forced_priority: bool,
    oam_write_latch: u8,

    // OBSEL
    obj_size_select: u8,
    /// Character base for sprites, in words
    obj_base: u16,
    /// Gap between the two sprite character tables, in words
    obj_gap: u16,

    // Backgrounds
    pub(super) backgrounds: [Background; BACKGROUND_COUNT],
    old_bg_byte: u8,
    bg_mode: u8,
    bg3_priority: bool,

    // Mosaic
    mosaic_size: u8,
    mosaic_enabled: [bool; BACKGROUND_COUNT],

    // Windows
    pub(super) window1: WindowConfig,
    pub(super) window2: WindowConfig,
    window_logic_bg: [WindowLogic; BACKGROUND_COUNT],
    window_logic_obj: WindowLogic,
    window_logic_math: WindowLogic,

    // Screens
    pub(super) main_screen: ScreenConfig,
    pub(super) sub_screen: ScreenConfig,

    // Color math
    force_main_screen_black: ColorMathGate,
    color_math_enable: ColorMathGate,
    subscreen_enabled: bool,
    color_math_subtract: bool,
    color_math_half: bool,
    color_math_bg: [bool; BACKGROUND_COUNT],
    color_math_obj: bool,
    color_math_backdrop: bool,
    /// COLDATA fixed color, RGB555
    subscreen_backdrop: u16,

    // Mode 7
    m7_screen_over: u8,
    m7_h_flip: bool,
    m7_v_flip: bool,
    m7_old: u8,
    m7_hofs: i16,
    m7_vofs: i16,
    m7_a: i16,
    m7_b: i16,
    m7_c: i16,
    m7_d: i16,
    m7_x: i16,
    m7_y: i16,
    mpy: i32,

    // H/V IRQ
    hv_irq_mode: HvIrqMode,
    hv_irq_h: u16,
    hv_irq_v: u16,

    // Position latches ($2137, $213C/$213D)
    hpos_latch: u16,
    vpos_latch: u16,
    hpos_read_flip: bool,
    vpos_read_flip: bool,

    // Sprites for the line being rendered
    objs: [ObjProperty; OBJ_COUNT],
    line_objs: [u8; OBJS_PER_LINE],
    line_obj_count: usize,

    /// Warned-about unsupported background mode, to log once
    unsupported_mode_warned: u8,

    pub task: TaskState,
}

impl Ppu {
    pub fn new() -> Self {
        Ppu {
            renderers: None,
            draw: true,
            events: 0,
            h_pos: 0,
            v_pos: 0,
            forced_blanking: false,
            brightness: 0,
            vram: vec![0; VRAM_SIZE],
            vram_increment_high: false,
            vram_address_translate: 0,
            vram_increment_step: 0,
            vram_address: 0,
            vram_prefetch: 0,
            cgram: [0; CGRAM_SIZE],
            cgram_address: 0,
            cgram_lsb_set: false,
            cgram_lsb: 0,
            cgram_read_flip: false,
            oam: [0; OAM_SIZE],
            oam_address: 0,
            oam_address_reload: 0,
            oam_forced_priority: false,
            oam_write_latch: 0,
            obj_size_select: 0,
            obj_base: 0,
            obj_gap: 0,
            backgrounds: [Background::default(); BACKGROUND_COUNT],
            old_bg_byte: 0,
            bg_mode: 0,
            bg3_priority: false,
            mosaic_size: 1,
            mosaic_enabled: [false; BACKGROUND_COUNT],
            window1: WindowConfig::default(),
            window2: WindowConfig::default(),
            window_logic_bg: [WindowLogic::default(); BACKGROUND_COUNT],
            window_logic_obj: WindowLogic::default(),
            window_logic_math: WindowLogic::default(),
            main_screen: ScreenConfig::default(),
            sub_screen: ScreenConfig::default(),
            force_main_screen_black: ColorMathGate::Never,
            color_math_enable: ColorMathGate::Never,
            subscreen_enabled: false,
            color_math_subtract: false,
            color_math_half: false,
            color_math_bg: [false; BACKGROUND_COUNT],
            color_math_obj: false,
            color_math_backdrop: false,
            subscreen_backdrop: 0,
            m7_screen_over: 0,
            m7_h_flip: false,
            m7_v_flip: false,
            m7_old: 0,
            m7_hofs: 0,
            m7_vofs: 0,
            m7_a: 0,
            m7_b: 0,
            m7_c: 0,
            m7_d: 0,
            m7_x: 0,
            m7_y: 0,
            mpy: 0,
            hv_irq_mode: HvIrqMode::Disabled,
            hv_irq_h: 0x1FF,
            hv_irq_v: 0x1FF,
            hpos_latch: 0,
            vpos_latch: 0,
            hpos_read_flip: false,
            vpos_read_flip: false,
            objs: [ObjProperty::default(); OBJ_COUNT],
            line_objs: [0; OBJS_PER_LINE],
            line_obj_count: 0,
            unsupported_mode_warned: 0xFF,
            task: TaskState::new(),
        }
    }

    pub fn set_renderers(&mut self, renderers: RendererList) {
        self.renderers = Some(renderers);
    }

    /// Enable or disable renderer callbacks (fast-forward support).
    pub fn set_draw(&mut self, draw: bool) {
        self.draw = draw;
    }

    /// Advance the PPU by one dot-unit.
    ///
    /// # Returns
    /// The master cycles consumed (one dot).
    pub fn run(&mut self) -> u32 {
        let x = self.h_pos;
        let y = self.v_pos;

        // Frame milestones, in screen order
        if x == 0 {
            self.events |= EVENT_HBLANK_END;

            if y == 0 {
                self.events |= EVENT_SCAN_STARTED;
                self.load_objs();
                if self.draw {
                    self.for_each_renderer(|r| r.scan_started());
                }
            }

            if y == VBLANK_START_LINE {
                self.events |= EVENT_VBLANK_START;
            }

            if y < DISPLAY_HEIGHT {
                self.scan_line_objs(y);
            }
        }

        if x == HBLANK_START_DOT {
            self.events |= EVENT_HBLANK_START;
        }

        // H/V IRQ match
        let hv_hit = match self.hv_irq_mode {
            HvIrqMode::Disabled => false,
            HvIrqMode::H => x == self.hv_irq_h,
            HvIrqMode::V => x == 0 && y == self.hv_irq_v,
            HvIrqMode::HV => x == self.hv_irq_h && y == self.hv_irq_v,
        };
        if hv_hit {
            self.events |= EVENT_HV_IRQ;
        }

        // Visible dot
        if x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT {
            if self.draw {
                let color = self.render_dot(x, y);
                self.for_each_renderer(|r| r.draw_pixel(color));
            }

            if x == DISPLAY_WIDTH - 1 && y == DISPLAY_HEIGHT - 1 {
                self.events |= EVENT_SCAN_ENDED;
                if self.draw {
                    self.for_each_renderer(|r| r.scan_ended());
                }
            }
        }

        // Advance the dot counter
        self.h_pos += 1;
        if self.h_pos == DOTS_PER_LINE {
            self.h_pos = 0;
            self.v_pos += 1;
            if self.v_pos == LINES_PER_FRAME {
                self.v_pos = 0;
            }
        }

        timings::PPU_DOT
    }

    fn for_each_renderer(&self, mut f: impl FnMut(&mut dyn crate::renderer::Renderer)) {
        if let Some(renderers) = &self.renderers {
            for renderer in renderers.borrow_mut().iter_mut() {
                f(renderer.as_mut());
            }
        }
    }

    /// Take and clear the pending event bitmask.
    pub fn take_events(&mut self) -> u32 {
        std::mem::take(&mut self.events)
    }

    pub fn set_hv_irq_config(&mut self, mode: HvIrqMode, h: u16, v: u16) {
        self.hv_irq_mode = mode;
        self.hv_irq_h = h;
        self.hv_irq_v = v;
    }

    pub fn h_pos(&self) -> u16 {
        self.h_pos
    }

    pub fn v_pos(&self) -> u16 {
        self.v_pos
    }

    pub fn in_vblank(&self) -> bool {
        self.v_pos >= VBLANK_START_LINE
    }

    pub fn in_hblank(&self) -> bool {
        self.h_pos >= HBLANK_START_DOT
    }

    pub fn forced_blanking(&self) -> bool {
        self.forced_blanking
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    pub fn cgram(&self) -> &[u16] {
        &self.cgram
    }

    pub(super) fn rgb555_to_color(&self, rgb: u16) -> Color {
        // 5-bit channels widened to 8, scaled by master brightness
        let expand = |c: u16| -> u8 { ((c << 3) | (c >> 2)) as u8 };

        let scale = self.brightness as u32 + 1;
        let apply = |c: u8| -> u8 { ((c as u32 * scale) / 16) as u8 };

        Color {
            r: apply(expand(rgb & 0x1F)),
            g: apply(expand((rgb >> 5) & 0x1F)),
            b: apply(expand((rgb >> 10) & 0x1F)),
        }
    }

    // ========================================
    // Savestate
    // ========================================

    pub fn dump_state(&self, out: &mut Vec<u8>) {
        out.push(self.forced_blanking as u8);
        out.push(self.brightness);

        out.push(self.vram_increment_high as u8);
        out.push(self.vram_address_translate);
        out.push(self.vram_increment_step);
        out.extend_from_slice(&self.vram_address.to_le_bytes());
        out.extend_from_slice(&self.vram_prefetch.to_le_bytes());
        out.extend_from_slice(&self.vram);

        for entry in &self.cgram {
            out.extend_from_slice(&entry.to_le_bytes());
        }
        out.push(self.cgram_address);
        out.push(self.cgram_lsb_set as u8);
        out.push(self.cgram_lsb);
        out.push(self.cgram_read_flip as u8);

        out.extend_from_slice(&self.oam);
        out.extend_from_slice(&self.oam_address.to_le_bytes());
        out.extend_from_slice(&self.oam_address_reload.to_le_bytes());
        out.push(self.oam_forced_priority as u8);
        out.push(self.oam_write_latch);
        out.push(self.obj_size_select);
        out.extend_from_slice(&self.obj_base.to_le_bytes());
        out.extend_from_slice(&self.obj_gap.to_le_bytes());

        for bg in &self.backgrounds {
            out.extend_from_slice(&bg.tilemap_base.to_le_bytes());
            out.push(bg.tilemap_size);
            out.extend_from_slice(&bg.tile_base.to_le_bytes());
            out.push(bg.tile_size16 as u8);
            out.extend_from_slice(&bg.h_offset.to_le_bytes());
            out.extend_from_slice(&bg.v_offset.to_le_bytes());
        }
        out.push(self.old_bg_byte);
        out.push(self.bg_mode);
        out.push(self.bg3_priority as u8);

        out.push(self.mosaic_size);
        for &enabled in &self.mosaic_enabled {
            out.push(enabled as u8);
        }

        for window in [&self.window1, &self.window2] {
            out.push(window.left);
            out.push(window.right);
            for area in window.background.iter().chain([&window.obj, &window.math]) {
                out.push(*area as u8);
            }
        }
        for logic in self
            .window_logic_bg
            .iter()
            .chain([&self.window_logic_obj, &self.window_logic_math])
        {
            out.push(*logic as u8);
        }

        for screen in [&self.main_screen, &self.sub_screen] {
            for &enabled in &screen.bg_enabled {
                out.push(enabled as u8);
            }
            out.push(screen.obj_enabled as u8);
            for &disabled in &screen.window_bg_disable {
                out.push(disabled as u8);
            }
            out.push(screen.window_obj_disable as u8);
        }

        out.push(self.force_main_screen_black as u8);
        out.push(self.color_math_enable as u8);
        out.push(self.subscreen_enabled as u8);
        out.push(self.color_math_subtract as u8);
        out.push(self.color_math_half as u8);
        for &enabled in &self.color_math_bg {
            out.push(enabled as u8);
        }
        out.push(self.color_math_obj as u8);
        out.push(self.color_math_backdrop as u8);
        out.extend_from_slice(&self.subscreen_backdrop.to_le_bytes());

        out.push(self.m7_screen_over);
        out.push(self.m7_h_flip as u8);
        out.push(self.m7_v_flip as u8);
        out.push(self.m7_old);
        for value in [
            self.m7_hofs, self.m7_vofs, self.m7_a, self.m7_b, self.m7_c, self.m7_d, self.m7_x,
            self.m7_y,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&self.mpy.to_le_bytes());

        out.push(hv_irq_mode_to_byte(self.hv_irq_mode));
        out.extend_from_slice(&self.hv_irq_h.to_le_bytes());
        out.extend_from_slice(&self.hv_irq_v.to_le_bytes());

        out.extend_from_slice(&self.h_pos.to_le_bytes());
        out.extend_from_slice(&self.v_pos.to_le_bytes());
    }

    /// Serialized size of `dump_state`; fixed for every PPU instance.
    pub fn state_len() -> usize {
        let mut probe = Vec::new();
        Ppu::new().dump_state(&mut probe);
        probe.len()
    }

    pub fn restore_state(&mut self, state: &mut crate::emulator::save_state::StateReader) {
        self.forced_blanking = state.read_u8() != 0;
        self.brightness = state.read_u8();

        self.vram_increment_high = state.read_u8() != 0;
        self.vram_address_translate = state.read_u8();
        self.vram_increment_step = state.read_u8();
        self.vram_address = state.read_u16();
        self.vram_prefetch = state.read_u16();
        state.read_exact(&mut self.vram);

        for entry in self.cgram.iter_mut() {
            *entry = state.read_u16();
        }
        self.cgram_address = state.read_u8();
        self.cgram_lsb_set = state.read_u8() != 0;
        self.cgram_lsb = state.read_u8();
        self.cgram_read_flip = state.read_u8() != 0;

        state.read_exact(&mut self.oam);
        self.oam_address = state.read_u16();
        self.oam_address_reload = state.read_u16();
        self.oam_forced_priority = state.read_u8() != 0;
        self.oam_write_latch = state.read_u8();
        self.obj_size_select = state.read_u8();
        self.obj_base = state.read_u16();
        self.obj_gap = state.read_u16();

        for bg in self.backgrounds.iter_mut() {
            bg.tilemap_base = state.read_u16();
            bg.tilemap_size = state.read_u8();
            bg.tile_base = state.read_u16();
            bg.tile_size16 = state.read_u8() != 0;
            bg.h_offset = state.read_u16();
            bg.v_offset = state.read_u16();
        }
        self.old_bg_byte = state.read_u8();
        self.bg_mode = state.read_u8();
        self.bg3_priority = state.read_u8() != 0;

        self.mosaic_size = state.read_u8();
        for enabled in self.mosaic_enabled.iter_mut() {
            *enabled = state.read_u8() != 0;
        }

        for window_idx in 0..2 {
            let mut window = WindowConfig {
                left: state.read_u8(),
                right: state.read_u8(),
                ..WindowConfig::default()
            };
            for i in 0..BACKGROUND_COUNT {
                window.background[i] = window_area_from_byte(state.read_u8());
            }
            window.obj = window_area_from_byte(state.read_u8());
            window.math = window_area_from_byte(state.read_u8());

            if window_idx == 0 {
                self.window1 = window;
            } else {
                self.window2 = window;
            }
        }
        for i in 0..BACKGROUND_COUNT {
            self.window_logic_bg[i] = window_logic_from_byte(state.read_u8());
        }
        self.window_logic_obj = window_logic_from_byte(state.read_u8());
        self.window_logic_math = window_logic_from_byte(state.read_u8());

        for screen_idx in 0..2 {
            let mut screen = ScreenConfig::default();
            for i in 0..BACKGROUND_COUNT {
                screen.bg_enabled[i] = state.read_u8() != 0;
            }
            screen.obj_enabled = state.read_u8() != 0;
            for i in 0..BACKGROUND_COUNT {
                screen.window_bg_disable[i] = state.read_u8() != 0;
            }
            screen.window_obj_disable = state.read_u8() != 0;

            if screen_idx == 0 {
                self.main_screen = screen;
            } else {
                self.sub_screen = screen;
            }
        }

        self.force_main_screen_black = color_math_gate_from_byte(state.read_u8());
        self.color_math_enable = color_math_gate_from_byte(state.read_u8());
        self.subscreen_enabled = state.read_u8() != 0;
        self.color_math_subtract = state.read_u8() != 0;
        self.color_math_half = state.read_u8() != 0;
        for enabled in self.color_math_bg.iter_mut() {
            *enabled = state.read_u8() != 0;
        }
        self.color_math_obj = state.read_u8() != 0;
        self.color_math_backdrop = state.read_u8() != 0;
        self.subscreen_backdrop = state.read_u16();

        self.m7_screen_over = state.read_u8();
        self.m7_h_flip = state.read_u8() != 0;
        self.m7_v_flip = state.read_u8() != 0;
        self.m7_old = state.read_u8();
        self.m7_hofs = state.read_i16();
        self.m7_vofs = state.read_i16();
        self.m7_a = state.read_i16();
        self.m7_b = state.read_i16();
        self.m7_c = state.read_i16();
        self.m7_d = state.read_i16();
        self.m7_x = state.read_i16();
        self.m7_y = state.read_i16();
        self.mpy = state.read_u32() as i32;

        self.hv_irq_mode = hv_irq_mode_from_byte(state.read_u8());
        self.hv_irq_h = state.read_u16();
        self.hv_irq_v = state.read_u16();

        self.h_pos = state.read_u16();
        self.v_pos = state.read_u16();

        self.load_objs();
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

fn window_area_from_byte(byte: u8) -> WindowArea {
    match byte {
        1 => WindowArea::Inside,
        2 => WindowArea::Outside,
        _ => WindowArea::Disabled,
    }
}

fn window_logic_from_byte(byte: u8) -> WindowLogic {
    match byte {
        1 => WindowLogic::And,
        2 => WindowLogic::Xor,
        3 => WindowLogic::Xnor,
        _ => WindowLogic::Or,
    }
}

fn color_math_gate_from_byte(byte: u8) -> ColorMathGate {
    match byte {
        1 => ColorMathGate::NotMathWindow,
        2 => ColorMathGate::MathWindow,
        3 => ColorMathGate::Always,
        _ => ColorMathGate::Never,
    }
}

fn hv_irq_mode_to_byte(mode: HvIrqMode) -> u8 {
    match mode {
        HvIrqMode::Disabled => 0,
        HvIrqMode::H => 1,
        HvIrqMode::V => 2,
        HvIrqMode::HV => 3,
    }
}

fn hv_irq_mode_from_byte(byte: u8) -> HvIrqMode {
    match byte {
        1 => HvIrqMode::H,
        2 => HvIrqMode::V,
        3 => HvIrqMode::HV,
        _ => HvIrqMode::Disabled,
    }
}
