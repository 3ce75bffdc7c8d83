// PPU rendering - per-dot layer compositing
//
// For each visible dot the compositor walks the mode's layer-priority
// chart front to back, takes the first opaque pixel on the main screen
// and (when color math needs it) on the sub screen, applies the window
// and color-math gates, and converts the resulting RGB555 value to the
// output color under the master brightness.
//
// Background modes 0, 1 (both BG3-priority charts), 3 and 7 are
// implemented; other modes show the backdrop.

use crate::renderer::Color;

use super::constants::*;
use super::{ColorMathGate, Ppu, WindowArea, WindowLogic};

/// One slot in a layer-priority chart.
#[derive(Debug, Clone, Copy)]
enum LayerSlot {
    Bg { index: usize, priority: u8 },
    Obj { priority: u8 },
}

use LayerSlot::{Bg, Obj};

// Charts are listed front to back; the first opaque hit wins.
#[rustfmt::skip]
static PRIORITY_MODE0: &[LayerSlot] = &[
    Obj { priority: 3 },
    Bg { index: 0, priority: 1 }, Bg { index: 1, priority: 1 },
    Obj { priority: 2 },
    Bg { index: 0, priority: 0 }, Bg { index: 1, priority: 0 },
    Obj { priority: 1 },
    Bg { index: 2, priority: 1 }, Bg { index: 3, priority: 1 },
    Obj { priority: 0 },
    Bg { index: 2, priority: 0 }, Bg { index: 3, priority: 0 },
];

#[rustfmt::skip]
static PRIORITY_MODE1_BG3_ON: &[LayerSlot] = &[
    Bg { index: 2, priority: 1 },
    Obj { priority: 3 },
    Bg { index: 0, priority: 1 }, Bg { index: 1, priority: 1 },
    Obj { priority: 2 },
    Bg { index: 0, priority: 0 }, Bg { index: 1, priority: 0 },
    Obj { priority: 1 },
    Bg { index: 2, priority: 0 },
    Obj { priority: 0 },
];

#[rustfmt::skip]
static PRIORITY_MODE1_BG3_OFF: &[LayerSlot] = &[
    Obj { priority: 3 },
    Bg { index: 0, priority: 1 }, Bg { index: 1, priority: 1 },
    Obj { priority: 2 },
    Bg { index: 0, priority: 0 }, Bg { index: 1, priority: 0 },
    Obj { priority: 1 },
    Bg { index: 2, priority: 1 },
    Obj { priority: 0 },
    Bg { index: 2, priority: 0 },
];

#[rustfmt::skip]
static PRIORITY_MODE3: &[LayerSlot] = &[
    Obj { priority: 3 },
    Bg { index: 0, priority: 1 },
    Obj { priority: 2 },
    Bg { index: 0, priority: 0 },
    Obj { priority: 1 },
    Bg { index: 1, priority: 1 },
    Obj { priority: 0 },
    Bg { index: 1, priority: 0 },
];

#[rustfmt::skip]
static PRIORITY_MODE7: &[LayerSlot] = &[
    Obj { priority: 3 },
    Obj { priority: 2 },
    Obj { priority: 1 },
    Bg { index: 0, priority: 0 },
    Obj { priority: 0 },
];

/// What produced a main-screen pixel; feeds the color-math layer gates.
#[derive(Debug, Clone, Copy)]
enum PixelSource {
    Background(usize),
    /// Sprite with its palette index (palettes 0-3 never blend)
    Sprite(u8),
    Backdrop,
}

impl Ppu {
    fn priority_chart(&self) -> &'static [LayerSlot] {
        match self.bg_mode {
            0 => PRIORITY_MODE0,
            1 if self.bg3_priority => PRIORITY_MODE1_BG3_ON,
            1 => PRIORITY_MODE1_BG3_OFF,
            3 => PRIORITY_MODE3,
            7 => PRIORITY_MODE7,
            // Unsupported modes fall back to backdrop-only
            _ => &[],
        }
    }

    /// Bits per pixel of a background layer in the current mode, or 0
    /// when the layer does not exist.
    fn bg_bpp(&self, index: usize) -> u8 {
        match (self.bg_mode, index) {
            (0, _) => 2,
            (1, 0) | (1, 1) => 4,
            (1, 2) => 2,
            (3, 0) => 8,
            (3, 1) => 4,
            _ => 0,
        }
    }

    /// Render the dot at (x, y); the caller only asks for visible dots.
    pub(super) fn render_dot(&mut self, x: u16, y: u16) -> Color {
        if self.forced_blanking {
            return Color::default();
        }

        let (main_rgb, source) = self.screen_pixel(x, y, true);

        // Force-black gate blanks the main pixel but math still applies
        let mut main_rgb = if self.gate_passes(self.force_main_screen_black, x) {
            0
        } else {
            main_rgb
        };

        if self.math_applies(source) && self.gate_passes(self.color_math_enable, x) {
            let operand = if self.subscreen_enabled {
                // A transparent sub screen falls back to the fixed color
                let (sub_rgb, sub_source) = self.screen_pixel(x, y, false);
                match sub_source {
                    PixelSource::Backdrop => self.subscreen_backdrop,
                    _ => sub_rgb,
                }
            } else {
                self.subscreen_backdrop
            };

            main_rgb = self.blend(main_rgb, operand);
        }

        self.rgb555_to_color(main_rgb)
    }

    /// First opaque pixel of the main or sub screen at (x, y).
    fn screen_pixel(&self, x: u16, y: u16, main: bool) -> (u16, PixelSource) {
        let screen = if main {
            &self.main_screen
        } else {
            &self.sub_screen
        };

        for slot in self.priority_chart() {
            match *slot {
                Bg { index, priority } => {
                    if !screen.bg_enabled[index] {
                        continue;
                    }
                    // TMW/TSW bit set: the window masks this layer here
                    if screen.window_bg_disable[index] && self.bg_window_masks(index, x) {
                        continue;
                    }
                    let pixel = if self.bg_mode == 7 {
                        self.mode7_pixel(x, y)
                    } else {
                        self.bg_pixel(index, priority, x, y)
                    };
                    if let Some(rgb) = pixel {
                        return (rgb, PixelSource::Background(index));
                    }
                }
                Obj { priority } => {
                    if !screen.obj_enabled {
                        continue;
                    }
                    if screen.window_obj_disable && self.obj_window_masks(x) {
                        continue;
                    }
                    if let Some((rgb, palette)) = self.obj_pixel(x, y, priority) {
                        return (rgb, PixelSource::Sprite(palette));
                    }
                }
            }
        }

        (self.cgram[0], PixelSource::Backdrop)
    }

    // ========================================
    // Windows
    // ========================================

    /// Evaluate one window's membership test for a layer config.
    ///
    /// Returns `None` when the window is disabled for this layer.
    fn window_test(x: u16, left: u8, right: u8, area: WindowArea) -> Option<bool> {
        let inside = (left as u16..=right as u16).contains(&x);
        match area {
            WindowArea::Disabled => None,
            WindowArea::Inside => Some(inside),
            WindowArea::Outside => Some(!inside),
        }
    }

    fn combine_windows(w1: Option<bool>, w2: Option<bool>, logic: WindowLogic) -> bool {
        match (w1, w2) {
            (None, None) => false,
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (Some(a), Some(b)) => match logic {
                WindowLogic::Or => a | b,
                WindowLogic::And => a & b,
                WindowLogic::Xor => a ^ b,
                WindowLogic::Xnor => !(a ^ b),
            },
        }
    }

    fn bg_window_masks(&self, index: usize, x: u16) -> bool {
        let w1 = Self::window_test(
            x,
            self.window1.left,
            self.window1.right,
            self.window1.background[index],
        );
        let w2 = Self::window_test(
            x,
            self.window2.left,
            self.window2.right,
            self.window2.background[index],
        );
        Self::combine_windows(w1, w2, self.window_logic_bg[index])
    }

    fn obj_window_masks(&self, x: u16) -> bool {
        let w1 = Self::window_test(x, self.window1.left, self.window1.right, self.window1.obj);
        let w2 = Self::window_test(x, self.window2.left, self.window2.right, self.window2.obj);
        Self::combine_windows(w1, w2, self.window_logic_obj)
    }

    fn math_window_active(&self, x: u16) -> bool {
        let w1 = Self::window_test(x, self.window1.left, self.window1.right, self.window1.math);
        let w2 = Self::window_test(x, self.window2.left, self.window2.right, self.window2.math);
        Self::combine_windows(w1, w2, self.window_logic_math)
    }

    fn gate_passes(&self, gate: ColorMathGate, x: u16) -> bool {
        match gate {
            ColorMathGate::Never => false,
            ColorMathGate::Always => true,
            ColorMathGate::MathWindow => self.math_window_active(x),
            ColorMathGate::NotMathWindow => !self.math_window_active(x),
        }
    }

    // ========================================
    // Color math
    // ========================================

    fn math_applies(&self, source: PixelSource) -> bool {
        match source {
            PixelSource::Background(index) => self.color_math_bg[index],
            // Only sprite palettes 4-7 participate in color math
            PixelSource::Sprite(palette) => self.color_math_obj && palette >= 4,
            PixelSource::Backdrop => self.color_math_backdrop,
        }
    }

    /// Per-channel add/subtract; the half step applies before clamping.
    fn blend(&self, main: u16, sub: u16) -> u16 {
        let mut result = 0;

        for shift in [0, 5, 10] {
            let a = ((main >> shift) & 0x1F) as i32;
            let b = ((sub >> shift) & 0x1F) as i32;

            let mut channel = if self.color_math_subtract { a - b } else { a + b };
            if self.color_math_half {
                channel >>= 1;
            }

            result |= (channel.clamp(0, 31) as u16) << shift;
        }

        result
    }

    // ========================================
    // Background layers
    // ========================================

    /// Pixel of background `index` at the given chart priority, or
    /// `None` when transparent or off-priority.
    fn bg_pixel(&self, index: usize, priority: u8, x: u16, y: u16) -> Option<u16> {
        let bpp = self.bg_bpp(index);
        if bpp == 0 {
            return None;
        }

        let bg = &self.backgrounds[index];

        // Mosaic snaps sampling to the top-left of each block
        let (x, y) = if self.mosaic_enabled[index] && self.mosaic_size > 1 {
            let size = self.mosaic_size as u16;
            (x - x % size, y - y % size)
        } else {
            (x, y)
        };

        let tile_px: u16 = if bg.tile_size16 { 16 } else { 8 };

        let sx = x.wrapping_add(bg.h_offset) & 0x3FF;
        let sy = y.wrapping_add(bg.v_offset) & 0x3FF;

        let entry_x = sx / tile_px;
        let entry_y = sy / tile_px;

        let entry = self.tilemap_entry(bg.tilemap_base, bg.tilemap_size, entry_x, entry_y);

        let entry_priority = ((entry >> 13) & 1) as u8;
        if entry_priority != priority {
            return None;
        }

        let tile_index = entry & 0x3FF;
        let palette = ((entry >> 10) & 0b111) as u8;
        let h_flip = entry & (1 << 14) != 0;
        let v_flip = entry & (1 << 15) != 0;

        let mut px = sx % tile_px;
        let mut py = sy % tile_px;
        if h_flip {
            px = tile_px - 1 - px;
        }
        if v_flip {
            py = tile_px - 1 - py;
        }

        // 16x16 tiles are four consecutive 8x8 characters, one row of
        // the character table apart vertically
        let tile_index = tile_index + (px / 8) + (py / 8) * 16;
        let px = px % 8;
        let py = py % 8;

        let color = self.tile_pixel(bg.tile_base, tile_index, bpp, px, py);
        if color == 0 {
            return None;
        }

        let cgram_index = match bpp {
            2 => {
                if self.bg_mode == 0 {
                    index as u16 * 32 + palette as u16 * 4 + color as u16
                } else {
                    palette as u16 * 4 + color as u16
                }
            }
            4 => palette as u16 * 16 + color as u16,
            _ => color as u16,
        };

        Some(self.cgram[(cgram_index & 0xFF) as usize])
    }

    /// Fetch one tilemap entry, resolving the 32/64-tile screen layout.
    fn tilemap_entry(&self, base_1k: u16, size: u8, entry_x: u16, entry_y: u16) -> u16 {
        let tx = entry_x & 0x3F;
        let ty = entry_y & 0x3F;

        let mut word = (ty & 0x1F) * 32 + (tx & 0x1F);
        match size {
            // 32x32
            0 => {}
            // 64x32
            1 => {
                if tx >= 32 {
                    word += 0x400;
                }
            }
            // 32x64
            2 => {
                if ty >= 32 {
                    word += 0x400;
                }
            }
            // 64x64
            _ => {
                if tx >= 32 {
                    word += 0x400;
                }
                if ty >= 32 {
                    word += 0x800;
                }
            }
        }

        let address = (((base_1k as u32) << 10) + word as u32) & 0x7FFF;
        let byte = (address as usize) * 2;
        self.vram[byte] as u16 | ((self.vram[byte + 1] as u16) << 8)
    }

    /// Color index of one pixel inside an 8x8 character.
    fn tile_pixel(&self, tile_base_words: u16, tile_index: u16, bpp: u8, px: u16, py: u16) -> u8 {
        // A tile occupies 4 * bpp words
        let tile_words = (bpp as u32) * 4;
        let address_words =
            ((tile_base_words as u32) + (tile_index as u32 & 0x3FF) * tile_words) & 0x7FFF;
        let base = (address_words as usize) * 2;

        let bit = 7 - px as usize;
        let row = py as usize;
        let mut color = 0;

        for plane_pair in 0..(bpp as usize / 2) {
            let offset = (base + plane_pair * 16 + row * 2) % VRAM_SIZE;
            let plane0 = self.vram[offset];
            let plane1 = self.vram[(offset + 1) % VRAM_SIZE];

            color |= ((plane0 >> bit) & 1) << (plane_pair * 2);
            color |= ((plane1 >> bit) & 1) << (plane_pair * 2 + 1);
        }

        color
    }

    // ========================================
    // Sprites
    // ========================================

    /// Sprite pixel at (x, y) for a given chart priority.
    ///
    /// The per-line list is in scan order; the first hit wins.
    fn obj_pixel(&self, x: u16, y: u16, priority: u8) -> Option<(u16, u8)> {
        for &index in &self.line_objs[..self.line_obj_count] {
            let obj = &self.objs[index as usize];
            if obj.priority != priority {
                continue;
            }

            let dx = x as i16 - obj.x;
            if dx < 0 || dx >= obj.width as i16 {
                continue;
            }
            let mut px = dx as u16;
            let mut py = (y as u8).wrapping_sub(obj.y) as u16;

            if obj.h_flip {
                px = obj.width - 1 - px;
            }
            if obj.v_flip {
                py = obj.height - 1 - py;
            }

            // Large sprites tile their character row every 16 entries
            let tile = (obj.tile & 0x100)
                | ((obj.tile + (px / 8) + (py / 8) * 16) & 0xFF);
            let address = self.obj_tile_address(tile);

            let color = self.obj_tile_pixel(address, px % 8, py % 8);
            if color == 0 {
                continue;
            }

            let rgb = self.cgram[(128 + obj.palette as u16 * 16 + color as u16) as usize];
            return Some((rgb, obj.palette));
        }

        None
    }

    /// 4bpp pixel fetch for sprites, from a tile word address.
    fn obj_tile_pixel(&self, tile_words: u16, px: u16, py: u16) -> u8 {
        let base = (tile_words as usize) * 2;
        let bit = 7 - px as usize;
        let row = py as usize;

        let offset = (base + row * 2) % VRAM_SIZE;
        let plane0 = self.vram[offset];
        let plane1 = self.vram[(offset + 1) % VRAM_SIZE];
        let offset23 = (base + 16 + row * 2) % VRAM_SIZE;
        let plane2 = self.vram[offset23];
        let plane3 = self.vram[(offset23 + 1) % VRAM_SIZE];

        ((plane0 >> bit) & 1)
            | (((plane1 >> bit) & 1) << 1)
            | (((plane2 >> bit) & 1) << 2)
            | (((plane3 >> bit) & 1) << 3)
    }

    // ========================================
    // Mode 7
    // ========================================

    /// Affine-transformed BG1 sample for mode 7.
    fn mode7_pixel(&self, x: u16, y: u16) -> Option<u16> {
        let x = if self.m7_h_flip { 255 - x } else { x };
        let y = if self.m7_v_flip { 255 - y } else { y };

        // 8.8 fixed-point transform around the (CX, CY) center
        let ox = x as i32 + self.m7_hofs as i32 - self.m7_x as i32;
        let oy = y as i32 + self.m7_vofs as i32 - self.m7_y as i32;

        let fx = ((self.m7_a as i32 * ox + self.m7_b as i32 * oy) >> 8) + self.m7_x as i32;
        let fy = ((self.m7_c as i32 * ox + self.m7_d as i32 * oy) >> 8) + self.m7_y as i32;

        let out_of_range = !(0..1024).contains(&fx) || !(0..1024).contains(&fy);

        let (fx, fy) = match self.m7_screen_over {
            // Wrap into the 1024x1024 playfield
            0 | 1 => (fx & 0x3FF, fy & 0x3FF),
            // Transparent outside
            2 if out_of_range => return None,
            2 => (fx, fy),
            // Tile 0 repeats outside
            _ => {
                if out_of_range {
                    (fx & 7, fy & 7)
                } else {
                    (fx, fy)
                }
            }
        };

        let tile_x = (fx as usize >> 3) & 0x7F;
        let tile_y = (fy as usize >> 3) & 0x7F;
        let tile = self.vram[(tile_y * 128 + tile_x) * 2] as usize;

        let px = (fx & 7) as usize;
        let py = (fy & 7) as usize;
        let color = self.vram[(tile * 64 + py * 8 + px) * 2 + 1];

        if color == 0 {
            return None;
        }
        Some(self.cgram[color as usize])
    }
}
