// PPU register handling ($2100-$213F)
//
// The write half ($2100-$2133) configures screen, layer, window and
// color-math state; the read half ($2134-$213F) exposes the multiply
// result, position latches and the memory ports. The bus drops the bank
// before calling in here.

use crate::debug;
use crate::registers::*;

use super::{ColorMathGate, Ppu, WindowArea, WindowLogic};

const TAG: &str = "ppu";

/// Two-bit per-layer window config: bit 0 inverts, bit 1 enables.
fn window_area(bits: u8) -> WindowArea {
    match bits & 0b11 {
        0b10 => WindowArea::Inside,
        0b11 => WindowArea::Outside,
        _ => WindowArea::Disabled,
    }
}

fn window_logic(bits: u8) -> WindowLogic {
    match bits & 0b11 {
        0 => WindowLogic::Or,
        1 => WindowLogic::And,
        2 => WindowLogic::Xor,
        _ => WindowLogic::Xnor,
    }
}

/// CGWSEL bits 5-4: 0 = always, 3 = never.
fn color_math_gate(bits: u8) -> ColorMathGate {
    match bits & 0b11 {
        0 => ColorMathGate::Always,
        1 => ColorMathGate::MathWindow,
        2 => ColorMathGate::NotMathWindow,
        _ => ColorMathGate::Never,
    }
}

/// CGWSEL bits 7-6: 0 = never, 3 = always (inverse encoding).
fn force_black_gate(bits: u8) -> ColorMathGate {
    match bits & 0b11 {
        0 => ColorMathGate::Never,
        1 => ColorMathGate::NotMathWindow,
        2 => ColorMathGate::MathWindow,
        _ => ColorMathGate::Always,
    }
}

impl Ppu {
    /// Read a PPU register ($2134-$213F).
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            MPYL => (self.mpy & 0xFF) as u8,
            MPYM => ((self.mpy >> 8) & 0xFF) as u8,
            MPYH => ((self.mpy >> 16) & 0xFF) as u8,

            SLHV => {
                // Latch the counters; the value itself is open bus
                self.hpos_latch = self.h_pos;
                self.vpos_latch = self.v_pos;
                self.hpos_read_flip = false;
                self.vpos_read_flip = false;
                0
            }

            OPHCT => {
                let value = if self.hpos_read_flip {
                    (self.hpos_latch >> 8) as u8 & 1
                } else {
                    (self.hpos_latch & 0xFF) as u8
                };
                self.hpos_read_flip = !self.hpos_read_flip;
                value
            }

            OPVCT => {
                let value = if self.vpos_read_flip {
                    (self.vpos_latch >> 8) as u8 & 1
                } else {
                    (self.vpos_latch & 0xFF) as u8
                };
                self.vpos_read_flip = !self.vpos_read_flip;
                value
            }

            OAMDATAREAD => self.read_oam(),
            VMDATALREAD => self.read_vram_low(),
            VMDATAHREAD => self.read_vram_high(),
            CGDATAREAD => self.read_cgram(),

            // PPU1/PPU2 version fields
            STAT77 => 0x01,
            STAT78 => 0x01,

            _ => {
                debug::warn(TAG, format!("Ignore read at {:04X}", addr));
                0
            }
        }
    }

    /// Write a PPU register ($2100-$2133).
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            INIDISP => {
                let forced_blanking = value & 0x80 != 0;
                if self.forced_blanking != forced_blanking {
                    self.forced_blanking = forced_blanking;
                    debug::debug(
                        TAG,
                        format!(
                            "Forced blanking is now {}",
                            if forced_blanking { "enabled" } else { "disabled" }
                        ),
                    );
                }

                self.brightness = value & 0b1111;
            }

            OBSEL => {
                self.obj_size_select = value >> 5;
                self.obj_gap = (((value >> 3) & 0b11) as u16) << 12;
                self.obj_base = ((value & 0b111) as u16) << 13;
            }

            OAMADDL => self.set_oam_address_low(value),
            OAMADDH => self.set_oam_address_high(value),
            OAMDATA => self.write_oam(value),

            BGMODE => {
                let bg_mode = value & 0b111;
                if self.bg_mode != bg_mode {
                    debug::info(TAG, format!("New BG mode: {}", bg_mode));
                    self.bg_mode = bg_mode;

                    if !matches!(bg_mode, 0 | 1 | 3 | 7)
                        && self.unsupported_mode_warned != bg_mode
                    {
                        debug::warn(
                            TAG,
                            format!("BG mode {} is not supported, rendering backdrop", bg_mode),
                        );
                        self.unsupported_mode_warned = bg_mode;
                    }
                }

                self.bg3_priority = value & (1 << 3) != 0;

                for (i, bg) in self.backgrounds.iter_mut().enumerate() {
                    bg.tile_size16 = value & (1 << (4 + i)) != 0;
                }
            }

            MOSAIC => {
                self.mosaic_size = (value >> 4) + 1;
                for (i, enabled) in self.mosaic_enabled.iter_mut().enumerate() {
                    *enabled = value & (1 << i) != 0;
                }
            }

            BG1SC | BG2SC | BG3SC | BG4SC => {
                let bg = &mut self.backgrounds[(addr - BG1SC) as usize];
                bg.tilemap_base = (value >> 2) as u16;
                bg.tilemap_size = value & 0b11;
            }

            BG12NBA => {
                self.backgrounds[0].tile_base = ((value & 0b1111) as u16) << 12;
                self.backgrounds[1].tile_base = ((value >> 4) as u16) << 12;
            }

            BG34NBA => {
                self.backgrounds[2].tile_base = ((value & 0b1111) as u16) << 12;
                self.backgrounds[3].tile_base = ((value >> 4) as u16) << 12;
            }

            BG1HOFS | BG2HOFS | BG3HOFS | BG4HOFS => {
                let index = ((addr - BG1HOFS) / 2) as usize;
                let bg = &mut self.backgrounds[index];

                bg.h_offset = ((value as u16) << 8)
                    | (self.old_bg_byte & !7) as u16
                    | ((bg.h_offset >> 8) & 7);
                self.old_bg_byte = value;

                // BG1 scroll doubles as the mode-7 offset
                if index == 0 {
                    self.m7_hofs = sign_extend_13(bg.h_offset);
                }
            }

            BG1VOFS | BG2VOFS | BG3VOFS | BG4VOFS => {
                let index = ((addr - BG1VOFS) / 2) as usize;
                let bg = &mut self.backgrounds[index];

                bg.v_offset = ((value as u16) << 8) | self.old_bg_byte as u16;
                self.old_bg_byte = value;

                if index == 0 {
                    self.m7_vofs = sign_extend_13(bg.v_offset);
                }
            }

            VMAIN => self.write_vmain(value),
            VMADDL => self.set_vram_address_low(value),
            VMADDH => self.set_vram_address_high(value),
            VMDATAL => self.write_vram_low(value),
            VMDATAH => self.write_vram_high(value),

            M7SEL => {
                self.m7_screen_over = value >> 6;
                self.m7_h_flip = value & 1 != 0;
                self.m7_v_flip = value & 2 != 0;
            }

            M7A => {
                self.m7_a = (((value as u16) << 8) | self.m7_old as u16) as i16;
                self.m7_old = value;
            }

            M7B => {
                self.m7_b = (((value as u16) << 8) | self.m7_old as u16) as i16;
                self.m7_old = value;

                // The multiply result latches on the B write
                self.mpy = self.m7_a as i32 * (value as i8) as i32;
            }

            M7C => {
                self.m7_c = (((value as u16) << 8) | self.m7_old as u16) as i16;
                self.m7_old = value;
            }

            M7D => {
                self.m7_d = (((value as u16) << 8) | self.m7_old as u16) as i16;
                self.m7_old = value;
            }

            M7X => {
                self.m7_x = sign_extend_13(((value as u16) << 8) | self.m7_old as u16);
                self.m7_old = value;
            }

            M7Y => {
                self.m7_y = sign_extend_13(((value as u16) << 8) | self.m7_old as u16);
                self.m7_old = value;
            }

            CGADD => self.set_cgram_address(value),
            CGDATA => self.write_cgram(value),

            W12SEL => {
                self.window1.background[0] = window_area(value);
                self.window2.background[0] = window_area(value >> 2);
                self.window1.background[1] = window_area(value >> 4);
                self.window2.background[1] = window_area(value >> 6);
            }

            W34SEL => {
                self.window1.background[2] = window_area(value);
                self.window2.background[2] = window_area(value >> 2);
                self.window1.background[3] = window_area(value >> 4);
                self.window2.background[3] = window_area(value >> 6);
            }

            WOBJSEL => {
                self.window1.obj = window_area(value);
                self.window2.obj = window_area(value >> 2);
                self.window1.math = window_area(value >> 4);
                self.window2.math = window_area(value >> 6);
            }

            WH0 => self.window1.left = value,
            WH1 => self.window1.right = value,
            WH2 => self.window2.left = value,
            WH3 => self.window2.right = value,

            WBGLOG => {
                for (i, logic) in self.window_logic_bg.iter_mut().enumerate() {
                    *logic = window_logic(value >> (i * 2));
                }
            }

            WOBJLOG => {
                self.window_logic_obj = window_logic(value);
                self.window_logic_math = window_logic(value >> 2);
            }

            TM => {
                for (i, enabled) in self.main_screen.bg_enabled.iter_mut().enumerate() {
                    *enabled = value & (1 << i) != 0;
                }
                self.main_screen.obj_enabled = value & (1 << 4) != 0;
            }

            TS => {
                for (i, enabled) in self.sub_screen.bg_enabled.iter_mut().enumerate() {
                    *enabled = value & (1 << i) != 0;
                }
                self.sub_screen.obj_enabled = value & (1 << 4) != 0;
            }

            TMW => {
                for (i, disabled) in self.main_screen.window_bg_disable.iter_mut().enumerate() {
                    *disabled = value & (1 << i) != 0;
                }
                self.main_screen.window_obj_disable = value & (1 << 4) != 0;
            }

            TSW => {
                for (i, disabled) in self.sub_screen.window_bg_disable.iter_mut().enumerate() {
                    *disabled = value & (1 << i) != 0;
                }
                self.sub_screen.window_obj_disable = value & (1 << 4) != 0;
            }

            CGWSEL => {
                self.force_main_screen_black = force_black_gate(value >> 6);
                self.color_math_enable = color_math_gate(value >> 4);
                self.subscreen_enabled = value & (1 << 1) != 0;

                if value & 1 != 0 {
                    debug::warn(TAG, "Direct color mode is not supported");
                }
            }

            CGADSUB => {
                self.color_math_subtract = value & (1 << 7) != 0;
                self.color_math_half = value & (1 << 6) != 0;
                self.color_math_backdrop = value & (1 << 5) != 0;
                self.color_math_obj = value & (1 << 4) != 0;
                for (i, enabled) in self.color_math_bg.iter_mut().enumerate() {
                    *enabled = value & (1 << i) != 0;
                }
            }

            COLDATA => {
                let intensity = (value & 0x1F) as u16;
                if value & (1 << 5) != 0 {
                    self.subscreen_backdrop = (self.subscreen_backdrop & !0x001F) | intensity;
                }
                if value & (1 << 6) != 0 {
                    self.subscreen_backdrop =
                        (self.subscreen_backdrop & !0x03E0) | (intensity << 5);
                }
                if value & (1 << 7) != 0 {
                    self.subscreen_backdrop =
                        (self.subscreen_backdrop & !0x7C00) | (intensity << 10);
                }
            }

            SETINI => {
                if value & 0b1100_0111 != 0 {
                    debug::warn(
                        TAG,
                        format!("SETINI features {:02X} are not supported", value),
                    );
                }
            }

            _ => {
                debug::warn(TAG, format!("Ignore write {:02X} at {:04X}", value, addr));
            }
        }
    }
}

/// BG1 scroll and mode-7 center values are 13-bit signed.
fn sign_extend_13(value: u16) -> i16 {
    ((value << 3) as i16) >> 3
}
