// PPU timing and geometry constants

/// Visible pixels per line.
pub const DISPLAY_WIDTH: u16 = 256;
/// Visible lines per frame.
pub const DISPLAY_HEIGHT: u16 = 224;

/// Dot-units per scanline: 1364 master cycles at 4 cycles per dot.
pub const DOTS_PER_LINE: u16 = 341;
/// Lines per frame (visible + blanking).
pub const LINES_PER_FRAME: u16 = 262;

/// H-blank starts after the last visible dot of a line.
pub const HBLANK_START_DOT: u16 = 256;
/// Vertical blank starts on this line.
pub const VBLANK_START_LINE: u16 = 225;

/// VRAM size in bytes (32 K words).
pub const VRAM_SIZE: usize = 64 * 1024;
/// CGRAM palette entries.
pub const CGRAM_SIZE: usize = 256;
/// OAM size in bytes: 128 x 4-byte entries plus the 32-byte high table.
pub const OAM_SIZE: usize = 2 * 256 + 32;

/// Sprites stored in OAM.
pub const OBJ_COUNT: usize = 128;
/// Line budget: at most 32 sprites are considered per scanline.
pub const OBJS_PER_LINE: usize = 32;

/// Background layers.
pub const BACKGROUND_COUNT: usize = 4;

/// Small/large sprite pixel sizes per OBSEL size select.
pub const OBJ_SIZES: [(u16, u16); 8] = [
    (8, 16),
    (8, 32),
    (8, 64),
    (16, 32),
    (16, 64),
    (32, 64),
    (16, 32),
    (16, 32),
];
