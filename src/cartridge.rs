// Cartridge module - ROM image parsing
//
// A cartridge is a raw dump plus a 32-byte header located at $7FC0
// (LowROM) or $FFC0 (HighROM):
//
// ```text
// +0x00  21-byte ASCII title
// +0x15  speed/mapper byte (bit 4 = FastROM, low nibble = map type)
// +0x16  ROM type
// +0x17  ROM size (log2 KiB - 10)
// +0x18  SRAM size (log2 KiB - 10, 0 = none)
// +0x19  country
// +0x1A  licensee
// +0x1B  version
// +0x1C  checksum complement (u16)
// +0x1E  checksum (u16)
// ```
//
// Interrupt vectors follow at $FFE4-$FFFE of the header bank. The map is
// selected by the header whose checksum/complement sum is 0xFFFF; when
// both candidates are malformed a scoring heuristic picks the better one.

use crate::debug;

const TAG: &str = "cartridge";

const LOWROM_HEADER: usize = 0x7FC0;
const HIGHROM_HEADER: usize = 0xFFC0;

const TITLE_LEN: usize = 21;

/// Bank/offset decoding layout of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingType {
    LowRom,
    HighRom,
}

impl AddressingType {
    pub fn to_state_byte(self) -> u8 {
        match self {
            AddressingType::LowRom => 0,
            AddressingType::HighRom => 1,
        }
    }

    pub fn from_state_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(AddressingType::LowRom),
            1 => Some(AddressingType::HighRom),
            _ => None,
        }
    }
}

/// Errors surfaced at the cartridge-plug boundary.
#[derive(Debug)]
pub enum CartridgeError {
    /// I/O error while reading the image
    Io(std::io::Error),

    /// The image is too small to carry a header
    TooShort { size: usize },

    /// Neither header location yields a plausible header
    NoValidHeader,
}

impl std::fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartridgeError::Io(e) => write!(f, "I/O error: {}", e),
            CartridgeError::TooShort { size } => {
                write!(f, "ROM image too short ({} bytes)", size)
            }
            CartridgeError::NoValidHeader => write!(f, "no valid ROM header found"),
        }
    }
}

impl std::error::Error for CartridgeError {}

impl From<std::io::Error> for CartridgeError {
    fn from(e: std::io::Error) -> Self {
        CartridgeError::Io(e)
    }
}

/// Parsed ROM header fields.
#[derive(Debug, Clone)]
pub struct RomHeader {
    pub title: String,
    pub addressing_type: AddressingType,
    pub fast_rom: bool,
    pub rom_type: u8,
    /// ROM size in bytes, decoded from the log2 field
    pub rom_size: usize,
    /// SRAM size in bytes (0 = no SRAM)
    pub sram_size: usize,
    pub country: u8,
    pub licensee: u8,
    pub version: u8,
    pub checksum_complement: u16,
    pub checksum: u16,
    /// Reset vector read from $00FFFC
    pub reset_vector: u16,
}

/// A plugged cartridge: the raw image plus its decoded header.
pub struct Cartridge {
    pub rom: Vec<u8>,
    pub header: RomHeader,
}

impl Cartridge {
    /// Parse a raw ROM image.
    pub fn from_bytes(rom: Vec<u8>) -> Result<Self, CartridgeError> {
        if rom.len() < LOWROM_HEADER + 0x40 {
            return Err(CartridgeError::TooShort { size: rom.len() });
        }

        let low_score = score_header(&rom, LOWROM_HEADER, AddressingType::LowRom);
        let high_score = if rom.len() >= HIGHROM_HEADER + 0x40 {
            score_header(&rom, HIGHROM_HEADER, AddressingType::HighRom)
        } else {
            -1
        };

        debug::debug(
            TAG,
            format!("Header scores: lowrom={} highrom={}", low_score, high_score),
        );

        // Anything below this looks like headerless data
        const MIN_SCORE: i32 = 3;

        let (offset, addressing_type) = if high_score > low_score && high_score >= MIN_SCORE {
            (HIGHROM_HEADER, AddressingType::HighRom)
        } else if low_score >= MIN_SCORE {
            (LOWROM_HEADER, AddressingType::LowRom)
        } else {
            return Err(CartridgeError::NoValidHeader);
        };

        let header = parse_header(&rom, offset, addressing_type);

        debug::info(
            TAG,
            format!(
                "ROM title: '{}' ({:?}, {}, rom={} KiB, sram={} KiB)",
                header.title,
                header.addressing_type,
                if header.fast_rom { "FastROM" } else { "SlowROM" },
                header.rom_size / 1024,
                header.sram_size / 1024,
            ),
        );

        Ok(Cartridge { rom, header })
    }

    /// Load a ROM image from disk.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, CartridgeError> {
        let rom = std::fs::read(path)?;
        Self::from_bytes(rom)
    }
}

fn parse_header(rom: &[u8], offset: usize, addressing_type: AddressingType) -> RomHeader {
    let header = &rom[offset..offset + 0x40];

    let title: String = header[..TITLE_LEN]
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { ' ' })
        .collect::<String>()
        .trim_end()
        .to_string();

    let speed_mapper = header[0x15];
    let size_field = |field: u8| -> usize {
        if field == 0 {
            0
        } else {
            // log2 KiB - 10, capped to keep malformed fields harmless
            1024usize << field.min(24)
        }
    };

    // Reset vector lives in the same bank as the header
    let vector_base = offset + 0x3C;
    let reset_vector = u16::from_le_bytes([rom[vector_base], rom[vector_base + 1]]);

    RomHeader {
        title,
        addressing_type,
        fast_rom: speed_mapper & 0x10 != 0,
        rom_type: header[0x16],
        rom_size: size_field(header[0x17]),
        sram_size: size_field(header[0x18]),
        country: header[0x19],
        licensee: header[0x1A],
        version: header[0x1B],
        checksum_complement: u16::from_le_bytes([header[0x1C], header[0x1D]]),
        checksum: u16::from_le_bytes([header[0x1E], header[0x1F]]),
        reset_vector,
    }
}

/// Score a candidate header location.
///
/// A checksum/complement pair summing to 0xFFFF is near-certain; the other
/// criteria break ties between two malformed candidates.
fn score_header(rom: &[u8], offset: usize, addressing_type: AddressingType) -> i32 {
    let header = &rom[offset..offset + 0x40];
    let mut score = 0;

    let checksum = u16::from_le_bytes([header[0x1E], header[0x1F]]);
    let complement = u16::from_le_bytes([header[0x1C], header[0x1D]]);
    if checksum.wrapping_add(complement) == 0xFFFF {
        score += 4;
    }

    // Printable title
    if header[..TITLE_LEN]
        .iter()
        .all(|&b| b == b' ' || b.is_ascii_graphic())
    {
        score += 2;
    }

    // Mapper nibble consistent with the header location
    let mapper = header[0x15] & 0x0F;
    let expected = match addressing_type {
        AddressingType::LowRom => 0,
        AddressingType::HighRom => 1,
    };
    if mapper == expected {
        score += 2;
    }

    // Plausible ROM size field (256 KiB .. 8 MiB)
    if (8..=13).contains(&header[0x17]) {
        score += 1;
    }

    // Reset vector must point into the ROM-mapped half of bank 0
    let reset = u16::from_le_bytes([rom[offset + 0x3C], rom[offset + 0x3D]]);
    if reset >= 0x8000 {
        score += 1;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal LowROM image with a valid header.
    pub(crate) fn make_lowrom(title: &str) -> Vec<u8> {
        let mut rom = vec![0; 512 * 1024];

        let h = LOWROM_HEADER;
        for (i, b) in title.bytes().enumerate().take(TITLE_LEN) {
            rom[h + i] = b;
        }
        for i in title.len()..TITLE_LEN {
            rom[h + i] = b' ';
        }

        rom[h + 0x15] = 0x00; // LowROM, SlowROM
        rom[h + 0x17] = 9; // 512 KiB
        rom[h + 0x18] = 3; // 8 KiB SRAM

        // checksum/complement pair
        rom[h + 0x1C] = 0xFF;
        rom[h + 0x1D] = 0x5A;
        rom[h + 0x1E] = 0x00;
        rom[h + 0x1F] = 0xA5;

        // Reset vector at $00FFFC -> file offset 0x7FFC
        rom[h + 0x3C] = 0x00;
        rom[h + 0x3D] = 0x80;

        rom
    }

    #[test]
    fn test_parse_lowrom_header() {
        let rom = make_lowrom("SNES TEST");
        let cartridge = Cartridge::from_bytes(rom).expect("valid header");

        let header = &cartridge.header;
        assert_eq!(header.title, "SNES TEST");
        assert_eq!(header.addressing_type, AddressingType::LowRom);
        assert!(!header.fast_rom);
        assert_eq!(header.rom_size, 512 * 1024);
        assert_eq!(header.sram_size, 8 * 1024);
        assert_eq!(header.reset_vector, 0x8000);
    }

    #[test]
    fn test_fast_rom_flag() {
        let mut rom = make_lowrom("FAST");
        rom[LOWROM_HEADER + 0x15] = 0x10;

        let cartridge = Cartridge::from_bytes(rom).unwrap();
        assert!(cartridge.header.fast_rom);
    }

    #[test]
    fn test_headerless_data_is_rejected() {
        // 0xFF everywhere: unprintable title, implausible mapper and
        // size fields, checksum pair summing to 0xFFFE
        match Cartridge::from_bytes(vec![0xFF; 512 * 1024]) {
            Err(CartridgeError::NoValidHeader) => {}
            other => panic!("expected NoValidHeader, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_too_short_image() {
        match Cartridge::from_bytes(vec![0; 1024]) {
            Err(CartridgeError::TooShort { size }) => assert_eq!(size, 1024),
            other => panic!("expected TooShort, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_highrom_wins_with_valid_checksum() {
        let mut rom = vec![0; 1024 * 1024];

        let h = HIGHROM_HEADER;
        for i in 0..TITLE_LEN {
            rom[h + i] = b' ';
        }
        rom[h + 0x15] = 0x01; // HighROM
        rom[h + 0x17] = 10;
        rom[h + 0x1C] = 0xFF;
        rom[h + 0x1D] = 0xFF;
        rom[h + 0x1E] = 0x00;
        rom[h + 0x1F] = 0x00;
        rom[h + 0x3D] = 0x80;

        let cartridge = Cartridge::from_bytes(rom).unwrap();
        assert_eq!(cartridge.header.addressing_type, AddressingType::HighRom);
    }
}
