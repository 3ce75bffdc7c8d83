// Save state functionality
//
// Serializes the complete console state as a little-endian binary stream:
// a small header (magic, format version, mapper byte) followed by each
// component's state in a fixed order, with the APU core blob and the SRAM
// contents length-prefixed.
//
// Loading parses and validates the whole file before any component is
// touched, so a rejected state never corrupts the running console.

use std::io;
use std::path::{Path, PathBuf};

use crate::cartridge::AddressingType;
use crate::cpu::Cpu;
use crate::debug;
use crate::dma::Dma;
use crate::input::ControllerPorts;
use crate::math::Math;
use crate::ppu::Ppu;
use crate::ram::Wram;

use super::Console;

const TAG: &str = "savestate";

/// File magic.
pub const MAGIC: [u8; 4] = *b"SNSS";
/// Current save state format version.
pub const VERSION: u32 = 1;

/// Errors that can occur during save state operations.
#[derive(Debug)]
pub enum SaveStateError {
    /// I/O error
    Io(io::Error),

    /// The file does not start with the expected magic
    BadMagic,

    /// Save state version mismatch
    VersionMismatch { expected: u32, found: u32 },

    /// The state was taken with a different memory mapping
    MapperMismatch,

    /// SRAM size in the state does not match the plugged cartridge
    SramMismatch { expected: usize, found: usize },

    /// The file is shorter (or longer) than the layout requires
    Truncated,
}

impl std::fmt::Display for SaveStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStateError::Io(e) => write!(f, "I/O error: {}", e),
            SaveStateError::BadMagic => write!(f, "not a save state file"),
            SaveStateError::VersionMismatch { expected, found } => {
                write!(f, "version mismatch: expected {}, found {}", expected, found)
            }
            SaveStateError::MapperMismatch => {
                write!(f, "save state belongs to a different mapper")
            }
            SaveStateError::SramMismatch { expected, found } => {
                write!(f, "SRAM size mismatch: expected {}, found {}", expected, found)
            }
            SaveStateError::Truncated => write!(f, "save state is truncated or padded"),
        }
    }
}

impl std::error::Error for SaveStateError {}

impl From<io::Error> for SaveStateError {
    fn from(e: io::Error) -> Self {
        SaveStateError::Io(e)
    }
}

/// Cursor over a little-endian state buffer.
///
/// Reads past the end set the underflow flag and return zeros; the loader
/// validates bounds up front, so that is strictly defensive.
pub struct StateReader<'a> {
    data: &'a [u8],
    position: usize,
    underflow: bool,
}

impl<'a> StateReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        StateReader {
            data,
            position: 0,
            underflow: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position.min(self.data.len())
    }

    pub fn underflow(&self) -> bool {
        self.underflow
    }

    pub fn skip(&mut self, count: usize) {
        if self.remaining() < count {
            self.underflow = true;
            self.position = self.data.len();
        } else {
            self.position += count;
        }
    }

    fn take(&mut self, count: usize) -> &'a [u8] {
        if self.remaining() < count {
            self.underflow = true;
            self.position = self.data.len();
            &[]
        } else {
            let slice = &self.data[self.position..self.position + count];
            self.position += count;
            slice
        }
    }

    pub fn read_u8(&mut self) -> u8 {
        self.take(1).first().copied().unwrap_or(0)
    }

    pub fn read_u16(&mut self) -> u16 {
        let bytes = self.take(2);
        if bytes.len() == 2 {
            u16::from_le_bytes([bytes[0], bytes[1]])
        } else {
            0
        }
    }

    pub fn read_i16(&mut self) -> i16 {
        self.read_u16() as i16
    }

    pub fn read_u32(&mut self) -> u32 {
        let bytes = self.take(4);
        if bytes.len() == 4 {
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        } else {
            0
        }
    }

    pub fn read_u64(&mut self) -> u64 {
        let bytes = self.take(8);
        if bytes.len() == 8 {
            u64::from_le_bytes(bytes.try_into().unwrap())
        } else {
            0
        }
    }

    pub fn read_bytes(&mut self, count: usize) -> Vec<u8> {
        self.take(count).to_vec()
    }

    pub fn read_exact(&mut self, out: &mut [u8]) {
        let bytes = self.take(out.len());
        if bytes.len() == out.len() {
            out.copy_from_slice(bytes);
        }
    }
}

/// Length of a component section, measured on a pristine instance.
///
/// Every section has a state-independent size, so a fresh component is a
/// valid probe.
fn section_len(dump: impl FnOnce(&mut Vec<u8>)) -> usize {
    let mut probe = Vec::new();
    dump(&mut probe);
    probe.len()
}

impl Console {
    /// Serialize the console into a save state buffer.
    pub fn save_state_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.push(self.bus.addressing_type().to_state_byte());

        self.cpu.dump_state(&mut out);
        out.extend_from_slice(&self.master_clock.to_le_bytes());

        self.bus.ppu.dump_state(&mut out);
        self.bus.apu.dump_state(&mut out);
        self.bus.dma.dump_state(&mut out);
        self.bus.joypads.dump_state(&mut out);
        self.bus.irq.dump_state(&mut out);
        self.bus.math.dump_state(&mut out);
        self.bus.wram.dump_state(&mut out);

        match &self.bus.sram {
            Some(sram) => {
                out.extend_from_slice(&(sram.len() as u32).to_le_bytes());
                out.extend_from_slice(sram.contents());
            }
            None => out.extend_from_slice(&0u32.to_le_bytes()),
        }

        out
    }

    /// Restore the console from a save state buffer.
    ///
    /// Validation happens before any mutation; on error the current run
    /// continues unaffected.
    pub fn load_state_bytes(&mut self, bytes: &[u8]) -> Result<(), SaveStateError> {
        if bytes.len() < MAGIC.len() + 5 {
            return Err(SaveStateError::Truncated);
        }
        if bytes[..4] != MAGIC {
            return Err(SaveStateError::BadMagic);
        }

        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(SaveStateError::VersionMismatch {
                expected: VERSION,
                found: version,
            });
        }

        if AddressingType::from_state_byte(bytes[8]) != Some(self.bus.addressing_type()) {
            return Err(SaveStateError::MapperMismatch);
        }

        let body = &bytes[9..];
        self.validate_state_body(body)?;

        // Apply; bounds were proven above
        let mut state = StateReader::new(body);
        self.cpu.restore_state(&mut state);
        self.master_clock = state.read_u64();
        self.bus.clock = self.master_clock;

        self.bus.ppu.restore_state(&mut state);
        self.bus.apu.restore_state(&mut state);
        self.bus.dma.restore_state(&mut state);
        self.bus.joypads.restore_state(&mut state);
        self.bus.irq.restore_state(&mut state);
        self.bus.math.restore_state(&mut state);
        self.bus.wram.restore_state(&mut state);

        let sram_len = state.read_u32() as usize;
        if sram_len > 0 {
            let contents = state.read_bytes(sram_len);
            if let Some(sram) = &mut self.bus.sram {
                sram.load_contents(&contents);
            }
        }

        debug_assert!(!state.underflow());
        Ok(())
    }

    /// Walk the state layout without mutating anything.
    fn validate_state_body(&self, body: &[u8]) -> Result<(), SaveStateError> {
        let mut cursor = StateReader::new(body);

        cursor.skip(section_len(|out| Cpu::new().dump_state(out)));
        cursor.skip(8); // master clock
        cursor.skip(Ppu::state_len());

        // APU: clock + length-prefixed core blob
        cursor.skip(8);
        let apu_blob = cursor.read_u32() as usize;
        cursor.skip(apu_blob);

        cursor.skip(section_len(|out| Dma::new().dump_state(out)));
        cursor.skip(section_len(|out| ControllerPorts::new().dump_state(out)));
        cursor.skip(section_len(|out| {
            crate::bus::InterruptControl::new().dump_state(out)
        }));
        cursor.skip(section_len(|out| Math::new().dump_state(out)));
        cursor.skip(section_len(|out| Wram::new().dump_state(out)));

        let sram_len = cursor.read_u32() as usize;
        let expected_sram = self.bus.sram.as_ref().map(|sram| sram.len()).unwrap_or(0);
        if sram_len != expected_sram {
            return Err(SaveStateError::SramMismatch {
                expected: expected_sram,
                found: sram_len,
            });
        }
        cursor.skip(sram_len);

        if cursor.underflow() || cursor.remaining() != 0 {
            return Err(SaveStateError::Truncated);
        }
        Ok(())
    }

    /// Write a save state file.
    pub fn save_state<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveStateError> {
        std::fs::write(path.as_ref(), self.save_state_bytes())?;
        debug::info(TAG, format!("Saved state to {}", path.as_ref().display()));
        Ok(())
    }

    /// Load a save state file.
    pub fn load_state<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SaveStateError> {
        let bytes = std::fs::read(path.as_ref())?;
        self.load_state_bytes(&bytes)?;
        debug::info(TAG, format!("Loaded state from {}", path.as_ref().display()));
        Ok(())
    }

    /// Timestamped save state path inside a directory.
    pub fn timestamped_state_path<P: AsRef<Path>>(directory: P) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        directory.as_ref().join(format!("state-{}.snss", stamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_underflow_is_sticky() {
        let mut reader = StateReader::new(&[1, 2]);

        assert_eq!(reader.read_u16(), 0x0201);
        assert!(!reader.underflow());

        assert_eq!(reader.read_u32(), 0);
        assert!(reader.underflow());
        assert_eq!(reader.read_u8(), 0);
    }

    #[test]
    fn test_reader_exact() {
        let mut reader = StateReader::new(&[9, 8, 7]);
        let mut out = [0u8; 3];
        reader.read_exact(&mut out);
        assert_eq!(out, [9, 8, 7]);
        assert_eq!(reader.remaining(), 0);
    }
}
