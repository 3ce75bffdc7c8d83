// Renderer module - Video/audio output contracts
//
// The emulation core does not open windows or audio devices. Frontends
// implement the `Renderer` trait and register it on the console; the core
// invokes the callbacks synchronously from the emulation thread.
//
// For each visible frame the core guarantees: one `scan_started`, then
// `display_width x display_height` calls to `draw_pixel` in raster order,
// then one `scan_ended`. Audio arrives as interleaved signed 16-bit stereo
// pairs. Callbacks must not re-enter the core.

use std::cell::RefCell;
use std::rc::Rc;

/// A single output pixel, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Output contract implemented by frontends (window, video recorder, tests).
pub trait Renderer {
    /// A new visible frame is starting.
    fn scan_started(&mut self);

    /// One pixel, in raster order (left to right, top to bottom).
    fn draw_pixel(&mut self, color: Color);

    /// The visible frame is complete.
    fn scan_ended(&mut self);

    /// A block of interleaved stereo samples (left, right, left, ...).
    fn play_audio_samples(&mut self, samples: &[i16]);
}

/// Shared handle to the registered renderers.
///
/// The console owns registration; the PPU and APU hold clones of this
/// handle so they can invoke callbacks mid-scan. The core is
/// single-threaded, so `Rc<RefCell<...>>` is sufficient.
pub type RendererList = Rc<RefCell<Vec<Box<dyn Renderer>>>>;

/// Fixed output characteristics of the emulated console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnesConfig {
    pub display_width: u32,
    pub display_height: u32,
    pub display_rate: u32,

    pub audio_channels: u32,
    pub audio_sample_size: u32,
    pub audio_sample_rate: u32,
}

impl Default for SnesConfig {
    fn default() -> Self {
        SnesConfig {
            display_width: 256,
            display_height: 224,
            display_rate: 60,
            audio_channels: 2,
            audio_sample_size: 4,
            audio_sample_rate: 32000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnesConfig::default();
        assert_eq!(config.display_width, 256);
        assert_eq!(config.display_height, 224);
        assert_eq!(config.audio_sample_rate, 32000);
    }
}
