// APU module - Bridge to the SPC700 sound core
//
// The audio subsystem is an independent processor reached through four
// byte-wide mailbox ports at $2140-$2143. The actual SPC700+DSP engine is
// an opaque collaborator behind the `Spc700Core` trait; this bridge owns
// the clock-domain conversion (21.477 MHz master clock -> 1.024 MHz SPC
// clock), forwards port traffic, and drains finished sample blocks to the
// renderer list once per frame.

use crate::debug;
use crate::renderer::RendererList;
use crate::scheduler::{TaskState, IDLE};

const TAG: &str = "apu";

/// Stereo S16 sample pairs per second.
pub const SAMPLE_RATE: u32 = 32000;
/// Bytes per sample (S16 stereo).
pub const SAMPLE_SIZE: u32 = 4;
/// Output channels.
pub const CHANNELS: u32 = 2;

/// SPC700 clock in Hz.
const SPC_CLOCK: u64 = 1_024_000;
/// Master clock in Hz (NTSC).
const MASTER_CLOCK: u64 = 21_477_000;

/// Contract of the opaque sound-chip engine.
///
/// Elapsed time is expressed in SPC cycles since the last `end_frame`.
/// `end_frame` closes the running frame and returns the interleaved
/// stereo samples produced during it.
pub trait Spc700Core {
    fn reset(&mut self);

    fn read_port(&mut self, elapsed_spc_cycles: u64, port: u8) -> u8;
    fn write_port(&mut self, elapsed_spc_cycles: u64, port: u8, value: u8);

    fn end_frame(&mut self, elapsed_spc_cycles: u64) -> &[i16];

    fn copy_state(&self, out: &mut Vec<u8>);
    fn restore_state(&mut self, state: &[u8]);
}

/// Fallback core used when no real SPC700 engine is injected.
///
/// Ports echo the last CPU write so boot-time handshakes make progress;
/// audio output is silence with correct pacing.
pub struct NullSpc {
    ports: [u8; 4],
    samples: Vec<i16>,
    cycle_remainder: u64,
}

impl NullSpc {
    pub fn new() -> Self {
        NullSpc {
            ports: [0; 4],
            samples: Vec::new(),
            cycle_remainder: 0,
        }
    }
}

impl Default for NullSpc {
    fn default() -> Self {
        Self::new()
    }
}

impl Spc700Core for NullSpc {
    fn reset(&mut self) {
        self.ports = [0; 4];
        self.cycle_remainder = 0;
    }

    fn read_port(&mut self, _elapsed: u64, port: u8) -> u8 {
        self.ports[(port & 3) as usize]
    }

    fn write_port(&mut self, _elapsed: u64, port: u8, value: u8) {
        self.ports[(port & 3) as usize] = value;
    }

    fn end_frame(&mut self, elapsed: u64) -> &[i16] {
        // 32 SPC cycles per output sample pair
        let cycles = self.cycle_remainder + elapsed;
        let pairs = cycles / (SPC_CLOCK / SAMPLE_RATE as u64);
        self.cycle_remainder = cycles % (SPC_CLOCK / SAMPLE_RATE as u64);

        self.samples.clear();
        self.samples.resize((pairs * 2) as usize, 0);
        &self.samples
    }

    fn copy_state(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ports);
        out.extend_from_slice(&self.cycle_remainder.to_le_bytes());
    }

    fn restore_state(&mut self, state: &[u8]) {
        if state.len() < 12 {
            debug::warn(TAG, "short NullSpc state, keeping current state");
            return;
        }
        self.ports.copy_from_slice(&state[..4]);
        self.cycle_remainder = u64::from_le_bytes(state[4..12].try_into().unwrap());
    }
}

/// CPU-side bridge to the sound core.
pub struct Apu {
    core: Box<dyn Spc700Core>,

    renderers: Option<RendererList>,

    /// Master-clock value at the last `end_frame`
    clock: u64,

    pub task: TaskState,
}

impl Apu {
    pub fn new() -> Self {
        Apu {
            core: Box::new(NullSpc::new()),
            renderers: None,
            clock: 0,
            task: TaskState::new(),
        }
    }

    /// Install a real sound core in place of the silent fallback.
    pub fn set_core(&mut self, mut core: Box<dyn Spc700Core>) {
        core.reset();
        self.core = core;
    }

    pub fn set_renderers(&mut self, renderers: RendererList) {
        self.renderers = Some(renderers);
    }

    /// Master-clock delta converted into the SPC clock domain.
    fn spc_cycles(&self, master_clock: u64) -> u64 {
        let delta = master_clock.saturating_sub(self.clock);
        delta * SPC_CLOCK / MASTER_CLOCK
    }

    /// CPU read of $2140-$2143.
    pub fn read_port(&mut self, master_clock: u64, addr: u16) -> u8 {
        let t = self.spc_cycles(master_clock);
        self.core.read_port(t, (addr & 3) as u8)
    }

    /// CPU write of $2140-$2143.
    pub fn write_port(&mut self, master_clock: u64, addr: u16, value: u8) {
        let t = self.spc_cycles(master_clock);
        self.core.write_port(t, (addr & 3) as u8, value);
    }

    /// Scheduler entry: close the frame and ship finished samples.
    ///
    /// Always reports idle; the console re-arms the bridge once per video
    /// frame.
    pub fn run(&mut self, master_clock: u64) -> u32 {
        let t = self.spc_cycles(master_clock);
        self.clock = master_clock;

        let samples = self.core.end_frame(t);
        if !samples.is_empty() {
            if let Some(renderers) = &self.renderers {
                for renderer in renderers.borrow_mut().iter_mut() {
                    renderer.play_audio_samples(samples);
                }
            }
        }

        IDLE
    }

    pub fn dump_state(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.clock.to_le_bytes());

        let mut blob = Vec::new();
        self.core.copy_state(&mut blob);
        out.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        out.extend_from_slice(&blob);
    }

    pub fn restore_state(&mut self, state: &mut crate::emulator::save_state::StateReader) {
        self.clock = state.read_u64();
        let len = state.read_u32() as usize;
        let blob = state.read_bytes(len);
        self.core.restore_state(&blob);
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_echo() {
        let mut apu = Apu::new();

        apu.write_port(0, 0x2140, 0xAA);
        assert_eq!(apu.read_port(100, 0x2140), 0xAA);
        assert_eq!(apu.read_port(100, 0x2144), 0xAA, "ports mirror modulo 4");
    }

    #[test]
    fn test_sample_pacing() {
        let mut spc = NullSpc::new();

        // One 60 Hz frame of master clock: ~533 sample pairs
        let frame_spc_cycles = SPC_CLOCK / 60;
        let samples = spc.end_frame(frame_spc_cycles);
        let pairs = samples.len() / 2;

        assert!((530..=536).contains(&pairs), "got {} pairs", pairs);
    }

    #[test]
    fn test_run_reports_idle() {
        let mut apu = Apu::new();
        assert_eq!(apu.run(MASTER_CLOCK / 60), IDLE);
    }
}
