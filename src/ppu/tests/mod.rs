// PPU test modules

mod registers;
mod rendering;
mod timing;

use std::cell::RefCell;
use std::rc::Rc;

use crate::renderer::{Color, Renderer, RendererList};

use super::Ppu;

/// Renderer that records callback counts and pixels for assertions.
#[derive(Default)]
pub struct CaptureRenderer {
    pub scan_started: u32,
    pub scan_ended: u32,
    pub pixels: Vec<Color>,
    pub audio_samples: usize,
}

impl Renderer for CaptureRenderer {
    fn scan_started(&mut self) {
        self.scan_started += 1;
    }

    fn draw_pixel(&mut self, color: Color) {
        self.pixels.push(color);
    }

    fn scan_ended(&mut self) {
        self.scan_ended += 1;
    }

    fn play_audio_samples(&mut self, samples: &[i16]) {
        self.audio_samples += samples.len() / 2;
    }
}

/// Shared capture handle usable as a `RendererList` entry.
pub struct SharedCapture(pub Rc<RefCell<CaptureRenderer>>);

impl Renderer for SharedCapture {
    fn scan_started(&mut self) {
        self.0.borrow_mut().scan_started();
    }

    fn draw_pixel(&mut self, color: Color) {
        self.0.borrow_mut().draw_pixel(color);
    }

    fn scan_ended(&mut self) {
        self.0.borrow_mut().scan_ended();
    }

    fn play_audio_samples(&mut self, samples: &[i16]) {
        self.0.borrow_mut().play_audio_samples(samples);
    }
}

/// A PPU wired to a capture renderer.
pub fn ppu_with_capture() -> (Ppu, Rc<RefCell<CaptureRenderer>>) {
    let capture = Rc::new(RefCell::new(CaptureRenderer::default()));
    let renderers: RendererList = Rc::new(RefCell::new(vec![
        Box::new(SharedCapture(Rc::clone(&capture))) as Box<dyn Renderer>
    ]));

    let mut ppu = Ppu::new();
    ppu.set_renderers(renderers);
    (ppu, capture)
}
