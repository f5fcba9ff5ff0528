use std::io::Seek;

use gif::DisposalMethod;

use super::error::SessionError;
use super::session::DecodeSession;
use super::source::ByteDevice;
use super::types::{PixelFormat, Raster};

/// Sub-frame placement on the logical screen.
#[derive(Debug, Clone, Copy)]
struct FrameRect {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

/// What to do to the canvas before the next frame is drawn.
struct PendingDisposal {
    method: DisposalMethod,
    rect: FrameRect,
    snapshot: Option<Vec<u8>>,
}

/// Forward-only GIF decoding via the `gif` crate.
///
/// Frames are composited onto a full-size RGBA canvas, so every decoded
/// frame is a complete picture. The `gif` decoder cannot rewind, so looping
/// requires a new session.
pub struct GifSession {
    decoder: gif::Decoder<ByteDevice>,
    canvas: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_count: usize,
    min_delay_ms: u32,
    last_delay_ms: u32,
    pending: Option<PendingDisposal>,
}

/// Largest canvas a session will allocate, in bytes.
const MAX_CANVAS_BYTES: usize = 1 << 30;

/// Byte length of a tightly packed RGBA buffer, or `None` on overflow.
fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(4)
}

impl GifSession {
    pub fn new(mut device: ByteDevice, min_delay_ms: u32) -> Result<Self, SessionError> {
        // Metadata pass: count frames and look for transparency without LZW work.
        let (frame_count, transparent) = {
            let mut options = gif::DecodeOptions::new();
            options.skip_frame_decoding(true);
            let mut scan = options.read_info(&mut device)?;
            let (screen_w, screen_h) = (scan.width(), scan.height());
            let mut count = 0usize;
            let mut transparent = false;
            while let Some(frame) = scan.read_next_frame()? {
                let covers_screen = frame.left == 0
                    && frame.top == 0
                    && frame.width >= screen_w
                    && frame.height >= screen_h;
                transparent |= frame.transparent.is_some()
                    || frame.dispose == DisposalMethod::Background
                    || (count == 0 && !covers_screen);
                count += 1;
            }
            (count, transparent)
        };
        device.rewind()?;

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let decoder = options.read_info(device)?;
        let width = u32::from(decoder.width());
        let height = u32::from(decoder.height());
        if width == 0 || height == 0 {
            return Err(SessionError::InvalidFrame(format!(
                "logical screen is {width}x{height}"
            )));
        }
        let canvas_len = rgba_len(width, height)
            .filter(|&len| len <= MAX_CANVAS_BYTES)
            .ok_or_else(|| {
                SessionError::InvalidFrame(format!("logical screen {width}x{height} is too large"))
            })?;

        log::info!(
            "GIF session opened: {}x{}, {} frame{}{}",
            width,
            height,
            frame_count,
            if frame_count == 1 { "" } else { "s" },
            if transparent { ", transparent" } else { "" }
        );

        Ok(Self {
            decoder,
            canvas: vec![0u8; canvas_len],
            width,
            height,
            format: if transparent {
                PixelFormat::Rgba8
            } else {
                PixelFormat::Rgbx8
            },
            frame_count,
            min_delay_ms,
            last_delay_ms: 0,
            pending: None,
        })
    }

    fn apply_pending_disposal(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match pending.method {
            DisposalMethod::Background => {
                fill_rect(&mut self.canvas, self.width, self.height, pending.rect, [0; 4]);
            }
            DisposalMethod::Previous => {
                if let Some(snapshot) = pending.snapshot {
                    self.canvas = snapshot;
                }
            }
            DisposalMethod::Keep | DisposalMethod::Any => {}
        }
    }

    fn canvas_raster(&self) -> Result<Raster, SessionError> {
        let mut data = self.canvas.clone();
        if self.format == PixelFormat::Rgbx8 {
            for px in data.chunks_exact_mut(4) {
                px[3] = 255;
            }
        }
        Raster::from_packed(self.width, self.height, self.format, data).ok_or(SessionError::EmptyFrame)
    }
}

impl DecodeSession for GifSession {
    fn supports_animation(&self) -> bool {
        true
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn try_seek_to_start(&mut self) -> bool {
        false
    }

    fn read_frame(&mut self) -> Result<Raster, SessionError> {
        self.apply_pending_disposal();

        let Some(frame) = self.decoder.read_next_frame()? else {
            return Err(SessionError::NoMoreFrames);
        };
        let rect = FrameRect {
            left: u32::from(frame.left),
            top: u32::from(frame.top),
            width: u32::from(frame.width),
            height: u32::from(frame.height),
        };
        let expected = rgba_len(rect.width, rect.height)
            .ok_or_else(|| SessionError::InvalidFrame("frame size overflows".to_string()))?;
        if frame.buffer.len() < expected {
            return Err(SessionError::InvalidFrame(format!(
                "frame buffer holds {} bytes, expected {expected}",
                frame.buffer.len()
            )));
        }

        let snapshot = (frame.dispose == DisposalMethod::Previous).then(|| self.canvas.clone());
        composite(&mut self.canvas, self.width, self.height, rect, &frame.buffer);

        // GIF delay is in centiseconds
        self.last_delay_ms = (u32::from(frame.delay) * 10).max(self.min_delay_ms);
        self.pending = Some(PendingDisposal {
            method: frame.dispose,
            rect,
            snapshot,
        });

        self.canvas_raster()
    }

    fn next_image_delay(&self) -> u32 {
        self.last_delay_ms
    }
}

/// Draw an RGBA sub-frame onto the canvas, clipped to the canvas bounds.
/// Fully transparent source pixels leave the canvas untouched.
fn composite(canvas: &mut [u8], canvas_w: u32, canvas_h: u32, rect: FrameRect, src: &[u8]) {
    let (canvas_w, canvas_h) = (canvas_w as usize, canvas_h as usize);
    let (left, top) = (rect.left as usize, rect.top as usize);
    let src_w = rect.width as usize;
    let visible_w = src_w.min(canvas_w.saturating_sub(left));
    let visible_h = (rect.height as usize).min(canvas_h.saturating_sub(top));
    for y in 0..visible_h {
        let src_row = &src[y * src_w * 4..][..visible_w * 4];
        let dst_start = ((top + y) * canvas_w + left) * 4;
        let dst_row = &mut canvas[dst_start..dst_start + visible_w * 4];
        for (dst, px) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            if px[3] > 0 {
                dst.copy_from_slice(px);
            }
        }
    }
}

fn fill_rect(canvas: &mut [u8], canvas_w: u32, canvas_h: u32, rect: FrameRect, color: [u8; 4]) {
    let (canvas_w, canvas_h) = (canvas_w as usize, canvas_h as usize);
    let right = (rect.left as usize + rect.width as usize).min(canvas_w);
    let bottom = (rect.top as usize + rect.height as usize).min(canvas_h);
    let left = (rect.left as usize).min(right);
    for y in (rect.top as usize).min(bottom)..bottom {
        let row = &mut canvas[(y * canvas_w + left) * 4..(y * canvas_w + right) * 4];
        for px in row.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }
}
