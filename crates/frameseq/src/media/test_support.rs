//! In-memory GIF and animated WebP fixtures shared by the media tests.

use std::borrow::Cow;

use gif::{DisposalMethod, Encoder, Frame, Repeat};
use image_webp::{ColorType, WebPEncoder};

pub const SIDE: u16 = 2;

/// Palette: 0 black, 1 red, 2 green, 3 blue.
const PALETTE: [u8; 12] = [0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];

/// One 2x2 frame described by palette indices.
#[derive(Debug, Clone)]
pub struct GifFrameSpec {
    indices: Vec<u8>,
    delay_cs: u16,
    transparent: Option<u8>,
    dispose: DisposalMethod,
}

impl GifFrameSpec {
    pub fn solid(index: u8, delay_cs: u16) -> Self {
        Self::pixels(vec![index; (SIDE * SIDE) as usize], delay_cs)
    }

    pub fn pixels(indices: Vec<u8>, delay_cs: u16) -> Self {
        Self {
            indices,
            delay_cs,
            transparent: None,
            dispose: DisposalMethod::Keep,
        }
    }

    pub fn transparent(mut self, index: u8) -> Self {
        self.transparent = Some(index);
        self
    }

    pub fn dispose(mut self, method: DisposalMethod) -> Self {
        self.dispose = method;
        self
    }
}

/// Encode a looping GIF of 2x2 frames on a 2x2 logical screen.
pub fn encode_gif(frames: &[GifFrameSpec]) -> Vec<u8> {
    encode_gif_on_screen(SIDE, SIDE, frames)
}

/// Encode a looping GIF of 2x2 frames placed at the top-left of a
/// `screen_w` x `screen_h` logical screen.
pub fn encode_gif_on_screen(screen_w: u16, screen_h: u16, frames: &[GifFrameSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, screen_w, screen_h, &PALETTE).unwrap();
        encoder.set_repeat(Repeat::Infinite).unwrap();
        for spec in frames {
            let frame = Frame {
                width: SIDE,
                height: SIDE,
                delay: spec.delay_cs,
                transparent: spec.transparent,
                dispose: spec.dispose,
                buffer: Cow::Borrowed(&spec.indices),
                ..Frame::default()
            };
            encoder.write_frame(&frame).unwrap();
        }
    }
    out
}

/// Three opaque frames, red then green then blue, 40ms each.
pub fn three_frame_gif() -> Vec<u8> {
    encode_gif(&[
        GifFrameSpec::solid(1, 4),
        GifFrameSpec::solid(2, 4),
        GifFrameSpec::solid(3, 4),
    ])
}

fn push_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

fn u24(value: u32) -> [u8; 3] {
    let [a, b, c, _] = value.to_le_bytes();
    [a, b, c]
}

/// Encode an opaque animated WebP whose frames each fill the whole canvas
/// with one color. Frames are `(rgb, duration_ms)`; `exif` becomes the
/// container's EXIF chunk.
pub fn encode_animated_webp(
    width: u32,
    height: u32,
    frames: &[([u8; 3], u32)],
    exif: Option<&[u8]>,
) -> Vec<u8> {
    let mut body = b"WEBP".to_vec();

    let flags = 0x02 | if exif.is_some() { 0x08 } else { 0 };
    let mut vp8x = vec![flags, 0, 0, 0];
    vp8x.extend_from_slice(&u24(width - 1));
    vp8x.extend_from_slice(&u24(height - 1));
    push_chunk(&mut body, b"VP8X", &vp8x);
    // Background color, then loop forever.
    push_chunk(&mut body, b"ANIM", &[0, 0, 0, 0, 0, 0]);

    for &(rgb, duration_ms) in frames {
        let pixels = rgb.repeat((width * height) as usize);
        let mut still = Vec::new();
        WebPEncoder::new(&mut still)
            .encode(&pixels, width, height, ColorType::Rgb8)
            .unwrap();
        // Skip "RIFF", size and "WEBP" to keep the VP8L chunk.
        let bitstream = &still[12..];

        let mut anmf = Vec::new();
        anmf.extend_from_slice(&u24(0));
        anmf.extend_from_slice(&u24(0));
        anmf.extend_from_slice(&u24(width - 1));
        anmf.extend_from_slice(&u24(height - 1));
        anmf.extend_from_slice(&u24(duration_ms));
        // No blending, no disposal.
        anmf.push(0x02);
        anmf.extend_from_slice(bitstream);
        push_chunk(&mut body, b"ANMF", &anmf);
    }
    if let Some(exif) = exif {
        push_chunk(&mut body, b"EXIF", exif);
    }

    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend(body);
    out
}

/// Little-endian TIFF header with a single IFD0 entry: the orientation tag.
pub fn exif_orientation_chunk(orientation: u16) -> Vec<u8> {
    let mut out = b"II*\0".to_vec();
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0x0112u16.to_le_bytes());
    // SHORT, count 1, value padded to four bytes.
    out.extend_from_slice(&3u16.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&orientation.to_le_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}
