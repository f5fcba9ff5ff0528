//! Decode sessions: one stateful decoder per byte device.
//!
//! A session walks a clip forward one frame at a time. Backends differ in
//! what else they can do (rewind in place, normalize orientation), so those
//! capabilities are probed through the trait rather than assumed.

use super::error::SessionError;
use super::gif_session::GifSession;
use super::source::ByteDevice;
use super::types::Raster;
use super::webp_session::WebpSession;
use crate::settings::DecoderSettings;

/// Sequential frame decoder bound to a single [`ByteDevice`].
pub trait DecodeSession {
    /// Whether the underlying bytes can be animated. A readable still image
    /// returns false.
    fn supports_animation(&self) -> bool;

    /// Total number of frames in one loop of the animation.
    fn frame_count(&self) -> usize;

    /// Rewind to frame zero in place. Returns false if the backend cannot
    /// seek or the rewind failed; the caller then rebuilds the session.
    fn try_seek_to_start(&mut self) -> bool;

    /// Decode the next frame.
    fn read_frame(&mut self) -> Result<Raster, SessionError>;

    /// Display delay in milliseconds of the most recently decoded frame,
    /// zero before the first decode.
    fn next_image_delay(&self) -> u32;

    fn supports_orientation_normalization(&self) -> bool {
        false
    }

    /// Apply stored orientation metadata to decoded frames. Only meaningful
    /// when [`Self::supports_orientation_normalization`] is true.
    fn set_orientation_normalization(&mut self, _enabled: bool) {}
}

/// Builds a session over a freshly opened device. An `Err` means the bytes
/// are not readable by any backend this opener knows.
pub trait SessionOpener {
    fn open(&self, device: ByteDevice) -> Result<Box<dyn DecodeSession>, SessionError>;
}

/// Picks a backend from the device's magic bytes.
#[derive(Debug, Clone)]
pub struct FormatSniffer {
    min_frame_delay_ms: u32,
}

impl FormatSniffer {
    pub fn new(settings: &DecoderSettings) -> Self {
        Self {
            min_frame_delay_ms: settings.min_frame_delay_ms,
        }
    }
}

impl Default for FormatSniffer {
    fn default() -> Self {
        Self::new(&DecoderSettings::default())
    }
}

/// Container formats the sniffer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipFormat {
    Gif,
    Webp,
}

impl ClipFormat {
    pub fn detect(header: &[u8; 12]) -> Option<Self> {
        if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
            Some(ClipFormat::Gif)
        } else if &header[0..4] == b"RIFF" && &header[8..12] == b"WEBP" {
            Some(ClipFormat::Webp)
        } else {
            None
        }
    }
}

impl SessionOpener for FormatSniffer {
    fn open(&self, mut device: ByteDevice) -> Result<Box<dyn DecodeSession>, SessionError> {
        let header: [u8; 12] = device.peek_header()?;
        match ClipFormat::detect(&header) {
            Some(ClipFormat::Gif) => Ok(Box::new(GifSession::new(device, self.min_frame_delay_ms)?)),
            Some(ClipFormat::Webp) => Ok(Box::new(WebpSession::new(device, self.min_frame_delay_ms)?)),
            None => Err(SessionError::UnknownFormat),
        }
    }
}
