use image::DynamicImage;
use image::metadata::Orientation;
use image_webp::{DecodingError, WebPDecoder};

use super::error::SessionError;
use super::session::DecodeSession;
use super::source::ByteDevice;
use super::types::{PixelFormat, Raster};

/// Animated WebP decoding via `image-webp`.
///
/// The container index is parsed up front, so rewinding is an in-place reset
/// and looping never rebuilds the device.
pub struct WebpSession {
    decoder: WebPDecoder<ByteDevice>,
    buf: Vec<u8>,
    format: PixelFormat,
    orientation: Orientation,
    normalize_orientation: bool,
    min_delay_ms: u32,
    last_delay_ms: u32,
}

impl WebpSession {
    pub fn new(device: ByteDevice, min_delay_ms: u32) -> Result<Self, SessionError> {
        let mut decoder = WebPDecoder::new(device)?;
        let buf_size = decoder
            .output_buffer_size()
            .ok_or_else(|| SessionError::InvalidFrame("canvas too large".to_string()))?;
        let format = if decoder.has_alpha() {
            PixelFormat::Rgba8
        } else {
            PixelFormat::Rgb8
        };
        let orientation = match decoder.exif_metadata() {
            Ok(Some(exif)) => {
                Orientation::from_exif_chunk(&exif).unwrap_or(Orientation::NoTransforms)
            }
            Ok(None) => Orientation::NoTransforms,
            Err(e) => {
                log::warn!("Ignoring unreadable WebP EXIF chunk: {e}");
                Orientation::NoTransforms
            }
        };

        let (w, h) = decoder.dimensions();
        log::info!(
            "WebP session opened: {}x{}, {} frame{}, animated: {}",
            w,
            h,
            decoder.num_frames(),
            if decoder.num_frames() == 1 { "" } else { "s" },
            decoder.is_animated()
        );

        Ok(Self {
            decoder,
            buf: vec![0u8; buf_size],
            format,
            orientation,
            normalize_orientation: false,
            min_delay_ms,
            last_delay_ms: 0,
        })
    }

    fn oriented(&self, raster: Raster) -> Result<Raster, SessionError> {
        if !self.normalize_orientation || self.orientation == Orientation::NoTransforms {
            return Ok(raster);
        }
        let (w, h) = (raster.width(), raster.height());
        let data = raster.to_packed();
        let mut img = match self.format {
            PixelFormat::Rgb8 => image::RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            PixelFormat::Rgba8 | PixelFormat::Rgbx8 => {
                image::RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8)
            }
        }
        .ok_or(SessionError::EmptyFrame)?;
        img.apply_orientation(self.orientation);

        let (ow, oh) = (img.width(), img.height());
        let data = match self.format {
            PixelFormat::Rgb8 => img.into_rgb8().into_raw(),
            PixelFormat::Rgba8 | PixelFormat::Rgbx8 => img.into_rgba8().into_raw(),
        };
        Raster::from_packed(ow, oh, self.format, data).ok_or(SessionError::EmptyFrame)
    }
}

impl DecodeSession for WebpSession {
    fn supports_animation(&self) -> bool {
        self.decoder.is_animated()
    }

    fn frame_count(&self) -> usize {
        self.decoder.num_frames() as usize
    }

    fn try_seek_to_start(&mut self) -> bool {
        // `reset_animation` panics on still images.
        if !self.decoder.is_animated() {
            return false;
        }
        self.decoder.reset_animation();
        true
    }

    fn read_frame(&mut self) -> Result<Raster, SessionError> {
        if !self.decoder.is_animated() {
            return Err(SessionError::NotAnimated);
        }
        let duration_ms = self.decoder.read_frame(&mut self.buf).map_err(|e| match e {
            DecodingError::NoMoreFrames => SessionError::NoMoreFrames,
            other => SessionError::Webp(other),
        })?;
        self.last_delay_ms = duration_ms.max(self.min_delay_ms);

        let (w, h) = self.decoder.dimensions();
        let raster =
            Raster::from_packed(w, h, self.format, self.buf.clone()).ok_or(SessionError::EmptyFrame)?;
        self.oriented(raster)
    }

    fn next_image_delay(&self) -> u32 {
        self.last_delay_ms
    }

    fn supports_orientation_normalization(&self) -> bool {
        true
    }

    fn set_orientation_normalization(&mut self, enabled: bool) {
        self.normalize_orientation = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::source::ClipSource;
    use crate::media::test_support::{encode_animated_webp, exif_orientation_chunk};
    use image_webp::{ColorType, WebPEncoder};

    fn still_webp() -> Vec<u8> {
        let mut out = Vec::new();
        WebPEncoder::new(&mut out)
            .encode(&[10, 20, 30, 255, 40, 50, 60, 255, 70, 80, 90, 255, 1, 2, 3, 255], 2, 2, ColorType::Rgba8)
            .unwrap();
        out
    }

    #[test]
    fn still_webp_is_not_animatable() {
        let device = ClipSource::from_bytes(still_webp()).open_device().unwrap();
        let session = WebpSession::new(device, 20).unwrap();
        assert!(!session.supports_animation());
        assert!(session.supports_orientation_normalization());
    }

    #[test]
    fn orientation_is_off_until_enabled() {
        let device = ClipSource::from_bytes(still_webp()).open_device().unwrap();
        let mut session = WebpSession::new(device, 20).unwrap();
        assert!(!session.normalize_orientation);
        session.set_orientation_normalization(true);
        assert!(session.normalize_orientation);
        assert_eq!(session.orientation, Orientation::NoTransforms);
    }

    fn open(bytes: Vec<u8>) -> WebpSession {
        let device = ClipSource::from_bytes(bytes).open_device().unwrap();
        WebpSession::new(device, 20).unwrap()
    }

    fn red_then_green() -> Vec<u8> {
        encode_animated_webp(2, 2, &[([200, 10, 10], 50), ([10, 200, 10], 10)], None)
    }

    #[test]
    fn decodes_animated_frames_in_order() {
        let mut session = open(red_then_green());
        assert!(session.supports_animation());
        assert_eq!(session.frame_count(), 2);

        let first = session.read_frame().unwrap();
        assert_eq!((first.width(), first.height()), (2, 2));
        assert_eq!(first.format(), PixelFormat::Rgb8);
        assert_eq!(first.bits(), [200u8, 10, 10].repeat(4).as_slice());
        assert_eq!(session.next_image_delay(), 50);

        let second = session.read_frame().unwrap();
        assert_eq!(second.bits(), [10u8, 200, 10].repeat(4).as_slice());
        // 10ms is below the 20ms floor
        assert_eq!(session.next_image_delay(), 20);
    }

    #[test]
    fn reading_past_the_end_fails() {
        let mut session = open(red_then_green());
        session.read_frame().unwrap();
        session.read_frame().unwrap();
        assert!(matches!(session.read_frame(), Err(SessionError::NoMoreFrames)));
    }

    #[test]
    fn rewinds_in_place_to_first_frame() {
        let mut session = open(red_then_green());
        let first = session.read_frame().unwrap();
        session.read_frame().unwrap();

        assert!(session.try_seek_to_start());
        assert_eq!(session.read_frame().unwrap().bits(), first.bits());
    }

    #[test]
    fn still_webp_cannot_rewind_or_decode() {
        let mut session = open(still_webp());
        assert!(!session.try_seek_to_start());
        assert!(matches!(session.read_frame(), Err(SessionError::NotAnimated)));
    }

    #[test]
    fn exif_rotation_applies_only_when_enabled() {
        let exif = exif_orientation_chunk(6);
        let bytes = encode_animated_webp(3, 2, &[([1, 2, 3], 40), ([4, 5, 6], 40)], Some(&exif));

        let mut session = open(bytes.clone());
        assert_eq!(session.orientation, Orientation::Rotate90);
        let frame = session.read_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));

        let mut session = open(bytes);
        session.set_orientation_normalization(true);
        let frame = session.read_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (2, 3));
        assert_eq!(frame.format(), PixelFormat::Rgb8);
        assert_eq!(frame.bits(), [1u8, 2, 3].repeat(6).as_slice());
    }
}
