use image::imageops::FilterType;

use super::error::{ReaderError, SessionError};
use super::session::{DecodeSession, FormatSniffer, SessionOpener};
use super::source::ClipSource;
use super::types::{Raster, Size};
use super::{ClipReader, Mode};
use crate::settings::DecoderSettings;

/// Steps through an animated image one frame at a time.
///
/// Nothing is opened until the first `start`/`advance`. Once the frame
/// budget of the current loop is spent, the next advance rewinds the live
/// session, or rebuilds device and session from the [`ClipSource`] when the
/// backend cannot rewind.
pub struct FrameSequenceReader<O: SessionOpener = FormatSniffer> {
    source: ClipSource,
    opener: O,
    auto_orientation: bool,
    resize_filter: FilterType,
    session: Option<Box<dyn DecodeSession>>,
    /// Holding slot; null when there is nothing to render.
    frame: Raster,
    frames_left: usize,
    frame_delay: u32,
}

impl FrameSequenceReader {
    pub fn new(source: ClipSource) -> Self {
        Self::with_settings(source, &DecoderSettings::default())
    }

    pub fn with_settings(source: ClipSource, settings: &DecoderSettings) -> Self {
        Self::with_opener(source, FormatSniffer::new(settings), settings)
    }
}

impl<O: SessionOpener> FrameSequenceReader<O> {
    pub fn with_opener(source: ClipSource, opener: O, settings: &DecoderSettings) -> Self {
        Self {
            source,
            opener,
            auto_orientation: settings.auto_orientation,
            resize_filter: settings.resize_filter.filter_type(),
            session: None,
            frame: Raster::default(),
            frames_left: 0,
            frame_delay: 0,
        }
    }

    pub fn try_start(&mut self, mode: Mode) -> Result<(), ReaderError> {
        if mode == Mode::OnlyGifv {
            return Err(ReaderError::UnsupportedMode(mode));
        }
        self.jump_to_start()
    }

    pub fn try_advance(&mut self) -> Result<(), ReaderError> {
        // Read before decoding: the session reports the delay of the frame it
        // decoded last, which is the one this call supersedes.
        if let Some(session) = &self.session {
            self.frame_delay = session.next_image_delay();
        }

        self.frame = Raster::default();
        if self.frames_left < 1 {
            self.jump_to_start()
                .map_err(|e| ReaderError::DecodeExhausted(Box::new(e)))?;
        }

        let Some(session) = self.session.as_mut() else {
            return Err(ReaderError::DecodeFailed(SessionError::EmptyFrame));
        };
        let frame = session.read_frame().map_err(ReaderError::DecodeFailed)?;
        if frame.is_null() {
            return Err(ReaderError::DecodeFailed(SessionError::EmptyFrame));
        }
        self.frame = frame;
        self.frames_left = self.frames_left.saturating_sub(1);
        Ok(())
    }

    fn jump_to_start(&mut self) -> Result<(), ReaderError> {
        if let Some(session) = self.session.as_mut() {
            if session.try_seek_to_start() {
                self.frames_left = session.frame_count();
                log::debug!("Rewound session in place, {} frames", self.frames_left);
                return Ok(());
            }
        }

        self.session = None;
        self.frames_left = 0;
        let device = self.source.open_device()?;
        let mut session = self
            .opener
            .open(device)
            .map_err(ReaderError::SessionUnreadable)?;
        if session.supports_orientation_normalization() {
            session.set_orientation_normalization(self.auto_orientation);
        }
        if !session.supports_animation() {
            return Err(ReaderError::SessionUnreadable(SessionError::NotAnimated));
        }
        let frame_count = session.frame_count();
        if frame_count < 1 {
            return Err(ReaderError::SessionUnreadable(SessionError::EmptyFrame));
        }

        match self.source.path() {
            Some(path) => log::debug!(
                "Opened fresh decode session for {}, {frame_count} frames",
                path.display()
            ),
            None => log::debug!("Opened fresh decode session, {frame_count} frames"),
        }
        self.frames_left = frame_count;
        self.session = Some(session);
        Ok(())
    }
}

impl<O: SessionOpener> ClipReader for FrameSequenceReader<O> {
    fn start(&mut self, mode: Mode) -> bool {
        match self.try_start(mode) {
            Ok(()) => true,
            Err(e @ ReaderError::UnsupportedMode(_)) => {
                log::debug!("{e}");
                false
            }
            Err(e) => {
                log::warn!("Could not start animation: {e}");
                false
            }
        }
    }

    fn advance(&mut self) -> bool {
        match self.try_advance() {
            Ok(()) => true,
            Err(e @ ReaderError::DecodeExhausted(_)) => {
                log::debug!("{e}");
                false
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    fn render(&mut self, to: &mut Raster, has_alpha: &mut bool, size: Size) -> bool {
        debug_assert!(!self.frame.is_null(), "render called with no decoded frame");
        if self.frame.is_null() {
            log::error!("render called with no decoded frame");
            return false;
        }

        // Taking the frame empties the holding slot: a frame renders once.
        let frame = std::mem::take(&mut self.frame);
        *has_alpha = frame.has_alpha_channel();

        if size.is_empty() || size == frame.size() {
            if to.size() == frame.size() && to.format() == frame.format() {
                if to.byte_count() == frame.byte_count() {
                    to.bits_mut().copy_from_slice(frame.bits());
                } else {
                    copy_rows(to, &frame);
                }
            } else {
                *to = frame;
            }
        } else {
            *to = frame.scaled(size, self.resize_filter);
        }
        true
    }

    fn delay(&self) -> u32 {
        self.frame_delay
    }
}

/// Row-by-row copy between rasters of equal width, height and format but
/// different strides. Each row copies `min(dst.stride, src.stride)` bytes:
/// both strides cover the pixel bytes, neither buffer is overrun, and
/// destination bytes past that length keep their contents.
fn copy_rows(dst: &mut Raster, src: &Raster) {
    let row_len = dst.stride().min(src.stride());
    for row in 0..src.height() {
        dst.scan_line_mut(row)[..row_len].copy_from_slice(&src.scan_line(row)[..row_len]);
    }
}
