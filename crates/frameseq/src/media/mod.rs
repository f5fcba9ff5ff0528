pub mod error;
pub mod gif_session;
pub mod reader;
pub mod session;
pub mod source;
pub mod types;
pub mod webp_session;

#[cfg(test)]
mod test_support;

use types::{Raster, Size};

/// Playback mode requested by the layer that drives a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Regular playback with sound, where the container has any.
    Normal,
    /// Playback without sound.
    Silent,
    /// Only video-container clips are acceptable. Animated images are not.
    OnlyGifv,
}

/// What the playback layer sees of a frame reader.
///
/// Expected call order per frame: `advance`, then `render`, then `delay`.
/// Failures are reported as `false`; the caller decides whether to stop or
/// restart playback.
pub trait ClipReader {
    /// Prepare to read from the first frame. Returns false for modes this
    /// reader does not serve or for sources it cannot decode.
    fn start(&mut self, mode: Mode) -> bool;

    /// Decode the next frame into the holding slot, looping when the current
    /// pass is spent.
    fn advance(&mut self) -> bool;

    /// Copy the held frame into `to`, resampled to `size` unless `size` is
    /// empty or already the frame's size. Reports alpha through `has_alpha`
    /// and empties the holding slot.
    ///
    /// Calling this with nothing held is a caller bug.
    fn render(&mut self, to: &mut Raster, has_alpha: &mut bool, size: Size) -> bool;

    /// Display time in milliseconds, as cached by the last `advance`.
    fn delay(&self) -> u32;
}
