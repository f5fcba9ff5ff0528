//! Sequential animated-image frame reading.
//!
//! [`FrameSequenceReader`] walks a GIF or animated WebP one frame at a time,
//! looping forever, and renders each frame into a caller-owned [`Raster`],
//! reusing the caller's allocation whenever the layout matches.
//!
//! ```no_run
//! use frameseq::{ClipReader, ClipSource, FrameSequenceReader, Mode, Raster, Size};
//!
//! let mut reader = FrameSequenceReader::new(ClipSource::from_path("clip.gif"));
//! if reader.start(Mode::Normal) {
//!     let mut frame = Raster::default();
//!     let mut has_alpha = false;
//!     while reader.advance() {
//!         reader.render(&mut frame, &mut has_alpha, Size::default());
//!         std::thread::sleep(std::time::Duration::from_millis(reader.delay().into()));
//!     }
//! }
//! ```

pub mod media;
pub mod settings;

pub use media::error::{ReaderError, SessionError};
pub use media::reader::FrameSequenceReader;
pub use media::session::{ClipFormat, DecodeSession, FormatSniffer, SessionOpener};
pub use media::source::{ByteDevice, ClipSource};
pub use media::types::{PixelFormat, Raster, Size};
pub use media::{ClipReader, Mode};
pub use settings::{DecoderSettings, ResizeFilter};
