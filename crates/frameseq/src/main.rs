use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use frameseq::{ClipReader, ClipSource, DecoderSettings, FrameSequenceReader, Mode, PixelFormat, Raster, Size};

const DEFAULT_FRAMES: usize = 32;

fn save_png(frame: &Raster, path: &Path) -> Result<()> {
    let (w, h) = (frame.width(), frame.height());
    let data = frame.to_packed();
    match frame.format() {
        PixelFormat::Rgba8 | PixelFormat::Rgbx8 => image::RgbaImage::from_raw(w, h, data)
            .context("frame buffer does not match its size")?
            .save(path)?,
        PixelFormat::Rgb8 => image::RgbImage::from_raw(w, h, data)
            .context("frame buffer does not match its size")?
            .save(path)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        bail!("usage: frameseq <file> [frames] [out_dir]");
    };
    let frames = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid frame count '{n}'"))?,
        None => DEFAULT_FRAMES,
    };
    let out_dir = args.next().map(PathBuf::from);
    if let Some(dir) = &out_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let settings = DecoderSettings::load();
    let mut reader = FrameSequenceReader::with_settings(ClipSource::from_path(&input), &settings);
    if !reader.start(Mode::Normal) {
        bail!("{input} is not a readable animation");
    }

    let mut frame = Raster::default();
    let mut has_alpha = false;
    let mut total_ms = 0u64;
    let mut played = 0usize;
    for index in 0..frames {
        if !reader.advance() {
            log::warn!("Stopped after {index} frames");
            break;
        }
        reader.render(&mut frame, &mut has_alpha, Size::default());
        let delay = reader.delay();
        total_ms += u64::from(delay);
        played += 1;
        log::info!(
            "frame {index}: {}x{} {:?}{}, delay {delay}ms",
            frame.width(),
            frame.height(),
            frame.format(),
            if has_alpha { " (alpha)" } else { "" }
        );
        if let Some(dir) = &out_dir {
            save_png(&frame, &dir.join(format!("frame_{index:04}.png")))?;
        }
    }

    log::info!("Played {played} frames, {total_ms}ms of reported delay");
    Ok(())
}
