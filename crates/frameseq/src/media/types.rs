use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb, Rgba};

/// Pixel layout of a [`Raster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGBA, straight alpha.
    #[default]
    Rgba8,
    /// 8-bit RGB padded to 32 bits; the fourth byte is always 255.
    Rgbx8,
    /// 8-bit packed RGB.
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Rgbx8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Rgba8)
    }
}

/// Width and height in pixels. A size with either side zero is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A decoded frame or a caller-owned pixel buffer.
///
/// Rows are `stride` bytes apart and `stride` may exceed the packed row
/// length. `data.len() == stride * height` always holds. The default value is
/// the null raster: no pixels, nothing to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Zero-filled raster with tightly packed rows.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            stride,
            data: vec![0; stride * height as usize],
        }
    }

    /// Zero-filled raster whose rows are `stride` bytes apart.
    /// Returns `None` if `stride` cannot hold a row.
    pub fn with_stride(width: u32, height: u32, format: PixelFormat, stride: usize) -> Option<Self> {
        if stride < width as usize * format.bytes_per_pixel() {
            return None;
        }
        Some(Self {
            width,
            height,
            format,
            stride,
            data: vec![0; stride * height as usize],
        })
    }

    /// Wrap tightly packed pixel data. Returns `None` on a length mismatch.
    pub fn from_packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        let stride = width as usize * format.bytes_per_pixel();
        if data.len() != stride * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            format,
            stride,
            data,
        })
    }

    pub fn is_null(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn has_alpha_channel(&self) -> bool {
        self.format.has_alpha()
    }

    /// Total payload size, padding included.
    pub fn byte_count(&self) -> usize {
        self.data.len()
    }

    pub fn bits(&self) -> &[u8] {
        &self.data
    }

    pub fn bits_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn scan_line(&self, row: u32) -> &[u8] {
        let start = row as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    pub fn scan_line_mut(&mut self, row: u32) -> &mut [u8] {
        let start = row as usize * self.stride;
        &mut self.data[start..start + self.stride]
    }

    /// Pixel bytes of each row with stride padding dropped.
    pub fn to_packed(&self) -> Vec<u8> {
        let row_len = self.width as usize * self.format.bytes_per_pixel();
        if row_len == self.stride {
            return self.data.clone();
        }
        let mut packed = Vec::with_capacity(row_len * self.height as usize);
        for row in 0..self.height {
            packed.extend_from_slice(&self.scan_line(row)[..row_len]);
        }
        packed
    }

    /// Resample to exactly `size`, ignoring aspect ratio. The result keeps
    /// this raster's format and has packed rows.
    pub fn scaled(&self, size: Size, filter: FilterType) -> Raster {
        let packed = self.to_packed();
        let data = match self.format {
            PixelFormat::Rgba8 | PixelFormat::Rgbx8 => {
                ImageBuffer::<Rgba<u8>, _>::from_raw(self.width, self.height, packed)
                    .map(|img| imageops::resize(&img, size.width, size.height, filter).into_raw())
            }
            PixelFormat::Rgb8 => ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, packed)
                .map(|img| imageops::resize(&img, size.width, size.height, filter).into_raw()),
        };
        data.and_then(|data| Raster::from_packed(size.width, size.height, self.format, data))
            .unwrap_or_else(|| {
                log::error!(
                    "Failed to resample {}x{} frame to {}x{}",
                    self.width,
                    self.height,
                    size.width,
                    size.height
                );
                Raster::default()
            })
    }
}
