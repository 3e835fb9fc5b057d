/*!
    Raster input frames and planar YUV frames.
*/

use crate::{Error, PixelFormat, Result};

/**
    A caller-owned packed image, borrowed for the duration of one encode call.

    Rows are `stride` bytes apart; the stride may exceed `width * bytes_per_pixel`
    when rows carry padding.
*/
#[derive(Clone, Copy, Debug)]
pub struct RasterFrame<'a> {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Distance between the starts of two consecutive rows, in bytes.
    pub stride: usize,
    /// Pixel bytes.
    pub data: &'a [u8],
}

impl<'a> RasterFrame<'a> {
    /**
        Wrap a pixel buffer, checking that it is large enough for the given
        shape and stride.
    */
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::format_mismatch("frame has zero dimensions"));
        }

        if let Some(bpp) = format.bytes_per_pixel() {
            let row_bytes = width as usize * bpp;
            if stride < row_bytes {
                return Err(Error::format_mismatch(format!(
                    "stride {} is shorter than a {} byte row",
                    stride, row_bytes
                )));
            }
            let needed = stride * (height as usize - 1) + row_bytes;
            if data.len() < needed {
                return Err(Error::format_mismatch(format!(
                    "buffer holds {} bytes, {}x{} {} with stride {} needs {}",
                    data.len(),
                    width,
                    height,
                    format,
                    stride,
                    needed
                )));
            }
        }

        Ok(Self {
            width,
            height,
            format,
            stride,
            data,
        })
    }

    /**
        Wrap a tightly packed buffer (no row padding).
    */
    pub fn packed(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let bpp = format.bytes_per_pixel().unwrap_or(1);
        Self::new(data, width, height, width as usize * bpp, format)
    }

    /**
        Returns the visible bytes of row `y`, without padding.
    */
    pub fn row(&self, y: usize) -> &'a [u8] {
        let bpp = self.format.bytes_per_pixel().unwrap_or(1);
        let start = y * self.stride;
        &self.data[start..start + self.width as usize * bpp]
    }
}

/**
    Tightly packed planar YUV 4:2:0 picture.

    The luma plane holds `width * height` samples, each chroma plane
    `(width / 2) * (height / 2)`. Odd dimensions round the chroma size down.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanarYuvFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PlanarYuvFrame {
    /**
        Number of bytes a 4:2:0 picture of this size occupies.
    */
    pub const fn byte_len(width: u32, height: u32) -> usize {
        let luma = width as usize * height as usize;
        let chroma = (width as usize / 2) * (height as usize / 2);
        luma + 2 * chroma
    }

    /**
        Allocate a zeroed picture, reporting allocation failure as an error.
    */
    pub fn try_new(width: u32, height: u32) -> Result<Self> {
        let len = Self::byte_len(width, height);
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            Error::resource(format!("cannot allocate {} byte YUV frame: {}", len, e))
        })?;
        data.resize(len, 0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn chroma_width(&self) -> usize {
        self.width as usize / 2
    }

    pub fn chroma_height(&self) -> usize {
        self.height as usize / 2
    }

    fn luma_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn chroma_len(&self) -> usize {
        self.chroma_width() * self.chroma_height()
    }

    /// Luma plane.
    pub fn y(&self) -> &[u8] {
        &self.data[..self.luma_len()]
    }

    /// Blue-difference chroma plane.
    pub fn u(&self) -> &[u8] {
        let start = self.luma_len();
        &self.data[start..start + self.chroma_len()]
    }

    /// Red-difference chroma plane.
    pub fn v(&self) -> &[u8] {
        let start = self.luma_len() + self.chroma_len();
        &self.data[start..start + self.chroma_len()]
    }

    /**
        Mutable access to all three planes at once.
    */
    pub fn planes_mut(&mut self) -> (&mut [u8], &mut [u8], &mut [u8]) {
        let luma = self.luma_len();
        let chroma = self.chroma_len();
        let (y, rest) = self.data.split_at_mut(luma);
        let (u, v) = rest.split_at_mut(chroma);
        (y, u, v)
    }

    /// The whole buffer, planes back to back.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
