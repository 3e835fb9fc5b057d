/*!
    libswscale-backed RGB to YUV 4:2:0 conversion.
*/

use ffmpeg_next::{
    format::Pixel,
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::debug;

use ffmpeg_types::{Error, PlanarYuvFrame, RasterFrame, Result};

use crate::convert::{PixelConverter, check_frame};

/**
    Converter that delegates to libswscale.

    The source is treated as packed BGRA, the byte order of a little-endian
    32-bit RGB word. The scaler context and its staging frames are created
    lazily and reused until a frame of a different size arrives.
*/
pub struct ScalerConverter {
    /// Cached scaler context and the frame size it was created for.
    scaler_state: Option<ScalerState>,
}

struct ScalerState {
    context: ScalerContext,
    width: u32,
    height: u32,
    /// BGRA input, rows padded to FFmpeg's alignment.
    source: VideoFrameFFmpeg,
    /// YUV420P output with the strides the encoder expects.
    output: VideoFrameFFmpeg,
}

impl ScalerConverter {
    pub fn new() -> Self {
        Self { scaler_state: None }
    }

    /**
        Size the cached context was built for, if any.
    */
    pub fn cached_size(&self) -> Option<(u32, u32)> {
        self.scaler_state.as_ref().map(|s| (s.width, s.height))
    }

    /**
        Initialize or reinitialize the scaler for the given frame size.
    */
    fn init_scaler(&mut self, width: u32, height: u32) -> Result<()> {
        let context = ScalerContext::get(
            Pixel::BGRA,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            ScalerFlags::BICUBIC,
        )
        .map_err(|e| {
            Error::resource(format!("cannot initialize the conversion context: {}", e))
        })?;

        debug!(width, height, "created scaler context");

        self.scaler_state = Some(ScalerState {
            context,
            width,
            height,
            source: VideoFrameFFmpeg::new(Pixel::BGRA, width, height),
            output: VideoFrameFFmpeg::new(Pixel::YUV420P, width, height),
        });

        Ok(())
    }
}

impl Default for ScalerConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelConverter for ScalerConverter {
    fn convert(&mut self, frame: &RasterFrame<'_>, dst: &mut PlanarYuvFrame) -> Result<()> {
        check_frame(frame, dst)?;

        if self.cached_size() != Some((frame.width, frame.height)) {
            self.init_scaler(frame.width, frame.height)?;
        }
        let Some(state) = self.scaler_state.as_mut() else {
            return Err(Error::resource("conversion context missing"));
        };

        copy_raster_to_ffmpeg_frame(&mut state.source, frame);

        state
            .context
            .run(&state.source, &mut state.output)
            .map_err(|e| Error::format_mismatch(format!("scaling failed: {}", e)))?;

        copy_ffmpeg_frame_to_planar(&state.output, dst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scaler"
    }
}

/**
    Copy packed rows into an FFmpeg frame, honoring both strides.
*/
fn copy_raster_to_ffmpeg_frame(dst: &mut VideoFrameFFmpeg, src: &RasterFrame<'_>) {
    let dst_stride = dst.stride(0);
    let dst_data = dst.data_mut(0);

    for y in 0..src.height as usize {
        let row = src.row(y);
        let dst_row_start = y * dst_stride;
        dst_data[dst_row_start..dst_row_start + row.len()].copy_from_slice(row);
    }
}

/**
    Copy the three planes of a YUV420P FFmpeg frame into a tight buffer.
*/
fn copy_ffmpeg_frame_to_planar(src: &VideoFrameFFmpeg, dst: &mut PlanarYuvFrame) {
    let width = dst.width() as usize;
    let height = dst.height() as usize;
    let chroma_width = dst.chroma_width();
    let chroma_height = dst.chroma_height();
    let (y_plane, u_plane, v_plane) = dst.planes_mut();

    let planes: [(&mut [u8], usize, usize); 3] = [
        (y_plane, width, height),
        (u_plane, chroma_width, chroma_height),
        (v_plane, chroma_width, chroma_height),
    ];

    for (index, (plane, plane_width, plane_height)) in planes.into_iter().enumerate() {
        let stride = src.stride(index);
        let data = src.data(index);
        for row in 0..plane_height {
            let start = row * stride;
            plane[row * plane_width..(row + 1) * plane_width]
                .copy_from_slice(&data[start..start + plane_width]);
        }
    }
}

impl std::fmt::Debug for ScalerConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalerConverter")
            .field("cached_size", &self.cached_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedPointConverter;
    use ffmpeg_types::PixelFormat;

    fn solid(width: u32, height: u32, r: u8, g: u8, b: u8) -> Vec<u8> {
        [b, g, r, 0xFF].repeat((width * height) as usize)
    }

    #[test]
    fn solid_colors_match_fixed_point_closely() {
        for (r, g, b) in [(255, 255, 255), (0, 0, 0), (200, 30, 90), (12, 120, 240)] {
            let data = solid(32, 16, r, g, b);
            let frame = RasterFrame::packed(&data, 32, 16, PixelFormat::Rgb32).unwrap();

            let mut scaled = PlanarYuvFrame::try_new(32, 16).unwrap();
            ScalerConverter::new().convert(&frame, &mut scaled).unwrap();

            let mut fixed = PlanarYuvFrame::try_new(32, 16).unwrap();
            FixedPointConverter::new().convert(&frame, &mut fixed).unwrap();

            for (a, b) in scaled.as_bytes().iter().zip(fixed.as_bytes()) {
                assert!(a.abs_diff(*b) <= 2, "scaler {} vs fixed {}", a, b);
            }
        }
    }

    #[test]
    fn context_is_cached_per_size() {
        let mut converter = ScalerConverter::new();
        assert_eq!(converter.cached_size(), None);

        let small = solid(16, 16, 1, 2, 3);
        let frame = RasterFrame::packed(&small, 16, 16, PixelFormat::Argb32).unwrap();
        let mut dst = PlanarYuvFrame::try_new(16, 16).unwrap();
        converter.convert(&frame, &mut dst).unwrap();
        converter.convert(&frame, &mut dst).unwrap();
        assert_eq!(converter.cached_size(), Some((16, 16)));

        let large = solid(32, 8, 1, 2, 3);
        let frame = RasterFrame::packed(&large, 32, 8, PixelFormat::Argb32).unwrap();
        let mut dst = PlanarYuvFrame::try_new(32, 8).unwrap();
        converter.convert(&frame, &mut dst).unwrap();
        assert_eq!(converter.cached_size(), Some((32, 8)));
    }

    #[test]
    fn padded_rows_convert_like_tight_rows() {
        let tight = solid(8, 8, 90, 160, 30);
        let stride = 8 * 4 + 20;
        let mut padded = vec![0x55u8; stride * 8];
        for y in 0..8 {
            padded[y * stride..y * stride + 32].copy_from_slice(&tight[y * 32..(y + 1) * 32]);
        }

        let mut converter = ScalerConverter::new();
        let mut from_tight = PlanarYuvFrame::try_new(8, 8).unwrap();
        let frame = RasterFrame::packed(&tight, 8, 8, PixelFormat::Rgb32).unwrap();
        converter.convert(&frame, &mut from_tight).unwrap();

        let mut from_padded = PlanarYuvFrame::try_new(8, 8).unwrap();
        let frame = RasterFrame::new(&padded, 8, 8, stride, PixelFormat::Rgb32).unwrap();
        converter.convert(&frame, &mut from_padded).unwrap();

        assert_eq!(from_tight, from_padded);
    }

    #[test]
    fn rejects_wrong_layout_without_building_a_context() {
        let data = vec![0u8; 8 * 8 * 3];
        let frame = RasterFrame::packed(&data, 8, 8, PixelFormat::Rgb24).unwrap();
        let mut dst = PlanarYuvFrame::try_new(8, 8).unwrap();
        let mut converter = ScalerConverter::new();
        assert!(matches!(
            converter.convert(&frame, &mut dst),
            Err(Error::FormatMismatch(_))
        ));
        assert_eq!(converter.cached_size(), None);
    }
}
