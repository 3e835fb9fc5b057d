/*!
    Media frame transformation for the ffmpeg crate ecosystem.

    Converts packed 32-bit RGB raster frames into the planar YUV 4:2:0 layout
    encoders expect. Two interchangeable strategies implement [`PixelConverter`]:

    - [`FixedPointConverter`]: BT.601 full-to-studio range conversion in 13-bit
      fixed point, averaging each 2x2 block for chroma. No FFmpeg calls.
    - [`ScalerConverter`]: delegates to libswscale, caching the scaler context
      for the current frame size.

    ```ignore
    use ffmpeg_transform::ConversionStrategy;
    use ffmpeg_types::{PixelFormat, PlanarYuvFrame, RasterFrame};

    let mut converter = ConversionStrategy::Scaler.build();
    let mut yuv = PlanarYuvFrame::try_new(1280, 720)?;

    let frame = RasterFrame::packed(&bgra, 1280, 720, PixelFormat::Argb32)?;
    converter.convert(&frame, &mut yuv)?;
    ```
*/

pub use ffmpeg_types::{Error, PixelFormat, PlanarYuvFrame, RasterFrame, Result};

mod convert;
mod fixed;
mod scaler;

pub use convert::{ConversionStrategy, PixelConverter, check_frame};
pub use fixed::FixedPointConverter;
pub use scaler::ScalerConverter;
