/*!
    Converter trait and strategy selection.
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ffmpeg_types::{Error, PlanarYuvFrame, RasterFrame, Result};

use crate::{FixedPointConverter, ScalerConverter};

/**
    Converts one packed-RGB frame into a planar YUV 4:2:0 picture.

    Implementations overwrite every sample of `dst`. They reject frames whose
    pixel layout is not one of the 32-bit RGB layouts, or whose dimensions
    differ from `dst`, with [`Error::FormatMismatch`].
*/
pub trait PixelConverter {
    fn convert(&mut self, frame: &RasterFrame<'_>, dst: &mut PlanarYuvFrame) -> Result<()>;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}

/**
    Check that `frame` can be converted into `dst`.
*/
pub fn check_frame(frame: &RasterFrame<'_>, dst: &PlanarYuvFrame) -> Result<()> {
    if frame.width != dst.width() || frame.height != dst.height() {
        return Err(Error::format_mismatch(format!(
            "wrong image size: {}x{}, expected {}x{}",
            frame.width,
            frame.height,
            dst.width(),
            dst.height()
        )));
    }

    if !frame.format.is_encoder_input() {
        return Err(Error::format_mismatch(format!(
            "wrong image format: {}, expected rgb32 or argb32",
            frame.format
        )));
    }

    Ok(())
}

/**
    Which [`PixelConverter`] implementation a session uses.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionStrategy {
    /// Hand-written fixed-point conversion.
    FixedPoint,
    /// libswscale conversion with a cached context.
    #[default]
    Scaler,
}

impl ConversionStrategy {
    pub fn build(self) -> Box<dyn PixelConverter> {
        match self {
            Self::FixedPoint => Box::new(FixedPointConverter::new()),
            Self::Scaler => Box::new(ScalerConverter::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedPoint => "fixed-point",
            Self::Scaler => "scaler",
        }
    }
}

impl fmt::Display for ConversionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed-point" | "fixed" => Ok(Self::FixedPoint),
            "scaler" | "sws" | "swscale" => Ok(Self::Scaler),
            other => Err(Error::configuration(format!(
                "unknown conversion strategy '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::PixelFormat;

    #[test]
    fn check_frame_accepts_matching_rgb32() {
        let data = vec![0u8; 8 * 8 * 4];
        let dst = PlanarYuvFrame::try_new(8, 8).unwrap();
        for format in [PixelFormat::Rgb32, PixelFormat::Argb32] {
            let frame = RasterFrame::packed(&data, 8, 8, format).unwrap();
            assert!(check_frame(&frame, &dst).is_ok());
        }
    }

    #[test]
    fn check_frame_rejects_size_mismatch() {
        let data = vec![0u8; 8 * 6 * 4];
        let dst = PlanarYuvFrame::try_new(8, 8).unwrap();
        let frame = RasterFrame::packed(&data, 8, 6, PixelFormat::Rgb32).unwrap();
        let err = check_frame(&frame, &dst).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch(_)));
        assert!(err.message().contains("8x6"));
    }

    #[test]
    fn check_frame_rejects_other_layouts() {
        let data = vec![0u8; 8 * 8 * 4];
        let dst = PlanarYuvFrame::try_new(8, 8).unwrap();
        let frame = RasterFrame::packed(&data, 8, 8, PixelFormat::Rgba).unwrap();
        assert!(matches!(
            check_frame(&frame, &dst),
            Err(Error::FormatMismatch(_))
        ));
    }

    #[test]
    fn strategy_parses_and_serializes() {
        assert_eq!(
            "fixed-point".parse::<ConversionStrategy>().unwrap(),
            ConversionStrategy::FixedPoint
        );
        assert_eq!(
            "SWS".parse::<ConversionStrategy>().unwrap(),
            ConversionStrategy::Scaler
        );
        assert!("bilinear".parse::<ConversionStrategy>().is_err());

        let json = serde_json::to_string(&ConversionStrategy::FixedPoint).unwrap();
        assert_eq!(json, "\"fixed-point\"");
        assert_eq!(ConversionStrategy::default(), ConversionStrategy::Scaler);
    }

    #[test]
    fn built_converters_report_their_name() {
        assert_eq!(ConversionStrategy::FixedPoint.build().name(), "fixed-point");
        assert_eq!(ConversionStrategy::Scaler.build().name(), "scaler");
    }
}
