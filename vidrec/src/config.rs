/*!
    Session configuration.
*/

use std::path::Path;

use serde::{Deserialize, Serialize};

use ffmpeg_transform::ConversionStrategy;
use ffmpeg_types::{Error, Rational, Result};

/**
    Parameters of one recording session.

    Fixed for the lifetime of an open session. Missing fields in a JSON file
    take the [`Default`] values.
*/
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Frame width in pixels. Must be even.
    pub width: u32,
    /// Frame height in pixels. Must be even.
    pub height: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Frames between key frames.
    pub gop: u32,
    /// Frames per second. Timestamps count in units of `1/fps`.
    pub fps: u32,
    /// Container name or extension. Empty or absent means "use the file
    /// extension".
    pub container_format: Option<String>,
    /// RGB to YUV conversion backend.
    pub conversion: ConversionStrategy,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            bitrate: 400_000,
            gop: 12,
            fps: 25,
            container_format: None,
            conversion: ConversionStrategy::default(),
        }
    }
}

impl EncoderConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_gop(mut self, gop: u32) -> Self {
        self.gop = gop;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_container_format(mut self, format: impl Into<String>) -> Self {
        self.container_format = Some(format.into());
        self
    }

    pub fn with_conversion(mut self, conversion: ConversionStrategy) -> Self {
        self.conversion = conversion;
        self
    }

    /**
        Container hint, with blank strings treated as absent.
    */
    pub fn format_hint(&self) -> Option<&str> {
        self.container_format
            .as_deref()
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
    }

    pub fn frame_rate(&self) -> Rational {
        Rational::new(self.fps as i32, 1)
    }

    /**
        Stream time base, `1/fps`.
    */
    pub fn time_base(&self) -> Rational {
        Rational::per_frame(self.fps as i32)
    }

    /**
        Check the values an encoder can actually be opened with.

        Odd dimensions are rejected since 4:2:0 chroma needs whole 2x2 blocks.
    */
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::configuration(format!(
                "invalid frame size {}x{}",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(Error::configuration(format!(
                "frame size {}x{} must be even",
                self.width, self.height
            )));
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err(Error::configuration("frame size too large"));
        }
        if self.bitrate == 0 {
            return Err(Error::configuration("bitrate must be positive"));
        }
        if self.gop == 0 {
            return Err(Error::configuration("gop size must be at least 1"));
        }
        if self.fps == 0 || self.fps > i32::MAX as u32 {
            return Err(Error::configuration(format!(
                "invalid frame rate {}",
                self.fps
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid config: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("could not read '{}': {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EncoderConfig::default();
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.conversion, ConversionStrategy::Scaler);
        assert!(config.validate().is_ok());
        assert_eq!(config.time_base(), Rational::new(1, 25));
        assert_eq!(config.frame_rate(), Rational::new(25, 1));
    }

    #[test]
    fn rejects_zero_and_odd_values() {
        let base = EncoderConfig::new(64, 64);
        let cases = [
            EncoderConfig::new(0, 64),
            EncoderConfig::new(63, 64),
            EncoderConfig::new(64, 31),
            base.clone().with_bitrate(0),
            base.clone().with_gop(0),
            base.clone().with_fps(0),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(Error::Configuration(_))),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn blank_hint_is_absent() {
        assert_eq!(EncoderConfig::new(2, 2).format_hint(), None);
        assert_eq!(
            EncoderConfig::new(2, 2).with_container_format("  ").format_hint(),
            None
        );
        assert_eq!(
            EncoderConfig::new(2, 2)
                .with_container_format(" avi ")
                .format_hint(),
            Some("avi")
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            EncoderConfig::from_json(r#"{ "width": 320, "height": 240, "conversion": "fixed-point" }"#)
                .unwrap();
        assert_eq!((config.width, config.height), (320, 240));
        assert_eq!(config.fps, 25);
        assert_eq!(config.conversion, ConversionStrategy::FixedPoint);

        assert!(matches!(
            EncoderConfig::from_json("{ width: }"),
            Err(Error::Configuration(_))
        ));
    }
}
