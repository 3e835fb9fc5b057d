use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use ffmpeg_next::util::log::Level;

use vidrec::{ConversionStrategy, EncoderConfig};

#[derive(Parser, Debug)]
#[command(name = "vidrec")]
#[command(about = "Encode a test pattern or a directory of images into a video file")]
pub struct Args {
    /// Output file. The extension picks the container unless --format is given
    pub output: PathBuf,

    /// JSON file with encoder settings. Flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frame width in pixels (even)
    #[arg(long)]
    pub width: Option<u32>,

    /// Frame height in pixels (even)
    #[arg(long)]
    pub height: Option<u32>,

    /// Target bitrate in bits per second
    #[arg(short, long)]
    pub bitrate: Option<u64>,

    /// Frames between key frames
    #[arg(short, long)]
    pub gop: Option<u32>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Container format name, e.g. avi, mp4, matroska
    #[arg(short, long)]
    pub format: Option<String>,

    /// RGB to YUV conversion: scaler or fixed-point
    #[arg(short, long)]
    pub strategy: Option<ConversionStrategy>,

    /// Number of frames to encode (default: 100, or one per input image)
    #[arg(short = 'n', long)]
    pub frames: Option<u64>,

    /// Timestamp increment between frames, in 1/fps units
    #[arg(long, default_value = "1")]
    pub pts_step: u64,

    /// Encode the images in this directory instead of a test pattern
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Print the diagnostic log when done
    #[arg(long)]
    pub dump_log: bool,

    /// FFmpeg's own log level: quiet, error, warning, info, verbose, debug
    #[arg(long, default_value = "warning")]
    pub ffmpeg_log_level: String,
}

impl Args {
    /**
        Settings from the config file, if any, with flags applied on top.
    */
    pub fn encoder_config(&self) -> Result<EncoderConfig> {
        let mut config = match &self.config {
            Some(path) => EncoderConfig::from_file(path)?,
            None => EncoderConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(bitrate) = self.bitrate {
            config.bitrate = bitrate;
        }
        if let Some(gop) = self.gop {
            config.gop = gop;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(format) = &self.format {
            config.container_format = Some(format.clone());
        }
        if let Some(strategy) = self.strategy {
            config.conversion = strategy;
        }

        config.validate().context("invalid encoder settings")?;
        Ok(config)
    }

    pub fn ffmpeg_log_level(&self) -> Result<Level> {
        parse_level(&self.ffmpeg_log_level)
    }
}

fn parse_level(name: &str) -> Result<Level> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "quiet" => Level::Quiet,
        "panic" => Level::Panic,
        "fatal" => Level::Fatal,
        "error" => Level::Error,
        "warning" | "warn" => Level::Warning,
        "info" => Level::Info,
        "verbose" => Level::Verbose,
        "debug" => Level::Debug,
        "trace" => Level::Trace,
        other => bail!("unknown ffmpeg log level: {}", other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enc.json");
        std::fs::write(&path, r#"{ "width": 320, "height": 240, "fps": 30 }"#).unwrap();

        let args = Args::try_parse_from([
            "vidrec",
            "out.avi",
            "--config",
            path.to_str().unwrap(),
            "--fps",
            "50",
            "--strategy",
            "fixed-point",
        ])
        .unwrap();

        let config = args.encoder_config().unwrap();
        assert_eq!((config.width, config.height), (320, 240));
        assert_eq!(config.fps, 50);
        assert_eq!(config.conversion, ConversionStrategy::FixedPoint);
    }

    #[test]
    fn invalid_settings_are_reported() {
        let args = Args::try_parse_from(["vidrec", "out.avi", "--width", "63"]).unwrap();
        assert!(args.encoder_config().is_err());

        assert!(Args::try_parse_from(["vidrec", "out.avi", "--strategy", "magic"]).is_err());
    }

    #[test]
    fn log_levels_parse() {
        assert!(matches!(parse_level("WARNING"), Ok(Level::Warning)));
        assert!(matches!(parse_level("quiet"), Ok(Level::Quiet)));
        assert!(parse_level("loud").is_err());
    }
}
