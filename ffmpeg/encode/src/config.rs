/*!
    Encoder configuration types.
*/

use ffmpeg_types::{CodecId, PixelFormat, Rational};

/// Worker thread hint handed to the codec.
pub const DEFAULT_THREAD_COUNT: usize = 10;

/**
    Configuration for opening a [`VideoEncoder`](crate::VideoEncoder).
*/
#[derive(Clone, Debug)]
pub struct EncoderSettings {
    /// Codec to use.
    pub codec: CodecId,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate. The codec time base is its inverse.
    pub frame_rate: Rational,
    /// Input pixel format.
    pub pixel_format: PixelFormat,
    /// Target bitrate in bits per second. Tolerance is half of it.
    pub bitrate: u64,
    /// Distance between forced key frames.
    pub gop: u32,
    /// Codec worker thread hint.
    pub threads: usize,
    /// Emit stream headers as extradata instead of in-band.
    pub global_header: bool,
}

impl EncoderSettings {
    pub fn new(codec: CodecId, width: u32, height: u32, frame_rate: Rational) -> Self {
        Self {
            codec,
            width,
            height,
            frame_rate,
            pixel_format: PixelFormat::Yuv420p,
            bitrate: 400_000,
            gop: 12,
            threads: DEFAULT_THREAD_COUNT,
            global_header: false,
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

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_global_header(mut self, global_header: bool) -> Self {
        self.global_header = global_header;
        self
    }

    /**
        Time base of the timestamps the encoder consumes and emits.
    */
    pub fn time_base(&self) -> Rational {
        self.frame_rate.invert()
    }

    /**
        Allowed deviation from the target bitrate.
    */
    pub fn bitrate_tolerance(&self) -> u64 {
        self.bitrate / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builders() {
        let settings = EncoderSettings::new(CodecId::Mpeg4, 64, 48, Rational::new(25, 1))
            .with_bitrate(800_000)
            .with_gop(30)
            .with_global_header(true);

        assert_eq!(settings.pixel_format, PixelFormat::Yuv420p);
        assert_eq!(settings.threads, DEFAULT_THREAD_COUNT);
        assert_eq!(settings.bitrate_tolerance(), 400_000);
        assert_eq!(settings.gop, 30);
        assert!(settings.global_header);
        assert_eq!(settings.time_base(), Rational::new(1, 25));
    }
}
