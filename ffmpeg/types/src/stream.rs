/*!
    Stream information types.
*/

use crate::{CodecId, PixelFormat, Rational};

/**
    Information about a video stream, as handed from the encoder to the muxer.
*/
#[derive(Clone, Debug)]
pub struct VideoStreamInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub pixel_format: PixelFormat,
    /// Frame rate (may be approximate or unavailable).
    pub frame_rate: Option<Rational>,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Codec used.
    pub codec_id: CodecId,
    /// Codec extradata (global headers such as MPEG-4 VOL or H.264 SPS/PPS).
    pub extradata: Option<Vec<u8>>,
    /// Bitrate in bits per second (if known).
    pub bitrate: Option<u64>,
}

impl VideoStreamInfo {
    /**
        Returns the aspect ratio as a float.
    */
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /**
        Returns the frame rate as fps, if available.
    */
    pub fn fps(&self) -> Option<f64> {
        self.frame_rate.map(|r| r.to_f64())
    }
}
