/*!
    Media encoding for the ffmpeg crate ecosystem.

    This crate transforms planar YUV pictures into compressed packets. It wraps
    FFmpeg's send-frame / receive-packet encoder API behind a small, synchronous
    surface: configure, open, feed a frame, collect whatever packets the codec
    is ready to emit, flush at end of stream.

    # Video Encoding

    ```ignore
    use ffmpeg_encode::{EncoderSettings, VideoEncoder};
    use ffmpeg_types::{CodecId, Rational};

    let settings = EncoderSettings::new(CodecId::Mpeg4, 640, 480, Rational::new(25, 1))
        .with_bitrate(400_000)
        .with_gop(12);

    let mut encoder = VideoEncoder::open(&settings)?;
    let mut out = vec![0u8; 640 * 480 * 3];

    for (index, picture) in pictures.iter().enumerate() {
        encoder.encode(picture, index as i64, &mut out, |packet| {
            // Hand to the muxer
            Ok(())
        })?;
    }

    // Drain frames the codec is still holding
    encoder.flush(&mut out, |packet| Ok(()))?;
    ```

    # Codec Choice

    Containers advertise a preferred video codec. [`substitute_codec`] applies
    the substitution policy on top of it: H.264 is replaced by MPEG-4 Part 2.

    # Frame Requirements

    Input must be YUV420P at exactly the configured size. Use
    `ffmpeg-transform` to convert RGB frames first.
*/

pub use ffmpeg_types::{
    CodecId, CompressedPacket, Error, PixelFormat, PlanarYuvFrame, Pts, Rational, Result,
    VideoStreamInfo,
};

mod codec;
mod config;
mod video;

pub use codec::substitute_codec;
pub use config::{DEFAULT_THREAD_COUNT, EncoderSettings};
pub use video::VideoEncoder;
