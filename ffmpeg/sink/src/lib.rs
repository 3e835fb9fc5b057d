/*!
    Container muxing for the ffmpeg crate ecosystem.

    This crate handles the output side of the media pipeline. It takes encoded
    packets from the encoder and writes them into a container file with a
    single video stream. The file is opened when the header is written,
    after which packets are interleaved and a trailer closes it.

    # Format Resolution

    [`ContainerFormat::resolve`] asks libavformat for the muxer matching an
    explicit hint or the file name and falls back to MPEG program stream when
    neither is recognized. The fallback is reported through
    [`Resolution::fell_back`] rather than as an error.

    ```ignore
    use ffmpeg_sink::{ContainerFormat, Sink};

    let resolution = ContainerFormat::resolve(None, "out.avi".as_ref())?;
    let mut sink = Sink::create("out.avi", resolution.format)?;

    let codec = sink.preferred_video_codec();
    sink.add_video_stream(&encoder.stream_info())?;
    sink.write_header()?;

    sink.write(&packet)?;
    sink.finish()?;
    ```
*/

pub use ffmpeg_types::{CodecId, CompressedPacket, Error, Rational, Result, VideoStreamInfo};

mod container;
mod sink;

pub use container::{ContainerFormat, FALLBACK_MUXER, Resolution};
pub use sink::Sink;
