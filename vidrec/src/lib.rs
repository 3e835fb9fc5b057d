/*!
    Record timestamped raster frames into a compressed video file.

    An [`EncoderSession`] ties the ffmpeg crates together: frames are
    converted from packed RGB to YUV 4:2:0 (`ffmpeg-transform`), compressed
    (`ffmpeg-encode`) and muxed into a container (`ffmpeg-sink`).

    ```ignore
    use ffmpeg_types::{PixelFormat, RasterFrame};
    use vidrec::{EncoderConfig, EncoderSession};

    let mut session = EncoderSession::new();
    session.open(&EncoderConfig::new(640, 480), "out.avi")?;

    for pixels in frames {
        let frame = RasterFrame::packed(&pixels, 640, 480, PixelFormat::Rgb32)?;
        if session.encode(&frame) < 0 {
            eprintln!("{}", session.log_text());
        }
    }

    session.close();
    ```

    # Diagnostics

    Each session keeps a [`DiagnosticLog`]. FFmpeg's own log output reaches
    the most recently registered log directly. Messages from the FFmpeg-facing
    crates follow once [`DiagnosticLayer`] is installed in the tracing
    subscriber.
*/

pub use ffmpeg_transform::ConversionStrategy;
pub use ffmpeg_types::{Error, PixelFormat, RasterFrame, Result};

pub mod diagnostics;

mod config;
mod scratch;
mod session;

pub use config::EncoderConfig;
pub use diagnostics::{DiagnosticLayer, DiagnosticLog};
pub use scratch::ScratchBuffers;
pub use session::{EncoderSession, EncoderState, SessionStats};
