/*!
    Encoder session: the open → encode → close lifecycle.
*/

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use ffmpeg_encode::{EncoderSettings, VideoEncoder, substitute_codec};
use ffmpeg_sink::{ContainerFormat, Sink};
use ffmpeg_transform::PixelConverter;
use ffmpeg_types::{CompressedPacket, Error, RasterFrame, Result};

use crate::config::EncoderConfig;
use crate::diagnostics::{self, DiagnosticLog};
use crate::scratch::ScratchBuffers;

/**
    Lifecycle state of an [`EncoderSession`].
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncoderState {
    #[default]
    Uninitialized,
    Open,
    /// Closed, but flushing or writing the trailer failed.
    ClosedWithError,
    Closed,
}

/**
    Counters for one open period of a session.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames accepted by the encoder.
    pub frames: u64,
    /// Packets written to the container.
    pub packets: u64,
    pub key_frames: u64,
    /// Compressed bytes written.
    pub bytes: u64,
}

impl SessionStats {
    fn record(&mut self, packet: &CompressedPacket<'_>) {
        self.packets += 1;
        self.bytes += packet.size() as u64;
        if packet.is_keyframe {
            self.key_frames += 1;
        }
    }
}

/**
    Everything a session owns while it is open.

    Field order matters on drop: the encoder goes before the sink.
*/
struct ActiveSession {
    config: EncoderConfig,
    path: PathBuf,
    converter: Box<dyn PixelConverter>,
    encoder: VideoEncoder,
    sink: Sink,
    scratch: ScratchBuffers,
    stats: SessionStats,
}

impl ActiveSession {
    fn start(config: &EncoderConfig, path: &Path, log: &DiagnosticLog) -> Result<Self> {
        let resolution = ContainerFormat::resolve(config.format_hint(), path)?;
        if resolution.fell_back {
            note(
                log,
                "could not deduce output format from file extension: using MPEG",
            );
        }

        // The file is only opened by the header write at the end of assembly
        let sink = Sink::create(path, resolution.format)?;
        Self::assemble(config, path, sink, log)
    }

    fn assemble(
        config: &EncoderConfig,
        path: &Path,
        mut sink: Sink,
        log: &DiagnosticLog,
    ) -> Result<Self> {
        let preferred = sink.preferred_video_codec();
        let codec = substitute_codec(preferred);
        if codec != preferred {
            note(log, &format!("substituting {} for {}", codec, preferred));
        }

        let settings = EncoderSettings::new(codec, config.width, config.height, config.frame_rate())
            .with_bitrate(config.bitrate)
            .with_gop(config.gop)
            .with_global_header(sink.requires_global_header());

        let encoder = VideoEncoder::open(&settings)?;
        sink.add_video_stream(&encoder.stream_info())?;
        sink.dump();

        let scratch = ScratchBuffers::allocate(config.width, config.height)?;
        sink.write_header()?;

        Ok(Self {
            config: config.clone(),
            path: path.to_path_buf(),
            converter: config.conversion.build(),
            encoder,
            sink,
            scratch,
            stats: SessionStats::default(),
        })
    }

    fn encode(&mut self, frame: &RasterFrame<'_>, pts: Option<u64>) -> Result<(i64, usize)> {
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(Error::format_mismatch(format!(
                "wrong image size: {}x{}, expected {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }

        let pts = match pts {
            Some(pts) => i64::try_from(pts)
                .map_err(|_| Error::format_mismatch(format!("pts {} out of range", pts)))?,
            None => self.encoder.frames_sent() as i64,
        };

        self.converter.convert(frame, self.scratch.planar_mut())?;

        let (picture, out) = self.scratch.split_mut();
        let sink = &mut self.sink;
        let stats = &mut self.stats;
        let encoded = self.encoder.encode(picture, pts, out, |packet| {
            sink.write(&packet)?;
            stats.record(&packet);
            Ok(())
        });

        // A frame the codec took counts even if writing its packet failed
        self.stats.frames = self.encoder.frames_sent();
        Ok((pts, encoded?))
    }

    /**
        Drain the encoder and finalize the container.

        The trailer is attempted even when draining fails.
    */
    fn finish(self) -> Result<SessionStats> {
        let ActiveSession {
            encoder: mut video_encoder,
            mut sink,
            mut scratch,
            mut stats,
            ..
        } = self;

        let drained = video_encoder.flush(scratch.output_mut(), |packet| {
            sink.write(&packet)?;
            stats.record(&packet);
            Ok(())
        });
        drop(video_encoder);

        let finished = sink.finish();
        drained?;
        finished?;
        Ok(stats)
    }
}

/**
    Records timestamped raster frames into a compressed video file.

    A session is opened on a file, fed frames one at a time and closed. It
    can be reopened after closing. Dropping an open session closes it.

    Each session owns a [`DiagnosticLog`] and registers it as the process's
    active diagnostic recipient on creation and on every open. Only one log
    receives FFmpeg diagnostics at a time, so sessions running concurrently
    in one process see each other's codec messages.
*/
pub struct EncoderSession {
    state: EncoderState,
    log: DiagnosticLog,
    active: Option<ActiveSession>,
    last_stats: Option<SessionStats>,
}

impl EncoderSession {
    pub fn new() -> Self {
        Self::with_log(DiagnosticLog::new())
    }

    /**
        Create a session that writes diagnostics into an existing log.
    */
    pub fn with_log(log: DiagnosticLog) -> Self {
        diagnostics::register(&log);
        log_banner(&log);

        Self {
            state: EncoderState::Uninitialized,
            log,
            active: None,
            last_stats: None,
        }
    }

    /**
        Open `path` for writing with `config`.

        Fails with [`Error::InvalidState`] if the session is already open.
        Any other failure releases everything built so far, leaves an
        existing file at `path` untouched and resets the state to
        [`EncoderState::Uninitialized`].
    */
    pub fn open(&mut self, config: &EncoderConfig, path: impl AsRef<Path>) -> Result<()> {
        if self.state == EncoderState::Open {
            return Err(Error::invalid_state("session is already open"));
        }

        let path = path.as_ref();
        let opened = config
            .validate()
            .and_then(|()| ActiveSession::start(config, path, &self.log));

        match opened {
            Ok(active) => {
                diagnostics::register(&self.log);
                info!(
                    path = %path.display(),
                    width = config.width,
                    height = config.height,
                    fps = config.fps,
                    converter = active.converter.name(),
                    "session opened"
                );
                self.active = Some(active);
                self.last_stats = None;
                self.state = EncoderState::Open;
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "could not open session");
                self.log.log(&e.to_string());
                self.state = EncoderState::Uninitialized;
                Err(e)
            }
        }
    }

    /**
        Open with positional parameters, reporting failure as a message.

        An empty `format` means "use the file extension".
    */
    #[allow(clippy::too_many_arguments)]
    pub fn create_file(
        &mut self,
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
        bitrate: u64,
        gop: u32,
        fps: u32,
        format: &str,
    ) -> std::result::Result<(), String> {
        let mut config = EncoderConfig::new(width, height)
            .with_bitrate(bitrate)
            .with_gop(gop)
            .with_fps(fps);
        if !format.is_empty() {
            config = config.with_container_format(format);
        }
        self.open(&config, path).map_err(|e| e.to_string())
    }

    /**
        Encode `frame` at the next sequential timestamp.

        Returns the compressed size in bytes, or `-1` on failure.
    */
    pub fn encode(&mut self, frame: &RasterFrame<'_>) -> i64 {
        match self.try_encode(frame, None) {
            Ok(size) => size as i64,
            Err(_) => -1,
        }
    }

    /**
        Encode `frame` at `pts`, counted in units of `1/fps`.

        Timestamps must not decrease from one call to the next.
    */
    pub fn encode_with_pts(&mut self, frame: &RasterFrame<'_>, pts: u64) -> i64 {
        match self.try_encode(frame, Some(pts)) {
            Ok(size) => size as i64,
            Err(_) => -1,
        }
    }

    /**
        Encode one frame, returning the compressed size in bytes.

        Zero is a valid size while the codec buffers input. Errors leave the
        session open.
    */
    pub fn try_encode(&mut self, frame: &RasterFrame<'_>, pts: Option<u64>) -> Result<usize> {
        let Some(active) = self.active.as_mut() else {
            let e = Error::format_mismatch("session is not open");
            self.log.log(&e.to_string());
            return Err(e);
        };

        match active.encode(frame, pts) {
            Ok((pts, size)) => {
                self.log.log(&format!("PTS {} frame size: {}", pts, size));
                debug!(pts, size, "encoded frame");
                Ok(size)
            }
            Err(e) => {
                warn!(error = %e, "could not encode frame");
                self.log.log(&e.to_string());
                Err(e)
            }
        }
    }

    /**
        Flush, write the trailer and release everything.

        Returns the counters of the period that just ended.
    */
    pub fn finish(&mut self) -> Result<SessionStats> {
        let Some(active) = self.active.take() else {
            return Err(Error::invalid_state("session is not open"));
        };

        let path = active.path.clone();
        let finished = active.finish();
        diagnostics::deregister(&self.log);

        match finished {
            Ok(stats) => {
                info!(
                    path = %path.display(),
                    frames = stats.frames,
                    packets = stats.packets,
                    bytes = stats.bytes,
                    "session closed"
                );
                self.state = EncoderState::Closed;
                self.last_stats = Some(stats);
                Ok(stats)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "could not finalize output");
                self.log.log(&e.to_string());
                self.state = EncoderState::ClosedWithError;
                Err(e)
            }
        }
    }

    /**
        Close the session. Returns `false` if it was not open or finalizing
        the file failed.
    */
    pub fn close(&mut self) -> bool {
        self.finish().is_ok()
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == EncoderState::Open
    }

    /// Configured width, 0 when not open.
    pub fn width(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.config.width)
    }

    /// Configured height, 0 when not open.
    pub fn height(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.config.height)
    }

    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    pub fn frames_encoded(&self) -> u64 {
        self.active.as_ref().map_or(0, |a| a.stats.frames)
    }

    /**
        Counters of the open period, or of the last one after a clean close.
    */
    pub fn stats(&self) -> Option<SessionStats> {
        self.active.as_ref().map(|a| a.stats).or(self.last_stats)
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn log_text(&self) -> String {
        self.log.text()
    }
}

impl Default for EncoderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        if self.is_open() {
            self.close();
        }
        diagnostics::deregister(&self.log);
    }
}

impl std::fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderSession")
            .field("state", &self.state)
            .field("path", &self.path())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn note(log: &DiagnosticLog, text: &str) {
    warn!("{}", text);
    log.log(text);
}

fn log_banner(log: &DiagnosticLog) {
    let version = ffmpeg_next::format::version();
    log.log(&format!(
        "{} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    log.log(&format!("License: {}", ffmpeg_next::format::license()));
    log.log(&format!(
        "AVFormat version {}.{}.{}",
        version >> 16,
        (version >> 8) & 0xff,
        version & 0xff
    ));
    log.log(&format!(
        "AVFormat configuration: {}",
        ffmpeg_next::format::configuration()
    ));
}
