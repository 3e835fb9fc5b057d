/*!
    Media sink implementation.
*/

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::ptr;

use ffmpeg_next::{
    Rational as FFmpegRational, codec::Parameters, ffi, format,
    format::context::Output as OutputContext, media,
};
use tracing::{debug, info};

use ffmpeg_types::{
    CodecId, CompressedPacket, Error, PixelFormat, Rational, Result, VideoStreamInfo,
};

use crate::container::ContainerFormat;

/**
    Media sink for writing one video stream to a container file.

    Creating the sink only allocates the muxer context. The file itself is
    opened by [`write_header`](Self::write_header), so a sink abandoned
    before that never touches the disk. The caller adds the stream, writes
    the header, feeds packets and calls [`finish`](Self::finish). Dropping an
    unfinished sink closes the file without a trailer.
*/
pub struct Sink {
    output: OutputContext,
    path: PathBuf,
    url: String,
    format: ContainerFormat,
    video_stream_index: Option<usize>,
    video_time_base: Option<Rational>,
    header_written: bool,
}

impl Sink {
    /**
        Create a sink writing `format` to the file at `path`.
    */
    pub fn create<P: AsRef<Path>>(path: P, format: ContainerFormat) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::resource(e.to_string()))?;

        let path = path.as_ref();
        let url = path.display().to_string();
        let c_url = c_string(&url)?;
        let c_muxer = c_string(format.muxer_name())?;

        let output = unsafe {
            let mut ctx = ptr::null_mut();
            let ret = ffi::avformat_alloc_output_context2(
                &mut ctx,
                ptr::null(),
                c_muxer.as_ptr(),
                c_url.as_ptr(),
            );
            if ret < 0 || ctx.is_null() {
                return Err(Error::configuration(format!(
                    "could not allocate {} muxer: {}",
                    format,
                    ffmpeg_next::Error::from(ret)
                )));
            }
            OutputContext::wrap(ctx)
        };

        debug!(path = %url, muxer = format.muxer_name(), "created output context");

        Ok(Self {
            output,
            path: path.to_path_buf(),
            url,
            format,
            video_stream_index: None,
            video_time_base: None,
            header_written: false,
        })
    }

    pub fn format(&self) -> &ContainerFormat {
        &self.format
    }

    /**
        Video codec the muxer would pick by default.
    */
    pub fn preferred_video_codec(&self) -> CodecId {
        codec_id_from_ffmpeg(self.output.format().codec(&self.path, media::Type::Video))
    }

    /**
        Whether the muxer wants codec headers as extradata.
    */
    pub fn requires_global_header(&self) -> bool {
        self.output
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER)
    }

    /**
        Add the video stream. Only one is supported.
    */
    pub fn add_video_stream(&mut self, info: &VideoStreamInfo) -> Result<usize> {
        if self.video_stream_index.is_some() {
            return Err(Error::invalid_state("video stream already added"));
        }
        if self.header_written {
            return Err(Error::invalid_state("header already written"));
        }

        let codec_id = codec_id_to_ffmpeg_video(info.codec_id)?;
        let codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            Error::compression(format!("video codec {} not found", info.codec_id))
        })?;

        let mut stream = self
            .output
            .add_stream(codec)
            .map_err(|e| Error::resource(format!("could not allocate stream: {}", e)))?;

        let params = stream.parameters();
        set_video_parameters(&params, codec_id, info)?;

        stream.set_time_base(FFmpegRational::new(info.time_base.num, info.time_base.den));

        let index = stream.index();
        self.video_stream_index = Some(index);
        self.video_time_base = Some(info.time_base);
        Ok(index)
    }

    /**
        Print the muxer layout through FFmpeg's logger.
    */
    pub fn dump(&self) {
        format::context::output::dump(&self.output, 0, Some(&self.url));
    }

    /**
        Open the output file and write the container header.

        The muxer may replace the stream time base here, so packets must be
        rescaled against [`video_time_base`](Self::video_time_base) afterwards.
        If the header cannot be written, a file created by this call is
        removed again. A file that already existed is left in place.
    */
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Err(Error::invalid_state("header already written"));
        }
        let index = self
            .video_stream_index
            .ok_or_else(|| Error::invalid_state("no video stream configured"))?;

        let created = self.open_file()?;
        if let Err(e) = self.output.write_header() {
            self.close_file();
            if created {
                if let Err(remove_err) = std::fs::remove_file(&self.path) {
                    debug!(path = %self.url, error = %remove_err, "could not remove partial output");
                }
            }
            return Err(Error::io(format!("could not write header: {}", e)));
        }
        self.header_written = true;

        if let Some(stream) = self.output.stream(index) {
            let tb = stream.time_base();
            self.video_time_base = Some(Rational::new(tb.numerator(), tb.denominator()));
        }

        info!(
            path = %self.url,
            muxer = self.format.muxer_name(),
            time_base = ?self.video_time_base,
            "wrote container header"
        );
        Ok(())
    }

    /**
        Open the IO context unless the muxer does its own IO. Returns whether
        the file did not exist before.
    */
    fn open_file(&mut self) -> Result<bool> {
        if self.output.format().flags().contains(format::Flags::NO_FILE) {
            return Ok(false);
        }

        let existed = self.path.exists();
        let c_url = c_string(&self.url)?;
        let ret = unsafe {
            let ctx = self.output.as_mut_ptr();
            ffi::avio_open(&mut (*ctx).pb, c_url.as_ptr(), ffi::AVIO_FLAG_WRITE as i32)
        };
        if ret < 0 {
            return Err(Error::io(format!(
                "could not open '{}': {}",
                self.url,
                ffmpeg_next::Error::from(ret)
            )));
        }

        debug!(path = %self.url, "opened output file");
        Ok(!existed)
    }

    fn close_file(&mut self) {
        unsafe {
            let ctx = self.output.as_mut_ptr();
            if !(*ctx).pb.is_null() {
                ffi::avio_closep(&mut (*ctx).pb);
            }
        }
    }

    /**
        Time base of the video stream as chosen by the muxer.
    */
    pub fn video_time_base(&self) -> Option<Rational> {
        self.video_time_base
    }

    /**
        Write a packet with interleaving.

        Timestamps are rescaled from the packet's time base to the stream's.
    */
    pub fn write(&mut self, packet: &CompressedPacket<'_>) -> Result<()> {
        if !self.header_written {
            return Err(Error::invalid_state("header not written"));
        }
        let (Some(stream_index), Some(stream_time_base)) =
            (self.video_stream_index, self.video_time_base)
        else {
            return Err(Error::invalid_state("no video stream configured"));
        };

        let packet = packet.rescaled(stream_time_base);

        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(packet.data)
        };

        ffmpeg_pkt.set_stream(stream_index);
        ffmpeg_pkt.set_pts(packet.pts.map(|p| p.0));
        ffmpeg_pkt.set_dts(packet.dts.map(|p| p.0));
        ffmpeg_pkt.set_duration(packet.duration);

        if packet.is_keyframe {
            ffmpeg_pkt.set_flags(ffmpeg_next::packet::Flags::KEY);
        }

        ffmpeg_pkt
            .write_interleaved(&mut self.output)
            .map_err(|e| Error::io(format!("could not write frame: {}", e)))?;

        Ok(())
    }

    /**
        Finish writing and close the sink.

        This writes any trailing metadata (duration, seeking index) and
        finalizes the container. The file may be corrupt if this is not called.
    */
    pub fn finish(mut self) -> Result<()> {
        if !self.header_written {
            return Err(Error::invalid_state("header not written"));
        }

        self.output
            .write_trailer()
            .map_err(|e| Error::io(format!("could not write trailer: {}", e)))?;

        debug!(path = %self.url, "wrote container trailer");
        Ok(())
    }
}

/**
    Convert our video CodecId to FFmpeg's codec ID.
*/
fn codec_id_to_ffmpeg_video(codec: CodecId) -> Result<ffmpeg_next::codec::Id> {
    use ffmpeg_next::codec::Id;

    match codec {
        CodecId::Mpeg1Video => Ok(Id::MPEG1VIDEO),
        CodecId::Mpeg2Video => Ok(Id::MPEG2VIDEO),
        CodecId::Mpeg4 => Ok(Id::MPEG4),
        CodecId::H264 => Ok(Id::H264),
        CodecId::H265 => Ok(Id::HEVC),
        CodecId::Vp8 => Ok(Id::VP8),
        CodecId::Vp9 => Ok(Id::VP9),
        CodecId::Av1 => Ok(Id::AV1),
        CodecId::Mjpeg => Ok(Id::MJPEG),
        CodecId::Flv1 => Ok(Id::FLV1),
        CodecId::Theora => Ok(Id::THEORA),
        _ => Err(Error::configuration(format!(
            "video codec {} not supported for muxing",
            codec
        ))),
    }
}

/**
    Convert FFmpeg's codec ID to ours.
*/
fn codec_id_from_ffmpeg(id: ffmpeg_next::codec::Id) -> CodecId {
    use ffmpeg_next::codec::Id;

    match id {
        Id::MPEG1VIDEO => CodecId::Mpeg1Video,
        Id::MPEG2VIDEO => CodecId::Mpeg2Video,
        Id::MPEG4 => CodecId::Mpeg4,
        Id::H264 => CodecId::H264,
        Id::HEVC => CodecId::H265,
        Id::VP8 => CodecId::Vp8,
        Id::VP9 => CodecId::Vp9,
        Id::AV1 => CodecId::Av1,
        Id::MJPEG => CodecId::Mjpeg,
        Id::FLV1 => CodecId::Flv1,
        Id::THEORA => CodecId::Theora,
        _ => CodecId::Other,
    }
}

fn c_string(text: &str) -> Result<CString> {
    CString::new(text).map_err(|_| Error::configuration(format!("'{}' contains a NUL byte", text)))
}

/**
    Set video stream parameters.
*/
fn set_video_parameters(
    params: &Parameters,
    codec_id: ffmpeg_next::codec::Id,
    info: &VideoStreamInfo,
) -> Result<()> {
    unsafe {
        let ptr = params.as_ptr() as *mut ffi::AVCodecParameters;

        (*ptr).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_VIDEO;
        (*ptr).codec_id = codec_id.into();
        // Let the muxer choose the fourcc
        (*ptr).codec_tag = 0;

        (*ptr).width = info.width as i32;
        (*ptr).height = info.height as i32;

        (*ptr).format = match info.pixel_format {
            PixelFormat::Yuv420p => ffi::AVPixelFormat::AV_PIX_FMT_YUV420P as i32,
            PixelFormat::Nv12 => ffi::AVPixelFormat::AV_PIX_FMT_NV12 as i32,
            other => {
                return Err(Error::configuration(format!(
                    "pixel format {} cannot be muxed",
                    other
                )));
            }
        };

        // Extradata needs FFmpeg's zeroed input padding after it
        if let Some(ref extradata) = info.extradata {
            if !extradata.is_empty() {
                let alloc_size = extradata.len() + ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize;
                let buf = ffi::av_mallocz(alloc_size) as *mut u8;
                if buf.is_null() {
                    return Err(Error::resource("could not allocate stream extradata"));
                }
                std::ptr::copy_nonoverlapping(extradata.as_ptr(), buf, extradata.len());
                (*ptr).extradata = buf;
                (*ptr).extradata_size = extradata.len() as i32;
            }
        }

        if let Some(bitrate) = info.bitrate {
            (*ptr).bit_rate = bitrate as i64;
        }
    }

    Ok(())
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("url", &self.url)
            .field("format", &self.format)
            .field("video_stream", &self.video_stream_index)
            .field("header_written", &self.header_written)
            .finish_non_exhaustive()
    }
}
