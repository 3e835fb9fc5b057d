/*!
    Video encoder implementation.
*/

use std::slice;

use ffmpeg_next::{
    Rational as FFmpegRational,
    codec::{self, threading},
    ffi,
    format::Pixel,
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::{debug, info};

use ffmpeg_types::{
    CodecId, CompressedPacket, Error, PixelFormat, PlanarYuvFrame, Pts, Rational, Result,
    VideoStreamInfo,
};

use crate::codec::codec_id_to_ffmpeg;
use crate::config::EncoderSettings;

/**
    Video encoder.

    Encodes planar YUV pictures into compressed packets. Packets are copied
    into a caller-provided output buffer and handed to a callback one at a
    time, so nothing is retained between calls.
*/
pub struct VideoEncoder {
    encoder: ffmpeg_next::encoder::Video,
    codec: CodecId,
    width: u32,
    height: u32,
    frame_rate: Rational,
    time_base: Rational,
    bitrate: u64,
    extradata: Option<Vec<u8>>,
    frames_sent: u64,
}

impl VideoEncoder {
    /**
        Configure and open an encoder.
    */
    pub fn open(settings: &EncoderSettings) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::compression(e.to_string()))?;

        if settings.pixel_format != PixelFormat::Yuv420p {
            return Err(Error::configuration(format!(
                "encoder input must be yuv420p, got {}",
                settings.pixel_format
            )));
        }

        // Find the codec
        let codec_id = codec_id_to_ffmpeg(settings.codec)?;
        let codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| Error::compression(format!("codec not found: {}", settings.codec)))?;

        // Create encoder context
        let encoder_ctx = codec::context::Context::new_with_codec(codec);
        let mut encoder = encoder_ctx
            .encoder()
            .video()
            .map_err(|e| Error::resource(format!("cannot allocate codec context: {}", e)))?;

        encoder.set_width(settings.width);
        encoder.set_height(settings.height);
        encoder.set_format(Pixel::YUV420P);

        let time_base = settings.time_base();
        encoder.set_time_base(FFmpegRational::new(time_base.num, time_base.den));
        encoder.set_frame_rate(Some(FFmpegRational::new(
            settings.frame_rate.num,
            settings.frame_rate.den,
        )));

        encoder.set_gop(settings.gop);
        encoder.set_bit_rate(settings.bitrate as usize);
        encoder.set_tolerance(settings.bitrate_tolerance() as usize);
        encoder.set_threading(threading::Config::count(settings.threads));

        // Some containers want stream headers out of band
        if settings.global_header {
            encoder.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder
            .open()
            .map_err(|e| Error::compression(format!("could not open codec: {}", e)))?;

        let extradata = unsafe {
            let ctx = encoder.as_ptr();
            if (*ctx).extradata.is_null() || (*ctx).extradata_size <= 0 {
                None
            } else {
                Some(
                    slice::from_raw_parts((*ctx).extradata, (*ctx).extradata_size as usize)
                        .to_vec(),
                )
            }
        };

        info!(
            codec = %settings.codec,
            width = settings.width,
            height = settings.height,
            bitrate = settings.bitrate,
            gop = settings.gop,
            "opened video encoder"
        );

        Ok(Self {
            encoder,
            codec: settings.codec,
            width: settings.width,
            height: settings.height,
            frame_rate: settings.frame_rate,
            time_base,
            bitrate: settings.bitrate,
            extradata,
            frames_sent: 0,
        })
    }

    /**
        Get the time base for encoded packets.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn codec(&self) -> CodecId {
        self.codec
    }

    /**
        Number of frames accepted by the codec so far.
    */
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /**
        Get stream info for the muxer.
    */
    pub fn stream_info(&self) -> VideoStreamInfo {
        VideoStreamInfo {
            width: self.width,
            height: self.height,
            pixel_format: PixelFormat::Yuv420p,
            frame_rate: Some(self.frame_rate),
            time_base: self.time_base,
            codec_id: self.codec,
            extradata: self.extradata.clone(),
            bitrate: Some(self.bitrate),
        }
    }

    /**
        Encode a picture at `pts` (in [`time_base`](Self::time_base) units).

        Every packet the codec emits is copied into `out` and passed to
        `on_packet`. Returns the number of compressed bytes produced, which is
        zero while the codec is still buffering.
    */
    pub fn encode<F>(
        &mut self,
        picture: &PlanarYuvFrame,
        pts: i64,
        out: &mut [u8],
        on_packet: F,
    ) -> Result<usize>
    where
        F: FnMut(CompressedPacket<'_>) -> Result<()>,
    {
        if picture.width() != self.width || picture.height() != self.height {
            return Err(Error::format_mismatch(format!(
                "picture dimensions {}x{} don't match encoder {}x{}",
                picture.width(),
                picture.height(),
                self.width,
                self.height
            )));
        }

        let mut frame = VideoFrameFFmpeg::new(Pixel::YUV420P, self.width, self.height);
        copy_planar_to_ffmpeg_frame(&mut frame, picture);
        frame.set_pts(Some(pts));

        self.encoder
            .send_frame(&frame)
            .map_err(|e| Error::compression(format!("failed to send frame: {}", e)))?;
        self.frames_sent += 1;

        self.receive_packets(out, on_packet)
    }

    /**
        Flush the encoder to get any remaining buffered packets.

        Call this at end of stream.
    */
    pub fn flush<F>(&mut self, out: &mut [u8], on_packet: F) -> Result<usize>
    where
        F: FnMut(CompressedPacket<'_>) -> Result<()>,
    {
        self.encoder
            .send_eof()
            .map_err(|e| Error::compression(format!("failed to flush encoder: {}", e)))?;

        self.receive_packets(out, on_packet)
    }

    /**
        Receive all available packets from the encoder.
    */
    fn receive_packets<F>(&mut self, out: &mut [u8], mut on_packet: F) -> Result<usize>
    where
        F: FnMut(CompressedPacket<'_>) -> Result<()>,
    {
        let mut produced = 0;
        let mut encoded_pkt = ffmpeg_next::Packet::empty();

        loop {
            match self.encoder.receive_packet(&mut encoded_pkt) {
                Ok(()) => {
                    let data = encoded_pkt.data().unwrap_or_default();
                    if data.len() > out.len() {
                        return Err(Error::compression(format!(
                            "packet of {} bytes exceeds the {} byte output buffer",
                            data.len(),
                            out.len()
                        )));
                    }
                    out[..data.len()].copy_from_slice(data);

                    let packet = CompressedPacket {
                        data: &out[..data.len()],
                        pts: encoded_pkt.pts().map(Pts),
                        dts: encoded_pkt.dts().map(Pts),
                        duration: encoded_pkt.duration(),
                        time_base: self.time_base,
                        is_keyframe: encoded_pkt.is_key(),
                    };
                    debug!(
                        size = packet.size(),
                        pts = ?packet.pts,
                        key = packet.is_keyframe,
                        "received packet"
                    );

                    produced += packet.size();
                    on_packet(packet)?;
                }
                Err(ffmpeg_next::Error::Other { errno })
                    if errno == ffi::EAGAIN || errno == ffi::AVERROR(ffi::EAGAIN) =>
                {
                    break;
                }
                Err(ffmpeg_next::Error::Eof) => {
                    break;
                }
                Err(e) => {
                    return Err(Error::compression(e.to_string()));
                }
            }
        }

        Ok(produced)
    }
}

/**
    Copy a tight YUV 4:2:0 picture into an FFmpeg frame with padded strides.
*/
fn copy_planar_to_ffmpeg_frame(dst: &mut VideoFrameFFmpeg, src: &PlanarYuvFrame) {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let planes = [
        (src.y(), width, height),
        (src.u(), src.chroma_width(), src.chroma_height()),
        (src.v(), src.chroma_width(), src.chroma_height()),
    ];

    for (index, (plane, plane_width, plane_height)) in planes.into_iter().enumerate() {
        let stride = dst.stride(index);
        let data = dst.data_mut(index);
        for row in 0..plane_height {
            let dst_start = row * stride;
            data[dst_start..dst_start + plane_width]
                .copy_from_slice(&plane[row * plane_width..(row + 1) * plane_width]);
        }
    }
}

impl std::fmt::Debug for VideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoEncoder")
            .field("codec", &self.codec)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EncoderSettings {
        EncoderSettings::new(CodecId::Mpeg4, 64, 64, Rational::new(25, 1))
            .with_bitrate(400_000)
            .with_gop(12)
    }

    fn gray(shade: u8) -> PlanarYuvFrame {
        let mut picture = PlanarYuvFrame::try_new(64, 64).unwrap();
        let (y, u, v) = picture.planes_mut();
        y.fill(shade);
        u.fill(128);
        v.fill(128);
        picture
    }

    #[test]
    fn encodes_key_frame_first_and_flushes() {
        let mut encoder = VideoEncoder::open(&settings()).unwrap();
        assert_eq!(encoder.time_base(), Rational::new(1, 25));

        let mut out = vec![0u8; 64 * 64 * 3];
        let mut packets: Vec<(Option<Pts>, bool)> = Vec::new();
        let mut total = 0;

        for i in 0..25 {
            let picture = gray(16 + i as u8 * 8);
            total += encoder
                .encode(&picture, i, &mut out, |p| {
                    packets.push((p.pts, p.is_keyframe));
                    Ok(())
                })
                .unwrap();
        }
        total += encoder
            .flush(&mut out, |p| {
                packets.push((p.pts, p.is_keyframe));
                Ok(())
            })
            .unwrap();

        assert_eq!(encoder.frames_sent(), 25);
        assert_eq!(packets.len(), 25);
        assert!(total > 0);
        assert!(packets[0].1, "first packet must be a key frame");
        assert!(packets.iter().filter(|p| p.1).count() >= 2);
    }

    #[test]
    fn rejects_wrong_picture_size() {
        let mut encoder = VideoEncoder::open(&settings()).unwrap();
        let picture = PlanarYuvFrame::try_new(32, 32).unwrap();
        let mut out = vec![0u8; 64 * 64 * 3];
        let err = encoder.encode(&picture, 0, &mut out, |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch(_)));
        assert_eq!(encoder.frames_sent(), 0);
    }

    #[test]
    fn callback_errors_propagate() {
        let mut encoder = VideoEncoder::open(&settings()).unwrap();
        let mut out = vec![0u8; 64 * 64 * 3];
        let err = encoder
            .encode(&gray(100), 0, &mut out, |_| Err(Error::io("disk full")))
            .unwrap_err();
        assert_eq!(err, Error::io("disk full"));
    }

    #[test]
    fn frame_counts_as_sent_when_its_packet_is_refused() {
        let mut encoder = VideoEncoder::open(&settings()).unwrap();
        let mut out = vec![0u8; 64 * 64 * 3];

        assert!(
            encoder
                .encode(&gray(100), 0, &mut out, |_| Err(Error::io("disk full")))
                .is_err()
        );
        assert_eq!(encoder.frames_sent(), 1);

        // The next timestamp follows the refused frame, so the codec accepts it
        let next = encoder.frames_sent() as i64;
        let mut keys = Vec::new();
        encoder
            .encode(&gray(120), next, &mut out, |p| {
                keys.push(p.is_keyframe);
                Ok(())
            })
            .unwrap();
        assert_eq!(encoder.frames_sent(), 2);
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn stream_info_reflects_settings() {
        let encoder = VideoEncoder::open(&settings()).unwrap();
        let info = encoder.stream_info();
        assert_eq!(info.codec_id, CodecId::Mpeg4);
        assert_eq!((info.width, info.height), (64, 64));
        assert_eq!(info.time_base, Rational::new(1, 25));
        assert_eq!(info.bitrate, Some(400_000));
    }

    #[test]
    fn unknown_codec_fails_to_open() {
        let settings = EncoderSettings::new(CodecId::Other, 64, 64, Rational::new(25, 1));
        assert!(matches!(
            VideoEncoder::open(&settings),
            Err(Error::Compression(_))
        ));
    }
}
