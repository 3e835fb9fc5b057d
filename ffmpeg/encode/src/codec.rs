/*!
    Codec identifier mapping and substitution policy.
*/

use ffmpeg_next::codec::Id as CodecIdFFmpeg;

use ffmpeg_types::{CodecId, Error, Result};

/**
    Pick the codec to actually encode with, given a container's preference.

    H.264 is swapped for MPEG-4 Part 2; everything else is kept.
*/
pub fn substitute_codec(preferred: CodecId) -> CodecId {
    match preferred {
        CodecId::H264 => CodecId::Mpeg4,
        other => other,
    }
}

/**
    Convert our CodecId to FFmpeg's codec ID.
*/
pub(crate) fn codec_id_to_ffmpeg(codec: CodecId) -> Result<CodecIdFFmpeg> {
    match codec {
        CodecId::Mpeg1Video => Ok(CodecIdFFmpeg::MPEG1VIDEO),
        CodecId::Mpeg2Video => Ok(CodecIdFFmpeg::MPEG2VIDEO),
        CodecId::Mpeg4 => Ok(CodecIdFFmpeg::MPEG4),
        CodecId::H264 => Ok(CodecIdFFmpeg::H264),
        CodecId::H265 => Ok(CodecIdFFmpeg::HEVC),
        CodecId::Vp8 => Ok(CodecIdFFmpeg::VP8),
        CodecId::Vp9 => Ok(CodecIdFFmpeg::VP9),
        CodecId::Av1 => Ok(CodecIdFFmpeg::AV1),
        CodecId::Mjpeg => Ok(CodecIdFFmpeg::MJPEG),
        CodecId::Flv1 => Ok(CodecIdFFmpeg::FLV1),
        CodecId::Theora => Ok(CodecIdFFmpeg::THEORA),
        _ => Err(Error::compression(format!(
            "video codec {} not supported for encoding",
            codec
        ))),
    }
}
