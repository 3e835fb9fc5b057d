/*!
    Codec identifiers.
*/

use std::fmt;

/**
    Video codecs the ecosystem knows by name.

    Anything else reported by FFmpeg is carried as `Other` and cannot be
    opened for encoding.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    Mpeg1Video,
    Mpeg2Video,
    Mpeg4,
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
    Mjpeg,
    Flv1,
    Theora,
    Other,
}

impl CodecId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mpeg1Video => "mpeg1video",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg4 => "mpeg4",
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::Mjpeg => "mjpeg",
            Self::Flv1 => "flv1",
            Self::Theora => "theora",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
