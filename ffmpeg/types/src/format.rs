/*!
    Pixel format types.
*/

use std::fmt;

/**
    Video pixel formats.

    The two 32-bit RGB layouts store each pixel as a native-endian `0xAARRGGBB`
    word, so on little-endian machines the bytes are laid out `B, G, R, A`.
    `Rgb32` has an undefined alpha byte, `Argb32` carries alpha that the
    encoder ignores.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Packed 32-bit RGB, alpha byte unused
    Rgb32,
    /// Packed 32-bit ARGB, alpha ignored by the encoder
    Argb32,
    /// Packed RGBA byte order, 32bpp
    Rgba,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Planar YUV 4:2:0, 12bpp (most common video format)
    Yuv420p,
    /// Semi-planar YUV 4:2:0, 12bpp
    Nv12,
}

impl PixelFormat {
    /**
        Returns the number of bits per pixel for this format.

        For planar formats, this is the average bits per pixel.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Yuv420p | Self::Nv12 => 12,
            Self::Rgb24 | Self::Bgr24 => 24,
            Self::Rgb32 | Self::Argb32 | Self::Rgba => 32,
        }
    }

    /**
        Bytes per pixel for packed formats, `None` for planar ones.
    */
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Rgb32 | Self::Argb32 | Self::Rgba => Some(4),
            Self::Rgb24 | Self::Bgr24 => Some(3),
            Self::Yuv420p | Self::Nv12 => None,
        }
    }

    /**
        Returns true if this is a planar format.
    */
    pub const fn is_planar(self) -> bool {
        matches!(self, Self::Yuv420p | Self::Nv12)
    }

    /**
        Returns true for the two layouts the encoder accepts as input.
    */
    pub const fn is_encoder_input(self) -> bool {
        matches!(self, Self::Rgb32 | Self::Argb32)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgb32 => "rgb32",
            Self::Argb32 => "argb32",
            Self::Rgba => "rgba",
            Self::Rgb24 => "rgb24",
            Self::Bgr24 => "bgr24",
            Self::Yuv420p => "yuv420p",
            Self::Nv12 => "nv12",
        };
        f.write_str(name)
    }
}
