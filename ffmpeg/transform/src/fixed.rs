/*!
    Fixed-point RGB to YUV 4:2:0 conversion.
*/

use ffmpeg_types::{PlanarYuvFrame, RasterFrame, Result};

use crate::convert::{PixelConverter, check_frame};

/**
    BT.601 full range RGB to studio range YUV with 13-bit fixed-point rounding.

    Luma is computed per pixel. Chroma is computed once per 2x2 block from the
    rounded average of its four pixels. Pixels are read as `B, G, R, A` bytes,
    the in-memory order of a little-endian `0xAARRGGBB` word.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedPointConverter;

impl FixedPointConverter {
    pub fn new() -> Self {
        Self
    }
}

/// Luma from 8-bit RGB, in `16..=235`.
#[inline]
pub(crate) fn luma(r: u32, g: u32, b: u32) -> u8 {
    let y = (2104 * r + 4130 * g + 802 * b + 4096 + 131072) >> 13;
    y.min(235) as u8
}

/// Blue-difference chroma from 8-bit RGB, in `16..=240`.
#[inline]
pub(crate) fn chroma_b(r: i32, g: i32, b: i32) -> u8 {
    ((-1214 * r - 2384 * g + 3598 * b + 4096 + 1048576) >> 13).clamp(16, 240) as u8
}

/// Red-difference chroma from 8-bit RGB, in `16..=240`.
#[inline]
pub(crate) fn chroma_r(r: i32, g: i32, b: i32) -> u8 {
    ((3598 * r - 3013 * g - 585 * b + 4096 + 1048576) >> 13).clamp(16, 240) as u8
}

impl PixelConverter for FixedPointConverter {
    fn convert(&mut self, frame: &RasterFrame<'_>, dst: &mut PlanarYuvFrame) -> Result<()> {
        check_frame(frame, dst)?;

        let width = frame.width as usize;
        let height = frame.height as usize;
        let chroma_width = dst.chroma_width();
        let chroma_height = dst.chroma_height();
        let (y_plane, u_plane, v_plane) = dst.planes_mut();

        for y in 0..height {
            let src = frame.row(y);
            let dst_row = &mut y_plane[y * width..(y + 1) * width];
            for (px, out) in src.chunks_exact(4).zip(dst_row.iter_mut()) {
                *out = luma(px[2] as u32, px[1] as u32, px[0] as u32);
            }
        }

        for cy in 0..chroma_height {
            let top = frame.row(cy * 2);
            let bottom = frame.row(cy * 2 + 1);
            for cx in 0..chroma_width {
                let o = cx * 8;
                let avg = |c: usize| {
                    let sum = top[o + c] as i32
                        + top[o + 4 + c] as i32
                        + bottom[o + c] as i32
                        + bottom[o + 4 + c] as i32;
                    (sum + 2) >> 2
                };
                let (r, g, b) = (avg(2), avg(1), avg(0));

                let i = cy * chroma_width + cx;
                u_plane[i] = chroma_b(r, g, b);
                v_plane[i] = chroma_r(r, g, b);
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "fixed-point"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::{Error, PixelFormat};

    fn solid(width: u32, height: u32, r: u8, g: u8, b: u8) -> Vec<u8> {
        [b, g, r, 0xFF].repeat((width * height) as usize)
    }

    fn convert(data: &[u8], width: u32, height: u32) -> PlanarYuvFrame {
        let frame = RasterFrame::packed(data, width, height, PixelFormat::Rgb32).unwrap();
        let mut dst = PlanarYuvFrame::try_new(width, height).unwrap();
        FixedPointConverter::new().convert(&frame, &mut dst).unwrap();
        dst
    }

    #[test]
    fn white_and_black_hit_studio_range_limits() {
        let white = convert(&solid(16, 16, 255, 255, 255), 16, 16);
        assert!(white.y().iter().all(|&s| s == 235));
        assert!(white.u().iter().all(|&s| s == 128));
        assert!(white.v().iter().all(|&s| s == 128));

        let black = convert(&solid(16, 16, 0, 0, 0), 16, 16);
        assert!(black.y().iter().all(|&s| s == 16));
        assert!(black.u().iter().all(|&s| s == 128));
        assert!(black.v().iter().all(|&s| s == 128));
    }

    #[test]
    fn primaries_shift_chroma_the_right_way() {
        let red = convert(&solid(4, 4, 255, 0, 0), 4, 4);
        assert!(red.v()[0] > 200);
        assert!(red.u()[0] < 128);

        let blue = convert(&solid(4, 4, 0, 0, 255), 4, 4);
        assert!(blue.u()[0] > 200);
        assert!(blue.v()[0] < 128);
    }

    #[test]
    fn planes_are_sized_and_in_range_for_any_even_size() {
        for (width, height) in [(2, 2), (4, 6), (16, 8), (64, 64), (62, 34)] {
            let data: Vec<u8> = (0..width * height * 4)
                .map(|i| (i.wrapping_mul(2654435761) >> 7) as u8)
                .collect();
            let yuv = convert(&data, width, height);

            let chroma = (width / 2 * (height / 2)) as usize;
            assert_eq!(yuv.y().len(), (width * height) as usize);
            assert_eq!(yuv.u().len(), chroma);
            assert_eq!(yuv.v().len(), chroma);
            assert!(yuv.y().iter().all(|&s| (16..=235).contains(&s)));
            assert!(yuv.u().iter().all(|&s| (16..=240).contains(&s)));
            assert!(yuv.v().iter().all(|&s| (16..=240).contains(&s)));
        }
    }

    #[test]
    fn chroma_averages_each_block() {
        // 2x2 block: two white pixels on top, two black below -> mid gray
        let mut data = solid(2, 2, 255, 255, 255);
        data[8..].fill(0);
        let yuv = convert(&data, 2, 2);
        assert_eq!(yuv.y(), &[235, 235, 16, 16]);
        assert_eq!(yuv.u(), &[128]);
        assert_eq!(yuv.v(), &[128]);
    }

    #[test]
    fn row_padding_is_ignored() {
        let tight = solid(4, 4, 10, 200, 90);
        let stride = 4 * 4 + 12;
        let mut padded = vec![0xABu8; stride * 4];
        for y in 0..4 {
            padded[y * stride..y * stride + 16].copy_from_slice(&tight[y * 16..(y + 1) * 16]);
        }

        let frame = RasterFrame::new(&padded, 4, 4, stride, PixelFormat::Argb32).unwrap();
        let mut dst = PlanarYuvFrame::try_new(4, 4).unwrap();
        FixedPointConverter::new().convert(&frame, &mut dst).unwrap();

        assert_eq!(dst, convert(&tight, 4, 4));
    }

    #[test]
    fn rejects_mismatched_frames() {
        let data = solid(8, 8, 0, 0, 0);
        let frame = RasterFrame::packed(&data, 8, 8, PixelFormat::Rgb32).unwrap();
        let mut dst = PlanarYuvFrame::try_new(16, 16).unwrap();
        let err = FixedPointConverter::new().convert(&frame, &mut dst).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch(_)));
    }
}
