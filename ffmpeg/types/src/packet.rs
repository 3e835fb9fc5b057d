/*!
    Compressed packet type.
*/

use crate::{Pts, Rational};

/**
    One compressed access unit produced by the encoder.

    The payload is borrowed from the encoder's output buffer and is only valid
    until the next encode call, so packets are handed to the muxer right away
    rather than retained.
*/
#[derive(Clone, Copy, Debug)]
pub struct CompressedPacket<'a> {
    /// Compressed bytes.
    pub data: &'a [u8],
    /// Presentation timestamp, `None` when the encoder left it unset.
    pub pts: Option<Pts>,
    /// Decoding timestamp.
    pub dts: Option<Pts>,
    /// Duration in `time_base` units (0 = unknown).
    pub duration: i64,
    /// Time base of `pts`, `dts` and `duration`.
    pub time_base: Rational,
    /// Whether the encoder classified this packet as a key frame.
    pub is_keyframe: bool,
}

impl<'a> CompressedPacket<'a> {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /**
        Returns the same packet with its timestamps expressed in `time_base`.
    */
    pub fn rescaled(self, time_base: Rational) -> Self {
        let from = self.time_base;
        Self {
            pts: self.pts.map(|p| p.rescale(from, time_base)),
            dts: self.dts.map(|p| p.rescale(from, time_base)),
            duration: crate::rescale_ts(self.duration, from, time_base),
            time_base,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescaled_keeps_payload_and_flag() {
        let payload = [0u8, 0, 1, 0xB6];
        let packet = CompressedPacket {
            data: &payload,
            pts: Some(Pts(3)),
            dts: None,
            duration: 1,
            time_base: Rational::per_frame(25),
            is_keyframe: true,
        };

        let out = packet.rescaled(Rational::new(1, 90000));
        assert_eq!(out.pts, Some(Pts(10800)));
        assert_eq!(out.dts, None);
        assert_eq!(out.duration, 3600);
        assert_eq!(out.time_base, Rational::new(1, 90000));
        assert!(out.is_keyframe);
        assert_eq!(out.size(), 4);
    }
}
