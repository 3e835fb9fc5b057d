/*!
    Timestamp and time base types.
*/

use std::fmt;

/**
    A rational number, used for time bases and frame rates.

    A time base of `1/25` means one timestamp tick is 1/25th of a second.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        The time base of a constant-rate stream at `fps` frames per second.
    */
    pub const fn per_frame(fps: i32) -> Self {
        Self { num: 1, den: fps }
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /**
        Returns the reciprocal (e.g. frame rate from a time base).
    */
    pub const fn invert(self) -> Self {
        Self {
            num: self.den,
            den: self.num,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/**
    Presentation timestamp in units of some [`Rational`] time base.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    pub fn rescale(self, from: Rational, to: Rational) -> Self {
        Self(rescale_ts(self.0, from, to))
    }
}

/**
    Rescale a timestamp from one time base to another.

    Rounds to the nearest tick, halfway cases away from zero. Both time bases
    must have non-zero numerator and denominator; a degenerate conversion
    returns the timestamp unchanged.
*/
pub fn rescale_ts(ts: i64, from: Rational, to: Rational) -> i64 {
    if from == to {
        return ts;
    }

    // ts * from.num / from.den * to.den / to.num
    let num = ts as i128 * from.num as i128 * to.den as i128;
    let den = from.den as i128 * to.num as i128;
    if den == 0 {
        return ts;
    }

    let magnitude = (num.abs() + den.abs() / 2) / den.abs();
    let rescaled = if (num < 0) != (den < 0) {
        -magnitude
    } else {
        magnitude
    };
    rescaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_identity() {
        let tb = Rational::per_frame(25);
        assert_eq!(rescale_ts(42, tb, tb), 42);
    }

    #[test]
    fn rescale_frame_rate_to_mpeg_clock() {
        let from = Rational::per_frame(25);
        let to = Rational::new(1, 90000);
        assert_eq!(rescale_ts(0, from, to), 0);
        assert_eq!(rescale_ts(1, from, to), 3600);
        assert_eq!(rescale_ts(25, from, to), 90000);
    }

    #[test]
    fn rescale_rounds_to_nearest() {
        let from = Rational::new(1, 3);
        let to = Rational::new(1, 2);
        // 1/3 s = 0.666 ticks of 1/2 s
        assert_eq!(rescale_ts(1, from, to), 1);
        // 3/2 exactly halfway rounds away from zero
        assert_eq!(rescale_ts(3, Rational::new(1, 4), Rational::new(1, 2)), 2);
        assert_eq!(rescale_ts(-3, Rational::new(1, 4), Rational::new(1, 2)), -2);
    }

    #[test]
    fn rescale_is_monotonic() {
        let from = Rational::per_frame(1000);
        let to = Rational::new(1, 25);
        let mut last = i64::MIN;
        for ts in 0..1000 {
            let out = rescale_ts(ts, from, to);
            assert!(out >= last, "{} went backwards at {}", out, ts);
            last = out;
        }
    }

    #[test]
    fn degenerate_time_base_is_passthrough() {
        assert_eq!(rescale_ts(7, Rational::new(1, 0), Rational::new(1, 25)), 7);
    }

    #[test]
    fn rational_helpers() {
        let tb = Rational::per_frame(30);
        assert_eq!(tb.invert(), Rational::new(30, 1));
        assert_eq!(tb.to_string(), "1/30");
        assert!((Rational::new(30, 1).to_f64() - 30.0).abs() < f64::EPSILON);
    }
}
