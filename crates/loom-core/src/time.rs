//! Exact rational cycle-time.
//!
//! `Time` counts cycles from an origin. Floating point never appears here;
//! it is only introduced at the wall-clock boundary in `tempo` and in the
//! dispatcher that turns cycle onsets into timestamps.

use num_integer::Integer;
use num_rational::Ratio;

/// A point in cycle-time, represented as an exact rational.
pub type Time = Ratio<i64>;

/// `sam(t)`: the start of the cycle containing `t` (floor of `t`).
///
/// Uses `div_floor` rather than truncation so negative times floor
/// towards negative infinity, matching cycle semantics for `t < 0`.
pub fn sam(t: Time) -> Time {
    Ratio::from_integer(t.numer().div_floor(t.denom()))
}

/// `next_sam(t) = sam(t) + 1`.
pub fn next_sam(t: Time) -> Time {
    sam(t) + Ratio::from_integer(1)
}

/// `cycle_pos(t) = t - sam(t)`, always in `[0, 1)`.
pub fn cycle_pos(t: Time) -> Time {
    t - sam(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(n: i64, d: i64) -> Time {
        Ratio::new(n, d)
    }

    #[test]
    fn sam_of_integers() {
        assert_eq!(sam(t(0, 1)), t(0, 1));
        assert_eq!(sam(t(3, 1)), t(3, 1));
    }

    #[test]
    fn sam_of_fractions() {
        assert_eq!(sam(t(3, 2)), t(1, 1));
        assert_eq!(sam(t(7, 4)), t(1, 1));
    }

    #[test]
    fn sam_of_negative_times() {
        // -1/2 is inside cycle -1, i.e. [-1, 0).
        assert_eq!(sam(t(-1, 2)), t(-1, 1));
        assert_eq!(sam(t(-3, 2)), t(-2, 1));
        assert_eq!(sam(t(-1, 1)), t(-1, 1));
    }

    #[test]
    fn next_sam_steps_one_cycle() {
        assert_eq!(next_sam(t(3, 2)), t(2, 1));
        assert_eq!(next_sam(t(-1, 2)), t(0, 1));
    }

    #[test]
    fn cycle_pos_is_always_in_unit_interval() {
        assert_eq!(cycle_pos(t(3, 2)), t(1, 2));
        assert_eq!(cycle_pos(t(-1, 2)), t(1, 2));
        assert_eq!(cycle_pos(t(2, 1)), t(0, 1));
    }
}
