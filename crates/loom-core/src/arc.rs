//! Half-open time intervals ("arcs" / "spans") over `Time`.

use crate::time::{next_sam, Time};
use serde::{Deserialize, Serialize};

/// A half-open interval `[begin, end)` of cycle-time.
///
/// Zero-width spans (`begin == end`) are permitted and represent point
/// events (used to model instants, such as the forced query that
/// surfaces parse errors at `replace`-time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub begin: Time,
    pub end: Time,
}

impl Span {
    pub fn new(begin: Time, end: Time) -> Self {
        Span { begin, end }
    }

    pub fn point(t: Time) -> Self {
        Span::new(t, t)
    }

    pub fn is_zero_width(&self) -> bool {
        self.begin == self.end
    }

    pub fn duration(&self) -> Time {
        self.end - self.begin
    }

    pub fn midpoint(&self) -> Time {
        (self.begin + self.end) / Time::from_integer(2)
    }

    /// Translate both endpoints by `delta`.
    pub fn shift(&self, delta: Time) -> Self {
        Span::new(self.begin + delta, self.end + delta)
    }

    /// Scale both endpoints by `factor` (around zero).
    pub fn scale(&self, factor: Time) -> Self {
        Span::new(self.begin * factor, self.end * factor)
    }

    /// Reflect this span within a containing cycle `[sam, sam+1)`:
    /// the point at offset `x` becomes the point at offset `1-x`.
    pub fn reflect_in_cycle(&self, sam: Time) -> Self {
        let one = Time::from_integer(1);
        let lo = sam + one - (self.end - sam);
        let hi = sam + one - (self.begin - sam);
        Span::new(lo, hi)
    }

    /// The overlap of two spans, honoring half-open boundaries: spans
    /// that merely touch at an endpoint (one arc's closed-looking right
    /// edge against another's begin) do not intersect unless the point
    /// of contact is itself a zero-width arc on both sides.
    pub fn intersect(&self, other: &Span) -> Option<Span> {
        let lo = self.begin.max(other.begin);
        let hi = self.end.min(other.end);
        if lo == hi {
            let touches_self_end = lo == self.end && self.begin < self.end;
            let touches_other_end = lo == other.end && other.begin < other.end;
            if touches_self_end || touches_other_end {
                return None;
            }
        }
        if lo <= hi {
            Some(Span::new(lo, hi))
        } else {
            None
        }
    }

    /// The convex union of two spans (smallest span containing both).
    pub fn hull(&self, other: &Span) -> Span {
        Span::new(self.begin.min(other.begin), self.end.max(other.end))
    }

    /// Cut this span at every integer cycle boundary it crosses.
    /// A zero-width span is returned unchanged as its own single piece.
    pub fn split_cycles(&self) -> Vec<Span> {
        if self.is_zero_width() {
            return vec![*self];
        }
        let mut pieces = Vec::new();
        let mut begin = self.begin;
        while begin < self.end {
            let boundary = next_sam(begin);
            let end = boundary.min(self.end);
            pieces.push(Span::new(begin, end));
            begin = end;
        }
        pieces
    }

    pub fn with_time(&self, f: impl Fn(Time) -> Time) -> Span {
        Span::new(f(self.begin), f(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::Ratio;

    fn t(n: i64, d: i64) -> Time {
        Ratio::new(n, d)
    }

    #[test]
    fn intersect_overlapping() {
        let a = Span::new(t(0, 1), t(1, 1));
        let b = Span::new(t(1, 2), t(3, 2));
        assert_eq!(a.intersect(&b), Some(Span::new(t(1, 2), t(1, 1))));
    }

    #[test]
    fn intersect_touching_endpoints_is_none() {
        let a = Span::new(t(0, 1), t(1, 1));
        let b = Span::new(t(1, 1), t(2, 1));
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn intersect_zero_width_point_inside_span() {
        let point = Span::point(t(0, 1));
        let span = Span::new(t(0, 1), t(1, 1));
        assert_eq!(point.intersect(&span), Some(Span::point(t(0, 1))));
    }

    #[test]
    fn intersect_two_coincident_points() {
        let a = Span::point(t(1, 2));
        let b = Span::point(t(1, 2));
        assert_eq!(a.intersect(&b), Some(Span::point(t(1, 2))));
    }

    #[test]
    fn intersect_disjoint() {
        let a = Span::new(t(0, 1), t(1, 1));
        let b = Span::new(t(2, 1), t(3, 1));
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn hull_is_convex_union() {
        let a = Span::new(t(0, 1), t(1, 2));
        let b = Span::new(t(1, 4), t(1, 1));
        assert_eq!(a.hull(&b), Span::new(t(0, 1), t(1, 1)));
    }

    #[test]
    fn split_cycles_on_boundary() {
        let span = Span::new(t(1, 2), t(5, 2));
        let pieces = span.split_cycles();
        assert_eq!(
            pieces,
            vec![
                Span::new(t(1, 2), t(1, 1)),
                Span::new(t(1, 1), t(2, 1)),
                Span::new(t(2, 1), t(5, 2)),
            ]
        );
    }

    #[test]
    fn split_cycles_preserves_zero_width() {
        let span = Span::point(t(3, 2));
        assert_eq!(span.split_cycles(), vec![span]);
    }

    #[test]
    fn reflect_in_cycle_swaps_offset() {
        let span = Span::new(t(1, 4), t(1, 2));
        let reflected = span.reflect_in_cycle(t(0, 1));
        assert_eq!(reflected, Span::new(t(1, 2), t(3, 4)));
    }
}
