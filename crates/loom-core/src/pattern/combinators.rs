//! Structural, conditional, and probabilistic combinators.

use super::{pure, signal, silence, Pattern, State};
use crate::arc::Span;
use crate::event::Event;
use crate::time::{next_sam, sam, Time};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

fn zero() -> Time {
    Time::from_integer(0)
}

fn one() -> Time {
    Time::from_integer(1)
}

/// Deterministic pseudo-random value in `[0, 1)` seeded by query time.
/// Never reads the wall clock: the same `t` always yields the same
/// value, across runs and across processes.
pub fn rand_at(t: Time) -> f64 {
    let seed = (*t.numer() as u64).wrapping_mul(0x9E3779B97F4A7C15) ^ (*t.denom() as u64).rotate_left(17);
    let mut rng = StdRng::seed_from_u64(seed);
    rng.gen::<f64>()
}

// ---------------------------------------------------------------------
// Structural combinators
// ---------------------------------------------------------------------

/// `stack`: parallel union of patterns.
pub fn stack<V: Clone + Send + Sync + 'static>(ps: Vec<Pattern<V>>) -> Pattern<V> {
    if ps.is_empty() {
        return silence();
    }
    let fns: Vec<_> = ps.iter().map(|p| p.query_fn_handle()).collect();
    Pattern::new(move |state: &State| fns.iter().flat_map(|f| (f)(state)).collect())
}

/// `slowcat`/`cat`: one pattern per cycle, round-robin.
pub fn slowcat<V: Clone + Send + Sync + 'static>(ps: Vec<Pattern<V>>) -> Pattern<V> {
    if ps.is_empty() {
        return silence();
    }
    let n = ps.len() as i64;
    let fns: Vec<_> = ps.iter().map(|p| p.query_fn_handle()).collect();
    Pattern::new(move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .flat_map(|piece| {
                let cyc = sam(piece.begin);
                let cyc_num = *cyc.numer();
                let idx = cyc_num.rem_euclid(n) as usize;
                let pattern_cyc = cyc_num.div_euclid(n);
                // The chosen pattern only advances its own cycle count
                // once every `n` outer cycles; `delta` restores the
                // outer cycle number on the way back out.
                let delta = cyc - Time::from_integer(pattern_cyc);
                let inner_span = piece.shift(-delta);
                let inner_state = state.with_span(inner_span);
                (fns[idx])(&inner_state)
                    .into_iter()
                    .map(|e| Event {
                        metadata: e.metadata,
                        whole: e.whole.map(|w| w.shift(delta)),
                        active: e.active.shift(delta),
                        value: e.value,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

pub fn cat<V: Clone + Send + Sync + 'static>(ps: Vec<Pattern<V>>) -> Pattern<V> {
    slowcat(ps)
}

/// `fast_cat`: all of `ps` packed into a single cycle, in order.
pub fn fast_cat<V: Clone + Send + Sync + 'static>(ps: Vec<Pattern<V>>) -> Pattern<V> {
    let n = ps.len() as i64;
    if n == 0 {
        return silence();
    }
    fast(Time::from_integer(n), slowcat(ps))
}

/// `time_cat`: weighted sequential concatenation; `p` occupies `d/Σd`.
pub fn time_cat<V: Clone + Send + Sync + 'static>(pairs: Vec<(Time, Pattern<V>)>) -> Pattern<V> {
    if pairs.is_empty() {
        return silence();
    }
    let total: Time = pairs.iter().fold(zero(), |acc, (d, _)| acc + *d);
    if total <= zero() {
        return silence();
    }
    let mut begin = zero();
    let mut layers = Vec::with_capacity(pairs.len());
    for (d, p) in pairs {
        if d <= zero() {
            continue;
        }
        let end = begin + d / total;
        layers.push(compress(begin, end, p));
        begin = end;
    }
    stack(layers)
}

/// `fast`: scale pattern-time by `r`. `fast(0, p) = silence`,
/// `fast(r<0, p) = rev(fast(|r|, p))`.
pub fn fast<V: Clone + Send + Sync + 'static>(r: Time, p: Pattern<V>) -> Pattern<V> {
    if r == zero() {
        return silence();
    }
    if r < zero() {
        return rev(fast(-r, p));
    }
    let inner = p.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        let q = state.span.with_time(|t| t * r);
        let inner_state = state.with_span(q);
        (inner)(&inner_state)
            .into_iter()
            .map(|e| Event {
                metadata: e.metadata,
                whole: e.whole.map(|w| w.with_time(|t| t / r)),
                active: e.active.with_time(|t| t / r),
                value: e.value,
            })
            .collect()
    })
}

/// `slow`: `fast(1/r, p)`.
pub fn slow<V: Clone + Send + Sync + 'static>(r: Time, p: Pattern<V>) -> Pattern<V> {
    if r == zero() {
        return silence();
    }
    fast(one() / r, p)
}

/// `early`: shift query `t` cycles ahead (play sooner).
pub fn early<V: Clone + Send + Sync + 'static>(t: Time, p: Pattern<V>) -> Pattern<V> {
    let inner = p.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        let q = state.span.shift(t);
        let inner_state = state.with_span(q);
        (inner)(&inner_state)
            .into_iter()
            .map(|e| Event {
                metadata: e.metadata,
                whole: e.whole.map(|w| w.shift(-t)),
                active: e.active.shift(-t),
                value: e.value,
            })
            .collect()
    })
}

/// `late`: shift `t` cycles later (play sooner in the negative sense).
pub fn late<V: Clone + Send + Sync + 'static>(t: Time, p: Pattern<V>) -> Pattern<V> {
    early(-t, p)
}

/// `rev`: reflect each cycle: offset `x` becomes offset `1-x`.
pub fn rev<V: Clone + Send + Sync + 'static>(p: Pattern<V>) -> Pattern<V> {
    let inner = p.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .flat_map(|piece| {
                let cyc = sam(piece.begin);
                let q = piece.reflect_in_cycle(cyc);
                let inner_state = state.with_span(q);
                (inner)(&inner_state)
                    .into_iter()
                    .map(|e| Event {
                        metadata: e.metadata,
                        whole: e.whole.map(|w| w.reflect_in_cycle(cyc)),
                        active: e.active.reflect_in_cycle(cyc),
                        value: e.value,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

/// `zoom(a,b,p)`: play the slice `p[a,b)` of every cycle stretched to
/// fill that whole cycle.
pub fn zoom<V: Clone + Send + Sync + 'static>(a: Time, b: Time, p: Pattern<V>) -> Pattern<V> {
    let d = b - a;
    if d <= zero() {
        return silence();
    }
    let inner = p.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .flat_map(|piece| {
                let cyc = sam(piece.begin);
                let to_inner = |t: Time| cyc + a + (t - cyc) * d;
                let from_inner = |t: Time| cyc + (t - cyc - a) / d;
                let q = Span::new(to_inner(piece.begin), to_inner(piece.end));
                let inner_state = state.with_span(q);
                (inner)(&inner_state)
                    .into_iter()
                    .map(|e| Event {
                        metadata: e.metadata,
                        whole: e.whole.map(|w| Span::new(from_inner(w.begin), from_inner(w.end))),
                        active: Span::new(from_inner(e.active.begin), from_inner(e.active.end)),
                        value: e.value,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

/// `fast_gap(r,p)`: `p` played `r`x faster within the first `1/r` of
/// each cycle, silence for the remainder.
pub fn fast_gap<V: Clone + Send + Sync + 'static>(r: Time, p: Pattern<V>) -> Pattern<V> {
    if r <= zero() {
        return silence();
    }
    let r_eff = if r < one() { one() } else { r };
    let inner = p.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .flat_map(|piece| {
                let cyc = sam(piece.begin);
                let munge = |t: Time| cyc + (r_eff * (t - cyc)).min(one());
                let unmunge = |t: Time| cyc + (t - cyc) / r_eff;
                let q = Span::new(munge(piece.begin), munge(piece.end));
                if q.begin >= cyc + one() && !q.is_zero_width() {
                    return Vec::new();
                }
                let inner_state = state.with_span(q);
                (inner)(&inner_state)
                    .into_iter()
                    .filter_map(|e| {
                        let active = Span::new(unmunge(e.active.begin), unmunge(e.active.end));
                        if active.begin >= cyc + one() {
                            return None;
                        }
                        let whole = e.whole.map(|w| Span::new(unmunge(w.begin), unmunge(w.end)));
                        Some(Event {
                            metadata: e.metadata,
                            whole,
                            active,
                            value: e.value,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

/// `compress(a,b,p)`: squash the whole of `p` into `[a,b)`, silence
/// elsewhere in the cycle. Requires `0 <= a < b <= 1`.
pub fn compress<V: Clone + Send + Sync + 'static>(a: Time, b: Time, p: Pattern<V>) -> Pattern<V> {
    if a < zero() || b > one() || a >= b {
        return silence();
    }
    late(a, fast_gap(one() / (b - a), p))
}

/// `focus(a,b,p)`: like `compress` but for arbitrary (possibly >1
/// cycle) spans, and without the silence gap — `p` keeps playing
/// outside `[a,b)` too, just time-scaled and shifted.
pub fn focus<V: Clone + Send + Sync + 'static>(a: Time, b: Time, p: Pattern<V>) -> Pattern<V> {
    let d = b - a;
    if d <= zero() {
        return silence();
    }
    let shift = a - sam(a);
    late(shift, fast(one() / d, p))
}

/// `every(n,f,p)`: apply `f` on cycles where `cycle mod n == 0`.
pub fn every<V: Clone + Send + Sync + 'static>(
    n: i64,
    f: impl Fn(Pattern<V>) -> Pattern<V>,
    p: Pattern<V>,
) -> Pattern<V> {
    if n <= 0 {
        return p;
    }
    let transformed = f(p.clone());
    let plain = p.query_fn_handle();
    let hit = transformed.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .flat_map(|piece| {
                let cyc_num = *sam(piece.begin).numer();
                let inner_state = state.with_span(piece);
                if cyc_num.rem_euclid(n) == 0 {
                    (hit)(&inner_state)
                } else {
                    (plain)(&inner_state)
                }
            })
            .collect()
    })
}

/// `when(boolPat,f,p)`: apply `f` on cycles where `boolPat` samples
/// true at the cycle's start.
pub fn when<V: Clone + Send + Sync + 'static>(
    bool_pat: Pattern<bool>,
    f: impl Fn(Pattern<V>) -> Pattern<V>,
    p: Pattern<V>,
) -> Pattern<V> {
    let transformed = f(p.clone());
    let plain = p.query_fn_handle();
    let hit = transformed.query_fn_handle();
    let bool_fn = bool_pat.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .flat_map(|piece| {
                let cyc = sam(piece.begin);
                let probe = state.with_span(Span::point(cyc));
                let active = (bool_fn)(&probe).into_iter().any(|e| e.value);
                let inner_state = state.with_span(piece);
                if active {
                    (hit)(&inner_state)
                } else {
                    (plain)(&inner_state)
                }
            })
            .collect()
    })
}

// ---------------------------------------------------------------------
// Conditional / probabilistic combinators
// ---------------------------------------------------------------------

/// `degrade_by(x,p)`: drop each event with probability `x`, decided by
/// a deterministic hash of its onset time. Keep iff `rand(onset) >= x`,
/// so `x=0` keeps everything and `x=1` drops everything.
pub fn degrade_by<V: Clone + Send + Sync + 'static>(x: f64, p: Pattern<V>) -> Pattern<V> {
    let inner = p.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        (inner)(state)
            .into_iter()
            .filter(|e| rand_at(e.active.begin) >= x)
            .collect()
    })
}

/// `un_degrade_by(x,p)`: keep exactly the events `degrade_by(x,p)` drops.
pub fn un_degrade_by<V: Clone + Send + Sync + 'static>(x: f64, p: Pattern<V>) -> Pattern<V> {
    let inner = p.query_fn_handle();
    Pattern::with_strategy(p.join_strategy, move |state: &State| {
        (inner)(state)
            .into_iter()
            .filter(|e| rand_at(e.active.begin) < x)
            .collect()
    })
}

pub fn degrade<V: Clone + Send + Sync + 'static>(p: Pattern<V>) -> Pattern<V> {
    degrade_by(0.5, p)
}

/// `sometimes_by(x,f,p) = stack([degrade_by(x,p), f(un_degrade_by(x,p))])`.
pub fn sometimes_by<V: Clone + Send + Sync + 'static>(
    x: f64,
    f: impl Fn(Pattern<V>) -> Pattern<V>,
    p: Pattern<V>,
) -> Pattern<V> {
    stack(vec![degrade_by(x, p.clone()), f(un_degrade_by(x, p))])
}

/// `choose(xs)`: continuous random selection from `xs`.
pub fn choose<V: Clone + Send + Sync + 'static>(xs: Vec<V>) -> Pattern<V> {
    if xs.is_empty() {
        return silence();
    }
    let n = xs.len();
    signal(move |t| {
        let idx = (rand_at(t) * n as f64) as usize;
        xs[idx.min(n - 1)].clone()
    })
}

/// `w_choose(weighted)`: continuous random selection weighted by the
/// second element of each pair.
pub fn w_choose<V: Clone + Send + Sync + 'static>(weighted: Vec<(V, f64)>) -> Pattern<V> {
    if weighted.is_empty() {
        return silence();
    }
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    signal(move |t| {
        let mut target = rand_at(t) * total;
        for (v, w) in &weighted {
            if target < *w {
                return v.clone();
            }
            target -= w;
        }
        weighted.last().unwrap().0.clone()
    })
}

/// `cycle_choose(xs)`: one random value per cycle (the one-per-cycle
/// counterpart to `choose`'s continuous sampling).
pub fn cycle_choose<V: Clone + Send + Sync + 'static>(xs: Vec<V>) -> Pattern<V> {
    if xs.is_empty() {
        return silence();
    }
    let n = xs.len();
    Pattern::new(move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .filter_map(|piece| {
                let cyc = sam(piece.begin);
                let whole = Span::new(cyc, next_sam(cyc));
                let active = whole.intersect(&piece)?;
                let idx = (rand_at(cyc) * n as f64) as usize;
                Some(Event::discrete(whole, active, xs[idx.min(n - 1)].clone()))
            })
            .collect()
    })
}

/// `segment(n,p)`: sample a continuous pattern discretely at rate `n`.
pub fn segment<V: Clone + Send + Sync + 'static>(n: Time, p: Pattern<V>) -> Pattern<V> {
    struct_(fast(n, pure(true)), p)
}

/// `struct(boolPat,p)`: keep only onsets of `p` landing on `true`
/// samples of `boolPat`, with the boolean pattern's own timing.
pub fn struct_<V: Clone + Send + Sync + 'static>(
    bool_pat: Pattern<bool>,
    value_pat: Pattern<V>,
) -> Pattern<V> {
    let bool_fn = bool_pat.query_fn_handle();
    let value_fn = value_pat.query_fn_handle();
    Pattern::new(move |state: &State| {
        (bool_fn)(state)
            .into_iter()
            .filter(|e| e.value)
            .flat_map(|be| {
                let probe = state.with_span(be.whole_or_active());
                let value_fn = value_fn.clone();
                (value_fn)(&probe)
                    .into_iter()
                    .filter_map(move |ve| {
                        let active = be.active.intersect(&ve.active)?;
                        Some(Event {
                            metadata: be.metadata.clone(),
                            whole: be.whole,
                            active,
                            value: ve.value,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

/// Bjorklund's algorithm: distribute `pulses` as evenly as possible
/// across `steps` slots, returning the boolean onset pattern.
pub fn bjorklund(pulses: usize, steps: usize) -> Vec<bool> {
    if steps == 0 {
        return Vec::new();
    }
    if pulses == 0 {
        return vec![false; steps];
    }
    if pulses >= steps {
        return vec![true; steps];
    }

    let mut groups: Vec<Vec<bool>> = vec![vec![true]; pulses];
    let mut remainder: Vec<Vec<bool>> = vec![vec![false]; steps - pulses];

    loop {
        if remainder.len() <= 1 {
            break;
        }
        let pairs = groups.len().min(remainder.len());
        let mut new_groups = Vec::with_capacity(pairs);
        for i in 0..pairs {
            let mut combined = groups[i].clone();
            combined.extend(remainder[i].clone());
            new_groups.push(combined);
        }
        let leftover_groups = groups.split_off(pairs);
        let leftover_remainder = remainder.split_off(pairs);
        let new_remainder: Vec<Vec<bool>> = if leftover_groups.is_empty() {
            leftover_remainder
        } else {
            leftover_groups
        };
        groups = new_groups;
        remainder = new_remainder;
        if remainder.len() <= 1 {
            break;
        }
    }

    groups
        .into_iter()
        .chain(remainder)
        .flatten()
        .collect()
}

/// Rotate a boolean sequence left by `rot` positions.
fn rotate(xs: &[bool], rot: i64) -> Vec<bool> {
    if xs.is_empty() {
        return Vec::new();
    }
    let n = xs.len() as i64;
    let shift = rot.rem_euclid(n) as usize;
    xs[shift..].iter().chain(xs[..shift].iter()).copied().collect()
}

/// `euclid(n,k,rot,p)`: distribute `n` pulses across `k` steps via
/// Bjorklund's algorithm and use the resulting boolean pattern as
/// structure for `p`.
pub fn euclid<V: Clone + Send + Sync + 'static>(
    n: usize,
    k: usize,
    rot: i64,
    p: Pattern<V>,
) -> Pattern<V> {
    let onsets = rotate(&bjorklund(n, k), rot);
    struct_(fast_cat(onsets.into_iter().map(pure).collect()), p)
}

/// The boolean onset pattern alone, one cycle long — used for the
/// Euclidean testable property (pulse count and total length).
pub fn euclid_bool(n: usize, k: usize, rot: i64) -> Pattern<bool> {
    let onsets = rotate(&bjorklund(n, k), rot);
    fast_cat(onsets.into_iter().map(pure).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;
    use num_rational::Ratio;

    fn t(n: i64, d: i64) -> Time {
        Ratio::new(n, d)
    }

    fn q<V: Clone + Send + Sync + 'static>(p: &Pattern<V>, a: i64, ad: i64, b: i64, bd: i64) -> Vec<Event<V>> {
        p.query(&State::new(Span::new(t(a, ad), t(b, bd))))
    }

    #[test]
    fn stack_of_pattern_and_silence_is_pattern() {
        let p = pure("bd");
        let stacked = stack(vec![p.clone(), silence()]);
        assert_eq!(q(&stacked, 0, 1, 1, 1).len(), q(&p, 0, 1, 1, 1).len());
    }

    #[test]
    fn cat_of_one_is_identity() {
        let p = pure("bd");
        let catted = cat(vec![p.clone()]);
        let a = q(&p, 0, 1, 3, 1);
        let b = q(&catted, 0, 1, 3, 1);
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn slowcat_round_robins_one_pattern_per_cycle() {
        let p = slowcat(vec![pure("a"), pure("b")]);
        let events = q(&p, 0, 1, 2, 1);
        assert_eq!(events[0].value, "a");
        assert_eq!(events[1].value, "b");
    }

    #[test]
    fn fast_cat_packs_into_one_cycle() {
        let p = fast_cat(vec![pure("a"), pure("b")]);
        let events = q(&p, 0, 1, 1, 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].active, Span::new(t(0, 1), t(1, 2)));
        assert_eq!(events[1].active, Span::new(t(1, 2), t(1, 1)));
    }

    #[test]
    fn fast_composes_multiplicatively() {
        let p = pure("x");
        let a = fast(t(2, 1), fast(t(3, 1), p.clone()));
        let b = fast(t(6, 1), p);
        assert_eq!(q(&a, 0, 1, 1, 1).len(), q(&b, 0, 1, 1, 1).len());
    }

    #[test]
    fn fast_zero_is_silence() {
        let p = fast(t(0, 1), pure("x"));
        assert!(q(&p, 0, 1, 4, 1).is_empty());
    }

    #[test]
    fn rev_of_rev_is_identity() {
        let p = fast_cat(vec![pure("a"), pure("b"), pure("c")]);
        let doubled = rev(rev(p.clone()));
        let a: Vec<_> = q(&p, 0, 1, 1, 1).into_iter().map(|e| e.value).collect();
        let b: Vec<_> = q(&doubled, 0, 1, 1, 1).into_iter().map(|e| e.value).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn rev_reflects_a_three_element_sequence() {
        let p = fast_cat(vec![pure("bd"), pure("sn"), pure("cp")]);
        let reversed = rev(p);
        let values: Vec<_> = q(&reversed, 0, 1, 1, 1).into_iter().map(|e| e.value).collect();
        assert_eq!(values, vec!["cp", "sn", "bd"]);
    }

    #[test]
    fn zoom_full_range_is_identity() {
        let p = fast_cat(vec![pure("a"), pure("b")]);
        let zoomed = zoom(t(0, 1), t(1, 1), p.clone());
        let a: Vec<_> = q(&p, 0, 1, 1, 1).into_iter().map(|e| e.value).collect();
        let b: Vec<_> = q(&zoomed, 0, 1, 1, 1).into_iter().map(|e| e.value).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn time_cat_with_equal_weights_matches_fast_cat() {
        let a = time_cat(vec![(t(1, 1), pure("a")), (t(1, 1), pure("b")), (t(1, 1), pure("c"))]);
        let b = fast_cat(vec![pure("a"), pure("b"), pure("c")]);
        let av: Vec<_> = q(&a, 0, 1, 1, 1).into_iter().map(|e| e.active).collect();
        let bv: Vec<_> = q(&b, 0, 1, 1, 1).into_iter().map(|e| e.active).collect();
        assert_eq!(av, bv);
    }

    #[test]
    fn every_applies_transform_on_matching_cycles() {
        let p = every(2, |p| fast(t(2, 1), p), fast_cat(vec![pure("a"), pure("b")]));
        let cycle0: Vec<_> = q(&p, 0, 1, 1, 1).into_iter().map(|e| e.value).collect();
        let cycle1: Vec<_> = q(&p, 1, 1, 2, 1).into_iter().map(|e| e.value).collect();
        assert_eq!(cycle0, vec!["a", "b"]);
        assert_eq!(cycle1, vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn degrade_by_zero_keeps_everything() {
        let p = degrade_by(0.0, fast_cat(vec![pure("a"), pure("b"), pure("c"), pure("d")]));
        assert_eq!(q(&p, 0, 1, 1, 1).len(), 4);
    }

    #[test]
    fn degrade_by_one_drops_everything() {
        let p = degrade_by(1.0, fast_cat(vec![pure("a"), pure("b"), pure("c"), pure("d")]));
        assert!(q(&p, 0, 1, 1, 1).is_empty());
    }

    #[test]
    fn bjorklund_pulse_and_step_counts() {
        let onsets = bjorklund(3, 8);
        assert_eq!(onsets.len(), 8);
        assert_eq!(onsets.iter().filter(|b| **b).count(), 3);
    }

    #[test]
    fn bjorklund_known_tresillo_pattern() {
        // The canonical (3,8) Euclidean rhythm is the tresillo: x..x..x.
        let onsets = bjorklund(3, 8);
        assert_eq!(
            onsets,
            vec![true, false, false, true, false, false, true, false]
        );
    }

    #[test]
    fn euclid_produces_three_onsets_in_eight_steps() {
        let p = euclid(3, 8, 0, pure("x"));
        let events = q(&p, 0, 1, 1, 1);
        assert_eq!(events.len(), 3);
        let begins: Vec<Time> = events.iter().map(|e| e.active.begin).collect();
        assert_eq!(begins, vec![t(0, 1), t(3, 8), t(6, 8)]);
    }

    #[test]
    fn struct_keeps_bool_timing() {
        let bools = fast_cat(vec![pure(true), pure(false), pure(true)]);
        let p = struct_(bools, pure("x"));
        let events = q(&p, 0, 1, 1, 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].active, Span::new(t(0, 1), t(1, 3)));
        assert_eq!(events[1].active, Span::new(t(2, 3), t(1, 1)));
    }

    #[test]
    fn rand_at_is_deterministic_across_calls() {
        let a = rand_at(t(3, 7));
        let b = rand_at(t(3, 7));
        assert_eq!(a, b);
    }
}
