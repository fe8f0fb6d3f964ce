//! Monadic join strategies and applicative alignment.
//!
//! A pattern-of-patterns (the result of, e.g., mapping a pattern of
//! sample names to a pattern of parameter patterns) must be flattened
//! into a single pattern. How the flattened event's `whole` is chosen
//! differs by strategy — see `JoinStrategy` and spec.md §4.C.

use super::{silence, Pattern, State};
use crate::arc::Span;
use crate::event::Event;
use crate::time::{sam, Time};
use crate::value::{self, ControlMap};

/// Flatten a pattern of patterns using the given strategy.
pub fn join<V: Clone + Send + Sync + 'static>(
    strategy: crate::pattern::JoinStrategy,
    outer: Pattern<Pattern<V>>,
) -> Pattern<V> {
    use crate::pattern::JoinStrategy::*;
    match strategy {
        Inner => inner_join(outer),
        Outer => outer_join(outer),
        Mix => mix_join(outer),
        Squeeze => squeeze_join(outer, false),
        SqueezeOut => squeeze_join(outer, true),
        Trig => trig_join(outer, false),
        Trig0 => trig_join(outer, true),
    }
}

/// `bind`: map then join, honoring the outer pattern's preferred
/// strategy unless `strategy` overrides it.
pub fn bind<A: Clone + Send + Sync + 'static, B: Clone + Send + Sync + 'static>(
    strategy: crate::pattern::JoinStrategy,
    outer: Pattern<A>,
    f: impl Fn(A) -> Pattern<B> + Send + Sync + 'static,
) -> Pattern<B> {
    join(strategy, outer.fmap(f))
}

/// Squeeze an entire pattern's `[0,1)` cycle into an arbitrary target
/// span — used by `squeeze_join` to compress inner cycles into outer
/// wholes, and distinct from `focus`/`compress` in that the mapping is
/// anchored to the target span directly rather than re-applied once per
/// query cycle.
fn squeeze_into<V: Clone + Send + Sync + 'static>(target: Span, p: Pattern<V>) -> Pattern<V> {
    let d = target.duration();
    if d <= Time::from_integer(0) {
        return silence();
    }
    let inner = p.query_fn_handle();
    Pattern::new(move |state: &State| {
        let to_inner = |t: Time| (t - target.begin) / d;
        let from_inner = |t: Time| target.begin + t * d;
        let q = Span::new(to_inner(state.span.begin), to_inner(state.span.end));
        let inner_state = state.with_span(q);
        (inner)(&inner_state)
            .into_iter()
            .map(|e| Event {
                metadata: e.metadata,
                whole: e.whole.map(|w| Span::new(from_inner(w.begin), from_inner(w.end))),
                active: Span::new(from_inner(e.active.begin), from_inner(e.active.end)),
                value: e.value,
            })
            .collect()
    })
}

fn inner_join<V: Clone + Send + Sync + 'static>(outer: Pattern<Pattern<V>>) -> Pattern<V> {
    let outer_fn = outer.query_fn_handle();
    Pattern::new(move |state: &State| {
        (outer_fn)(state)
            .into_iter()
            .flat_map(|oe| {
                let inner_state = state.with_span(oe.active);
                oe.value
                    .query(&inner_state)
                    .into_iter()
                    .filter_map(move |ie| {
                        let active = oe.active.intersect(&ie.active)?;
                        Some(Event {
                            metadata: oe.metadata.clone(),
                            whole: oe.whole,
                            active,
                            value: ie.value,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

fn outer_join<V: Clone + Send + Sync + 'static>(outer: Pattern<Pattern<V>>) -> Pattern<V> {
    let outer_fn = outer.query_fn_handle();
    Pattern::new(move |state: &State| {
        (outer_fn)(state)
            .into_iter()
            .flat_map(|oe| {
                let inner_state = state.with_span(oe.active);
                oe.value
                    .query(&inner_state)
                    .into_iter()
                    .filter_map(move |ie| {
                        let active = oe.active.intersect(&ie.active)?;
                        Some(Event {
                            metadata: oe.metadata.clone(),
                            whole: ie.whole,
                            active,
                            value: ie.value,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

fn mix_join<V: Clone + Send + Sync + 'static>(outer: Pattern<Pattern<V>>) -> Pattern<V> {
    let outer_fn = outer.query_fn_handle();
    Pattern::new(move |state: &State| {
        (outer_fn)(state)
            .into_iter()
            .flat_map(|oe| {
                let inner_state = state.with_span(oe.active);
                oe.value
                    .query(&inner_state)
                    .into_iter()
                    .filter_map(move |ie| {
                        let active = oe.active.intersect(&ie.active)?;
                        let whole = match (oe.whole, ie.whole) {
                            (Some(ow), Some(iw)) => Some(ow.intersect(&iw)?),
                            _ => None,
                        };
                        Some(Event {
                            metadata: oe.metadata.clone(),
                            whole,
                            active,
                            value: ie.value,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

fn squeeze_join<V: Clone + Send + Sync + 'static>(
    outer: Pattern<Pattern<V>>,
    clip_to_outer_whole: bool,
) -> Pattern<V> {
    let outer_fn = outer.query_fn_handle();
    Pattern::new(move |state: &State| {
        (outer_fn)(state)
            .into_iter()
            .flat_map(|oe| {
                let target = oe.whole_or_active();
                let squeezed = squeeze_into(target, oe.value.clone());
                let inner_state = state.with_span(oe.active);
                squeezed
                    .query(&inner_state)
                    .into_iter()
                    .filter_map(move |ie| {
                        let active = oe.active.intersect(&ie.active)?;
                        let whole = if clip_to_outer_whole {
                            oe.whole
                        } else {
                            ie.whole
                        };
                        Some(Event {
                            metadata: oe.metadata.clone(),
                            whole,
                            active,
                            value: ie.value,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

fn trig_join<V: Clone + Send + Sync + 'static>(
    outer: Pattern<Pattern<V>>,
    zero_aligned: bool,
) -> Pattern<V> {
    let outer_fn = outer.query_fn_handle();
    Pattern::new(move |state: &State| {
        (outer_fn)(state)
            .into_iter()
            .filter(|oe| oe.has_onset())
            .flat_map(|oe| {
                let restart_at = if zero_aligned {
                    oe.active.begin
                } else {
                    sam(oe.active.begin)
                };
                let restarted = super::combinators::late(restart_at, oe.value.clone());
                let inner_state = state.with_span(oe.active);
                restarted
                    .query(&inner_state)
                    .into_iter()
                    .filter_map(move |ie| {
                        let active = oe.active.intersect(&ie.active)?;
                        Some(Event {
                            metadata: oe.metadata.clone(),
                            whole: oe.whole,
                            active,
                            value: ie.value,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

// ---------------------------------------------------------------------
// Applicative alignment
// ---------------------------------------------------------------------

/// Three alignment flavours for `<*>`: which side's wholes survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAlign {
    Inner,
    Outer,
    Mix,
}

/// `pf <*> px` under the given alignment, combining values with `op`.
pub fn apply<A, B, C>(
    align: AppAlign,
    pf: Pattern<A>,
    px: Pattern<B>,
    op: impl Fn(&A, &B) -> C + Send + Sync + 'static,
) -> Pattern<C>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    let f_fn = pf.query_fn_handle();
    let x_fn = px.query_fn_handle();
    let op = std::sync::Arc::new(op);
    Pattern::new(move |state: &State| {
        let fs = (f_fn)(state);
        let xs = (x_fn)(state);
        let op = op.clone();
        fs.into_iter()
            .flat_map(move |fe| {
                let op = op.clone();
                xs.iter()
                    .filter_map(move |xe| {
                        let active = fe.active.intersect(&xe.active)?;
                        let whole = match align {
                            AppAlign::Inner => fe.whole,
                            AppAlign::Outer => xe.whole,
                            AppAlign::Mix => match (fe.whole, xe.whole) {
                                (Some(a), Some(b)) => Some(a.intersect(&b)?),
                                _ => None,
                            },
                        };
                        let mut metadata = fe.metadata.clone();
                        metadata.extend(xe.metadata.iter().copied());
                        Some(Event {
                            metadata,
                            whole,
                            active,
                            value: op(&fe.value, &xe.value),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    })
}

// ---------------------------------------------------------------------
// Control combinators
// ---------------------------------------------------------------------

fn control_apply(
    align: AppAlign,
    left: Pattern<ControlMap>,
    right: Pattern<ControlMap>,
    merge: impl Fn(&ControlMap, &ControlMap) -> ControlMap + Send + Sync + 'static,
) -> Pattern<ControlMap> {
    apply(align, left, right, move |a, b| merge(a, b))
}

/// `#` / `|>|`: union-right, structure from the left.
pub fn hash(left: Pattern<ControlMap>, right: Pattern<ControlMap>) -> Pattern<ControlMap> {
    control_apply(AppAlign::Inner, left, right, |a, b| {
        value::union_right(a.clone(), b)
    })
}

/// `|<|`: union-left, structure from the right.
pub fn union_left(left: Pattern<ControlMap>, right: Pattern<ControlMap>) -> Pattern<ControlMap> {
    control_apply(AppAlign::Outer, left, right, |a, b| value::union_left(a, b))
}

/// `|+|`: numeric add over shared keys, structure from both sides.
pub fn add(left: Pattern<ControlMap>, right: Pattern<ControlMap>) -> Pattern<ControlMap> {
    control_apply(AppAlign::Mix, left, right, |a, b| {
        value::zip_numeric(a, b, |x, y| x + y)
    })
}

/// `|-|`: numeric subtract over shared keys, structure from both sides.
pub fn sub(left: Pattern<ControlMap>, right: Pattern<ControlMap>) -> Pattern<ControlMap> {
    control_apply(AppAlign::Mix, left, right, |a, b| {
        value::zip_numeric(a, b, |x, y| x - y)
    })
}

/// `|*|`: numeric multiply over shared keys, structure from both sides.
pub fn mul(left: Pattern<ControlMap>, right: Pattern<ControlMap>) -> Pattern<ControlMap> {
    control_apply(AppAlign::Mix, left, right, |a, b| {
        value::zip_numeric(a, b, |x, y| x * y)
    })
}

/// `|/|`: numeric divide over shared keys, structure from both sides.
pub fn div(left: Pattern<ControlMap>, right: Pattern<ControlMap>) -> Pattern<ControlMap> {
    control_apply(AppAlign::Mix, left, right, |a, b| {
        value::zip_numeric(a, b, |x, y| if y == 0.0 { 0.0 } else { x / y })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{pure, silence};
    use crate::time::Time;
    use num_rational::Ratio;

    fn t(n: i64, d: i64) -> Time {
        Ratio::new(n, d)
    }

    #[test]
    fn inner_join_keeps_outer_whole() {
        let outer = pure(pure::<i32>(7)).strategy(crate::pattern::JoinStrategy::Inner);
        let joined = join(crate::pattern::JoinStrategy::Inner, outer);
        let events = joined.query(&crate::pattern::State::new(Span::new(t(0, 1), t(1, 1))));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].whole, Some(Span::new(t(0, 1), t(1, 1))));
        assert_eq!(events[0].value, 7);
    }

    #[test]
    fn mix_join_on_empty_inner_is_empty() {
        let outer = pure(silence::<i32>());
        let joined = join(crate::pattern::JoinStrategy::Mix, outer);
        let events = joined.query(&crate::pattern::State::new(Span::new(t(0, 1), t(1, 1))));
        assert!(events.is_empty());
    }

    #[test]
    fn hash_merges_with_right_precedence() {
        let mut a = ControlMap::new();
        a.insert("n".to_string(), crate::value::Value::Int32(1));
        let mut b = ControlMap::new();
        b.insert("n".to_string(), crate::value::Value::Int32(2));
        b.insert("gain".to_string(), crate::value::Value::Double(0.5));
        let left = pure(a);
        let right = pure(b);
        let merged = hash(left, right);
        let events = merged.query(&crate::pattern::State::new(Span::new(t(0, 1), t(1, 1))));
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].value.get("n"),
            Some(&crate::value::Value::Int32(2))
        );
        assert_eq!(
            events[0].value.get("gain"),
            Some(&crate::value::Value::Double(0.5))
        );
    }
}
