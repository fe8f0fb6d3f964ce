//! The pattern type: a query function over time, plus every constructor
//! and combinator needed to build up musical patterns from it.

pub mod combinators;
pub mod join;

use crate::arc::Span;
use crate::event::Event;
use crate::time::{next_sam, sam, Time};
use crate::value::ControlMap;
use std::sync::Arc;

/// The arc being queried, plus the live control values a pattern may
/// read (set by the external control listener, snapshotted once per
/// tick by the dispatcher).
#[derive(Clone, Debug, Default)]
pub struct State {
    pub span: Span,
    pub controls: ControlMap,
}

impl State {
    pub fn new(span: Span) -> Self {
        State {
            span,
            controls: ControlMap::new(),
        }
    }

    pub fn with_span(&self, span: Span) -> Self {
        State {
            span,
            controls: self.controls.clone(),
        }
    }
}

/// The bind strategy a pattern prefers when it appears as the outer
/// pattern of a nested (pattern-of-pattern) join, or as the left operand
/// of a binary combinator. See `join::bind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    Inner,
    Outer,
    Mix,
    Squeeze,
    SqueezeOut,
    Trig,
    Trig0,
}

impl Default for JoinStrategy {
    fn default() -> Self {
        JoinStrategy::Mix
    }
}

type QueryFn<V> = Arc<dyn Fn(&State) -> Vec<Event<V>> + Send + Sync>;

/// A pattern of values of type `V`: a pure function from a queried
/// `State` to the events active within it, plus a tag selecting how it
/// behaves as the outer side of a monadic join.
pub struct Pattern<V> {
    query_fn: QueryFn<V>,
    pub join_strategy: JoinStrategy,
}

impl<V> Clone for Pattern<V> {
    fn clone(&self) -> Self {
        Pattern {
            query_fn: self.query_fn.clone(),
            join_strategy: self.join_strategy,
        }
    }
}

impl<V> Pattern<V> {
    pub fn new(query_fn: impl Fn(&State) -> Vec<Event<V>> + Send + Sync + 'static) -> Self {
        Pattern {
            query_fn: Arc::new(query_fn),
            join_strategy: JoinStrategy::default(),
        }
    }

    pub fn with_strategy(
        strategy: JoinStrategy,
        query_fn: impl Fn(&State) -> Vec<Event<V>> + Send + Sync + 'static,
    ) -> Self {
        Pattern {
            query_fn: Arc::new(query_fn),
            join_strategy: strategy,
        }
    }

    pub fn strategy(mut self, strategy: JoinStrategy) -> Self {
        self.join_strategy = strategy;
        self
    }

    pub fn query(&self, state: &State) -> Vec<Event<V>> {
        (self.query_fn)(state)
    }

    pub(crate) fn query_fn_handle(&self) -> QueryFn<V> {
        self.query_fn.clone()
    }
}

impl<V: Clone + Send + Sync + 'static> Pattern<V> {
    /// `fmap`: transform every event's value, leaving timing untouched.
    pub fn fmap<U: Clone + Send + Sync + 'static>(
        &self,
        f: impl Fn(V) -> U + Send + Sync + 'static,
    ) -> Pattern<U> {
        let inner = self.query_fn_handle();
        Pattern::with_strategy(self.join_strategy, move |state| {
            (inner)(state).into_iter().map(|e| e.map(&f)).collect()
        })
    }

    /// Transform the queried span before it reaches this pattern.
    pub fn with_query_span(
        &self,
        f: impl Fn(Span) -> Span + Send + Sync + 'static,
    ) -> Pattern<V> {
        let inner = self.query_fn_handle();
        Pattern::with_strategy(self.join_strategy, move |state| {
            let inner_state = state.with_span(f(state.span));
            (inner)(&inner_state)
        })
    }

    /// Transform every returned event's whole/active spans.
    pub fn with_event_span(
        &self,
        f: impl Fn(Span) -> Span + Send + Sync + 'static,
    ) -> Pattern<V> {
        let inner = self.query_fn_handle();
        Pattern::with_strategy(self.join_strategy, move |state| {
            (inner)(state)
                .into_iter()
                .map(|e| crate::event::Event {
                    metadata: e.metadata,
                    whole: e.whole.map(&f),
                    active: f(e.active),
                    value: e.value,
                })
                .collect()
        })
    }
}

/// `silence`: the empty pattern.
pub fn silence<V>() -> Pattern<V> {
    Pattern::new(|_state| Vec::new())
}

/// `pure`/`atom`: one event per integer cycle, clipped to the query.
pub fn pure<V: Clone + Send + Sync + 'static>(value: V) -> Pattern<V> {
    Pattern::new(move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .filter_map(|piece| {
                let whole = Span::new(sam(piece.begin), next_sam(piece.begin));
                let active = whole.intersect(&piece)?;
                Some(Event::discrete(whole, active, value.clone()))
            })
            .collect()
    })
}

/// Alias kept for readers coming from the mini-notation/control-map side,
/// where "atomic" values (bare numbers, bare strings) are lifted with
/// the same constructor as `pure`.
pub fn atom<V: Clone + Send + Sync + 'static>(value: V) -> Pattern<V> {
    pure(value)
}

/// `from_list`: one event per cycle, cycling through `xs`.
pub fn from_list<V: Clone + Send + Sync + 'static>(xs: Vec<V>) -> Pattern<V> {
    if xs.is_empty() {
        return silence();
    }
    let n = xs.len() as i64;
    Pattern::new(move |state: &State| {
        state
            .span
            .split_cycles()
            .into_iter()
            .filter_map(|piece| {
                let cyc = sam(piece.begin);
                let idx = cyc.numer().rem_euclid(n) as usize;
                let whole = Span::new(cyc, cyc + Time::from_integer(1));
                let active = whole.intersect(&piece)?;
                Some(Event::discrete(whole, active, xs[idx].clone()))
            })
            .collect()
    })
}

/// `fast_from_list`: all of `xs` packed into a single cycle.
pub fn fast_from_list<V: Clone + Send + Sync + 'static>(xs: Vec<V>) -> Pattern<V> {
    combinators::fast_cat(xs.into_iter().map(pure).collect())
}

/// `signal`: a continuous pattern — one event per queried span, valued
/// at the span's midpoint, with no `whole`.
pub fn signal<V: Send + Sync + 'static>(
    f: impl Fn(Time) -> V + Send + Sync + 'static,
) -> Pattern<V> {
    Pattern::new(move |state: &State| {
        vec![Event::continuous(state.span, f(state.span.midpoint()))]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::Ratio;

    fn t(n: i64, d: i64) -> Time {
        Ratio::new(n, d)
    }

    #[test]
    fn silence_returns_nothing() {
        let p: Pattern<&str> = silence();
        let events = p.query(&State::new(Span::new(t(0, 1), t(4, 1))));
        assert!(events.is_empty());
    }

    #[test]
    fn pure_emits_one_event_per_cycle() {
        let p = pure("bd");
        let events = p.query(&State::new(Span::new(t(0, 1), t(2, 1))));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].whole, Some(Span::new(t(0, 1), t(1, 1))));
        assert_eq!(events[1].whole, Some(Span::new(t(1, 1), t(2, 1))));
    }

    #[test]
    fn pure_clips_active_to_query() {
        let p = pure("bd");
        let events = p.query(&State::new(Span::new(t(1, 2), t(1, 1))));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].active, Span::new(t(1, 2), t(1, 1)));
        assert!(!events[0].has_onset());
    }

    #[test]
    fn from_list_cycles_through_values() {
        let p = from_list(vec!["a", "b", "c"]);
        let events = p.query(&State::new(Span::new(t(0, 1), t(4, 1))));
        let values: Vec<_> = events.iter().map(|e| e.value).collect();
        assert_eq!(values, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn signal_has_no_whole() {
        let p = signal(|t| (*t.numer() as f64) / (*t.denom() as f64));
        let events = p.query(&State::new(Span::new(t(0, 1), t(1, 1))));
        assert_eq!(events.len(), 1);
        assert!(events[0].whole.is_none());
    }

    #[test]
    fn query_is_deterministic() {
        let p = pure(42);
        let s = State::new(Span::new(t(0, 1), t(3, 1)));
        assert_eq!(p.query(&s), p.query(&s));
    }
}
