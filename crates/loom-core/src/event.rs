//! Events: the things a `Pattern` query returns.

use crate::arc::Span;
use std::cmp::Ordering;

/// A single source-text position, attached to events so that templates
/// carrying "context form" (see the wire protocol in `loom-proto`) can
/// report where in the user's mini-notation an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

/// A value occurring in time.
///
/// `whole` is the event's intended full duration; it is `None` for
/// continuous/analog events (signals). `active` is the sub-interval of
/// `whole` that actually fell inside the queried arc — for a continuous
/// event `active` just *is* the queried sub-arc.
///
/// Not `Serialize`/`Deserialize`: events may carry `Value::Signal`
/// payloads (a `Pattern` wrapping a closure), which cannot cross a
/// serialization boundary. The dispatcher converts resolved events into
/// plain wire messages (`loom-proto`) before anything is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<V> {
    pub metadata: Vec<SourcePos>,
    pub whole: Option<Span>,
    pub active: Span,
    pub value: V,
}

impl<V> Event<V> {
    pub fn discrete(whole: Span, active: Span, value: V) -> Self {
        Event {
            metadata: Vec::new(),
            whole: Some(whole),
            active,
            value,
        }
    }

    pub fn continuous(active: Span, value: V) -> Self {
        Event {
            metadata: Vec::new(),
            whole: None,
            active,
            value,
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<SourcePos>) -> Self {
        self.metadata = metadata;
        self
    }

    /// An event has an onset iff it is discrete and its active portion
    /// begins exactly where its whole begins.
    pub fn has_onset(&self) -> bool {
        match self.whole {
            Some(w) => w.begin == self.active.begin,
            None => false,
        }
    }

    /// `whole` if present, else `active` — used wherever a single span
    /// representative of the event's timing is needed (e.g. computing
    /// onset timestamps for continuous-looking values).
    pub fn whole_or_active(&self) -> Span {
        self.whole.unwrap_or(self.active)
    }

    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Event<U> {
        Event {
            metadata: self.metadata,
            whole: self.whole,
            active: self.active,
            value: f(self.value),
        }
    }

    pub fn with_span(&self, whole: Option<Span>, active: Span) -> Event<V>
    where
        V: Clone,
    {
        Event {
            metadata: self.metadata.clone(),
            whole,
            active,
            value: self.value.clone(),
        }
    }
}

impl<V: PartialEq> Event<V> {
    /// True iff `self` immediately precedes `other`: same whole, and
    /// `self`'s active ends exactly where `other`'s active begins.
    pub fn is_adjacent(&self, other: &Event<V>) -> bool {
        self.whole == other.whole && self.active.end == other.active.begin
    }
}

/// Merge adjacent events that share a whole and value into one event
/// spanning both actives. Metadata is concatenated in order.
pub fn defrag_actives<V: PartialEq + Clone>(events: &[Event<V>]) -> Vec<Event<V>> {
    let mut out: Vec<Event<V>> = Vec::with_capacity(events.len());
    for e in events {
        if let Some(last) = out.last_mut() {
            if last.is_adjacent(e) && last.value == e.value {
                last.active.end = e.active.end;
                last.metadata.extend(e.metadata.iter().copied());
                continue;
            }
        }
        out.push(e.clone());
    }
    out
}

/// Order events for emission: by active-begin, ties broken by
/// whole-begin (continuous events, with no whole, sort after discrete
/// events sharing the same active-begin), then by the caller-supplied
/// value comparator.
pub fn emit_order<V>(a: &Event<V>, b: &Event<V>, value_cmp: impl Fn(&V, &V) -> Ordering) -> Ordering {
    a.active
        .begin
        .cmp(&b.active.begin)
        .then_with(|| {
            let wa = a.whole.map(|w| w.begin);
            let wb = b.whole.map(|w| w.begin);
            wa.cmp(&wb)
        })
        .then_with(|| value_cmp(&a.value, &b.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::Ratio;

    fn t(n: i64, d: i64) -> crate::time::Time {
        Ratio::new(n, d)
    }

    #[test]
    fn discrete_event_with_onset() {
        let span = Span::new(t(0, 1), t(1, 1));
        let e = Event::discrete(span, span, "bd");
        assert!(e.has_onset());
    }

    #[test]
    fn discrete_event_without_onset_when_clipped() {
        let whole = Span::new(t(0, 1), t(1, 1));
        let active = Span::new(t(1, 2), t(1, 1));
        let e = Event::discrete(whole, active, "bd");
        assert!(!e.has_onset());
    }

    #[test]
    fn continuous_event_never_has_onset() {
        let e = Event::continuous(Span::new(t(0, 1), t(1, 2)), 0.5_f64);
        assert!(!e.has_onset());
    }

    #[test]
    fn defrag_merges_adjacent_equal_events() {
        let whole = Span::new(t(0, 1), t(1, 1));
        let e1 = Event::discrete(whole, Span::new(t(0, 1), t(1, 2)), "bd");
        let e2 = Event::discrete(whole, Span::new(t(1, 2), t(1, 1)), "bd");
        let merged = defrag_actives(&[e1, e2]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].active, whole);
    }

    #[test]
    fn defrag_keeps_distinct_values_separate() {
        let whole = Span::new(t(0, 1), t(1, 1));
        let e1 = Event::discrete(whole, Span::new(t(0, 1), t(1, 2)), "bd");
        let e2 = Event::discrete(whole, Span::new(t(1, 2), t(1, 1)), "sn");
        let merged = defrag_actives(&[e1, e2]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn emit_order_sorts_by_active_begin() {
        let a = Event::discrete(
            Span::new(t(1, 2), t(1, 1)),
            Span::new(t(1, 2), t(1, 1)),
            1,
        );
        let b = Event::discrete(Span::new(t(0, 1), t(1, 2)), Span::new(t(0, 1), t(1, 2)), 2);
        assert_eq!(emit_order(&a, &b, i32::cmp), Ordering::Greater);
    }
}
