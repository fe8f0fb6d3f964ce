//! Compiling a parsed `Sequence` into a `loom_core::Pattern<Value>`.

use crate::ast::{Atom, Elem, Modifier, Sequence};
use loom_core::pattern::combinators::{degrade, euclid, fast, slow, slowcat, stack, time_cat};
use loom_core::pattern::{atom as pure_atom, silence};
use loom_core::{Pattern, Time, Value};
use num_rational::Ratio;

/// Flatten `!n` (replicate-outside-slot) modifiers: an elem with
/// `ReplicateOut(n)` expands into `n` copies of itself with that
/// modifier stripped, each taking its own slot in the sequence.
fn expand_replicate(elems: &[Elem]) -> Vec<Elem> {
    let mut out = Vec::new();
    for e in elems {
        let reps = e
            .mods
            .iter()
            .find_map(|m| match m {
                Modifier::ReplicateOut(n) => Some(*n),
                _ => None,
            })
            .unwrap_or(1);
        let mods: Vec<Modifier> = e
            .mods
            .iter()
            .copied()
            .filter(|m| !matches!(m, Modifier::ReplicateOut(_)))
            .collect();
        for _ in 0..reps.max(1) {
            out.push(Elem {
                atom: e.atom.clone(),
                mods: mods.clone(),
                span: e.span,
            });
        }
    }
    out
}

/// Compile a sequence into one cycle's worth of pattern, weighting
/// each element's slot by its `@w` modifier (default weight 1).
pub fn compile_sequence(seq: &Sequence) -> Pattern<Value> {
    let elems = expand_replicate(&seq.elems);
    if elems.is_empty() {
        return silence();
    }
    let pairs: Vec<(Time, Pattern<Value>)> = elems
        .iter()
        .map(|e| {
            let weight = e
                .mods
                .iter()
                .find_map(|m| match m {
                    Modifier::Weight(w) => Some(*w),
                    _ => None,
                })
                .unwrap_or_else(|| Ratio::from_integer(1));
            (weight, compile_elem(e))
        })
        .collect();
    time_cat(pairs)
}

fn compile_elem(elem: &Elem) -> Pattern<Value> {
    let mut p = compile_atom(&elem.atom);
    for m in &elem.mods {
        p = match m {
            Modifier::Fast(n) => fast(*n, p),
            Modifier::Slow(n) => slow(*n, p),
            Modifier::Degrade => degrade(p),
            Modifier::SampleIndex(n) => p.fmap({
                let n = *n;
                move |v| match v {
                    Value::String(s) => Value::String(format!("{s}:{}", n.to_integer())),
                    other => other,
                }
            }),
            Modifier::Euclid(n, k, rot) => {
                let n = n.to_integer().max(0) as usize;
                let k = k.to_integer().max(1) as usize;
                let rot = rot.map(|r| r.to_integer()).unwrap_or(0);
                euclid(n, k, rot, p)
            }
            // Weight and ReplicateOut are consumed by the caller before
            // `compile_elem` runs.
            Modifier::Weight(_) | Modifier::ReplicateOut(_) => p,
        };
    }
    p
}

fn compile_atom(atom: &Atom) -> Pattern<Value> {
    match atom {
        Atom::Rest => silence(),
        Atom::Name(s) => pure_atom(Value::String(s.clone())),
        Atom::Number(n) => pure_atom(number_value(*n)),
        // `[a b, c d]` and `{a b, c d e}` both stack their comma-separated
        // groups over the same cycle-length slot, each keeping its own
        // internal subdivision — that is exactly what stacking the
        // per-group `time_cat` already produces, so both atoms compile
        // identically.
        Atom::Group(groups) | Atom::Stack(groups) => {
            stack(groups.iter().map(compile_sequence).collect())
        }
        Atom::Alternation(seq) => {
            let candidates: Vec<Pattern<Value>> = seq.elems.iter().map(compile_elem).collect();
            if candidates.is_empty() {
                silence()
            } else {
                slowcat(candidates)
            }
        }
    }
}

/// Bare numeric literals in mini-notation keep exact rational value so
/// that durations/ratios used as control values (`speed "1.5"`) survive
/// without floating-point rounding until a consumer asks for `get_f`.
fn number_value(n: Time) -> Value {
    if *n.denom() == 1 {
        Value::Int32(*n.numer() as i32)
    } else {
        Value::Rational(n)
    }
}

/// `parse(input)` errors stop compilation at the existing partial
/// sequence; this helper is what `lib.rs::parse_pattern` drives.
pub fn compile(seq: &Sequence) -> Pattern<Value> {
    compile_sequence(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use loom_core::{Span, State};

    fn query_one_cycle(p: &Pattern<Value>) -> Vec<Value> {
        let events = p.query(&State::new(Span::new(
            Ratio::from_integer(0),
            Ratio::from_integer(1),
        )));
        events.into_iter().map(|e| e.value).collect()
    }

    #[test]
    fn compiles_flat_sequence() {
        let result = parse("bd sn");
        let p = compile(&result.value);
        let values = query_one_cycle(&p);
        assert_eq!(
            values,
            vec![
                Value::String("bd".to_string()),
                Value::String("sn".to_string())
            ]
        );
    }

    #[test]
    fn rest_produces_no_event() {
        let result = parse("bd ~ sn");
        let p = compile(&result.value);
        let values = query_one_cycle(&p);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn fast_modifier_repeats_within_slot() {
        let result = parse("bd*2 sn");
        let p = compile(&result.value);
        let values = query_one_cycle(&p);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn euclid_modifier_matches_inline_function_form() {
        let inline = compile(&parse("x(3,8)").value);
        let events = inline.query(&State::new(Span::new(
            Ratio::from_integer(0),
            Ratio::from_integer(1),
        )));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn range_expands_to_sequence_of_numbers() {
        let result = parse("0..3");
        let p = compile(&result.value);
        let values = query_one_cycle(&p);
        assert_eq!(
            values,
            vec![
                Value::Int32(0),
                Value::Int32(1),
                Value::Int32(2),
                Value::Int32(3)
            ]
        );
    }

    #[test]
    fn replicate_out_expands_slots() {
        let result = parse("bd!3 sn");
        let p = compile(&result.value);
        let values = query_one_cycle(&p);
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn bracket_group_compresses_into_one_slot() {
        let result = parse("bd [sn sn]");
        let p = compile(&result.value);
        let values = query_one_cycle(&p);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn polyrhythm_stack_plays_groups_simultaneously() {
        let result = parse("{bd bd, sn sn sn}");
        let p = compile(&result.value);
        let values = query_one_cycle(&p);
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn alternation_picks_one_per_cycle() {
        let result = parse("<bd sn cp>");
        let p = compile(&result.value);
        let cycle0 = p.query(&State::new(Span::new(
            Ratio::from_integer(0),
            Ratio::from_integer(1),
        )));
        let cycle1 = p.query(&State::new(Span::new(
            Ratio::from_integer(1),
            Ratio::from_integer(2),
        )));
        assert_eq!(cycle0[0].value, Value::String("bd".to_string()));
        assert_eq!(cycle1[0].value, Value::String("sn".to_string()));
    }
}
