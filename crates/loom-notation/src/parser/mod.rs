//! Mini-notation parser.
//!
//! The grammar is small enough to parse by a hand-written recursive
//! descent over a cursor, falling to `lexer`'s winnow combinators only
//! for the leaf tokens (numbers, barewords). Like the rest of this
//! crate's parsing style, it is generous: a malformed element stops the
//! enclosing sequence but still returns whatever was parsed so far,
//! with the problem recorded as feedback rather than a hard failure.

mod lexer;

use crate::ast::{Atom, Elem, Modifier, Sequence, Span};
use crate::feedback::{FeedbackCollector, ParseResult};
use lexer::{looks_like_number, parse_name, parse_number, Lexer};
use loom_core::Time;
use num_rational::Ratio;

/// Parse a full mini-notation string into a `Sequence`.
pub fn parse(input: &str) -> ParseResult<Sequence> {
    let mut lx = Lexer::new(input);
    let mut collector = FeedbackCollector::new();
    let seq = parse_seq(&mut lx, &mut collector, &[]);
    lx.skip_ws();
    if !lx.is_empty() {
        let (line, col) = lx.line_col(lx.pos());
        collector.set_position(line, col);
        collector.error(format!("unexpected trailing input: {:?}", lx.rest));
    }
    ParseResult::new(seq, collector.into_feedback())
}

fn make_span(lx: &Lexer, start: usize) -> Span {
    let end = lx.pos();
    let (line, column) = lx.line_col(start);
    Span {
        start,
        end,
        line,
        column,
    }
}

fn parse_seq(lx: &mut Lexer, collector: &mut FeedbackCollector, stop: &[char]) -> Sequence {
    let mut elems = Vec::new();
    loop {
        lx.skip_ws();
        match lx.peek_char() {
            None => break,
            Some(c) if stop.contains(&c) => break,
            _ => {}
        }
        match parse_elem_or_range(lx, collector) {
            Some(mut produced) => elems.append(&mut produced),
            None => break,
        }
    }
    Sequence { elems }
}

/// Parses one `elem`, expanding a bare `N..M` range into several
/// unmodified numeric elems (spec.md's range sugar, e.g. `"0..3"`).
fn parse_elem_or_range(lx: &mut Lexer, collector: &mut FeedbackCollector) -> Option<Vec<Elem>> {
    let start = lx.pos();
    let checkpoint = lx.rest;

    if looks_like_number(lx.rest) {
        if let Ok(lo) = parse_number(&mut lx.rest) {
            if lx.eat_char('.') && lx.eat_char('.') {
                match parse_number(&mut lx.rest) {
                    Ok(hi) => return Some(expand_range(lx, start, lo, hi)),
                    Err(_) => {
                        lx.rest = checkpoint; // not actually a range; reparse normally
                    }
                }
            } else {
                lx.rest = checkpoint;
            }
        }
    }

    parse_elem(lx, collector).map(|e| vec![e])
}

fn expand_range(lx: &Lexer, start: usize, lo: Time, hi: Time) -> Vec<Elem> {
    let lo_i = lo.to_integer();
    let hi_i = hi.to_integer();
    let span = make_span(lx, start);
    let mut out = Vec::new();
    if lo_i <= hi_i {
        for n in lo_i..=hi_i {
            out.push(Elem {
                atom: Atom::Number(Ratio::from_integer(n)),
                mods: Vec::new(),
                span,
            });
        }
    } else {
        let mut n = lo_i;
        while n >= hi_i {
            out.push(Elem {
                atom: Atom::Number(Ratio::from_integer(n)),
                mods: Vec::new(),
                span,
            });
            n -= 1;
        }
    }
    out
}

fn parse_elem(lx: &mut Lexer, collector: &mut FeedbackCollector) -> Option<Elem> {
    let start = lx.pos();
    let atom = parse_atom(lx, collector)?;
    let mods = parse_mods(lx, collector);
    Some(Elem {
        atom,
        mods,
        span: make_span(lx, start),
    })
}

fn parse_atom(lx: &mut Lexer, collector: &mut FeedbackCollector) -> Option<Atom> {
    let (line, column) = lx.line_col(lx.pos());
    match lx.peek_char() {
        Some('~') => {
            lx.eat_char('~');
            Some(Atom::Rest)
        }
        Some('[') => {
            lx.eat_char('[');
            let groups = parse_comma_groups(lx, collector, ']');
            if !lx.eat_char(']') {
                collector.set_position(line, column);
                collector.error("unterminated '['");
                return None;
            }
            Some(Atom::Group(groups))
        }
        Some('{') => {
            lx.eat_char('{');
            let groups = parse_comma_groups(lx, collector, '}');
            if !lx.eat_char('}') {
                collector.set_position(line, column);
                collector.error("unterminated '{'");
                return None;
            }
            Some(Atom::Stack(groups))
        }
        Some('<') => {
            lx.eat_char('<');
            let inner = parse_seq(lx, collector, &['>']);
            if !lx.eat_char('>') {
                collector.set_position(line, column);
                collector.error("unterminated '<'");
                return None;
            }
            Some(Atom::Alternation(inner))
        }
        Some(_) if looks_like_number(lx.rest) => {
            match parse_number(&mut lx.rest) {
                Ok(n) => Some(Atom::Number(n)),
                Err(_) => {
                    collector.set_position(line, column);
                    collector.error("expected a number");
                    None
                }
            }
        }
        Some(_) => match parse_name(&mut lx.rest) {
            Ok(name) if !name.is_empty() => Some(Atom::Name(name)),
            _ => {
                collector.set_position(line, column);
                collector.error(format!("unexpected character {:?}", lx.peek_char()));
                None
            }
        },
        None => {
            collector.set_position(line, column);
            collector.error("unexpected end of input, expected an element");
            None
        }
    }
}

fn parse_comma_groups(lx: &mut Lexer, collector: &mut FeedbackCollector, close: char) -> Vec<Sequence> {
    let mut groups = Vec::new();
    loop {
        let seq = parse_seq(lx, collector, &[',', close]);
        groups.push(seq);
        lx.skip_ws();
        if lx.eat_char(',') {
            continue;
        }
        break;
    }
    groups
}

fn parse_mods(lx: &mut Lexer, collector: &mut FeedbackCollector) -> Vec<Modifier> {
    let mut mods = Vec::new();
    loop {
        let (line, column) = lx.line_col(lx.pos());
        match lx.peek_char() {
            Some('*') => {
                lx.eat_char('*');
                match parse_number(&mut lx.rest) {
                    Ok(n) => mods.push(Modifier::Fast(n)),
                    Err(_) => {
                        collector.set_position(line, column);
                        collector.error("expected a number after '*'");
                        break;
                    }
                }
            }
            Some('/') => {
                lx.eat_char('/');
                match parse_number(&mut lx.rest) {
                    Ok(n) => mods.push(Modifier::Slow(n)),
                    Err(_) => {
                        collector.set_position(line, column);
                        collector.error("expected a number after '/'");
                        break;
                    }
                }
            }
            Some('@') => {
                lx.eat_char('@');
                match parse_number(&mut lx.rest) {
                    Ok(n) => mods.push(Modifier::Weight(n)),
                    Err(_) => {
                        collector.set_position(line, column);
                        collector.error("expected a number after '@'");
                        break;
                    }
                }
            }
            Some('?') => {
                lx.eat_char('?');
                mods.push(Modifier::Degrade);
            }
            Some('!') => {
                lx.eat_char('!');
                let n = if looks_like_number(lx.rest) {
                    parse_number(&mut lx.rest).ok()
                } else {
                    None
                };
                let count = n.map(|r| r.to_integer().max(1) as usize).unwrap_or(2);
                mods.push(Modifier::ReplicateOut(count));
            }
            Some(':') => {
                lx.eat_char(':');
                match parse_number(&mut lx.rest) {
                    Ok(n) => mods.push(Modifier::SampleIndex(n)),
                    Err(_) => {
                        collector.set_position(line, column);
                        collector.error("expected a number after ':'");
                        break;
                    }
                }
            }
            Some('(') => {
                lx.eat_char('(');
                let euclid = (|| {
                    lx.skip_ws();
                    let n = parse_number(&mut lx.rest).ok()?;
                    lx.skip_ws();
                    if !lx.eat_char(',') {
                        return None;
                    }
                    lx.skip_ws();
                    let k = parse_number(&mut lx.rest).ok()?;
                    lx.skip_ws();
                    let rot = if lx.eat_char(',') {
                        lx.skip_ws();
                        let r = parse_number(&mut lx.rest).ok()?;
                        lx.skip_ws();
                        Some(r)
                    } else {
                        None
                    };
                    if !lx.eat_char(')') {
                        return None;
                    }
                    Some((n, k, rot))
                })();
                match euclid {
                    Some((n, k, rot)) => mods.push(Modifier::Euclid(n, k, rot)),
                    None => {
                        collector.set_position(line, column);
                        collector.error("malformed euclidean modifier, expected '(n,k)' or '(n,k,rot)'");
                        break;
                    }
                }
            }
            _ => break,
        }
    }
    mods
}
