//! Parses one REPL line into a call against the `Stream` handle.
//!
//! The grammar is deliberately small — a live-coding session names a
//! handful of control words and otherwise just assigns a quoted pattern
//! to a key:
//!
//! ```text
//! d1 "bd sn*2 hh(3,8)"   d2 n "0 .. 3"   mute d1   solo d2
//! hush   cps 0.5   cycle 0   nudge 0.02   once "bd"
//! ```

use loom_core::{ControlMap, Value};
use loom_daemon::Stream;
use num_rational::Ratio;
use owo_colors::OwoColorize;

/// Split a line into words, treating a `"..."` span as one word.
fn tokenize(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut word = String::new();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                word.push(c);
            }
            words.push(word);
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
            words.push(word);
        }
    }
    words
}

fn compile(text: &str, control: &str) -> Result<loom_core::Pattern<ControlMap>, String> {
    let parsed = loom_notation::parse_pattern(text);
    if parsed.has_errors() {
        let messages: Vec<_> = parsed.errors().map(|f| f.message.clone()).collect();
        return Err(messages.join("; "));
    }
    let control = control.to_string();
    Ok(parsed.value.fmap(move |v: Value| {
        let mut controls = ControlMap::new();
        controls.insert(control.clone(), v);
        controls
    }))
}

fn parse_rational(s: &str) -> Option<num_rational::Ratio<i64>> {
    if let Some((n, d)) = s.split_once('/') {
        return Some(Ratio::new(n.trim().parse().ok()?, d.trim().parse().ok()?));
    }
    let f: f64 = s.parse().ok()?;
    Some(Ratio::new((f * 1_000_000.0).round() as i64, 1_000_000))
}

/// Returns `true` if the line asked to end the session.
pub fn run_line(stream: &Stream, line: &str) -> bool {
    let words = tokenize(line.trim());
    let Some(head) = words.first() else {
        return false;
    };

    match head.as_str() {
        "quit" | "exit" => return true,
        "hush" => stream.hush(),
        "muteAll" => stream.mute_all(),
        "unmuteAll" => stream.unmute_all(),
        "unsoloAll" => stream.unsolo_all(),
        "mute" => with_key(&words, |k| stream.mute(k)),
        "unmute" => with_key(&words, |k| stream.unmute(k)),
        "solo" => with_key(&words, |k| stream.solo(k)),
        "unsolo" => with_key(&words, |k| stream.unsolo(k)),
        "silence" => with_key(&words, |k| stream.silence(k)),
        "cps" => with_number(&words, |r| stream.set_cps(r)),
        "cycle" => with_number(&words, |r| stream.set_cycle(r)),
        "nudge" => with_number(&words, |r| stream.nudge_all(ratio_to_f64(r))),
        "once" => {
            if let Some(text) = words.get(1) {
                match compile(text, "s") {
                    Ok(pattern) => stream.once(pattern),
                    Err(e) => eprintln!("{} {}", "parse error:".red(), e),
                }
            }
        }
        key => {
            let (control, text) = match words.get(2) {
                Some(text) => (words[1].as_str(), text.as_str()),
                None => ("s", words.get(1).map(String::as_str).unwrap_or("")),
            };
            match compile(text, control) {
                Ok(pattern) => stream.replace(key.to_string(), pattern),
                Err(e) => eprintln!("{} {}", "parse error:".red(), e),
            }
        }
    }
    false
}

fn with_key(words: &[String], f: impl FnOnce(&str)) {
    if let Some(key) = words.get(1) {
        f(key);
    } else {
        eprintln!("{}", "expected a key".red());
    }
}

fn with_number(words: &[String], f: impl FnOnce(num_rational::Ratio<i64>)) {
    match words.get(1).and_then(|s| parse_rational(s)) {
        Some(r) => f(r),
        None => eprintln!("{}", "expected a number".red()),
    }
}

fn ratio_to_f64(r: num_rational::Ratio<i64>) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("mute d1"), vec!["mute", "d1"]);
        assert_eq!(tokenize("  cps   0.5  "), vec!["cps", "0.5"]);
    }

    #[test]
    fn tokenize_keeps_quoted_span_as_one_word() {
        assert_eq!(
            tokenize(r#"d1 "bd sn*2 hh(3,8)""#),
            vec!["d1", "bd sn*2 hh(3,8)"]
        );
    }

    #[test]
    fn tokenize_allows_quoted_word_with_no_trailing_close() {
        assert_eq!(tokenize(r#"d2 n "0 .. 3"#), vec!["d2", "n", "0 .. 3"]);
    }

    #[test]
    fn parse_rational_accepts_fraction() {
        assert_eq!(parse_rational("3/8"), Some(Ratio::new(3, 8)));
    }

    #[test]
    fn parse_rational_accepts_decimal() {
        assert_eq!(parse_rational("0.5"), Some(Ratio::new(1, 2)));
    }

    #[test]
    fn parse_rational_rejects_garbage() {
        assert_eq!(parse_rational("not-a-number"), None);
    }

    #[test]
    fn compile_reports_parse_errors() {
        assert!(compile("bd(", "s").is_err());
    }

    #[test]
    fn compile_wraps_value_under_control_key() {
        let pattern = compile("bd", "s").expect("valid mini-notation should compile");
        let state = loom_core::State::new(loom_core::Span::point(num_rational::Ratio::new(0, 1)));
        let events = pattern.query(&state);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].value.get("s").and_then(Value::get_s),
            Some("bd".to_string())
        );
    }
}
