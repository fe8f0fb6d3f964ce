//! Leaf tokens shared by the structural parser: numbers and names.

use loom_core::Time;
use num_rational::Ratio;
use winnow::combinator::{alt, opt, preceded};
use winnow::prelude::*;
use winnow::token::take_while;

type PResult<T> = winnow::ModalResult<T>;

/// A handle on the input that can still report `(line, column)` for any
/// byte offset, even though parsing itself advances a `&str` cursor.
pub struct Lexer<'a> {
    original: &'a str,
    pub rest: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            original: input,
            rest: input,
        }
    }

    pub fn pos(&self) -> usize {
        self.original.len() - self.rest.len()
    }

    pub fn line_col(&self, byte_pos: usize) -> (usize, usize) {
        let prefix = &self.original[..byte_pos.min(self.original.len())];
        let line = prefix.matches('\n').count() + 1;
        let column = match prefix.rfind('\n') {
            Some(idx) => prefix[idx + 1..].chars().count() + 1,
            None => prefix.chars().count() + 1,
        };
        (line, column)
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    pub fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t', '\n', '\r']);
    }

    pub fn eat_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.rest = &self.rest[c.len_utf8()..];
            true
        } else {
            false
        }
    }
}

/// `-?digits(.digits | %digits)?` as an exact rational.
pub fn parse_number(input: &mut &str) -> PResult<Time> {
    let neg = opt('-').parse_next(input)?.is_some();
    let int_part: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let suffix = opt(alt((
        preceded('.', take_while(1.., |c: char| c.is_ascii_digit())).map(|d| (b'.', d)),
        preceded('%', take_while(1.., |c: char| c.is_ascii_digit())).map(|d| (b'%', d)),
    )))
    .parse_next(input)?;

    let int_v: i64 = int_part.parse().unwrap_or(0);
    let mut value = match suffix {
        Some((b'.', digits)) => {
            let frac_v: i64 = digits.parse().unwrap_or(0);
            let denom = 10i64.pow(digits.len() as u32);
            Ratio::new(int_v * denom + frac_v, denom)
        }
        Some((b'%', digits)) => {
            let denom: i64 = digits.parse().unwrap_or(1);
            Ratio::new(int_v, denom.max(1))
        }
        _ => Ratio::from_integer(int_v),
    };
    if neg {
        value = -value;
    }
    Ok(value)
}

const RESERVED: [char; 12] = ['~', '[', ']', '{', '}', '<', '>', '*', '/', '@', '?', '('];

/// A bareword atom name: anything but whitespace, mini-notation
/// punctuation, and the `!`/`:`/`,`/`)` suffix/separator characters.
pub fn parse_name(input: &mut &str) -> PResult<String> {
    let s: &str = take_while(1.., |c: char| {
        !c.is_whitespace() && !RESERVED.contains(&c) && c != '!' && c != ':' && c != ',' && c != ')'
    })
    .parse_next(input)?;
    Ok(s.to_string())
}

pub fn looks_like_number(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') => matches!(chars.next(), Some(c) if c.is_ascii_digit()),
        _ => false,
    }
}
