//! Tagged control values and the `ControlMap` event payload shape.

use crate::pattern::Pattern;
use crate::time::Time;
use std::collections::BTreeMap;

/// A tagged control value. `Signal` carries a pattern that must be
/// resolved (see [`crate::controls::resolve_state`]) into a concrete
/// value once per tick before events reach a target.
#[derive(Clone)]
pub enum Value {
    Int32(i32),
    Double(f64),
    Rational(Time),
    String(String),
    Bool(bool),
    Blob(Vec<u8>),
    Signal(Pattern<Value>),
    List(Vec<Value>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "Int32({v})"),
            Value::Double(v) => write!(f, "Double({v})"),
            Value::Rational(v) => write!(f, "Rational({v})"),
            Value::String(v) => write!(f, "String({v:?})"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Blob(v) => write!(f, "Blob({} bytes)", v.len()),
            Value::Signal(_) => write!(f, "Signal(<pattern>)"),
            Value::List(v) => write!(f, "List({v:?})"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Signals compare unequal to everything, including other
            // signals: they are not values, only deferred computations.
            _ => false,
        }
    }
}

impl Value {
    /// Coerce to `f64`, parsing strings and converting other numerics.
    pub fn get_f(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Rational(v) => Some(*v.numer() as f64 / *v.denom() as f64),
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Coerce to `i32`, truncating floats and parsing strings.
    pub fn get_i(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            Value::Double(v) => Some(*v as i32),
            Value::Rational(v) => Some((*v.numer() / *v.denom()) as i32),
            Value::String(s) => s
                .parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i32)),
            Value::Bool(b) => Some(if *b { 1 } else { 0 }),
            _ => None,
        }
    }

    pub fn get_s(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int32(v) => Some(v.to_string()),
            Value::Double(v) => Some(v.to_string()),
            Value::Rational(v) => Some(v.to_string()),
            Value::Bool(v) => Some(v.to_string()),
            _ => None,
        }
    }

    pub fn get_b(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int32(v) => Some(*v != 0),
            Value::Double(v) => Some(*v != 0.0),
            Value::String(s) => match s.as_str() {
                "t" | "true" | "1" => Some(true),
                "f" | "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Named-parameter map carried as an event payload. Insertion order is
/// not semantically meaningful, so a `BTreeMap` is used to give
/// deterministic iteration (useful for tests and wire encoding) at no
/// extra cost over a hash map.
pub type ControlMap = BTreeMap<String, Value>;

/// Merge `right` on top of `left`: keys in `right` win on clash.
pub fn union_right(mut left: ControlMap, right: &ControlMap) -> ControlMap {
    for (k, v) in right {
        left.insert(k.clone(), v.clone());
    }
    left
}

/// Merge `left` on top of `right`: keys in `left` win on clash.
pub fn union_left(left: &ControlMap, right: &ControlMap) -> ControlMap {
    let mut out = right.clone();
    for (k, v) in left {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Apply a numeric binary operator to every key present in both maps,
/// keeping keys unique to either side unchanged.
pub fn zip_numeric(
    left: &ControlMap,
    right: &ControlMap,
    op: impl Fn(f64, f64) -> f64,
) -> ControlMap {
    let mut out = left.clone();
    for (k, rv) in right {
        match out.get(k) {
            Some(lv) => {
                if let (Some(a), Some(b)) = (lv.get_f(), rv.get_f()) {
                    out.insert(k.clone(), Value::Double(op(a, b)));
                } else {
                    out.insert(k.clone(), rv.clone());
                }
            }
            None => {
                out.insert(k.clone(), rv.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_string_to_numbers() {
        let v = Value::String("3.5".to_string());
        assert_eq!(v.get_f(), Some(3.5));
        assert_eq!(v.get_i(), Some(3));
    }

    #[test]
    fn union_right_prefers_right_on_clash() {
        let mut left: ControlMap = ControlMap::new();
        left.insert("n".to_string(), Value::Int32(1));
        let mut right: ControlMap = ControlMap::new();
        right.insert("n".to_string(), Value::Int32(2));
        right.insert("gain".to_string(), Value::Double(0.8));
        let merged = union_right(left, &right);
        assert_eq!(merged.get("n"), Some(&Value::Int32(2)));
        assert_eq!(merged.get("gain"), Some(&Value::Double(0.8)));
    }

    #[test]
    fn zip_numeric_adds_shared_keys() {
        let mut left = ControlMap::new();
        left.insert("n".to_string(), Value::Int32(2));
        let mut right = ControlMap::new();
        right.insert("n".to_string(), Value::Int32(3));
        let summed = zip_numeric(&left, &right, |a, b| a + b);
        assert_eq!(summed.get("n").unwrap().get_f(), Some(5.0));
    }
}
