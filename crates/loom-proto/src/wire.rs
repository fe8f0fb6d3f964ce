//! NTP timestamps and value<->`OscType` conversion.

use crate::error::ProtoError;
use loom_core::Value;
use rosc::OscType;

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch
/// (1970-01-01), per RFC 5905.
const NTP_UNIX_EPOCH_DELTA: f64 = 2_208_988_800.0;

/// Build an NTP-format timestamp (32-bit seconds, 32-bit fixed-point
/// fraction) from a Unix wall-clock time in seconds. This is the only
/// place a `Tempo`-derived `f64` is reformatted for the wire.
pub fn ntp_time(unix_seconds: f64) -> rosc::OscTime {
    let ntp = unix_seconds + NTP_UNIX_EPOCH_DELTA;
    let seconds = ntp.floor().max(0.0) as u32;
    let fractional = ((ntp - ntp.floor()) * (u32::MAX as f64 + 1.0)) as u32;
    rosc::OscTime {
        seconds,
        fractional,
    }
}

/// Split a Unix wall-clock time into `(seconds, microseconds)`, used by
/// the message-stamped schedule mode (two leading int args).
pub fn unix_seconds_micros(unix_seconds: f64) -> (i32, i32) {
    let secs = unix_seconds.floor();
    let micros = ((unix_seconds - secs) * 1_000_000.0).round();
    (secs as i32, micros as i32)
}

pub fn value_to_osc(value: &Value) -> Result<OscType, ProtoError> {
    Ok(match value {
        Value::Int32(v) => OscType::Int(*v),
        Value::Double(v) => OscType::Float(*v as f32),
        Value::Rational(v) => OscType::Float(*v.numer() as f32 / *v.denom() as f32),
        Value::String(s) => OscType::String(s.clone()),
        Value::Bool(b) => OscType::Bool(*b),
        Value::Blob(bytes) => OscType::Blob(bytes.clone()),
        Value::List(items) => OscType::Array(rosc::OscArray {
            content: items
                .iter()
                .map(value_to_osc)
                .collect::<Result<Vec<_>, _>>()?,
        }),
        Value::Signal(_) => return Err(ProtoError::UnresolvedSignal("<signal>".to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntp_time_offsets_by_the_epoch_delta() {
        let t = ntp_time(0.0);
        assert_eq!(t.seconds, NTP_UNIX_EPOCH_DELTA as u32);
        assert_eq!(t.fractional, 0);
    }

    #[test]
    fn ntp_time_encodes_fractional_seconds() {
        let t = ntp_time(1.5);
        assert_eq!(t.seconds, NTP_UNIX_EPOCH_DELTA as u32 + 1);
        assert!(t.fractional > u32::MAX / 2 - 1000 && t.fractional < u32::MAX / 2 + 1000);
    }

    #[test]
    fn message_stamped_splits_seconds_and_micros() {
        let (s, us) = unix_seconds_micros(10.25);
        assert_eq!(s, 10);
        assert_eq!(us, 250_000);
    }

    #[test]
    fn value_conversion_round_trips_primitives() {
        assert_eq!(value_to_osc(&Value::Int32(3)).unwrap(), OscType::Int(3));
        assert_eq!(
            value_to_osc(&Value::String("bd".into())).unwrap(),
            OscType::String("bd".into())
        );
        assert_eq!(value_to_osc(&Value::Bool(true)).unwrap(), OscType::Bool(true));
    }
}
