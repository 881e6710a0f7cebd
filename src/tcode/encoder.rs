//! Value to TCode token conversion.

use core::fmt::Write;

use libm::round;

use crate::config::{AxisConfig, AxisValue};

/// Largest four digit magnitude.
pub const MAX_CODE: u16 = 9999;

/// Keeps rounding from landing on a boundary code outside the configured range.
const COMPRESSION: f64 = 0.9999;

const SCALE: f64 = 10_000.0;

/// Convert a value to its four digit magnitude for an axis.
///
/// Numeric values are mapped into the axis `[min, max]` range first.
/// Flags map to the ends of the scale.
pub fn value_code(axis: &AxisConfig, value: AxisValue) -> u16 {
    let flag = match value {
        AxisValue::Flag(b) => Some(b),
        AxisValue::Number(v) if axis.axis_type.is_boolean() => Some(v >= 0.5),
        AxisValue::Number(_) => None,
    };

    match (flag, value) {
        (Some(true), _) => MAX_CODE,
        (Some(false), _) => 0,
        (None, AxisValue::Number(v)) => {
            let scaled = axis.min + (axis.max - axis.min) * v;
            round(scaled * COMPRESSION * SCALE).clamp(0.0, MAX_CODE as f64) as u16
        }
        // Flags were handled above
        (None, AxisValue::Flag(_)) => 0,
    }
}

/// Encode a single `(axis, value)` pair as a token, e.g. `L04800`.
pub fn encode_value(axis: &AxisConfig, value: AxisValue) -> String {
    let mut token = String::with_capacity(axis.name.len() + 4);
    let _ = write!(token, "{}{:04}", axis.name, value_code(axis, value));
    token
}

/// Join tokens into one protocol line.
///
/// Returns `None` when there is nothing to send.
pub fn encode_line<I, S>(tokens: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(token.as_ref());
    }

    if line.is_empty() {
        None
    } else {
        line.push('\n');
        Some(line)
    }
}

/// Recover the normalized value a numeric code was produced from.
///
/// Accurate to within one quantization step of the axis range.
pub fn decode_value(axis: &AxisConfig, code: u16) -> f64 {
    let scaled = code as f64 / (COMPRESSION * SCALE);
    ((scaled - axis.min) / (axis.max - axis.min)).clamp(0.0, 1.0)
}

/// Split a token into its axis code and magnitude.
///
/// The magnitude is always the last four characters.
pub fn parse_token(token: &str) -> Option<(&str, u16)> {
    if token.len() <= 4 || !token.is_char_boundary(token.len() - 4) {
        return None;
    }
    let (axis, digits) = token.split_at(token.len() - 4);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|code| (axis, code))
}
