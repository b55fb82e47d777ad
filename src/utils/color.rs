use crate::constants::limits::MAX_COLOR_INDEX;
use serde_json::Value;

/// Maps any color input onto the API's 0-32 palette index; anything unusable becomes 0.
///
/// Accepts integers, finite floats (truncated) and numeric strings.
pub fn normalize_color(value: &Value) -> u8 {
    let numeric = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match numeric {
        Some(index) if (0..=MAX_COLOR_INDEX as i64).contains(&index) => index as u8,
        _ => 0,
    }
}
