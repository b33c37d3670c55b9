//! ICMP type names.

use serde_json::Value;

use super::display_value;

/// Human-readable name for an ICMP message type.
pub fn type_name(code: u64) -> Option<&'static str> {
    let name = match code {
        0 => "Echo Reply",
        3 => "Destination Unreachable",
        4 => "Source Quench",
        5 => "Redirect",
        8 => "Echo Request",
        11 => "Time Exceeded",
        12 => "Parameter Problem",
        13 => "Timestamp Request",
        14 => "Timestamp Reply",
        15 => "Information Request",
        16 => "Information Reply",
        _ => return None,
    };
    Some(name)
}

/// Render an `icmp_type` field. Integral numbers (`8` or `8.0`) go through
/// the table, other numbers become `Type <n>`, anything else is shown as-is.
pub fn describe_type(value: &Value) -> String {
    match value {
        Value::Number(n) => match integral(n).and_then(type_name) {
            Some(name) => name.to_string(),
            None => format!("Type {}", n),
        },
        other => display_value(other),
    }
}

fn integral(n: &serde_json::Number) -> Option<u64> {
    if let Some(code) = n.as_u64() {
        return Some(code);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u8::MAX as f64)
        .map(|f| f as u64)
}
