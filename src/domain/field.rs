// Dotted-path lookup into nested telemetry records
use serde_json::Value;

/// Walk `record` one `.`-separated segment at a time.
///
/// Objects are indexed by key and arrays by numeric segment. Returns `None` as soon as a segment is
/// absent, the current node cannot be traversed, or the final value is JSON `null`.
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .filter(|value| !value.is_null())
}

/// Resolve a path and read it as a number. Numeric strings are accepted.
pub fn resolve_number(record: &Value, path: &str) -> Option<f64> {
    resolve(record, path).and_then(as_number)
}

/// Resolve a path and read it as a non-empty string.
pub fn resolve_str<'a>(record: &'a Value, path: &str) -> Option<&'a str> {
    resolve(record, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Trailing segment of a dotted path: `power.KW.L1` -> `L1`.
pub fn leaf(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
