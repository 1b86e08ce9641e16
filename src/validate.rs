//! Structural presence checks over dot-separated field paths.
//!
//! A path "exists" only when every segment resolves to a truthy value:
//! `null`, `false`, `0` and `""` all count as missing, so a legitimate zero or
//! `false` at a required path is rejected too.

use serde_json::Value;

/// Outcome of [`verify_props`]. Only the first missing path is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    pub missing: Option<&'static str>,
}

impl Verification {
    const VALID: Self = Self {
        valid: true,
        missing: None,
    };

    fn missing(path: &'static str) -> Self {
        Self {
            valid: false,
            missing: Some(path),
        }
    }
}

/// Loose truthiness of a JSON value.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Walk `path` through nested objects; false if any step is absent or falsy.
pub fn path_exists(obj: &Value, path: &str) -> bool {
    let mut current = obj;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) if truthy(next) => current = next,
            _ => return false,
        }
    }
    true
}

/// Check `paths` in order, stopping at the first one that does not exist.
pub fn verify_props(obj: &Value, paths: &[&'static str]) -> Verification {
    paths
        .iter()
        .find(|path| !path_exists(obj, path))
        .map_or(Verification::VALID, |path| Verification::missing(*path))
}
