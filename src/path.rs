//! Dotted-path lookups into decoded JSON responses.
//!
//! Source configurations locate fields with paths such as `data.items` or
//! `author.name`. Every segment is a mapping key. Numeric-looking segments
//! (`items.0`) are looked up as keys too, never as array positions, because
//! existing source configurations depend on that behaviour.
//!
//! Nothing here fails: a missing segment, or a segment applied to something
//! that is not an object, resolves to "no value".

use serde_json::Value;

/// Follow `path` through `value` one key at a time.
///
/// Returns `None` as soon as a segment is missing or the current value is
/// not an object.
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Resolve `path` and render the result as text.
///
/// Strings come back as-is, non-zero numbers and `true` in their JSON form.
/// Missing values, `null`, `0`, `false`, objects and arrays all give an
/// empty string, so a zero id or title counts as absent.
pub fn resolve_str(value: &Value, path: &str) -> String {
    match resolve(value, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => true.to_string(),
        _ => String::new(),
    }
}

/// Resolve `path` to an array, or an empty slice when it is absent or not an
/// array.
pub fn resolve_list<'a>(value: &'a Value, path: &str) -> &'a [Value] {
    resolve(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested_keys() {
        let v = json!({"data": {"items": [1, 2], "meta": {"page": 3}}});
        assert_eq!(resolve(&v, "data.meta.page"), Some(&json!(3)));
        assert_eq!(resolve(&v, "data.items"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_resolve_missing_segment_is_none() {
        let v = json!({"data": {"items": []}});
        assert_eq!(resolve(&v, "data.missing"), None);
        assert_eq!(resolve(&v, "nope.items"), None);
    }

    #[test]
    fn test_resolve_through_scalar_is_none() {
        let v = json!({"data": "text"});
        assert_eq!(resolve(&v, "data.items"), None);
        assert_eq!(resolve(&json!(42), "a"), None);
    }

    #[test]
    fn test_numeric_segment_is_a_key_not_an_index() {
        let v = json!({"items": ["first", "second"]});
        assert_eq!(resolve(&v, "items.0"), None);

        let keyed = json!({"items": {"0": "zero"}});
        assert_eq!(resolve_str(&keyed, "items.0"), "zero");
    }

    #[test]
    fn test_resolve_str_renders_scalars() {
        let v = json!({"t": "Title", "n": 17, "f": 1.5, "b": true, "z": null, "o": {"k": 1}});
        assert_eq!(resolve_str(&v, "t"), "Title");
        assert_eq!(resolve_str(&v, "n"), "17");
        assert_eq!(resolve_str(&v, "f"), "1.5");
        assert_eq!(resolve_str(&v, "b"), "true");
        assert_eq!(resolve_str(&v, "z"), "");
        assert_eq!(resolve_str(&v, "o"), "");
        assert_eq!(resolve_str(&v, "missing"), "");
    }

    #[test]
    fn test_resolve_str_zero_and_false_are_empty() {
        let v = json!({"i": 0, "f": 0.0, "b": false, "s": "0", "neg": -3});
        assert_eq!(resolve_str(&v, "i"), "");
        assert_eq!(resolve_str(&v, "f"), "");
        assert_eq!(resolve_str(&v, "b"), "");
        assert_eq!(resolve_str(&v, "s"), "0");
        assert_eq!(resolve_str(&v, "neg"), "-3");
    }

    #[test]
    fn test_resolve_list_defaults_to_empty() {
        let v = json!({"data": {"items": [{"t": "a"}], "count": 1}});
        assert_eq!(resolve_list(&v, "data.items").len(), 1);
        assert!(resolve_list(&v, "data.count").is_empty());
        assert!(resolve_list(&v, "data.absent").is_empty());
        assert!(resolve_list(&json!([1, 2, 3]), "data").is_empty());
    }
}
