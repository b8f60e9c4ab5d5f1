//! Attribute maps carried by insert and retain ops.
//!
//! Values are arbitrary JSON scalars (`true` for bold, `2` for a header
//! level, a color string, ...). `Value::Null` marks removal of a format.
use std::collections::BTreeMap;

use serde_json::Value;

/// Formatting attributes attached to an op, keyed by format name.
pub type AttributeMap = BTreeMap<String, Value>;

/// Merges `b` over `a` for sequential composition.
///
/// `Null` entries in `b` mark format removal. They are kept only when
/// `keep_null` is set: composing onto a retain, where the removal still has
/// to reach the underlying text. Composing onto an insert resolves the
/// removal immediately, so the null is dropped.
pub fn compose(
    a: Option<&AttributeMap>,
    b: Option<&AttributeMap>,
    keep_null: bool,
) -> Option<AttributeMap> {
    let mut attributes: AttributeMap = b.cloned().unwrap_or_default();
    if !keep_null {
        attributes.retain(|_, value| !value.is_null());
    }
    if let Some(a) = a {
        for (key, value) in a {
            if b.map_or(true, |b| !b.contains_key(key)) {
                attributes.insert(key.clone(), value.clone());
            }
        }
    }
    if attributes.is_empty() {
        None
    } else {
        Some(attributes)
    }
}

/// Computes the attribute map that reverses `attr` relative to `base`.
///
/// Formats that `attr` changed are restored to their `base` value; formats
/// that `attr` introduced are nulled out.
pub fn invert(attr: Option<&AttributeMap>, base: Option<&AttributeMap>) -> Option<AttributeMap> {
    let empty = AttributeMap::new();
    let attr = attr.unwrap_or(&empty);
    let base = base.unwrap_or(&empty);

    let mut inverted = AttributeMap::new();
    for (key, base_value) in base {
        if attr.get(key).is_some_and(|value| value != base_value) {
            inverted.insert(key.clone(), base_value.clone());
        }
    }
    for key in attr.keys() {
        if !base.contains_key(key) {
            inverted.insert(key.clone(), Value::Null);
        }
    }
    if inverted.is_empty() {
        None
    } else {
        Some(inverted)
    }
}

/// Rebases `b` against a concurrently applied `a`.
///
/// With `priority`, `a` is considered to have happened first and wins
/// conflicting keys; without it `b` simply overwrites.
pub fn transform(
    a: Option<&AttributeMap>,
    b: Option<&AttributeMap>,
    priority: bool,
) -> Option<AttributeMap> {
    let Some(a) = a else {
        return b.cloned();
    };
    let Some(b) = b else {
        return None;
    };
    if !priority {
        return Some(b.clone());
    }
    let filtered: AttributeMap = b
        .iter()
        .filter(|(key, _)| !a.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if filtered.is_empty() {
        None
    } else {
        Some(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_compose_merges_and_overwrites() {
        let a = attrs(&[("bold", json!(true)), ("color", json!("red"))]);
        let b = attrs(&[("color", json!("blue")), ("italic", json!(true))]);
        let composed = compose(Some(&a), Some(&b), false).expect("non-empty");
        assert_eq!(composed.get("bold"), Some(&json!(true)));
        assert_eq!(composed.get("color"), Some(&json!("blue")));
        assert_eq!(composed.get("italic"), Some(&json!(true)));
    }

    #[test]
    fn test_compose_drops_null_without_keep_null() {
        let b = attrs(&[("bold", Value::Null)]);
        assert_eq!(compose(None, Some(&b), false), None);
        let kept = compose(None, Some(&b), true).expect("kept");
        assert_eq!(kept.get("bold"), Some(&Value::Null));
    }

    #[test]
    fn test_invert_restores_changed_and_nulls_added() {
        let base = attrs(&[("bold", json!(true)), ("color", json!("red"))]);
        let attr = attrs(&[("color", json!("blue")), ("italic", json!(true))]);
        let inverted = invert(Some(&attr), Some(&base)).expect("non-empty");
        assert_eq!(inverted.get("color"), Some(&json!("red")));
        assert_eq!(inverted.get("italic"), Some(&Value::Null));
        // bold was untouched by attr, so it needs no restoring
        assert!(!inverted.contains_key("bold"));
    }

    #[test]
    fn test_invert_of_noop_is_empty() {
        let base = attrs(&[("bold", json!(true))]);
        let attr = attrs(&[("bold", json!(true))]);
        assert_eq!(invert(Some(&attr), Some(&base)), None);
    }

    #[test]
    fn test_transform_priority_keeps_left_wins() {
        let a = attrs(&[("bold", json!(true)), ("color", json!("red"))]);
        let b = attrs(&[("color", json!("blue")), ("italic", json!(true))]);
        let t = transform(Some(&a), Some(&b), true).expect("non-empty");
        assert!(!t.contains_key("color"));
        assert_eq!(t.get("italic"), Some(&json!(true)));

        let no_priority = transform(Some(&a), Some(&b), false).expect("non-empty");
        assert_eq!(no_priority, b);
    }

    #[test]
    fn test_transform_with_missing_sides() {
        let b = attrs(&[("bold", json!(true))]);
        assert_eq!(transform(None, Some(&b), true), Some(b.clone()));
        assert_eq!(transform(Some(&b), None, true), None);
    }
}
