//! # JSON Views
//!
//! Permission-filtered projections of JSON documents, and the
//! depth-first document merger used to compose them with a white-list.
//!
//! A view recurses over the document's fields: each field's sub-path is
//! its parent path plus the field name, nested objects are filtered
//! recursively, and a leaf survives iff the context holds an effective
//! grant at that sub-path. Arrays are leaves: kept or dropped whole.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use twin_model::{AuthorizationContext, JsonPointer, PermissionSet, PointerLocation, ResourceKey};

use crate::enforcer::PolicyEnforcer;

/// Absolute resource paths whose fields a view force-includes.
///
/// A field is selected when it sits at or below a white-listed path.
/// The whitelist only takes effect for contexts with partial standing
/// at the resource type's root, so subjects with no footing in the
/// policy never see white-listed fields.
///
/// # Example
///
/// ```
/// use twin_enforcer::FieldWhitelist;
/// use twin_model::JsonPointer;
///
/// let whitelist = FieldWhitelist::of([JsonPointer::parse("/attributes/model").unwrap()]);
/// assert!(!whitelist.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldWhitelist {
    pointers: BTreeSet<JsonPointer>,
}

impl FieldWhitelist {
    /// An empty whitelist (selects nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a whitelist from pointers.
    pub fn of(pointers: impl IntoIterator<Item = JsonPointer>) -> Self {
        Self {
            pointers: pointers.into_iter().collect(),
        }
    }

    /// Check if the whitelist selects nothing.
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Whether `path` is at or below a white-listed pointer (selected
    /// with its whole subtree).
    fn covers(&self, path: &JsonPointer) -> bool {
        self.pointers
            .iter()
            .any(|w| matches!(w.locate(path), PointerLocation::Same | PointerLocation::Above))
    }

    /// Whether some white-listed pointer lies strictly below `path`,
    /// i.e. recursion into `path` can still select something.
    fn reaches_below(&self, path: &JsonPointer) -> bool {
        self.pointers
            .iter()
            .any(|w| w.locate(path) == PointerLocation::Below)
    }
}

/// Shared view construction behind both `build_json_view` trait
/// methods.
pub(crate) fn build_view<E: PolicyEnforcer + ?Sized>(
    enforcer: &E,
    key: &ResourceKey,
    fields: &Value,
    context: &AuthorizationContext,
    permissions: &PermissionSet,
    whitelist: Option<&FieldWhitelist>,
) -> Value {
    let filtered = filter_value(enforcer, key, fields, context, permissions);

    let Some(whitelist) = whitelist.filter(|w| !w.is_empty()) else {
        return filtered;
    };
    // White-listed fields are only revealed to contexts with at least
    // partial standing at the resource type's root.
    let type_root = ResourceKey::root(key.resource_type().clone());
    if !enforcer.has_partial_permissions(&type_root, context, permissions) {
        return filtered;
    }
    let selected = select_whitelisted(key.path(), fields, whitelist);
    if filtered.is_null() {
        return selected;
    }
    merge_json(&filtered, &selected)
}

/// The permission filter: objects recurse, everything else is a leaf
/// retained iff the context holds an effective grant at the path.
fn filter_value<E: PolicyEnforcer + ?Sized>(
    enforcer: &E,
    key: &ResourceKey,
    value: &Value,
    context: &AuthorizationContext,
    permissions: &PermissionSet,
) -> Value {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            let mut out = Map::new();
            for (name, field) in fields {
                let child_key = key.child(name.clone());
                match field {
                    Value::Object(members) if !members.is_empty() => {
                        let sub = filter_value(enforcer, &child_key, field, context, permissions);
                        if matches!(&sub, Value::Object(m) if !m.is_empty()) {
                            out.insert(name.clone(), sub);
                        }
                    }
                    _ => {
                        if enforcer.has_effective_permissions(&child_key, context, permissions) {
                            out.insert(name.clone(), field.clone());
                        }
                    }
                }
            }
            Value::Object(out)
        }
        _ => {
            if enforcer.has_effective_permissions(key, context, permissions) {
                value.clone()
            } else {
                Value::Null
            }
        }
    }
}

/// Extract the fragments of `value` selected by the whitelist. Covered
/// paths are copied with their whole subtree; objects on the way to a
/// deeper whitelist entry are rebuilt with only the selected members.
fn select_whitelisted(base: &JsonPointer, value: &Value, whitelist: &FieldWhitelist) -> Value {
    if whitelist.covers(base) {
        return value.clone();
    }
    let Value::Object(fields) = value else {
        return Value::Null;
    };
    let mut out = Map::new();
    for (name, field) in fields {
        let child = base.child(name.clone());
        if whitelist.covers(&child) {
            out.insert(name.clone(), field.clone());
        } else if whitelist.reaches_below(&child) {
            let sub = select_whitelisted(&child, field, whitelist);
            if matches!(&sub, Value::Object(m) if !m.is_empty()) {
                out.insert(name.clone(), sub);
            }
        }
    }
    Value::Object(out)
}

/// Merge two JSON documents depth-first.
///
/// Objects merge member-wise, arrays element-wise up to the shorter
/// length with the longer tail appended verbatim, and the first
/// document wins leaf conflicts. Fields present in only one document
/// are copied unchanged.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use twin_enforcer::merge_json;
///
/// let merged = merge_json(
///     &json!({"a": 1, "nested": {"x": true}}),
///     &json!({"b": 2, "nested": {"y": false}}),
/// );
/// assert_eq!(merged, json!({"a": 1, "b": 2, "nested": {"x": true, "y": false}}));
/// ```
pub fn merge_json(first: &Value, second: &Value) -> Value {
    match (first, second) {
        (Value::Object(a), Value::Object(b)) => {
            let mut out = Map::new();
            for (name, value) in a {
                match b.get(name) {
                    Some(other) => out.insert(name.clone(), merge_json(value, other)),
                    None => out.insert(name.clone(), value.clone()),
                };
            }
            for (name, value) in b {
                if !a.contains_key(name) {
                    out.insert(name.clone(), value.clone());
                }
            }
            Value::Object(out)
        }
        (Value::Array(a), Value::Array(b)) => {
            let mut out = Vec::with_capacity(a.len().max(b.len()));
            for (x, y) in a.iter().zip(b.iter()) {
                out.push(merge_json(x, y));
            }
            if a.len() >= b.len() {
                out.extend(a[b.len()..].iter().cloned());
            } else {
                out.extend(b[a.len()..].iter().cloned());
            }
            Value::Array(out)
        }
        // First wins leaf conflicts.
        _ => first.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_is_idempotent_on_equal_documents() {
        let doc = json!({
            "attributes": {"vin": "X1", "tags": ["a", "b"]},
            "features": {"motor": {"speed": 42}}
        });
        assert_eq!(merge_json(&doc, &doc), doc);
    }

    #[test]
    fn test_merge_first_wins_leaf_conflicts() {
        let merged = merge_json(&json!({"a": 1}), &json!({"a": 2, "b": 3}));
        assert_eq!(merged, json!({"a": 1, "b": 3}));
    }

    #[test]
    fn test_merge_arrays_element_wise_with_tail() {
        let merged = merge_json(
            &json!([{"a": 1}, 2]),
            &json!([{"b": 9}, 8, 7]),
        );
        assert_eq!(merged, json!([{"a": 1, "b": 9}, 2, 7]));

        let merged = merge_json(&json!([1, 2, 3]), &json!([9]));
        assert_eq!(merged, json!([1, 2, 3]));
    }

    #[test]
    fn test_merge_type_conflict_first_wins() {
        let merged = merge_json(&json!({"a": {"x": 1}}), &json!({"a": [1, 2]}));
        assert_eq!(merged, json!({"a": {"x": 1}}));
    }

    #[test]
    fn test_whitelist_covers_and_reaches() {
        let whitelist = FieldWhitelist::of([JsonPointer::parse("/attributes/model").unwrap()]);
        let model = JsonPointer::parse("/attributes/model").unwrap();
        let serial = JsonPointer::parse("/attributes/model/serial").unwrap();
        let attributes = JsonPointer::parse("/attributes").unwrap();
        let features = JsonPointer::parse("/features").unwrap();

        assert!(whitelist.covers(&model));
        assert!(whitelist.covers(&serial));
        assert!(!whitelist.covers(&attributes));
        assert!(whitelist.reaches_below(&attributes));
        assert!(!whitelist.reaches_below(&features));
    }

    #[test]
    fn test_select_whitelisted_rebuilds_path() {
        let whitelist = FieldWhitelist::of([JsonPointer::parse("/attributes/model").unwrap()]);
        let doc = json!({
            "attributes": {"model": "T-1000", "vin": "X1"},
            "features": {"motor": {"speed": 42}}
        });
        let selected = select_whitelisted(&JsonPointer::root(), &doc, &whitelist);
        assert_eq!(selected, json!({"attributes": {"model": "T-1000"}}));
    }
}
