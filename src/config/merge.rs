//! Field-by-field merging of configuration tiers.
//!
//! Tiers are parsed to `serde_json::Value` and folded lowest first. Maps merge
//! key by key; any other value in a higher tier replaces the lower one, except
//! an explicit `null`, which leaves the lower value in place.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None if value.is_null() => {}
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Merge two values, `overlay` winning.
///
/// # Example
/// ```
/// use serde_json::json;
/// use taskboard::config::deep_merge;
///
/// let project = json!({"server": {"port": 3005, "bind": "127.0.0.1"}});
/// let user = json!({"server": {"port": 8080, "bind": null}});
/// let merged = deep_merge(project, user);
/// assert_eq!(merged["server"], json!({"port": 8080, "bind": "127.0.0.1"}));
/// ```
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// Merge tiers in order, later tiers winning.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for value in values {
        merge_into(&mut merged, value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sibling_keys_survive() {
        let merged = deep_merge(
            json!({"server": {"bind": "127.0.0.1", "port": 3005}, "auth": {"token_ttl_hours": 24}}),
            json!({"server": {"port": 9000}}),
        );
        assert_eq!(
            merged,
            json!({"server": {"bind": "127.0.0.1", "port": 9000}, "auth": {"token_ttl_hours": 24}})
        );
    }

    #[test]
    fn null_never_erases() {
        let base = json!({"auth": {"jwt_secret": "s"}, "generation": {"watsonx": {"project_id": "p"}}});
        let merged = deep_merge(
            base.clone(),
            json!({"auth": {"jwt_secret": null}, "generation": {"watsonx": {"project_id": null}}}),
        );
        assert_eq!(merged, base);

        // A null for a key the base lacks is dropped rather than inserted.
        let merged = deep_merge(json!({"server": {}}), json!({"server": {"port": null}}));
        assert_eq!(merged, json!({"server": {}}));
    }

    #[test]
    fn non_maps_are_replaced_whole() {
        let merged = deep_merge(
            json!({"generation": {"openai": {"model": "gpt-4o-mini"}}, "list": [1, 2, 3]}),
            json!({"generation": {"openai": "disabled"}, "list": [4]}),
        );
        assert_eq!(merged, json!({"generation": {"openai": "disabled"}, "list": [4]}));

        let merged = deep_merge(json!({"server": 1}), json!({"server": {"port": 2}}));
        assert_eq!(merged, json!({"server": {"port": 2}}));
    }

    #[test]
    fn tiers_fold_in_order() {
        let merged = deep_merge_all([
            json!({"server": {"port": 3005, "bind": "127.0.0.1"}}),
            json!({"server": {"port": 4000}}),
            json!(null),
            json!({"server": {"port": 5000}, "generation": {"timeout_ms": 1000}}),
        ]);
        assert_eq!(
            merged,
            json!({"server": {"port": 5000, "bind": "127.0.0.1"}, "generation": {"timeout_ms": 1000}})
        );
    }
}
