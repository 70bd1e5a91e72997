//! Layered deep merge.
//!
//! Two mappings at the same path merge key by key; for every other pair of
//! values the later layer replaces the earlier one whole. Sequences are never
//! merged element-wise.
use serde_json::{Map, Value};

/// Merge `overlay` on top of `base`, returning a new tree.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(a), Value::Object(b)) => Value::Object(merge_maps(a, b)),
        (_, replacement) => replacement.clone(),
    }
}

/// Fold `layers` left to right; later layers win.
pub fn merge_layers<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut out = Value::Object(Map::new());
    for layer in layers {
        out = merge(&out, layer);
    }
    out
}

fn merge_maps(a: &Map<String, Value>, b: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();

    // keys from a, merged with b where both have them
    for (k, va) in a {
        match b.get(k) {
            None => {
                out.insert(k.clone(), va.clone());
            }
            Some(vb) => {
                out.insert(k.clone(), merge(va, vb));
            }
        }
    }
    // keys only in b
    for (k, vb) in b {
        if !out.contains_key(k) {
            out.insert(k.clone(), vb.clone());
        }
    }

    out
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mappings_merge_key_by_key() {
        let base = json!({"book": {"lang": "en", "pictures": true}, "chords": {"show": true}});
        let overlay = json!({"book": {"lang": "fr"}});
        assert_eq!(
            merge(&base, &overlay),
            json!({"book": {"lang": "fr", "pictures": true}, "chords": {"show": true}})
        );
    }

    #[test]
    fn sequences_replace_instead_of_merging() {
        let base = json!({"titles": {"prefix": ["The", "A", "An"]}});
        let overlay = json!({"titles": {"prefix": ["Le"]}});
        assert_eq!(merge(&base, &overlay), json!({"titles": {"prefix": ["Le"]}}));
    }

    #[test]
    fn incompatible_shapes_replace_whole() {
        let base = json!({"chords": {"notation": "alphascale"}});
        let to_list = json!({"chords": {"notation": ["Do", "Ré"]}});
        assert_eq!(merge(&base, &to_list)["chords"]["notation"], json!(["Do", "Ré"]));

        let mapping_over_scalar = json!({"chords": 1});
        assert_eq!(merge(&mapping_over_scalar, &base), base);
        assert_eq!(merge(&base, &mapping_over_scalar), mapping_over_scalar);
    }

    #[test]
    fn null_overrides_but_absence_does_not() {
        let base = json!({"titles": {"prefix": ["The"]}, "book": {"lang": "en"}});
        let overlay = json!({"titles": {"prefix": null}});
        let merged = merge(&base, &overlay);
        assert_eq!(merged["titles"]["prefix"], Value::Null);
        assert_eq!(merged["book"]["lang"], json!("en"));
    }

    #[test]
    fn merge_is_pure_and_deterministic() {
        let base = json!({"a": {"b": 1}, "c": [1, 2]});
        let overlay = json!({"a": {"d": 2}});
        let first = merge(&base, &overlay);
        let second = merge(&base, &overlay);
        assert_eq!(first, second);
        assert_eq!(base, json!({"a": {"b": 1}, "c": [1, 2]}));
        assert_eq!(merge(&first, &json!({})), first);
    }

    #[test]
    fn layers_fold_left_to_right() {
        let base = json!({"book": {"lang": "en", "encoding": "utf-8"}});
        let locale = json!({"book": {"lang": "fr"}});
        let user = json!({"book": {"lang": "de"}});
        let merged = merge_layers([&base, &locale, &user]);
        assert_eq!(merged, json!({"book": {"lang": "de", "encoding": "utf-8"}}));
    }
}
