//! Recursive validation of a value tree against a `SchemaType`.
//!
//! Validation never stops at the first problem: every violation found during
//! one descent is collected, so callers can report them all at once.
use std::fmt;

use serde::Serialize;

use crate::ir::SchemaType;
use crate::value::{FieldPath, Value, ValueKind};

/// One way a value fails to conform to its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A required key is absent.
    MissingField { path: FieldPath },
    /// The value's kind or shape does not fit.
    TypeMismatch {
        path: FieldPath,
        expected: String,
        actual: ValueKind,
    },
    /// Array cardinality outside its bounds.
    LengthViolation {
        path: FieldPath,
        observed: usize,
        min: Option<usize>,
        max: Option<usize>,
    },
}

impl Violation {
    pub fn path(&self) -> &FieldPath {
        match self {
            Violation::MissingField { path }
            | Violation::TypeMismatch { path, .. }
            | Violation::LengthViolation { path, .. } => path,
        }
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self, Violation::MissingField { .. })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingField { path } => write!(f, "{path}: missing required field"),
            Violation::TypeMismatch { path, expected, actual } => {
                write!(f, "{path}: expected {expected}, found {actual}")
            }
            Violation::LengthViolation { path, observed, min, max } => {
                write!(f, "{path}: {observed} items, expected ")?;
                match (min, max) {
                    (Some(min), Some(max)) if min == max => write!(f, "exactly {min}"),
                    (Some(min), Some(max)) => write!(f, "{min} to {max}"),
                    (Some(min), None) => write!(f, "at least {min}"),
                    (None, Some(max)) => write!(f, "at most {max}"),
                    (None, None) => write!(f, "any number"),
                }
            }
        }
    }
}

/// Validate `value` against `schema`, reporting paths relative to the root.
pub fn validate(schema: &SchemaType, value: &Value) -> Vec<Violation> {
    validate_at(schema, value, &FieldPath::root())
}

/// Validate `value` as if it sat at `path` inside a larger tree.
pub fn validate_at(schema: &SchemaType, value: &Value, path: &FieldPath) -> Vec<Violation> {
    let mut out = Vec::new();
    descend(schema, value, path, &mut out);
    out
}

fn descend(schema: &SchemaType, value: &Value, path: &FieldPath, out: &mut Vec<Violation>) {
    match schema {
        SchemaType::Any => {}
        SchemaType::Bool
        | SchemaType::Str
        | SchemaType::Nil
        | SchemaType::Num
        | SchemaType::Int
        | SchemaType::Literal(_) => {
            if !schema.matches(value) {
                out.push(mismatch(schema, value, path));
            }
        }
        SchemaType::Array { contents, length } => {
            let Value::Array(items) = value else {
                out.push(mismatch(schema, value, path));
                return;
            };
            if let Some(length) = length {
                if !length.contains(items.len()) {
                    out.push(Violation::LengthViolation {
                        path: path.clone(),
                        observed: items.len(),
                        min: length.min,
                        max: length.max,
                    });
                }
            }
            for (i, item) in items.iter().enumerate() {
                descend(contents, item, &path.index(i), out);
            }
        }
        SchemaType::Record { required, optional } => {
            let Value::Object(map) = value else {
                out.push(mismatch(schema, value, path));
                return;
            };
            for (key, ty) in required {
                match map.get(key) {
                    Some(field) => descend(ty, field, &path.child(key.as_str()), out),
                    None => out.push(Violation::MissingField { path: path.child(key.as_str()) }),
                }
            }
            for (key, ty) in optional {
                if let Some(field) = map.get(key) {
                    descend(ty, field, &path.child(key.as_str()), out);
                }
            }
            // keys outside the declaration are accepted as-is
        }
        SchemaType::Union(variants) => {
            if variants.iter().any(|ty| ty.matches(value)) {
                return;
            }
            // Nothing fits. A structural variant of the right kind explains the
            // failure better than a flat list of alternatives.
            let authoritative = variants.iter().find(|ty| explains(ty, value));
            match authoritative {
                Some(ty) => descend(ty, value, path, out),
                None => out.push(mismatch(schema, value, path)),
            }
        }
    }
}

/// Whether `ty` holds an array or record variant of the value's kind, at any
/// depth of union nesting.
fn explains(ty: &SchemaType, value: &Value) -> bool {
    match ty {
        SchemaType::Array { .. } | SchemaType::Record { .. } => ty.accepts_kind(value),
        SchemaType::Union(variants) => variants.iter().any(|v| explains(v, value)),
        _ => false,
    }
}

fn mismatch(schema: &SchemaType, value: &Value, path: &FieldPath) -> Violation {
    Violation::TypeMismatch {
        path: path.clone(),
        expected: schema.describe(),
        actual: ValueKind::of(value),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Length;
    use serde_json::json;

    fn notation() -> SchemaType {
        SchemaType::Union(vec![
            SchemaType::Literal(json!("alphascale")),
            SchemaType::Literal(json!("solfedge")),
            SchemaType::array(SchemaType::Str, Some(Length::exact(7))),
        ])
    }

    fn songbook() -> SchemaType {
        SchemaType::record(
            [
                ("_outputdir".to_string(), SchemaType::Str),
                (
                    "chords".to_string(),
                    SchemaType::record(
                        [
                            ("show".to_string(), SchemaType::Bool),
                            ("notation".to_string(), notation()),
                            ("diagramreminder".to_string(), SchemaType::enumeration(["none", "important", "all"])),
                        ],
                        [],
                    ),
                ),
                (
                    "titles".to_string(),
                    SchemaType::record(
                        [(
                            "prefix".to_string(),
                            SchemaType::Union(vec![SchemaType::array(SchemaType::Str, None), SchemaType::Nil]),
                        )],
                        [],
                    ),
                ),
            ],
            [("content".to_string(), SchemaType::Any)],
        )
    }

    fn valid() -> Value {
        json!({
            "_outputdir": "out",
            "chords": {"show": true, "notation": "alphascale", "diagramreminder": "important"},
            "titles": {"prefix": ["The", "A"]},
        })
    }

    #[test]
    fn valid_tree_has_no_violations() {
        assert!(validate(&songbook(), &valid()).is_empty());
    }

    #[test]
    fn short_notation_list_is_a_length_violation() {
        let mut value = valid();
        value["chords"]["notation"] = json!(["Do", "Ré", "Mi", "Fa", "Sol", "La"]);
        let violations = validate(&songbook(), &value);
        assert_eq!(
            violations,
            vec![Violation::LengthViolation {
                path: "chords.notation".into(),
                observed: 6,
                min: Some(7),
                max: Some(7),
            }]
        );
        assert_eq!(violations[0].to_string(), "chords.notation: 6 items, expected exactly 7");
    }

    #[test]
    fn unmatched_scalar_union_reports_once_with_every_variant() {
        let mut value = valid();
        value["chords"]["diagramreminder"] = json!("sometimes");
        let violations = validate(&songbook(), &value);
        assert_eq!(
            violations,
            vec![Violation::TypeMismatch {
                path: "chords.diagramreminder".into(),
                expected: "one of: none | important | all".into(),
                actual: ValueKind::String,
            }]
        );
    }

    #[test]
    fn union_descends_into_kind_compatible_array_variant() {
        let mut value = valid();
        value["chords"]["notation"] = json!(["Do", "Ré", "Mi", "Fa", "Sol", "La", 7]);
        let violations = validate(&songbook(), &value);
        assert_eq!(violations.len(), 1);
        let expected_path: FieldPath = "chords.notation[6]".parse().unwrap();
        assert_eq!(violations[0].path(), &expected_path);
    }

    #[test]
    fn nested_scalar_union_mismatch_lists_outer_variants_too() {
        let ty = SchemaType::Union(vec![
            SchemaType::enumeration(["none", "important"]),
            SchemaType::Literal(json!("all")),
        ]);
        assert!(validate(&ty, &json!("all")).is_empty());
        assert!(validate(&ty, &json!("none")).is_empty());
        assert_eq!(
            validate(&ty, &json!("sometimes")),
            vec![Violation::TypeMismatch {
                path: FieldPath::root(),
                expected: "one of: none | important | all".into(),
                actual: ValueKind::String,
            }]
        );
    }

    #[test]
    fn nested_union_with_array_variant_is_descended() {
        let ty = SchemaType::Union(vec![
            SchemaType::Literal(json!("alphascale")),
            SchemaType::Union(vec![SchemaType::Nil, SchemaType::array(SchemaType::Str, Some(Length::exact(7)))]),
        ]);
        let short = json!(["Do", "Ré", "Mi"]);
        assert_eq!(
            validate(&ty, &short),
            vec![Violation::LengthViolation { path: FieldPath::root(), observed: 3, min: Some(7), max: Some(7) }]
        );

        let with_number = json!(["Do", "Ré", "Mi", "Fa", "Sol", "La", 7]);
        let violations = validate(&ty, &with_number);
        let expected_path: FieldPath = "[6]".parse().unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path(), &expected_path);

        // a number fits no variant of any depth
        assert_eq!(
            validate(&ty, &json!(3)),
            vec![Violation::TypeMismatch {
                path: FieldPath::root(),
                expected: "one of: alphascale | nil | list of 7 str".into(),
                actual: ValueKind::Number,
            }]
        );
    }

    #[test]
    fn duplicated_union_variants_still_accept() {
        let ty = SchemaType::Union(vec![SchemaType::Literal(json!("all")), SchemaType::Literal(json!("all"))]);
        assert!(validate(&ty, &json!("all")).is_empty());
    }

    #[test]
    fn nil_value_differs_from_absent_key() {
        let mut value = valid();
        value["titles"]["prefix"] = Value::Null;
        assert!(validate(&songbook(), &value).is_empty());

        value["titles"].as_object_mut().unwrap().remove("prefix");
        assert_eq!(
            validate(&songbook(), &value),
            vec![Violation::MissingField { path: "titles.prefix".into() }]
        );
    }

    #[test]
    fn null_for_non_nullable_field_is_a_mismatch() {
        let mut value = valid();
        value["chords"]["show"] = Value::Null;
        let violations = validate(&songbook(), &value);
        assert_eq!(
            violations,
            vec![Violation::TypeMismatch {
                path: "chords.show".into(),
                expected: "bool".into(),
                actual: ValueKind::Nil,
            }]
        );
    }

    #[test]
    fn all_problems_surface_in_one_pass() {
        let value = json!({
            "chords": {"show": "yes", "notation": "alphascale"},
            "titles": 3,
            "unknown": {"anything": true},
            "content": [1, 2, 3],
        });
        let violations = validate(&songbook(), &value);
        let rendered: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "_outputdir: missing required field".to_string(),
                "chords.show: expected bool, found string".to_string(),
                "chords.diagramreminder: missing required field".to_string(),
                "titles: expected record, found number".to_string(),
            ]
        );
    }

    #[test]
    fn optional_fields_validate_only_when_present() {
        let ty = SchemaType::record([], [("instrument".to_string(), SchemaType::enumeration(["guitar", "ukulele"]))]);
        assert!(validate(&ty, &json!({})).is_empty());
        assert_eq!(validate(&ty, &json!({"instrument": "banjo"})).len(), 1);
    }

    #[test]
    fn validate_at_prefixes_reported_paths() {
        let violations = validate_at(&SchemaType::Bool, &json!(1), &"chords.show".into());
        assert_eq!(violations[0].path().to_string(), "chords.show");
    }

    #[test]
    fn violations_serialize_with_kind_tag() {
        let violation = Violation::MissingField { path: "_outputdir".into() };
        assert_eq!(
            serde_json::to_value(&violation).unwrap(),
            json!({"kind": "missing_field", "path": "_outputdir"})
        );
    }
}
