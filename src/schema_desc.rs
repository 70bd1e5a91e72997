//! Declarative schema descriptions → `SchemaType`.
//!
//! Schemas are authored with type tags:
//!
//! ```yaml
//! type: //rec
//! required:
//!   chords:
//!     type: //rec
//!     required:
//!       notation:
//!         type: //any
//!         of:
//!           - type: //str
//!             value: alphascale
//!           - type: //arr
//!             contents: //str
//!             length: {min: 7, max: 7}
//! ```
//!
//! A bare tag string (`//str`) is shorthand for `{type: //str}`. Everything is
//! checked eagerly; any problem is a `SchemaAuthoringError::MalformedSchema`
//! naming where in the description it sits.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::SchemaAuthoringError;
use crate::ir::{Length, SchemaType};
use crate::value::{FieldPath, ValueKind};

pub const TAG_ANY: &str = "//any";
pub const TAG_BOOL: &str = "//bool";
pub const TAG_STR: &str = "//str";
pub const TAG_NIL: &str = "//nil";
pub const TAG_NUM: &str = "//num";
pub const TAG_INT: &str = "//int";
pub const TAG_ARR: &str = "//arr";
pub const TAG_REC: &str = "//rec";

/// Build a `SchemaType` from its declarative description.
pub fn parse_schema(desc: &Value) -> Result<SchemaType, SchemaAuthoringError> {
    parse_at(desc, &FieldPath::root())
}

fn malformed(at: &FieldPath, reason: impl Into<String>) -> SchemaAuthoringError {
    SchemaAuthoringError::MalformedSchema {
        location: at.to_string(),
        reason: reason.into(),
    }
}

fn parse_at(desc: &Value, at: &FieldPath) -> Result<SchemaType, SchemaAuthoringError> {
    match desc {
        Value::String(tag) => parse_tagged(tag, &Map::new(), at),
        Value::Object(attrs) => {
            let tag = attrs
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(at, "missing `type` tag"))?;
            parse_tagged(tag, attrs, at)
        }
        other => Err(malformed(
            at,
            format!("expected a type tag or mapping, found {}", ValueKind::of(other)),
        )),
    }
}

fn parse_tagged(tag: &str, attrs: &Map<String, Value>, at: &FieldPath) -> Result<SchemaType, SchemaAuthoringError> {
    match tag {
        TAG_ANY => {
            only_attrs(attrs, &["of"], at)?;
            match attrs.get("of") {
                None => Ok(SchemaType::Any),
                Some(Value::Array(variants)) => {
                    if variants.is_empty() {
                        return Err(malformed(at, "`of` lists no alternatives"));
                    }
                    let of = at.child("of");
                    variants
                        .iter()
                        .enumerate()
                        .map(|(i, v)| parse_at(v, &of.index(i)))
                        .collect::<Result<Vec<_>, _>>()
                        .map(SchemaType::Union)
                }
                Some(other) => Err(malformed(at, format!("`of` must be a sequence, found {}", ValueKind::of(other)))),
            }
        }
        TAG_NIL => {
            only_attrs(attrs, &[], at)?;
            Ok(SchemaType::Nil)
        }
        TAG_BOOL => scalar(SchemaType::Bool, ValueKind::Bool, attrs, at),
        TAG_STR => scalar(SchemaType::Str, ValueKind::String, attrs, at),
        TAG_NUM => scalar(SchemaType::Num, ValueKind::Number, attrs, at),
        TAG_INT => {
            let ty = scalar(SchemaType::Int, ValueKind::Number, attrs, at)?;
            if let SchemaType::Literal(value) = &ty {
                if !SchemaType::Int.matches(value) {
                    return Err(malformed(at, format!("`value` {value} is not an integer")));
                }
            }
            Ok(ty)
        }
        TAG_ARR => {
            only_attrs(attrs, &["contents", "length"], at)?;
            let contents = attrs
                .get("contents")
                .ok_or_else(|| malformed(at, "`//arr` needs `contents`"))?;
            let contents = parse_at(contents, &at.child("contents"))?;
            let length = attrs
                .get("length")
                .map(|l| parse_length(l, &at.child("length")))
                .transpose()?;
            Ok(SchemaType::array(contents, length))
        }
        TAG_REC => {
            only_attrs(attrs, &["required", "optional"], at)?;
            let required = parse_fields(attrs.get("required"), &at.child("required"))?;
            let optional = parse_fields(attrs.get("optional"), &at.child("optional"))?;
            if let Some(dup) = required.keys().find(|k| optional.contains_key(*k)) {
                return Err(malformed(at, format!("`{dup}` is both required and optional")));
            }
            Ok(SchemaType::Record { required, optional })
        }
        unknown => Err(malformed(at, format!("unknown type tag `{unknown}`"))),
    }
}

// `{type: //str}` or `{type: //str, value: "none"}`
fn scalar(
    ty: SchemaType,
    kind: ValueKind,
    attrs: &Map<String, Value>,
    at: &FieldPath,
) -> Result<SchemaType, SchemaAuthoringError> {
    only_attrs(attrs, &["value"], at)?;
    match attrs.get("value") {
        None => Ok(ty),
        Some(value) if ValueKind::of(value) == kind => Ok(SchemaType::Literal(value.clone())),
        Some(value) => Err(malformed(
            at,
            format!("`value` must be a {kind}, found {}", ValueKind::of(value)),
        )),
    }
}

fn parse_length(desc: &Value, at: &FieldPath) -> Result<Length, SchemaAuthoringError> {
    let Value::Object(bounds) = desc else {
        return Err(malformed(at, "`length` must be a mapping with `min` and/or `max`"));
    };
    only_attrs(bounds, &["min", "max"], at)?;
    let bound = |key: &str| -> Result<Option<usize>, SchemaAuthoringError> {
        match bounds.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| malformed(at, format!("`{key}` must be a non-negative integer"))),
        }
    };
    let length = Length { min: bound("min")?, max: bound("max")? };
    if let (Some(min), Some(max)) = (length.min, length.max) {
        if min > max {
            return Err(malformed(at, format!("min {min} exceeds max {max}")));
        }
    }
    Ok(length)
}

fn parse_fields(desc: Option<&Value>, at: &FieldPath) -> Result<IndexMap<String, SchemaType>, SchemaAuthoringError> {
    match desc {
        None | Some(Value::Null) => Ok(IndexMap::new()),
        Some(Value::Object(fields)) => fields
            .iter()
            .map(|(name, field)| parse_at(field, &at.child(name.as_str())).map(|ty| (name.clone(), ty)))
            .collect(),
        Some(other) => Err(malformed(at, format!("expected a mapping of fields, found {}", ValueKind::of(other)))),
    }
}

fn only_attrs(attrs: &Map<String, Value>, allowed: &[&str], at: &FieldPath) -> Result<(), SchemaAuthoringError> {
    match attrs.keys().find(|k| *k != "type" && !allowed.contains(&k.as_str())) {
        Some(extra) => Err(malformed(at, format!("unexpected attribute `{extra}`"))),
        None => Ok(()),
    }
}

// ------------------------------- Tests ------------------------------------ //
