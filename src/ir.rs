// Strongly-typed schema IR. Built once from a declarative description, then shared read-only.

use indexmap::IndexMap;

use crate::value::{FieldPath, PathSegment, Value, ValueKind};

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    Any,                     // anything at all
    Bool,
    Str,
    Nil,                     // exactly null
    Num,
    Int,                     // integral numbers only
    Literal(Value),          // structurally equal to a fixed value
    Array {
        contents: Box<SchemaType>,
        length: Option<Length>,
    },
    Record {
        required: IndexMap<String, SchemaType>, // declaration order kept for docs
        optional: IndexMap<String, SchemaType>,
    },
    Union(Vec<SchemaType>),  // first matching variant wins
}

/// Inclusive cardinality bounds of an array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Length {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Length {
    pub fn exact(n: usize) -> Self {
        Self { min: Some(n), max: Some(n) }
    }

    pub fn contains(&self, len: usize) -> bool {
        self.min.is_none_or(|min| len >= min) && self.max.is_none_or(|max| len <= max)
    }
}

/// A record field reached by `SchemaType::declared_fields`.
#[derive(Debug, Clone)]
pub struct DeclaredField<'a> {
    pub path: FieldPath,
    pub ty: &'a SchemaType,
    pub required: bool,
}

impl SchemaType {
    pub fn array(contents: SchemaType, length: Option<Length>) -> Self {
        SchemaType::Array { contents: Box::new(contents), length }
    }

    pub fn record<R, O>(required: R, optional: O) -> Self
    where
        R: IntoIterator<Item = (String, SchemaType)>,
        O: IntoIterator<Item = (String, SchemaType)>,
    {
        SchemaType::Record {
            required: required.into_iter().collect(),
            optional: optional.into_iter().collect(),
        }
    }

    /// `Union` of string literals.
    pub fn enumeration<'a>(choices: impl IntoIterator<Item = &'a str>) -> Self {
        SchemaType::Union(
            choices
                .into_iter()
                .map(|s| SchemaType::Literal(Value::from(s)))
                .collect(),
        )
    }

    /// Element count of a fixed-arity array (`min == max`).
    pub fn fixed_arity(&self) -> Option<usize> {
        match self {
            SchemaType::Array { length: Some(Length { min: Some(min), max: Some(max) }), .. }
                if min == max => Some(*min),
            _ => None,
        }
    }

    /// Full structural check, no diagnostics.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            SchemaType::Any => true,
            SchemaType::Bool => value.is_boolean(),
            SchemaType::Str => value.is_string(),
            SchemaType::Nil => value.is_null(),
            SchemaType::Num => value.is_number(),
            SchemaType::Int => is_integral(value),
            SchemaType::Literal(expected) => expected == value,
            SchemaType::Array { contents, length } => match value {
                Value::Array(items) => {
                    length.is_none_or(|len| len.contains(items.len()))
                        && items.iter().all(|item| contents.matches(item))
                }
                _ => false,
            },
            SchemaType::Record { required, optional } => match value {
                Value::Object(map) => {
                    required.iter().all(|(k, ty)| map.get(k).is_some_and(|v| ty.matches(v)))
                        && optional.iter().all(|(k, ty)| map.get(k).is_none_or(|v| ty.matches(v)))
                }
                _ => false,
            },
            SchemaType::Union(variants) => variants.iter().any(|ty| ty.matches(value)),
        }
    }

    /// Shallow check: could this type accept a value of this kind at all?
    pub fn accepts_kind(&self, value: &Value) -> bool {
        let kind = ValueKind::of(value);
        match self {
            SchemaType::Any => true,
            SchemaType::Bool => kind == ValueKind::Bool,
            SchemaType::Str => kind == ValueKind::String,
            SchemaType::Nil => kind == ValueKind::Nil,
            SchemaType::Num | SchemaType::Int => kind == ValueKind::Number,
            SchemaType::Literal(expected) => ValueKind::of(expected) == kind,
            SchemaType::Array { .. } => kind == ValueKind::Sequence,
            SchemaType::Record { .. } => kind == ValueKind::Mapping,
            SchemaType::Union(variants) => variants.iter().any(|ty| ty.accepts_kind(value)),
        }
    }

    /// Human description used in messages, e.g. `one of: none | important | all`.
    pub fn describe(&self) -> String {
        match self {
            SchemaType::Any => "any".into(),
            SchemaType::Bool => "bool".into(),
            SchemaType::Str => "str".into(),
            SchemaType::Nil => "nil".into(),
            SchemaType::Num => "num".into(),
            SchemaType::Int => "int".into(),
            SchemaType::Literal(Value::String(s)) => s.clone(),
            SchemaType::Literal(other) => other.to_string(),
            SchemaType::Array { contents, length } => {
                let item = contents.describe();
                if let Some(n) = self.fixed_arity() {
                    return format!("list of {n} {item}");
                }
                match length.map(|l| (l.min, l.max)) {
                    Some((Some(min), Some(max))) => format!("list of {item} ({min} to {max} items)"),
                    Some((Some(min), None)) => format!("list of {item} (at least {min} items)"),
                    Some((None, Some(max))) => format!("list of {item} (at most {max} items)"),
                    _ => format!("list of {item}"),
                }
            }
            SchemaType::Record { .. } => "record".into(),
            SchemaType::Union(variants) => {
                let mut arms = Vec::new();
                collect_union_arms(variants, &mut arms);
                format!("one of: {}", arms.join(" | "))
            }
        }
    }

    /// Locate the subtype declared at `path`.
    pub fn field(&self, path: &FieldPath) -> Option<&SchemaType> {
        let mut cursor = self;
        for segment in path.segments() {
            cursor = cursor.step(segment)?;
        }
        Some(cursor)
    }

    fn step(&self, segment: &PathSegment) -> Option<&SchemaType> {
        match (self, segment) {
            (SchemaType::Any, _) => Some(self),
            (SchemaType::Record { required, optional }, PathSegment::Key(key)) => {
                required.get(key).or_else(|| optional.get(key))
            }
            (SchemaType::Array { contents, .. }, PathSegment::Index(_)) => Some(&**contents),
            (SchemaType::Union(variants), _) => variants.iter().find_map(|ty| ty.step(segment)),
            _ => None,
        }
    }

    /// Every declared record field, depth-first, required before optional.
    pub fn declared_fields(&self) -> Vec<DeclaredField<'_>> {
        let mut out = Vec::new();
        collect_fields(self, &FieldPath::root(), &mut out);
        out
    }
}

fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

// Nested unions read as one flat enumeration.
fn collect_union_arms(variants: &[SchemaType], out: &mut Vec<String>) {
    for ty in variants {
        match ty {
            SchemaType::Union(inner) => collect_union_arms(inner, out),
            other => out.push(other.describe()),
        }
    }
}

fn collect_fields<'a>(ty: &'a SchemaType, at: &FieldPath, out: &mut Vec<DeclaredField<'a>>) {
    match ty {
        SchemaType::Record { required, optional } => {
            let flagged = required.iter().map(|f| (f, true)).chain(optional.iter().map(|f| (f, false)));
            for ((name, field_ty), is_required) in flagged {
                let path = at.child(name.as_str());
                // a key reached through two union variants is listed once
                if out.iter().any(|f| f.path == path) {
                    continue;
                }
                out.push(DeclaredField { path: path.clone(), ty: field_ty, required: is_required });
                collect_fields(field_ty, &path, out);
            }
        }
        SchemaType::Union(variants) => {
            for variant in variants {
                collect_fields(variant, at, out);
            }
        }
        _ => {}
    }
}

// ------------------------------- Tests ------------------------------------ //
