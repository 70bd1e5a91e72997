//! Render a `SchemaType` as a JSON Schema document, for editors and other
//! tooling that already speak JSON Schema.

use serde_json::{json, Map, Value};

use crate::ir::SchemaType;
use crate::value::FieldPath;

/// Build a JSON Schema (2020-12 vocabulary) from the schema IR.
/// Records stay open (`additionalProperties` is left unset); unions map to
/// `anyOf`, which accepts the same values as first-match.
pub fn to_json_schema(ty: &SchemaType) -> Value {
    match ty {
        SchemaType::Any => json!({}),
        SchemaType::Bool => json!({ "type": "boolean" }),
        SchemaType::Str => json!({ "type": "string" }),
        SchemaType::Nil => json!({ "type": "null" }),
        SchemaType::Num => json!({ "type": "number" }),
        SchemaType::Int => json!({ "type": "integer" }),
        SchemaType::Literal(value) => json!({ "const": value }),

        SchemaType::Array { contents, length } => {
            let mut o = json!({
                "type": "array",
                "items": to_json_schema(contents),
            });
            if let Some(length) = length {
                if let Some(mn) = length.min { o["minItems"] = Value::from(mn); }
                if let Some(mx) = length.max { o["maxItems"] = Value::from(mx); }
            }
            o
        }

        SchemaType::Record { required, optional } => {
            let mut props = Map::new();
            for (k, v) in required.iter().chain(optional.iter()) {
                props.insert(k.clone(), to_json_schema(v));
            }
            let mut o = json!({ "type": "object", "properties": props });
            if !required.is_empty() {
                o["required"] = Value::Array(required.keys().cloned().map(Value::from).collect());
            }
            o
        }

        SchemaType::Union(arms) => {
            // string-literal-only unions read better as `enum`
            let literals: Option<Vec<Value>> = arms
                .iter()
                .map(|arm| match arm {
                    SchemaType::Literal(v) => Some(v.clone()),
                    _ => None,
                })
                .collect();
            match literals {
                Some(values) => json!({ "enum": values }),
                None => json!({ "anyOf": arms.iter().map(to_json_schema).collect::<Vec<_>>() }),
            }
        }
    }
}

/// Walk `schema` alongside a rendered JSON Schema and attach `description`
/// and `default` to each declared property. `lookup` returns the pair for a
/// field path; empty descriptions and absent defaults are skipped.
pub fn annotate<F>(schema: &SchemaType, rendered: &mut Value, lookup: &F)
where
    F: Fn(&FieldPath) -> (String, Option<Value>),
{
    annotate_at(schema, rendered, &FieldPath::root(), lookup);
}

fn annotate_at<F>(schema: &SchemaType, rendered: &mut Value, at: &FieldPath, lookup: &F)
where
    F: Fn(&FieldPath) -> (String, Option<Value>),
{
    let (required, optional) = match schema {
        SchemaType::Record { required, optional } => (required, optional),
        SchemaType::Union(arms) => {
            // literal-only unions render as `enum` and hold no properties
            let Some(rendered_arms) = rendered.get_mut("anyOf").and_then(Value::as_array_mut) else {
                return;
            };
            for (arm, rendered_arm) in arms.iter().zip(rendered_arms.iter_mut()) {
                annotate_at(arm, rendered_arm, at, lookup);
            }
            return;
        }
        _ => return,
    };
    let Some(props) = rendered.get_mut("properties").and_then(Value::as_object_mut) else {
        return;
    };
    for (name, field_ty) in required.iter().chain(optional.iter()) {
        let Some(prop) = props.get_mut(name) else { continue };
        let path = at.child(name.as_str());
        let (description, default) = lookup(&path);
        if !description.is_empty() {
            prop["description"] = Value::from(description);
        }
        if let Some(default) = default {
            prop["default"] = default;
        }
        annotate_at(field_ty, prop, &path, lookup);
    }
}

// ------------------------------- Tests ------------------------------------ //
