//! Dynamic value trees and the paths that address them.
//!
//! Schemas, defaults, descriptions and user input all arrive as plain
//! `serde_json::Value` trees. This module adds the two things the engine needs
//! on top of that: a runtime kind tag for error messages, and `FieldPath`.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use serde_json::{Map, Value};

// ————————————————————————————————————————————————————————————————————————————
// KINDS
// ————————————————————————————————————————————————————————————————————————————

/// Runtime kind of a value, as reported by type mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Nil,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Sequence,
            Value::Object(_) => ValueKind::Mapping,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FIELD PATHS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location inside a value tree, rendered as `chords.notation[3]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field path `{input}`")]
pub struct ParsePathError {
    pub input: String,
}

/// One segment: a bare key optionally led by a dot, a `[n]` index, or a
/// `["quoted key"]` for keys the bare form cannot spell.
static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:\.?([^.\[\]]+)|\[(\d+)\]|\[("(?:[^"\\]|\\.)*")\])"#).expect("static segment pattern")
});

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// New path one key deeper.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// New path one index deeper.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Follow the path through mappings and sequences.
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut cursor = value;
        for segment in &self.segments {
            cursor = match (segment, cursor) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Index(i), Value::Array(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(cursor)
    }
}

impl PathSegment {
    /// Keys that would not read back as the same single key in dotted form.
    fn needs_quoting(&self) -> bool {
        match self {
            PathSegment::Key(key) => {
                key.is_empty()
                    || key == "(root)"
                    || key.trim() != key
                    || key.contains(['.', '[', ']', '"'])
            }
            PathSegment::Index(_) => false,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) if self.needs_quoting() => {
                let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
                write!(f, "[{quoted}]")
            }
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Key(_)) && !segment.needs_quoting() {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = ParsePathError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let src = src.trim();
        if src.is_empty() || src == "(root)" {
            return Ok(Self::root());
        }
        let error = || ParsePathError { input: src.to_string() };
        if src.starts_with('.') {
            return Err(error());
        }
        let mut segments = Vec::new();
        let mut rest = src;
        while !rest.is_empty() {
            let caps = SEGMENT.captures(rest).ok_or_else(error)?;
            if let Some(key) = caps.get(1) {
                segments.push(PathSegment::Key(key.as_str().to_string()));
            } else if let Some(index) = caps.get(2) {
                let index = index.as_str().parse::<usize>().map_err(|_| error())?;
                segments.push(PathSegment::Index(index));
            } else if let Some(quoted) = caps.get(3) {
                let key = serde_json::from_str::<String>(quoted.as_str()).map_err(|_| error())?;
                segments.push(PathSegment::Key(key));
            }
            rest = &rest[caps[0].len()..];
        }
        Ok(Self { segments })
    }
}

impl From<&str> for FieldPath {
    /// Dotted keys only; use `FromStr` when the text may contain indices.
    fn from(src: &str) -> Self {
        if src.is_empty() {
            return Self::root();
        }
        debug_assert!(
            src.split('.').all(|s| !s.is_empty() && !s.contains(['[', ']'])),
            "`{src}` is not a dotted key path"
        );
        Self {
            segments: src.split('.').map(|s| PathSegment::Key(s.to_string())).collect(),
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let src = String::deserialize(deserializer)?;
        src.parse().map_err(serde::de::Error::custom)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLVED CONFIGURATION
// ————————————————————————————————————————————————————————————————————————————

/// Fully merged configuration tree. Cloning shares the underlying tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig(Arc<Value>);

impl ResolvedConfig {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.lookup(&self.0)
    }

    pub fn into_value(self) -> Value {
        Arc::try_unwrap(self.0).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl std::ops::Deref for ResolvedConfig {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

// ------------------------------- Tests ------------------------------------ //
