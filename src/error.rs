use std::path::PathBuf;

use thiserror::Error;

use crate::validate::Violation;
use crate::value::ParsePathError;

/// The schema, its defaults, or how they fit together is broken.
///
/// These are configuration-authoring mistakes, found once at load time. They
/// are never produced for a particular user input.
#[derive(Error, Debug)]
pub enum SchemaAuthoringError {
    #[error("malformed schema at {location}: {reason}")]
    MalformedSchema { location: String, reason: String },

    #[error("no defaults for base locale `{locale}`")]
    MissingBaseLocale { locale: String },

    #[error("defaults for locale `{locale}` do not satisfy the schema:\n{}", render(.violations))]
    InvalidDefaults { locale: String, violations: Vec<Violation> },

    #[error(transparent)]
    InvalidFieldPath(#[from] ParsePathError),
}

/// Failure to read or parse a bundle or configuration document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{}: {source}", .path.display())]
    Authoring {
        path: PathBuf,
        #[source]
        source: SchemaAuthoringError,
    },
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
