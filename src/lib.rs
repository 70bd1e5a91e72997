//! Locale-aware configuration schema engine.
//!
//! A [`SchemaBundle`] ties together a recursive type schema, per-locale
//! default trees and per-locale field descriptions. Resolving a user
//! configuration merges base defaults, locale overrides and the user's tree,
//! then validates the result, collecting every violation in one pass.
//!
//! ```
//! use locale_schema::SchemaBundle;
//! use serde_json::json;
//!
//! let schema = locale_schema::parse_schema(&json!({
//!     "type": "//rec",
//!     "required": {"lang": "//str"},
//! })).unwrap();
//! let bundle = SchemaBundle::builder(schema)
//!     .defaults([("en".to_string(), json!({"lang": "en"})), ("fr".to_string(), json!({"lang": "fr"}))].into())
//!     .build()
//!     .unwrap();
//! let res = bundle.resolve("fr", &json!({}));
//! assert_eq!(res.config["lang"], json!("fr"));
//! assert!(res.violations.is_empty());
//! ```
pub mod bundle;
pub mod error;
pub mod ir;
pub mod json_schema;
pub mod loader;
pub mod locale;
pub mod merge;
pub mod schema_desc;
pub mod validate;
pub mod value;

#[cfg(test)]
pub(crate) mod testdata;

pub use bundle::{FieldDoc, SchemaBundle, SchemaBundleBuilder, DEFAULT_BASE_LOCALE};
pub use error::{LoadError, SchemaAuthoringError};
pub use ir::{Length, SchemaType};
pub use locale::{describe, resolve, DefaultsTree, DescriptionsTree, Resolution};
pub use schema_desc::parse_schema;
pub use validate::{validate, Violation};
pub use value::{FieldPath, PathSegment, ResolvedConfig, Value, ValueKind};
