//! Locale-aware defaults and descriptions.
//!
//! Both tables map a locale code to a value tree. The base locale's tree is
//! the complete one; every other locale only carries what it overrides.
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::ir::SchemaType;
use crate::merge::merge;
use crate::validate::{validate, Violation};
use crate::value::{FieldPath, Map, ResolvedConfig, Value};

/// Locale code → sparse default tree.
pub type DefaultsTree = IndexMap<String, Value>;

/// Locale code → tree of description strings, shaped like the defaults.
pub type DescriptionsTree = IndexMap<String, Value>;

/// Outcome of one resolution: a best-effort tree plus everything wrong with it.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub config: ResolvedConfig,
    pub violations: Vec<Violation>,
}

impl Resolution {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Base defaults with the target locale's overrides applied.
pub fn locale_defaults(defaults: &DefaultsTree, base_locale: &str, target_locale: &str) -> Value {
    let base = match defaults.get(base_locale) {
        Some(tree) => tree.clone(),
        None => {
            warn!(base_locale, "no defaults for base locale; starting from an empty tree");
            Value::Object(Map::new())
        }
    };
    if target_locale == base_locale {
        return base;
    }
    match defaults.get(target_locale) {
        Some(overrides) => merge(&base, overrides),
        None => {
            debug!(target_locale, "no default overrides for locale");
            base
        }
    }
}

/// Merge base defaults, locale overrides and user input, then validate.
pub fn resolve(
    schema: &SchemaType,
    defaults: &DefaultsTree,
    base_locale: &str,
    target_locale: &str,
    user_input: &Value,
) -> Resolution {
    let localized = locale_defaults(defaults, base_locale, target_locale);
    // an empty document is no input, not a request to null the tree
    let merged = if user_input.is_null() {
        localized
    } else {
        merge(&localized, user_input)
    };
    let violations = validate(schema, &merged);
    trace!(target_locale, violations = violations.len(), "resolved configuration");
    Resolution { config: ResolvedConfig::new(merged), violations }
}

/// Description text for `path`, falling back to the base locale, else empty.
pub fn describe(
    descriptions: &DescriptionsTree,
    base_locale: &str,
    path: &FieldPath,
    target_locale: &str,
) -> String {
    lookup_text(descriptions, target_locale, path)
        .or_else(|| lookup_text(descriptions, base_locale, path))
        .unwrap_or_default()
}

fn lookup_text(descriptions: &DescriptionsTree, locale: &str, path: &FieldPath) -> Option<String> {
    let tree = descriptions.get(locale)?;
    match path.lookup(tree)? {
        Value::String(text) => Some(text.clone()),
        // a record's node holds its children's descriptions, not its own
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //
