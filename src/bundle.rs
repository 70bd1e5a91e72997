//! The public entry point: one schema, its localized defaults and
//! descriptions, checked once and then shared by every resolution.
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SchemaAuthoringError;
use crate::ir::SchemaType;
use crate::json_schema;
use crate::locale::{self, DefaultsTree, DescriptionsTree, Resolution};
use crate::validate::{self, Violation};
use crate::value::FieldPath;

pub const DEFAULT_BASE_LOCALE: &str = "en";

/// Immutable schema + defaults + descriptions. `Send + Sync`; resolve from
/// as many threads as needed.
#[derive(Debug, Clone)]
pub struct SchemaBundle {
    schema: SchemaType,
    base_locale: String,
    defaults: DefaultsTree,
    descriptions: DescriptionsTree,
    runtime_fields: Vec<FieldPath>,
}

/// Documentation for one declared field in one locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDoc {
    pub path: FieldPath,
    pub type_description: String,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct SchemaBundleBuilder {
    schema: SchemaType,
    base_locale: String,
    defaults: DefaultsTree,
    descriptions: DescriptionsTree,
    runtime_fields: Vec<FieldPath>,
}

impl SchemaBundleBuilder {
    pub fn base_locale(mut self, locale: impl Into<String>) -> Self {
        self.base_locale = locale.into();
        self
    }

    pub fn defaults(mut self, defaults: DefaultsTree) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn descriptions(mut self, descriptions: DescriptionsTree) -> Self {
        self.descriptions = descriptions;
        self
    }

    /// A required field the calling program fills in at runtime (for example
    /// an output directory), so the defaults need not provide it.
    pub fn runtime_field(mut self, path: FieldPath) -> Self {
        self.runtime_fields.push(path);
        self
    }

    pub fn runtime_fields(mut self, paths: impl IntoIterator<Item = FieldPath>) -> Self {
        self.runtime_fields.extend(paths);
        self
    }

    /// Check the defaults against the schema and freeze the bundle.
    pub fn build(self) -> Result<SchemaBundle, SchemaAuthoringError> {
        let bundle = SchemaBundle {
            schema: self.schema,
            base_locale: self.base_locale,
            defaults: self.defaults,
            descriptions: self.descriptions,
            runtime_fields: self.runtime_fields,
        };
        bundle.check_authoring()?;
        debug!(
            base_locale = %bundle.base_locale,
            locales = bundle.locales().len(),
            fields = bundle.schema.declared_fields().len(),
            "schema bundle ready"
        );
        Ok(bundle)
    }
}

impl SchemaBundle {
    pub fn builder(schema: SchemaType) -> SchemaBundleBuilder {
        SchemaBundleBuilder {
            schema,
            base_locale: DEFAULT_BASE_LOCALE.to_string(),
            defaults: IndexMap::new(),
            descriptions: IndexMap::new(),
            runtime_fields: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaType {
        &self.schema
    }

    pub fn base_locale(&self) -> &str {
        &self.base_locale
    }

    pub fn runtime_fields(&self) -> &[FieldPath] {
        &self.runtime_fields
    }

    /// Base locale first, then every other locale named by defaults or descriptions.
    pub fn locales(&self) -> Vec<&str> {
        let mut out = vec![self.base_locale.as_str()];
        for locale in self.defaults.keys().chain(self.descriptions.keys()) {
            if !out.contains(&locale.as_str()) {
                out.push(locale.as_str());
            }
        }
        out
    }

    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        validate::validate(&self.schema, value)
    }

    /// Merge defaults for `locale` with `user_input` and validate the result.
    pub fn resolve(&self, locale: &str, user_input: &Value) -> Resolution {
        locale::resolve(&self.schema, &self.defaults, &self.base_locale, locale, user_input)
    }

    /// Description of `path` in `locale`, else the base locale, else empty.
    pub fn describe(&self, path: &FieldPath, locale: &str) -> String {
        locale::describe(&self.descriptions, &self.base_locale, path, locale)
    }

    /// Default value at `path` after applying `locale`'s overrides.
    pub fn default_at(&self, path: &FieldPath, locale: &str) -> Option<Value> {
        let tree = locale::locale_defaults(&self.defaults, &self.base_locale, locale);
        path.lookup(&tree).cloned()
    }

    /// Every declared field with its type, description and default in `locale`.
    pub fn field_docs(&self, locale: &str) -> Vec<FieldDoc> {
        let defaults = locale::locale_defaults(&self.defaults, &self.base_locale, locale);
        self.schema
            .declared_fields()
            .into_iter()
            .map(|field| FieldDoc {
                type_description: field.ty.describe(),
                description: self.describe(&field.path, locale),
                required: field.required,
                default: field.path.lookup(&defaults).cloned(),
                path: field.path,
            })
            .collect()
    }

    /// `field_docs` for every known locale.
    pub fn field_docs_all(&self) -> IndexMap<String, Vec<FieldDoc>> {
        self.locales()
            .into_iter()
            .map(|locale| (locale.to_string(), self.field_docs(locale)))
            .collect()
    }

    /// JSON Schema annotated with `locale`'s descriptions and defaults.
    pub fn json_schema(&self, locale: &str) -> Value {
        let defaults = locale::locale_defaults(&self.defaults, &self.base_locale, locale);
        let mut rendered = json_schema::to_json_schema(&self.schema);
        json_schema::annotate(&self.schema, &mut rendered, &|path| {
            (self.describe(path, locale), path.lookup(&defaults).cloned())
        });
        rendered
    }

    fn check_authoring(&self) -> Result<(), SchemaAuthoringError> {
        let Some(base) = self.defaults.get(&self.base_locale) else {
            return Err(SchemaAuthoringError::MissingBaseLocale {
                locale: self.base_locale.clone(),
            });
        };
        if !self.descriptions.contains_key(&self.base_locale) {
            warn!(base_locale = %self.base_locale, "no descriptions for base locale");
        }

        self.check_locale_tree(&self.base_locale, base)?;
        for locale in self.defaults.keys().filter(|l| **l != self.base_locale) {
            let merged = locale::locale_defaults(&self.defaults, &self.base_locale, locale);
            self.check_locale_tree(locale, &merged)?;
        }
        Ok(())
    }

    fn check_locale_tree(&self, locale: &str, tree: &Value) -> Result<(), SchemaAuthoringError> {
        let violations: Vec<Violation> = validate::validate(&self.schema, tree)
            .into_iter()
            .filter(|v| !(v.is_missing_field() && self.runtime_fields.contains(v.path())))
            .collect();
        if violations.is_empty() {
            return Ok(());
        }
        Err(SchemaAuthoringError::InvalidDefaults {
            locale: locale.to_string(),
            violations,
        })
    }
}

// ------------------------------- Tests ------------------------------------ //
