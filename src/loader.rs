//! Reading bundle and configuration documents from disk.
//!
//! Parsing is format-specific (JSON or YAML, by extension); everything past
//! this module only sees `Value` trees.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::bundle::SchemaBundle;
use crate::error::{LoadError, SchemaAuthoringError};
use crate::schema_desc::parse_schema;
use crate::value::FieldPath;

/// On-disk layout of a schema bundle.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleDocument {
    pub schema: Value,
    #[serde(default)]
    pub default: IndexMap<String, Value>,
    #[serde(default)]
    pub description: IndexMap<String, Value>,
    #[serde(default)]
    pub base_locale: Option<String>,
    #[serde(default)]
    pub runtime_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

/// Deserialize with document-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str, format: Format) -> Result<T, String> {
    match format {
        Format::Json => {
            let de = &mut serde_json::Deserializer::from_str(src);
            serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
                let path = err.path().to_string();
                format!("at {path} → {}", err.into_inner())
            })
        }
        Format::Yaml => {
            let de = serde_yaml::Deserializer::from_str(src);
            serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
                let path = err.path().to_string();
                format!("at {path} → {}", err.into_inner())
            })
        }
    }
}

impl BundleDocument {
    pub fn parse(src: &str, format: Format) -> Result<Self, String> {
        from_str_with_path(src, format)
    }

    /// Build the bundle; `base_locale` overrides the document's own choice.
    pub fn into_bundle(self, base_locale: Option<&str>) -> Result<SchemaBundle, SchemaAuthoringError> {
        let schema = parse_schema(&self.schema)?;
        let runtime_fields = self
            .runtime_fields
            .iter()
            .map(|p| p.parse::<FieldPath>())
            .collect::<Result<Vec<_>, _>>()?;
        let mut builder = SchemaBundle::builder(schema)
            .defaults(self.default)
            .descriptions(self.description)
            .runtime_fields(runtime_fields);
        if let Some(locale) = base_locale.map(str::to_string).or(self.base_locale) {
            builder = builder.base_locale(locale);
        }
        builder.build()
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read, parse and check a bundle document.
pub fn load_bundle(path: &Path, base_locale: Option<&str>) -> Result<SchemaBundle, LoadError> {
    let src = read(path)?;
    let doc = BundleDocument::parse(&src, Format::from_path(path)).map_err(|reason| LoadError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;
    let bundle = doc.into_bundle(base_locale).map_err(|source| LoadError::Authoring {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded schema bundle");
    Ok(bundle)
}

/// Read one configuration document as a plain value tree.
pub fn load_value(path: &Path) -> Result<Value, LoadError> {
    let src = read(path)?;
    from_str_with_path(&src, Format::from_path(path)).map_err(|reason| LoadError::Parse {
        path: PathBuf::from(path),
        reason,
    })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata;
    use serde_json::json;

    #[test]
    fn yaml_bundle_document_builds() {
        let doc = BundleDocument::parse(testdata::SONGBOOK_YAML, Format::Yaml).unwrap();
        assert_eq!(doc.base_locale.as_deref(), Some("en"));
        assert_eq!(doc.runtime_fields, vec!["_cache", "_outputdir", "_datadir"]);
        let bundle = doc.into_bundle(None).unwrap();
        assert_eq!(bundle.runtime_fields().len(), 3);
        assert_eq!(bundle.locales(), vec!["en", "fr"]);
    }

    #[test]
    fn json_bundle_document_builds() {
        let src = serde_json::to_string(&testdata::songbook_document()).unwrap();
        let bundle = BundleDocument::parse(&src, Format::Json).unwrap().into_bundle(None).unwrap();
        let res = bundle.resolve("fr", &json!({"_cache": true, "_outputdir": "o", "_datadir": []}));
        assert!(res.is_valid(), "{:?}", res.violations);
    }

    #[test]
    fn base_locale_override_is_checked() {
        let doc = BundleDocument::parse(testdata::SONGBOOK_YAML, Format::Yaml).unwrap();
        let err = doc.into_bundle(Some("fr")).unwrap_err();
        // fr alone lacks most required fields
        assert!(matches!(err, SchemaAuthoringError::InvalidDefaults { locale, .. } if locale == "fr"));
    }

    #[test]
    fn parse_errors_name_the_document_path() {
        let src = r#"{"schema": "//rec", "default": {"en": {}}, "runtime_fields": [3]}"#;
        let err = BundleDocument::parse(src, Format::Json).unwrap_err();
        assert!(err.starts_with("at runtime_fields[0]"), "{err}");

        let err = BundleDocument::parse("schema: //rec\nextra: 1\n", Format::Yaml).unwrap_err();
        assert!(err.contains("extra"), "{err}");
    }

    #[test]
    fn bad_runtime_field_path_is_an_authoring_error() {
        let src = r#"{"schema": "//rec", "default": {"en": {}}, "runtime_fields": ["a..b"]}"#;
        let err = BundleDocument::parse(src, Format::Json).unwrap().into_bundle(None).unwrap_err();
        assert!(matches!(err, SchemaAuthoringError::InvalidFieldPath(_)));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("songbook.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("songbook.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("songbook.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("songbook.sb")), Format::Json);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_value(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().starts_with("failed to read /definitely/not/here.yaml"));
    }
}
