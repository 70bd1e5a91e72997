//! CLI: validate | resolve | docs | json-schema
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use locale_schema::loader::{load_bundle, load_value};
use locale_schema::{FieldDoc, Resolution, SchemaBundle, Violation};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate, resolve and document configuration trees against a localized schema bundle
#[derive(Parser, Debug)]
#[command(name = "locale-schema", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve each input and report every violation
    Validate(ValidateOut),
    /// print the fully resolved configuration
    Resolve(ResolveOut),
    /// print field documentation (types, defaults, descriptions)
    Docs(DocsOut),
    /// print the schema as an annotated JSON Schema
    JsonSchema(JsonSchemaOut),
}

#[derive(Args, Debug, Clone)]
struct BundleSettings {
    /// schema bundle document (.yaml/.yml or .json)
    #[arg(long, short)]
    bundle: PathBuf,

    /// base locale; defaults to the bundle's own `base_locale`, else `en`
    #[arg(long)]
    base_locale: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// jq filter selecting the configuration inside each document (e.g. `.songbook`)
    #[arg(long)]
    select: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1..)]
    input: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
enum DocsFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(clap::Parser, Debug)]
struct ValidateOut {
    #[command(flatten)]
    bundle_settings: BundleSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// target locale (base locale if omitted)
    #[arg(long, short)]
    locale: Option<String>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

#[derive(clap::Parser, Debug)]
struct ResolveOut {
    #[command(flatten)]
    bundle_settings: BundleSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// target locale (base locale if omitted)
    #[arg(long, short)]
    locale: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DocsOut {
    #[command(flatten)]
    bundle_settings: BundleSettings,

    /// only this locale (every locale if omitted)
    #[arg(long, short)]
    locale: Option<String>,

    #[arg(long, value_enum, default_value_t = DocsFormat::Markdown)]
    format: DocsFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct JsonSchemaOut {
    #[command(flatten)]
    bundle_settings: BundleSettings,

    /// locale for descriptions and defaults (base locale if omitted)
    #[arg(long, short)]
    locale: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One resolved input, as reported by `validate --format json`.
#[derive(Serialize)]
struct Report<'a> {
    source: &'a str,
    valid: bool,
    violations: &'a [Violation],
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl BundleSettings {
    fn load(&self) -> Result<SchemaBundle> {
        let bundle = load_bundle(&self.bundle, self.base_locale.as_deref())?;
        info!(bundle = %self.bundle.display(), base_locale = bundle.base_locale(), "bundle loaded");
        Ok(bundle)
    }
}

impl InputSettings {
    /// Every configuration tree named by the inputs, labelled by source.
    fn load_all(&self) -> Result<Vec<(String, Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let value = load_value(&source_path)?;
            match self.select.as_ref() {
                None => out.push((source_path_str, value)),
                Some(filter) => {
                    let selected = crate::jq_exec::select_with_jq(filter, &value).with_context(|| {
                        format!("failed to apply jq filter to source file ({source_path_str})")
                    })?;
                    let many = selected.len() > 1;
                    for (i, value) in selected.into_iter().enumerate() {
                        let label = if many { format!("{source_path_str}#{i}") } else { source_path_str.clone() };
                        out.push((label, value));
                    }
                }
            }
        }
        debug!(inputs = out.len(), "loaded configuration inputs");
        Ok(out)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Validate(target) => {
                let bundle = target.bundle_settings.load()?;
                let locale = target.locale.as_deref().unwrap_or(bundle.base_locale());
                let inputs = target.input_settings.load_all()?;
                if inputs.is_empty() {
                    bail!("no inputs given; pass at least one --input");
                }

                // resolutions share the bundle read-only
                let results: Vec<(&str, Resolution)> = inputs
                    .par_iter()
                    .map(|(source, value)| (source.as_str(), bundle.resolve(locale, value)))
                    .collect();

                let failed = results.iter().filter(|(_, res)| !res.is_valid()).count();
                match target.format {
                    ReportFormat::Text => {
                        for (source, res) in &results {
                            print_text_report(source, res);
                        }
                    }
                    ReportFormat::Json => {
                        let reports: Vec<Report> = results
                            .iter()
                            .map(|(source, res)| Report {
                                source: *source,
                                valid: res.is_valid(),
                                violations: &res.violations,
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&reports)?);
                    }
                }
                Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
            }
            Command::Resolve(target) => {
                let bundle = target.bundle_settings.load()?;
                let locale = target.locale.as_deref().unwrap_or(bundle.base_locale());
                let inputs = target.input_settings.load_all()?;
                let user_input = single_user_input(inputs, &target.input_settings)?;

                let res = bundle.resolve(locale, &user_input);
                for violation in &res.violations {
                    eprintln!("{} {violation}", "warning:".yellow().bold());
                }
                write_output(target.out.as_deref(), &serde_json::to_string_pretty(&res.config)?)?;
                Ok(if res.is_valid() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
            }
            Command::Docs(target) => {
                let bundle = target.bundle_settings.load()?;
                let docs: IndexMap<String, Vec<FieldDoc>> = match target.locale.as_deref() {
                    Some(locale) => [(locale.to_string(), bundle.field_docs(locale))].into_iter().collect(),
                    None => bundle.field_docs_all(),
                };
                let rendered = match target.format {
                    DocsFormat::Json => serde_json::to_string_pretty(&docs)?,
                    DocsFormat::Markdown => docs
                        .iter()
                        .map(|(locale, fields)| render_markdown(locale, fields))
                        .collect::<Vec<_>>()
                        .join("\n"),
                };
                write_output(target.out.as_deref(), &rendered)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::JsonSchema(target) => {
                let bundle = target.bundle_settings.load()?;
                let locale = target.locale.as_deref().unwrap_or(bundle.base_locale());
                let schema = bundle.json_schema(locale);
                write_output(target.out.as_deref(), &serde_json::to_string_pretty(&schema)?)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_text_report(source: &str, res: &Resolution) {
    if res.is_valid() {
        println!("{} {source}", "ok".green().bold());
        return;
    }
    println!("{} {source} ({} violations)", "FAIL".red().bold(), res.violations.len());
    for violation in &res.violations {
        println!("  {} {}", violation.path().to_string().bold(), describe_violation(violation));
    }
}

fn describe_violation(violation: &Violation) -> String {
    // the path is printed separately
    let full = violation.to_string();
    let prefix = format!("{}: ", violation.path());
    full.strip_prefix(&prefix).unwrap_or(&full).to_string()
}

fn render_markdown(locale: &str, fields: &[FieldDoc]) -> String {
    let mut s = format!("## {locale}\n\n| field | type | required | default | description |\n|---|---|---|---|---|\n");
    for field in fields {
        let default = field
            .default
            .as_ref()
            .map(|v| format!("`{v}`"))
            .unwrap_or_default();
        s.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            field.path,
            field.type_description.replace('|', "\\|"),
            if field.required { "yes" } else { "no" },
            default.replace('|', "\\|"),
            field.description.replace('|', "\\|"),
        ));
    }
    s
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

/// The one tree `resolve` starts from; nil when no input was named.
fn single_user_input(inputs: Vec<(String, Value)>, settings: &InputSettings) -> Result<Value> {
    let mut inputs = inputs.into_iter();
    match (inputs.next(), inputs.next()) {
        (None, _) => {
            if let Some(filter) = settings.select.as_deref().filter(|_| !settings.input.is_empty()) {
                bail!("jq filter `{filter}` selected nothing from the input");
            }
            Ok(Value::Null)
        }
        (Some((_, value)), None) => Ok(value),
        (Some(_), Some(_)) => bail!("`resolve` takes at most one input document"),
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // an explicit glob that matched nothing is a mistake
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
