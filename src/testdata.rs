//! Songbook configuration fixture shared by the bundle and loader tests.
use indexmap::IndexMap;
use serde_json::Value;

use crate::bundle::SchemaBundle;
use crate::ir::SchemaType;
use crate::schema_desc::parse_schema;
use crate::value::FieldPath;

pub(crate) const SONGBOOK_YAML: &str = r#"
base_locale: en
runtime_fields: [_cache, _outputdir, _datadir]
schema:
  type: //rec
  optional:
    content: //any
  required:
    _cache: //bool
    _outputdir: //str
    _datadir:
      type: //arr
      contents: //str
    book:
      type: //rec
      required:
        encoding: //str
        lang: //str
        pictures: //bool
        template: //str
        onesongperpage: //bool
    chords:
      type: //rec
      required:
        show: //bool
        diagramreminder:
          type: //any
          of:
            - type: //str
              value: none
            - type: //str
              value: important
            - type: //str
              value: all
        diagrampage: //bool
        repeatchords: //bool
        lilypond: //bool
        tablatures: //bool
        instrument:
          type: //any
          of:
            - type: //str
              value: guitar
            - type: //str
              value: ukulele
        notation:
          type: //any
          of:
            - type: //str
              value: alphascale
            - type: //str
              value: solfedge
            - type: //arr
              contents: //str
              length:
                min: 7
                max: 7
    authors:
      type: //rec
      required:
        separators:
          type: //any
          of:
            - type: //arr
              contents: //str
            - //nil
        ignore:
          type: //any
          of:
            - type: //arr
              contents: //str
            - //nil
    titles:
      type: //rec
      required:
        prefix:
          type: //any
          of:
            - type: //arr
              contents: //str
            - //nil
default:
  en:
    book:
      encoding: utf-8
      lang: en
      pictures: true
      template: default.tex
      onesongperpage: false
    chords:
      show: true
      diagramreminder: important
      diagrampage: true
      repeatchords: true
      lilypond: false
      tablatures: false
      instrument: guitar
      notation: alphascale
    authors:
      separators: [and]
      ignore: [unknown]
    titles:
      prefix: [The, A, An]
  fr:
    book:
      lang: fr
    chords:
      notation: solfedge
    authors:
      separators: [et]
      ignore: [inconnu]
    titles:
      prefix: [Le, La, Les, "L'", Un, Une]
description:
  en:
    book:
      lang: Language of the songbook
      pictures: Display the album covers
    chords:
      show: Display chords
      lilypond: Show lilypond scores
      notation: Chord notation
  fr:
    book:
      lang: Langue du carnet
    chords:
      show: Afficher les accords
      notation: Notation des accords
"#;

pub(crate) fn songbook_document() -> Value {
    serde_yaml::from_str(SONGBOOK_YAML).expect("fixture is valid YAML")
}

fn locale_table(doc: &Value, key: &str) -> IndexMap<String, Value> {
    doc[key]
        .as_object()
        .expect("locale table")
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub(crate) fn songbook_schema() -> SchemaType {
    parse_schema(&songbook_document()["schema"]).expect("fixture schema parses")
}

pub(crate) fn songbook_defaults() -> IndexMap<String, Value> {
    locale_table(&songbook_document(), "default")
}

pub(crate) fn songbook_descriptions() -> IndexMap<String, Value> {
    locale_table(&songbook_document(), "description")
}

pub(crate) fn runtime_fields() -> Vec<FieldPath> {
    ["_cache", "_outputdir", "_datadir"].into_iter().map(FieldPath::from).collect()
}

pub(crate) fn songbook_bundle() -> SchemaBundle {
    SchemaBundle::builder(songbook_schema())
        .base_locale("en")
        .defaults(songbook_defaults())
        .descriptions(songbook_descriptions())
        .runtime_fields(runtime_fields())
        .build()
        .expect("fixture bundle builds")
}
