//! Instructions loading and the configuration data model.
//!
//! A font build is described by a JSON "instructions" file. Instructions
//! files can inherit from other instructions files via an `inherit` key
//! (a path or list of paths relative to the file); values from the first
//! file that sets them win, and built-in defaults fill whatever remains.
//! The merged result deserializes into [`Instructions`], which is passed
//! explicitly into every component that needs it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::error::BuildError;

/// Protects against infinite recursive loading of instructions files.
const MAX_INSTRUCTIONS_DEPTH: usize = 50;

/// The fully merged instructions for one build run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Instructions {
    pub font: FontConfig,
    /// Explicit glyph-name to character assignments, tried before any
    /// other name resolution strategy.
    pub name2_unicode: BTreeMap<String, String>,
    pub metadata: Metadata,
    pub generator: GeneratorConfig,
    /// Glyph name to glyph-file mapping, files relative to the glyph folder.
    pub glyphs: BTreeMap<String, String>,
    pub features: Features,
}

impl Instructions {
    /// Check the invariants the rest of the pipeline relies on.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.font.filled == self.font.empty {
            return Err(BuildError::Config(format!(
                "the filled symbol {:?} and the empty symbol must differ",
                self.font.filled
            )));
        }
        if self.font.line_count < 1 {
            return Err(BuildError::Config(
                "lineCount must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-font configuration: grid shape, symbols, and class indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontConfig {
    pub file_name: String,
    /// An OpenType feature file attached verbatim to the generated font.
    #[serde(deserialize_with = "string_or_false")]
    pub feature_file: Option<String>,
    pub glyph_folder: String,
    /// Height of all glyphs in grid rows; glyph files are cropped or
    /// padded to this.
    pub line_count: usize,
    /// Grid rows below the baseline, counted from the bottom.
    pub descent: i32,
    /// Underline position in grid rows from the baseline.
    pub upos: i32,
    /// Underline height in grid rows.
    pub uwidth: i32,
    /// The symbol marking a filled cell in glyph files.
    pub filled: char,
    /// The symbol marking an empty cell in glyph files.
    pub empty: char,
    /// Name prefix of kerning classes keyed on glyph right edges.
    pub class_right_indicator: String,
    /// Name prefix of kerning classes keyed on glyph left edges.
    pub class_left_indicator: String,
    /// Source folder of the font; defaults to the instructions file's
    /// directory.
    pub folder: Option<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        FontConfig {
            file_name: "unnamed".to_string(),
            feature_file: None,
            glyph_folder: "glyphs".to_string(),
            line_count: 12,
            descent: 2,
            upos: 3,
            uwidth: 1,
            filled: '#',
            empty: '.',
            class_right_indicator: "@_1R".to_string(),
            class_left_indicator: "@_2L".to_string(),
            folder: None,
        }
    }
}

/// Naming metadata carried into the generated font.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    pub fontname: String,
    pub weight: String,
    pub fullname: String,
    pub familyname: String,
    pub copyright: String,
    pub version: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            fontname: "unnamed-medium".to_string(),
            weight: "Medium".to_string(),
            fullname: "unnamed medium".to_string(),
            familyname: "unnamed".to_string(),
            copyright: "Copyright (c), put your notice here.".to_string(),
            version: "0".to_string(),
        }
    }
}

/// Geometry and output settings for the generators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// One grid cell in font design units.
    pub unit: f64,
    /// X and Y inset of the final pixel shape.
    pub offset: f64,
    /// Width (diameter) of the final pixel shape.
    pub width: f64,
    /// The font's em height, usually 1000 for postscript-flavored fonts.
    pub em: f64,
    /// Explicit em descent; a value of 0 means "derive from the font's
    /// grid descent times the unit".
    pub em_descent: f64,
    /// Sample each filled cell's neighborhood to decide which of its
    /// corners are rounded, instead of rounding all four.
    pub contextual_shape: bool,
    /// Corner radius for rounded patches on empty cells. Values below 1
    /// are a fraction of the shape width, larger values are absolute
    /// design units; always clamped to half the shape width.
    pub outside_corner_radius: f64,
    /// Corner radius for filled cells, same resolution rules.
    pub inside_corner_radius: f64,
    pub generated_classes_file: String,
    pub generated_kerning_file: String,
    /// Overlap removal is left to downstream font tooling; the flag is
    /// carried through for it.
    pub remove_overlap: bool,
    /// Same as `remove_overlap`: downstream tooling's business.
    pub auto_hint: bool,
    /// Cut the rounded outside patches from the surrounding space
    /// instead of the pixel shape.
    pub invert_outside: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            unit: 125.0,
            offset: 5.0,
            width: 115.0,
            em: 1000.0,
            em_descent: 200.0,
            contextual_shape: false,
            outside_corner_radius: 0.0,
            inside_corner_radius: 0.0,
            generated_classes_file: "classes.json".to_string(),
            generated_kerning_file: "kerning.json".to_string(),
            remove_overlap: true,
            auto_hint: true,
            invert_outside: false,
        }
    }
}

/// Kerning-related features of a font.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Features {
    /// Kerning class name to space-joined raw glyph names.
    pub kerning_classes: BTreeMap<String, String>,
    /// Kerning class name to the side-bearing contribution of the class.
    /// Absence means zero.
    pub distances: BTreeMap<String, i32>,
    /// Explicit kerning pairs.
    pub kern: Vec<KernPair>,
}

/// One kerning pair, stored in JSON as
/// `[rightEdgeClass, leftEdgeClass, value, ...]`.
///
/// Anything beyond the standard triple is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct KernPair {
    /// The class keyed on glyph right edges (first in the pair).
    pub right: String,
    /// The class keyed on glyph left edges (second in the pair).
    pub left: String,
    pub value: i32,
    /// Trailing entries beyond the standard triple, preserved verbatim.
    pub extra: Vec<Value>,
}

impl Serialize for KernPair {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(3 + self.extra.len()))?;
        seq.serialize_element(&self.right)?;
        seq.serialize_element(&self.left)?;
        seq.serialize_element(&self.value)?;
        for value in &self.extra {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for KernPair {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut entries = Vec::<Value>::deserialize(deserializer)?;
        if entries.len() < 3 {
            return Err(de::Error::invalid_length(
                entries.len(),
                &"a kern entry of at least [rightClass, leftClass, value]",
            ));
        }
        let extra = entries.split_off(3);
        let value = entries
            .pop()
            .and_then(|v| v.as_i64())
            .ok_or_else(|| de::Error::custom("kern entry value must be an integer"))?;
        let left = match entries.pop() {
            Some(Value::String(s)) => s,
            _ => return Err(de::Error::custom("kern entry left class must be a string")),
        };
        let right = match entries.pop() {
            Some(Value::String(s)) => s,
            _ => return Err(de::Error::custom("kern entry right class must be a string")),
        };
        Ok(KernPair {
            right,
            left,
            value: value as i32,
            extra,
        })
    }
}

/// Accepts `false` (and `null`) where older instructions files use it to
/// mean "unset" for an optional string.
fn string_or_false<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(de::Error::custom(format!(
            "expected a string, false, or null, got {other}"
        ))),
    }
}

/// Load an instructions file, resolving its `inherit` chain.
///
/// Values already set by an earlier file are never overwritten; built-in
/// defaults are merged in last. The font's source folder defaults to the
/// directory of the entry file.
pub fn load_instructions(path: &Path) -> Result<Instructions> {
    let mut merged = serde_json::Map::new();
    let mut stack = vec![(path.to_path_buf(), 0usize)];
    while let Some((file, depth)) = stack.pop() {
        if depth >= MAX_INSTRUCTIONS_DEPTH {
            return Err(BuildError::Config(format!(
                "instructions inherit chains deeper than {MAX_INSTRUCTIONS_DEPTH} \
                 levels are not permitted, to prevent recursion"
            ))
            .into());
        }
        debug!("loading instructions {} at depth {depth}", file.display());
        let text = fs::read_to_string(&file)
            .with_context(|| format!("reading instructions file {}", file.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing instructions file {}", file.display()))?;
        let Value::Object(mut data) = value else {
            return Err(BuildError::Config(format!(
                "instructions file {} must contain a JSON object",
                file.display()
            ))
            .into());
        };
        if let Some(inherit) = data.remove("inherit") {
            let folder = file.parent().map(Path::to_path_buf).unwrap_or_default();
            for parent in inherit_list(inherit)? {
                stack.push((folder.join(parent), depth + 1));
            }
        }
        merge_missing(&mut merged, &data);
    }

    let defaults = serde_json::to_value(Instructions::default())?;
    if let Value::Object(defaults) = defaults {
        merge_missing(&mut merged, &defaults);
    }
    let mut instructions: Instructions = serde_json::from_value(Value::Object(merged))
        .with_context(|| format!("interpreting merged instructions from {}", path.display()))?;
    if instructions.font.folder.is_none() {
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!(
            "font source folder defaults to the instructions file's directory: {}",
            folder.display()
        );
        instructions.font.folder = Some(folder);
    }
    instructions.validate()?;
    Ok(instructions)
}

fn inherit_list(value: Value) -> Result<Vec<String>, BuildError> {
    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(BuildError::Config(format!(
                    "\"inherit\" entries must be strings, got {other}"
                ))),
            })
            .collect(),
        other => Err(BuildError::Config(format!(
            "\"inherit\" must be a string or a list of strings, got {other}"
        ))),
    }
}

/// Merge `extension` into `base` without overwriting anything `base`
/// already sets. Object values merge one level deep, so e.g. the keys of
/// `generator` combine while each individual setting keeps its first
/// loaded value.
fn merge_missing(
    base: &mut serde_json::Map<String, Value>,
    extension: &serde_json::Map<String, Value>,
) {
    for (key, value) in extension {
        match base.get_mut(key) {
            None => {
                base.insert(key.clone(), value.clone());
            }
            Some(Value::Object(existing)) => {
                if let Value::Object(incoming) = value {
                    for (sub_key, sub_value) in incoming {
                        existing
                            .entry(sub_key.clone())
                            .or_insert_with(|| sub_value.clone());
                    }
                }
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_fill_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "font.json", r#"{"font": {"fileName": "demo"}}"#);
        let instructions = load_instructions(&path).unwrap();
        assert_eq!(instructions.font.file_name, "demo");
        // Untouched keys of the same section come from the defaults.
        assert_eq!(instructions.font.line_count, 12);
        assert_eq!(instructions.generator.unit, 125.0);
        assert_eq!(instructions.font.folder.as_deref(), Some(dir.path()));
    }

    #[test]
    fn first_loaded_file_wins_over_inherited() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "base.json",
            r#"{"font": {"fileName": "base", "lineCount": 8}}"#,
        );
        let path = write_file(
            dir.path(),
            "font.json",
            r#"{"inherit": "base.json", "font": {"fileName": "child"}}"#,
        );
        let instructions = load_instructions(&path).unwrap();
        assert_eq!(instructions.font.file_name, "child");
        assert_eq!(instructions.font.line_count, 8);
    }

    #[test]
    fn inherit_accepts_a_list() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.json", r#"{"generator": {"unit": 100}}"#);
        write_file(dir.path(), "b.json", r#"{"generator": {"width": 90}}"#);
        let path = write_file(
            dir.path(),
            "font.json",
            r#"{"inherit": ["a.json", "b.json"]}"#,
        );
        let instructions = load_instructions(&path).unwrap();
        assert_eq!(instructions.generator.unit, 100.0);
        assert_eq!(instructions.generator.width, 90.0);
    }

    #[test]
    fn recursive_inheritance_is_depth_limited() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "loop.json", r#"{"inherit": "loop.json"}"#);
        let error = load_instructions(&path).unwrap_err();
        assert!(error.to_string().contains("configuration error"));
    }

    #[test]
    fn identical_symbols_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "font.json",
            r#"{"font": {"filled": ".", "empty": "."}}"#,
        );
        assert!(load_instructions(&path).is_err());
    }

    #[test]
    fn feature_file_false_means_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "font.json",
            r#"{"font": {"featureFile": false}}"#,
        );
        let instructions = load_instructions(&path).unwrap();
        assert_eq!(instructions.font.feature_file, None);
    }

    #[test]
    fn kern_pairs_round_trip_with_extra_fields() {
        let json = r#"[["@_1R_a", "@_2L_b", -10, true], ["@_1R_a", "@_2L_c", 5]]"#;
        let pairs: Vec<KernPair> = serde_json::from_str(json).unwrap();
        assert_eq!(pairs[0].right, "@_1R_a");
        assert_eq!(pairs[0].left, "@_2L_b");
        assert_eq!(pairs[0].value, -10);
        assert_eq!(pairs[0].extra, vec![Value::Bool(true)]);
        assert!(pairs[1].extra.is_empty());
        let back = serde_json::to_string(&pairs).unwrap();
        assert_eq!(
            back,
            r#"[["@_1R_a","@_2L_b",-10,true],["@_1R_a","@_2L_c",5]]"#
        );
    }
}
