//! The in-memory font: glyph grids, kerning features, and name state.

pub mod grid;
pub mod names;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::config::{Features, FontConfig, Instructions};
use crate::core::error::BuildError;

pub use grid::GlyphGrid;
pub use names::NameResolver;

/// Which glyph edge a kerning class is keyed on.
///
/// A right-edge class sits first in a kerning pair and feeds the right
/// side bearing; a left-edge class sits second and feeds the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// One stored glyph: its grid, the key it was supplied under, and the
/// lazily computed kerning lookups.
#[derive(Debug, Clone)]
pub struct GlyphRecord {
    pub grid: GlyphGrid,
    /// The identifier the glyph was originally supplied under, kept for
    /// diagnostics and for the kerning-class artifacts.
    pub raw_name: String,
    classes: Option<Vec<String>>,
    distances: Option<(i32, i32)>,
}

/// A collection of glyphs plus the kerning features that describe them.
///
/// All derived values (class membership, per-glyph distances) are cached
/// on first access and only invalidated by building a new `Font`.
#[derive(Debug, Clone)]
pub struct Font {
    pub data: FontConfig,
    pub features: Features,
    pub names: NameResolver,
    glyphs: BTreeMap<String, GlyphRecord>,
    classes: Option<BTreeMap<String, Vec<String>>>,
}

impl Font {
    pub fn new(instructions: &Instructions) -> Self {
        Font {
            data: instructions.font.clone(),
            features: instructions.features.clone(),
            names: NameResolver::new(&instructions.name2_unicode),
            glyphs: BTreeMap::new(),
            classes: None,
        }
    }

    /// Build a font and load every glyph file named by the instructions.
    pub fn from_folder(instructions: &Instructions) -> Result<Self> {
        let mut font = Font::new(instructions);
        let folder = font
            .data
            .folder
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let glyph_folder = folder.join(&font.data.glyph_folder);
        for (glyph_name, glyph_file) in &instructions.glyphs {
            let path = glyph_folder.join(glyph_file);
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading glyph file {}", path.display()))?;
            let lines: Vec<String> = text
                .lines()
                .take(font.data.line_count)
                .map(str::to_string)
                .collect();
            font.set_glyph(glyph_name, &lines);
        }
        Ok(font)
    }

    /// Store a glyph under its canonical name. Overwriting an existing
    /// glyph is allowed; the last writer wins.
    pub fn set_glyph(&mut self, raw_name: &str, lines: &[String]) {
        let name = self.names.name(raw_name);
        if let Some(existing) = self.glyphs.get(&name) {
            debug!(
                "overwriting {raw_name} ({name}), it already exists; it was called {} at load time",
                existing.raw_name
            );
        }
        debug!("setting glyph {raw_name} as {name}");
        let grid = GlyphGrid::normalize(lines, self.data.line_count, self.data.filled);
        self.glyphs.insert(
            name,
            GlyphRecord {
                grid,
                raw_name: raw_name.to_string(),
                classes: None,
                distances: None,
            },
        );
    }

    /// All glyphs, keyed and ordered by canonical name.
    pub fn glyphs(&self) -> &BTreeMap<String, GlyphRecord> {
        &self.glyphs
    }

    pub fn glyph(&self, name: &str) -> Option<&GlyphRecord> {
        self.glyphs.get(name)
    }

    /// The side a kerning class belongs to, judged by its name prefix.
    pub fn side_of(&self, class_name: &str) -> Option<Side> {
        if class_name.starts_with(&self.data.class_left_indicator) {
            Some(Side::Left)
        } else if class_name.starts_with(&self.data.class_right_indicator) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// The configured name prefix for classes of `side`.
    pub fn indicator(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.data.class_left_indicator,
            Side::Right => &self.data.class_right_indicator,
        }
    }

    /// Kerning classes with their member lists resolved to canonical
    /// glyph names. Computed once per font.
    pub fn classes(&mut self) -> &BTreeMap<String, Vec<String>> {
        if self.classes.is_none() {
            let mut classes = BTreeMap::new();
            let raw: Vec<(String, String)> = self
                .features
                .kerning_classes
                .iter()
                .map(|(name, members)| (name.clone(), members.clone()))
                .collect();
            for (class_name, members) in raw {
                let resolved = members
                    .split(' ')
                    .filter(|member| !member.is_empty())
                    .map(|member| self.names.name(member))
                    .collect();
                classes.insert(class_name, resolved);
            }
            self.classes = Some(classes);
        }
        self.classes.as_ref().expect("classes were just computed")
    }

    /// The kerning classes containing the glyph, cached per glyph.
    ///
    /// Membership in more than two classes is suspicious enough to warn
    /// about, but never an error.
    pub fn glyph_classes(&mut self, name: &str) -> Result<Vec<String>, BuildError> {
        if !self.glyphs.contains_key(name) {
            return Err(BuildError::Lookup(format!("no glyph named {name:?}")));
        }
        if self.glyphs[name].classes.is_none() {
            let memberships: Vec<String> = self
                .classes()
                .iter()
                .filter(|(_, members)| members.iter().any(|member| member == name))
                .map(|(class_name, _)| class_name.clone())
                .collect();
            if memberships.len() > 2 {
                warn!(
                    "glyph {name} has more than 2 classes: {} {memberships:?}",
                    memberships.len()
                );
            }
            let record = self.glyphs.get_mut(name).expect("glyph presence checked");
            record.classes = Some(memberships);
        }
        Ok(self.glyphs[name]
            .classes
            .clone()
            .expect("classes were just computed"))
    }

    /// The glyph's `(left, right)` side-bearing contribution, summed from
    /// the distance table over the glyph's classes and routed by each
    /// class's side indicator. Cached per glyph.
    pub fn glyph_distances(&mut self, name: &str) -> Result<(i32, i32), BuildError> {
        if let Some(cached) = self.glyphs.get(name).and_then(|record| record.distances) {
            return Ok(cached);
        }
        let mut left = 0;
        let mut right = 0;
        let mut nirvana = 0;
        for class_name in self.glyph_classes(name)? {
            let Some(&value) = self.features.distances.get(&class_name) else {
                continue;
            };
            match self.side_of(&class_name) {
                Some(Side::Left) => left += value,
                Some(Side::Right) => right += value,
                None => {
                    // No recognizable side, the value goes nowhere.
                    nirvana += value;
                }
            }
        }
        if nirvana != 0 {
            debug!("glyph {name}: {nirvana} units of distance have no side to go to");
        }
        let record = self.glyphs.get_mut(name).expect("glyph presence checked");
        record.distances = Some((left, right));
        Ok((left, right))
    }
}
