//! Kerning class derivation from glyph edges.
//!
//! Two glyphs kern identically against a neighbor when the pixel pattern
//! along their facing edges is identical, so glyphs are grouped into
//! classes by edge content. The class name encodes that content, which
//! makes re-runs reproduce the same names and keeps the classes
//! human-scannable.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use crate::core::config::{GeneratorConfig, Instructions};
use crate::data::artifacts::write_json;
use crate::font::{Font, GlyphGrid, Side};

/// Derives side-based kerning classes from matching glyph edges.
pub struct KerningClassBuilder {
    font: Font,
    data: GeneratorConfig,
    left_edge: usize,
    right_edge: usize,
}

impl KerningClassBuilder {
    pub fn new(instructions: &Instructions, font: Font) -> Self {
        KerningClassBuilder {
            font,
            data: instructions.generator.clone(),
            left_edge: 1,
            right_edge: 1,
        }
    }

    /// Requested width of the left edge; 0 skips the left side.
    pub fn set_left_edge(&mut self, width: usize) {
        self.left_edge = width;
    }

    /// Requested width of the right edge; 0 skips the right side.
    pub fn set_right_edge(&mut self, width: usize) {
        self.right_edge = width;
    }

    fn requested_edges(&self) -> Vec<(Side, usize)> {
        [(Side::Left, self.left_edge), (Side::Right, self.right_edge)]
            .into_iter()
            .filter(|(_, width)| *width >= 1)
            .collect()
    }

    /// Group the font's glyphs into classes per requested edge.
    ///
    /// Returns `None` when no edge was requested. Class members are the
    /// raw glyph keys, space-joined, in canonical-name order.
    pub fn build(&mut self) -> Option<BTreeMap<String, String>> {
        let edges = self.requested_edges();
        if edges.is_empty() {
            info!("nothing to do");
            return None;
        }
        let mut result = BTreeMap::new();
        for (side, width) in edges {
            let mut groups: HashMap<Vec<Vec<bool>>, Vec<String>> = HashMap::new();
            for record in self.font.glyphs().values() {
                let edge = edge_of(&record.grid, side, width);
                groups.entry(edge).or_default().push(record.raw_name.clone());
            }
            debug!(
                "{} classes for the {side:?} edge at width {width}",
                groups.len()
            );
            let indicator = self.font.indicator(side).to_string();
            for (edge, members) in groups {
                result.insert(class_name(&indicator, &edge), members.join(" "));
            }
        }
        Some(result)
    }

    /// Derive the classes and write the classes artifact.
    pub fn generate(&mut self, output_dir: &Path) -> Result<()> {
        let Some(classes) = self.build() else {
            return Ok(());
        };
        let file_name = format!(
            "{}_L{}_R{}_{}",
            self.font.data.file_name,
            self.left_edge,
            self.right_edge,
            self.data.generated_classes_file
        );
        write_json(
            &output_dir.join(file_name),
            &json!({ "features": { "kerningClasses": classes } }),
        )
    }
}

/// The glyph's edge pattern on `side`: the whole grid when the glyph is
/// no wider than the requested width, otherwise the first (left) or last
/// (right) `width` columns of every row.
pub fn edge_of(grid: &GlyphGrid, side: Side, width: usize) -> Vec<Vec<bool>> {
    if grid.width() <= width {
        return grid.rows().to_vec();
    }
    grid.rows()
        .iter()
        .map(|row| match side {
            Side::Left => row[..width].to_vec(),
            Side::Right => row[row.len() - width..].to_vec(),
        })
        .collect()
}

/// A deterministic, content-derived class name: the side indicator, the
/// edge's column count, and the run-length hash of the edge.
fn class_name(indicator: &str, edge: &[Vec<bool>]) -> String {
    let columns = edge.first().map(Vec::len).unwrap_or(0);
    format!("{indicator}_{columns}_{}", edge_hash(edge))
}

/// Run-length-encode an edge, column by column, into a readable hash.
///
/// `Y` stands for a filled cell and `N` for an empty one; runs longer
/// than one cell are prefixed with their length in uppercase hex, and an
/// `X` separates columns. `8N2YN` reads: eight empty, two filled, one
/// empty, top to bottom.
pub fn edge_hash(edge: &[Vec<bool>]) -> String {
    let columns = edge.first().map(Vec::len).unwrap_or(0);
    let mut encoded = Vec::new();
    for x in 0..columns {
        let mut chunks = String::new();
        let mut current = None;
        let mut count = 0usize;
        for row in edge {
            let cell = row[x];
            if Some(cell) != current {
                push_chunk(&mut chunks, count, current);
                current = Some(cell);
                count = 0;
            }
            count += 1;
        }
        push_chunk(&mut chunks, count, current);
        encoded.push(chunks);
    }
    encoded.join("X")
}

fn push_chunk(out: &mut String, count: usize, cell: Option<bool>) {
    let Some(cell) = cell else {
        return;
    };
    let word = if cell { "Y" } else { "N" };
    if count > 1 {
        out.push_str(&format!("{count:X}{word}"));
    } else if count == 1 {
        out.push_str(word);
    }
}
