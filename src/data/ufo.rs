//! UFO font assembly and output through norad.
//!
//! The geometry engine produces plain `kurbo::BezPath` contours; this
//! module converts them to UFO glyphs, assembles font metrics, metadata,
//! groups and kerning, and saves the package. Outline post-processing
//! (overlap removal, hinting) belongs to whatever compiles the UFO.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use kurbo::{BezPath, PathEl, Point};
use norad::{Contour, ContourPoint, Glyph, PointType};
use tracing::{debug, info};

use crate::core::config::{GeneratorConfig, Instructions, Metadata};
use crate::font::Font;
use crate::geometry::{trace_glyph, DrawOptions};

/// Builds a UFO font from a grid font.
pub struct UfoGenerator {
    font: Font,
    data: GeneratorConfig,
    metadata: Metadata,
}

impl UfoGenerator {
    pub fn new(instructions: &Instructions, font: Font) -> Self {
        UfoGenerator {
            font,
            data: instructions.generator.clone(),
            metadata: instructions.metadata.clone(),
        }
    }

    /// Build the font and save it as `<fileName>.ufo` in `output_dir`.
    pub fn generate(&mut self, output_dir: &Path) -> Result<()> {
        let ufo = self.build()?;
        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        let path = output_dir.join(format!("{}.ufo", self.font.data.file_name));
        ufo.save(&path)
            .with_context(|| format!("saving UFO package {}", path.display()))?;
        info!("wrote a UFO package: {}", path.display());
        Ok(())
    }

    /// Assemble the complete norad font in memory.
    pub fn build(&mut self) -> Result<norad::Font> {
        let mut target = norad::Font::new();
        self.setup_metrics(&mut target);
        self.setup_metadata(&mut target);
        self.attach_features(&mut target)?;
        if self.data.remove_overlap || self.data.auto_hint {
            debug!("overlap removal and hinting are left to the UFO compiler");
        }
        let options = DrawOptions::from_config(&self.data, self.font.data.descent);
        let names: Vec<String> = self.font.glyphs().keys().cloned().collect();
        for name in names {
            self.build_glyph(&mut target, &name, &options)?;
        }
        self.add_kerning(&mut target)?;
        Ok(target)
    }

    /// The em descent: explicit from the configuration if nonzero,
    /// otherwise derived from the font's grid descent.
    fn em_descent(&self) -> f64 {
        if self.data.em_descent != 0.0 {
            debug!("descent, using generator emDescent: {}", self.data.em_descent);
            self.data.em_descent
        } else {
            let derived = self.font.data.descent as f64 * self.data.unit;
            debug!("descent, calculated from font descent times unit: {derived}");
            derived
        }
    }

    fn setup_metrics(&self, target: &mut norad::Font) {
        let descent = self.em_descent();
        let info = &mut target.font_info;
        info.units_per_em = norad::fontinfo::NonNegativeIntegerOrFloat::new(self.data.em);
        info.ascender = Some(self.data.em - descent);
        info.descender = Some(-descent);
        info.postscript_underline_position =
            Some(self.font.data.upos as f64 * self.data.unit + self.data.offset);
        info.postscript_underline_thickness =
            Some(self.font.data.uwidth as f64 * self.data.unit - 2.0 * self.data.offset);
    }

    fn setup_metadata(&self, target: &mut norad::Font) {
        let info = &mut target.font_info;
        info.family_name = Some(self.metadata.familyname.clone());
        info.style_name = Some(self.metadata.weight.clone());
        info.copyright = Some(self.metadata.copyright.clone());
        info.postscript_font_name = Some(self.metadata.fontname.clone());
        info.postscript_full_name = Some(self.metadata.fullname.clone());
        if let Ok(major) = self.metadata.version.parse::<i32>() {
            info.version_major = Some(major);
        }
    }

    /// Attach the font's feature file verbatim; compiling it is the UFO
    /// consumer's job.
    fn attach_features(&self, target: &mut norad::Font) -> Result<()> {
        let Some(file) = &self.font.data.feature_file else {
            return Ok(());
        };
        let folder = self.font.data.folder.clone().unwrap_or_default();
        let path = folder.join(file);
        target.features = fs::read_to_string(&path)
            .with_context(|| format!("reading feature file {}", path.display()))?;
        debug!("attached feature file {}", path.display());
        Ok(())
    }

    fn build_glyph(
        &mut self,
        target: &mut norad::Font,
        name: &str,
        options: &DrawOptions,
    ) -> Result<()> {
        let (codepoint, name) = self.font.names.resolve(name);
        let (left, right) = self.font.glyph_distances(&name)?;
        let record = self.font.glyph(&name).expect("glyph names come from the font");

        let mut glyph = Glyph::new(&name);
        for path in trace_glyph(&record.grid, left, options) {
            glyph.contours.push(contour_from_path(&path)?);
        }
        glyph.width = (record.grid.width() as f64 + left as f64 + right as f64) * options.unit;
        glyph.height = glyph.width;
        if let Some(ch) = char::from_u32(codepoint) {
            glyph.codepoints.insert(ch);
        }
        debug!(
            "built glyph {name} with codepoint {codepoint:#06X} and width {}",
            glyph.width
        );
        target.default_layer_mut().insert_glyph(glyph);
        Ok(())
    }

    /// Store the kerning classes as UFO groups and the explicit pairs as
    /// group kerning, scaled from grid units to design units.
    fn add_kerning(&mut self, target: &mut norad::Font) -> Result<()> {
        let unit = self.data.unit;
        let classes = self.font.classes().clone();
        for (class_name, members) in &classes {
            let group = members
                .iter()
                .map(|member| member.parse::<norad::Name>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("group members of {class_name}"))?;
            target.groups.insert(
                class_name
                    .parse::<norad::Name>()
                    .with_context(|| format!("group name {class_name}"))?,
                group,
            );
        }
        for pair in &self.font.features.kern {
            let first: norad::Name = pair.right.parse().with_context(|| pair.right.clone())?;
            let second: norad::Name = pair.left.parse().with_context(|| pair.left.clone())?;
            target
                .kerning
                .entry(first)
                .or_default()
                .insert(second, pair.value as f64 * unit);
        }
        Ok(())
    }
}

/// Convert one generated contour to a UFO contour.
///
/// Generated contours start with a move, contain only lines and cubics,
/// and close back to the start. UFO contours are cyclic, so the leading
/// move becomes the first point and a trailing on-curve point that lands
/// on the start is folded into it.
pub fn contour_from_path(path: &BezPath) -> Result<Contour> {
    let elements = path.elements();
    let first = match elements.first() {
        Some(PathEl::MoveTo(p)) => *p,
        _ => bail!("a cell contour must start with a move"),
    };

    let mut points: Vec<ContourPoint> = Vec::new();
    for el in elements.iter().skip(1) {
        match *el {
            PathEl::LineTo(p) => points.push(contour_point(p, PointType::Line)),
            PathEl::CurveTo(a, b, p) => {
                points.push(contour_point(a, PointType::OffCurve));
                points.push(contour_point(b, PointType::OffCurve));
                points.push(contour_point(p, PointType::Curve));
            }
            PathEl::ClosePath => {}
            PathEl::MoveTo(_) | PathEl::QuadTo(..) => {
                bail!("unexpected element in a cell contour")
            }
        }
    }

    // The segment arriving at the start decides the first point's type:
    // normally the implicit closing line, but when the last drawn
    // segment already ends on the start the first point takes it over.
    let mut first_type = PointType::Line;
    if let Some(index) = points
        .iter()
        .rposition(|p| matches!(p.typ, PointType::Line | PointType::Curve))
    {
        let eps = 1e-9;
        if (points[index].x - first.x).abs() < eps && (points[index].y - first.y).abs() < eps {
            first_type = points[index].typ.clone();
            points.remove(index);
        }
    }
    points.insert(0, contour_point(first, first_type));

    Ok(Contour::new(points, None))
}

fn contour_point(p: Point, typ: PointType) -> ContourPoint {
    ContourPoint::new(p.x, p.y, typ, false, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::KernPair;
    use crate::geometry::{draw_filled, Corners};

    fn draw_options(generator: &GeneratorConfig) -> DrawOptions {
        DrawOptions::from_config(generator, 0)
    }

    #[test]
    fn square_contour_is_four_line_points() {
        let generator = GeneratorConfig::default();
        let path = draw_filled(0.0, 0.0, Corners::NONE, &draw_options(&generator));
        let contour = contour_from_path(&path).unwrap();
        assert_eq!(contour.points.len(), 4);
        assert!(contour
            .points
            .iter()
            .all(|p| matches!(p.typ, PointType::Line)));
    }

    #[test]
    fn rounded_contour_keeps_its_offcurves() {
        let generator = GeneratorConfig {
            inside_corner_radius: 20.0,
            ..GeneratorConfig::default()
        };
        let path = draw_filled(0.0, 0.0, Corners::ALL, &draw_options(&generator));
        let contour = contour_from_path(&path).unwrap();
        let offcurves = contour
            .points
            .iter()
            .filter(|p| matches!(p.typ, PointType::OffCurve))
            .count();
        let oncurves = contour.points.len() - offcurves;
        assert_eq!(offcurves, 8);
        assert_eq!(oncurves, 8);
    }

    #[test]
    fn half_width_radius_folds_the_closing_curve_into_the_start() {
        // With the radius at half the width the corners touch, the
        // closing segment is the SE cubic, and its end point duplicates
        // the start.
        let generator = GeneratorConfig {
            width: 100.0,
            inside_corner_radius: 50.0,
            ..GeneratorConfig::default()
        };
        let path = draw_filled(0.0, 0.0, Corners::ALL, &draw_options(&generator));
        let contour = contour_from_path(&path).unwrap();
        assert!(matches!(contour.points[0].typ, PointType::Curve));
        assert_eq!(contour.points.len(), 12);
    }

    #[test]
    fn builds_a_font_with_advances_and_codepoints() {
        let instructions = Instructions::default();
        let mut font = Font::new(&instructions);
        font.set_glyph("a", &["#".to_string()]);
        let mut generator = UfoGenerator::new(&instructions, font);
        let ufo = generator.build().unwrap();

        let glyph = ufo.default_layer().get_glyph("a").unwrap();
        // One column, no distances: one unit of advance.
        assert_eq!(glyph.width, 125.0);
        assert_eq!(glyph.contours.len(), 1);
        assert!(glyph.codepoints.iter().any(|c| c == 'a'));
        assert_eq!(ufo.font_info.ascender, Some(800.0));
        assert_eq!(ufo.font_info.descender, Some(-200.0));
    }

    #[test]
    fn kerning_lands_in_groups_and_scaled_pairs() {
        let mut instructions = Instructions::default();
        instructions
            .features
            .kerning_classes
            .insert("@_1R_1_1N".to_string(), "a".to_string());
        instructions
            .features
            .kerning_classes
            .insert("@_2L_1_1N".to_string(), "a".to_string());
        instructions.features.kern.push(KernPair {
            right: "@_1R_1_1N".to_string(),
            left: "@_2L_1_1N".to_string(),
            value: -2,
            extra: Vec::new(),
        });
        let mut font = Font::new(&instructions);
        font.set_glyph("a", &["#".to_string()]);
        let mut generator = UfoGenerator::new(&instructions, font);
        let ufo = generator.build().unwrap();

        let group_name: norad::Name = "@_1R_1_1N".parse().unwrap();
        assert_eq!(ufo.groups.get(&group_name).map(Vec::len), Some(1));
        let second: norad::Name = "@_2L_1_1N".parse().unwrap();
        let value = ufo.kerning.get(&group_name).and_then(|k| k.get(&second));
        assert_eq!(value, Some(&(-2.0 * 125.0)));
    }
}
