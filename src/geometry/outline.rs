//! Outline construction: grid cells to bezier contours.
//!
//! Every filled cell contributes one closed contour, a square with its
//! corners optionally replaced by quarter-circle cubics. Empty cells can
//! contribute small rounded patches where three filled neighbors meet
//! around one of their corners. Overlap removal between the per-cell
//! contours is downstream tooling's job.

use kurbo::{BezPath, Point};
use tracing::warn;

use crate::core::config::GeneratorConfig;
use crate::font::GlyphGrid;
use crate::geometry::corners::{inner_corners, outer_corners, Corners, KAPPA};

/// Resolved drawing geometry, shared by every cell of a glyph.
#[derive(Debug, Clone)]
pub struct DrawOptions {
    /// One grid cell in design units.
    pub unit: f64,
    /// Inset of filled shapes from the cell origin.
    pub offset: f64,
    /// Inset of outside patches; sign flips under `invertOutside`.
    pub outer_offset: f64,
    /// Grid rows below the baseline.
    pub descent: f64,
    pub inner_width: f64,
    pub outer_width: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Control-point distance for inner corners, `inner_radius * KAPPA`.
    pub inner_handle: f64,
    pub outer_handle: f64,
    pub contextual_shape: bool,
}

impl DrawOptions {
    pub fn from_config(generator: &GeneratorConfig, descent: i32) -> Self {
        let inner_width = generator.width;
        let outer_width = if generator.invert_outside {
            2.0 * generator.unit - inner_width
        } else {
            inner_width
        };
        let outer_offset = if generator.invert_outside {
            -generator.offset
        } else {
            generator.offset
        };
        let inner_radius = resolve_radius(
            generator.inside_corner_radius,
            inner_width,
            "insideCornerRadius",
        );
        let outer_radius = resolve_radius(
            generator.outside_corner_radius,
            outer_width,
            "outsideCornerRadius",
        );
        DrawOptions {
            unit: generator.unit,
            offset: generator.offset,
            outer_offset,
            descent: descent as f64,
            inner_width,
            outer_width,
            inner_radius,
            outer_radius,
            inner_handle: inner_radius * KAPPA,
            outer_handle: outer_radius * KAPPA,
            contextual_shape: generator.contextual_shape,
        }
    }
}

/// Turn a configured corner-radius value into design units.
///
/// Values below 1 are a fraction of the shape width, anything else is
/// absolute. The result never exceeds half the width, since two radii
/// meet in the middle of an edge.
fn resolve_radius(configured: f64, width: f64, label: &str) -> f64 {
    let radius = if configured < 1.0 {
        width * configured
    } else {
        configured
    };
    let max = width * 0.5;
    if radius > max {
        warn!("{label} {radius} was too big, clamping it to half the shape width: {max}");
        return max;
    }
    radius
}

/// Trace every cell of a glyph into contours.
///
/// The top row of the stored grid maps to the highest design-space Y.
/// Filled cells are shifted right by the glyph's left distance, so the
/// side bearing from the distance table is baked into the outline.
pub fn trace_glyph(grid: &GlyphGrid, left_distance: i32, options: &DrawOptions) -> Vec<BezPath> {
    let mut contours = Vec::new();
    let height = grid.line_count() as isize;
    for y in 0..height {
        // Design-space row: zero is the bottom of the grid.
        let ps_y = (height - 1 - y) as f64;
        for x in 0..grid.width() as isize {
            let pos_x = x as f64 + left_distance as f64;
            if grid.filled_at(x, y) {
                let corners = if options.contextual_shape {
                    inner_corners(grid, x, y)
                } else {
                    Corners::ALL
                };
                contours.push(draw_filled(pos_x, ps_y, corners, options));
            } else if options.contextual_shape {
                let corners = outer_corners(grid, x, y);
                if corners.any() {
                    contours.extend(draw_empty(pos_x, ps_y, corners, options));
                }
            }
        }
    }
    contours
}

/// One closed contour for a filled cell, clockwise from the south-west
/// corner. Rounded corners are entered with a line along the edge and
/// left through a single cubic.
pub fn draw_filled(pos_x: f64, ps_y: f64, corners: Corners, options: &DrawOptions) -> BezPath {
    let w = options.inner_width;
    let r = options.inner_radius;
    let l = options.inner_handle;
    let corners = if r < 1.0 { Corners::NONE } else { corners };

    let x = pos_x * options.unit + options.offset;
    let y = ps_y * options.unit + options.offset - options.descent * options.unit;

    // Where each rounded corner starts, and its cubic to the far edge.
    let smooth_start = [
        Point::new(x + r, y),
        Point::new(x, y + w - r),
        Point::new(x + w - r, y + w),
        Point::new(x + w, y + r),
    ];
    let smooth_curve = [
        (
            Point::new(x + r - l, y),
            Point::new(x, y + r - l),
            Point::new(x, y + r),
        ),
        (
            Point::new(x, y + w - r + l),
            Point::new(x + r - l, y + w),
            Point::new(x + r, y + w),
        ),
        (
            Point::new(x + w - r + l, y + w),
            Point::new(x + w, y + w - r + l),
            Point::new(x + w, y + w - r),
        ),
        (
            Point::new(x + w, y + r - l),
            Point::new(x + w - r + l, y),
            Point::new(x + w - r, y),
        ),
    ];
    let angled = [
        Point::new(x, y),
        Point::new(x, y + w),
        Point::new(x + w, y + w),
        Point::new(x + w, y),
    ];

    let mut path = BezPath::new();
    let mut last: Option<Point> = None;
    for (i, rounded) in corners.clockwise().into_iter().enumerate() {
        if rounded {
            let start = smooth_start[i];
            if i == 0 {
                path.move_to(start);
            } else if last != Some(start) {
                path.line_to(start);
            }
            let (c1, c2, end) = smooth_curve[i];
            path.curve_to(c1, c2, end);
            last = Some(end);
        } else {
            let corner = angled[i];
            if i == 0 {
                path.move_to(corner);
            } else {
                path.line_to(corner);
            }
            last = Some(corner);
        }
    }
    path.close_path();
    path
}

/// Rounded outside patches for an empty cell, one small closed contour
/// per rounded corner. Cells with no rounded corner contribute nothing.
pub fn draw_empty(
    pos_x: f64,
    ps_y: f64,
    corners: Corners,
    options: &DrawOptions,
) -> Vec<BezPath> {
    let w = options.outer_width;
    let r = options.outer_radius;
    let l = options.outer_handle;
    if r < 1.0 {
        return Vec::new();
    }

    let x = pos_x * options.unit + options.outer_offset;
    let y = ps_y * options.unit + options.outer_offset - options.descent * options.unit;

    // Per corner: the corner point, a point along one edge, and the
    // cubic back to the other edge.
    let patches = [
        (
            Point::new(x, y),
            Point::new(x, y + r),
            (
                Point::new(x, y + r - l),
                Point::new(x + r - l, y),
                Point::new(x + r, y),
            ),
        ),
        (
            Point::new(x, y + w),
            Point::new(x + r, y + w),
            (
                Point::new(x + r - l, y + w),
                Point::new(x, y + w - r + l),
                Point::new(x, y + w - r),
            ),
        ),
        (
            Point::new(x + w, y + w),
            Point::new(x + w, y + w - r),
            (
                Point::new(x + w, y + w - r + l),
                Point::new(x + w - r + l, y + w),
                Point::new(x + w - r, y + w),
            ),
        ),
        (
            Point::new(x + w, y),
            Point::new(x + w - r, y),
            (
                Point::new(x + w - r + l, y),
                Point::new(x + w, y + r - l),
                Point::new(x + w, y + r),
            ),
        ),
    ];

    let mut contours = Vec::new();
    for (i, rounded) in corners.clockwise().into_iter().enumerate() {
        if !rounded {
            continue;
        }
        let (corner, along, (c1, c2, end)) = patches[i];
        let mut path = BezPath::new();
        path.move_to(corner);
        path.line_to(along);
        path.curve_to(c1, c2, end);
        path.close_path();
        contours.push(path);
    }
    contours
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn grid(rows: &[&str]) -> GlyphGrid {
        let lines: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        GlyphGrid::normalize(&lines, rows.len(), '#')
    }

    fn options(generator: &GeneratorConfig) -> DrawOptions {
        DrawOptions::from_config(generator, 0)
    }

    fn curve_count(path: &BezPath) -> usize {
        path.elements()
            .iter()
            .filter(|el| matches!(el, PathEl::CurveTo(..)))
            .count()
    }

    #[test]
    fn fractional_radius_is_a_share_of_the_width() {
        let generator = GeneratorConfig {
            width: 100.0,
            inside_corner_radius: 0.25,
            ..GeneratorConfig::default()
        };
        assert_eq!(options(&generator).inner_radius, 25.0);
    }

    #[test]
    fn oversized_radius_clamps_to_half_the_width() {
        let generator = GeneratorConfig {
            width: 100.0,
            inside_corner_radius: 80.0,
            outside_corner_radius: 0.9,
            ..GeneratorConfig::default()
        };
        let options = options(&generator);
        assert_eq!(options.inner_radius, 50.0);
        assert_eq!(options.outer_radius, 50.0);
    }

    #[test]
    fn invert_outside_flips_offset_and_widens_the_patch() {
        let generator = GeneratorConfig {
            unit: 125.0,
            width: 115.0,
            offset: 5.0,
            invert_outside: true,
            ..GeneratorConfig::default()
        };
        let options = options(&generator);
        assert_eq!(options.outer_width, 2.0 * 125.0 - 115.0);
        assert_eq!(options.outer_offset, -5.0);
        assert_eq!(options.offset, 5.0);
    }

    #[test]
    fn tiny_radius_draws_a_plain_square() {
        let generator = GeneratorConfig {
            inside_corner_radius: 0.0,
            ..GeneratorConfig::default()
        };
        let path = draw_filled(0.0, 0.0, Corners::ALL, &options(&generator));
        assert_eq!(curve_count(&path), 0);
        // MoveTo, three LineTos, ClosePath.
        assert_eq!(path.elements().len(), 5);
    }

    #[test]
    fn all_rounded_square_has_four_curves() {
        let generator = GeneratorConfig {
            inside_corner_radius: 20.0,
            ..GeneratorConfig::default()
        };
        let path = draw_filled(0.0, 0.0, Corners::ALL, &options(&generator));
        assert_eq!(curve_count(&path), 4);
        assert!(matches!(path.elements().last(), Some(PathEl::ClosePath)));
    }

    #[test]
    fn empty_cell_emits_one_patch_per_rounded_corner() {
        let generator = GeneratorConfig {
            outside_corner_radius: 20.0,
            ..GeneratorConfig::default()
        };
        let corners = Corners {
            sw: true,
            nw: false,
            ne: true,
            se: false,
        };
        let patches = draw_empty(0.0, 0.0, corners, &options(&generator));
        assert_eq!(patches.len(), 2);
        for patch in &patches {
            assert_eq!(curve_count(patch), 1);
        }
        // Zero radius disables the patches entirely.
        let generator = GeneratorConfig::default();
        assert!(draw_empty(0.0, 0.0, corners, &options(&generator)).is_empty());
    }

    #[test]
    fn lone_center_pixel_traces_one_rounded_contour() {
        let generator = GeneratorConfig {
            contextual_shape: true,
            inside_corner_radius: 20.0,
            outside_corner_radius: 20.0,
            ..GeneratorConfig::default()
        };
        let contours = trace_glyph(&grid(&["...", ".#.", "..."]), 0, &options(&generator));
        // The filled cell's 4-neighborhood is empty (code 0), so all
        // four corners round; none of the empty neighbors has a filled
        // quadrant, so no outside patches appear.
        assert_eq!(contours.len(), 1);
        assert_eq!(curve_count(&contours[0]), 4);
    }

    #[test]
    fn left_distance_shifts_the_outline() {
        let generator = GeneratorConfig::default();
        let opts = options(&generator);
        let at_origin = trace_glyph(&grid(&["#"]), 0, &opts);
        let shifted = trace_glyph(&grid(&["#"]), 2, &opts);
        let expect_shift = 2.0 * opts.unit;
        match (&at_origin[0].elements()[0], &shifted[0].elements()[0]) {
            (PathEl::MoveTo(a), PathEl::MoveTo(b)) => {
                assert_eq!(b.x - a.x, expect_shift);
                assert_eq!(b.y, a.y);
            }
            other => panic!("unexpected path starts: {other:?}"),
        }
    }

    #[test]
    fn top_row_lands_at_the_highest_y() {
        let generator = GeneratorConfig::default();
        let opts = options(&generator);
        // Two stacked pixels: the first traced contour comes from the
        // stored top row and must sit one unit above the second.
        let contours = trace_glyph(&grid(&["#", "#"]), 0, &opts);
        assert_eq!(contours.len(), 2);
        match (&contours[0].elements()[0], &contours[1].elements()[0]) {
            (PathEl::MoveTo(top), PathEl::MoveTo(bottom)) => {
                assert_eq!(top.y - bottom.y, opts.unit);
            }
            other => panic!("unexpected path starts: {other:?}"),
        }
    }
}
