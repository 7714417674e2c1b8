//! Per-cell corner decisions from the cell's neighborhood.
//!
//! Each grid cell has four corners, named by compass direction and
//! processed clockwise starting at the south west. A corner is either
//! angled (a sharp 90 degree turn) or rounded (a quarter-circle bezier);
//! which one depends on the neighboring cells.

use crate::font::GlyphGrid;

/// Quarter-circle cubic bezier constant, 4*(sqrt(2)-1)/3. Multiplied by
/// the radius it gives the distance between an on-curve point and its
/// neighboring control point.
pub const KAPPA: f64 = 0.552_284_749_830_793_4;

/// Rounded-or-angled flags for a cell's four corners, clockwise from the
/// south west.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corners {
    pub sw: bool,
    pub nw: bool,
    pub ne: bool,
    pub se: bool,
}

impl Corners {
    pub const ALL: Corners = Corners {
        sw: true,
        nw: true,
        ne: true,
        se: true,
    };
    pub const NONE: Corners = Corners {
        sw: false,
        nw: false,
        ne: false,
        se: false,
    };

    pub fn any(self) -> bool {
        self.sw || self.nw || self.ne || self.se
    }

    /// The flags in drawing order: SW, NW, NE, SE.
    pub fn clockwise(self) -> [bool; 4] {
        [self.sw, self.nw, self.ne, self.se]
    }
}

/// Corner decisions for a filled cell, from its 4-connected neighborhood.
///
/// The four neighbors (top, right, bottom, left) encode into a 4-bit
/// value, top as the most significant bit:
///
/// ```text
///     .                            .                            .
///    .P.  (0,0,0,0) = 0x0         #P.  (0,0,0,1) = 0x1         .P.  (0,0,1,0) = 0x2
///     .                            .                            #
///
///     #                            #
///    .P#  (1,1,0,0) = 0xC   ...   #P#  (1,1,1,1) = 0xF
///     .                            #
/// ```
///
/// A corner is rounded exactly when neither of its two adjacent sides is
/// filled, so the corner faces open space on both adjoining edges.
pub fn inner_corners(grid: &GlyphGrid, x: isize, y: isize) -> Corners {
    let top = grid.filled_at(x, y - 1);
    let right = grid.filled_at(x + 1, y);
    let bottom = grid.filled_at(x, y + 1);
    let left = grid.filled_at(x - 1, y);
    let code = (top as u8) << 3 | (right as u8) << 2 | (bottom as u8) << 1 | (left as u8);
    Corners {
        sw: matches!(code, 0x0 | 0x4 | 0x8 | 0xC),
        nw: matches!(code, 0x0 | 0x2 | 0x4 | 0x6),
        ne: matches!(code, 0x0 | 0x1 | 0x2 | 0x3),
        se: matches!(code, 0x0 | 0x1 | 0x8 | 0x9),
    }
}

/// Corner decisions for an empty cell, from its 8-connected neighborhood.
///
/// A corner is rounded only if all three neighbor cells inside that
/// corner's quadrant are filled; the rounded patch then smooths the
/// concave corner the three filled cells form around this one.
pub fn outer_corners(grid: &GlyphGrid, x: isize, y: isize) -> Corners {
    let n = grid.filled_at(x, y - 1);
    let ne = grid.filled_at(x + 1, y - 1);
    let e = grid.filled_at(x + 1, y);
    let se = grid.filled_at(x + 1, y + 1);
    let s = grid.filled_at(x, y + 1);
    let sw = grid.filled_at(x - 1, y + 1);
    let w = grid.filled_at(x - 1, y);
    let nw = grid.filled_at(x - 1, y - 1);
    Corners {
        sw: s && sw && w,
        nw: w && nw && n,
        ne: n && ne && e,
        se: e && se && s,
    }
}
