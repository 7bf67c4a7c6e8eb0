// src/graph/scope.rs
use serde::{Deserialize, Serialize};

/// Smallest extent accepted for scope sizes and grid cells.
pub const MIN_EXTENT: f32 = 0.01;

/// User-facing scope parameters. The visible rectangle is derived from these.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeParams {
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
    /// Anchor the value axis at `offset_y` instead of centering on it.
    pub unsigned: bool,
    /// Track the newest timestamp with the right edge of the window.
    pub follow_latest: bool,
}

impl Default for ScopeParams {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            width: 5.0,
            height: 200.0,
            unsigned: false,
            follow_latest: true,
        }
    }
}

impl ScopeParams {
    pub fn clamped(self) -> Self {
        Self {
            width: clamp_extent(self.width),
            height: clamp_extent(self.height),
            ..self
        }
    }

    pub fn rect(&self) -> ScopeRect {
        let width = clamp_extent(self.width);
        let height = clamp_extent(self.height);
        let y_min = if self.unsigned {
            self.offset_y
        } else {
            self.offset_y - height / 2.0
        };
        ScopeRect {
            x_min: self.offset_x - width,
            x_max: self.offset_x,
            y_min,
            y_max: y_min + height,
        }
    }
}

/// Visible window in (time, value) space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScopeRect {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl ScopeRect {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub cell_width: f32,
    pub cell_height: f32,
    pub subdivision_x: u32,
    pub subdivision_y: u32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            cell_width: 1.0,
            cell_height: 10.0,
            subdivision_x: 10,
            subdivision_y: 10,
        }
    }
}

impl GridParams {
    pub fn clamped(self) -> Self {
        Self {
            cell_width: clamp_extent(self.cell_width),
            cell_height: clamp_extent(self.cell_height),
            subdivision_x: self.subdivision_x.max(1),
            subdivision_y: self.subdivision_y.max(1),
        }
    }

    /// Vertical grid lines crossing `[rect.x_min, rect.x_max]`.
    pub fn lines_x(&self, rect: &ScopeRect) -> Vec<GridLine> {
        let grid = self.clamped();
        grid_lines(rect.x_min, rect.x_max, grid.cell_width, grid.subdivision_x)
    }

    /// Horizontal grid lines crossing `[rect.y_min, rect.y_max]`.
    pub fn lines_y(&self, rect: &ScopeRect) -> Vec<GridLine> {
        let grid = self.clamped();
        grid_lines(rect.y_min, rect.y_max, grid.cell_height, grid.subdivision_y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLine {
    pub position: f32,
    /// Every `subdivision`-th line counted from zero.
    pub major: bool,
}

// Lines sit on multiples of `cell`, so they stay put while the window scrolls.
fn grid_lines(min: f32, max: f32, cell: f32, subdivision: u32) -> Vec<GridLine> {
    // Keeps a tiny cell on a huge window from producing millions of lines.
    const MAX_LINES: i64 = 512;
    let first = (min / cell).ceil() as i64;
    let last = (max / cell).floor() as i64;
    if last < first {
        return Vec::new();
    }
    let last = last.min(first + MAX_LINES - 1);
    let subdivision = i64::from(subdivision.max(1));
    (first..=last)
        .map(|n| GridLine {
            position: n as f32 * cell,
            major: n.rem_euclid(subdivision) == 0,
        })
        .collect()
}

fn clamp_extent(value: f32) -> f32 {
    // NaN falls through `max` to the minimum as well.
    value.max(MIN_EXTENT)
}
