//! Master/stack tiling.
//!
//! ```text
//! 1 window     2 windows        3+ windows
//! ┌────────┐   ┌───┐ ┌────┐   ┌────┐ ┌───┐
//! │        │   │   │ │    │   │    │ │ 2 │
//! │   1    │   │ 1 │ │ 2  │   │ 1  │ ├───┤
//! │        │   │   │ │    │   │    │ │ 3 │
//! └────────┘   └───┘ └────┘   └────┘ └───┘
//! ```
//!
//! Everything here is integer arithmetic on the usable rectangle, so the same
//! inputs always give the same tiles.

use crate::geometry::Rectangle;

pub const MIN_MASTER_RATIO: f64 = 0.1;
pub const MAX_MASTER_RATIO: f64 = 0.9;

/// Screen area left for tiles once the outer gaps and the bar strip are removed.
pub fn usable_area(screen_width: i32, screen_height: i32, gap: i32, bar_height: i32) -> Rectangle {
    let gap = gap.max(0);
    let bar_height = bar_height.max(0);
    let top = gap.saturating_mul(2).saturating_add(bar_height);
    Rectangle {
        x: gap,
        y: top,
        width: screen_width.saturating_sub(gap.saturating_mul(2)).max(1),
        height: screen_height
            .saturating_sub(top)
            .saturating_sub(gap)
            .max(1),
    }
}

/// Computes one rectangle per visible client, master first.
pub fn tile(count: usize, area: Rectangle, gap: i32, master_ratio: f64) -> Vec<Rectangle> {
    match count {
        0 => Vec::new(),
        1 => vec![area],
        2 => {
            let gap = fitting_gap(area.width, 2, gap);
            let left = (area.width - gap) / 2;
            columns(area, gap, left.max(1))
        }
        _ => {
            let gap_h = fitting_gap(area.width, 2, gap);
            let available = area.width - gap_h;
            let ratio = master_ratio.clamp(MIN_MASTER_RATIO, MAX_MASTER_RATIO);
            let master_width = ((available as f64) * ratio).floor() as i32;
            let master_width = master_width.clamp(1, (available - 1).max(1));

            let mut tiles = columns(area, gap_h, master_width);
            let stack_column = tiles.pop().unwrap_or(area);
            tiles.extend(stack(stack_column, count - 1, gap));
            tiles
        }
    }
}

/// Left column of `left_width` and a right column with the remainder.
fn columns(area: Rectangle, gap: i32, left_width: i32) -> Vec<Rectangle> {
    let right_width = (area.width - gap - left_width).max(1);
    vec![
        Rectangle::new(area.x, area.y, left_width, area.height),
        Rectangle::new(area.x + left_width + gap, area.y, right_width, area.height),
    ]
}

/// Splits `column` into `count` rows of equal height, top to bottom.
fn stack(column: Rectangle, count: usize, gap: i32) -> Vec<Rectangle> {
    let rows = count as i32;
    let gap = fitting_gap(column.height, rows, gap);
    let height = ((column.height - (rows - 1) * gap) / rows).max(1);

    (0..rows)
        .map(|i| Rectangle::new(column.x, column.y + i * (height + gap), column.width, height))
        .collect()
}

/// Largest gap not above `gap` that still leaves every one of `parts` at
/// least one pixel of `extent`.
fn fitting_gap(extent: i32, parts: i32, gap: i32) -> i32 {
    let gap = gap.max(0);
    if parts <= 1 {
        return gap;
    }
    let spare = (extent - parts).max(0);
    gap.min(spare / (parts - 1))
}
