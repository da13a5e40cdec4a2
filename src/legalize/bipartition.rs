//! Recursive bipartition (C6, spec.md §4.4): splits an area's rectangle and
//! block list in half, alternating axis, until each sub-rectangle is too
//! small to hold more than a handful of sites, then assigns sites directly.

use faer::Col;

use crate::E;
use crate::blocks::BlockIndex;
use crate::device::{Category, Device};
use crate::error::PlacementIntegrityError;
use crate::legalize::area::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn flip(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn legalize_area(
    rect: Rect,
    mut blocks: Vec<BlockIndex>,
    axis: Axis,
    category: Category,
    device: &dyn Device,
    repeat: i32,
    block_height: i32,
    linear_x: &Col<E>,
    linear_y: &Col<E>,
    tmp_legal_x: &mut [i32],
    tmp_legal_y: &mut [i32],
) -> Result<(), PlacementIntegrityError> {
    if blocks.is_empty() {
        return Ok(());
    }

    if blocks.len() == 1 {
        let b = blocks[0];
        let (x, y) = best_site_in_rect(rect, category, device, repeat, block_height, linear_x[b], linear_y[b])
            .ok_or(PlacementIntegrityError::NoLegalSite { block: b, type_name: category.to_string() })?;
        tmp_legal_x[b] = x;
        tmp_legal_y[b] = y;
        return Ok(());
    }

    if rect.width() < repeat && rect.height() < block_height {
        // Too small to subdivide further; drop every remaining block onto
        // the single best site in the rectangle.
        let (x, y) = (rect.left, rect.top);
        for b in blocks {
            tmp_legal_x[b] = x;
            tmp_legal_y[b] = y;
        }
        return Ok(());
    }

    let axis = if axis == Axis::X && rect.width() < repeat {
        Axis::Y
    } else if axis == Axis::Y && rect.height() < block_height {
        Axis::X
    } else {
        axis
    };

    match axis {
        Axis::X => blocks.sort_by(|&a, &b| linear_x[a].partial_cmp(&linear_x[b]).unwrap()),
        Axis::Y => blocks.sort_by(|&a, &b| linear_y[a].partial_cmp(&linear_y[b]).unwrap()),
    }

    let (split_coord, split_ratio) = compute_split(rect, axis, category, device, repeat, block_height);
    let split = ((split_ratio * blocks.len() as f64).ceil() as usize)
        .clamp(1, blocks.len().saturating_sub(1).max(1));
    let (left_blocks, right_blocks) = blocks.split_at(split.min(blocks.len()));

    let (rect_a, rect_b) = split_rect(rect, axis, split_coord);

    legalize_area(
        rect_a,
        left_blocks.to_vec(),
        axis.flip(),
        category,
        device,
        repeat,
        block_height,
        linear_x,
        linear_y,
        tmp_legal_x,
        tmp_legal_y,
    )?;
    legalize_area(
        rect_b,
        right_blocks.to_vec(),
        axis.flip(),
        category,
        device,
        repeat,
        block_height,
        linear_x,
        linear_y,
        tmp_legal_x,
        tmp_legal_y,
    )
}

/// Picks the split column/row and the corresponding fraction of sites (and
/// thus blocks) assigned to the lower/left half, per the per-category,
/// per-axis rule of spec.md §4.4 step 2.
fn compute_split(
    rect: Rect,
    axis: Axis,
    category: Category,
    device: &dyn Device,
    repeat: i32,
    block_height: i32,
) -> (i32, f64) {
    match axis {
        Axis::X => match category {
            Category::Clb => {
                let cols: Vec<i32> = (rect.left..=rect.right)
                    .filter(|&x| device.column_type(x) == Category::Clb)
                    .collect();
                if cols.is_empty() {
                    return (rect.left + rect.width() / 2, 0.5);
                }
                let half = ((cols.len() as f64) / 2.0).ceil() as usize;
                let half = half.clamp(1, cols.len());
                (cols[half - 1], half as f64 / cols.len() as f64)
            }
            _ => {
                let num_cols = (rect.width() / repeat.max(1)).max(1);
                let half_cols = (num_cols / 2).max(1);
                (rect.left + half_cols * repeat.max(1), half_cols as f64 / num_cols as f64)
            }
        },
        Axis::Y => {
            if repeat == 1 {
                let num_rows = rect.height().max(1);
                (rect.top + num_rows / 2, 0.5)
            } else {
                let num_rows = (rect.height() / block_height.max(1)).max(1);
                let half_rows = (num_rows / 2).max(1);
                (
                    rect.top + half_rows * block_height.max(1),
                    half_rows as f64 / num_rows as f64,
                )
            }
        }
    }
}

fn split_rect(rect: Rect, axis: Axis, split_coord: i32) -> (Rect, Rect) {
    match axis {
        Axis::X => {
            let split_coord = split_coord.clamp(rect.left, rect.right - 1);
            (
                Rect { right: split_coord, ..rect },
                Rect { left: split_coord + 1, ..rect },
            )
        }
        Axis::Y => {
            let split_coord = split_coord.clamp(rect.top, rect.bottom - 1);
            (
                Rect { bottom: split_coord, ..rect },
                Rect { top: split_coord + 1, ..rect },
            )
        }
    }
}

/// The single legal site in `rect` minimizing squared Euclidean distance to
/// `(x, y)`, restricted to columns matching `category`. `None` if `rect`
/// contains no column of that category.
fn best_site_in_rect(
    rect: Rect,
    category: Category,
    device: &dyn Device,
    repeat: i32,
    block_height: i32,
    x: E,
    y: E,
) -> Option<(i32, i32)> {
    let repeat = repeat.max(1);
    let block_height = block_height.max(1);
    let mut best = None;
    let mut best_d = E::INFINITY;
    let mut cx = rect.left;
    while cx <= rect.right {
        let mut cy = rect.top;
        while cy <= rect.bottom {
            if device.site(cx, cy).is_some_and(|s| s.category == category) {
                let dx = x - cx as E;
                let dy = y - cy as E;
                let d = dx * dx + dy * dy;
                if d < best_d {
                    best_d = d;
                    best = Some((cx, cy));
                }
            }
            cy += block_height;
        }
        cx += repeat;
    }
    best
}
