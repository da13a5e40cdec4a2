//! Block-matrix bucketing: classifies every block of a movable type into
//! the grid cell nearest its current real position, using a category-
//! specific closest-site policy, per spec.md §4.3.

use faer::Col;

use crate::E;
use crate::blocks::BlockIndex;
use crate::device::{BlockTypeInfo, Category, Device, lattice_for};
use crate::error::PlacementIntegrityError;

/// `width * height` bucket of blocks per grid cell.
pub struct BlockBucket {
    cells: Vec<Vec<BlockIndex>>,
    width: i32,
}

impl BlockBucket {
    pub fn build(
        device: &dyn Device,
        category: Category,
        linear_x: &Col<E>,
        linear_y: &Col<E>,
        blocks: impl Iterator<Item = BlockIndex>,
    ) -> Result<Self, PlacementIntegrityError> {
        let width = device.width();
        let height = device.height();
        let mut cells = vec![Vec::new(); (width * height).max(0) as usize];
        let lattice = lattice_for(device, category);
        for b in blocks {
            let (x, y) = closest_site(device, category, lattice, linear_x[b], linear_y[b])
                .ok_or(PlacementIntegrityError::NoLegalSite { block: b, type_name: category.to_string() })?;
            cells[(y * width + x) as usize].push(b);
        }
        Ok(Self { cells, width })
    }

    pub fn at(&self, x: i32, y: i32) -> &[BlockIndex] {
        &self.cells[(y * self.width + x) as usize]
    }
}

/// Rounds a block's real position to the nearest legal site of `category`,
/// using the policy appropriate to that category. `None` only if `category`
/// is `Clb` and the device has no CLB column at all.
pub fn closest_site(
    device: &dyn Device,
    category: Category,
    lattice: Option<BlockTypeInfo>,
    x: E,
    y: E,
) -> Option<(i32, i32)> {
    match category {
        Category::Clb => closest_clb_site(device, x, y),
        Category::Hard(_) => Some(closest_hard_site(device, lattice, x, y)),
        Category::Io => Some(closest_io_site(device, x, y)),
    }
}

/// CLB policy: round to the nearest integer column, then search outward
/// (0, +1, -1, +2, -2, ...) for the nearest column whose type matches,
/// clamping the row into the interior (excluding the I/O border rows).
/// `None` if the outward search exhausts the whole device width without
/// finding a CLB column.
fn closest_clb_site(device: &dyn Device, x: E, y: E) -> Option<(i32, i32)> {
    let width = device.width();
    let height = device.height();
    let rounded_x = x.round() as i32;
    let mut found_x = None;
    for step in 0..width {
        for &candidate in &[rounded_x + step, rounded_x - step] {
            if candidate < 1 || candidate > width - 2 {
                continue;
            }
            if device.column_type(candidate) == Category::Clb {
                found_x = Some(candidate);
                break;
            }
        }
        if found_x.is_some() {
            break;
        }
    }
    let found_x = found_x?;
    let found_y = y.round() as i32;
    Some((found_x, found_y.clamp(1, height - 2)))
}

/// Hard-block policy: round onto the `(start, repeat, height)` lattice
/// directly.
fn closest_hard_site(device: &dyn Device, lattice: Option<BlockTypeInfo>, x: E, y: E) -> (i32, i32) {
    let info = match lattice {
        Some(info) => info,
        None => return (x.round() as i32, y.round() as i32),
    };
    let width = device.width();
    let height = device.height();
    let repeat = info.repeat.max(1);
    let block_height = info.height.max(1);

    let steps_x = ((x - info.start as E) / repeat as E).round();
    let site_x = (info.start as E + steps_x * repeat as E) as i32;

    let steps_y = ((y - 1.0) / block_height as E).round();
    let site_y = (1.0 + steps_y * block_height as E) as i32;

    (site_x.clamp(0, width - 1), site_y.clamp(1, height - 2))
}

/// I/O policy: pick the nearest perimeter quadrant, with midpoint ties
/// favoring right/top (i.e. the quadrant boundary at `dx == dy` and
/// `dx == -dy` resolves toward the right- or top-facing edge).
fn closest_io_site(device: &dyn Device, x: E, y: E) -> (i32, i32) {
    let width = device.width();
    let height = device.height();
    let cx = width as E / 2.0;
    let cy = height as E / 2.0;
    let dx = x - cx;
    let dy = y - cy;

    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            (width - 1, y.round().clamp(1.0, (height - 2) as E) as i32)
        } else {
            (0, y.round().clamp(1.0, (height - 2) as E) as i32)
        }
    } else if dy >= 0.0 {
        (x.round().clamp(1.0, (width - 2) as E) as i32, height - 1)
    } else {
        (x.round().clamp(1.0, (width - 2) as E) as i32, 0)
    }
}
