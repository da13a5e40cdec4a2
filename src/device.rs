//! Device model adapter (C2): the inbound interface the placer uses to query
//! the target fabric's site grid, without owning architecture parsing.

use derive_more::Display;

/// A block's functional class. A tagged variant with three arms, per the
/// design note that rejects an inheritance-style type hierarchy for this.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    #[display("io")]
    Io,
    #[display("clb")]
    Clb,
    #[display("hard[{_0}]")]
    Hard(usize),
}

/// Static description of one block type's site lattice: `x = start + k *
/// repeat`, `y = 1 + r * height`, for non-negative integers `k`, `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTypeInfo {
    pub category: Category,
    pub start: i32,
    pub repeat: i32,
    pub height: i32,
}

/// A single site on the device grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub x: i32,
    pub y: i32,
    pub category: Category,
}

/// The fabric the placer targets. Implementations own the actual
/// architecture description; this trait exposes only what C2–C7 need to
/// query it.
pub trait Device {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    /// The block category legal at column `x` (I/O columns are the grid
    /// border, at `x == 0` or `x == width() - 1`, and are queried through
    /// `column_type` the same as any other column for uniformity).
    fn column_type(&self, x: i32) -> Category;

    /// Enumerates every registered block type's site lattice.
    fn block_types(&self) -> &[BlockTypeInfo];

    /// The fixed integer position of an I/O block, if this device assigns
    /// one. Movable blocks never go through this path.
    fn fixed_position(&self, block: usize) -> Option<(i32, i32)>;

    /// The site at `(x, y)`, or `None` if out of bounds. The default
    /// derives it from `column_type`, which is enough for a uniform-column
    /// grid; a device whose site category varies by row as well as column
    /// should override this.
    fn site(&self, x: i32, y: i32) -> Option<Site> {
        if x < 0 || x >= self.width() || y < 0 || y >= self.height() {
            return None;
        }
        Some(Site {
            x,
            y,
            category: self.column_type(x),
        })
    }

    /// Commits a block's legal position to the device's own site-occupancy
    /// bookkeeping. Called by the placer on the final commit and, when the
    /// cost calculator requires it, after every legalization pass. Fails
    /// with `SiteOccupiedOnCommit` if `(x, y)` is already committed to a
    /// different block; committing the same block to the same site twice
    /// (spec.md's commit-idempotence property) succeeds both times.
    fn set_position(&mut self, block: usize, x: i32, y: i32) -> Result<(), crate::error::PlacementIntegrityError>;
}

pub fn lattice_for(device: &dyn Device, category: Category) -> Option<BlockTypeInfo> {
    device
        .block_types()
        .iter()
        .find(|info| info.category == category)
        .copied()
}

/// Confirms `device` registers a site lattice for every category `categories`
/// names, before the placer seeds any state against it.
pub fn require_block_types(device: &dyn Device, categories: &[Category]) -> Result<(), crate::error::ConfigurationError> {
    for &category in categories {
        if lattice_for(device, category).is_none() {
            return Err(crate::error::ConfigurationError::MissingBlockType { category: category.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;

    struct StubDevice(Vec<BlockTypeInfo>);
    impl Device for StubDevice {
        fn width(&self) -> i32 {
            10
        }
        fn height(&self) -> i32 {
            10
        }
        fn column_type(&self, _x: i32) -> Category {
            Category::Clb
        }
        fn block_types(&self) -> &[BlockTypeInfo] {
            &self.0
        }
        fn fixed_position(&self, _block: usize) -> Option<(i32, i32)> {
            None
        }
        fn set_position(&mut self, _block: usize, _x: i32, _y: i32) -> Result<(), crate::error::PlacementIntegrityError> {
            Ok(())
        }
    }

    #[test]
    fn require_block_types_accepts_a_fully_covered_registry() {
        let device = StubDevice(vec![
            BlockTypeInfo { category: Category::Clb, start: 1, repeat: 1, height: 1 },
            BlockTypeInfo { category: Category::Hard(0), start: 2, repeat: 4, height: 2 },
        ]);
        assert!(require_block_types(&device, &[Category::Clb, Category::Hard(0)]).is_ok());
    }

    #[test]
    fn require_block_types_rejects_a_missing_category() {
        let device = StubDevice(vec![BlockTypeInfo { category: Category::Clb, start: 1, repeat: 1, height: 1 }]);
        let err = require_block_types(&device, &[Category::Clb, Category::Hard(0)]).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingBlockType { category: Category::Hard(0).to_string() });
    }
}
