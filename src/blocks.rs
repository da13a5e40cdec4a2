//! Block index registry (C3): maps the flat `BlockIndex` space used
//! throughout the placer to I/O vs. movable-type ranges.

use std::ops::Range;

use crate::device::Category;
use crate::error::ConfigurationError;

pub type BlockIndex = usize;

/// Stable partition of `0..num_blocks` into a leading I/O range followed by
/// one contiguous range per movable block type.
///
/// `type_start` has length `num_types + 1`: `type_start[0] == num_io` (the
/// first movable type begins right after the I/O blocks) and
/// `type_start[num_types] == num_blocks`. This resolves the boundary
/// ambiguity between the data model's `typeStart[0] = 0` description and the
/// active-range formula that uses `typeStart` entries directly as global
/// offsets — see DESIGN.md for the reasoning.
pub struct BlockRegistry {
    num_io: usize,
    type_start: Vec<usize>,
    type_category: Vec<Category>,
}

impl BlockRegistry {
    pub fn new(
        num_io: usize,
        type_start: Vec<usize>,
        type_category: Vec<Category>,
    ) -> Result<Self, ConfigurationError> {
        if type_category.is_empty() {
            return Err(ConfigurationError::NoMovableTypes);
        }
        if type_start.len() != type_category.len() + 1 {
            return Err(ConfigurationError::TypeStartNotMonotonic);
        }
        if type_start[0] != num_io {
            return Err(ConfigurationError::TypeStartNotAtIo {
                num_io,
                found: type_start[0],
            });
        }
        for w in type_start.windows(2) {
            if w[0] > w[1] {
                return Err(ConfigurationError::TypeStartNotMonotonic);
            }
        }
        Ok(Self {
            num_io,
            type_start,
            type_category,
        })
    }

    pub fn num_io(&self) -> usize {
        self.num_io
    }

    pub fn num_blocks(&self) -> usize {
        *self.type_start.last().unwrap()
    }

    pub fn num_types(&self) -> usize {
        self.type_category.len()
    }

    pub fn range_for_type(&self, t: usize) -> Range<usize> {
        self.type_start[t]..self.type_start[t + 1]
    }

    pub fn category_for_type(&self, t: usize) -> Category {
        self.type_category[t]
    }

    /// Every movable type's category, in type order.
    pub fn categories(&self) -> &[Category] {
        &self.type_category
    }

    /// The movable-type index of block `i`, or `None` if `i` is an I/O
    /// block.
    pub fn type_of(&self, i: BlockIndex) -> Option<usize> {
        if i < self.num_io {
            return None;
        }
        match self.type_start.binary_search(&i) {
            Ok(t) => Some(t.min(self.num_types() - 1)),
            Err(t) => Some(t - 1),
        }
    }

    pub fn category(&self, i: BlockIndex) -> Category {
        match self.type_of(i) {
            None => Category::Io,
            Some(t) => self.type_category[t],
        }
    }

    /// The set of indices solved as unknowns by `solve_mode` (`0` = all
    /// movable blocks; `1..=num_types` = the single type `solve_mode - 1`).
    pub fn active_range(&self, solve_mode: usize) -> Range<usize> {
        if solve_mode == 0 {
            self.num_io..self.num_blocks()
        } else {
            self.range_for_type(solve_mode - 1)
        }
    }

    /// Whether block `i`'s position is held fixed (taken from the device or
    /// `bestLegal*`) for the purposes of a solve at `solve_mode`.
    pub fn is_fixed_pin(&self, i: BlockIndex, solve_mode: usize) -> bool {
        if i < self.num_io {
            return true;
        }
        if solve_mode == 0 {
            return false;
        }
        self.type_of(i).map(|t| t + 1 != solve_mode).unwrap_or(true)
    }
}
