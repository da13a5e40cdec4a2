//! Legalizer (C6): I/O perimeter distribution, block-matrix bucketing, area
//! seeding/growth/absorption, and recursive bipartition, driving
//! `tmpLegal*`/`bestLegal*` per spec.md §4.3–4.4.

mod area;
mod bipartition;
mod bucket;

use faer::Col;

use crate::E;
use crate::blocks::BlockRegistry;
use crate::cost::CostCalculator;
use crate::device::{Category, Device, lattice_for};
use crate::error::PlacementIntegrityError;
use area::{AreaArena, LegalizerArea, Rect};
use bucket::BlockBucket;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Right,
    Down,
    Left,
    Up,
}

const DIRECTIONS: [Direction; 4] = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

impl Direction {
    fn opposite(self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }

    fn index(self) -> usize {
        DIRECTIONS.iter().position(|&d| d == self).unwrap()
    }
}

pub struct Legalizer {
    tmp_legal_x: Vec<i32>,
    tmp_legal_y: Vec<i32>,
    best_legal_x: Vec<i32>,
    best_legal_y: Vec<i32>,
    best_cost: f64,
}

impl Legalizer {
    pub fn new(num_blocks: usize) -> Self {
        Self {
            tmp_legal_x: vec![0; num_blocks],
            tmp_legal_y: vec![0; num_blocks],
            best_legal_x: vec![0; num_blocks],
            best_legal_y: vec![0; num_blocks],
            best_cost: f64::INFINITY,
        }
    }

    pub fn best_legal_x(&self) -> &[i32] {
        &self.best_legal_x
    }

    pub fn best_legal_y(&self) -> &[i32] {
        &self.best_legal_y
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    /// Seeds `bestLegal*` from the device's current fixed I/O placement and
    /// an initial rounding of `linear_x/y`, for the very first call before
    /// any legalization pass has run.
    pub fn seed_from_linear(&mut self, registry: &BlockRegistry, device: &dyn Device, linear_x: &Col<E>, linear_y: &Col<E>) {
        for i in 0..registry.num_blocks() {
            let (x, y) = if i < registry.num_io() {
                device.fixed_position(i).unwrap_or((0, 0))
            } else {
                (linear_x[i].round() as i32, linear_y[i].round() as i32)
            };
            self.best_legal_x[i] = x;
            self.best_legal_y[i] = y;
        }
    }

    /// Runs one full legalization pass: optionally redistributes I/O, then
    /// legalizes every movable type, then evaluates cost and updates
    /// `bestLegal*` per spec.md §4.3 step 5.
    pub fn legalize(
        &mut self,
        registry: &BlockRegistry,
        device: &mut dyn Device,
        linear_x: &Col<E>,
        linear_y: &Col<E>,
        tile_capacity: f64,
        legalize_io: bool,
        cost_calc: &dyn CostCalculator,
    ) -> Result<f64, PlacementIntegrityError> {
        self.tmp_legal_x.copy_from_slice(&self.best_legal_x);
        self.tmp_legal_y.copy_from_slice(&self.best_legal_y);

        if legalize_io {
            self.legalize_io(registry, device, linear_x, linear_y);
        }

        for t in 0..registry.num_types() {
            self.legalize_type(t, registry, device, linear_x, linear_y, tile_capacity)?;
        }

        if cost_calc.requires_device_update() {
            commit(device, registry, &self.tmp_legal_x, &self.tmp_legal_y)?;
        }
        let cost = cost_calc.calculate(&self.tmp_legal_x, &self.tmp_legal_y);

        if cost < self.best_cost && tile_capacity <= 1.0 {
            self.best_cost = cost;
            for i in registry.num_io()..registry.num_blocks() {
                self.best_legal_x[i] = self.tmp_legal_x[i];
                self.best_legal_y[i] = self.tmp_legal_y[i];
            }
        } else if cost_calc.requires_device_update() {
            commit(device, registry, &self.best_legal_x, &self.best_legal_y)?;
        }

        Ok(cost)
    }

    /// Distributes the I/O blocks evenly over the perimeter, walking
    /// clockwise from `(1, 0)`. Each I/O block is ordered by its angle
    /// around the grid center (a proxy for "nearest-perimeter-cell
    /// bucket", since the walk order and the angular order agree); site `s`
    /// (0-based) has received `floor(blocksPerSite * (s + 1))` blocks in
    /// total once visited, matching `blocksPerSite = numIO / numSites`.
    fn legalize_io(&mut self, registry: &BlockRegistry, device: &dyn Device, linear_x: &Col<E>, linear_y: &Col<E>) {
        let perimeter = perimeter_walk(device.width(), device.height());
        if perimeter.is_empty() {
            return;
        }
        let num_io = registry.num_io();
        let cx = device.width() as E / 2.0;
        let cy = device.height() as E / 2.0;

        let mut order: Vec<usize> = (0..num_io).collect();
        order.sort_by(|&a, &b| {
            perimeter_angle(linear_x[a] - cx, linear_y[a] - cy)
                .partial_cmp(&perimeter_angle(linear_x[b] - cx, linear_y[b] - cy))
                .unwrap()
        });

        let blocks_per_site = num_io as f64 / perimeter.len() as f64;
        let mut emitted = 0usize;
        let mut cursor = 0usize;
        for (s, &(x, y)) in perimeter.iter().enumerate() {
            let target = ((blocks_per_site * (s + 1) as f64).floor() as usize).min(num_io);
            while emitted < target && cursor < order.len() {
                let b = order[cursor];
                self.tmp_legal_x[b] = x;
                self.tmp_legal_y[b] = y;
                cursor += 1;
                emitted += 1;
            }
        }
    }

    fn legalize_type(
        &mut self,
        t: usize,
        registry: &BlockRegistry,
        device: &dyn Device,
        linear_x: &Col<E>,
        linear_y: &Col<E>,
        tile_capacity: f64,
    ) -> Result<(), PlacementIntegrityError> {
        let category = registry.category_for_type(t);
        let range = registry.range_for_type(t);
        let lattice = lattice_for(device, category);
        let (repeat, block_height) = lattice.map(|l| (l.repeat, l.height)).unwrap_or((1, 1));

        let bucket = BlockBucket::build(device, category, linear_x, linear_y, range.clone())?;
        let mut arena = AreaArena::new(device.width(), device.height());

        seed_areas(&mut arena, &bucket, device, category);

        for idx in 0..arena.areas.len() {
            if arena.areas[idx].absorbed {
                continue;
            }
            grow_area(&mut arena, idx, &bucket, device, category, repeat, block_height, tile_capacity);
        }

        for area in arena.areas.into_iter().filter(|a| !a.absorbed) {
            if area.blocks.is_empty() {
                continue;
            }
            bipartition::legalize_area(
                area.rect,
                area.blocks,
                bipartition::Axis::X,
                category,
                device,
                repeat,
                block_height,
                linear_x,
                linear_y,
                &mut self.tmp_legal_x,
                &mut self.tmp_legal_y,
            )?;
        }
        Ok(())
    }
}

fn commit(device: &mut dyn Device, registry: &BlockRegistry, legal_x: &[i32], legal_y: &[i32]) -> Result<(), PlacementIntegrityError> {
    for i in registry.num_io()..registry.num_blocks() {
        device.set_position(i, legal_x[i], legal_y[i])?;
    }
    Ok(())
}

fn seed_areas(arena: &mut AreaArena, bucket: &BlockBucket, device: &dyn Device, category: Category) {
    let w = arena.width;
    let h = arena.height;
    if w <= 0 || h <= 0 {
        return;
    }
    let cx = w / 2;
    let cy = h / 2;
    let max_r = w.max(h);
    for r in 0..=max_r {
        for (x, y) in chebyshev_ring(cx, cy, r, w, h) {
            if arena.owner_at(x, y).is_some() {
                continue;
            }
            let blocks = bucket.at(x, y);
            if blocks.is_empty() {
                continue;
            }
            let capacity = if device.column_type(x) == category { 1 } else { 0 };
            let area_idx = arena.push_area(LegalizerArea {
                rect: Rect::point(x, y),
                blocks: blocks.to_vec(),
                capacity,
                absorbed: false,
            });
            arena.set_owner(x, y, area_idx);
        }
    }
}

fn chebyshev_ring(cx: i32, cy: i32, r: i32, w: i32, h: i32) -> Vec<(i32, i32)> {
    let mut cells = Vec::new();
    if r == 0 {
        if in_bounds(cx, cy, w, h) {
            cells.push((cx, cy));
        }
        return cells;
    }
    for x in (cx - r)..=(cx + r) {
        for &y in &[cy - r, cy + r] {
            if in_bounds(x, y, w, h) {
                cells.push((x, y));
            }
        }
    }
    for y in (cy - r + 1)..=(cy + r - 1) {
        for &x in &[cx - r, cx + r] {
            if in_bounds(x, y, w, h) {
                cells.push((x, y));
            }
        }
    }
    cells
}

fn in_bounds(x: i32, y: i32, w: i32, h: i32) -> bool {
    x >= 0 && x < w && y >= 0 && y < h
}

#[allow(clippy::too_many_arguments)]
fn grow_area(
    arena: &mut AreaArena,
    area_idx: usize,
    bucket: &BlockBucket,
    device: &dyn Device,
    category: Category,
    repeat: i32,
    block_height: i32,
    tile_capacity: f64,
) {
    let mut exhausted = [false; 4];
    let mut dir_i = 0usize;

    loop {
        let occupation = arena.areas[area_idx].occupation() as f64;
        let capacity = arena.areas[area_idx].capacity as f64;
        if occupation <= capacity * tile_capacity || exhausted.iter().all(|&e| e) {
            break;
        }
        if exhausted[dir_i] {
            dir_i = (dir_i + 1) % 4;
            continue;
        }
        let d = DIRECTIONS[dir_i];
        match try_grow_one_step(arena, area_idx, d, bucket, device, category, repeat, block_height) {
            true => {
                dir_i = (dir_i + 1) % 4;
            }
            false => {
                let opposite = d.opposite();
                let opp_i = opposite.index();
                let grew_opposite = !exhausted[opp_i]
                    && try_grow_one_step(arena, area_idx, opposite, bucket, device, category, repeat, block_height);
                if !grew_opposite {
                    exhausted[dir_i] = true;
                    exhausted[opp_i] = true;
                }
                dir_i = (dir_i + 1) % 4;
            }
        }
    }
}

/// Attempts to grow `area_idx` by one lattice step in direction `d`.
/// Returns `false` (blocked) if doing so would leave the device interior
/// (spec.md invariant: growth never produces `left < 1` or `right > W-2`,
/// and analogously for rows against the top/bottom I/O border).
#[allow(clippy::too_many_arguments)]
fn try_grow_one_step(
    arena: &mut AreaArena,
    area_idx: usize,
    d: Direction,
    bucket: &BlockBucket,
    device: &dyn Device,
    category: Category,
    repeat: i32,
    block_height: i32,
) -> bool {
    let current = arena.areas[area_idx].rect;
    let w = arena.width;
    let h = arena.height;
    let repeat = repeat.max(1);
    let block_height = block_height.max(1);

    let goal = match d {
        Direction::Right => Rect { right: current.right + repeat, ..current },
        Direction::Left => Rect { left: current.left - repeat, ..current },
        Direction::Down => Rect { bottom: current.bottom + block_height, ..current },
        Direction::Up => Rect { top: current.top - block_height, ..current },
    };

    if goal.left < 1 || goal.right > w - 2 || goal.top < 1 || goal.bottom > h - 2 {
        return false;
    }

    grow_to(arena, area_idx, goal, bucket, device, category);
    true
}

fn grow_to(arena: &mut AreaArena, area_idx: usize, mut goal: Rect, bucket: &BlockBucket, device: &dyn Device, category: Category) {
    loop {
        let current = arena.areas[area_idx].rect;
        let mut absorbed_more = false;

        for y in goal.top..=goal.bottom {
            for x in goal.left..=goal.right {
                if current.contains(x, y) {
                    continue;
                }
                if let Some(owner) = arena.owner_at(x, y) {
                    if owner != area_idx && !arena.areas[owner].absorbed {
                        arena.areas[owner].absorbed = true;
                        let owner_rect = arena.areas[owner].rect;
                        goal = goal.union(&owner_rect);
                        let transferred = std::mem::take(&mut arena.areas[owner].blocks);
                        arena.areas[area_idx].blocks.extend(transferred);
                        absorbed_more = true;
                    }
                }
                arena.set_owner(x, y, area_idx);
                for &b in bucket.at(x, y) {
                    arena.areas[area_idx].blocks.push(b);
                }
                if device.column_type(x) == category {
                    arena.areas[area_idx].capacity += 1;
                }
            }
        }

        arena.areas[area_idx].rect = current.union(&goal);
        if !absorbed_more {
            break;
        }
    }
}

fn perimeter_walk(w: i32, h: i32) -> Vec<(i32, i32)> {
    let mut v = Vec::new();
    if w < 2 || h < 2 {
        return v;
    }
    for x in 1..=(w - 2) {
        v.push((x, 0));
    }
    for y in 1..=(h - 2) {
        v.push((w - 1, y));
    }
    for x in (1..=(w - 2)).rev() {
        v.push((x, h - 1));
    }
    for y in (1..=(h - 2)).rev() {
        v.push((0, y));
    }
    v
}

fn perimeter_angle(dx: E, dy: E) -> E {
    // atan2 with the origin shifted so the ordering starts near (1, 0) and
    // proceeds clockwise (screen-space y grows downward, so negate dy to
    // match the walk's top -> right -> bottom -> left order).
    let mut angle = (-dy).atan2(dx);
    if angle < 0.0 {
        angle += std::f64::consts::TAU;
    }
    angle
}
