use crate::data::shape::BoundingBox;
use glam::DVec2;
use std::collections::HashMap;

/// Spatial hash of points for radius lookups (project markers)
pub struct SpatialGrid<T> {
    /// Grid cells indexed by (cell_x, cell_y)
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Items with their positions, indices stored in cells
    items: Vec<(DVec2, T)>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        (
            (lon / self.cell_size).floor() as i32,
            (lat / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, lon: f64, lat: f64, item: T) {
        let idx = self.items.len();
        self.items.push((DVec2::new(lon, lat), item));
        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Nearest item within `radius_degrees` of (lon, lat)
    pub fn nearest(&self, lon: f64, lat: f64, radius_degrees: f64) -> Option<&T> {
        let center = self.to_cell(lon, lat);
        let reach = (radius_degrees / self.cell_size).ceil() as i32;
        let target = DVec2::new(lon, lat);

        let mut best: Option<(f64, usize)> = None;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let Some(indices) = self.cells.get(&(center.0 + dx, center.1 + dy)) else {
                    continue;
                };
                for &idx in indices {
                    let d = self.items[idx].0.distance(target);
                    if d <= radius_degrees && best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, idx));
                    }
                }
            }
        }
        best.map(|(_, idx)| &self.items[idx].1)
    }

    /// Items whose position falls in the bounding box
    pub fn within(&self, bbox: &BoundingBox) -> impl Iterator<Item = (DVec2, &T)> + '_ {
        let bbox = *bbox;
        self.items
            .iter()
            .filter(move |(p, _)| bbox.contains(*p))
            .map(|(p, item)| (*p, item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Spatial index for polygon features using conservative approximation.
/// Each feature's bounding box is indexed into every cell it overlaps,
/// so queries never miss a feature but may return extra candidates.
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, p: DVec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Index features by bounding box; empty boxes are left out
    pub fn build<'a>(bboxes: impl Iterator<Item = &'a BoundingBox>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, bbox) in bboxes.enumerate() {
            if bbox.is_empty() {
                continue;
            }
            let min_cell = grid.to_cell(bbox.min);
            let max_cell = grid.to_cell(bbox.max);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Sorted, deduplicated candidate indices for the given bounds
    pub fn query(&self, bbox: &BoundingBox) -> Vec<usize> {
        if bbox.is_empty() {
            return Vec::new();
        }
        let min_cell = self.to_cell(bbox.min);
        let max_cell = self.to_cell(bbox.max);
        let mut results = Vec::new();
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results.sort_unstable();
        results.dedup();
        results
    }
}
