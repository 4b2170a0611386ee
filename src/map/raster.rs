//! Polygon fill at terminal-cell resolution.
//!
//! Each braille cell is 2x4 pixels; polygons are sampled at cell centers
//! with an even-odd scanline. The resulting grid records which feature
//! owns each cell.

use crate::data::shape::{Polygon, Shape};
use crate::map::projection::Viewport;
use glam::DVec2;
use rayon::prelude::*;

/// Feature ownership per terminal cell
#[derive(Clone, Debug)]
pub struct CellGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<u32>>,
}

impl CellGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<u32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells[row * self.width + col]
    }

    fn paint(&mut self, span: &Span, feature: u32) {
        let row = span.row as usize * self.width;
        for cell in &mut self.cells[row + span.start as usize..row + span.end as usize] {
            *cell = Some(feature);
        }
    }

    /// Number of cells owned by a feature
    pub fn count(&self, feature: u32) -> usize {
        self.cells.iter().filter(|c| **c == Some(feature)).count()
    }
}

/// Half-open run of cells `[start, end)` on one row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub row: u16,
    pub start: u16,
    pub end: u16,
}

/// Project a ring into cell coordinates (x in columns, y in rows)
fn ring_to_cells(ring: &[DVec2], viewport: &Viewport) -> Vec<DVec2> {
    ring.iter()
        .map(|p| {
            let px = viewport.project_f64(p.x, p.y);
            DVec2::new(px.x / 2.0, px.y / 4.0)
        })
        .collect()
}

fn polygon_spans(poly: &Polygon, viewport: &Viewport, cols: usize, rows: usize, out: &mut Vec<Span>) {
    let rings: Vec<Vec<DVec2>> = poly
        .rings
        .iter()
        .filter(|r| r.len() >= 3)
        .map(|r| ring_to_cells(r, viewport))
        .collect();
    let Some(exterior) = rings.first() else {
        return;
    };

    let (min_y, max_y) = exterior
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    if max_y < 0.0 || min_y > rows as f64 {
        return;
    }
    let first_row = (min_y - 0.5).ceil().max(0.0) as usize;
    let last_row = ((max_y - 0.5).floor() as i64).min(rows as i64 - 1);
    if last_row < first_row as i64 {
        return;
    }

    let mut xs: Vec<f64> = Vec::new();
    for row in first_row..=last_row as usize {
        let yc = row as f64 + 0.5;
        xs.clear();
        for ring in &rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                if (a.y > yc) != (b.y > yc) {
                    xs.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        xs.sort_unstable_by(|a, b| a.total_cmp(b));
        for pair in xs.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().clamp(0.0, cols as f64) as u16;
            let end = (pair[1] - 0.5).ceil().clamp(0.0, cols as f64) as u16;
            if start < end {
                out.push(Span {
                    row: row as u16,
                    start,
                    end,
                });
            }
        }
    }
}

/// Cell spans covered by a shape. Shapes smaller than a cell still claim
/// the cell under their center so they stay visible and hoverable.
pub fn shape_spans(shape: &Shape, viewport: &Viewport, cols: usize, rows: usize) -> Vec<Span> {
    let mut spans = Vec::new();
    for poly in &shape.polygons {
        polygon_spans(poly, viewport, cols, rows, &mut spans);
    }
    if spans.is_empty() && !shape.polygons.is_empty() {
        let c = viewport.project_f64(shape.bbox.center().x, shape.bbox.center().y);
        let (col, row) = ((c.x / 2.0).floor(), (c.y / 4.0).floor());
        if col >= 0.0 && row >= 0.0 && (col as usize) < cols && (row as usize) < rows {
            spans.push(Span {
                row: row as u16,
                start: col as u16,
                end: col as u16 + 1,
            });
        }
    }
    spans
}

/// Rasterize the candidate shapes; later candidates paint over earlier ones
pub fn rasterize(
    shapes: &[Shape],
    candidates: &[usize],
    viewport: &Viewport,
    cols: usize,
    rows: usize,
) -> CellGrid {
    let spans: Vec<(usize, Vec<Span>)> = candidates
        .par_iter()
        .map(|&i| (i, shape_spans(&shapes[i], viewport, cols, rows)))
        .collect();

    let mut grid = CellGrid::new(cols, rows);
    for (i, feature_spans) in &spans {
        for span in feature_spans {
            grid.paint(span, *i as u32);
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::shape::ShapeProps;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        let ring = vec![
            DVec2::new(x0, y0),
            DVec2::new(x1, y0),
            DVec2::new(x1, y1),
            DVec2::new(x0, y1),
            DVec2::new(x0, y0),
        ];
        Shape::new(vec![Polygon { rings: vec![ring] }], ShapeProps::default())
    }

    // 40x20 cells, 80x80 pixels: one world width spans the canvas at zoom 1
    fn viewport() -> Viewport {
        Viewport::new(0.0, 0.0, 1.0, 80, 80)
    }

    #[test]
    fn test_fill_covers_interior() {
        let shapes = vec![rect(-90.0, -40.0, 90.0, 40.0)];
        let grid = rasterize(&shapes, &[0], &viewport(), 40, 20);
        // Center cell is inside, corner is not
        assert_eq!(grid.get(20, 10), Some(0));
        assert_eq!(grid.get(0, 0), None);
        assert_eq!(grid.get(2, 10), None);
        assert!(grid.count(0) > 50);
    }

    #[test]
    fn test_later_features_paint_over() {
        let shapes = vec![rect(-90.0, -40.0, 90.0, 40.0), rect(-10.0, -10.0, 10.0, 10.0)];
        let grid = rasterize(&shapes, &[0, 1], &viewport(), 40, 20);
        assert_eq!(grid.get(20, 10), Some(1));
        assert_eq!(grid.get(12, 10), Some(0));
    }

    #[test]
    fn test_hole_is_not_filled() {
        let outer = rect(-90.0, -60.0, 90.0, 60.0).polygons[0].rings[0].clone();
        let hole = rect(-20.0, -20.0, 20.0, 20.0).polygons[0].rings[0].clone();
        let shape = Shape::new(vec![Polygon { rings: vec![outer, hole] }], ShapeProps::default());
        let grid = rasterize(&[shape], &[0], &viewport(), 40, 20);
        assert_eq!(grid.get(20, 10), None);
        assert_eq!(grid.get(12, 10), Some(0));
    }

    #[test]
    fn test_tiny_shape_claims_center_cell() {
        let shapes = vec![rect(0.1, 0.1, 0.2, 0.2)];
        let grid = rasterize(&shapes, &[0], &viewport(), 40, 20);
        assert_eq!(grid.count(0), 1);
    }

    #[test]
    fn test_offscreen_shape() {
        let vp = Viewport::new(0.0, 0.0, 8.0, 80, 80);
        let spans = shape_spans(&rect(100.0, 10.0, 120.0, 20.0), &vp, 40, 20);
        assert!(spans.is_empty());
    }
}
