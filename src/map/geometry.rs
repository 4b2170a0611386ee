use crate::braille::BrailleCanvas;
use crate::map::projection::Viewport;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a projected outline, skipping segments that cannot be on screen
/// and segments spanning half the world (antimeridian wraps)
pub fn draw_path(canvas: &mut BrailleCanvas, path: &[DVec2], viewport: &Viewport) {
    if path.len() < 2 {
        return;
    }
    let half_world = (viewport.zoom * viewport.width as f64 / 2.0) as i32;
    let mut prev: Option<(i32, i32)> = None;
    for p in path {
        let cur = viewport.project(p.x, p.y);
        if let Some(last) = prev {
            if (cur.0 - last.0).abs() < half_world && viewport.line_might_be_visible(last, cur) {
                draw_line(canvas, last.0, last.1, cur.0, cur.1);
            }
        }
        prev = Some(cur);
    }
}

/// Project marker: a ring with an empty center
pub fn draw_marker(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    let outer = radius * radius;
    let inner = (radius - 1).max(0).pow(2);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d = dx * dx + dy * dy;
            if d <= outer && (d > inner || radius <= 1) {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}
