use crate::data::shape::BoundingBox;
use glam::DVec2;
use std::f64::consts::PI;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 100.0;

/// Initial map center (lon, lat), framing Africa and South Asia
pub const WORLD_CENTER: (f64, f64) = (25.0, 5.0);

/// Zoom used when flying to a single district
pub const DISTRICT_ZOOM: f64 = 6.0;

/// Web Mercator x in [0, 1)
#[inline(always)]
fn merc_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Web Mercator y in [0, 1], north at 0
#[inline(always)]
fn merc_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.0511, 85.0511) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline(always)]
fn inv_merc_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (1 = whole world across the canvas width)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// The global view
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(WORLD_CENTER.0, WORLD_CENTER.1, 1.0, width, height)
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / self.scale();
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5; // Mercator distortion

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        // Solve for the center that puts (lon, lat) back under (px, py)
        let scale = self.scale();
        let x = merc_x(lon) - (px as f64 - self.width as f64 / 2.0) / scale;
        let y = merc_y(lat) - (py as f64 - self.height as f64 / 2.0) / scale;
        self.center_lon = (x * 360.0 - 180.0 + 540.0).rem_euclid(360.0) - 180.0;
        self.center_lat = inv_merc_y(y).clamp(-85.0, 85.0);
    }

    /// Center on a point, optionally changing zoom
    pub fn fly_to(&mut self, lon: f64, lat: f64, zoom: Option<f64>) {
        self.center_lon = lon.clamp(-180.0, 180.0);
        self.center_lat = lat.clamp(-85.0, 85.0);
        if let Some(z) = zoom {
            self.zoom = z.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Center on a bounding box and zoom until it fills ~90% of the canvas
    pub fn fit_bounds(&mut self, bbox: &BoundingBox) {
        if bbox.is_empty() || self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = merc_x(bbox.min.x);
        let x1 = merc_x(bbox.max.x);
        let y0 = merc_y(bbox.max.y);
        let y1 = merc_y(bbox.min.y);

        let w = self.width as f64;
        let h = self.height as f64;
        let span_x = (x1 - x0).max(1e-9);
        let span_y = (y1 - y0).max(1e-9);
        let zoom = (0.9 / span_x).min(0.9 * h / (w * span_y));

        self.center_lon = (bbox.min.x + bbox.max.x) / 2.0;
        self.center_lat = inv_merc_y((y0 + y1) / 2.0).clamp(-85.0, 85.0);
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let x = (px as f64 - self.width as f64 / 2.0) / scale + merc_x(self.center_lon);
        let y = (py as f64 - self.height as f64 / 2.0) / scale + merc_y(self.center_lat);
        (x * 360.0 - 180.0, inv_merc_y(y))
    }

    /// Project (lon, lat) to fractional pixel coordinates
    #[inline]
    pub fn project_f64(&self, lon: f64, lat: f64) -> DVec2 {
        let scale = self.scale();
        DVec2::new(
            (merc_x(lon) - merc_x(self.center_lon)) * scale + self.width as f64 / 2.0,
            (merc_y(lat) - merc_y(self.center_lat)) * scale + self.height as f64 / 2.0,
        )
    }

    /// Project (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = self.project_f64(lon, lat);
        (p.x as i32, p.y as i32)
    }

    /// Geographic bounds of the canvas
    pub fn visible_bounds(&self) -> BoundingBox {
        let (west, north) = self.unproject(0, 0);
        let (east, south) = self.unproject(self.width as i32, self.height as i32);
        BoundingBox {
            min: DVec2::new(west, south),
            max: DVec2::new(east, north),
        }
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10
            && px < self.width as i32 + 10
            && py >= -10
            && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
