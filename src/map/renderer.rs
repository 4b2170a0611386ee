use crate::braille::BrailleCanvas;
use crate::data::join::District;
use crate::data::model::ProjectRecord;
use crate::data::shape::{BoundingBox, Shape};
use crate::data::Dataset;
use crate::map::geometry::{draw_marker, draw_path};
use crate::map::projection::Viewport;
use crate::map::raster::{rasterize, CellGrid};
use crate::map::spatial::{FeatureGrid, SpatialGrid};
use crate::scale::{no_access_scale, pct_scale, Rgb, ThresholdScale, BLACK, UNKNOWN, WHITE};
use glam::DVec2;
use tracing::trace;

/// At and above this zoom districts are outlined and hoverable;
/// below it hover and click act on whole countries
pub const DISTRICT_DETAIL_ZOOM: f64 = 3.0;

/// Fill for land with no district data
pub const LAND: Rgb = Rgb(0xE4, 0xE4, 0xE4);

/// Opacity of the white mask over districts outside the selection
pub const SELECTION_MASK: f64 = 0.75;

/// Opacity of the dark overlay on the hovered feature
pub const HOVER_SHADE: f64 = 0.25;

/// Districts strictly above the threshold are masked; the offset keeps
/// a threshold of exactly 100 from masking fully electrified districts
pub const THRESHOLD_EPSILON: f64 = 0.001;

/// Which metric colors the districts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layer {
    /// Percent of population with access
    #[default]
    AccessPct,
    /// Number of people without access
    NoAccess,
    /// Percent access, restricted to low-wealth (low RWI) districts
    LowWealth,
}

impl Layer {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Layer::AccessPct),
            2 => Some(Layer::NoAccess),
            3 => Some(Layer::LowWealth),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Layer::AccessPct => 1,
            Layer::NoAccess => 2,
            Layer::LowWealth => 3,
        }
    }

    pub fn next(self) -> Self {
        Layer::from_number(self.number() % 3 + 1).unwrap_or_default()
    }

    pub fn title(self) -> &'static str {
        match self {
            Layer::AccessPct => "% population with electricity",
            Layer::NoAccess => "People without electricity",
            Layer::LowWealth => "% access in low-wealth districts",
        }
    }

    pub fn scale(self) -> ThresholdScale {
        match self {
            Layer::AccessPct | Layer::LowWealth => pct_scale(),
            Layer::NoAccess => no_access_scale(),
        }
    }

    /// Base fill for a district on this layer
    pub fn color(self, district: &District) -> Rgb {
        match self {
            Layer::AccessPct => district.pct_color,
            Layer::NoAccess => district.no_access_color,
            Layer::LowWealth if district.low_rwi => district.pct_color,
            Layer::LowWealth => UNKNOWN,
        }
    }
}

/// Feature under the cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hovered {
    District(usize),
    Country(usize),
}

/// Everything about the current view that affects colors
#[derive(Clone, Debug, Default)]
pub struct PaintState<'a> {
    pub layer: Layer,
    pub highlight_threshold: f64,
    pub selected_country: Option<&'a str>,
    pub selected_district: Option<usize>,
    pub hovered: Option<Hovered>,
}

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_projects: bool,
    pub show_labels: bool,
    pub show_district_outlines: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_projects: false,
            show_labels: true,
            show_district_outlines: true,
        }
    }
}

/// Rendered map layers for one frame
pub struct MapLayers {
    pub cols: usize,
    pub rows: usize,
    /// Fill color per cell, row-major
    pub fill: Vec<Option<Rgb>>,
    pub districts: CellGrid,
    pub district_outlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub markers: BrailleCanvas,
    /// (column, row, text)
    pub labels: Vec<(u16, u16, String)>,
}

impl MapLayers {
    pub fn fill_at(&self, col: usize, row: usize) -> Option<Rgb> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.fill[row * self.cols + col]
    }
}

/// Choropleth renderer with spatial indexes over the dataset's features
pub struct MapRenderer {
    district_grid: FeatureGrid,
    country_grid: FeatureGrid,
    projects: SpatialGrid<ProjectRecord>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new(data: &Dataset) -> Self {
        let district_grid = FeatureGrid::build(data.district_shapes.iter().map(|s| &s.bbox), 5.0);
        let country_grid = FeatureGrid::build(data.country_shapes.iter().map(|s| &s.bbox), 10.0);
        let mut projects = SpatialGrid::new(2.0);
        for p in &data.projects {
            projects.insert(p.longitude, p.latitude, p.clone());
        }
        Self {
            district_grid,
            country_grid,
            projects,
            settings: DisplaySettings::default(),
        }
    }

    /// Top-most district containing (lon, lat)
    pub fn district_at(&self, data: &Dataset, lon: f64, lat: f64) -> Option<usize> {
        pick(&self.district_grid, &data.district_shapes, lon, lat)
    }

    /// Top-most country containing (lon, lat)
    pub fn country_at(&self, data: &Dataset, lon: f64, lat: f64) -> Option<usize> {
        pick(&self.country_grid, &data.country_shapes, lon, lat)
    }

    /// Nearest project marker within `radius` degrees
    pub fn project_near(&self, lon: f64, lat: f64, radius: f64) -> Option<&ProjectRecord> {
        self.projects.nearest(lon, lat, radius)
    }

    /// Final color of a district after threshold, selection and hover rules
    pub fn district_color(data: &Dataset, idx: usize, state: &PaintState) -> Rgb {
        let district = &data.districts[idx];
        let shape = &data.district_shapes[idx];

        let mut color = state.layer.color(district);
        // Districts left out of the low-wealth layer stay unknown
        let masked_out = state.layer == Layer::LowWealth && !district.low_rwi;
        if !masked_out
            && district
                .pct_access
                .is_some_and(|p| p >= state.highlight_threshold + THRESHOLD_EPSILON)
        {
            color = WHITE;
        }

        let outside_selection = match (state.selected_district, state.selected_country) {
            (Some(selected), _) => selected != idx,
            (None, Some(iso)) => shape.props.iso_3.as_deref() != Some(iso),
            (None, None) => false,
        };
        if outside_selection {
            color = color.blend(WHITE, SELECTION_MASK);
        }

        let hovered = match state.hovered {
            Some(Hovered::District(h)) => h == idx,
            Some(Hovered::Country(c)) => {
                let iso = data.country_shapes.get(c).and_then(|s| s.props.iso_3.as_deref());
                iso.is_some() && iso == shape.props.iso_3.as_deref()
            }
            None => false,
        };
        if hovered {
            color = color.blend(BLACK, HOVER_SHADE);
        }
        color
    }

    /// Render all layers for a `cols` x `rows` character area
    pub fn render(
        &self,
        data: &Dataset,
        cols: usize,
        rows: usize,
        viewport: &Viewport,
        state: &PaintState,
    ) -> MapLayers {
        let visible = viewport.visible_bounds();
        let district_candidates = self.district_grid.query(&visible);
        let country_candidates = self.country_grid.query(&visible);
        trace!(
            districts = district_candidates.len(),
            countries = country_candidates.len(),
            zoom = viewport.zoom,
            "render"
        );

        let countries = rasterize(&data.country_shapes, &country_candidates, viewport, cols, rows);
        let districts = rasterize(&data.district_shapes, &district_candidates, viewport, cols, rows);

        // District colors are computed once per visible district, not per cell
        let colors: Vec<(usize, Rgb)> = district_candidates
            .iter()
            .map(|&i| (i, Self::district_color(data, i, state)))
            .collect();
        let color_of = |i: usize| {
            colors
                .binary_search_by_key(&i, |(idx, _)| *idx)
                .ok()
                .map(|pos| colors[pos].1)
        };

        let mut fill = vec![None; cols * rows];
        for row in 0..rows {
            for col in 0..cols {
                fill[row * cols + col] = match districts.get(col, row) {
                    Some(d) => color_of(d as usize),
                    None => countries.get(col, row).map(|c| {
                        let hovered = state.hovered == Some(Hovered::Country(c as usize));
                        if hovered {
                            LAND.blend(BLACK, HOVER_SHADE)
                        } else {
                            LAND
                        }
                    }),
                };
            }
        }

        let mut borders = BrailleCanvas::new(cols, rows);
        for &i in &country_candidates {
            draw_shape(&mut borders, &data.country_shapes[i], viewport);
        }

        let mut district_outlines = BrailleCanvas::new(cols, rows);
        if self.settings.show_district_outlines && viewport.zoom >= DISTRICT_DETAIL_ZOOM {
            for &i in &district_candidates {
                draw_shape(&mut district_outlines, &data.district_shapes[i], viewport);
            }
        }

        let mut markers = BrailleCanvas::new(cols, rows);
        if self.settings.show_projects {
            let radius = if viewport.zoom > 6.0 { 2 } else { 1 };
            for (p, _) in self.projects.within(&visible) {
                let (px, py) = viewport.project(p.x, p.y);
                if viewport.is_visible(px, py) {
                    draw_marker(&mut markers, px, py, radius);
                }
            }
        }

        let labels = if self.settings.show_labels {
            country_labels(data, &country_candidates, viewport, cols, rows)
        } else {
            Vec::new()
        };

        MapLayers {
            cols,
            rows,
            fill,
            districts,
            district_outlines,
            borders,
            markers,
            labels,
        }
    }
}

fn pick(grid: &FeatureGrid, shapes: &[Shape], lon: f64, lat: f64) -> Option<usize> {
    let point = DVec2::new(lon, lat);
    let point_box = BoundingBox {
        min: point,
        max: point,
    };
    grid.query(&point_box)
        .into_iter()
        .rev()
        .find(|&i| shapes[i].contains(point))
}

fn draw_shape(canvas: &mut BrailleCanvas, shape: &Shape, viewport: &Viewport) {
    for poly in &shape.polygons {
        for ring in &poly.rings {
            draw_path(canvas, ring, viewport);
        }
    }
}

/// Country names centered on their reference point, only where the
/// country is wide enough on screen to hold the name
fn country_labels(
    data: &Dataset,
    candidates: &[usize],
    viewport: &Viewport,
    cols: usize,
    rows: usize,
) -> Vec<(u16, u16, String)> {
    let mut labels = Vec::new();
    for &i in candidates {
        let shape = &data.country_shapes[i];
        let Some(iso) = shape.props.iso_3.as_deref() else {
            continue;
        };
        let entry = data.taxonomy.by_iso(iso);
        let name = entry.map_or(iso, |e| e.name.as_str());

        let west = viewport.project_f64(shape.bbox.min.x, shape.bbox.min.y);
        let east = viewport.project_f64(shape.bbox.max.x, shape.bbox.min.y);
        let width_cells = (east.x - west.x) / 2.0;
        let len = name.chars().count();
        if width_cells < len as f64 {
            continue;
        }

        let anchor = match entry.and_then(|e| e.longitude.zip(e.latitude)) {
            Some((lon, lat)) => DVec2::new(lon, lat),
            None => shape.bbox.center(),
        };
        let p = viewport.project_f64(anchor.x, anchor.y);
        let col = p.x / 2.0 - len as f64 / 2.0;
        let row = p.y / 4.0;
        if col < 0.0 || row < 0.0 || col as usize + len > cols || row as usize >= rows {
            continue;
        }
        labels.push((col as u16, row as u16, name.to_string()));
    }
    labels
}
