use crate::data::model::Year;
use crate::data::Dataset;
use crate::map::projection::DISTRICT_ZOOM;
use crate::map::{Hovered, Layer, MapRenderer, PaintState, Viewport, DISTRICT_DETAIL_ZOOM};
use crate::ui;
use ratatui::layout::Rect;
use tracing::{debug, info};

/// Tooltip radius around project markers, in braille pixels
const PROJECT_HOVER_PIXELS: f64 = 4.0;

/// Initial view options
#[derive(Clone, Debug)]
pub struct ViewOptions {
    pub layer: Layer,
    pub year: Year,
    pub highlight_threshold: f64,
    pub rwi_cutoff: f64,
    pub show_projects: bool,
    pub hide_labels: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            layer: Layer::AccessPct,
            year: Year::LATEST,
            highlight_threshold: 100.0,
            rwi_cutoff: 0.0,
            show_projects: false,
            hide_labels: false,
        }
    }
}

/// What the tooltip shows
#[derive(Clone, Debug, PartialEq)]
pub enum Tooltip {
    /// District or country figures
    Area {
        /// District name, absent when hovering a whole country
        city: Option<String>,
        country: String,
        pct: Option<f64>,
        no_access: Option<f64>,
    },
    Project { text: String },
}

/// Tooltip anchored at a terminal cell
#[derive(Clone, Debug, PartialEq)]
pub struct HoverInfo {
    pub tooltip: Tooltip,
    pub col: u16,
    pub row: u16,
}

/// Application state
pub struct App {
    pub data: Dataset,
    pub map_renderer: MapRenderer,
    pub viewport: Viewport,
    pub layer: Layer,
    pub highlight_threshold: f64,
    /// ISO-3 code of the selected country
    pub selected_country: Option<String>,
    /// Index into the district shapes
    pub selected_district: Option<usize>,
    pub hovered: Option<Hovered>,
    pub hover: Option<HoverInfo>,
    pub should_quit: bool,
    /// Inner map rectangle in terminal cells
    pub map_area: Rect,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Whether the current press turned into a drag
    dragged: bool,
}

impl App {
    pub fn new(data: Dataset, options: &ViewOptions, width: u16, height: u16) -> Self {
        let mut map_renderer = MapRenderer::new(&data);
        map_renderer.settings.show_projects = options.show_projects;
        map_renderer.settings.show_labels = !options.hide_labels;

        let mut app = Self {
            data,
            map_renderer,
            viewport: Viewport::world(0, 0),
            layer: options.layer,
            highlight_threshold: options.highlight_threshold.clamp(0.0, 100.0),
            selected_country: None,
            selected_district: None,
            hovered: None,
            hover: None,
            should_quit: false,
            map_area: Rect::default(),
            last_mouse: None,
            dragged: false,
        };
        if app.data.year != options.year || app.data.rwi_cutoff != options.rwi_cutoff {
            app.data.rejoin(options.year, options.rwi_cutoff);
        }
        app.resize(width, height);
        app
    }

    /// Update the map area when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_area = ui::map_inner(Rect::new(0, 0, width, height));
        // Braille gives 2x4 resolution per character
        self.viewport.width = self.map_area.width as usize * 2;
        self.viewport.height = self.map_area.height as usize * 4;
    }

    /// Colors-relevant view state for the renderer
    pub fn paint_state(&self) -> PaintState<'_> {
        PaintState {
            layer: self.layer,
            highlight_threshold: self.highlight_threshold,
            selected_country: self.selected_country.as_deref(),
            selected_district: self.selected_district,
            hovered: self.hovered,
        }
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Braille pixel under a terminal cell, if it is inside the map
    fn to_map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        if col < area.x || row < area.y || col >= area.right() || row >= area.bottom() {
            return None;
        }
        Some((
            (col - area.x) as i32 * 2 + 1,
            (row - area.y) as i32 * 4 + 2,
        ))
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.to_map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.to_map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Whether hover and click work on districts rather than countries
    pub fn district_mode(&self) -> bool {
        self.viewport.zoom >= DISTRICT_DETAIL_ZOOM
    }

    pub fn next_layer(&mut self) {
        self.set_layer(self.layer.next());
    }

    pub fn set_layer(&mut self, layer: Layer) {
        self.layer = layer;
        debug!(layer = layer.number(), "layer changed");
    }

    pub fn year(&self) -> Year {
        self.data.year
    }

    /// Move the year slider and recompute derived figures
    pub fn set_year(&mut self, year: Year) {
        if year != self.data.year {
            self.data.rejoin(year, self.data.rwi_cutoff);
            self.refresh_hover();
            debug!(year = year.get(), "year changed");
        }
    }

    pub fn set_rwi_cutoff(&mut self, cutoff: f64) {
        let cutoff = (cutoff * 10.0).round() / 10.0;
        if cutoff != self.data.rwi_cutoff {
            self.data.rejoin(self.data.year, cutoff);
            self.refresh_hover();
            debug!(cutoff, "rwi cutoff changed");
        }
    }

    /// Move the highlight slider (0..=100)
    pub fn adjust_threshold(&mut self, delta: f64) {
        self.highlight_threshold = (self.highlight_threshold + delta).clamp(0.0, 100.0);
    }

    pub fn toggle_projects(&mut self) {
        self.map_renderer.settings.show_projects = !self.map_renderer.settings.show_projects;
        self.refresh_hover();
    }

    pub fn toggle_labels(&mut self) {
        self.map_renderer.settings.show_labels = !self.map_renderer.settings.show_labels;
    }

    pub fn toggle_outlines(&mut self) {
        let settings = &mut self.map_renderer.settings;
        settings.show_district_outlines = !settings.show_district_outlines;
    }

    /// Select a country by ISO code and frame it
    pub fn select_country(&mut self, iso3: &str) {
        self.selected_district = None;
        self.selected_country = Some(iso3.to_string());
        if let Some(bbox) = self.data.country_bounds(iso3) {
            self.viewport.fit_bounds(&bbox);
        }
        info!(country = iso3, "country selected");
    }

    /// Select a district (and its country) and fly to it
    pub fn select_district(&mut self, idx: usize) {
        let Some(shape) = self.data.district_shapes.get(idx) else {
            return;
        };
        self.selected_country = shape.props.iso_3.clone();
        self.selected_district = Some(idx);
        let center = shape.center();
        self.viewport.fly_to(center.x, center.y, Some(DISTRICT_ZOOM));
        info!(district = ?shape.props.adm2_id, "district selected");
    }

    /// Back to the global view
    pub fn clear_selection(&mut self) {
        self.selected_country = None;
        self.selected_district = None;
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
        self.hover = None;
        self.hovered = None;
    }

    /// Name shown for the selected country
    pub fn selected_country_name(&self) -> Option<&str> {
        self.selected_country
            .as_deref()
            .map(|iso| self.data.taxonomy.name_of(iso))
    }

    /// Track the cursor and work out what is under it
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.hovered = None;
        self.hover = None;
        let Some((px, py)) = self.to_map_pixel(col, row) else {
            return;
        };
        let (lon, lat) = self.viewport.unproject(px, py);

        if self.map_renderer.settings.show_projects {
            let radius = PROJECT_HOVER_PIXELS * 360.0 / (self.viewport.zoom * self.viewport.width.max(1) as f64);
            if let Some(project) = self.map_renderer.project_near(lon, lat, radius) {
                self.hover = Some(HoverInfo {
                    tooltip: Tooltip::Project {
                        text: project.lead_country.clone(),
                    },
                    col,
                    row,
                });
                return;
            }
        }

        let (hovered, tooltip) = if self.district_mode() {
            match self.map_renderer.district_at(&self.data, lon, lat) {
                Some(i) => (Hovered::District(i), self.district_tooltip(i)),
                None => return,
            }
        } else {
            match self.map_renderer.country_at(&self.data, lon, lat) {
                Some(i) => (Hovered::Country(i), self.country_tooltip(i)),
                None => return,
            }
        };
        self.hovered = Some(hovered);
        self.hover = Some(HoverInfo { tooltip, col, row });
    }

    fn refresh_hover(&mut self) {
        if let Some(h) = self.hover.clone() {
            self.set_mouse_pos(h.col, h.row);
        }
    }

    fn district_tooltip(&self, idx: usize) -> Tooltip {
        let shape = &self.data.district_shapes[idx];
        let district = &self.data.districts[idx];
        let country = shape
            .props
            .iso_3
            .as_deref()
            .map(|iso| self.data.taxonomy.name_of(iso).to_string())
            .unwrap_or_default();
        Tooltip::Area {
            city: shape.props.display_name().map(str::to_string),
            country,
            pct: district.pct_access,
            no_access: district.no_access.map(f64::round),
        }
    }

    fn country_tooltip(&self, idx: usize) -> Tooltip {
        let iso = self.data.country_shapes[idx].props.iso_3.as_deref().unwrap_or_default();
        let year = self.data.year;
        let rollup = self.data.country(iso);
        Tooltip::Area {
            city: None,
            country: self.data.taxonomy.name_of(iso).to_string(),
            pct: rollup.and_then(|c| c.pct_access(year)),
            no_access: rollup.map(|c| c.no_access(year).round()),
        }
    }

    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Drag pans the map; sensitivity drops as the zoom grows
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// A release without a drag is a click
    pub fn mouse_up(&mut self, col: u16, row: u16) {
        let was_click = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if was_click {
            self.click(col, row);
        }
    }

    /// Click selects the country, or the district when zoomed in
    pub fn click(&mut self, col: u16, row: u16) {
        let Some((px, py)) = self.to_map_pixel(col, row) else {
            return;
        };
        let (lon, lat) = self.viewport.unproject(px, py);
        if self.district_mode() {
            if let Some(i) = self.map_renderer.district_at(&self.data, lon, lat) {
                self.select_district(i);
            }
        } else if let Some(i) = self.map_renderer.country_at(&self.data, lon, lat) {
            if let Some(iso) = self.data.country_shapes[i].props.iso_3.clone() {
                self.select_country(&iso);
            }
        }
        self.set_mouse_pos(col, row);
    }

    /// Current zoom as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AccessRecord, ProjectRecord, TaxonomyEntry, YEAR_COUNT};
    use crate::data::shape::{Polygon, Shape, ShapeProps};
    use crate::data::Taxonomy;
    use glam::DVec2;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64, adm2: Option<&str>, iso: &str) -> Shape {
        let ring = vec![
            DVec2::new(x0, y0),
            DVec2::new(x1, y0),
            DVec2::new(x1, y1),
            DVec2::new(x0, y1),
            DVec2::new(x0, y0),
        ];
        Shape::new(
            vec![Polygon { rings: vec![ring] }],
            ShapeProps {
                adm2_id: adm2.map(str::to_string),
                adm2_name: adm2.map(|a| format!("District {a}")),
                iso_3: Some(iso.to_string()),
                ..Default::default()
            },
        )
    }

    fn app() -> App {
        let mut access = [0.0; YEAR_COUNT];
        for (i, a) in access.iter_mut().enumerate() {
            *a = 40.0 + 5.0 * i as f64;
        }
        let records = vec![AccessRecord {
            adm2_id: "k1".into(),
            adm2_name: "District k1".into(),
            tot_population: 100.0,
            pop_access: access,
            rwi: Some(-0.3),
        }];
        let mut data = Dataset::new(
            vec![rect(30.0, -5.0, 40.0, 5.0, Some("k1"), "KEN")],
            vec![rect(30.0, -5.0, 40.0, 5.0, None, "KEN")],
            records,
            Taxonomy::new(vec![TaxonomyEntry {
                iso3: "KEN".into(),
                name: "Kenya".into(),
                latitude: Some(0.0),
                longitude: Some(35.0),
            }]),
        );
        data.projects = vec![ProjectRecord {
            lead_country: "Kenya".into(),
            latitude: 0.0,
            longitude: 35.0,
        }];
        App::new(data, &ViewOptions::default(), 120, 40)
    }

    /// Terminal cell over a geographic point
    fn cell_at(app: &App, lon: f64, lat: f64) -> (u16, u16) {
        let (px, py) = app.viewport.project(lon, lat);
        (
            app.map_area.x + (px / 2) as u16,
            app.map_area.y + (py / 4) as u16,
        )
    }

    #[test]
    fn test_country_hover_at_world_zoom() {
        let mut app = app();
        let (col, row) = cell_at(&app, 35.0, -1.0);
        app.set_mouse_pos(col, row);
        assert_eq!(app.hovered, Some(Hovered::Country(0)));
        let Some(HoverInfo { tooltip: Tooltip::Area { city, country, pct, no_access }, .. }) = app.hover
        else {
            panic!("expected area tooltip");
        };
        assert_eq!(city, None);
        assert_eq!(country, "Kenya");
        assert_eq!(pct, Some(80.0));
        assert_eq!(no_access, Some(20.0));
    }

    #[test]
    fn test_click_selects_and_frames_country() {
        let mut app = app();
        let (col, row) = cell_at(&app, 35.0, -1.0);
        app.click(col, row);
        assert_eq!(app.selected_country.as_deref(), Some("KEN"));
        assert_eq!(app.selected_district, None);
        assert_eq!(app.selected_country_name(), Some("Kenya"));
        assert!((app.viewport.center_lon - 35.0).abs() < 1e-9);
        assert!(app.district_mode());
    }

    #[test]
    fn test_district_click_and_back() {
        let mut app = app();
        app.select_country("KEN");
        let (col, row) = cell_at(&app, 35.0, 0.0);
        app.click(col, row);
        assert_eq!(app.selected_district, Some(0));
        assert_eq!(app.viewport.zoom, DISTRICT_ZOOM);

        match &app.hover {
            Some(HoverInfo { tooltip: Tooltip::Area { city, .. }, .. }) => {
                assert_eq!(city.as_deref(), Some("District k1"));
            }
            other => panic!("unexpected hover {other:?}"),
        }

        app.clear_selection();
        assert_eq!(app.selected_country, None);
        assert_eq!(app.selected_district, None);
        assert_eq!(app.viewport.zoom, 1.0);
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut app = app();
        let (col, row) = cell_at(&app, 35.0, -1.0);
        app.mouse_down(col, row);
        app.handle_drag(col + 3, row);
        app.mouse_up(col + 3, row);
        assert_eq!(app.selected_country, None);
    }

    #[test]
    fn test_year_slider_rejoins() {
        let mut app = app();
        app.set_year(Year::new(2012));
        assert_eq!(app.data.districts[0].pct_access, Some(40.0));
        assert_eq!(app.year().get(), 2012);
    }

    #[test]
    fn test_threshold_clamps() {
        let mut app = app();
        app.adjust_threshold(10.0);
        assert_eq!(app.highlight_threshold, 100.0);
        app.adjust_threshold(-250.0);
        assert_eq!(app.highlight_threshold, 0.0);
    }

    #[test]
    fn test_project_tooltip() {
        let mut app = app();
        app.toggle_projects();
        let (col, row) = cell_at(&app, 35.0, 0.0);
        app.set_mouse_pos(col, row);
        assert_eq!(
            app.hover.map(|h| h.tooltip),
            Some(Tooltip::Project { text: "Kenya".into() })
        );
    }

    #[test]
    fn test_outside_map_clears_hover() {
        let mut app = app();
        app.set_mouse_pos(0, 0);
        assert_eq!(app.hover, None);
        assert_eq!(app.hovered, None);
    }
}
