pub mod join;
pub mod model;
pub mod shape;
pub mod topo;

use crate::error::{DataError, DataResult};
use join::{AccessIndex, District};
use model::{
    AccessRecord, CountryAccess, CountryProjectSummary, ProjectRecord, TaxonomyEntry,
    TimeSeriesPoint, Totals, Year,
};
use serde::de::DeserializeOwned;
use shape::{BoundingBox, Shape};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DISTRICT_SHAPES_FILE: &str = "DistrictShape.json";
pub const COUNTRY_SHAPES_FILE: &str = "CountryShape.json";
pub const ACCESS_FILE: &str = "accessData.json";
pub const TIME_SERIES_FILE: &str = "timeSeriesData.json";
pub const TAXONOMY_FILE: &str = "country-taxonomy.json";
pub const PROJECTS_FILE: &str = "projectData.json";
pub const PROJECT_SUMMARY_FILE: &str = "countryProjectSummary.json";

/// Country names and reference points, indexed by ISO-3 and by name
#[derive(Clone, Debug, Default)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
    by_iso: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl Taxonomy {
    pub fn new(entries: Vec<TaxonomyEntry>) -> Self {
        let mut by_iso = HashMap::new();
        let mut by_name = HashMap::new();
        for (i, e) in entries.iter().enumerate() {
            by_iso.entry(e.iso3.clone()).or_insert(i);
            by_name.entry(e.name.clone()).or_insert(i);
        }
        Self {
            entries,
            by_iso,
            by_name,
        }
    }

    pub fn by_iso(&self, iso3: &str) -> Option<&TaxonomyEntry> {
        self.by_iso.get(iso3).map(|&i| &self.entries[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&TaxonomyEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Display name for an ISO code, falling back to the code itself
    pub fn name_of<'a>(&'a self, iso3: &'a str) -> &'a str {
        self.by_iso(iso3).map_or(iso3, |t| t.name.as_str())
    }
}

/// Everything the dashboard shows, loaded once and re-derived on demand
pub struct Dataset {
    pub district_shapes: Vec<Shape>,
    pub country_shapes: Vec<Shape>,
    pub records: Vec<AccessRecord>,
    pub index: AccessIndex,
    pub taxonomy: Taxonomy,
    pub time_series: Vec<TimeSeriesPoint>,
    pub projects: Vec<ProjectRecord>,
    pub project_summaries: Vec<CountryProjectSummary>,
    // Derived state
    pub districts: Vec<District>,
    pub countries: Vec<CountryAccess>,
    pub world: Totals,
    pub world_low_rwi: Totals,
    pub year: Year,
    pub rwi_cutoff: f64,
}

impl Dataset {
    /// Assemble a dataset from parts and compute derived figures
    pub fn new(
        district_shapes: Vec<Shape>,
        country_shapes: Vec<Shape>,
        records: Vec<AccessRecord>,
        taxonomy: Taxonomy,
    ) -> Self {
        Self::joined(district_shapes, country_shapes, records, taxonomy, Year::LATEST, 0.0)
    }

    fn joined(
        district_shapes: Vec<Shape>,
        country_shapes: Vec<Shape>,
        records: Vec<AccessRecord>,
        taxonomy: Taxonomy,
        year: Year,
        rwi_cutoff: f64,
    ) -> Self {
        let index = AccessIndex::build(&records);
        let mut ds = Self {
            district_shapes,
            country_shapes,
            records,
            index,
            taxonomy,
            time_series: Vec::new(),
            projects: Vec::new(),
            project_summaries: Vec::new(),
            districts: Vec::new(),
            countries: Vec::new(),
            world: Totals::default(),
            world_low_rwi: Totals::default(),
            year,
            rwi_cutoff,
        };
        ds.rejoin(year, rwi_cutoff);
        ds
    }

    /// Load every dataset file from a directory
    pub fn load(dir: &Path, year: Year, rwi_cutoff: f64) -> DataResult<Self> {
        if !dir.is_dir() {
            return Err(DataError::MissingDir(dir.to_path_buf()));
        }

        let district_shapes = load_shapes(&dir.join(DISTRICT_SHAPES_FILE))?;
        let country_shapes = load_shapes(&dir.join(COUNTRY_SHAPES_FILE))?;
        let records: Vec<AccessRecord> = load_json(&dir.join(ACCESS_FILE))?;
        let taxonomy = Taxonomy::new(load_optional(&dir.join(TAXONOMY_FILE)));

        let mut ds = Self::joined(
            district_shapes,
            country_shapes,
            records,
            taxonomy,
            year,
            rwi_cutoff,
        );
        ds.time_series = load_optional(&dir.join(TIME_SERIES_FILE));
        ds.projects = load_optional(&dir.join(PROJECTS_FILE));
        ds.project_summaries = load_optional(&dir.join(PROJECT_SUMMARY_FILE));

        let matched = ds.districts.iter().filter(|d| d.record.is_some()).count();
        info!(
            districts = ds.district_shapes.len(),
            matched,
            countries = ds.country_shapes.len(),
            records = ds.records.len(),
            projects = ds.projects.len(),
            "dataset loaded"
        );
        Ok(ds)
    }

    /// Recompute district figures and rollups for a year and RWI cutoff
    pub fn rejoin(&mut self, year: Year, rwi_cutoff: f64) {
        self.year = year;
        self.rwi_cutoff = rwi_cutoff;
        self.districts =
            join::join_districts(&self.district_shapes, &self.records, &self.index, year, rwi_cutoff);
        self.countries = join::country_rollups(
            &self.district_shapes,
            &self.districts,
            &self.records,
            &self.taxonomy,
            rwi_cutoff,
        );
        let (world, low) = join::world_rollup(&self.countries);
        self.world = world;
        self.world_low_rwi = low;
    }

    pub fn country(&self, iso3: &str) -> Option<&CountryAccess> {
        self.countries
            .binary_search_by(|c| c.country_id.as_str().cmp(iso3))
            .ok()
            .map(|i| &self.countries[i])
    }

    /// Index of the country shape with the given ISO code
    pub fn country_shape(&self, iso3: &str) -> Option<usize> {
        self.country_shapes
            .iter()
            .position(|s| s.props.iso_3.as_deref() == Some(iso3))
    }

    /// Bounds of a country: its own shape, else the union of its districts
    pub fn country_bounds(&self, iso3: &str) -> Option<BoundingBox> {
        if let Some(bbox) = self
            .country_shape(iso3)
            .map(|i| self.country_shapes[i].bbox)
            .filter(|b| !b.is_empty())
        {
            return Some(bbox);
        }
        let bbox = self
            .district_shapes
            .iter()
            .filter(|s| s.props.iso_3.as_deref() == Some(iso3))
            .fold(BoundingBox::EMPTY, |acc, s| acc.union(&s.bbox));
        (!bbox.is_empty()).then_some(bbox)
    }

    /// Number of countries with at least one matched district
    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    /// National series for a country name, ordered by year
    pub fn series_for(&self, country: &str) -> Vec<&TimeSeriesPoint> {
        let mut series: Vec<_> = self.time_series.iter().filter(|p| p.country == country).collect();
        series.sort_by_key(|p| p.year);
        series
    }

    pub fn series_point(&self, country: &str, year: u16) -> Option<&TimeSeriesPoint> {
        self.time_series
            .iter()
            .find(|p| p.country == country && p.year == year)
    }

    pub fn project_summary(&self, country: &str) -> Option<&CountryProjectSummary> {
        self.project_summaries
            .iter()
            .find(|s| s.lead_country == country)
    }
}

fn read(path: &Path) -> DataResult<Vec<u8>> {
    fs::read(path).map_err(|e| DataError::io(path, e))
}

/// Load shapes from a TopoJSON or GeoJSON file
pub fn load_shapes(path: &Path) -> DataResult<Vec<Shape>> {
    topo::decode_shapes(path, read(path)?)
}

/// Parse a JSON file into `T`
pub fn load_json<T: DeserializeOwned>(path: &Path) -> DataResult<T> {
    let mut bytes = read(path)?;
    simd_json::serde::from_slice(&mut bytes).map_err(|e| DataError::parse(path, e))
}

/// Optional list files: missing or broken files only cost a warning
fn load_optional<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    if !path.exists() {
        warn!(path = %path.display(), "optional data file not found");
        return Vec::new();
    }
    match load_json(path) {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load optional data file");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::YEAR_COUNT;
    use crate::data::shape::{Polygon, ShapeProps};
    use glam::DVec2;

    fn square_shape(x0: f64, iso: &str, adm2: Option<&str>) -> Shape {
        let ring = vec![
            DVec2::new(x0, 0.0),
            DVec2::new(x0 + 1.0, 0.0),
            DVec2::new(x0 + 1.0, 1.0),
            DVec2::new(x0, 1.0),
            DVec2::new(x0, 0.0),
        ];
        Shape::new(
            vec![Polygon { rings: vec![ring] }],
            ShapeProps {
                adm2_id: adm2.map(str::to_string),
                iso_3: Some(iso.to_string()),
                ..Default::default()
            },
        )
    }

    fn dataset() -> Dataset {
        let records = vec![AccessRecord {
            adm2_id: "d1".into(),
            adm2_name: "One".into(),
            tot_population: 100.0,
            pop_access: [50.0; YEAR_COUNT],
            rwi: Some(-1.0),
        }];
        let taxonomy = Taxonomy::new(vec![TaxonomyEntry {
            iso3: "KEN".into(),
            name: "Kenya".into(),
            latitude: Some(0.5),
            longitude: Some(37.9),
        }]);
        Dataset::new(
            vec![
                square_shape(0.0, "KEN", Some("d1")),
                square_shape(3.0, "KEN", Some("d2")),
            ],
            vec![],
            records,
            taxonomy,
        )
    }

    #[test]
    fn test_taxonomy_lookups() {
        let ds = dataset();
        assert_eq!(ds.taxonomy.name_of("KEN"), "Kenya");
        assert_eq!(ds.taxonomy.name_of("XYZ"), "XYZ");
        assert_eq!(ds.taxonomy.by_name("Kenya").map(|t| t.iso3.as_str()), Some("KEN"));
    }

    #[test]
    fn test_rollup_uses_taxonomy_name() {
        let ds = dataset();
        let ken = ds.country("KEN").unwrap();
        assert_eq!(ken.name, "Kenya");
        assert_eq!(ken.districts, 1);
        assert_eq!(ds.world.population, 100.0);
        assert_eq!(ds.world_low_rwi.population, 100.0);
        assert_eq!(ds.country_count(), 1);
    }

    #[test]
    fn test_joined_uses_requested_year_and_cutoff() {
        let base = dataset();
        let ds = Dataset::joined(
            base.district_shapes,
            base.country_shapes,
            base.records,
            base.taxonomy,
            Year::new(2014),
            -2.0,
        );
        assert_eq!(ds.year.get(), 2014);
        assert_eq!(ds.rwi_cutoff, -2.0);
        assert!(!ds.districts[0].low_rwi);
        assert_eq!(ds.world_low_rwi.population, 0.0);
    }

    #[test]
    fn test_country_bounds_fall_back_to_districts() {
        let ds = dataset();
        let bbox = ds.country_bounds("KEN").unwrap();
        assert_eq!(bbox.min, DVec2::new(0.0, 0.0));
        assert_eq!(bbox.max, DVec2::new(4.0, 1.0));
        assert!(ds.country_bounds("NGA").is_none());
    }

    #[test]
    fn test_rejoin_changes_cutoff() {
        let mut ds = dataset();
        ds.rejoin(Year::new(2015), -2.0);
        assert_eq!(ds.year.get(), 2015);
        assert_eq!(ds.world_low_rwi.population, 0.0);
        assert!(!ds.districts[0].low_rwi);
    }
}
