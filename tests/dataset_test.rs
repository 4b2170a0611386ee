//! Loading a data directory end to end

use std::fs;
use std::path::Path;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use access_map::data::model::Year;
use access_map::data::{
    Dataset, ACCESS_FILE, COUNTRY_SHAPES_FILE, DISTRICT_SHAPES_FILE, PROJECTS_FILE, TAXONOMY_FILE,
    TIME_SERIES_FILE,
};
use access_map::error::DataError;

const DISTRICT_TOPOLOGY: &str = r#"{
  "type": "Topology",
  "arcs": [
    [[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]],
    [[2, 0], [3, 0], [3, 1], [2, 1], [2, 0]]
  ],
  "objects": {
    "combined_polygon_vlight": {
      "type": "GeometryCollection",
      "geometries": [
        {"type": "Polygon", "arcs": [[0]],
         "properties": {"adm2_id": 1, "adm2_name": "Alpha", "adm1_name": "North", "iso_3": "KEN"}},
        {"type": "Polygon", "arcs": [[1]],
         "properties": {"adm2_id": "2", "adm2_name": " ", "adm1_name": "South", "iso_3": "KEN"}},
        {"type": "Polygon", "arcs": [[-2]],
         "properties": {"adm2_id": "99", "iso_3": "KEN"}}
      ]
    }
  }
}"#;

const COUNTRY_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [{
    "type": "Feature",
    "properties": {"iso_3": "KEN"},
    "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [3, 0], [3, 1], [0, 1], [0, 0]]]}
  }]
}"#;

const TAXONOMY: &str = r#"[
  {"Alpha-3 code-1": "KEN", "Country or Area": "Kenya",
   "Latitude (average)": 0.5, "Longitude (average)": 1.5}
]"#;

const TIME_SERIES: &str = r#"[
  {"year": 2020, "country": "Kenya", "pop": 1000, "pct_pop_elec_HREA": 70.0},
  {"year": 2012, "country": "Kenya", "pop": 900, "pct_pop_elec_HREA": 40.0,
   "pct_pop_elec_HREA_low": 35.0, "pct_pop_elec_HREA_high": 45.0}
]"#;

fn access_row(id: &str, total: f64, access_2012: f64, per_year: f64, rwi: f64) -> String {
    let years: Vec<String> = (0..9)
        .map(|i| format!("\"PopAccess{}\": {}", 2012 + i, access_2012 + per_year * i as f64))
        .collect();
    format!(
        "{{\"adm2_id\": {id}, \"adm2_name\": \"n{id}\", \"TotPopulation\": {total}, {}, \"RWI\": {rwi}}}",
        years.join(", ")
    )
}

fn access_json() -> String {
    let rows = [
        access_row("1", 100.0, 20.0, 10.0, -0.5),
        access_row("\"2\"", 300.0, 150.0, 0.0, 0.4),
        // Duplicate id: the first row wins
        access_row("1", 1_000.0, 0.0, 0.0, -0.5),
    ];
    format!("[{}]", rows.join(",\n"))
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("write fixture file");
}

#[fixture]
fn data_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), DISTRICT_SHAPES_FILE, DISTRICT_TOPOLOGY);
    write(temp.path(), COUNTRY_SHAPES_FILE, COUNTRY_GEOJSON);
    write(temp.path(), ACCESS_FILE, &access_json());
    write(temp.path(), TAXONOMY_FILE, TAXONOMY);
    write(temp.path(), TIME_SERIES_FILE, TIME_SERIES);
    temp
}

#[rstest]
fn test_load_decodes_both_shape_formats(data_dir: TempDir) {
    let ds = Dataset::load(data_dir.path(), Year::LATEST, 0.0).unwrap();

    assert_eq!(ds.district_shapes.len(), 3);
    assert_eq!(ds.country_shapes.len(), 1);
    assert_eq!(ds.district_shapes[0].props.adm2_id.as_deref(), Some("1"));
    assert_eq!(ds.district_shapes[1].props.display_name(), Some("South"));
    assert_eq!(ds.districts[2].id, 1002);
    assert_eq!(ds.districts[2].record, None);
    assert!(ds.country_shapes[0].contains(glam::DVec2::new(2.5, 0.5)));
}

#[rstest]
#[case(2020, 62.5, 100.0)]
#[case(2016, 52.5, 60.0)]
#[case(2012, 42.5, 20.0)]
fn test_country_rollup_per_year(
    data_dir: TempDir,
    #[case] year: u16,
    #[case] pct: f64,
    #[case] low_rwi_pct: f64,
) {
    let ds = Dataset::load(data_dir.path(), Year::new(year), 0.0).unwrap();
    let ken = ds.country("KEN").unwrap();

    assert_eq!(ken.name, "Kenya");
    assert_eq!(ken.districts, 2);
    assert_eq!(ken.all.population, 400.0);
    assert_eq!(ken.pct_access(ds.year), Some(pct));
    assert_eq!(ken.low_rwi.population, 100.0);
    assert_eq!(ken.low_rwi.pct_access(ds.year), Some(low_rwi_pct));
    assert_eq!(ds.world.population, 400.0);
}

#[rstest]
fn test_first_duplicate_record_wins(data_dir: TempDir) {
    let ds = Dataset::load(data_dir.path(), Year::LATEST, 0.0).unwrap();
    let first = &ds.districts[0];
    assert_eq!(first.total_pop, Some(100.0));
    assert_eq!(first.pct_access, Some(100.0));
}

#[rstest]
fn test_rwi_cutoff_moves_districts_into_low_wealth(data_dir: TempDir) {
    let ds = Dataset::load(data_dir.path(), Year::LATEST, 0.5).unwrap();
    assert_eq!(ds.country("KEN").unwrap().low_rwi.population, 400.0);
}

#[rstest]
fn test_time_series_sorted_by_year(data_dir: TempDir) {
    let ds = Dataset::load(data_dir.path(), Year::LATEST, 0.0).unwrap();
    let series = ds.series_for("Kenya");
    let years: Vec<u16> = series.iter().map(|p| p.year).collect();
    assert_eq!(years, vec![2012, 2020]);
    assert_eq!(series[0].pct_high, Some(45.0));
    assert_eq!(ds.series_point("Kenya", 2020).unwrap().no_access(), 300.0);
}

#[rstest]
fn test_missing_optional_files_are_empty(data_dir: TempDir) {
    fs::remove_file(data_dir.path().join(TIME_SERIES_FILE)).unwrap();
    fs::remove_file(data_dir.path().join(TAXONOMY_FILE)).unwrap();
    write(data_dir.path(), PROJECTS_FILE, "{ not json");

    let ds = Dataset::load(data_dir.path(), Year::LATEST, 0.0).unwrap();
    assert!(ds.time_series.is_empty());
    assert!(ds.projects.is_empty());
    // Without a taxonomy the ISO code stands in for the name
    assert_eq!(ds.country("KEN").unwrap().name, "KEN");
}

#[rstest]
fn test_missing_directory() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope");
    let err = Dataset::load(&missing, Year::LATEST, 0.0).err().unwrap();
    assert!(matches!(err, DataError::MissingDir(p) if p == missing));
}

#[rstest]
fn test_broken_access_file_is_a_parse_error(data_dir: TempDir) {
    write(data_dir.path(), ACCESS_FILE, "[{\"adm2_id\": 1}]");
    let err = Dataset::load(data_dir.path(), Year::LATEST, 0.0).err().unwrap();
    assert!(matches!(err, DataError::Parse { .. }), "got {err:?}");
}

#[rstest]
fn test_missing_required_file_is_io_error(data_dir: TempDir) {
    fs::remove_file(data_dir.path().join(DISTRICT_SHAPES_FILE)).unwrap();
    let err = Dataset::load(data_dir.path(), Year::LATEST, 0.0).err().unwrap();
    assert!(matches!(err, DataError::Io { .. }));
}
