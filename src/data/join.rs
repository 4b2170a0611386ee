//! Joins district shapes to access records and rolls figures up.

use crate::data::model::{AccessRecord, CountryAccess, Totals, Year};
use crate::data::shape::Shape;
use crate::data::Taxonomy;
use crate::scale::{no_access_scale, pct_scale, Rgb};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Feature ids for districts start here, countries start at 1
pub const DISTRICT_ID_BASE: u32 = 1000;

/// `adm2_id` -> record position, first occurrence wins
#[derive(Clone, Debug, Default)]
pub struct AccessIndex {
    by_id: HashMap<String, usize>,
}

impl AccessIndex {
    pub fn build(records: &[AccessRecord]) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            by_id.entry(r.adm2_id.clone()).or_insert(i);
        }
        Self { by_id }
    }

    pub fn get(&self, adm2_id: &str) -> Option<usize> {
        self.by_id.get(adm2_id).copied()
    }
}

/// Derived per-district figures for one year
#[derive(Clone, Debug, PartialEq)]
pub struct District {
    pub id: u32,
    /// Matching row in the access table
    pub record: Option<usize>,
    pub pct_access: Option<f64>,
    pub pop_access: Option<f64>,
    pub no_access: Option<f64>,
    pub total_pop: Option<f64>,
    pub low_rwi: bool,
    pub pct_color: Rgb,
    pub no_access_color: Rgb,
}

/// Attach access figures and layer colors to every district shape
pub fn join_districts(
    shapes: &[Shape],
    records: &[AccessRecord],
    index: &AccessIndex,
    year: Year,
    rwi_cutoff: f64,
) -> Vec<District> {
    let pct = pct_scale();
    let no_access = no_access_scale();

    shapes
        .par_iter()
        .enumerate()
        .map(|(i, shape)| {
            let record = shape
                .props
                .adm2_id
                .as_deref()
                .and_then(|id| index.get(id))
                .filter(|&r| r < records.len());
            let row = record.map(|r| &records[r]);

            let pct_access = row.and_then(|r| r.pct_access(year));
            let no_access_pop = row.map(|r| r.no_access(year));
            District {
                id: DISTRICT_ID_BASE + i as u32,
                record,
                pct_access,
                pop_access: row.map(|r| r.access(year)),
                no_access: no_access_pop,
                total_pop: row.map(|r| r.tot_population),
                low_rwi: row.is_some_and(|r| r.is_low_rwi(rwi_cutoff)),
                pct_color: pct.color(pct_access),
                no_access_color: no_access.color(no_access_pop),
            }
        })
        .collect()
}

/// Sum matched districts into their countries, sorted by ISO code
pub fn country_rollups(
    shapes: &[Shape],
    districts: &[District],
    records: &[AccessRecord],
    taxonomy: &Taxonomy,
    rwi_cutoff: f64,
) -> Vec<CountryAccess> {
    let mut countries: BTreeMap<&str, CountryAccess> = BTreeMap::new();

    for (shape, district) in shapes.iter().zip(districts) {
        let (Some(iso), Some(r)) = (shape.props.iso_3.as_deref(), district.record) else {
            continue;
        };
        let record = &records[r];
        let entry = countries.entry(iso).or_insert_with(|| CountryAccess {
            country_id: iso.to_string(),
            name: taxonomy
                .by_iso(iso)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| iso.to_string()),
            all: Totals::default(),
            low_rwi: Totals::default(),
            districts: 0,
        });
        entry.all.add_record(record);
        if record.is_low_rwi(rwi_cutoff) {
            entry.low_rwi.add_record(record);
        }
        entry.districts += 1;
    }

    countries.into_values().collect()
}

/// World totals: (all districts, low-RWI districts)
pub fn world_rollup(countries: &[CountryAccess]) -> (Totals, Totals) {
    countries.iter().fold(
        (Totals::default(), Totals::default()),
        |(mut all, mut low), c| {
            all.add(&c.all);
            low.add(&c.low_rwi);
            (all, low)
        },
    )
}
