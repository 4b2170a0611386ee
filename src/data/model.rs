use serde::{Deserialize, Deserializer};

pub const FIRST_YEAR: u16 = 2012;
pub const LAST_YEAR: u16 = 2020;
pub const YEAR_COUNT: usize = (LAST_YEAR - FIRST_YEAR + 1) as usize;

/// A survey year in `FIRST_YEAR..=LAST_YEAR`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(u16);

impl Year {
    pub const LATEST: Year = Year(LAST_YEAR);

    /// Clamp any year into the covered range
    pub fn new(year: u16) -> Self {
        Year(year.clamp(FIRST_YEAR, LAST_YEAR))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Offset into per-year arrays
    pub fn index(self) -> usize {
        (self.0 - FIRST_YEAR) as usize
    }

    pub fn next(self) -> Self {
        Year::new(self.0.saturating_add(1))
    }

    pub fn prev(self) -> Self {
        Year::new(self.0.saturating_sub(1))
    }

    pub fn all() -> impl Iterator<Item = Year> {
        (FIRST_YEAR..=LAST_YEAR).map(Year)
    }
}

impl Default for Year {
    fn default() -> Self {
        Year::LATEST
    }
}

/// Ids show up as strings in some exports and as numbers in others
fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
        Float(f64),
    }
    Ok(match Id::deserialize(d)? {
        Id::Str(s) => s,
        Id::Int(i) => i.to_string(),
        Id::Float(f) => f.to_string(),
    })
}

/// Raw district row as exported (one field per year)
#[derive(Deserialize)]
struct RawAccessRecord {
    #[serde(deserialize_with = "id_string")]
    adm2_id: String,
    #[serde(default)]
    adm2_name: String,
    #[serde(rename = "TotPopulation")]
    tot_population: f64,
    #[serde(rename = "PopAccess2012")]
    pop_access_2012: f64,
    #[serde(rename = "PopAccess2013")]
    pop_access_2013: f64,
    #[serde(rename = "PopAccess2014")]
    pop_access_2014: f64,
    #[serde(rename = "PopAccess2015")]
    pop_access_2015: f64,
    #[serde(rename = "PopAccess2016")]
    pop_access_2016: f64,
    #[serde(rename = "PopAccess2017")]
    pop_access_2017: f64,
    #[serde(rename = "PopAccess2018")]
    pop_access_2018: f64,
    #[serde(rename = "PopAccess2019")]
    pop_access_2019: f64,
    #[serde(rename = "PopAccess2020")]
    pop_access_2020: f64,
    #[serde(rename = "RWI", default)]
    rwi: Option<f64>,
}

/// Electricity access for one district
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawAccessRecord")]
pub struct AccessRecord {
    pub adm2_id: String,
    pub adm2_name: String,
    pub tot_population: f64,
    /// Population with access, indexed by `Year::index`
    pub pop_access: [f64; YEAR_COUNT],
    pub rwi: Option<f64>,
}

impl From<RawAccessRecord> for AccessRecord {
    fn from(r: RawAccessRecord) -> Self {
        Self {
            adm2_id: r.adm2_id,
            adm2_name: r.adm2_name,
            tot_population: r.tot_population,
            pop_access: [
                r.pop_access_2012,
                r.pop_access_2013,
                r.pop_access_2014,
                r.pop_access_2015,
                r.pop_access_2016,
                r.pop_access_2017,
                r.pop_access_2018,
                r.pop_access_2019,
                r.pop_access_2020,
            ],
            rwi: r.rwi,
        }
    }
}

impl AccessRecord {
    pub fn access(&self, year: Year) -> f64 {
        self.pop_access[year.index()]
    }

    pub fn pct_access(&self, year: Year) -> Option<f64> {
        pct(self.access(year), self.tot_population)
    }

    pub fn no_access(&self, year: Year) -> f64 {
        self.tot_population - self.access(year)
    }

    /// Whether the district counts as a poor region for the given cutoff
    pub fn is_low_rwi(&self, cutoff: f64) -> bool {
        self.rwi.is_some_and(|r| r < cutoff)
    }
}

pub(crate) fn pct(part: f64, total: f64) -> Option<f64> {
    (total > 0.0).then(|| part * 100.0 / total)
}

/// Population totals rolled up from districts
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Totals {
    pub population: f64,
    pub access: [f64; YEAR_COUNT],
}

impl Totals {
    pub fn add_record(&mut self, record: &AccessRecord) {
        self.population += record.tot_population;
        for (sum, v) in self.access.iter_mut().zip(record.pop_access.iter()) {
            *sum += v;
        }
    }

    pub fn add(&mut self, other: &Totals) {
        self.population += other.population;
        for (sum, v) in self.access.iter_mut().zip(other.access.iter()) {
            *sum += v;
        }
    }

    pub fn pct_access(&self, year: Year) -> Option<f64> {
        pct(self.access[year.index()], self.population)
    }

    pub fn no_access(&self, year: Year) -> f64 {
        self.population - self.access[year.index()]
    }
}

/// Country rollup, all districts and the low-RWI subset
#[derive(Clone, Debug, PartialEq)]
pub struct CountryAccess {
    pub country_id: String,
    pub name: String,
    pub all: Totals,
    pub low_rwi: Totals,
    pub districts: usize,
}

impl CountryAccess {
    pub fn pct_access(&self, year: Year) -> Option<f64> {
        self.all.pct_access(year)
    }

    pub fn no_access(&self, year: Year) -> f64 {
        self.all.no_access(year)
    }
}

/// A funded project location
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProjectRecord {
    #[serde(rename = "Lead Country")]
    pub lead_country: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CountryProjectSummary {
    #[serde(rename = "Lead Country")]
    pub lead_country: String,
    #[serde(rename = "Grant Amount", default)]
    pub grant_amount: f64,
    #[serde(rename = "Expenses", default)]
    pub expenses: f64,
    #[serde(rename = "Number of projects", default)]
    pub projects: u32,
}

/// National estimate for one year
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TimeSeriesPoint {
    pub year: u16,
    pub country: String,
    pub pop: f64,
    #[serde(rename = "pct_pop_elec_HREA")]
    pub pct: f64,
    #[serde(rename = "pct_pop_elec_HREA_low", default)]
    pub pct_low: Option<f64>,
    #[serde(rename = "pct_pop_elec_HREA_high", default)]
    pub pct_high: Option<f64>,
}

impl TimeSeriesPoint {
    pub fn no_access(&self) -> f64 {
        (self.pop * (100.0 - self.pct) / 100.0).round()
    }
}

/// Country naming and reference coordinates
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TaxonomyEntry {
    #[serde(rename = "Alpha-3 code-1")]
    pub iso3: String,
    #[serde(rename = "Country or Area")]
    pub name: String,
    #[serde(rename = "Latitude (average)", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude (average)", default)]
    pub longitude: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tot: f64, access: f64, rwi: Option<f64>) -> AccessRecord {
        AccessRecord {
            adm2_id: "X".into(),
            adm2_name: "X".into(),
            tot_population: tot,
            pop_access: [access; YEAR_COUNT],
            rwi,
        }
    }

    #[test]
    fn test_year_clamps() {
        assert_eq!(Year::new(1999).get(), FIRST_YEAR);
        assert_eq!(Year::new(2030).get(), LAST_YEAR);
        assert_eq!(Year::LATEST.next(), Year::LATEST);
        assert_eq!(Year::new(2012).prev().get(), 2012);
        assert_eq!(Year::new(2015).index(), 3);
        assert_eq!(Year::all().count(), YEAR_COUNT);
    }

    #[test]
    fn test_record_metrics() {
        let r = record(200.0, 150.0, Some(-0.4));
        assert_eq!(r.pct_access(Year::LATEST), Some(75.0));
        assert_eq!(r.no_access(Year::LATEST), 50.0);
        assert!(r.is_low_rwi(0.0));
        assert!(!r.is_low_rwi(-0.5));
        assert!(!record(1.0, 1.0, None).is_low_rwi(0.0));
    }

    #[test]
    fn test_zero_population_has_no_pct() {
        assert_eq!(record(0.0, 0.0, None).pct_access(Year::LATEST), None);
        assert_eq!(Totals::default().pct_access(Year::LATEST), None);
    }

    #[test]
    fn test_deserialize_numeric_id() {
        let mut json = br#"{"adm2_id": 4012, "adm2_name": "Kano", "TotPopulation": 10,
            "PopAccess2020": 9, "PopAccess2019": 8, "PopAccess2018": 7, "PopAccess2017": 6,
            "PopAccess2016": 5, "PopAccess2015": 4, "PopAccess2014": 3, "PopAccess2013": 2,
            "PopAccess2012": 1}"#
            .to_vec();
        let r: AccessRecord = simd_json::serde::from_slice(&mut json).unwrap();
        assert_eq!(r.adm2_id, "4012");
        assert_eq!(r.pop_access[0], 1.0);
        assert_eq!(r.access(Year::LATEST), 9.0);
        assert_eq!(r.rwi, None);
    }

    #[test]
    fn test_time_series_no_access() {
        let p = TimeSeriesPoint {
            year: 2020,
            country: "Kenya".into(),
            pop: 1_000.0,
            pct: 71.4,
            pct_low: None,
            pct_high: None,
        };
        assert_eq!(p.no_access(), 286.0);
    }
}
