//! Command-line configuration

use crate::app::ViewOptions;
use crate::data::model::{Year, FIRST_YEAR, LAST_YEAR};
use crate::map::Layer;
use clap::{ArgAction, Parser, ValueHint};
use std::path::PathBuf;

/// Terminal choropleth of electricity access by country and district
#[derive(Parser, Debug)]
#[command(name = "access-map")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the shape and access JSON files
    #[arg(short, long, default_value = "data", value_hint = ValueHint::DirPath)]
    pub data_dir: PathBuf,

    /// Year shown on start
    #[arg(short, long, default_value_t = LAST_YEAR, value_parser = clap::value_parser!(u16).range(FIRST_YEAR as i64..=LAST_YEAR as i64))]
    pub year: u16,

    /// Map layer: 1 = % with access, 2 = people without access, 3 = low-wealth districts
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub layer: u8,

    /// Districts above this access percentage are masked in white
    #[arg(short, long, default_value_t = 100.0)]
    pub threshold: f64,

    /// Districts with a relative wealth index below this count as low-wealth
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rwi_cutoff: f64,

    /// Show project markers on start
    #[arg(long)]
    pub projects: bool,

    /// Hide country labels
    #[arg(long)]
    pub hide_labels: bool,

    /// Log file (the terminal belongs to the map)
    #[arg(long, default_value = "access-map.log", value_hint = ValueHint::FilePath)]
    pub log_file: PathBuf,

    /// Verbosity, repeat for more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print the country rollup table and exit
    #[arg(long)]
    pub report: bool,
}

impl Cli {
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            layer: Layer::from_number(self.layer).unwrap_or_default(),
            year: Year::new(self.year),
            highlight_threshold: self.threshold.clamp(0.0, 100.0),
            rwi_cutoff: self.rwi_cutoff,
            show_projects: self.projects,
            hide_labels: self.hide_labels,
        }
    }
}
