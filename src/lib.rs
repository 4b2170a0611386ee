//! Terminal choropleth of electricity access.
//!
//! District shapes are joined to per-district access records, rolled up
//! to countries and the world, and drawn as colored terminal cells with
//! braille outlines.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod map;
pub mod scale;
pub mod ui;
