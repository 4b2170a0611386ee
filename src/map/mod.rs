mod geometry;
pub mod projection;
pub mod raster;
mod renderer;
pub mod spatial;

pub use projection::Viewport;
pub use renderer::{
    DisplaySettings, Hovered, Layer, MapLayers, MapRenderer, PaintState, DISTRICT_DETAIL_ZOOM,
};
