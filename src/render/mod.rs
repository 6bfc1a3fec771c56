// src/render/mod.rs
pub mod classification;
pub mod colormap;
pub mod raster;
pub mod text;

pub use classification::legend_entries;
pub use colormap::Colormap;
pub use raster::{LegendEntry, RasterRenderer};
