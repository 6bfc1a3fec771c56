// src/services/mod.rs
pub mod acquisition;
pub mod geocode;

pub use acquisition::{Acquisition, CmrAcquisition, FetchedGranule};
pub use geocode::{NominatimNamer, OfflineNamer, PlaceNamer, PlaceResolver};
