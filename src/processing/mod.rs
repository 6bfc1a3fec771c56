// src/processing/mod.rs
pub mod band;
pub mod contrast;
pub mod engine;
pub mod indices;

// Re-export main components
pub use band::select_band;
pub use engine::IndexEngine;
