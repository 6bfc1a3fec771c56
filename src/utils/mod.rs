// src/utils/mod.rs
pub mod scaling;
