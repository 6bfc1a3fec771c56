// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_mineral_groups, read_reflectance};
pub use writer::{create_run_folder, remove_with_extension};
