// src/lib.rs
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod jobs;
pub mod model;
pub mod pipeline;
pub mod processing;
pub mod render;
pub mod report;
pub mod services;
pub mod utils;

pub use error::{Error, ErrorKind, Result};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
