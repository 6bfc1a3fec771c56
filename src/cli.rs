use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::{BoundingBox, DateRange};

#[derive(Parser)]
#[command(name = "emit-report")]
#[command(about = "Geology reports from EMIT hyperspectral granules")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the directory run folders are created in
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search, download and report on the granules covering a location
    Run {
        /// Earthdata user name
        #[arg(short, long)]
        user: String,

        /// Earthdata password
        #[arg(short, long)]
        password: String,

        /// Date range: START,END (YYYY-MM-DD)
        #[arg(short, long)]
        dates: DateRange,

        /// Location: LAT,LON or LAT1,LON1,LAT2,LON2
        #[arg(short, long, allow_hyphen_values = true)]
        bbox: BoundingBox,
    },

    /// Report on granules that are already on disk
    Process {
        /// L2A reflectance granule (.nc)
        #[arg(short, long)]
        reflectance: PathBuf,

        /// L2B mineral granule (.nc)
        #[arg(short, long)]
        mineral: Option<PathBuf>,

        /// Location: LAT,LON or LAT1,LON1,LAT2,LON2
        #[arg(short, long, allow_hyphen_values = true)]
        bbox: BoundingBox,

        /// Acquisition date printed on the cover
        #[arg(long)]
        date: Option<String>,
    },

    /// Run a JSON list of jobs through the job queue
    Batch {
        /// Batch file
        #[arg(short, long)]
        jobs: PathBuf,
    },
}
