// src/pipeline.rs
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::io::writer::{classification_paths, create_run_folder, remove_with_extension};
use crate::io::{read_mineral_groups, read_reflectance};
use crate::model::{
    BoundingBox, ClassificationPair, Credentials, DateRange, ProductType, ReflectanceCube, ReportMetadata,
};
use crate::processing::IndexEngine;
use crate::render::text::load_font;
use crate::render::RasterRenderer;
use crate::report::{ReportAssembler, ReportImages, RASTER_EXTENSION, REPORT_EXTENSION};
use crate::services::{Acquisition, CmrAcquisition, PlaceResolver};

/// A full run: search, download, report and mineral maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub credentials: Credentials,
    pub bbox: BoundingBox,
    pub dates: DateRange,
}

/// A run over granules that are already on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalRequest {
    pub reflectance: PathBuf,
    #[serde(default)]
    pub mineral: Option<PathBuf>,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub date_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub folder: PathBuf,
    pub report_path: PathBuf,
    pub classification_paths: Vec<PathBuf>,
    pub place_name: String,
}

pub struct Pipeline {
    config: AppConfig,
    renderer: RasterRenderer,
    assembler: ReportAssembler,
    places: PlaceResolver,
    acquisition: Box<dyn Acquisition + Send + Sync>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Result<Self> {
        let places = PlaceResolver::from_config(&config.geocoder, config.places_path.as_deref())?;
        let acquisition = Box::new(CmrAcquisition::new(config.acquisition.clone())?);
        Ok(Self::with_collaborators(config, acquisition, places))
    }

    pub fn with_collaborators(
        config: AppConfig,
        acquisition: Box<dyn Acquisition + Send + Sync>,
        places: PlaceResolver,
    ) -> Self {
        let font = load_font(config.font_path.as_deref());
        let renderer = RasterRenderer::new(config.render.clone(), font);
        let assembler = ReportAssembler::new(config.logo_path.clone());
        Self {
            config,
            renderer,
            assembler,
            places,
            acquisition,
        }
    }

    pub fn run(&self, request: &RunRequest) -> Result<RunOutcome> {
        let discriminator = format!("{},{}", request.dates.start, request.dates.end);
        let folder = create_run_folder(&self.config.data_dir, &request.bbox, &discriminator)?;
        info!(folder = %folder.display(), "initializing run");

        let result = self.run_in(&folder, request);
        if result.is_err() {
            discard_intermediates(&folder);
        }
        result
    }

    fn run_in(&self, folder: &Path, request: &RunRequest) -> Result<RunOutcome> {
        let reflectance = self.acquisition.locate_and_fetch(
            &request.credentials,
            &request.bbox,
            &request.dates,
            ProductType::Reflectance,
            folder,
        )?;
        let cube = read_reflectance(&reflectance.path)?;
        let (report_path, place_name) = self.report(
            &cube,
            folder,
            &reflectance.file_name,
            &reflectance.date_label,
            &request.bbox,
        )?;
        drop(cube);

        let mineral = self.acquisition.locate_and_fetch(
            &request.credentials,
            &request.bbox,
            &request.dates,
            ProductType::Mineral,
            folder,
        )?;
        let classification_paths = self.minerals(&mineral.path, folder)?;

        info!("finished processing");
        Ok(RunOutcome {
            folder: folder.to_path_buf(),
            report_path,
            classification_paths,
            place_name,
        })
    }

    pub fn process_local(&self, request: &LocalRequest) -> Result<RunOutcome> {
        let cube = read_reflectance(&request.reflectance)?;
        self.process_cube(&cube, request)
    }

    /// Report and mineral maps for a reflectance cube already in memory.
    /// `request.reflectance` only names the granule and keys the run folder.
    pub fn process_cube(&self, cube: &ReflectanceCube, request: &LocalRequest) -> Result<RunOutcome> {
        let image_name = file_name(&request.reflectance);
        let folder = create_run_folder(&self.config.data_dir, &request.bbox, &image_name)?;
        info!(folder = %folder.display(), granule = %image_name, "processing local granules");

        let result = (|| -> Result<RunOutcome> {
            let date_label = request.date_label.as_deref().unwrap_or("unknown");
            let (report_path, place_name) = self.report(cube, &folder, &image_name, date_label, &request.bbox)?;

            let classification_paths = match &request.mineral {
                Some(path) => self.minerals(path, &folder)?,
                None => Vec::new(),
            };
            Ok(RunOutcome {
                folder: folder.clone(),
                report_path,
                classification_paths,
                place_name,
            })
        })();

        if result.is_err() {
            discard_intermediates(&folder);
        }
        result
    }

    /// Render every index into `folder`. Products are computed and rendered
    /// one at a time, in report order.
    pub fn render_indices(&self, cube: &ReflectanceCube, folder: &Path) -> Result<ReportImages> {
        let engine = IndexEngine::new(cube);
        let images = ReportImages::in_folder(folder);

        info!("RGB image");
        let rgb = engine.true_color(self.renderer.config().clip_limit)?;
        self.renderer.render_rgb(&rgb, &images.rgb)?;

        for (kind, path) in &images.indices {
            info!(index = kind.calculator().name(), "index image");
            let result = engine.compute(*kind)?;
            self.renderer.render_index(&result, path)?;
        }
        Ok(images)
    }

    /// Render the indices and assemble the report. Returns the report path and the cover place name.
    pub fn report(
        &self,
        cube: &ReflectanceCube,
        folder: &Path,
        image_name: &str,
        date_label: &str,
        bbox: &BoundingBox,
    ) -> Result<(PathBuf, String)> {
        let images = self.render_indices(cube, folder)?;

        info!("generating report");
        let place_name = self.places.resolve(bbox.lat1, bbox.lon1);
        let metadata = ReportMetadata {
            image_name: image_name.to_string(),
            acquisition_date: date_label.to_string(),
            bbox: *bbox,
            place_name: place_name.clone(),
        };
        let report_path = self.assembler.assemble(&images, &metadata, folder)?;
        Ok((report_path, place_name))
    }

    /// The four classification images for a mineral granule.
    pub fn minerals(&self, granule: &Path, folder: &Path) -> Result<Vec<PathBuf>> {
        info!("mineral classification images");
        let groups = read_mineral_groups(granule)?;
        self.render_minerals(&groups, &file_name(granule), folder)
    }

    /// Band depth and mineral id images for both groups, named after `granule_name`.
    pub fn render_minerals(
        &self,
        groups: &[ClassificationPair; 2],
        granule_name: &str,
        folder: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(4);
        for (group, pair) in ["group_1", "group_2"].iter().zip(groups.iter()) {
            let (band_path, id_path) = classification_paths(folder, granule_name, group);
            self.renderer.render_classification(pair, &band_path, &id_path)?;
            written.push(band_path);
            written.push(id_path);
        }
        Ok(written)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A failed run keeps neither its rasters nor a report assembled before the failure.
fn discard_intermediates(folder: &Path) {
    for extension in [RASTER_EXTENSION, REPORT_EXTENSION] {
        if let Err(err) = remove_with_extension(folder, extension) {
            warn!(folder = %folder.display(), error = %err, "could not clean up after failed run");
        }
    }
}

