// src/report/mod.rs
//! Paginated report: a cover page with the true colour composite followed by
//! one page per index. The page list is built first and written by [`pdf`].

pub mod captions;
pub mod pdf;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::io::writer::remove_with_extension;
use crate::model::ReportMetadata;
use crate::processing::indices::IndexKind;

pub const REPORT_TITLE: &str = "EMIT Geology Report";
pub const REPORT_EXTENSION: &str = "pdf";
pub const RASTER_EXTENSION: &str = "png";

/// Scale applied to the native pixel size of the cover image.
pub const COVER_SCALE: f32 = 0.21;
/// Scale applied to the native pixel size of index images.
pub const PAGE_SCALE: f32 = 0.20;

/// Rendered rasters feeding the report.
#[derive(Debug, Clone)]
pub struct ReportImages {
    pub rgb: PathBuf,
    pub indices: Vec<(IndexKind, PathBuf)>,
}

impl ReportImages {
    /// Conventional file names inside a run folder.
    pub fn in_folder(folder: &Path) -> Self {
        Self {
            rgb: folder.join("rgb.png"),
            indices: IndexKind::ALL
                .iter()
                .map(|kind| (*kind, folder.join(kind.file_name())))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cover {
    pub title: String,
    pub image_name: String,
    pub acquisition_date: String,
    pub coordinates: String,
    pub zone: String,
    pub logo: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub heading: String,
    pub caption: Vec<String>,
    pub image: Option<PathBuf>,
    pub image_scale: f32,
    pub cover: Option<Cover>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub pages: Vec<Page>,
}

impl Report {
    pub fn build(images: &ReportImages, metadata: &ReportMetadata, logo: Option<&Path>) -> Result<Self> {
        if images.indices.len() != IndexKind::ALL.len() {
            return Err(Error::invalid_input(format!(
                "report needs {} index images, got {}",
                IndexKind::ALL.len(),
                images.indices.len()
            )));
        }

        let (lat, lon) = metadata.bbox.center();
        let cover = Page {
            heading: REPORT_TITLE.to_string(),
            caption: Vec::new(),
            image: Some(images.rgb.clone()),
            image_scale: COVER_SCALE,
            cover: Some(Cover {
                title: REPORT_TITLE.to_string(),
                image_name: metadata.image_name.clone(),
                acquisition_date: metadata.acquisition_date.clone(),
                coordinates: format!("{lat} | {lon}"),
                zone: metadata.place_name.clone(),
                logo: logo.map(Path::to_path_buf),
            }),
        };

        let mut pages = vec![cover];
        for (kind, path) in &images.indices {
            pages.push(Page {
                heading: captions::heading(*kind).to_string(),
                caption: captions::caption(*kind).iter().map(|l| l.to_string()).collect(),
                image: Some(path.clone()),
                image_scale: PAGE_SCALE,
                cover: None,
            });
        }

        Ok(Self { pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Builds the report, writes it as `<image stem>.pdf` into `folder` and
/// removes the intermediate rasters there.
pub struct ReportAssembler {
    logo: Option<PathBuf>,
}

impl ReportAssembler {
    pub fn new(logo: Option<PathBuf>) -> Self {
        Self { logo }
    }

    pub fn assemble(&self, images: &ReportImages, metadata: &ReportMetadata, folder: &Path) -> Result<PathBuf> {
        let report = Report::build(images, metadata, self.logo.as_deref())?;
        let report_path = folder.join(report_file_name(&metadata.image_name));

        pdf::write_pdf(&report, &report_path)?;
        info!(path = %report_path.display(), pages = report.page_count(), "report written");

        let removed = remove_with_extension(folder, RASTER_EXTENSION)?;
        info!(removed, "intermediate rasters removed");
        Ok(report_path)
    }
}

/// Source granule name with its extension swapped for `.pdf`.
pub fn report_file_name(image_name: &str) -> String {
    Path::new(image_name)
        .with_extension(REPORT_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_name_swaps_extension() {
        assert_eq!(
            report_file_name("EMIT_L2A_RFL_001_20230101T000000_2300101_001.nc"),
            "EMIT_L2A_RFL_001_20230101T000000_2300101_001.pdf"
        );
        assert_eq!(report_file_name("granule"), "granule.pdf");
    }
}
