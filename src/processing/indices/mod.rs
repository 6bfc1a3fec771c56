// src/processing/indices/mod.rs
pub mod ndi;
pub mod ratio;
pub mod rgb;

use ndarray::Array2;

use crate::model::BandPlane;
use crate::render::colormap::Colormap;

// Re-export indices
pub use ndi::NormalizedDifference;
pub use ratio::BandRatio;
pub use rgb::{RgbComposite, TrueColor, DEFAULT_CLIP_LIMIT};

/// A band arithmetic formula over bands picked by nominal wavelength.
pub trait IndexCalculator: Send + Sync {
    /// Nominal wavelengths (nm) of the input bands, in the order `calculate` expects them.
    fn wavelengths(&self) -> &[f32];

    /// Apply the formula. All planes share one shape and the result keeps it.
    fn calculate(&self, bands: &[BandPlane<'_>]) -> Array2<f32>;

    fn name(&self) -> &str;
}

/// Floor at zero. NaN passes through untouched, unlike `f32::max`.
#[inline]
pub(crate) fn floor_zero(v: f32) -> f32 {
    if v < 0.0 {
        0.0
    } else {
        v
    }
}

/// How an index is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySpec {
    pub title: &'static str,
    pub colormap: Colormap,
    pub show_axes: bool,
}

/// Output of one index formula, ready for the renderer.
#[derive(Debug, Clone)]
pub struct IndexResult {
    pub kind: IndexKind,
    pub data: Array2<f32>,
    pub display: DisplaySpec,
}

/// The fixed set of scalar indices that make up the report, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Ndvi,
    IronOxide,
    AlOh,
    Feooh,
    Aai,
    Ais,
    Dos2,
}

impl IndexKind {
    pub const ALL: [IndexKind; 7] = [
        IndexKind::Ndvi,
        IndexKind::IronOxide,
        IndexKind::AlOh,
        IndexKind::Feooh,
        IndexKind::Aai,
        IndexKind::Ais,
        IndexKind::Dos2,
    ];

    pub fn calculator(&self) -> Box<dyn IndexCalculator> {
        match self {
            IndexKind::Ndvi => Box::new(NormalizedDifference::new(850.0, 650.0, Some("NDVI".into()))),
            IndexKind::IronOxide => Box::new(BandRatio::new(850.0, 650.0, Some("Iron Oxide".into()))),
            IndexKind::AlOh => Box::new(BandRatio::new(2200.0, 1700.0, Some("AlOH".into()))),
            IndexKind::Feooh => Box::new(BandRatio::new(970.0, 900.0, Some("FEOOH".into()))),
            IndexKind::Aai => Box::new(BandRatio::new(2200.0, 2100.0, Some("AAI".into()))),
            IndexKind::Ais => Box::new(BandRatio::new(2200.0, 2300.0, Some("AIS".into()))),
            IndexKind::Dos2 => Box::new(NormalizedDifference::new(790.0, 720.0, Some("DOS-2".into()))),
        }
    }

    pub fn display(&self) -> DisplaySpec {
        let (title, colormap, show_axes) = match self {
            IndexKind::Ndvi => ("NDVI: Normalized Difference Vegetation Index", Colormap::Brg, false),
            IndexKind::IronOxide => ("Iron Oxide Index", Colormap::Rainbow, false),
            IndexKind::AlOh => ("AlOH Index", Colormap::Rainbow, false),
            IndexKind::Feooh => ("Ferric Oxide-Oxyhydroxide Clay Index (FEOOH)", Colormap::Rainbow, false),
            IndexKind::Aai => ("Argillic Alteration Index", Colormap::Rainbow, false),
            IndexKind::Ais => ("Argillic and Sericitic Alteration Index", Colormap::Rainbow, false),
            IndexKind::Dos2 => ("Red Edge Position 3", Colormap::Rainbow, true),
        };
        DisplaySpec {
            title,
            colormap,
            show_axes,
        }
    }

    /// Intermediate raster file name inside the run folder.
    pub fn file_name(&self) -> &'static str {
        match self {
            IndexKind::Ndvi => "ndvi.png",
            IndexKind::IronOxide => "iron_oxide.png",
            IndexKind::AlOh => "alunite.png",
            IndexKind::Feooh => "FEOOH.png",
            IndexKind::Aai => "AAI.png",
            IndexKind::Ais => "AIS.png",
            IndexKind::Dos2 => "DOS.png",
        }
    }
}
