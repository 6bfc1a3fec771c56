// src/processing/engine.rs
use tracing::debug;

use crate::error::Result;
use crate::model::{BandPlane, ReflectanceCube};
use crate::processing::band::select_band;
use crate::processing::indices::{IndexCalculator, IndexKind, IndexResult, RgbComposite, TrueColor};

/// Computes the report products from one reflectance cube. The cube is
/// only ever read.
pub struct IndexEngine<'a> {
    cube: &'a ReflectanceCube,
}

impl<'a> IndexEngine<'a> {
    pub fn new(cube: &'a ReflectanceCube) -> Self {
        Self { cube }
    }

    /// Planes for the bands nearest each requested wavelength.
    pub fn planes(&self, wavelengths: &[f32]) -> Result<Vec<BandPlane<'a>>> {
        wavelengths
            .iter()
            .map(|&nm| {
                let index = select_band(self.cube.wavelengths(), nm)?;
                debug!(
                    target_nm = nm,
                    band = index,
                    actual_nm = self.cube.wavelengths()[index],
                    "selected band"
                );
                self.cube.band(index)
            })
            .collect()
    }

    pub fn run<I: IndexCalculator + ?Sized>(&self, calculator: &I) -> Result<ndarray::Array2<f32>> {
        let planes = self.planes(calculator.wavelengths())?;
        Ok(calculator.calculate(&planes))
    }

    pub fn compute(&self, kind: IndexKind) -> Result<IndexResult> {
        let calculator = kind.calculator();
        let data = self.run(calculator.as_ref())?;
        debug!(index = calculator.name(), shape = ?data.dim(), "computed index");
        Ok(IndexResult {
            kind,
            data,
            display: kind.display(),
        })
    }

    pub fn true_color(&self, clip_limit: f32) -> Result<RgbComposite> {
        let composite = TrueColor::new(clip_limit);
        let planes = self.planes(composite.wavelengths())?;
        Ok(composite.calculate(&planes))
    }
}
