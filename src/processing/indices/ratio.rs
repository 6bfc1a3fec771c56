// src/processing/indices/ratio.rs
use ndarray::{Array2, Zip};

use super::{floor_zero, IndexCalculator};
use crate::model::BandPlane;

/// Simple band ratio A / B, floored at zero.
pub struct BandRatio {
    wavelengths: [f32; 2],
    name: String,
}

impl BandRatio {
    pub fn new(numerator_nm: f32, denominator_nm: f32, name: Option<String>) -> Self {
        Self {
            wavelengths: [numerator_nm, denominator_nm],
            name: name.unwrap_or_else(|| "Ratio".to_string()),
        }
    }
}

impl IndexCalculator for BandRatio {
    fn wavelengths(&self) -> &[f32] {
        &self.wavelengths
    }

    fn calculate(&self, bands: &[BandPlane<'_>]) -> Array2<f32> {
        let (num, den) = (&bands[0], &bands[1]);
        let mut result = Array2::<f32>::zeros(num.raw_dim());

        Zip::from(&mut result)
            .and(num)
            .and(den)
            .par_for_each(|out, &n, &d| *out = floor_zero(n / d));

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
