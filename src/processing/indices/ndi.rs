// src/processing/indices/ndi.rs
use ndarray::{Array2, Zip};

use super::{floor_zero, IndexCalculator};
use crate::model::BandPlane;

/// Normalized difference of two bands: (A - B) / (A + B), floored at zero.
///
/// Zero denominators are not masked; they surface as NaN or inf.
pub struct NormalizedDifference {
    wavelengths: [f32; 2],
    name: String,
}

impl NormalizedDifference {
    pub fn new(band_a_nm: f32, band_b_nm: f32, name: Option<String>) -> Self {
        Self {
            wavelengths: [band_a_nm, band_b_nm],
            name: name.unwrap_or_else(|| "NDI".to_string()),
        }
    }
}

impl IndexCalculator for NormalizedDifference {
    fn wavelengths(&self) -> &[f32] {
        &self.wavelengths
    }

    fn calculate(&self, bands: &[BandPlane<'_>]) -> Array2<f32> {
        let (a, b) = (&bands[0], &bands[1]);
        let mut result = Array2::<f32>::zeros(a.raw_dim());

        Zip::from(&mut result)
            .and(a)
            .and(b)
            .par_for_each(|out, &a_val, &b_val| {
                *out = floor_zero((a_val - b_val) / (a_val + b_val));
            });

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
