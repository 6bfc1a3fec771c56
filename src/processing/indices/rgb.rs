// src/processing/indices/rgb.rs
use ndarray::{s, Array3};

use crate::model::BandPlane;
use crate::processing::contrast::equalize_adapthist;
use crate::utils::scaling::scale_to_u8;

/// Default CLAHE clip limit for the true colour composite.
pub const DEFAULT_CLIP_LIMIT: f32 = 0.02;

/// Red, green and blue planes stacked along a trailing channel axis of size 3.
#[derive(Debug, Clone)]
pub struct RgbComposite {
    pub data: Array3<u8>,
}

impl RgbComposite {
    /// (across-track, along-track)
    pub fn spatial_shape(&self) -> (usize, usize) {
        let (h, w, _) = self.data.dim();
        (h, w)
    }
}

/// True colour composite from the bands nearest 620, 550 and 450 nm.
pub struct TrueColor {
    wavelengths: [f32; 3],
    clip_limit: f32,
}

impl TrueColor {
    pub fn new(clip_limit: f32) -> Self {
        Self {
            wavelengths: [620.0, 550.0, 450.0],
            clip_limit,
        }
    }

    pub fn wavelengths(&self) -> &[f32] {
        &self.wavelengths
    }

    /// Each channel is stretched to 0..=255 by its own maximum, then
    /// equalized with contrast limited adaptive histogram equalization.
    pub fn calculate(&self, bands: &[BandPlane<'_>]) -> RgbComposite {
        let (rows, cols) = bands[0].dim();
        let mut data = Array3::<u8>::zeros((rows, cols, 3));

        for (channel, band) in bands.iter().take(3).enumerate() {
            let scaled = scale_to_u8(band);
            let equalized = equalize_adapthist(scaled.view(), self.clip_limit);
            data.slice_mut(s![.., .., channel]).assign(&equalized);
        }

        RgbComposite { data }
    }
}

impl Default for TrueColor {
    fn default() -> Self {
        Self::new(DEFAULT_CLIP_LIMIT)
    }
}
