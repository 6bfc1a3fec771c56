// src/processing/band.rs
use crate::error::{Error, Result};

/// Index of the band whose centre wavelength is closest to `target_nm`.
///
/// Ties resolve to the lowest index. NaN entries in the table are ignored.
pub fn select_band(wavelengths: &[f32], target_nm: f32) -> Result<usize> {
    if wavelengths.is_empty() {
        return Err(Error::invalid_input("wavelength table is empty"));
    }

    let mut best: Option<(usize, f32)> = None;
    for (i, &w) in wavelengths.iter().enumerate() {
        let diff = (w - target_nm).abs();
        if diff.is_nan() {
            continue;
        }
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((i, diff)),
        }
    }

    best.map(|(i, _)| i)
        .ok_or_else(|| Error::invalid_input("wavelength table has no valid entries"))
}
