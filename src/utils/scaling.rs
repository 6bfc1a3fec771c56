// src/utils/scaling.rs
use ndarray::{Array2, ArrayView2};

/// Largest finite value in the plane, if any.
pub fn finite_max(data: &ArrayView2<f32>) -> Option<f32> {
    data.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.map_or(v, |m: f32| m.max(v))))
}

/// Finite (min, max) of the plane, if any value is finite.
pub fn finite_range(data: &ArrayView2<f32>) -> Option<(f32, f32)> {
    data.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Stretch a plane to 0..=255 by dividing by its maximum. Values are
/// truncated like an integer cast; negatives and non-finite values land on 0.
pub fn scale_to_u8(data: &ArrayView2<f32>) -> Array2<u8> {
    match finite_max(data) {
        Some(max) if max > 0.0 => data.mapv(|value| {
            if value.is_finite() {
                (value * 255.0 / max) as u8
            } else {
                0
            }
        }),
        _ => Array2::zeros(data.raw_dim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn scales_by_channel_max() {
        let band = array![[0.0f32, 0.25], [0.5, 1.0]];
        let scaled = scale_to_u8(&band.view());
        assert_eq!(scaled, array![[0u8, 63], [127, 255]]);
    }

    #[test]
    fn ignores_fill_and_nan() {
        let band = array![[-9999.0f32, f32::NAN], [2.0, 4.0]];
        let scaled = scale_to_u8(&band.view());
        assert_eq!(scaled, array![[0u8, 0], [127, 255]]);
        assert_eq!(finite_range(&band.view()), Some((-9999.0, 4.0)));
    }

    #[test]
    fn all_zero_plane_stays_zero() {
        let band = Array2::<f32>::zeros((3, 3));
        assert!(scale_to_u8(&band.view()).iter().all(|&v| v == 0));
    }
}
