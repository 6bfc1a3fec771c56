//! Colormap definitions and utilities
//!
//! Matplotlib-compatible maps used by the report: `brg` and `rainbow` follow
//! their analytic definitions and `inferno` is sampled from control points.
//! Categories are coloured from the 20 colour `tab20` palette.

pub type Rgb = [u8; 3];

/// Continuous colormaps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Colormap {
    Brg,
    Rainbow,
    Inferno,
}

impl Colormap {
    /// Map a normalized value (0-1) to a color
    pub fn map(&self, t: f32) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Colormap::Brg => {
                // blue -> red -> green
                let r = 1.0 - (2.0 * t - 1.0).abs();
                let g = (2.0 * t - 1.0).max(0.0);
                let b = (1.0 - 2.0 * t).max(0.0);
                to_rgb(r, g, b)
            }
            Colormap::Rainbow => {
                let r = (2.0 * t - 0.5).abs();
                let g = (std::f32::consts::PI * t).sin();
                let b = (std::f32::consts::FRAC_PI_2 * t).cos();
                to_rgb(r, g, b)
            }
            Colormap::Inferno => sample_stops(&INFERNO_STOPS, t),
        }
    }
}

/// Colour of the `i`-th category; wraps around after 20 entries.
pub fn qualitative_color(i: usize) -> Rgb {
    TAB20[i % TAB20.len()]
}

pub const QUALITATIVE_LEN: usize = 20;

fn to_rgb(r: f32, g: f32, b: f32) -> Rgb {
    [
        (r.clamp(0.0, 1.0) * 255.0).round() as u8,
        (g.clamp(0.0, 1.0) * 255.0).round() as u8,
        (b.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

/// Linear interpolation between two colors
pub fn lerp_color(c1: Rgb, c2: Rgb, t: f32) -> Rgb {
    [
        (c1[0] as f32 * (1.0 - t) + c2[0] as f32 * t).round() as u8,
        (c1[1] as f32 * (1.0 - t) + c2[1] as f32 * t).round() as u8,
        (c1[2] as f32 * (1.0 - t) + c2[2] as f32 * t).round() as u8,
    ]
}

fn sample_stops(stops: &[Rgb], t: f32) -> Rgb {
    let scaled = t * (stops.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(stops.len() - 2);
    lerp_color(stops[i], stops[i + 1], scaled - i as f32)
}

const INFERNO_STOPS: [Rgb; 9] = [
    [0, 0, 4],
    [31, 12, 72],
    [85, 15, 109],
    [136, 34, 106],
    [186, 54, 85],
    [227, 89, 51],
    [249, 140, 10],
    [249, 201, 50],
    [252, 255, 164],
];

const TAB20: [Rgb; QUALITATIVE_LEN] = [
    [31, 119, 180],
    [174, 199, 232],
    [255, 127, 14],
    [255, 187, 120],
    [44, 160, 44],
    [152, 223, 138],
    [214, 39, 40],
    [255, 152, 150],
    [148, 103, 189],
    [197, 176, 213],
    [140, 86, 75],
    [196, 156, 148],
    [227, 119, 194],
    [247, 182, 210],
    [127, 127, 127],
    [199, 199, 199],
    [188, 189, 34],
    [219, 219, 141],
    [23, 190, 207],
    [158, 218, 229],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brg_endpoints() {
        assert_eq!(Colormap::Brg.map(0.0), [0, 0, 255]);
        assert_eq!(Colormap::Brg.map(0.5), [255, 0, 0]);
        assert_eq!(Colormap::Brg.map(1.0), [0, 255, 0]);
    }

    #[test]
    fn rainbow_endpoints() {
        assert_eq!(Colormap::Rainbow.map(0.0), [128, 0, 255]);
        assert_eq!(Colormap::Rainbow.map(1.0), [255, 0, 0]);
    }

    #[test]
    fn inferno_endpoints() {
        assert_eq!(Colormap::Inferno.map(0.0), [0, 0, 4]);
        assert_eq!(Colormap::Inferno.map(1.0), [252, 255, 164]);
    }

    #[test]
    fn qualitative_palette_cycles() {
        assert_eq!(qualitative_color(0), qualitative_color(QUALITATIVE_LEN));
        assert_ne!(qualitative_color(0), qualitative_color(1));
    }
}
