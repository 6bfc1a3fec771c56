// src/processing/contrast.rs
//! Contrast limited adaptive histogram equalization (CLAHE) for 8-bit planes.
//!
//! The plane is split into a grid of contextual regions, roughly 1/8 of the
//! image on each side. Each region gets a clipped histogram and a lookup
//! table built from its CDF; pixels are mapped by bilinear interpolation
//! between the tables of the four nearest region centres.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

const NBINS: usize = 256;

type Lut = [u8; NBINS];

pub fn equalize_adapthist(plane: ArrayView2<u8>, clip_limit: f32) -> Array2<u8> {
    let (rows, cols) = plane.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((rows, cols));
    }

    let kernel = ((rows / 8).max(1), (cols / 8).max(1));
    let tiles = (rows.div_ceil(kernel.0), cols.div_ceil(kernel.1));

    // Clip limit is a fraction of the full kernel area, never below one count.
    let clip = if clip_limit > 0.0 {
        Some(((clip_limit * (kernel.0 * kernel.1) as f32) as usize).max(1))
    } else {
        None
    };

    let luts: Vec<Lut> = (0..tiles.0 * tiles.1)
        .into_par_iter()
        .map(|t| {
            let (ty, tx) = (t / tiles.1, t % tiles.1);
            let r0 = ty * kernel.0;
            let c0 = tx * kernel.1;
            let r1 = (r0 + kernel.0).min(rows);
            let c1 = (c0 + kernel.1).min(cols);
            tile_lut(&plane, (r0, r1), (c0, c1), clip)
        })
        .collect();

    let mut out = Array2::<u8>::zeros((rows, cols));
    for ((r, c), value) in out.indexed_iter_mut() {
        let (t0y, t1y, wy) = neighbours(r, kernel.0, tiles.0);
        let (t0x, t1x, wx) = neighbours(c, kernel.1, tiles.1);
        let v = plane[[r, c]] as usize;

        let at = |ty: usize, tx: usize| luts[ty * tiles.1 + tx][v] as f32;
        let top = at(t0y, t0x) * (1.0 - wx) + at(t0y, t1x) * wx;
        let bottom = at(t1y, t0x) * (1.0 - wx) + at(t1y, t1x) * wx;
        *value = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;
    }

    out
}

/// The two region indices bracketing `pos` along one axis and the weight of the second.
fn neighbours(pos: usize, kernel: usize, tiles: usize) -> (usize, usize, f32) {
    let centre = (pos as f32 + 0.5) / kernel as f32 - 0.5;
    if centre <= 0.0 {
        return (0, 0, 0.0);
    }
    let t0 = (centre.floor() as usize).min(tiles - 1);
    let t1 = (t0 + 1).min(tiles - 1);
    let w = if t1 == t0 { 0.0 } else { centre - t0 as f32 };
    (t0, t1, w)
}

fn tile_lut(
    plane: &ArrayView2<u8>,
    (r0, r1): (usize, usize),
    (c0, c1): (usize, usize),
    clip: Option<usize>,
) -> Lut {
    let mut hist = [0usize; NBINS];
    for r in r0..r1 {
        for c in c0..c1 {
            hist[plane[[r, c]] as usize] += 1;
        }
    }
    let count = (r1 - r0) * (c1 - c0);

    if let Some(clip) = clip {
        clip_histogram(&mut hist, clip);
    }

    let mut lut = [0u8; NBINS];
    let mut cumulative = 0usize;
    for (bin, entry) in lut.iter_mut().enumerate() {
        cumulative += hist[bin];
        *entry = ((cumulative as f64 * 255.0) / count as f64).round().min(255.0) as u8;
    }
    lut
}

/// Cap every bin at `clip` and spread the excess evenly, keeping the total count.
fn clip_histogram(hist: &mut [usize; NBINS], clip: usize) {
    let mut excess = 0usize;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    let share = excess / NBINS;
    let remainder = excess % NBINS;
    for bin in hist.iter_mut() {
        *bin += share;
    }
    if remainder > 0 {
        let step = NBINS / remainder;
        for i in (0..NBINS).step_by(step.max(1)).take(remainder) {
            hist[i] += 1;
        }
    }
}
