// src/render/classification.rs
use std::collections::HashMap;
use std::path::Path;

use itertools::Itertools;
use ndarray::ArrayView2;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::ClassificationPair;
use crate::render::colormap::{qualitative_color, Colormap};
use crate::render::raster::{display_range, ensure_parent, FigureOptions, LegendEntry, RasterRenderer};

/// Ascending distinct mineral codes, each with its palette colour.
pub fn legend_entries(mineral_id: &ArrayView2<i32>) -> Vec<LegendEntry> {
    mineral_id
        .iter()
        .copied()
        .sorted_unstable()
        .dedup()
        .enumerate()
        .map(|(i, value)| LegendEntry {
            value,
            label: value.to_string(),
            color: qualitative_color(i),
        })
        .collect()
}

impl RasterRenderer {
    /// Band depth heat map plus a categorical mineral map with legend.
    /// Returns the legend rows drawn next to the mineral map.
    pub fn render_classification(
        &self,
        pair: &ClassificationPair,
        band_path: &Path,
        id_path: &Path,
    ) -> Result<Vec<LegendEntry>> {
        ensure_parent(band_path)?;
        ensure_parent(id_path)?;

        let depth = pair.band_depth.view();
        let range = display_range(&depth)?;
        let plain = FigureOptions {
            title: None,
            show_axes: false,
            colorbar: None,
            legend: None,
        };
        self.scalar_figure(&depth, Colormap::Inferno, range, &plain)
            .save(band_path)?;
        debug!(path = %band_path.display(), "rendered band depth");

        let ids = pair.mineral_id.view();
        if ids.is_empty() {
            return Err(Error::render("mineral id array is empty"));
        }
        let entries = legend_entries(&ids);
        let colors: HashMap<i32, _> = entries.iter().map(|e| (e.value, e.color)).collect();
        let options = FigureOptions {
            legend: Some(entries.as_slice()),
            ..plain
        };
        let (rows, cols) = ids.dim();
        self.figure(rows, cols, &options, |r, c| colors[&ids[[r, c]]])
            .save(id_path)?;
        debug!(path = %id_path.display(), categories = entries.len(), "rendered mineral id");

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn legend_is_sorted_and_distinct() {
        let ids = array![[3, 1], [1, 2]];
        let labels: Vec<_> = legend_entries(&ids.view()).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["1", "2", "3"]);
    }

    #[test]
    fn legend_colors_cycle_past_palette() {
        let ids = Array2::from_shape_fn((5, 5), |(r, c)| (r * 5 + c) as i32);
        let entries = legend_entries(&ids.view());
        assert_eq!(entries.len(), 25);
        assert_eq!(entries[0].color, entries[20].color);
        assert_ne!(entries[0].color, entries[1].color);
    }
}
