// src/io/reader.rs
//! EMIT NetCDF granules read through GDAL's multidimensional API.
//!
//! Both products are checked against a fixed schema on load: every required
//! variable must exist with the expected rank, and paired arrays must agree
//! in shape. Anything else is a `DataFormat` error.

use std::path::Path;

use gdal::cpl::CslStringList;
use gdal::raster::{GdalType, Group, MDArray};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use ndarray::{Array2, Array3};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{ClassificationPair, ReflectanceCube};

pub const REFLECTANCE_VAR: &str = "reflectance";
pub const BAND_PARAMETERS_GROUP: &str = "sensor_band_parameters";
pub const WAVELENGTHS_VAR: &str = "wavelengths";
pub const MINERAL_GROUPS: [&str; 2] = ["group_1", "group_2"];

fn open_multidim(path: &Path) -> Result<Dataset> {
    if !path.is_file() {
        return Err(Error::data_format(format!("{} is not a file", path.display())));
    }
    Ok(Dataset::open_ex(
        path,
        DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER,
            ..Default::default()
        },
    )?)
}

fn open_array<'a>(group: &'a Group<'a>, name: &str, rank: usize) -> Result<MDArray<'a>> {
    let array = group
        .open_md_array(name, CslStringList::new())
        .map_err(|_| Error::data_format(format!("missing variable '{name}'")))?;
    let dims = array.num_dimensions();
    if dims != rank {
        return Err(Error::data_format(format!(
            "variable '{name}' has rank {dims}, expected {rank}"
        )));
    }
    Ok(array)
}

fn shape_of(array: &MDArray<'_>) -> Result<Vec<usize>> {
    Ok(array.dimensions()?.iter().map(|d| d.size()).collect())
}

fn read_all<T: Copy + GdalType>(array: &MDArray<'_>) -> Result<(Vec<usize>, Vec<T>)> {
    let shape = shape_of(array)?;
    let start = vec![0u64; shape.len()];
    let values = array.read_as::<T>(start, shape.clone())?;
    Ok((shape, values))
}

/// Reflectance cube plus its wavelength table.
///
/// The file stores `reflectance` as (downtrack, crosstrack, bands); the cube
/// is returned as (crosstrack, downtrack, bands).
pub fn read_reflectance(path: &Path) -> Result<ReflectanceCube> {
    let dataset = open_multidim(path)?;
    let root = dataset.root_group()?;

    let reflectance = open_array(&root, REFLECTANCE_VAR, 3)?;
    let (shape, values) = read_all::<f32>(&reflectance)?;
    let (down, cross, bands) = (shape[0], shape[1], shape[2]);
    let stored = Array3::from_shape_vec((down, cross, bands), values)
        .map_err(|e| Error::data_format(format!("reflectance: {e}")))?;
    let data = stored.permuted_axes([1, 0, 2]).as_standard_layout().to_owned();

    let params = root
        .open_group(BAND_PARAMETERS_GROUP, CslStringList::new())
        .map_err(|_| Error::data_format(format!("missing group '{BAND_PARAMETERS_GROUP}'")))?;
    let wavelengths = open_array(&params, WAVELENGTHS_VAR, 1)?;
    let (_, table) = read_all::<f32>(&wavelengths)?;

    info!(
        path = %path.display(),
        across = cross,
        along = down,
        bands,
        "loaded reflectance cube"
    );
    ReflectanceCube::new(data, table)
}

fn read_plane<T: Copy + GdalType>(group: &Group<'_>, name: &str) -> Result<Array2<T>> {
    let array = open_array(group, name, 2)?;
    let (shape, values) = read_all::<T>(&array)?;
    Array2::from_shape_vec((shape[0], shape[1]), values)
        .map_err(|e| Error::data_format(format!("{name}: {e}")))
}

/// Both classification groups of a mineral identification granule.
pub fn read_mineral_groups(path: &Path) -> Result<[ClassificationPair; 2]> {
    let dataset = open_multidim(path)?;
    let root = dataset.root_group()?;

    let read_pair = |group: &str| -> Result<ClassificationPair> {
        let depth = read_plane::<f32>(&root, &format!("{group}_band_depth"))?;
        let ids = read_plane::<i32>(&root, &format!("{group}_mineral_id"))?;
        ClassificationPair::new(depth, ids)
    };

    let first = read_pair(MINERAL_GROUPS[0])?;
    let second = read_pair(MINERAL_GROUPS[1])?;
    info!(path = %path.display(), shape = ?first.band_depth.dim(), "loaded mineral groups");
    Ok([first, second])
}
