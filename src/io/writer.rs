// src/io/writer.rs
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::model::BoundingBox;

/// Folder name for one run: readable first corner plus a CRC32 of all four
/// corners and `discriminator` (the date range or a granule name), so
/// distinct requests never share a folder.
pub fn run_folder_name(bbox: &BoundingBox, discriminator: &str) -> String {
    let key = format!(
        "{},{},{},{},{}",
        bbox.lat1, bbox.lon1, bbox.lat2, bbox.lon2, discriminator
    );
    let hash = crc32fast::hash(key.as_bytes());
    let readable = format!("LAT{}_LON{}", bbox.lat1, bbox.lon1).replace('.', "");
    format!("{readable}_{hash:08x}")
}

pub fn create_run_folder(data_dir: &Path, bbox: &BoundingBox, discriminator: &str) -> Result<PathBuf> {
    let folder = data_dir.join(run_folder_name(bbox, discriminator));
    fs::create_dir_all(&folder)?;
    debug!(folder = %folder.display(), "run folder ready");
    Ok(folder)
}

/// Delete every file in `folder` with the given extension. Returns how many were removed.
pub fn remove_with_extension(folder: &Path, extension: &str) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches && path.is_file() {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Band depth and mineral id image paths for one classification group.
pub fn classification_paths(folder: &Path, granule_name: &str, group: &str) -> (PathBuf, PathBuf) {
    let stem = Path::new(granule_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| granule_name.to_string());
    (
        folder.join(format!("{stem}_{group}_band_depth.png")),
        folder.join(format!("{stem}_{group}_mineral_id.png")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_names_differ_by_date() {
        let bbox = BoundingBox::point(-23.5, -67.25).unwrap();
        let name = run_folder_name(&bbox, "2023-01-01,2023-01-30");
        assert!(name.starts_with("LAT-235_LON-6725_"));
        assert_ne!(name, run_folder_name(&bbox, "2023-02-01,2023-02-28"));
        assert_eq!(name, run_folder_name(&bbox, "2023-01-01,2023-01-30"));
    }

    #[test]
    fn boxes_sharing_a_corner_get_distinct_folders() {
        let small: BoundingBox = "10,20,11,21".parse().unwrap();
        let large: BoundingBox = "10,20,12,22".parse().unwrap();
        let dates = "2023-01-01,2023-01-30";
        assert_ne!(run_folder_name(&small, dates), run_folder_name(&large, dates));
        assert!(run_folder_name(&small, dates).starts_with("LAT10_LON20_"));
    }

    #[test]
    fn removes_only_matching_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        fs::write(dir.path().join("b.PNG"), b"x").unwrap();
        fs::write(dir.path().join("granule.nc"), b"x").unwrap();
        assert_eq!(remove_with_extension(dir.path(), "png").unwrap(), 2);
        assert!(dir.path().join("granule.nc").exists());
    }

    #[test]
    fn classification_names_follow_granule() {
        let (band, id) = classification_paths(Path::new("/tmp/run"), "EMIT_L2B_MIN.nc", "group_1");
        assert_eq!(band, PathBuf::from("/tmp/run/EMIT_L2B_MIN_group_1_band_depth.png"));
        assert_eq!(id, PathBuf::from("/tmp/run/EMIT_L2B_MIN_group_1_mineral_id.png"));
    }
}
