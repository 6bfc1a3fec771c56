// tests/unit_tests.rs
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use emit_report::config::{AppConfig, RenderConfig};
use emit_report::error::{Error, ErrorKind, Result};
use emit_report::io::writer::run_folder_name;
use emit_report::io::{read_mineral_groups, read_reflectance};
use emit_report::jobs::{Job, JobQueue, JobStatus};
use emit_report::model::{
    BoundingBox, ClassificationPair, Credentials, DateRange, ProductType, ReflectanceCube, ReportMetadata,
};
use emit_report::pipeline::{LocalRequest, Pipeline, RunRequest};
use emit_report::processing::indices::{IndexKind, DEFAULT_CLIP_LIMIT};
use emit_report::processing::{select_band, IndexEngine};
use emit_report::render::{legend_entries, Colormap, RasterRenderer};
use emit_report::report::{Report, ReportImages};
use emit_report::services::{Acquisition, FetchedGranule, OfflineNamer, PlaceResolver};
use ndarray::{array, Array2, Array3};

/// Evenly spaced wavelength table from 400 to 2400 nm.
fn wavelength_table(bands: usize) -> Vec<f32> {
    let step = 2000.0 / (bands - 1) as f32;
    (0..bands).map(|i| 400.0 + step * i as f32).collect()
}

/// Synthetic cube whose values come from `value(row, col, band)`.
fn create_test_cube<F>(rows: usize, cols: usize, bands: usize, value: F) -> ReflectanceCube
where
    F: Fn(usize, usize, usize) -> f32,
{
    let data = Array3::from_shape_fn((rows, cols, bands), |(r, c, b)| value(r, c, b));
    ReflectanceCube::new(data, wavelength_table(bands)).unwrap()
}

/// Deterministic pseudo-random reflectance in (0, 1].
fn pseudo_reflectance(r: usize, c: usize, b: usize) -> f32 {
    let x = (r * 7919 + c * 104_729 + b * 1_299_709) % 1000;
    (x as f32 + 1.0) / 1000.0
}

fn small_config(data_dir: &Path) -> AppConfig {
    AppConfig {
        data_dir: data_dir.to_path_buf(),
        render: RenderConfig {
            figure_size: 48,
            ..RenderConfig::default()
        },
        ..AppConfig::default()
    }
}

fn offline_places() -> PlaceResolver {
    PlaceResolver::new(
        Box::new(OfflineNamer::default()),
        Box::new(OfflineNamer::default()),
        1,
        Duration::ZERO,
    )
}

/// Acquisition that never finds anything.
struct NoGranules;

impl Acquisition for NoGranules {
    fn locate_and_fetch(
        &self,
        _credentials: &Credentials,
        _bbox: &BoundingBox,
        _dates: &DateRange,
        product: ProductType,
        _dest_dir: &Path,
    ) -> Result<FetchedGranule> {
        Err(Error::Acquisition(format!("no {} granules", product.short_name())))
    }
}

fn offline_pipeline(data_dir: &Path) -> Pipeline {
    Pipeline::with_collaborators(small_config(data_dir), Box::new(NoGranules), offline_places())
}

/// Acquisition whose search blows up.
struct PanickingSearch;

impl Acquisition for PanickingSearch {
    fn locate_and_fetch(
        &self,
        _credentials: &Credentials,
        _bbox: &BoundingBox,
        _dates: &DateRange,
        _product: ProductType,
        _dest_dir: &Path,
    ) -> Result<FetchedGranule> {
        panic!("search service returned garbage")
    }
}

fn test_credentials() -> Credentials {
    Credentials {
        username: "user".into(),
        password: "secret".into(),
    }
}

/// Number of page objects in a written PDF, excluding the page tree node.
fn pdf_page_count(bytes: &[u8]) -> usize {
    let marker = b"/Type/Page";
    bytes
        .windows(marker.len() + 1)
        .filter(|w| &w[..marker.len()] == marker && w[marker.len()] != b's')
        .count()
}

fn files_with_extension(folder: &Path, ext: &str) -> usize {
    fs::read_dir(folder)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == ext).unwrap_or(false))
        .count()
}

#[test]
fn test_uniform_cube_gives_zero_ndvi() {
    let cube = create_test_cube(4, 4, 20, |_, _, _| 0.5);
    let engine = IndexEngine::new(&cube);

    let ndvi = engine.compute(IndexKind::Ndvi).unwrap();
    assert_eq!(ndvi.data.dim(), (4, 4));
    assert!(ndvi.data.iter().all(|&v| v == 0.0));

    let iron = engine.compute(IndexKind::IronOxide).unwrap();
    assert!(iron.data.iter().all(|&v| v == 1.0));
}

#[test]
fn test_select_band_exact_match() {
    assert_eq!(select_band(&[400.0, 620.0, 850.0], 620.0).unwrap(), 1);
}

#[test]
fn test_select_band_is_nearest() {
    let table = wavelength_table(285);
    for target in [381.0, 450.0, 620.0, 1234.5, 2199.0, 2600.0] {
        let i = select_band(&table, target).unwrap();
        let best = (table[i] - target).abs();
        assert!(table.iter().all(|w| (w - target).abs() >= best), "target {target}");
    }
}

#[test]
fn test_select_band_rejects_empty_table() {
    let err = select_band(&[], 620.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_indices_are_deterministic() {
    let cube = create_test_cube(9, 11, 30, pseudo_reflectance);
    let engine = IndexEngine::new(&cube);
    for kind in IndexKind::ALL {
        let a = engine.compute(kind).unwrap().data;
        let b = engine.compute(kind).unwrap().data;
        let same = a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits());
        assert!(same, "{kind:?} not bit-identical");
    }
}

#[test]
fn test_normalized_differences_stay_in_unit_interval() {
    let cube = create_test_cube(12, 10, 40, pseudo_reflectance);
    let engine = IndexEngine::new(&cube);
    for kind in [IndexKind::Ndvi, IndexKind::Dos2] {
        let result = engine.compute(kind).unwrap();
        assert!(result.data.iter().all(|&v| (0.0..=1.0).contains(&v)), "{kind:?}");
    }
}

#[test]
fn test_ratios_are_non_negative() {
    let cube = create_test_cube(12, 10, 40, pseudo_reflectance);
    let engine = IndexEngine::new(&cube);
    for kind in [
        IndexKind::IronOxide,
        IndexKind::AlOh,
        IndexKind::Feooh,
        IndexKind::Aai,
        IndexKind::Ais,
    ] {
        let result = engine.compute(kind).unwrap();
        assert_eq!(result.data.dim(), (12, 10));
        assert!(result.data.iter().all(|&v| v >= 0.0), "{kind:?}");
    }
}

#[test]
fn test_nan_and_zero_division_propagate() {
    let wavelengths = vec![650.0, 850.0];
    let mut data = Array3::from_elem((1, 3, 2), 0.5f32);
    data[[0, 0, 0]] = f32::NAN;
    data[[0, 1, 0]] = 0.0;
    data[[0, 1, 1]] = 0.0;
    data[[0, 2, 0]] = 0.0;
    let cube = ReflectanceCube::new(data, wavelengths).unwrap();
    let engine = IndexEngine::new(&cube);

    let ndvi = engine.compute(IndexKind::Ndvi).unwrap().data;
    assert!(ndvi[[0, 0]].is_nan());
    assert!(ndvi[[0, 1]].is_nan());
    assert_eq!(ndvi[[0, 2]], 1.0);

    let iron = engine.compute(IndexKind::IronOxide).unwrap().data;
    assert!(iron[[0, 2]].is_infinite());
}

#[test]
fn test_true_color_shape() {
    let cube = create_test_cube(5, 7, 20, pseudo_reflectance);
    let rgb = IndexEngine::new(&cube).true_color(DEFAULT_CLIP_LIMIT).unwrap();
    assert_eq!(rgb.data.dim(), (5, 7, 3));
}

#[test]
fn test_legend_cardinality() {
    let one = Array2::from_elem((3, 3), 7);
    assert_eq!(legend_entries(&one.view()).len(), 1);

    let two = array![[4, 9], [9, 4]];
    assert_eq!(legend_entries(&two.view()).len(), 2);

    let many = Array2::from_shape_fn((5, 5), |(r, c)| (r * 5 + c) as i32);
    let entries = legend_entries(&many.view());
    assert_eq!(entries.len(), 25);
    assert_eq!(entries[20].color, entries[0].color);
    assert_ne!(entries[19].color, entries[0].color);
}

#[test]
fn test_legend_labels_ascending() {
    let ids = array![[1, 1], [2, 3]];
    let labels: Vec<_> = legend_entries(&ids.view()).into_iter().map(|e| e.label).collect();
    assert_eq!(labels, ["1", "2", "3"]);
}

#[test]
fn test_render_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("ndvi.png");
    let renderer = RasterRenderer::new(small_config(dir.path()).render, None);
    let data = array![[0.0f32, 0.5], [f32::NAN, 1.0]];

    renderer
        .render(data.view(), Some("NDVI"), Colormap::Brg, true, &dest)
        .unwrap();
    assert!(dest.is_file());
}

#[test]
fn test_render_fails_without_directory() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing").join("ndvi.png");
    let renderer = RasterRenderer::new(RenderConfig::default(), None);
    let data = array![[0.0f32, 1.0]];

    let err = renderer
        .render(data.view(), None, Colormap::Rainbow, false, &dest)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
}

#[test]
fn test_render_fails_without_finite_values() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nan.png");
    let renderer = RasterRenderer::new(RenderConfig::default(), None);
    let data = Array2::from_elem((2, 2), f32::NAN);

    let err = renderer
        .render(data.view(), None, Colormap::Rainbow, false, &dest)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert!(!dest.exists());
}

#[test]
fn test_classification_images() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = RasterRenderer::new(small_config(dir.path()).render, None);
    let pair = ClassificationPair::new(array![[0.1f32, 0.4], [0.0, 0.9]], array![[1, 1], [2, 3]]).unwrap();
    let band = dir.path().join("g_group_1_band_depth.png");
    let id = dir.path().join("g_group_1_mineral_id.png");

    let legend = renderer.render_classification(&pair, &band, &id).unwrap();
    assert_eq!(legend.len(), 3);
    assert!(band.is_file() && id.is_file());
}

#[test]
fn test_classification_rejects_mismatched_shapes() {
    let err = ClassificationPair::new(Array2::zeros((2, 2)), Array2::zeros((2, 3))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataFormat);
}

#[test]
fn test_report_has_eight_pages() {
    let images = ReportImages::in_folder(Path::new("/tmp/run"));
    let metadata = ReportMetadata {
        image_name: "granule.nc".into(),
        acquisition_date: "2023-01-15".into(),
        bbox: BoundingBox::point(-23.5, -67.25).unwrap(),
        place_name: "Somewhere".into(),
    };
    let report = Report::build(&images, &metadata, None).unwrap();
    assert_eq!(report.page_count(), 8);
    assert!(report.pages[0].cover.is_some());
    assert!(report.pages[1..].iter().all(|p| p.cover.is_none() && !p.caption.is_empty()));
}

#[test]
fn test_report_leaves_only_document() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(dir.path());
    let cube = create_test_cube(4, 4, 20, pseudo_reflectance);
    let bbox = BoundingBox::point(-23.5, -67.25).unwrap();
    let folder = dir.path().join("run");
    fs::create_dir(&folder).unwrap();

    let (report, place) = pipeline
        .report(&cube, &folder, "EMIT_L2A_RFL_test.nc", "2023-01-15", &bbox)
        .unwrap();

    assert_eq!(report, folder.join("EMIT_L2A_RFL_test.pdf"));
    assert_eq!(place, "-23.5000, -67.2500");
    assert!(report.is_file());
    assert_eq!(files_with_extension(&folder, "png"), 0);
    assert_eq!(fs::read_dir(&folder).unwrap().count(), 1);
}

#[test]
fn test_failed_run_is_reported_as_acquisition() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(dir.path());
    let request = RunRequest {
        credentials: test_credentials(),
        bbox: "-23.5,-67.25".parse().unwrap(),
        dates: "2023-01-01,2023-01-30".parse().unwrap(),
    };

    let err = pipeline.run(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Acquisition);
}

#[test]
fn test_written_report_has_eight_pages() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(dir.path());
    let cube = create_test_cube(4, 4, 20, pseudo_reflectance);
    let bbox = BoundingBox::point(-23.5, -67.25).unwrap();

    let (report, _) = pipeline
        .report(&cube, dir.path(), "EMIT_L2A_RFL_test.nc", "2023-01-15", &bbox)
        .unwrap();

    let bytes = fs::read(&report).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(pdf_page_count(&bytes), 8);
}

#[test]
fn test_local_run_without_minerals() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(dir.path());
    let cube = create_test_cube(4, 4, 20, pseudo_reflectance);
    let request = LocalRequest {
        reflectance: dir.path().join("EMIT_L2A_RFL_test.nc"),
        mineral: None,
        bbox: BoundingBox::point(-23.5, -67.25).unwrap(),
        date_label: Some("2023-01-15".into()),
    };

    let outcome = pipeline.process_cube(&cube, &request).unwrap();
    assert_eq!(outcome.folder, dir.path().join(run_folder_name(&request.bbox, "EMIT_L2A_RFL_test.nc")));
    assert_eq!(outcome.report_path, outcome.folder.join("EMIT_L2A_RFL_test.pdf"));
    assert!(outcome.report_path.is_file());
    assert!(outcome.classification_paths.is_empty());
}

#[test]
fn test_failed_mineral_step_discards_report() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(dir.path());
    let cube = create_test_cube(4, 4, 20, pseudo_reflectance);
    let request = LocalRequest {
        reflectance: dir.path().join("EMIT_L2A_RFL_test.nc"),
        mineral: Some(dir.path().join("EMIT_L2B_MIN_missing.nc")),
        bbox: BoundingBox::point(-23.5, -67.25).unwrap(),
        date_label: None,
    };

    let err = pipeline.process_cube(&cube, &request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataFormat);

    let folder = dir.path().join(run_folder_name(&request.bbox, "EMIT_L2A_RFL_test.nc"));
    assert!(folder.is_dir());
    assert_eq!(files_with_extension(&folder, "pdf"), 0);
    assert_eq!(files_with_extension(&folder, "png"), 0);
}

#[test]
fn test_mineral_maps_for_both_groups() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = offline_pipeline(dir.path());
    let groups = [
        ClassificationPair::new(array![[0.1f32, 0.4], [0.0, 0.9]], array![[1, 1], [2, 3]]).unwrap(),
        ClassificationPair::new(array![[0.2f32, f32::NAN], [0.3, 0.5]], array![[0, 4], [4, 4]]).unwrap(),
    ];

    let written = pipeline
        .render_minerals(&groups, "EMIT_L2B_MIN_test.nc", dir.path())
        .unwrap();

    let expected: Vec<_> = [
        "EMIT_L2B_MIN_test_group_1_band_depth.png",
        "EMIT_L2B_MIN_test_group_1_mineral_id.png",
        "EMIT_L2B_MIN_test_group_2_band_depth.png",
        "EMIT_L2B_MIN_test_group_2_mineral_id.png",
    ]
    .iter()
    .map(|name| dir.path().join(name))
    .collect();
    assert_eq!(written, expected);
    assert!(written.iter().all(|p| p.is_file()));
    assert_eq!(files_with_extension(dir.path(), "png"), 4);
}

#[test]
fn test_reader_rejects_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.nc");

    assert_eq!(read_reflectance(&missing).unwrap_err().kind(), ErrorKind::DataFormat);
    assert_eq!(read_mineral_groups(&missing).unwrap_err().kind(), ErrorKind::DataFormat);
    assert_eq!(read_reflectance(dir.path()).unwrap_err().kind(), ErrorKind::DataFormat);
}

#[test]
fn test_reader_rejects_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let garbage = dir.path().join("garbage.nc");
    fs::write(&garbage, b"not a netcdf granule").unwrap();

    assert_eq!(read_reflectance(&garbage).unwrap_err().kind(), ErrorKind::DataFormat);
}

#[test]
fn test_reader_rejects_missing_variable() {
    let driver = match gdal::DriverManager::get_driver_by_name("netCDF") {
        Ok(driver) => driver,
        Err(_) => {
            println!("Skipping missing variable test - GDAL built without netCDF");
            return;
        }
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.nc");
    // A classic single band raster: one "Band1" variable and nothing else.
    drop(driver.create_with_band_type::<f32, _>(&path, 2, 2, 1).unwrap());

    let err = read_reflectance(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataFormat);
    assert_eq!(read_mineral_groups(&path).unwrap_err().kind(), ErrorKind::DataFormat);
}

#[test]
fn test_job_queue_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let queue = JobQueue::new(Arc::new(offline_pipeline(dir.path())));

    let missing = LocalRequest {
        reflectance: dir.path().join("missing.nc"),
        mineral: None,
        bbox: BoundingBox::point(1.0, 2.0).unwrap(),
        date_label: None,
    };
    let handle = queue.submit(Job::Local(missing)).unwrap();
    let id = handle.id();

    assert!(handle.wait().is_err());
    assert!(matches!(queue.status(id), Some(JobStatus::Failed(_))));
    assert_eq!(queue.snapshot().len(), 1);
    queue.join();
}

#[test]
fn test_job_queue_survives_panicking_job() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::with_collaborators(small_config(dir.path()), Box::new(PanickingSearch), offline_places());
    let queue = JobQueue::new(Arc::new(pipeline));

    let run = RunRequest {
        credentials: test_credentials(),
        bbox: "-23.5,-67.25".parse().unwrap(),
        dates: "2023-01-01,2023-01-30".parse().unwrap(),
    };
    let first = queue.submit(Job::Run(run)).unwrap();
    let first_id = first.id();
    assert_eq!(first.wait().unwrap_err().kind(), ErrorKind::Internal);
    assert_eq!(queue.status(first_id), Some(JobStatus::Failed(ErrorKind::Internal)));

    let local = LocalRequest {
        reflectance: dir.path().join("missing.nc"),
        mineral: None,
        bbox: BoundingBox::point(1.0, 2.0).unwrap(),
        date_label: None,
    };
    let second = queue.submit(Job::Local(local)).unwrap();
    let second_id = second.id();
    assert_eq!(second.wait().unwrap_err().kind(), ErrorKind::DataFormat);
    assert_eq!(queue.status(second_id), Some(JobStatus::Failed(ErrorKind::DataFormat)));
    queue.join();
}
