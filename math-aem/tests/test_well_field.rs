//! Well-field tests
//!
//! Cone of depression around pumping wells, mass balance, water-table grids
//! and the JSON study workflow.

use approx::assert_relative_eq;
use math_aem::contour::{GridSpec, water_table_cells};
use math_aem::wellfield::{self, STATUS_MESSAGE, WellFieldConfig, create_output_json};
use math_aem::{AemError, Constant, Model, Well};
use std::f64::consts::PI;

const K: f64 = 0.000231;

fn cone_of_depression() -> Model {
    let mut model = Model::single_layer(K, 0.0, 100.0).unwrap();
    model.add_element(Constant::new(500.0, 500.0, 100.0, 0));
    model.add_element(Well::new(0.0, 0.0, 2.0, 0.5, 0));
    model
}

#[test]
fn test_cone_of_depression() {
    let solved = cone_of_depression().solve().unwrap();
    let t = K * 100.0;
    let r_ref = 500.0 * 2.0f64.sqrt();

    assert_relative_eq!(solved.head(0, 500.0, 500.0).unwrap(), 100.0, epsilon = 1e-8);

    let mut previous = f64::NEG_INFINITY;
    for &r in &[1.0, 10.0, 50.0, 200.0, 600.0] {
        let h = solved.head(0, r, 0.0).unwrap();
        let expected = 100.0 + 2.0 / (2.0 * PI * t) * (r / r_ref).ln();
        assert_relative_eq!(h, expected, epsilon = 1e-8);
        assert!(h > previous, "head must rise away from the well");
        previous = h;
    }
}

#[test]
fn test_discharge_points_towards_well() {
    let solved = cone_of_depression().solve().unwrap();
    let q = solved.discharge(30.0, 40.0);
    // Radial inflow of Q / (2 pi r) at r = 50
    let magnitude = q[[0, 0]].hypot(q[[1, 0]]);
    assert_relative_eq!(magnitude, 2.0 / (2.0 * PI * 50.0), epsilon = 1e-12);
    assert!(q[[0, 0]] < 0.0 && q[[1, 0]] < 0.0);
}

#[test]
fn test_flux_balance_around_wells() {
    let total = 2.0;
    let wells = [(0.0, 0.0), (50.0, 0.0), (0.0, 50.0)];
    let mut model = Model::single_layer(K, 0.0, 100.0).unwrap();
    model.add_element(Constant::new(500.0, 500.0, 100.0, 0));
    for &(x, y) in &wells {
        model.add_element(Well::new(x, y, total / wells.len() as f64, 0.5, 0));
    }
    let solved = model.solve().unwrap();

    let boundary = [[-200.0, -200.0], [200.0, -200.0], [200.0, 200.0], [-200.0, 200.0]];
    let flux = solved
        .normal_flux_through_polygon(0, &boundary, 20)
        .unwrap();
    assert_relative_eq!(flux, -total, epsilon = 1e-6);

    // A boundary that encloses no well carries no net flow
    let empty = [[300.0, 300.0], [400.0, 300.0], [400.0, 400.0], [300.0, 400.0]];
    let flux = solved.normal_flux_through_polygon(0, &empty, 20).unwrap();
    assert_relative_eq!(flux, 0.0, epsilon = 1e-9);
}

#[test]
fn test_flat_field_grid() {
    let mut model = Model::single_layer(K, 0.0, 100.0).unwrap();
    model.add_element(Constant::new(500.0, 500.0, 80.0, 0));
    let solved = model.solve().unwrap();
    let spec = GridSpec::new(0.0, 100.0, 0.0, 50.0, 10.0);

    let cells = water_table_cells(&solved, 0, &spec).unwrap();
    assert_eq!(cells.len(), 12 * 7);
    for cell in &cells {
        assert_relative_eq!(cell.elevation, 80.0, epsilon = 1e-10);
        assert_eq!(cell.polygon[0], cell.polygon[4]);
    }
    assert_eq!(cells[0].polygon[0], [-10.0, -10.0]);
    assert_eq!(cells[0].center, [-5.0, -5.0]);

    let contours = solved.head_grid(0, &spec).unwrap().contours(10);
    assert!(contours.levels.is_empty());
    assert!(contours.segments.is_empty());
}

#[test]
fn test_contours_lie_on_their_level() {
    let solved = cone_of_depression().solve().unwrap();
    let spec = GridSpec::new(-100.0, 100.0, -100.0, 100.0, 5.0);
    let grid = solved.head_grid(0, &spec).unwrap();
    let contours = grid.contours(10);

    assert_eq!(contours.levels.len(), 10);
    assert!(contours.levels.windows(2).all(|w| w[0] < w[1]));
    for seg in &contours.segments {
        assert!(seg.level > grid.min() && seg.level < grid.max());
        // Linear interpolation along cell edges is only close where the cone is flat
        let [x, y] = seg.start;
        if x.hypot(y) > 20.0 {
            let h = solved.head(0, x, y).unwrap();
            assert!((h - seg.level).abs() < 1.0, "{} vs {}", h, seg.level);
        }
    }
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study.json");

    let mut config = WellFieldConfig::with_wells(
        vec![0.0, 40.0],
        vec![0.0, 0.0],
        GridSpec::new(-50.0, 50.0, -50.0, 50.0, 10.0),
    );
    config.aquifer.k = 0.25;
    config.metadata.description = "round trip".to_string();
    config.to_file(&path).unwrap();

    let loaded = WellFieldConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = WellFieldConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, AemError::Io(_)));
}

#[test]
fn test_empty_well_list_rejected() {
    let config = WellFieldConfig::with_wells(
        vec![],
        vec![],
        GridSpec::new(-50.0, 50.0, -50.0, 50.0, 10.0),
    );
    let err = wellfield::run(&config).unwrap_err();
    assert!(matches!(err, AemError::InvalidParameters(_)));
    assert!(err.is_configuration_error());
}

#[test]
fn test_non_finite_reference_offset_rejected() {
    let mut config = WellFieldConfig::with_wells(
        vec![0.0],
        vec![0.0],
        GridSpec::new(-50.0, 50.0, -50.0, 50.0, 10.0),
    );
    config.reference.offset = [f64::INFINITY, 0.0];
    let err = wellfield::run(&config).unwrap_err();
    assert!(matches!(err, AemError::InvalidParameters(_)));
}

#[test]
fn test_study_output_document() {
    let config = WellFieldConfig::with_wells(
        vec![0.0, 60.0],
        vec![0.0, 0.0],
        GridSpec::new(-50.0, 110.0, -50.0, 50.0, 10.0),
    );
    let result = wellfield::run(&config).unwrap();
    assert_relative_eq!(result.well_rate, 1.0);

    let output = create_output_json(&config, &result);
    assert_eq!(output["status"], STATUS_MESSAGE);
    let cells = output["local_water_table"]["features"].as_array().unwrap();
    assert_eq!(cells.len(), result.cells.len());
    let contours = output["contours"]["features"].as_array().unwrap();
    assert_eq!(contours.len(), result.contours.segments.len());
    assert_eq!(output["summary"]["wells"].as_array().unwrap().len(), 2);
    assert_eq!(output["summary"]["desired_elevation"], 70.0);
}
