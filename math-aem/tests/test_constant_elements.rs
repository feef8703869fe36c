//! Constant-type element tests
//!
//! Reference heads, interior constants and particular solutions solved
//! through the full model.

use approx::assert_relative_eq;
use math_aem::{
    AemError, AnalyticElement, AquiferData, AquiferId, CancelToken, Constant, ConstantInside,
    ConstantStar, LayerType, Model, SolveOptions, Well,
};
use std::time::Instant;

fn leaky_square() -> (AquiferData, Vec<[f64; 2]>) {
    let data = AquiferData::new(&[2.0], &[0.0], &[10.0])
        .unwrap()
        .with_layer_type(LayerType::Leaky);
    let boundary = vec![[100.0, 100.0], [200.0, 100.0], [200.0, 200.0], [100.0, 200.0]];
    (data, boundary)
}

#[test]
fn test_single_constant_reproduces_reference_head() {
    for &(xr, yr, hr) in &[(0.0, 0.0, 10.0), (250.0, -75.0, 3.5), (-1e4, 2e4, 120.0)] {
        let mut model = Model::single_layer(0.01, -20.0, 30.0).unwrap();
        model.add_element(Constant::new(xr, yr, hr, 0));
        let solved = model.solve().unwrap();
        assert_relative_eq!(solved.head(0, xr, yr).unwrap(), hr, epsilon = 1e-10);
    }
}

#[test]
fn test_non_finite_reference_head_rejected() {
    let mut model = Model::single_layer(0.000231, 0.0, 100.0).unwrap();
    model.add_element(Constant::new(0.0, 0.0, f64::NAN, 0));
    model.add_element(Well::new(10.0, 0.0, 2.0, 0.5, 0));

    let err = model.solve().unwrap_err();
    assert!(matches!(err, AemError::InvalidParameters(_)));
    assert!(err.is_configuration_error());
}

#[test]
fn test_two_constants_not_solvable() {
    let mut model = Model::single_layer(1.0, 0.0, 10.0).unwrap();
    model.add_element(Constant::new(0.0, 0.0, 5.0, 0));
    model.add_element(Constant::new(100.0, 0.0, 6.0, 0));

    let err = model.solve().unwrap_err();
    assert!(matches!(err, AemError::NotSolvable(_)));
    assert!(err.is_numerical_error());
}

#[test]
fn test_constant_in_semi_confined_area() {
    let mut model = Model::single_layer(1.0, 0.0, 10.0).unwrap();
    let (data, boundary) = leaky_square();
    model.add_inhomogeneity(data, boundary).unwrap();
    model.add_element(Constant::new(150.0, 150.0, 5.0, 0));

    let err = model.solve().unwrap_err();
    match &err {
        AemError::InvalidPlacement { reason, .. } => {
            assert_eq!(reason, "Constant element added to area that is semi-confined")
        }
        other => panic!("expected a placement error, got {other}"),
    }
    assert!(err.is_configuration_error());
}

#[test]
fn test_foreign_aquifer_is_unaffected() {
    let mut model = Model::single_layer(1.0, 0.0, 10.0).unwrap();
    let (data, boundary) = leaky_square();
    let inside = model.add_inhomogeneity(data, boundary).unwrap();
    model.add_element(Constant::new(0.0, 0.0, 5.0, 0));
    let solved = model.solve().unwrap();

    assert_eq!(solved.aquifers().find_aquifer_data(150.0, 150.0), inside);
    assert_eq!(solved.potential(150.0, 150.0)[0], 0.0);
    assert_relative_eq!(solved.head(0, 50.0, 50.0).unwrap(), 5.0, epsilon = 1e-12);
}

#[test]
fn test_constant_inside_sets_average_potential() {
    let mut model = Model::single_layer(1.0, 0.0, 10.0).unwrap();
    model.add_element(Constant::new(0.0, 0.0, 5.0, 0));
    let inside = model.add_element(ConstantInside::new(vec![40.0], vec![0.0]));
    model.add_element(Well::new(20.0, 0.0, 1.5, 0.5, 0));
    let solved = model.solve().unwrap();

    let parameter = solved.element(inside).unwrap().base().parameters[[0, 0]];
    assert_relative_eq!(solved.potential(40.0, 0.0)[0], parameter, epsilon = 1e-10);
}

#[test]
fn test_constant_star_enters_heads() {
    let mut model = Model::single_layer(1.0, 0.0, 10.0).unwrap();
    let (data, boundary) = leaky_square();
    let leaky = model.add_inhomogeneity(data, boundary).unwrap();
    model.add_element(Constant::new(0.0, 0.0, 5.0, 0));
    model.add_element(ConstantStar::new(7.5, leaky));
    let solved = model.solve().unwrap();

    assert_relative_eq!(solved.head(0, 150.0, 150.0).unwrap(), 7.5, epsilon = 1e-12);
    assert_relative_eq!(solved.head(0, 0.0, 0.0).unwrap(), 5.0, epsilon = 1e-12);
}

#[test]
fn test_constant_star_in_background_moves_to_rhs() {
    let mut model = Model::single_layer(1.0, 0.0, 10.0).unwrap();
    model.add_element(Constant::new(0.0, 0.0, 5.0, 0));
    model.add_element(ConstantStar::new(2.0, AquiferId::BACKGROUND));
    let solved = model.solve().unwrap();

    // The reference head still holds with the particular solution added
    assert_relative_eq!(solved.head(0, 0.0, 0.0).unwrap(), 5.0, epsilon = 1e-12);
    // Constant carries hr * T - hstar * T
    assert_relative_eq!(solved.solution()[0], 50.0 - 20.0, epsilon = 1e-12);
}

#[test]
fn test_cancelled_solve() {
    let mut model = Model::single_layer(1.0, 0.0, 10.0).unwrap();
    model.add_element(Constant::new(0.0, 0.0, 5.0, 0));

    let options = SolveOptions::new().with_deadline(Instant::now());
    assert!(matches!(
        model.clone().solve_with(&options),
        Err(AemError::Cancelled)
    ));

    let token = CancelToken::new();
    let options = SolveOptions::new().with_cancel_token(token.clone());
    token.cancel();
    assert!(matches!(model.solve_with(&options), Err(AemError::Cancelled)));
}
