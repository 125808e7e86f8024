use nalgebra::Vector3;
use ps_core::{Error, Mask, NormalField};
use ps_photo::{
    smooth_normal_field, tichonov_regularisation, BoundaryData, SmoothingConfig, TichonovConfig,
};

fn rough_field(shape: (usize, usize)) -> NormalField {
    NormalField::from_fn(shape, |(x, y)| {
        let (x, y) = (x as f64, y as f64);
        Vector3::new(
            0.3 * (1.7 * x + 2.3 * y).sin(),
            0.3 * (2.9 * x - 1.1 * y).cos(),
            1.0,
        )
        .normalize()
    })
}

/// Mean arc distance between two fields over the mask.
fn mean_angle(a: &NormalField, b: &NormalField, mask: &Mask) -> f64 {
    let angles: Vec<f64> = mask
        .inside()
        .map(|(x, y)| a.get(x, y).dot(&b.get(x, y)).clamp(-1.0, 1.0).acos())
        .collect();
    angles.iter().sum::<f64>() / angles.len() as f64
}

/// Sum of squared differences across every in-domain link.
fn roughness(field: &NormalField, bc: &BoundaryData) -> f64 {
    let n = field.gather(&bc.inside);
    (0..n.len())
        .map(|i| {
            bc.links(i)
                .iter()
                .map(|&j| (n[j] - n[i]).norm_squared())
                .sum::<f64>()
        })
        .sum()
}

#[test]
fn constant_field_is_a_fixed_point() {
    let shape = (6, 7);
    let mask = Mask::from_fn(shape, |(x, y)| x + y > 2);
    let n = Vector3::new(0.48, -0.6, 0.64);
    let field = NormalField::from_fn(shape, |_| n);

    let out = smooth_normal_field(&field, &mask, None, &SmoothingConfig::default()).unwrap();
    for (x, y) in mask.inside() {
        assert_eq!(out.get(x, y), n);
    }
    // outside the domain the placeholder is written
    assert_eq!(out.get(0, 0), Vector3::new(0.0, 0.0, 1.0));

    let out = tichonov_regularisation(&field, &mask, None, &TichonovConfig::new(1.0)).unwrap();
    for (x, y) in mask.inside() {
        assert_eq!(out.get(x, y), n);
    }
}

#[test]
fn smoothing_keeps_unit_length_and_reduces_roughness() {
    let shape = (10, 12);
    let mask = Mask::full(shape);
    let bc = BoundaryData::from_mask(&mask);
    let field = rough_field(shape);
    let config = SmoothingConfig {
        iters: 20,
        ..Default::default()
    };

    let out = smooth_normal_field(&field, &mask, Some(&bc), &config).unwrap();
    for (x, y) in mask.inside() {
        assert!((out.get(x, y).norm() - 1.0).abs() < 1e-12);
    }
    assert!(roughness(&out, &bc) < 0.5 * roughness(&field, &bc));
}

#[test]
fn fidelity_term_holds_the_field_near_its_input() {
    let shape = (10, 12);
    let mask = Mask::from_fn(shape, |(x, y)| x > 0 && y + 1 < 12);
    let bc = BoundaryData::from_mask(&mask);
    let field = rough_field(shape);

    let smoothed = smooth_normal_field(
        &field,
        &mask,
        Some(&bc),
        &SmoothingConfig {
            iters: 10,
            ..Default::default()
        },
    )
    .unwrap();
    let regularised =
        tichonov_regularisation(&field, &mask, Some(&bc), &TichonovConfig::new(2.0)).unwrap();

    let drift_smooth = mean_angle(&smoothed, &field, &mask);
    let drift_tichonov = mean_angle(&regularised, &field, &mask);
    assert!(drift_tichonov > 0.0);
    assert!(
        drift_tichonov < drift_smooth,
        "{} vs {}",
        drift_tichonov,
        drift_smooth
    );
    for (x, y) in mask.inside() {
        assert!((regularised.get(x, y).norm() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn zero_iterations_return_the_input() {
    let shape = (4, 4);
    let mask = Mask::full(shape);
    let field = rough_field(shape);
    let config = SmoothingConfig {
        iters: 0,
        ..Default::default()
    };
    let out = smooth_normal_field(&field, &mask, None, &config).unwrap();
    assert_eq!(out, field);
}

#[test]
fn boundary_data_must_match_mask() {
    let bc = BoundaryData::from_mask(&Mask::full((3, 3)));
    let err = smooth_normal_field(
        &NormalField::flat((4, 4)),
        &Mask::full((4, 4)),
        Some(&bc),
        &SmoothingConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch(_)));
}
