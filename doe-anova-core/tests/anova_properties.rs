//! Property checks for the ANOVA engine, power analysis and distribution gateway
//! across many generated designs.

use doe_anova_core::{
    central_ci, num_observations, test_power, upper_ci, AnovaModel, Bound, Contrast, DataTable,
    DesignError, Distribution, LevelLabel,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate an unbalanced one-way layout with `levels` levels.
fn random_layout(rng: &mut StdRng, levels: usize) -> (Vec<LevelLabel>, Vec<f64>) {
    let mut labels = Vec::new();
    let mut responses = Vec::new();
    for level in 0..levels {
        let shift = rng.gen_range(-5.0..5.0);
        let replicates = rng.gen_range(2..8);
        for _ in 0..replicates {
            labels.push(LevelLabel::Numeric(level as f64));
            responses.push(100.0 + shift + rng.gen_range(-3.0..3.0));
        }
    }
    (labels, responses)
}

#[test]
fn test_decomposition_identity_holds() {
    let mut rng = StdRng::seed_from_u64(2024);
    for levels in 2..8 {
        let (labels, responses) = random_layout(&mut rng, levels);
        let model = AnovaModel::from_observations("x", "y", labels, responses).unwrap();
        let d = model.decomposition();

        let residual = d.ss_total - (d.ss_treatment + d.ss_error);
        assert!(
            residual.abs() < 1e-6 * d.ss_total.max(1.0),
            "residual {residual}"
        );
        assert_eq!(d.dof_treatment + d.dof_error, d.dof_total);
        assert_eq!(d.dof_treatment, levels - 1);
        assert!((0.0..=1.0).contains(&d.r_squared));

        let total: usize = model.levels().iter().map(|level| level.replicates).sum();
        assert_eq!(total, d.observations);
    }
}

#[test]
fn test_fit_from_json_table() {
    let table = DataTable::from_json_str(
        r#"{
            "variety": ["A", "A", "A", "B", "B", "B", "C", "C", "C"],
            "yield": [4.1, 3.9, 4.3, 5.2, 5.0, 5.4, 3.1, 3.0, 2.8]
        }"#,
    )
    .unwrap();
    let model = AnovaModel::fit(&table, "variety", "yield").unwrap();
    let table = model.table();

    assert_eq!(table.rows()[0].source, "variety");
    assert!(table.rows()[0].p_value.unwrap() < 0.001);
}

#[test]
fn test_missing_column_is_a_lookup_failure() {
    let table = DataTable::from_json_str(r#"{"x": [1, 2, 3], "y": [1.0, 2.0, 3.0]}"#).unwrap();
    assert_eq!(
        AnovaModel::fit(&table, "x", "z").unwrap_err(),
        DesignError::MissingColumn("z".to_string())
    );
}

#[test]
fn test_contrast_inference_end_to_end() {
    let mut rng = StdRng::seed_from_u64(11);
    let (labels, responses) = random_layout(&mut rng, 4);
    let model = AnovaModel::from_observations("dose", "response", labels, responses).unwrap();

    let trend = model.linear_trend_contrast().unwrap();
    let p = model
        .contrast_p_value(&trend, Bound::TwoSided, true)
        .unwrap();
    assert!((0.0..=1.0).contains(&p));

    let quadratic = model.polynomial_trend_contrast(2).unwrap();
    let p = model
        .contrast_p_value(&quadratic, Bound::TwoSided, false)
        .unwrap();
    assert!((0.0..=1.0).contains(&p));

    let widths: Vec<f64> = [0.8, 0.9, 0.95]
        .iter()
        .map(|&confidence| {
            model
                .contrast_confidence_bound(&trend, confidence, Bound::TwoSided, true)
                .unwrap()
                .width()
        })
        .collect();
    assert!(widths[0] < widths[1] && widths[1] < widths[2]);

    assert_eq!(
        model.contrast_p_value(&Contrast::new(vec![0.0; 4]), Bound::TwoSided, true),
        Err(DesignError::DegenerateContrast)
    );
}

#[test]
fn test_sample_size_matches_power() {
    for (delta, variance) in [(1.0, 1.0), (2.0, 1.5), (0.8, 0.5)] {
        let r = num_observations(0.05, 0.2, delta, 3, variance).unwrap();
        assert!(test_power(0.05, delta, r, 3, variance).unwrap() >= 0.8);
        if r > 2 {
            assert!(test_power(0.05, delta, r - 1, 3, variance).unwrap() < 0.8);
        }
    }
}

#[test]
fn test_gateway_quantiles() {
    let normal = Distribution::from_name("normal", &[]).unwrap();
    assert!((upper_ci(&normal, 0.05).unwrap() - 1.645).abs() < 1e-3);

    let t = Distribution::from_name("t", &[10.0]).unwrap();
    let [low, high] = central_ci(&t, 0.05).unwrap();
    assert!((low + high).abs() < 1e-8);

    assert!(matches!(
        Distribution::from_name("weibull", &[1.0]),
        Err(DesignError::UnsupportedDistribution(_))
    ));
}
