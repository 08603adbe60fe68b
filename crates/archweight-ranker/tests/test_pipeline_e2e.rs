//! End-to-end weight derivation over synthetic and on-disk metric tables.
//!
//! ```bash
//! cargo test --package archweight-ranker --test test_pipeline_e2e
//! ```

use std::collections::BTreeMap;

use archweight_common::{Orientation, WeightingConfig, WeightingError};
use archweight_ranker::pipeline::run_pipeline_with_prior;
use archweight_ranker::scorer::score_subjects;
use archweight_ranker::{project_capped_simplex, run_pipeline, MetricMatrix, ResultTable, WeightVector};
use archweight_test_utils::{assert_close, assert_distribution, assert_eq, metric_names, synthetic_matrix};

fn config_for(metrics: usize) -> WeightingConfig {
    WeightingConfig {
        metrics: metric_names(metrics),
        ..Default::default()
    }
}

#[test]
fn test_zero_prior_without_cap_keeps_combined_weights() {
    let matrix = synthetic_matrix(5, 10, 42);
    let config = WeightingConfig {
        use_variance_gate: false,
        use_cap: false,
        alpha: 0.75,
        ..config_for(5)
    };

    let report = run_pipeline(&matrix, &config).unwrap();
    assert_close(report.final_weights.values(), report.combined.values(), 1e-12);
    assert_eq!(report.final_weights.names(), &metric_names(5)[..]);
    assert!(report.projection.is_none());
}

#[test]
fn test_every_stage_is_a_distribution() {
    for seed in 0..5 {
        let matrix = synthetic_matrix(6, 25, seed);
        let config = WeightingConfig {
            use_variance_gate: true,
            use_cap: true,
            cap_default: 0.3,
            ..config_for(6)
        };
        let report = run_pipeline(&matrix, &config).unwrap();
        for w in [
            &report.entropy,
            &report.dependency,
            &report.variance,
            &report.combined,
            &report.blended,
            &report.final_weights,
        ] {
            assert_distribution(w, 1e-9);
        }
        assert!(report.final_weights.values().iter().all(|w| *w <= 0.3 + 1e-9));
    }
}

#[test]
fn test_variance_gate_flows_into_combined_weights() {
    // Tied values in "b" give it a different dispersion from the rank-spread columns
    let matrix = MetricMatrix::from_dense(
        vec!["a".into(), "b".into(), "c".into()],
        (0..6).map(|i| format!("s{i}")).collect(),
        vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![0.1, 0.1, 0.1, 0.1, 0.1, 9.0],
            vec![6.0, 1.0, 5.0, 2.0, 4.0, 3.0],
        ],
    )
    .unwrap();
    let gate_off = WeightingConfig {
        metrics: vec!["a".into(), "b".into(), "c".into()],
        ..Default::default()
    };
    let gate_on = WeightingConfig { use_variance_gate: true, ..gate_off.clone() };

    let off = run_pipeline(&matrix, &gate_off).unwrap();
    let on = run_pipeline(&matrix, &gate_on).unwrap();
    assert!(on.variance_gate);
    assert!(on.variance.get("b").unwrap() < on.variance.get("a").unwrap());

    let product: Vec<f64> = (0..3)
        .map(|j| on.entropy.values()[j] * on.dependency.values()[j] * on.variance.values()[j])
        .collect();
    let total: f64 = product.iter().sum();
    let expected: Vec<f64> = product.iter().map(|p| p / total).collect();
    assert_close(on.combined.values(), &expected, 1e-12);

    let shift = on
        .combined
        .values()
        .iter()
        .zip(off.combined.values())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(shift > 1e-6, "gate had no effect: {:?} vs {:?}", on.combined, off.combined);
}

#[test]
fn test_runs_are_deterministic() {
    let matrix = synthetic_matrix(5, 12, 9);
    let mut config = config_for(5);
    config.use_cap = true;
    config.cap_default = 0.25;
    config.user_scores = BTreeMap::from([("m0".to_string(), 3.0), ("m3".to_string(), 1.0)]);

    let first = run_pipeline(&matrix, &config).unwrap();
    let second = run_pipeline(&matrix, &config).unwrap();
    assert_eq!(first.final_weights, second.final_weights);
    assert_eq!(first.projection, second.projection);
}

#[test]
fn test_duplicated_metrics_lose_dependency_weight() {
    let matrix = MetricMatrix::from_dense(
        vec!["a".into(), "b".into(), "c".into()],
        (0..6).map(|i| format!("s{i}")).collect(),
        vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![6.0, 1.0, 5.0, 2.0, 4.0, 3.0],
        ],
    )
    .unwrap();
    let config = WeightingConfig {
        metrics: vec!["a".into(), "b".into(), "c".into()],
        ..Default::default()
    };

    let report = run_pipeline(&matrix, &config).unwrap();
    let dep = &report.dependency;
    assert_close(&[dep.get("a").unwrap()], &[dep.get("b").unwrap()], 1e-12);
    assert!(dep.get("c").unwrap() > dep.get("a").unwrap());
}

#[test]
fn test_minimize_orientation_flips_cdf_values() {
    let matrix = synthetic_matrix(4, 15, 3);
    let plain = run_pipeline(&matrix, &config_for(4)).unwrap();

    let mut config = config_for(4);
    config.orientation.insert("m1".to_string(), Orientation::Minimize);
    let flipped = run_pipeline(&matrix, &config).unwrap();

    for i in 0..matrix.n_subjects() {
        let u = plain.oriented.cell(1, i).unwrap();
        let v = flipped.oriented.cell(1, i).unwrap();
        assert!((u + v - 1.0).abs() < 1e-12, "subject {i}: {u} vs {v}");
        assert_eq!(plain.oriented.cell(0, i), flipped.oriented.cell(0, i));
    }
    assert_distribution(&flipped.final_weights, 1e-9);
}

#[test]
fn test_prior_with_wrong_keys_is_rejected() {
    let matrix = synthetic_matrix(3, 10, 1);
    let prior = WeightVector::from_pairs([("m0", 1.0), ("m1", 1.0), ("other", 1.0)]).unwrap();
    let err = run_pipeline_with_prior(&matrix, &config_for(3), &prior).unwrap_err();
    assert!(err.is_fatal_config(), "{err}");
}

#[test]
fn test_infeasible_cap_is_rejected_before_computation() {
    let matrix = synthetic_matrix(4, 10, 1);
    let config = WeightingConfig {
        use_cap: true,
        cap_default: 0.2,
        ..config_for(4)
    };
    assert!(matches!(
        run_pipeline(&matrix, &config),
        Err(WeightingError::InfeasibleCap { metrics: 4, .. })
    ));
}

#[test]
fn test_projection_satisfies_optimality_conditions() {
    let weights = WeightVector::from_pairs([
        ("a", 0.45),
        ("b", 0.25),
        ("c", 0.15),
        ("d", 0.10),
        ("e", 0.05),
    ])
    .unwrap();
    let (projected, outcome) = project_capped_simplex(&weights, 0.3).unwrap();
    assert!(outcome.converged());
    assert_distribution(&projected, 1e-9);

    // Interior coordinates share one shift from the input
    let shifts: Vec<f64> = weights
        .values()
        .iter()
        .zip(projected.values())
        .filter(|(_, p)| **p > 1e-9 && **p < 0.3 - 1e-9)
        .map(|(v, p)| v - p)
        .collect();
    assert!(!shifts.is_empty());
    for s in &shifts {
        assert!((s - shifts[0]).abs() < 1e-9, "{shifts:?}");
    }
    assert!((projected.get("a").unwrap() - 0.3).abs() < 1e-9);
}

#[test]
fn test_scores_follow_final_weights() {
    let matrix = synthetic_matrix(4, 20, 11);
    let report = run_pipeline(&matrix, &config_for(4)).unwrap();
    let scores = score_subjects(&report.oriented, &report.final_weights);
    assert_eq!(scores.len(), 20);
    assert!(scores.windows(2).all(|w| w[0].composite_score >= w[1].composite_score));
    assert!(scores.iter().all(|s| (0.0..=1.0).contains(&s.composite_score)));
}

#[test]
fn test_pipeline_from_csv_with_missing_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics_agg.csv");
    std::fs::write(
        &path,
        "Project,Candidate,CiD,CMod,SCF,SMAD,DCCMD\n\
         shop,a,0.10,0.50,3.00,0.20,1.00\n\
         shop,b,0.30,NA,2.00,0.40,0.50\n\
         bank,a,0.20,0.70,,0.10,0.75\n\
         bank,b,0.50,0.20,4.00,NA,0.25\n\
         mail,a,0.40,0.60,1.00,0.30,0.10\n",
    )
    .unwrap();

    let mut config = WeightingConfig::default();
    config.orientation.insert("SCF".to_string(), Orientation::Minimize);
    config.orientation.insert("DCCMD".to_string(), Orientation::Minimize);
    let matrix = MetricMatrix::from_csv_path(&path, &config.id_columns, &config.metrics).unwrap();
    assert_eq!(matrix.n_subjects(), 5);
    assert_eq!(matrix.missing_cells(), 3);
    assert_eq!(matrix.subjects()[0], "shop/a");

    let report = run_pipeline(&matrix, &config).unwrap();
    assert_distribution(&report.final_weights, 1e-9);

    let table = ResultTable::from_report(&report);
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.rows[0].metric, "CiD");
}
