//! Integration tests for the imputation pipeline.
//!
//! These tests verify end-to-end behavior using the fixtures in `tests/fixtures`.

use fcm_imputation::io::load_table;
use fcm_imputation::{
    FuzzyCMeans, FuzzyImputer, ImputationConfig, ImputationError, ImputationStage, Imputer,
    select_holdout,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> DataFrame {
    load_table(fixtures_path().join(filename)).expect("Failed to read fixture")
}

fn config(n_clusters: usize, test_fraction: f64, seed: u64) -> ImputationConfig {
    ImputationConfig::builder()
        .n_clusters(n_clusters)
        .test_fraction(test_fraction)
        .seed(seed)
        .build()
        .unwrap()
}

fn impute(df: DataFrame, config: ImputationConfig) -> fcm_imputation::error::Result<fcm_imputation::ImputationResult> {
    Imputer::builder().config(config).build().unwrap().impute(df)
}

fn numeric_null_count(df: &DataFrame) -> usize {
    fcm_imputation::numeric_column_names(df)
        .iter()
        .map(|name| df.column(name).unwrap().null_count())
        .sum()
}

fn ten_rows() -> DataFrame {
    df!["x" => [Some(1i64), Some(2), Some(3), None, Some(5), Some(6), Some(7), Some(8), Some(9), Some(10)]]
        .unwrap()
}

fn f64_at(df: &DataFrame, col: &str, row: usize) -> f64 {
    df.column(col)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .get(row)
        .unwrap()
}

// ============================================================================
// Full Pipeline Tests with Blood Sample Data
// ============================================================================

#[test]
fn test_blood_sample_is_fully_imputed() {
    let df = load_fixture("blood_sample.csv");
    assert_eq!(numeric_null_count(&df), 11);

    let result = impute(df.clone(), config(3, 0.1, 42)).unwrap();

    assert_eq!(result.data.shape(), df.shape());
    assert_eq!(result.data.get_column_names(), df.get_column_names());
    assert_eq!(numeric_null_count(&result.data), 0);

    let summary = &result.summary;
    assert_eq!(summary.rows, 16);
    assert_eq!(summary.columns, 6);
    assert_eq!(summary.cells_missing, 11);
    // One held-out cell per column: floor(13 * 0.1) = floor(14 * 0.1) = 1.
    assert_eq!(summary.cells_held_out, 4);
    assert_eq!(summary.cells_imputed(), 15);
    assert!(summary.iterations >= 1);
    assert!(summary.partition_coefficient > 0.0 && summary.partition_coefficient <= 1.0 + 1e-9);
}

#[test]
fn test_blood_sample_evaluation() {
    let df = load_fixture("blood_sample.csv");
    let result = impute(df, config(3, 0.2, 7)).unwrap();

    let report = result.evaluation.expect("evaluation was requested");
    // age: floor(14 * 0.2) = 2, others: floor(13 * 0.2) = 2
    assert_eq!(report.n_test, 8);
    assert!(report.mae.is_finite());
    assert!(report.rmse + 1e-12 >= report.mae);
}

#[test]
fn test_non_numeric_columns_unchanged() {
    let df = load_fixture("blood_sample.csv");
    let result = impute(df.clone(), config(3, 0.1, 1)).unwrap();

    for name in ["patient_id", "sex"] {
        let before = df.column(name).unwrap().as_materialized_series();
        let after = result.data.column(name).unwrap().as_materialized_series();
        assert!(before.equals_missing(after), "column '{}' changed", name);
    }
}

#[test]
fn test_observed_cells_unchanged() {
    let df = load_fixture("blood_sample.csv");
    let result = impute(df.clone(), config(3, 0.0, 5)).unwrap();

    for name in ["age", "hemoglobin", "glucose", "cholesterol"] {
        let before = df.column(name).unwrap().as_materialized_series();
        for row in 0..df.height() {
            if before.get(row).unwrap().is_null() {
                continue;
            }
            assert_eq!(f64_at(&result.data, name, row), f64_at(&df, name, row));
        }
    }
}

#[test]
fn test_same_seed_is_deterministic() {
    let df = load_fixture("blood_sample.csv");

    let first = impute(df.clone(), config(3, 0.2, 99)).unwrap();
    let second = impute(df, config(3, 0.2, 99)).unwrap();

    assert!(first.data.equals_missing(&second.data));
    assert_eq!(first.evaluation, second.evaluation);
    assert_eq!(first.summary.iterations, second.summary.iterations);
}

#[test]
fn test_blood_sample_row_warning() {
    let df = load_fixture("blood_sample.csv");
    let result = impute(df, config(3, 0.0, 3)).unwrap();

    // P008 has no numeric values at all.
    assert!(result.warnings.columns.is_empty());
    assert_eq!(result.warnings.rows, vec![7]);
}

#[test]
fn test_complete_table_passes_through() {
    let df = load_fixture("complete.csv");
    let result = impute(df.clone(), config(2, 0.0, 4)).unwrap();

    assert!(result.data.equals_missing(&df));
    assert!(result.evaluation.is_none());
    assert_eq!(result.summary.cells_imputed(), 0);
}

#[test]
fn test_mostly_missing_table() {
    let df = load_fixture("mostly_missing.csv");
    let result = impute(df, config(2, 0.0, 8)).unwrap();

    assert_eq!(numeric_null_count(&result.data), 0);
    // 'a' is exactly 80% missing, 'b' is 90% missing.
    assert_eq!(result.warnings.columns, vec!["b".to_string()]);
    assert_eq!(result.warnings.rows.len(), 7);
    assert_eq!(
        result.warnings.message().unwrap(),
        "Highly missing columns: b; Highly missing rows: 7"
    );
}

// ============================================================================
// Evaluation Toggle Tests
// ============================================================================

#[test]
fn test_no_evaluation_outside_open_interval() {
    for fraction in [0.0, 1.0, -0.5, 1.5] {
        let result = impute(ten_rows(), config(2, fraction, 0)).unwrap();
        assert!(result.evaluation.is_none(), "fraction {} should skip evaluation", fraction);
        assert_eq!(result.summary.cells_held_out, 0);
    }
}

// ============================================================================
// Ten Row Scenarios
// ============================================================================

#[test]
fn test_ten_rows_single_gap() {
    let df = ten_rows();
    let numeric_config = config(2, 0.0, 21);

    let mut rng = StdRng::seed_from_u64(21);
    let imputation = FuzzyImputer::new(FuzzyCMeans::from_config(&numeric_config))
        .fit_transform(&df, &mut rng)
        .unwrap();

    assert_eq!(imputation.data.column("x").unwrap().null_count(), 0);
    let filled = f64_at(&imputation.data, "x", 3);

    let centers: Vec<f64> = imputation.partition.centers.iter().map(|c| c[0]).collect();
    assert_eq!(centers.len(), 2);
    assert!(centers.contains(&filled), "{} is not a center of {:?}", filled, centers);
    assert!((1.0..=10.0).contains(&filled));
}

#[test]
fn test_ten_rows_through_imputer() {
    let result = impute(ten_rows(), config(2, 0.0, 21)).unwrap();

    assert_eq!(result.data.column("x").unwrap().dtype(), &DataType::Float64);
    let filled = f64_at(&result.data, "x", 3);
    assert!((1.0..=10.0).contains(&filled));
    assert_eq!(result.summary.cells_filled_from_clusters, 1);
    assert_eq!(result.summary.cells_filled_by_fallback, 0);
}

#[test]
fn test_ten_rows_single_holdout() {
    let df = ten_rows();
    let result = impute(df.clone(), config(2, 0.2, 13)).unwrap();

    // Masking draws first from the run's generator
    let mut rng = StdRng::seed_from_u64(13);
    let holdout = select_holdout(&df, 0.2, &mut rng).unwrap();

    // floor(9 * 0.2) = 1
    assert_eq!(holdout.len(), 1);
    let cell = &holdout.cells()[0];
    assert_eq!(cell.column, "x");
    assert_ne!(cell.row, 3);

    let original = f64_at(&df, "x", cell.row);
    let filled = f64_at(&result.data, "x", cell.row);
    let error = (original - filled).abs();

    let report = result.evaluation.unwrap();
    assert_eq!(report.n_test, 1);
    assert!((report.mae - error).abs() < 1e-12, "mae {} vs |{} - {}|", report.mae, original, filled);
    assert!((report.rmse - error).abs() < 1e-12, "rmse {} vs |{} - {}|", report.rmse, original, filled);
    assert_eq!(numeric_null_count(&result.data), 0);
}

#[test]
fn test_empty_csv_column_is_imputed() {
    let df = load_fixture("empty_column.csv");
    assert_eq!(df.column("b").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("c").unwrap().null_count(), 2);

    let result = impute(df, config(2, 0.0, 5)).unwrap();

    let b = result.data.column("b").unwrap();
    assert_eq!(b.dtype(), &DataType::Float64);
    assert_eq!(b.null_count(), 0);
    for row in 0..5 {
        assert_eq!(f64_at(&result.data, "b", row), 0.0);
    }
    assert_eq!(numeric_null_count(&result.data), 0);
    assert_eq!(result.warnings.columns, vec!["b".to_string()]);
}

// ============================================================================
// Cluster Count Boundary Tests
// ============================================================================

#[test]
fn test_cluster_count_rows_minus_one_succeeds() {
    let result = impute(ten_rows(), config(9, 0.0, 2));
    assert!(result.is_ok());
}

#[test]
fn test_cluster_count_equal_to_rows_fails() {
    let err = impute(ten_rows(), config(10, 0.0, 2)).unwrap_err();
    assert!(matches!(
        err,
        ImputationError::InvalidClusterCount {
            n_clusters: 10,
            rows: 10
        }
    ));
    assert_eq!(err.error_code(), "INVALID_CLUSTER_COUNT");
    assert!(err.is_validation_error());
}

// ============================================================================
// Validation Error Tests
// ============================================================================

#[test]
fn test_text_only_table_rejected() {
    let df = load_fixture("text_only.csv");
    let err = impute(df, config(1, 0.0, 0)).unwrap_err();
    assert!(matches!(err, ImputationError::NoNumericColumns));
}

#[test]
fn test_empty_table_rejected() {
    let df = df!["x" => Vec::<f64>::new()].unwrap();
    let err = impute(df, config(1, 0.0, 0)).unwrap_err();
    assert!(matches!(err, ImputationError::EmptyInput));
}

#[test]
fn test_all_missing_rejected() {
    let df = df![
        "label" => ["a", "b", "c"],
        "x" => [Option::<f64>::None, None, None],
    ]
    .unwrap();
    let err = impute(df, config(1, 0.0, 0)).unwrap_err();
    assert!(matches!(err, ImputationError::AllNumericMissing));
}

#[test]
fn test_fuzziness_out_of_range_rejected() {
    let config = ImputationConfig::builder()
        .n_clusters(2)
        .fuzziness(1.0)
        .test_fraction(0.0)
        .build()
        .unwrap();
    let err = impute(ten_rows(), config).unwrap_err();
    assert!(matches!(err, ImputationError::InvalidFuzziness(_)));
}

#[test]
fn test_error_serializes_with_code() {
    let err = impute(ten_rows(), config(0, 0.0, 0)).unwrap_err();
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["code"], "INVALID_CLUSTER_COUNT");
    assert!(json["message"].as_str().unwrap().contains("0"));
}

#[test]
fn test_missing_file_is_read_failure() {
    let err = load_table(fixtures_path().join("does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, ImputationError::ReadFailure(_)));
    assert_eq!(err.error_code(), "READ_FAILURE");
}

// ============================================================================
// Progress Reporting Tests
// ============================================================================

#[test]
fn test_progress_stages_reported() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let imputer = Imputer::builder()
        .config(config(3, 0.1, 42))
        .on_progress(move |update| {
            stages_clone.lock().unwrap().push(update.stage);
        })
        .build()
        .unwrap();

    imputer.impute(load_fixture("blood_sample.csv")).unwrap();

    let stages = stages.lock().unwrap();
    for expected in [
        ImputationStage::Validating,
        ImputationStage::Masking,
        ImputationStage::Clustering,
        ImputationStage::Filling,
        ImputationStage::Evaluating,
    ] {
        assert!(stages.contains(&expected), "missing stage {:?}", expected);
    }
    assert_eq!(stages.last(), Some(&ImputationStage::Complete));
}

#[test]
fn test_report_json_shape() {
    let result = impute(load_fixture("blood_sample.csv"), config(3, 0.1, 42)).unwrap();
    let report = result.report("blood_sample.csv", Some("outputs/blood_sample_filled.csv".to_string()));
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["input_file"], "blood_sample.csv");
    assert_eq!(json["evaluation"]["n_test"], 4);
    assert_eq!(json["summary"]["cells_missing"], 11);
    assert_eq!(json["warnings"]["rows"], serde_json::json!([7]));
}
