//! Shared utilities for moving numeric data between polars and the engine.
//!
//! The clustering code works on plain row-major `Vec<Vec<_>>` matrices; these
//! helpers convert numeric columns into that form and write results back.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Names of all numeric columns, in table order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

// =============================================================================
// Matrix Conversion Utilities
// =============================================================================

/// Read a numeric column as `f64` values. Nulls and NaN both become `None`.
pub fn column_values(df: &DataFrame, col_name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(col_name)?.as_materialized_series();
    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Build a row-major matrix over the given columns, keeping missing cells as `None`.
pub fn numeric_matrix(df: &DataFrame, columns: &[String]) -> PolarsResult<Vec<Vec<Option<f64>>>> {
    let n_rows = df.height();
    let mut matrix = vec![vec![None; columns.len()]; n_rows];

    for (col_idx, col_name) in columns.iter().enumerate() {
        let values = column_values(df, col_name)?;
        for (row, value) in matrix.iter_mut().zip(values) {
            row[col_idx] = value;
        }
    }

    Ok(matrix)
}

/// Per-column mean of the present values. `None` for a column with no values.
pub fn column_means(matrix: &[Vec<Option<f64>>], n_cols: usize) -> Vec<Option<f64>> {
    let mut sums = vec![0.0; n_cols];
    let mut counts = vec![0usize; n_cols];

    for row in matrix {
        for (col_idx, value) in row.iter().enumerate() {
            if let Some(v) = value {
                sums[col_idx] += v;
                counts[col_idx] += 1;
            }
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
        .collect()
}

/// Replace a column with the given `f64` values.
pub fn replace_numeric_column(
    df: &mut DataFrame,
    col_name: &str,
    values: Vec<Option<f64>>,
) -> PolarsResult<()> {
    let series = Series::new(col_name.into(), values);
    df.replace(col_name, series)?;
    Ok(())
}

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let mask = series.is_null();
    let len = series.len();
    let mut result_vec = Vec::with_capacity(len);

    for i in 0..len {
        if mask.get(i).unwrap_or(false) {
            result_vec.push(Some(fill_value));
        } else {
            let val = series.get(i)?;
            result_vec.push(Some(val.try_extract::<f64>()?));
        }
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::UInt8));
        assert!(is_numeric_dtype(&DataType::Float32));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_numeric_column_names_keeps_table_order() {
        let df = df![
            "name" => ["a", "b"],
            "age" => [30i64, 40],
            "active" => [true, false],
            "score" => [1.5, 2.5],
        ]
        .unwrap();

        assert_eq!(numeric_column_names(&df), vec!["age", "score"]);
    }

    #[test]
    fn test_column_values_treats_nan_as_missing() {
        let df = df![
            "x" => [Some(1.0), None, Some(f64::NAN), Some(4.0)],
        ]
        .unwrap();

        let values = column_values(&df, "x").unwrap();
        assert_eq!(values, vec![Some(1.0), None, None, Some(4.0)]);
    }

    #[test]
    fn test_numeric_matrix_is_row_major() {
        let df = df![
            "a" => [Some(1i64), None, Some(3)],
            "b" => [Some(10.0), Some(20.0), None],
        ]
        .unwrap();

        let columns = vec!["a".to_string(), "b".to_string()];
        let matrix = numeric_matrix(&df, &columns).unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[0], vec![Some(1.0), Some(10.0)]);
        assert_eq!(matrix[1], vec![None, Some(20.0)]);
        assert_eq!(matrix[2], vec![Some(3.0), None]);
    }

    #[test]
    fn test_column_means_ignores_missing() {
        let matrix = vec![
            vec![Some(1.0), None],
            vec![Some(3.0), None],
            vec![None, None],
        ];

        let means = column_means(&matrix, 2);
        assert_eq!(means, vec![Some(2.0), None]);
    }

    #[test]
    fn test_replace_numeric_column_changes_dtype_to_float() {
        let mut df = df![
            "a" => [Some(1i64), None],
        ]
        .unwrap();

        replace_numeric_column(&mut df, "a", vec![Some(1.0), Some(2.5)]).unwrap();

        let col = df.column("a").unwrap();
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(col.null_count(), 0);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }
}
