//! Reading and writing tables.
//!
//! CSV and Parquet are chosen by file extension.

use crate::error::{ImputationError, Result, ResultExt};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported on-disk table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Cell texts read as missing in CSV input, in addition to empty fields.
pub const CSV_NULL_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a table from a `.csv` or `.parquet` file.
///
/// CSV files must have a header row; column types are inferred from the
/// first rows and [`CSV_NULL_TOKENS`] are read as missing. Columns with no
/// value at all come back as `Float64` so they are imputed like any other
/// numeric column. Any failure to open or parse the file is reported as
/// [`ImputationError::ReadFailure`].
pub fn load_table(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path).ok_or_else(|| {
        ImputationError::ReadFailure(format!(
            "unsupported file type: {} (expected .csv or .parquet)",
            path.display()
        ))
    })?;

    let read_failure = |e: PolarsError| ImputationError::ReadFailure(format!("{}: {}", path.display(), e));

    let df = match format {
        TableFormat::Csv => CsvReadOptions::default()
            .with_infer_schema_length(Some(100))
            .with_has_header(true)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_quote_char(Some(b'"'))
                    .with_null_values(Some(NullValues::AllColumns(
                        CSV_NULL_TOKENS.iter().map(|token| (*token).into()).collect(),
                    ))),
            )
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(read_failure)?,
        TableFormat::Parquet => {
            let file = File::open(path).map_err(|e| {
                ImputationError::ReadFailure(format!("{}: {}", path.display(), e))
            })?;
            ParquetReader::new(file).finish().map_err(read_failure)?
        }
    };
    let df = coerce_empty_columns(df).map_err(read_failure)?;

    info!("Loaded {} ({} rows x {} columns)", path.display(), df.height(), df.width());
    Ok(df)
}

/// Cast columns that hold no value at all to `Float64`.
///
/// Type inference has nothing to go on for such columns and types them as
/// text (or `Null`), which would keep them out of imputation.
fn coerce_empty_columns(mut df: DataFrame) -> PolarsResult<DataFrame> {
    if df.height() == 0 {
        return Ok(df);
    }

    let empty: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| matches!(col.dtype(), DataType::String | DataType::Null))
        .filter(|col| col.null_count() == col.len())
        .map(|col| col.name().to_string())
        .collect();

    for name in &empty {
        let series = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        df.replace(name, series)?;
        debug!("Column '{}' has no values, read as Float64", name);
    }

    Ok(df)
}

/// Write a table as CSV or Parquet depending on the extension of `path`.
///
/// Parent directories are created as needed.
pub fn write_table(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path).ok_or_else(|| {
        ImputationError::InvalidConfig(format!(
            "unsupported output file type: {}",
            path.display()
        ))
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;

    match format {
        TableFormat::Csv => CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)
            .context(format!("Writing {}", path.display()))?,
        TableFormat::Parquet => {
            ParquetWriter::new(&mut file)
                .finish(df)
                .context(format!("Writing {}", path.display()))?;
        }
    }

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Output path for the filled version of `input`: `<output_dir>/<stem>_filled.<ext>`.
///
/// Inputs without an extension are written as CSV.
pub fn filled_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    let ext = input
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    output_dir.join(format!("{}_filled.{}", stem, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fcm-imputation-io-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_table_format_from_path() {
        assert_eq!(TableFormat::from_path(Path::new("a.csv")), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_path(Path::new("a.CSV")), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_path(Path::new("a.parquet")), Some(TableFormat::Parquet));
        assert_eq!(TableFormat::from_path(Path::new("a.xlsx")), None);
        assert_eq!(TableFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_filled_output_path() {
        assert_eq!(
            filled_output_path(Path::new("data/blood.csv"), Path::new("out")),
            PathBuf::from("out/blood_filled.csv")
        );
        assert_eq!(
            filled_output_path(Path::new("x.parquet"), Path::new(".")),
            PathBuf::from("./x_filled.parquet")
        );
        assert_eq!(
            filled_output_path(Path::new("raw"), Path::new("out")),
            PathBuf::from("out/raw_filled.csv")
        );
    }

    #[test]
    fn test_csv_write_then_load() {
        let dir = temp_dir("csv");
        let path = dir.join("table.csv");
        let mut df = df![
            "name" => ["a", "b", "c"],
            "value" => [Some(1.5), None, Some(3.0)],
        ]
        .unwrap();

        write_table(&mut df, &path).unwrap();
        let loaded = load_table(&path).unwrap();

        assert_eq!(loaded.shape(), (3, 2));
        assert_eq!(loaded.column("value").unwrap().null_count(), 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_parquet_write_then_load() {
        let dir = temp_dir("parquet");
        let path = dir.join("table.parquet");
        let mut df = df!["value" => [1.0, 2.0, 3.0]].unwrap();

        write_table(&mut df, &path).unwrap();
        let loaded = load_table(&path).unwrap();

        assert!(loaded.equals_missing(&df));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_csv_empty_and_na_token_columns_load_as_float() {
        let dir = temp_dir("na");
        let path = dir.join("table.csv");
        fs::write(&path, "a,b,c,d\n1,,4.5,x\n2,,NA,y\n3,,N/A,z\n4,,null,w\n").unwrap();

        let loaded = load_table(&path).unwrap();

        assert_eq!(loaded.column("b").unwrap().dtype(), &DataType::Float64);
        assert_eq!(loaded.column("b").unwrap().null_count(), 4);
        assert_eq!(loaded.column("c").unwrap().dtype(), &DataType::Float64);
        assert_eq!(loaded.column("c").unwrap().null_count(), 3);
        assert_eq!(loaded.column("d").unwrap().dtype(), &DataType::String);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_coerce_empty_columns_keeps_text_with_values() {
        let df = df![
            "empty" => [None::<&str>, None],
            "text" => [Some("a"), None],
        ]
        .unwrap();

        let coerced = coerce_empty_columns(df).unwrap();

        assert_eq!(coerced.column("empty").unwrap().dtype(), &DataType::Float64);
        assert_eq!(coerced.column("text").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_load_missing_file_is_read_failure() {
        let err = load_table("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ImputationError::ReadFailure(_)));
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_load_unsupported_extension() {
        let err = load_table("table.xlsx").unwrap_err();
        assert!(matches!(err, ImputationError::ReadFailure(_)));
    }
}
