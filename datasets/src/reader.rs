//! Reading CSV tables into frames

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use ndarray::Array1;
use reel::frame::{Column, ColumnKind};
use reel::{Float, Frame};
use tracing::{debug, info};

use crate::error::{DatasetError, Result};

/// Tokens read as missing values, the defaults of pandas' `read_csv`
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// The columns to read from a CSV table and how to interpret them
///
/// Columns are looked up by their header name, so their order in the file does not matter and
/// unlisted columns are skipped. The frame holds the columns in the order they were added here.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSchema {
    columns: Vec<(String, ColumnKind)>,
    delimiter: u8,
    na_values: Vec<String>,
}

impl Default for FrameSchema {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            delimiter: b',',
            na_values: DEFAULT_NA_VALUES.iter().map(|x| x.to_string()).collect(),
        }
    }
}

impl FrameSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the column `name` as numbers
    pub fn numeric<S: Into<String>>(mut self, name: S) -> Self {
        self.columns.push((name.into(), ColumnKind::Numeric));
        self
    }

    /// Reads the column `name` as text categories
    pub fn categorical<S: Into<String>>(mut self, name: S) -> Self {
        self.columns.push((name.into(), ColumnKind::Categorical));
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Replaces the tokens read as missing values
    pub fn na_values<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.na_values = values.iter().map(|x| x.as_ref().to_string()).collect();
        self
    }

    pub fn columns(&self) -> &[(String, ColumnKind)] {
        &self.columns
    }

    pub fn is_missing(&self, field: &str) -> bool {
        self.na_values.iter().any(|na| na == field)
    }
}

/// Reads the columns of `schema` from a CSV file
///
/// Files ending in `.gz` are decompressed while reading.
pub fn read_frame<F: Float, P: AsRef<Path>>(path: P, schema: &FrameSchema) -> Result<Frame<F>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "reading table");

    if path.extension().map_or(false, |ext| ext == "gz") {
        read_frame_from(GzDecoder::new(BufReader::new(file)), schema)
    } else {
        read_frame_from(BufReader::new(file), schema)
    }
}

/// Reads the columns of `schema` from CSV text with a header row
pub fn read_frame_from<F: Float, R: Read>(reader: R, schema: &FrameSchema) -> Result<Frame<F>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(schema.delimiter)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let positions = schema
        .columns
        .iter()
        .map(|(name, _)| {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut numeric: Vec<Vec<F>> = vec![Vec::new(); schema.columns.len()];
    let mut categorical: Vec<Vec<Option<String>>> = vec![Vec::new(); schema.columns.len()];

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());

        for (idx, ((name, kind), &position)) in schema.columns.iter().zip(&positions).enumerate() {
            let field = record.get(position).unwrap_or("");
            let missing = schema.is_missing(field);

            match kind {
                ColumnKind::Numeric if missing => numeric[idx].push(F::nan()),
                ColumnKind::Numeric => {
                    let value = field.trim().parse::<f64>().map_err(|_| {
                        DatasetError::ParseNumber {
                            line,
                            column: name.clone(),
                            value: field.to_string(),
                        }
                    })?;
                    numeric[idx].push(F::cast(value));
                }
                ColumnKind::Categorical if missing => categorical[idx].push(None),
                ColumnKind::Categorical => categorical[idx].push(Some(field.to_string())),
            }
        }
    }

    let mut frame = Frame::new();
    for (((name, kind), numeric), categorical) in
        schema.columns.iter().zip(numeric).zip(categorical)
    {
        let column = match kind {
            ColumnKind::Numeric => Column::Numeric(Array1::from(numeric)),
            ColumnKind::Categorical => Column::Categorical(Array1::from(categorical)),
        };
        debug!(column = %name, missing = column.n_missing(), "read column");
        frame.push_column(name.clone(), column)?;
    }

    info!(rows = frame.nrows(), columns = frame.ncols(), "read table");

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    const TABLE: &str = "\
title,rating,runtime,score
Heat,R,170,87
\"Up, Up\",PG,NA,
Clue,,94,n/a
";

    fn schema() -> FrameSchema {
        FrameSchema::new()
            .numeric("score")
            .categorical("rating")
            .numeric("runtime")
    }

    #[test]
    fn reads_columns_in_schema_order() -> Result<()> {
        let frame: Frame<f64> = read_frame_from(TABLE.as_bytes(), &schema())?;

        assert_eq!(frame.names(), &["score", "rating", "runtime"]);
        assert_eq!(frame.nrows(), 3);

        let rating = frame.categorical(&["rating"])?;
        assert_eq!(rating[[0, 0]], Some("R".to_string()));
        assert_eq!(rating[[2, 0]], None);

        let numbers = frame.numeric(&["score", "runtime"])?;
        assert_eq!(numbers[[0, 0]], 87.);
        assert!(numbers[[1, 0]].is_nan());
        assert!(numbers[[2, 0]].is_nan());
        assert!(numbers[[1, 1]].is_nan());
        assert_eq!(numbers[[2, 1]], 94.);

        Ok(())
    }

    #[test]
    fn custom_na_values_and_delimiter() -> Result<()> {
        let table = "name;score\na;-\nb;3.5\nNA;1\n";
        let schema = FrameSchema::new()
            .categorical("name")
            .numeric("score")
            .delimiter(b';')
            .na_values(&["-"]);
        let frame: Frame<f32> = read_frame_from(table.as_bytes(), &schema)?;

        assert_eq!(frame.column("score")?.n_missing(), 1);
        // only the configured tokens are missing
        assert_eq!(frame.column("name")?.n_missing(), 0);

        Ok(())
    }

    #[test]
    fn reports_unparsable_numbers() {
        let table = "score\n1\n2\nhigh\n";
        let result: Result<Frame<f64>> =
            read_frame_from(table.as_bytes(), &FrameSchema::new().numeric("score"));

        match result {
            Err(DatasetError::ParseNumber {
                line,
                column,
                value,
            }) => {
                assert_eq!(line, 4);
                assert_eq!(column, "score");
                assert_eq!(value, "high");
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn reports_missing_columns() {
        let result: Result<Frame<f64>> =
            read_frame_from(TABLE.as_bytes(), &FrameSchema::new().numeric("budget"));

        assert!(matches!(result, Err(DatasetError::MissingColumn(name)) if name == "budget"));
    }

    #[test]
    fn reads_gzip_files() -> Result<()> {
        let path = std::env::temp_dir().join(format!("reel_reader_{}.csv.gz", std::process::id()));
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(TABLE.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let frame: Result<Frame<f64>> = read_frame(&path, &schema());
        std::fs::remove_file(&path).unwrap();
        assert_eq!(frame?.nrows(), 3);

        Ok(())
    }

    #[test]
    fn missing_file() {
        let result: Result<Frame<f64>> = read_frame("does/not/exist.csv", &schema());
        assert!(matches!(result, Err(DatasetError::Io { .. })));
    }
}
