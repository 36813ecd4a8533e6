//! Dataset loading: delimited text file to transaction matrix.
//!
//! Two source shapes are supported and normalized into the same matrix
//! representation: a multi-valued basket column (delimiter-separated token
//! lists) or pre-encoded boolean-like columns, one token each.

pub mod coerce;
pub mod matrix;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::concat_batches;
use arrow::compute::kernels::cast;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::config::EngineConfig;
use crate::error::{Result, RulesEngineError};
use coerce::{ColumnCoercion, coerce_column};
use matrix::TransactionMatrix;

/// The two source shapes a dataset file can take.
#[derive(Debug)]
pub enum DatasetSource {
    /// One delimiter-separated token list per transaction
    Baskets(Vec<Vec<String>>),
    /// Pre-encoded boolean-like columns, one token each
    PreEncoded(Vec<(String, Vec<bool>)>),
}

/// Read the dataset at `path` and build the transaction matrix.
///
/// # Errors
/// Fails when the file is missing or unreadable, when neither a basket
/// column nor any boolean-coercible column exists, or when the vocabulary
/// is empty after dropping all-zero columns.
pub fn load_dataset(path: &Path, config: &EngineConfig) -> Result<TransactionMatrix> {
    let batch = read_delimited(path, config)?;
    let matrix = match classify_source(&batch, config)? {
        DatasetSource::Baskets(rows) => matrix_from_baskets(&rows)?,
        DatasetSource::PreEncoded(columns) => TransactionMatrix::from_columns(columns)?,
    };
    info!(
        "loaded {} transactions over {} tokens from {}",
        matrix.num_rows(),
        matrix.num_tokens(),
        path.display()
    );
    Ok(matrix)
}

/// Read the whole delimited file into a single record batch, inferring the
/// schema from the full file so 0/1 columns are detected exactly.
fn read_delimited(path: &Path, config: &EngineConfig) -> Result<RecordBatch> {
    let mut file = File::open(path).map_err(|e| RulesEngineError::io(path, e))?;
    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(&mut file, None)?;
    file.rewind().map_err(|e| RulesEngineError::io(path, e))?;

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_format(format)
        .with_batch_size(config.batch_size)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    if batches.is_empty() {
        return Err(RulesEngineError::Dataset(format!(
            "dataset {} contains no transactions",
            path.display()
        )));
    }

    let schema = batches[0].schema();
    Ok(concat_batches(&schema, &batches)?)
}

/// Decide which source shape the batch has. The basket column wins when
/// present; otherwise every column is run through the coercion strategies.
fn classify_source(batch: &RecordBatch, config: &EngineConfig) -> Result<DatasetSource> {
    if let Some((idx, _)) = batch.schema().column_with_name(&config.basket_column) {
        let rows = basket_rows(batch.column(idx), config.basket_delimiter)?;
        return Ok(DatasetSource::Baskets(rows));
    }

    let mut columns = Vec::new();
    for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
        match coerce_column(array) {
            ColumnCoercion::Coerced(values) => columns.push((field.name().clone(), values)),
            ColumnCoercion::Rejected => {
                debug!("excluding non boolean-like column '{}'", field.name());
            }
        }
    }
    if columns.is_empty() {
        return Err(RulesEngineError::Dataset(format!(
            "could not infer item columns: provide 0/1 one-hot columns or a '{}' column",
            config.basket_column
        )));
    }
    Ok(DatasetSource::PreEncoded(columns))
}

/// Split each basket value into trimmed, non-empty sub-tokens. Missing
/// values are empty baskets.
fn basket_rows(array: &ArrayRef, delimiter: char) -> Result<Vec<Vec<String>>> {
    let array = if array.data_type() == &DataType::Utf8 {
        array.clone()
    } else {
        cast::cast(array, &DataType::Utf8)?
    };
    let strings = array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RulesEngineError::Dataset("basket column is not readable as text".to_string()))?;

    let mut rows = Vec::with_capacity(strings.len());
    for i in 0..strings.len() {
        if strings.is_null(i) {
            rows.push(Vec::new());
            continue;
        }
        rows.push(
            strings
                .value(i)
                .split(delimiter)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        );
    }
    Ok(rows)
}

/// One-hot encode basket rows: the vocabulary is the set of distinct
/// sub-tokens, each becoming one occurrence column.
fn matrix_from_baskets(rows: &[Vec<String>]) -> Result<TransactionMatrix> {
    let vocabulary: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.iter().map(String::as_str))
        .collect();

    let index: FxHashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, token)| (*token, i))
        .collect();
    let mut columns: Vec<(String, Vec<bool>)> = vocabulary
        .iter()
        .map(|token| ((*token).to_string(), vec![false; rows.len()]))
        .collect();

    for (row_idx, row) in rows.iter().enumerate() {
        for token in row {
            if let Some(&col) = index.get(token.as_str()) {
                columns[col].1[row_idx] = true;
            }
        }
    }
    TransactionMatrix::from_columns(columns)
}
