//! Boolean coercion strategies for pre-encoded item columns.
//!
//! Applied in a fixed order with early exit on first success: native
//! boolean, numeric 0/1, textual affirmative/negative. A column failing
//! every strategy is excluded from the vocabulary.

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::compute::kernels::cast;
use arrow::datatypes::DataType;

/// Outcome of coercing one source column into an item column.
#[derive(Debug)]
pub enum ColumnCoercion {
    /// The column is boolean-like; missing values map to false
    Coerced(Vec<bool>),
    /// The column cannot represent a 0/1 item and is excluded
    Rejected,
}

const AFFIRMATIVE: &[&str] = &["true", "t", "yes", "y", "1"];
const NEGATIVE: &[&str] = &["false", "f", "no", "n", "0"];

/// Try each coercion strategy in order, stopping at the first success.
#[must_use]
pub fn coerce_column(array: &ArrayRef) -> ColumnCoercion {
    coerce_native_boolean(array)
        .or_else(|| coerce_numeric_01(array))
        .or_else(|| coerce_textual(array))
        .map_or(ColumnCoercion::Rejected, ColumnCoercion::Coerced)
}

fn coerce_native_boolean(array: &ArrayRef) -> Option<Vec<bool>> {
    let bools = array.as_any().downcast_ref::<BooleanArray>()?;
    Some(
        (0..bools.len())
            .map(|i| !bools.is_null(i) && bools.value(i))
            .collect(),
    )
}

/// Numeric columns qualify only when every non-null value is exactly 0 or 1.
/// Casting to `Float64` first handles every integer and float width the CSV
/// reader may have inferred.
fn coerce_numeric_01(array: &ArrayRef) -> Option<Vec<bool>> {
    if !array.data_type().is_numeric() {
        return None;
    }
    let floats = cast::cast(array, &DataType::Float64).ok()?;
    let floats = floats.as_any().downcast_ref::<Float64Array>()?;

    let mut values = Vec::with_capacity(floats.len());
    for i in 0..floats.len() {
        if floats.is_null(i) {
            values.push(false);
            continue;
        }
        let v = floats.value(i);
        if v == 0.0 {
            values.push(false);
        } else if v == 1.0 {
            values.push(true);
        } else {
            return None;
        }
    }
    Some(values)
}

/// Text columns qualify when every trimmed, lowercased value is drawn from
/// the affirmative or negative set, or is empty/missing.
fn coerce_textual(array: &ArrayRef) -> Option<Vec<bool>> {
    let strings = array.as_any().downcast_ref::<StringArray>()?;

    let mut values = Vec::with_capacity(strings.len());
    for i in 0..strings.len() {
        if strings.is_null(i) {
            values.push(false);
            continue;
        }
        let v = strings.value(i).trim().to_ascii_lowercase();
        if v.is_empty() || NEGATIVE.contains(&v.as_str()) {
            values.push(false);
        } else if AFFIRMATIVE.contains(&v.as_str()) {
            values.push(true);
        } else {
            return None;
        }
    }
    Some(values)
}
