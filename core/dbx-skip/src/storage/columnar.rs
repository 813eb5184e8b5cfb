//! Columnar output — scalar values and row→column conversion.
//!
//! Operators exchange rows of [`ScalarValue`]; [`ColumnarStore`] turns a
//! drained row stream back into an Arrow `RecordBatch` for callers.

use crate::error::{DbxError, DbxResult};
use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int32Builder, Int64Builder, StringBuilder,
};
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Represents a scalar value that can be stored in a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Boolean(bool),
}

impl ScalarValue {
    /// Get the Arrow DataType for this value.
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Null => DataType::Null,
            ScalarValue::Int32(_) => DataType::Int32,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
            ScalarValue::Boolean(_) => DataType::Boolean,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Integer view of the value; `None` for null.
    pub fn as_i64(&self) -> DbxResult<Option<i64>> {
        match self {
            ScalarValue::Null => Ok(None),
            ScalarValue::Int32(v) => Ok(Some(i64::from(*v))),
            ScalarValue::Int64(v) => Ok(Some(*v)),
            other => Err(DbxError::TypeMismatch {
                expected: "Int32|Int64".to_string(),
                actual: format!("{:?}", other.data_type()),
            }),
        }
    }

    /// Total order over non-null values used by sort and merge keys.
    ///
    /// Integers and floats compare numerically; otherwise values of different
    /// types order by type (Boolean < numeric < Utf8). Nulls sort after
    /// everything here; key comparators place them per `nulls_first`.
    pub fn total_cmp(&self, other: &ScalarValue) -> Ordering {
        use ScalarValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Greater,
            (_, Null) => Ordering::Less,
            (Int32(a), Int32(b)) => a.cmp(b),
            (Int32(a), Int64(b)) => i64::from(*a).cmp(b),
            (Int64(a), Int32(b)) => a.cmp(&i64::from(*b)),
            (Int64(a), Int64(b)) => a.cmp(b),
            (Float64(a), Float64(b)) => a.total_cmp(b),
            (Float64(a), Int32(b)) => a.total_cmp(&f64::from(*b)),
            (Float64(a), Int64(b)) => a.total_cmp(&(*b as f64)),
            (Int32(a), Float64(b)) => f64::from(*a).total_cmp(b),
            (Int64(a), Float64(b)) => (*a as f64).total_cmp(b),
            (Utf8(a), Utf8(b)) => a.cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            ScalarValue::Boolean(_) => 0,
            ScalarValue::Int32(_) | ScalarValue::Int64(_) | ScalarValue::Float64(_) => 1,
            ScalarValue::Utf8(_) => 2,
            ScalarValue::Null => 3,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => write!(f, "'{v}'"),
            ScalarValue::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// Row accumulator that converts an operator's output into a RecordBatch.
pub struct ColumnarStore {
    schema: Arc<Schema>,
    rows: Vec<Vec<ScalarValue>>,
}

impl ColumnarStore {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Append a row of values. Must match the schema's field count and types.
    pub fn append_row(&mut self, values: &[ScalarValue]) -> DbxResult<()> {
        let field_count = self.schema.fields().len();
        if values.len() != field_count {
            return Err(DbxError::Schema(format!(
                "expected {field_count} columns, got {}",
                values.len()
            )));
        }

        for (i, (value, field)) in values.iter().zip(self.schema.fields()).enumerate() {
            if value.is_null() {
                if !field.is_nullable() {
                    return Err(DbxError::Schema(format!(
                        "column {i} ({}) is not nullable",
                        field.name()
                    )));
                }
                continue;
            }
            if *field.data_type() != value.data_type() {
                return Err(DbxError::TypeMismatch {
                    expected: format!("column {i} ({}): {:?}", field.name(), field.data_type()),
                    actual: format!("{:?}", value.data_type()),
                });
            }
        }

        self.rows.push(values.to_vec());
        Ok(())
    }

    /// Convert accumulated rows into an Arrow RecordBatch, one column per rayon task.
    pub fn to_record_batch(&self) -> DbxResult<RecordBatch> {
        if self.rows.is_empty() {
            return Ok(RecordBatch::new_empty(Arc::clone(&self.schema)));
        }

        let columns: Vec<ArrayRef> = self
            .schema
            .fields()
            .par_iter()
            .enumerate()
            .map(|(col_idx, field)| self.build_column(col_idx, field.data_type()))
            .collect::<DbxResult<_>>()?;

        Ok(RecordBatch::try_new(Arc::clone(&self.schema), columns)?)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn build_column(&self, col_idx: usize, data_type: &DataType) -> DbxResult<ArrayRef> {
        macro_rules! build {
            ($builder:expr, $variant:ident) => {{
                let mut builder = $builder;
                for row in &self.rows {
                    match &row[col_idx] {
                        ScalarValue::$variant(v) => builder.append_value(v.clone()),
                        ScalarValue::Null => builder.append_null(),
                        other => {
                            return Err(DbxError::TypeMismatch {
                                expected: stringify!($variant).to_string(),
                                actual: format!("{other:?}"),
                            });
                        }
                    }
                }
                Ok(Arc::new(builder.finish()) as ArrayRef)
            }};
        }

        let len = self.rows.len();
        match data_type {
            DataType::Int32 => build!(Int32Builder::with_capacity(len), Int32),
            DataType::Int64 => build!(Int64Builder::with_capacity(len), Int64),
            DataType::Float64 => build!(Float64Builder::with_capacity(len), Float64),
            DataType::Utf8 => build!(StringBuilder::with_capacity(len, 256), Utf8),
            DataType::Boolean => build!(BooleanBuilder::with_capacity(len), Boolean),
            dt => Err(DbxError::Schema(format!("unsupported data type: {dt:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};
    use arrow::datatypes::Field;

    fn test_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]))
    }

    #[test]
    fn create_empty_store() {
        let store = ColumnarStore::new(test_schema());
        assert_eq!(store.row_count(), 0);
        let batch = store.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn append_and_convert() {
        let mut store = ColumnarStore::new(test_schema());
        store
            .append_row(&[ScalarValue::Int64(1), ScalarValue::Utf8("Alice".into())])
            .unwrap();
        store
            .append_row(&[ScalarValue::Int64(2), ScalarValue::Null])
            .unwrap();

        let batch = store.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);

        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.value(1), 2);
        let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(0), "Alice");
        assert!(names.is_null(1));
    }

    #[test]
    fn wrong_arity_rejected() {
        let mut store = ColumnarStore::new(test_schema());
        let err = store.append_row(&[ScalarValue::Int64(1)]).unwrap_err();
        assert!(matches!(err, DbxError::Schema(_)));
    }

    #[test]
    fn wrong_type_rejected() {
        let mut store = ColumnarStore::new(test_schema());
        let err = store
            .append_row(&[ScalarValue::Utf8("x".into()), ScalarValue::Null])
            .unwrap_err();
        assert!(matches!(err, DbxError::TypeMismatch { .. }));
    }

    #[test]
    fn null_in_non_nullable_column_rejected() {
        let mut store = ColumnarStore::new(test_schema());
        let err = store
            .append_row(&[ScalarValue::Null, ScalarValue::Null])
            .unwrap_err();
        assert!(matches!(err, DbxError::Schema(_)));
    }

    #[test]
    fn total_cmp_mixes_integer_widths() {
        assert_eq!(
            ScalarValue::Int32(3).total_cmp(&ScalarValue::Int64(3)),
            Ordering::Equal
        );
        assert_eq!(
            ScalarValue::Int64(2).total_cmp(&ScalarValue::Float64(2.5)),
            Ordering::Less
        );
        assert_eq!(
            ScalarValue::Null.total_cmp(&ScalarValue::Int32(0)),
            Ordering::Greater
        );
    }

    #[test]
    fn as_i64_accepts_integers_only() {
        assert_eq!(ScalarValue::Int32(7).as_i64().unwrap(), Some(7));
        assert_eq!(ScalarValue::Null.as_i64().unwrap(), None);
        assert!(ScalarValue::Utf8("7".into()).as_i64().is_err());
    }
}
