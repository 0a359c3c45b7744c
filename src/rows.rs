//! Forward-only cursor over decoded batches.

use arrow::record_batch::RecordBatch;

use crate::batch;
use crate::error::LunaResult;
use crate::value::Value;

/// A query result: an ordered sequence of batches plus a cursor.
///
/// Column identity is positional; names come from the first batch's
/// schema and are not guaranteed unique. Iteration order is batch order,
/// then row order within a batch.
#[derive(Debug)]
pub struct Rows {
    batches: Vec<RecordBatch>,
    columns: Vec<String>,
    batch_idx: usize,
    row_idx: usize,
    closed: bool,
}

impl Rows {
    /// Wrap decoded batches, failing fast if any declared column type has
    /// no registered decoder.
    pub(crate) fn new(batches: Vec<RecordBatch>) -> LunaResult<Self> {
        let mut columns = Vec::new();
        if let Some(first) = batches.first() {
            let schema = first.schema();
            batch::ensure_supported(&schema)?;
            columns = schema.fields().iter().map(|f| f.name().clone()).collect();
        }

        Ok(Self {
            batches,
            columns,
            batch_idx: 0,
            row_idx: 0,
            closed: false,
        })
    }

    /// A result with zero batches (degenerate non-stream responses).
    pub(crate) fn empty() -> Self {
        Self {
            batches: Vec::new(),
            columns: Vec::new(),
            batch_idx: 0,
            row_idx: 0,
            closed: false,
        }
    }

    /// Column names in schema order; empty when the result has no batches.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Advance one row, materializing its cells positionally.
    ///
    /// Returns `Ok(None)` once all batches are exhausted, or after
    /// `close`.
    pub fn next(&mut self) -> LunaResult<Option<Vec<Value>>> {
        if self.closed {
            return Ok(None);
        }

        while self.batch_idx < self.batches.len() {
            let current = &self.batches[self.batch_idx];
            if self.row_idx < current.num_rows() {
                let mut cells = Vec::with_capacity(current.num_columns());
                for col in current.columns() {
                    cells.push(batch::decode_cell(col, self.row_idx)?);
                }
                self.row_idx += 1;
                return Ok(Some(cells));
            }

            self.batch_idx += 1;
            self.row_idx = 0;
        }

        Ok(None)
    }

    /// Release all retained batches. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.batches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch_of(ids: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(ids))]).unwrap()
    }

    #[test]
    fn test_columns_from_first_batch() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("v", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(StringArray::from(vec![None::<&str>])),
            ],
        )
        .unwrap();

        let rows = Rows::new(vec![batch]).unwrap();
        assert_eq!(rows.columns(), &["id".to_string(), "v".to_string()]);
    }

    #[test]
    fn test_empty_result_has_no_columns() {
        let mut rows = Rows::empty();
        assert!(rows.columns().is_empty());
        assert_eq!(rows.next().unwrap(), None);
    }

    #[test]
    fn test_next_crosses_batch_boundaries_in_order() {
        let mut rows = Rows::new(vec![batch_of(vec![1, 2]), batch_of(vec![3]), batch_of(vec![4, 5])])
            .unwrap();

        let mut seen = Vec::new();
        while let Some(row) = rows.next().unwrap() {
            seen.push(row[0].as_i64().unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        // Exhausted: stays at end
        assert_eq!(rows.next().unwrap(), None);
    }

    #[test]
    fn test_large_batches_yield_every_row_once() {
        let first: Vec<i64> = (0..500).collect();
        let second: Vec<i64> = (500..1000).collect();
        let mut rows = Rows::new(vec![batch_of(first), batch_of(second)]).unwrap();

        let mut count = 0i64;
        while let Some(row) = rows.next().unwrap() {
            assert_eq!(row[0].as_i64().unwrap(), count);
            count += 1;
        }
        assert_eq!(count, 1000);
    }

    #[test]
    fn test_null_cell_surfaces_as_null_marker() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("v", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(StringArray::from(vec![None::<&str>])),
            ],
        )
        .unwrap();

        let mut rows = Rows::new(vec![batch]).unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row[0], Value::Int(1));
        assert_eq!(row[1], Value::Null);
        assert_ne!(row[1], Value::Text(String::new()));
    }

    #[test]
    fn test_close_is_idempotent_and_ends_iteration() {
        let mut rows = Rows::new(vec![batch_of(vec![1, 2, 3])]).unwrap();
        assert!(rows.next().unwrap().is_some());

        rows.close();
        rows.close();
        assert_eq!(rows.next().unwrap(), None);
    }

    #[test]
    fn test_unsupported_schema_fails_construction() {
        use arrow::array::DurationSecondArray;
        use arrow::datatypes::TimeUnit;

        let schema = Arc::new(Schema::new(vec![Field::new(
            "d",
            DataType::Duration(TimeUnit::Second),
            false,
        )]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(DurationSecondArray::from(vec![1]))])
                .unwrap();
        assert!(Rows::new(vec![batch]).is_err());
    }
}
