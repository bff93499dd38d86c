use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::columns::{self, ColumnMap, parse_date, parse_item_id, parse_timestamp};
use super::model::{Dataset, Transaction};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the transactions dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one row per order item (the default export)
/// * `.json`    – `[{ "order_id": "...", "price": 12.5, ... }, ...]`
/// * `.parquet` – same columns; string, numeric, date and timestamp types
///
/// Line numbers in errors are 1-based and count the header, so the first
/// record is line 2 in every format.
pub fn load_file(path: &Path) -> Result<Dataset, DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => read_csv(BufReader::new(File::open(path)?))?,
        "json" => read_json(BufReader::new(File::open(path)?))?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(DataError::UnsupportedExtension(other.to_string())),
    };
    log::debug!("parsed {} rows from {}", rows.len(), path.display());

    Dataset::from_rows(rows, path)
}

// ---------------------------------------------------------------------------
// Row normalisation shared by all formats
// ---------------------------------------------------------------------------

/// Build a [`Transaction`] from a cell lookup. `cell(column)` returns the raw
/// text of that column for the current row, `None` for a null cell, or the
/// error hit while rendering the cell.
fn build_transaction<F>(line: usize, cell: F) -> Result<Transaction, DataError>
where
    F: Fn(&str) -> Result<Option<String>, DataError>,
{
    let optional = |col: &str| -> Result<Option<String>, DataError> {
        Ok(cell(col)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    };
    let required = |col: &str| -> Result<String, DataError> {
        optional(col)?.ok_or_else(|| DataError::MissingValue {
            line,
            column: col.to_string(),
        })
    };
    let bad_timestamp = |col: &str, value: String| DataError::InvalidTimestamp {
        line,
        column: col.to_string(),
        value,
    };
    let bad_number = |col: &str, value: String| DataError::InvalidNumber {
        line,
        column: col.to_string(),
        value,
    };
    let timestamp = |col: &str| -> Result<NaiveDateTime, DataError> {
        let v = required(col)?;
        parse_timestamp(&v).ok_or_else(|| bad_timestamp(col, v))
    };
    let optional_timestamp = |col: &str| -> Result<Option<NaiveDateTime>, DataError> {
        match optional(col)? {
            Some(v) => parse_timestamp(&v)
                .map(Some)
                .ok_or_else(|| bad_timestamp(col, v)),
            None => Ok(None),
        }
    };

    let item = required(columns::ORDER_ITEM_ID)?;
    let order_item_id =
        parse_item_id(&item).ok_or_else(|| bad_number(columns::ORDER_ITEM_ID, item))?;

    let raw_price = required(columns::PRICE)?;
    let price = raw_price
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| bad_number(columns::PRICE, raw_price))?;

    let raw_date = required(columns::PURCHASE_DATE)?;
    let order_purchase_date =
        parse_date(&raw_date).ok_or_else(|| bad_timestamp(columns::PURCHASE_DATE, raw_date))?;

    Ok(Transaction {
        order_id: required(columns::ORDER_ID)?,
        order_item_id,
        customer_id: required(columns::CUSTOMER_ID)?,
        customer_unique_id: required(columns::CUSTOMER_UNIQUE_ID)?,
        customer_city: required(columns::CUSTOMER_CITY)?,
        customer_state: required(columns::CUSTOMER_STATE)?,
        order_purchase_timestamp: timestamp(columns::PURCHASE_TIMESTAMP)?,
        order_approved_at: optional_timestamp(columns::APPROVED_AT)?,
        order_delivered_carrier_date: optional_timestamp(columns::DELIVERED_CARRIER)?,
        review_answer_timestamp: optional_timestamp(columns::REVIEW_ANSWER)?,
        order_purchase_date,
        price,
        product_category: optional(columns::CATEGORY)?,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse CSV from any reader. Columns beyond the required set are ignored.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Transaction>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let col_map = ColumnMap::from_headers(rdr.headers()?.iter());
    col_map.validate()?;

    let mut rows = Vec::new();
    for (row_no, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(row_no + 2);
        let tx = build_transaction(line, |col| {
            Ok(col_map
                .index(col)
                .and_then(|i| record.get(i))
                .map(str::to_string))
        })?;
        rows.push(tx);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by
/// `df.to_json(orient='records', date_format='iso')`. Timestamps must be
/// strings; epoch-millisecond integers are rejected.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<Transaction>, DataError> {
    let records: Vec<serde_json::Map<String, JsonValue>> = serde_json::from_reader(reader)?;

    if let Some(first) = records.first() {
        ColumnMap::from_headers(first.keys().map(String::as_str)).validate()?;
    }

    records
        .iter()
        .enumerate()
        .map(|(i, obj)| build_transaction(i + 2, |col| Ok(obj.get(col).and_then(json_cell))))
        .collect()
}

fn json_cell(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the transaction columns.
///
/// Each cell is rendered through Arrow's display formatter, so string,
/// integer, float, `Date32` and `Timestamp` columns all work. Works with
/// files written by both Pandas and Polars.
///
/// Time-zone-aware timestamp columns are read as UTC wall-clock time.
fn load_parquet(path: &Path) -> Result<Vec<Transaction>, DataError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        let col_map = ColumnMap::from_headers(schema.fields().iter().map(|f| f.name().as_str()));
        col_map.validate()?;

        let arrays = batch
            .columns()
            .iter()
            .map(utc_naive)
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            let line = rows.len() + 2;
            let tx = build_transaction(line, |col| {
                let Some(array) = col_map.index(col).map(|i| &arrays[i]) else {
                    return Ok(None);
                };
                if array.is_null(row) {
                    return Ok(None);
                }
                Ok(Some(array_value_to_string(array, row)?))
            })?;
            rows.push(tx);
        }
    }
    Ok(rows)
}

/// Drop the zone from `Timestamp(_, Some(tz))` columns. The stored values
/// are UTC instants, so the result formats as UTC wall-clock time.
fn utc_naive(array: &ArrayRef) -> Result<ArrayRef, DataError> {
    match array.data_type() {
        DataType::Timestamp(unit, Some(_)) => {
            Ok(cast(array.as_ref(), &DataType::Timestamp(*unit, None))?)
        }
        _ => Ok(Arc::clone(array)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{Float64Array, Int64Array, StringArray, TimestampSecondArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::model::fixtures::{date, ts};

    const HDR: &str = concat!(
        "order_id,order_item_id,customer_id,customer_unique_id,customer_city,",
        "customer_state,order_purchase_timestamp,order_approved_at,",
        "order_delivered_carrier_date,review_answer_timestamp,order_purchase_date,",
        "price,product_category_name_english,freight_value"
    );

    fn csv_with(rows: &[&str]) -> String {
        let mut s = HDR.to_string();
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s
    }

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const ROW_A: &str = "o1,1,c1,u1,sao paulo,SP,2017-10-02 10:56:33,2017-10-02 11:07:15,2017-10-04 19:55:00,2017-10-19 00:00:00,2017-10-02,29.99,housewares,8.72";
    const ROW_B: &str = "o2,1.0,c2,u2,barreiras,BA,2018-07-24 20:41:37,,,,2018-07-24,118.7,,22.76";

    #[test]
    fn test_read_csv_parses_rows() {
        let rows = read_csv(csv_with(&[ROW_A, ROW_B]).as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let a = &rows[0];
        assert_eq!(a.order_id, "o1");
        assert_eq!(a.order_item_id, 1);
        assert_eq!(a.customer_unique_id, "u1");
        assert_eq!(a.order_purchase_timestamp, ts("2017-10-02 10:56:33"));
        assert_eq!(a.order_approved_at, Some(ts("2017-10-02 11:07:15")));
        assert_eq!(a.order_purchase_date, date("2017-10-02"));
        assert!((a.price - 29.99).abs() < 1e-9);
        assert_eq!(a.product_category.as_deref(), Some("housewares"));

        let b = &rows[1];
        assert_eq!(b.order_item_id, 1);
        assert_eq!(b.order_approved_at, None);
        assert_eq!(b.order_delivered_carrier_date, None);
        assert_eq!(b.product_category, None);
    }

    #[test]
    fn test_read_csv_with_bom() {
        let content = format!("\u{feff}{}", csv_with(&[ROW_A]));
        assert_eq!(read_csv(content.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn test_read_csv_missing_columns() {
        let err = read_csv("order_id,price\no1,1.0".as_bytes()).unwrap_err();
        match err {
            DataError::MissingColumns(cols) => {
                assert!(cols.contains(&"customer_unique_id".to_string()));
                assert!(cols.contains(&"order_purchase_timestamp".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_read_csv_bad_timestamp_reports_line() {
        let bad = ROW_B.replace("2018-07-24 20:41:37", "24/07/2018 20:41");
        let err = read_csv(csv_with(&[ROW_A, &bad]).as_bytes()).unwrap_err();
        match err {
            DataError::InvalidTimestamp { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, "order_purchase_timestamp");
                assert_eq!(value, "24/07/2018 20:41");
            }
            other => panic!("expected InvalidTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_read_csv_bad_optional_timestamp_is_an_error() {
        let bad = ROW_B.replacen(",,,,", ",garbage,,,", 1);
        let err = read_csv(csv_with(&[&bad]).as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidTimestamp { ref column, .. } if column == "order_approved_at"
        ));
    }

    #[test]
    fn test_read_csv_bad_price() {
        let bad = ROW_A.replace("29.99", "n/a");
        let err = read_csv(csv_with(&[&bad]).as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn test_read_csv_missing_required_value() {
        let bad = ROW_A.replacen("u1", "", 1);
        let err = read_csv(csv_with(&[&bad]).as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingValue { line: 2, ref column } if column == "customer_unique_id"
        ));
    }

    #[test]
    fn test_read_csv_ragged_row_is_malformed() {
        let err = read_csv(csv_with(&["o1,1,c1"]).as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Csv(_)));
    }

    #[test]
    fn test_load_file_csv() {
        let f = write_temp(".csv", &csv_with(&[ROW_A, ROW_B]));
        let ds = load_file(f.path()).unwrap();
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.first_purchase_date(), date("2017-10-02"));
        assert_eq!(ds.last_purchase_date(), date("2018-07-24"));
        assert_eq!(ds.source, f.path());
    }

    #[test]
    fn test_load_file_missing() {
        let err = load_file(Path::new("/nonexistent/main_data.csv")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }

    #[test]
    fn test_load_file_header_only_is_empty() {
        let f = write_temp(".csv", HDR);
        assert!(matches!(load_file(f.path()).unwrap_err(), DataError::EmptyDataset));
    }

    #[test]
    fn test_load_file_unsupported_extension() {
        let f = write_temp(".xlsx", "");
        match load_file(f.path()).unwrap_err() {
            DataError::UnsupportedExtension(ext) => assert_eq!(ext, "xlsx"),
            other => panic!("expected UnsupportedExtension, got {other:?}"),
        }
    }

    #[test]
    fn test_load_file_json() {
        let json = r#"[
            {"order_id": "o1", "order_item_id": 2, "customer_id": "c1",
             "customer_unique_id": "u1", "customer_city": "rio de janeiro",
             "customer_state": "RJ", "order_purchase_timestamp": "2018-01-01 09:00:00",
             "order_approved_at": null, "order_delivered_carrier_date": null,
             "review_answer_timestamp": "2018-01-10 00:00:00",
             "order_purchase_date": "2018-01-01", "price": 45.5,
             "product_category_name_english": "toys"}
        ]"#;
        let f = write_temp(".json", json);
        let ds = load_file(f.path()).unwrap();
        let row = &ds.rows[0];
        assert_eq!(row.order_item_id, 2);
        assert_eq!(row.customer_state, "RJ");
        assert_eq!(row.order_approved_at, None);
        assert_eq!(row.review_answer_timestamp, Some(ts("2018-01-10 00:00:00")));
        assert!((row.price - 45.5).abs() < 1e-9);
    }

    #[test]
    fn test_read_json_iso_dates() {
        let record = |purchase: &str| {
            format!(
                r#"[{{"order_id": "o1", "order_item_id": 1, "customer_id": "c1",
                    "customer_unique_id": "u1", "customer_city": "recife",
                    "customer_state": "PE", "order_purchase_timestamp": {purchase},
                    "order_approved_at": null, "order_delivered_carrier_date": null,
                    "review_answer_timestamp": null,
                    "order_purchase_date": "2018-01-01T00:00:00.000Z", "price": 10.0,
                    "product_category_name_english": null}}]"#
            )
        };

        let rows = read_json(record(r#""2018-01-01T09:00:00.000Z""#).as_bytes()).unwrap();
        assert_eq!(rows[0].order_purchase_timestamp, ts("2018-01-01 09:00:00"));
        assert_eq!(rows[0].order_purchase_date, date("2018-01-01"));

        let err = read_json(record("1514797200000").as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::InvalidTimestamp { line: 2, .. }));
    }

    #[test]
    fn test_load_file_json_not_an_array() {
        let f = write_temp(".json", r#"{"order_id": "o1"}"#);
        assert!(matches!(load_file(f.path()).unwrap_err(), DataError::Json(_)));
    }

    /// One-row Parquet file; `purchase` supplies the purchase timestamp column.
    fn write_parquet(purchase: ArrayRef) -> tempfile::NamedTempFile {
        let text = |v: &str| -> ArrayRef { Arc::new(StringArray::from(vec![v])) };
        let empty = || -> ArrayRef { Arc::new(StringArray::from(vec![None::<&str>])) };

        let fields = vec![
            Field::new("order_id", DataType::Utf8, false),
            Field::new("order_item_id", DataType::Int64, false),
            Field::new("customer_id", DataType::Utf8, false),
            Field::new("customer_unique_id", DataType::Utf8, false),
            Field::new("customer_city", DataType::Utf8, false),
            Field::new("customer_state", DataType::Utf8, false),
            Field::new("order_purchase_timestamp", purchase.data_type().clone(), false),
            Field::new("order_approved_at", DataType::Utf8, true),
            Field::new("order_delivered_carrier_date", DataType::Utf8, true),
            Field::new("review_answer_timestamp", DataType::Utf8, true),
            Field::new("order_purchase_date", DataType::Utf8, false),
            Field::new("price", DataType::Float64, false),
            Field::new("product_category_name_english", DataType::Utf8, true),
        ];
        let columns: Vec<ArrayRef> = vec![
            text("o9"),
            Arc::new(Int64Array::from(vec![3])),
            text("c9"),
            text("u9"),
            text("curitiba"),
            text("PR"),
            purchase,
            empty(),
            empty(),
            empty(),
            text("2018-02-03"),
            Arc::new(Float64Array::from(vec![19.9])),
            text("garden_tools"),
        ];
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let f = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(f.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        f
    }

    #[test]
    fn test_load_file_parquet() {
        let purchase = ts("2018-02-03 14:15:16").and_utc().timestamp();
        let f = write_parquet(Arc::new(TimestampSecondArray::from(vec![purchase])));

        let ds = load_file(f.path()).unwrap();
        let row = &ds.rows[0];
        assert_eq!(row.order_id, "o9");
        assert_eq!(row.order_item_id, 3);
        assert_eq!(row.order_purchase_timestamp, ts("2018-02-03 14:15:16"));
        assert_eq!(row.order_approved_at, None);
        assert_eq!(row.product_category.as_deref(), Some("garden_tools"));
        assert!((row.price - 19.9).abs() < 1e-9);
    }

    #[test]
    fn test_load_file_parquet_zoned_timestamps_read_as_utc() {
        let purchase = ts("2018-02-03 14:15:16").and_utc().timestamp();
        for zone in ["UTC", "+03:00"] {
            let array = TimestampSecondArray::from(vec![purchase]).with_timezone(zone);
            let f = write_parquet(Arc::new(array));

            let ds = load_file(f.path()).unwrap();
            assert_eq!(ds.rows[0].order_purchase_timestamp, ts("2018-02-03 14:15:16"));
        }
    }
}
