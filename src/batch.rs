//! Streaming batch decoder.
//!
//! Result data arrives as a self-describing Arrow IPC stream: one schema
//! block, zero or more data blocks, then an end-of-stream marker. The
//! frame decoder consumes the leading 4-byte continuation marker while
//! dispatching on the first byte, so the readers here re-prepend it to
//! hand the IPC reader a byte-exact stream.
//!
//! Cell extraction goes through a decoder registry keyed on the declared
//! column type; an unregistered type is a hard decode error, never a
//! silent truncation.

use std::io::{Cursor, Read};

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Date32Array, Date64Array, Decimal128Array,
    Decimal256Array, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array, Int64Array,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, Schema, TimeUnit};
use arrow::ipc::reader::StreamReader;
use arrow::record_batch::RecordBatch;
use chrono::DateTime;

use crate::error::{LunaError, LunaResult};
use crate::value::Value;

/// The IPC stream continuation marker, consumed by the frame decoder.
pub(crate) const STREAM_MAGIC: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Decode all batches from a stream positioned right after the
/// continuation marker.
///
/// The stream's own end marker delimits it; nothing past that marker is
/// consumed, so the session's framing stays aligned.
pub(crate) fn read_stream<R: Read>(input: R) -> LunaResult<Vec<RecordBatch>> {
    let full = Cursor::new(STREAM_MAGIC).chain(input);
    // The stream reader issues exact-length reads; nothing past the end
    // marker is consumed, so bytes of the next response frame survive.
    let reader = StreamReader::try_new(full, None)
        .map_err(|e| LunaError::Protocol(format!("bad batch stream header: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| LunaError::Protocol(format!("bad batch stream block: {e}")))?;
        batches.push(batch);
    }
    Ok(batches)
}

/// Read the stream to its end marker and discard every batch.
///
/// Execute commands may still receive columnar data; leaving it unread
/// would desynchronize the next command's framing.
pub(crate) fn drain_stream<R: Read>(input: R) -> LunaResult<()> {
    let full = Cursor::new(STREAM_MAGIC).chain(input);
    let reader = StreamReader::try_new(full, None)
        .map_err(|e| LunaError::Protocol(format!("bad batch stream header: {e}")))?;
    for batch in reader {
        batch.map_err(|e| LunaError::Protocol(format!("bad batch stream block: {e}")))?;
    }
    Ok(())
}

/// Decode batches out of a fully buffered payload (the `$` bulk path).
pub(crate) fn read_buffered(payload: &[u8]) -> LunaResult<Vec<RecordBatch>> {
    let reader = StreamReader::try_new(Cursor::new(payload), None)
        .map_err(|e| LunaError::Decode(format!("bad buffered batch payload: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.map_err(|e| LunaError::Decode(format!("bad batch block: {e}")))?);
    }
    Ok(batches)
}

/// Fail fast if any declared column type has no registered decoder.
pub(crate) fn ensure_supported(schema: &Schema) -> LunaResult<()> {
    for field in schema.fields() {
        if decoder_for(field.data_type()).is_none() {
            return Err(LunaError::Decode(format!(
                "unsupported column type {:?} for column {:?}",
                field.data_type(),
                field.name()
            )));
        }
    }
    Ok(())
}

/// Materialize one cell. Absent cells surface as `Value::Null` regardless
/// of declared type.
pub(crate) fn decode_cell(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let decode = decoder_for(col.data_type()).ok_or_else(|| {
        LunaError::Decode(format!("unsupported column type {:?}", col.data_type()))
    })?;
    decode(col, row)
}

/// One entry in the cell-decoder registry.
type CellDecoder = fn(&ArrayRef, usize) -> LunaResult<Value>;

/// Look up the decoder for a declared column type.
fn decoder_for(data_type: &DataType) -> Option<CellDecoder> {
    match data_type {
        DataType::Boolean => Some(decode_bool),
        DataType::Int8 => Some(decode_int8),
        DataType::Int16 => Some(decode_int16),
        DataType::Int32 => Some(decode_int32),
        DataType::Int64 => Some(decode_int64),
        DataType::UInt8 => Some(decode_uint8),
        DataType::UInt16 => Some(decode_uint16),
        DataType::UInt32 => Some(decode_uint32),
        DataType::UInt64 => Some(decode_uint64),
        DataType::Float32 => Some(decode_float32),
        DataType::Float64 => Some(decode_float64),
        DataType::Utf8 => Some(decode_utf8),
        DataType::Binary => Some(decode_binary),
        DataType::Date32 => Some(decode_date32),
        DataType::Date64 => Some(decode_date64),
        DataType::Timestamp(_, _) => Some(decode_timestamp),
        DataType::Decimal128(_, _) => Some(decode_decimal128),
        DataType::Decimal256(_, _) => Some(decode_decimal256),
        _ => None,
    }
}

fn downcast<T: 'static>(col: &ArrayRef) -> LunaResult<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| LunaError::Decode("column data does not match its declared type".into()))
}

fn decode_bool(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Bool(downcast::<BooleanArray>(col)?.value(row)))
}

fn decode_int8(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Int(downcast::<Int8Array>(col)?.value(row) as i64))
}

fn decode_int16(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Int(downcast::<Int16Array>(col)?.value(row) as i64))
}

fn decode_int32(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Int(downcast::<Int32Array>(col)?.value(row) as i64))
}

fn decode_int64(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Int(downcast::<Int64Array>(col)?.value(row)))
}

fn decode_uint8(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::UInt(downcast::<UInt8Array>(col)?.value(row) as u64))
}

fn decode_uint16(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::UInt(downcast::<UInt16Array>(col)?.value(row) as u64))
}

fn decode_uint32(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::UInt(downcast::<UInt32Array>(col)?.value(row) as u64))
}

fn decode_uint64(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::UInt(downcast::<UInt64Array>(col)?.value(row)))
}

fn decode_float32(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Float(downcast::<Float32Array>(col)?.value(row) as f64))
}

fn decode_float64(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Float(downcast::<Float64Array>(col)?.value(row)))
}

fn decode_utf8(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Text(
        downcast::<StringArray>(col)?.value(row).to_string(),
    ))
}

fn decode_binary(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    Ok(Value::Bytes(downcast::<BinaryArray>(col)?.value(row).to_vec()))
}

fn decode_date32(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    let days = downcast::<Date32Array>(col)?.value(row) as i64;
    let instant = DateTime::from_timestamp(days * 86_400, 0)
        .ok_or_else(|| LunaError::Decode(format!("date32 out of range: {days} days")))?;
    Ok(Value::Date(instant.date_naive()))
}

fn decode_date64(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    let millis = downcast::<Date64Array>(col)?.value(row);
    let instant = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| LunaError::Decode(format!("date64 out of range: {millis} ms")))?;
    Ok(Value::Timestamp(instant))
}

fn decode_timestamp(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    let unit = match col.data_type() {
        DataType::Timestamp(unit, _) => unit.clone(),
        other => {
            return Err(LunaError::Decode(format!(
                "expected timestamp column, got {other:?}"
            )));
        }
    };

    let instant = match unit {
        TimeUnit::Second => {
            let v = downcast::<TimestampSecondArray>(col)?.value(row);
            DateTime::from_timestamp(v, 0)
        }
        TimeUnit::Millisecond => {
            let v = downcast::<TimestampMillisecondArray>(col)?.value(row);
            DateTime::from_timestamp_millis(v)
        }
        TimeUnit::Microsecond => {
            let v = downcast::<TimestampMicrosecondArray>(col)?.value(row);
            DateTime::from_timestamp_micros(v)
        }
        TimeUnit::Nanosecond => {
            let v = downcast::<TimestampNanosecondArray>(col)?.value(row);
            DateTime::from_timestamp(v.div_euclid(1_000_000_000), v.rem_euclid(1_000_000_000) as u32)
        }
    };

    instant
        .map(Value::Timestamp)
        .ok_or_else(|| LunaError::Decode("timestamp out of range".into()))
}

fn decode_decimal128(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    let scale = match col.data_type() {
        DataType::Decimal128(_, scale) => *scale,
        _ => 0,
    };
    let raw = downcast::<Decimal128Array>(col)?.value(row);
    Ok(Value::Decimal(format_decimal(&raw.to_string(), scale)))
}

fn decode_decimal256(col: &ArrayRef, row: usize) -> LunaResult<Value> {
    let scale = match col.data_type() {
        DataType::Decimal256(_, scale) => *scale,
        _ => 0,
    };
    let raw = downcast::<Decimal256Array>(col)?.value(row);
    Ok(Value::Decimal(format_decimal(&raw.to_string(), scale)))
}

/// Render an unscaled integer as a decimal string with `scale` fractional
/// digits.
fn format_decimal(unscaled: &str, scale: i8) -> String {
    let (sign, digits) = match unscaled.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", unscaled),
    };

    if scale <= 0 {
        let zeros = "0".repeat((-scale) as usize);
        return format!("{sign}{digits}{zeros}");
    }

    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits.to_string()
    };
    let split = padded.len() - scale;
    format!("{sign}{}.{}", &padded[..split], &padded[split..])
}
