use sfx_core::RowValue;
use sqlx::{postgres::PgRow, Column, Row, TypeInfo, ValueRef};

/// Decodes one cell of a `PgRow` into the dialect-neutral `RowValue` the
/// core crates consume. The extraction SQL's columns are all aliased
/// `c0..c{W-1}` by the SQL Generator and their source type varies branch to
/// branch (a `NULL` literal in one branch, a real column in another), so
/// this reads the column's runtime `TypeInfo` rather than relying on a
/// compile-time `sqlx::query!` shape.
pub fn decode_cell(row: &PgRow, index: usize) -> Result<RowValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(RowValue::Null);
    }
    let type_name = row.column(index).type_info().name();
    match type_name {
        "BOOL" => Ok(RowValue::Bool(row.try_get(index)?)),
        "INT2" => Ok(RowValue::Int(row.try_get::<i16, _>(index)? as i64)),
        "INT4" => Ok(RowValue::Int(row.try_get::<i32, _>(index)? as i64)),
        "INT8" => Ok(RowValue::Int(row.try_get(index)?)),
        "FLOAT4" => Ok(RowValue::Float(row.try_get::<f32, _>(index)? as f64)),
        "FLOAT8" => Ok(RowValue::Float(row.try_get(index)?)),
        "NUMERIC" => {
            // NUMERIC has no fixed binary width sqlx can hand back as a
            // native float; decode through `bigdecimal` (already the
            // workspace's arbitrary-precision type) and narrow to f64,
            // matching §4.5's "integers and intervals collapse to numeric".
            let decimal: bigdecimal::BigDecimal = row.try_get(index)?;
            decimal
                .to_string()
                .parse::<f64>()
                .map(RowValue::Float)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))
        }
        "TIMESTAMP" => {
            let naive: chrono::NaiveDateTime = row.try_get(index)?;
            Ok(RowValue::Timestamp(chrono::DateTime::from_naive_utc_and_offset(
                naive,
                chrono::Utc,
            )))
        }
        "TIMESTAMPTZ" => Ok(RowValue::Timestamp(row.try_get(index)?)),
        _ => Ok(RowValue::Text(row.try_get(index)?)),
    }
}

/// Decodes every column of a row, in order, into the core's fixed-width
/// `Row` shape (§3/§4.3's `c0..c{W-1}` projection).
pub fn decode_row(row: &PgRow) -> Result<sfx_core::Row, sqlx::Error> {
    (0..row.len()).map(|i| decode_cell(row, i)).collect()
}
