/// DataFusion-backed executor
///
/// Tables are registered into a DataFusion `SessionContext` (CSV files for
/// testing, Delta tables for production) and statements are translated into
/// DataFrame operations rather than SQL text.

use super::statement::{FilterOp, Literal, Order, Predicate, Statement};
use super::value::{Row, Value};
use super::AsyncSession;
use crate::error::{Result, TablegraphError};
use crate::metadata::{from_arrow_schema, EntityMetadata};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use datafusion::arrow::array::*;
use datafusion::arrow::datatypes::{DataType as ArrowDataType, TimeUnit};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::common::TableReference;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use std::sync::Arc;

/// Executor over a DataFusion session context
#[derive(Clone)]
pub struct DataFusionSession {
    ctx: SessionContext,
}

impl DataFusionSession {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Register a table from a file path (supports CSV for testing, Delta for production)
    ///
    /// # Arguments
    ///
    /// * `name` - Name to register the table as
    /// * `path` - Path to the file (CSV or Delta table)
    pub async fn register_table_from_path(&self, name: &str, path: &str) -> Result<()> {
        if path.ends_with(".csv") {
            let df = self
                .ctx
                .read_csv(path, CsvReadOptions::default())
                .await
                .map_err(|e| {
                    TablegraphError::Store(format!("Failed to read CSV '{}': {}", path, e))
                })?;

            self.ctx
                .register_table(TableReference::bare(name), df.into_view())?;
        } else {
            let delta_table = deltalake::open_table(path).await?;

            self.ctx
                .register_table(TableReference::bare(name), Arc::new(delta_table))
                .map_err(|e| {
                    TablegraphError::Store(format!(
                        "Failed to register Delta table '{}': {}",
                        name, e
                    ))
                })?;
        }

        tracing::info!("Registered table '{}' from {}", name, path);
        Ok(())
    }

    /// Register an in-memory record batch as a table
    pub fn register_batch(&self, name: &str, batch: RecordBatch) -> Result<()> {
        let table = MemTable::try_new(batch.schema(), vec![vec![batch]])?;
        self.ctx
            .register_table(TableReference::bare(name), Arc::new(table))?;
        Ok(())
    }

    /// Derive entity metadata from a registered table's Arrow schema
    pub async fn entity_metadata(&self, name: &str) -> Result<EntityMetadata> {
        let provider = self.ctx.table_provider(TableReference::bare(name)).await?;
        Ok(from_arrow_schema(name, provider.schema().as_ref()))
    }
}

impl Default for DataFusionSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AsyncSession for DataFusionSession {
    async fn execute(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut df = self
            .ctx
            .table(TableReference::bare(statement.table.as_str()))
            .await?;

        for predicate in &statement.predicates {
            df = df.filter(predicate_to_expr(predicate))?;
        }

        if !statement.order_by.is_empty() {
            let keys = statement
                .order_by
                .iter()
                .map(|(column, order)| {
                    let asc = *order == Order::Asc;
                    ident(column).sort(asc, asc)
                })
                .collect();
            df = df.sort(keys)?;
        }

        if statement.offset.is_some() || statement.limit.is_some() {
            df = df.limit(statement.offset.unwrap_or(0), statement.limit)?;
        }

        df = df.select(statement.columns.iter().map(ident).collect())?;

        let batches = df.collect().await?;

        let mut rows = Vec::new();
        for batch in &batches {
            for row_idx in 0..batch.num_rows() {
                rows.push(record_batch_row(batch, row_idx)?);
            }
        }
        Ok(rows)
    }
}

fn predicate_to_expr(predicate: &Predicate) -> Expr {
    let column = ident(&predicate.column);

    match &predicate.literal {
        Literal::List(values) => {
            column.in_list(values.iter().map(value_to_expr).collect(), false)
        }
        Literal::Value(value) => match predicate.op {
            FilterOp::Eq => column.eq(value_to_expr(value)),
            FilterOp::Ne => column.not_eq(value_to_expr(value)),
            FilterOp::Gt => column.gt(value_to_expr(value)),
            FilterOp::Ge => column.gt_eq(value_to_expr(value)),
            FilterOp::Lt => column.lt(value_to_expr(value)),
            FilterOp::Le => column.lt_eq(value_to_expr(value)),
            FilterOp::Contains => column.like(lit(format!("%{}%", like_escape(value)))),
            FilterOp::StartsWith => column.like(lit(format!("{}%", like_escape(value)))),
            FilterOp::EndsWith => column.like(lit(format!("%{}", like_escape(value)))),
            FilterOp::In => column.in_list(vec![value_to_expr(value)], false),
        },
    }
}

fn like_escape(value: &Value) -> String {
    value
        .as_text()
        .unwrap_or_default()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn value_to_expr(value: &Value) -> Expr {
    match value {
        Value::Null => lit(ScalarValue::Null),
        Value::Bool(b) => lit(*b),
        Value::Int(i) => lit(*i),
        Value::Float(f) => lit(*f),
        Value::Text(s) => lit(s.clone()),
        Value::Enum(e) => lit(e.name.clone()),
        Value::Date(d) => {
            let days = (*d - unix_epoch()).num_days() as i32;
            lit(ScalarValue::Date32(Some(days)))
        }
        Value::DateTime(dt) => lit(ScalarValue::TimestampMicrosecond(
            Some(dt.and_utc().timestamp_micros()),
            None,
        )),
        Value::Time(t) => {
            let micros =
                t.num_seconds_from_midnight() as i64 * 1_000_000 + (t.nanosecond() / 1_000) as i64;
            lit(ScalarValue::Time64Microsecond(Some(micros)))
        }
        Value::Bytes(b) => lit(ScalarValue::Binary(Some(b.clone()))),
        Value::Json(j) => lit(j.to_string()),
    }
}

fn downcast<'a, T: 'static>(column: &'a ArrayRef, name: &str) -> Result<&'a T> {
    column.as_any().downcast_ref::<T>().ok_or_else(|| {
        TablegraphError::Store(format!(
            "Unexpected array type {:?} for column '{}'",
            column.data_type(),
            name
        ))
    })
}

fn timestamp_value(timestamp: Option<DateTime<Utc>>, raw: i64) -> Result<Value> {
    timestamp
        .map(|dt| Value::DateTime(dt.naive_utc()))
        .ok_or_else(|| TablegraphError::Store(format!("Invalid timestamp: {}", raw)))
}

fn time_value(raw: i64, nanos_per_unit: i64) -> Result<Value> {
    let nanos = raw
        .checked_mul(nanos_per_unit)
        .filter(|n| *n >= 0)
        .ok_or_else(|| TablegraphError::Store(format!("Invalid time: {}", raw)))?;
    u32::try_from(nanos / 1_000_000_000)
        .ok()
        .and_then(|secs| {
            NaiveTime::from_num_seconds_from_midnight_opt(secs, (nanos % 1_000_000_000) as u32)
        })
        .map(Value::Time)
        .ok_or_else(|| TablegraphError::Store(format!("Invalid time: {}", raw)))
}

/// Convert a single row from a RecordBatch into a [`Row`]
///
/// Unsupported Arrow types come back as `Null` with a warning.
pub fn record_batch_row(batch: &RecordBatch, row_idx: usize) -> Result<Row> {
    let schema = batch.schema();
    let mut row = Row::new();

    for (col_idx, field) in schema.fields().iter().enumerate() {
        let column = batch.column(col_idx);
        let name = field.name();

        if column.is_null(row_idx) {
            row.insert(name.clone(), Value::Null);
            continue;
        }

        let value = match column.data_type() {
            ArrowDataType::Int8 => Value::Int(downcast::<Int8Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::Int16 => Value::Int(downcast::<Int16Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::Int32 => Value::Int(downcast::<Int32Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::Int64 => Value::Int(downcast::<Int64Array>(column, name)?.value(row_idx)),
            ArrowDataType::UInt8 => Value::Int(downcast::<UInt8Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::UInt16 => Value::Int(downcast::<UInt16Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::UInt32 => Value::Int(downcast::<UInt32Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::UInt64 => {
                // u64 may not fit in i64
                let val = downcast::<UInt64Array>(column, name)?.value(row_idx);
                match i64::try_from(val) {
                    Ok(v) => Value::Int(v),
                    Err(_) => Value::Text(val.to_string()),
                }
            }
            ArrowDataType::Float32 => {
                Value::Float(downcast::<Float32Array>(column, name)?.value(row_idx).into())
            }
            ArrowDataType::Float16 => {
                Value::Float(downcast::<Float16Array>(column, name)?.value(row_idx).to_f64())
            }
            ArrowDataType::Float64 => Value::Float(downcast::<Float64Array>(column, name)?.value(row_idx)),
            ArrowDataType::Utf8 => {
                Value::Text(downcast::<StringArray>(column, name)?.value(row_idx).to_string())
            }
            ArrowDataType::LargeUtf8 => {
                Value::Text(downcast::<LargeStringArray>(column, name)?.value(row_idx).to_string())
            }
            ArrowDataType::Boolean => Value::Bool(downcast::<BooleanArray>(column, name)?.value(row_idx)),
            ArrowDataType::Binary => {
                Value::Bytes(downcast::<BinaryArray>(column, name)?.value(row_idx).to_vec())
            }
            ArrowDataType::LargeBinary => {
                Value::Bytes(downcast::<LargeBinaryArray>(column, name)?.value(row_idx).to_vec())
            }
            ArrowDataType::Date32 => {
                let days = downcast::<Date32Array>(column, name)?.value(row_idx);
                unix_epoch()
                    .checked_add_signed(chrono::Duration::days(days as i64))
                    .map(Value::Date)
                    .ok_or_else(|| TablegraphError::Store(format!("Invalid date: {} days", days)))?
            }
            ArrowDataType::Date64 => {
                let millis = downcast::<Date64Array>(column, name)?.value(row_idx);
                unix_epoch()
                    .checked_add_signed(chrono::Duration::milliseconds(millis))
                    .map(Value::Date)
                    .ok_or_else(|| TablegraphError::Store(format!("Invalid date: {} ms", millis)))?
            }
            ArrowDataType::Timestamp(unit, _tz) => match unit {
                TimeUnit::Nanosecond => {
                    let raw = downcast::<TimestampNanosecondArray>(column, name)?.value(row_idx);
                    timestamp_value(Some(DateTime::<Utc>::from_timestamp_nanos(raw)), raw)?
                }
                TimeUnit::Microsecond => {
                    let raw = downcast::<TimestampMicrosecondArray>(column, name)?.value(row_idx);
                    timestamp_value(DateTime::<Utc>::from_timestamp_micros(raw), raw)?
                }
                TimeUnit::Millisecond => {
                    let raw = downcast::<TimestampMillisecondArray>(column, name)?.value(row_idx);
                    timestamp_value(DateTime::<Utc>::from_timestamp_millis(raw), raw)?
                }
                TimeUnit::Second => {
                    let raw = downcast::<TimestampSecondArray>(column, name)?.value(row_idx);
                    timestamp_value(DateTime::<Utc>::from_timestamp(raw, 0), raw)?
                }
            },
            ArrowDataType::Time32(unit) => match unit {
                TimeUnit::Second => time_value(
                    downcast::<Time32SecondArray>(column, name)?.value(row_idx).into(),
                    1_000_000_000,
                )?,
                _ => time_value(
                    downcast::<Time32MillisecondArray>(column, name)?.value(row_idx).into(),
                    1_000_000,
                )?,
            },
            ArrowDataType::Time64(unit) => match unit {
                TimeUnit::Nanosecond => {
                    time_value(downcast::<Time64NanosecondArray>(column, name)?.value(row_idx), 1)?
                }
                _ => time_value(
                    downcast::<Time64MicrosecondArray>(column, name)?.value(row_idx),
                    1_000,
                )?,
            },
            other => {
                tracing::warn!(
                    "Unsupported type {:?} for field '{}', returning null",
                    other,
                    name
                );
                Value::Null
            }
        };

        row.insert(name.clone(), value);
    }

    Ok(row)
}
