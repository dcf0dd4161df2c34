/// Arrow schema to entity metadata conversion
///
/// Tables loaded into DataFusion (CSV files, Delta tables, in-memory batches)
/// describe themselves with an Arrow schema. This maps each Arrow field onto a
/// [`ColumnKind`] so the table can be registered like any other entity.

use super::{ColumnKind, ColumnMeta, EntityMetadata};
use datafusion::arrow::datatypes::{DataType as ArrowDataType, Schema as ArrowSchema};

/// Build entity metadata from an Arrow schema
///
/// Primary keys, enums and relationships cannot be expressed in Arrow and are
/// layered on afterwards by the caller.
pub fn from_arrow_schema(table: &str, schema: &ArrowSchema) -> EntityMetadata {
    let mut entity = EntityMetadata::new(table);

    for field in schema.fields() {
        let kind = arrow_to_column_kind(field.data_type());
        if let ColumnKind::Other(ref name) = kind {
            tracing::debug!(
                "Arrow type {} for field '{}' has no schema counterpart",
                name,
                field.name()
            );
        }

        let mut column = ColumnMeta::new(field.name(), kind);
        column.nullable = field.is_nullable();
        entity.columns.push(column);
    }

    entity
}

/// Map an Arrow data type onto a column kind
///
/// - Integer types (signed and unsigned) → `Integer`
/// - Float types → `Float`
/// - String types → `Text`
/// - Date32/Date64 → `Date`, Timestamp → `DateTime`, Time32/Time64 → `Time`
/// - Binary types → `Bytes`
/// - Everything else (lists, structs, decimals, ...) → `Other`
pub(crate) fn arrow_to_column_kind(data_type: &ArrowDataType) -> ColumnKind {
    match data_type {
        ArrowDataType::Int8
        | ArrowDataType::Int16
        | ArrowDataType::Int32
        | ArrowDataType::Int64
        | ArrowDataType::UInt8
        | ArrowDataType::UInt16
        | ArrowDataType::UInt32
        | ArrowDataType::UInt64 => ColumnKind::Integer,

        ArrowDataType::Float16 | ArrowDataType::Float32 | ArrowDataType::Float64 => {
            ColumnKind::Float
        }

        ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => ColumnKind::Text,

        ArrowDataType::Boolean => ColumnKind::Boolean,

        ArrowDataType::Date32 | ArrowDataType::Date64 => ColumnKind::Date,

        ArrowDataType::Timestamp(_, _) => ColumnKind::DateTime,

        ArrowDataType::Time32(_) | ArrowDataType::Time64(_) => ColumnKind::Time,

        ArrowDataType::Binary | ArrowDataType::LargeBinary => ColumnKind::Bytes,

        other => ColumnKind::Other(format!("{:?}", other)),
    }
}
