//! Shared fixtures for integration tests
//!
//! Three table families:
//! - `SAMPLE_TABLE` covers every column kind, including an enum and a nullable column
//! - `SAMPLE_TABLE_1..3` share the same columns without relationships
//! - the related family links `SAMPLE_TABLE_1..3` with direct and many-to-many joins

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;
use tablegraph::metadata::{
    Cardinality, ColumnKind, ColumnMeta, EntityMetadata, EnumType, Join, MetadataContainer,
    RelationshipMeta,
};
use tablegraph::registration::RegisterOptions;
use tablegraph::store::{EnumValue, MemorySession, Order, Row, Value};

pub const SAMPLE_TABLE: &str = "SAMPLE_TABLE";
pub const T1: &str = "SAMPLE_TABLE_1";
pub const T2: &str = "SAMPLE_TABLE_2";
pub const T3: &str = "SAMPLE_TABLE_3";
pub const LINK: &str = "T2_T3_LINK";

pub const FILTERABLE: [&str; 8] = [
    "string_field",
    "int_field",
    "float_field",
    "bool_field",
    "date_field",
    "datetime_field",
    "time_field",
    "enum_field",
];

pub const NAMES: [&str; 5] = ["One", "Two", "Three", "Four", "Five"];

pub fn sample_enum() -> EnumType {
    EnumType::new("SampleEnum", ["ODD", "EVEN"])
}

fn sample_columns(entity: EntityMetadata) -> EntityMetadata {
    entity
        .column(ColumnMeta::new("string_field", ColumnKind::Text))
        .column(ColumnMeta::new("int_field", ColumnKind::Integer).primary_key())
        .column(ColumnMeta::new("float_field", ColumnKind::Float))
        .column(ColumnMeta::new("bool_field", ColumnKind::Boolean))
        .column(ColumnMeta::new("date_field", ColumnKind::Date))
        .column(ColumnMeta::new("datetime_field", ColumnKind::DateTime))
        .column(ColumnMeta::new("time_field", ColumnKind::Time))
        .column(ColumnMeta::new("bytes_field", ColumnKind::Bytes))
        .column(ColumnMeta::new("json_field", ColumnKind::Json))
        .column(ColumnMeta::new(
            "enum_field",
            ColumnKind::enumeration(sample_enum()),
        ))
}

/// Single table with every column kind
pub fn sample_table() -> EntityMetadata {
    sample_columns(EntityMetadata::new(SAMPLE_TABLE))
        .column(ColumnMeta::new("nullable_field", ColumnKind::Text).nullable())
}

/// Three unrelated tables sharing the sample columns
pub fn sample_tables() -> MetadataContainer {
    let mut container = MetadataContainer::new();
    for name in [T1, T2, T3] {
        container.add(sample_columns(EntityMetadata::new(name)));
    }
    container
}

pub fn sample_options() -> RegisterOptions {
    let filterable: Vec<String> = FILTERABLE.iter().map(|f| f.to_string()).collect();
    RegisterOptions {
        filter_fields: filterable.clone(),
        order_fields: filterable,
        default_order: [("int_field".to_string(), Order::Asc)].into_iter().collect(),
        pagination: true,
        max_limit: Some(100),
        ..Default::default()
    }
}

pub fn sample_row(i: i64) -> Row {
    let name = NAMES[(i - 1) as usize];
    let date = NaiveDate::from_ymd_opt(2024, 1, i as u32).unwrap();
    let time = NaiveTime::from_hms_opt(12, i as u32, 0).unwrap();
    let parity = if i % 2 == 0 {
        EnumValue::new("EVEN", 2)
    } else {
        EnumValue::new("ODD", 1)
    };

    let mut row = Row::new();
    row.insert("string_field".to_string(), Value::from(name));
    row.insert("int_field".to_string(), Value::Int(i));
    row.insert("float_field".to_string(), Value::Float(i as f64 * 1.5));
    row.insert("bool_field".to_string(), Value::Bool(i % 2 == 0));
    row.insert("date_field".to_string(), Value::Date(date));
    row.insert("datetime_field".to_string(), Value::DateTime(date.and_time(time)));
    row.insert("time_field".to_string(), Value::Time(time));
    row.insert("bytes_field".to_string(), Value::Bytes(vec![i as u8, 0xff]));
    row.insert("json_field".to_string(), Value::Json(serde_json::json!({ "n": i })));
    row.insert("enum_field".to_string(), Value::Enum(parity));
    row.insert(
        "nullable_field".to_string(),
        if i % 2 == 1 {
            Value::from(format!("{} is odd", name))
        } else {
            Value::Null
        },
    );
    row
}

/// Rows "One" through "Five" with `int_field` 1..=5
pub fn sample_session() -> MemorySession {
    MemorySession::new().with_table(SAMPLE_TABLE, (1..=5).map(sample_row).collect())
}

fn direct(name: &str, target: &str, cardinality: Cardinality, local: &str, remote: &str) -> RelationshipMeta {
    RelationshipMeta {
        name: name.to_string(),
        target: target.to_string(),
        cardinality,
        join: Join::Direct {
            local_key: local.to_string(),
            remote_key: remote.to_string(),
        },
    }
}

fn through(name: &str, target: &str, link_local: &str, link_remote: &str) -> RelationshipMeta {
    RelationshipMeta {
        name: name.to_string(),
        target: target.to_string(),
        cardinality: Cardinality::Many,
        join: Join::Through {
            table: LINK.to_string(),
            local_key: "int_field".to_string(),
            link_local: link_local.to_string(),
            link_remote: link_remote.to_string(),
            remote_key: "int_field".to_string(),
        },
    }
}

/// `SAMPLE_TABLE_1..3` with relationships in both directions
pub fn related_tables() -> MetadataContainer {
    let mut container = MetadataContainer::new();

    container.add(
        EntityMetadata::new(T1)
            .column(ColumnMeta::new("int_field", ColumnKind::Integer).primary_key())
            .column(ColumnMeta::new("string_field", ColumnKind::Text))
            .column(ColumnMeta::new("t2_int_field", ColumnKind::Integer))
            .relationship(direct("t2_rel", T2, Cardinality::One, "t2_int_field", "int_field"))
            .relationship(direct("t3_rel", T3, Cardinality::Many, "int_field", "t1_int_field")),
    );
    container.add(
        EntityMetadata::new(T2)
            .column(ColumnMeta::new("int_field", ColumnKind::Integer).primary_key())
            .column(ColumnMeta::new("string_field", ColumnKind::Text))
            .relationship(direct("t1_rel", T1, Cardinality::One, "int_field", "t2_int_field"))
            .relationship(through("t3_rel", T3, "t2_id", "t3_id")),
    );
    container.add(
        EntityMetadata::new(T3)
            .column(ColumnMeta::new("int_field", ColumnKind::Integer).primary_key())
            .column(ColumnMeta::new("string_field", ColumnKind::Text))
            .column(ColumnMeta::new("t1_int_field", ColumnKind::Integer).nullable())
            .relationship(direct("t1_rel", T1, Cardinality::One, "t1_int_field", "int_field"))
            .relationship(through("t2_rel", T2, "t3_id", "t2_id")),
    );

    container
}

pub fn related_options(entity: &EntityMetadata) -> RegisterOptions {
    RegisterOptions {
        include_fields: Some(vec!["int_field".to_string(), "string_field".to_string()]),
        order_fields: vec!["int_field".to_string()],
        pagination: true,
        relationships: entity.relationships.iter().map(|r| r.name.clone()).collect(),
        ..Default::default()
    }
}

fn row(values: &[(&str, Value)]) -> Row {
    values
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect::<IndexMap<_, _>>()
}

/// T1 rows point at T2 through `t2_int_field`, T3 rows at T1 through
/// `t1_int_field`; T2 and T3 are linked through `T2_T3_LINK`
pub fn related_session() -> MemorySession {
    let t1 = [(1, "t1 one", 1), (2, "t1 two", 2), (3, "t1 three", 2)]
        .into_iter()
        .map(|(id, name, t2)| {
            row(&[
                ("int_field", Value::Int(id)),
                ("string_field", Value::from(name)),
                ("t2_int_field", Value::Int(t2)),
            ])
        })
        .collect();

    let t2 = [(1, "t2 one"), (2, "t2 two")]
        .into_iter()
        .map(|(id, name)| {
            row(&[
                ("int_field", Value::Int(id)),
                ("string_field", Value::from(name)),
            ])
        })
        .collect();

    let t3 = [(1, "t3 one", Value::Int(1)), (2, "t3 two", Value::Int(1)), (3, "t3 three", Value::Null)]
        .into_iter()
        .map(|(id, name, t1)| {
            row(&[
                ("int_field", Value::Int(id)),
                ("string_field", Value::from(name)),
                ("t1_int_field", t1),
            ])
        })
        .collect();

    let link = [(1, 1), (1, 2), (2, 3)]
        .into_iter()
        .map(|(t2, t3)| row(&[("t2_id", Value::Int(t2)), ("t3_id", Value::Int(t3))]))
        .collect();

    MemorySession::new()
        .with_table(T1, t1)
        .with_table(T2, t2)
        .with_table(T3, t3)
        .with_table(LINK, link)
}
