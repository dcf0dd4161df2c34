/// Registration validation
///
/// Run once per table when the schema is built. Checks stop at the first
/// failure and always raise a configuration error naming the table and field.

use super::filters::is_filterable;
use crate::error::{Result, TablegraphError};
use crate::registration::TableRegistration;

/// Validate a registration against its backing entity
pub fn validate(table: &TableRegistration) -> Result<()> {
    let entity = &table.entity;
    let name = &table.graphql_name;

    for field in table.referenced_fields() {
        if !entity.has_field(field) {
            return Err(TablegraphError::configuration(format!(
                "Field {} does not exist in {}!",
                field, name
            )));
        }
    }

    for field in &table.filter_fields {
        match entity.find_column(field) {
            Some(column) if is_filterable(&column.kind) => {}
            Some(column) => {
                return Err(TablegraphError::configuration(format!(
                    "Field {} of {} has type {} which cannot be filtered (supported: int, str, bool, float, enum, datetime, date, time)",
                    field, name, column.kind
                )))
            }
            None => {
                return Err(TablegraphError::configuration(format!(
                    "Field {} of {} is a relationship and cannot be filtered",
                    field, name
                )))
            }
        }
    }

    for field in table.default_order.keys() {
        if !table.order_fields.contains(field) {
            return Err(TablegraphError::configuration(format!(
                "Default order field {} of {} is not listed in order_fields",
                field, name
            )));
        }
    }

    for field in &table.order_fields {
        match entity.find_column(field) {
            Some(column) if column.kind.is_sortable() => {}
            _ => {
                return Err(TablegraphError::configuration(format!(
                    "Field {} of {} cannot be ordered",
                    field, name
                )))
            }
        }
    }

    for field in &table.relationships {
        if entity.find_relationship(field).is_none() {
            return Err(TablegraphError::configuration(format!(
                "Field {} of {} is not a relationship",
                field, name
            )));
        }
    }

    if let Some(max) = table.max_limit {
        if max < 1 {
            return Err(TablegraphError::configuration(format!(
                "max_limit of {} must be at least 1 (got {})",
                name, max
            )));
        }
    }
    if let Some(default) = table.default_limit {
        if default < 1 {
            return Err(TablegraphError::configuration(format!(
                "default_limit of {} must be at least 1 (got {})",
                name, default
            )));
        }
        if let Some(max) = table.max_limit {
            if default > max {
                return Err(TablegraphError::configuration(format!(
                    "default_limit of {} ({}) exceeds max_limit ({})",
                    name, default, max
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        Cardinality, ColumnKind, ColumnMeta, EntityMetadata, Join, RelationshipMeta,
    };
    use crate::registration::RegisterOptions;
    use crate::store::Order;
    use std::sync::Arc;

    fn entity() -> Arc<EntityMetadata> {
        Arc::new(
            EntityMetadata::new("SAMPLE_TABLE")
                .column(ColumnMeta::new("int_field", ColumnKind::Integer).primary_key())
                .column(ColumnMeta::new("string_field", ColumnKind::Text))
                .column(ColumnMeta::new("bytes_field", ColumnKind::Bytes))
                .column(ColumnMeta::new("json_field", ColumnKind::Json))
                .relationship(RelationshipMeta {
                    name: "parent".to_string(),
                    target: "SAMPLE_TABLE".to_string(),
                    cardinality: Cardinality::One,
                    join: Join::Direct {
                        local_key: "int_field".to_string(),
                        remote_key: "int_field".to_string(),
                    },
                }),
        )
    }

    fn check(options: RegisterOptions) -> Result<()> {
        validate(&TableRegistration::new(entity(), options))
    }

    fn message(options: RegisterOptions) -> String {
        let err = check(options).unwrap_err();
        assert!(err.is_configuration());
        err.to_string()
    }

    #[test]
    fn test_default_registration_is_valid() {
        assert!(check(RegisterOptions::default()).is_ok());
    }

    #[test]
    fn test_missing_field_in_every_list() {
        let cases = [
            RegisterOptions {
                include_fields: Some(vec!["does-not-exist".into()]),
                ..Default::default()
            },
            RegisterOptions {
                exclude_fields: vec!["does-not-exist".into()],
                ..Default::default()
            },
            RegisterOptions {
                filter_fields: vec!["does-not-exist".into()],
                ..Default::default()
            },
            RegisterOptions {
                order_fields: vec!["does-not-exist".into()],
                ..Default::default()
            },
            RegisterOptions {
                default_order: [("does-not-exist".to_string(), Order::Asc)]
                    .into_iter()
                    .collect(),
                ..Default::default()
            },
            RegisterOptions {
                relationships: vec!["does-not-exist".into()],
                ..Default::default()
            },
        ];

        for options in cases {
            assert!(message(options).contains("Field does-not-exist does not exist in sample_table!"));
        }
    }

    #[test]
    fn test_bytes_and_json_not_filterable() {
        for field in ["bytes_field", "json_field"] {
            let msg = message(RegisterOptions {
                filter_fields: vec![field.into()],
                ..Default::default()
            });
            assert!(msg.contains(field));
        }
    }

    #[test]
    fn test_default_order_must_be_orderable() {
        let msg = message(RegisterOptions {
            default_order: [("int_field".to_string(), Order::Desc)].into_iter().collect(),
            ..Default::default()
        });
        assert!(msg.contains("order_fields"));

        assert!(check(RegisterOptions {
            order_fields: vec!["int_field".into()],
            default_order: [("int_field".to_string(), Order::Desc)].into_iter().collect(),
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn test_relationship_list_rejects_columns() {
        let msg = message(RegisterOptions {
            relationships: vec!["string_field".into()],
            ..Default::default()
        });
        assert!(msg.contains("not a relationship"));

        assert!(check(RegisterOptions {
            relationships: vec!["parent".into()],
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn test_limit_bounds() {
        let bad = [
            (Some(0), None),
            (None, Some(0)),
            (Some(10), Some(5)),
            (Some(-1), Some(5)),
        ];
        for (default_limit, max_limit) in bad {
            assert!(check(RegisterOptions {
                pagination: true,
                default_limit,
                max_limit,
                ..Default::default()
            })
            .unwrap_err()
            .is_configuration());
        }

        assert!(check(RegisterOptions {
            pagination: true,
            default_limit: Some(5),
            max_limit: Some(5),
            ..Default::default()
        })
        .is_ok());
    }
}
