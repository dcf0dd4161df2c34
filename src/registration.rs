/// Table registration
///
/// A registration is the caller's declarative description of how one backing
/// table is exposed: its name, which fields are visible, which can be filtered
/// and ordered, pagination bounds and which relationships are traversable.

use crate::metadata::EntityMetadata;
use crate::store::Order;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Options accepted by `Engine::register`
///
/// Every option is optional; `RegisterOptions::default()` exposes all columns
/// with no filtering, ordering or pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterOptions {
    /// Exposed name; defaults to the backing table name lower-cased
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphql_name: Option<String>,

    /// Type description; defaults to the backing table name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Allow-list of exposed columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_fields: Option<Vec<String>>,

    /// Columns never exposed; wins over `include_fields`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_fields: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter_fields: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_fields: Vec<String>,

    /// Applied when a query gives no `order` argument
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub default_order: IndexMap<String, Order>,

    pub pagination: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<i64>,

    /// Relationships exposed as nested fields
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<String>,
}

/// A registered table, immutable once created
#[derive(Debug, Clone)]
pub struct TableRegistration {
    pub entity: Arc<EntityMetadata>,
    pub graphql_name: String,
    pub description: Option<String>,
    pub include_fields: Option<Vec<String>>,
    pub exclude_fields: Vec<String>,
    pub filter_fields: Vec<String>,
    pub order_fields: Vec<String>,
    pub default_order: IndexMap<String, Order>,
    pub pagination: bool,
    pub default_limit: Option<i64>,
    pub max_limit: Option<i64>,
    pub relationships: Vec<String>,
}

impl TableRegistration {
    pub fn new(entity: Arc<EntityMetadata>, options: RegisterOptions) -> Self {
        let graphql_name = options
            .graphql_name
            .unwrap_or_else(|| entity.name.to_lowercase());
        let description = options.description.or_else(|| Some(entity.name.clone()));

        Self {
            entity,
            graphql_name,
            description,
            include_fields: options.include_fields,
            exclude_fields: options.exclude_fields,
            filter_fields: options.filter_fields,
            order_fields: options.order_fields,
            default_order: options.default_order,
            pagination: options.pagination,
            default_limit: options.default_limit,
            max_limit: options.max_limit,
            relationships: options.relationships,
        }
    }

    /// Name of the list-valued root field
    pub fn root_field_name(&self) -> String {
        format!("{}s", self.graphql_name)
    }

    /// Whether a scalar column appears on the generated object type
    pub fn exposes_column(&self, name: &str) -> bool {
        if self.exclude_fields.iter().any(|f| f == name) {
            return false;
        }
        match &self.include_fields {
            Some(include) if !include.is_empty() => include.iter().any(|f| f == name),
            _ => true,
        }
    }

    /// Every field name the registration refers to, in a stable order
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        let lists = [
            self.include_fields.as_deref().unwrap_or_default(),
            self.exclude_fields.as_slice(),
            self.filter_fields.as_slice(),
            self.order_fields.as_slice(),
            self.relationships.as_slice(),
        ];
        for name in lists
            .into_iter()
            .flatten()
            .chain(self.default_order.keys())
        {
            if !fields.contains(&name.as_str()) {
                fields.push(name);
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnKind, ColumnMeta};

    fn entity() -> Arc<EntityMetadata> {
        Arc::new(
            EntityMetadata::new("SAMPLE_TABLE")
                .column(ColumnMeta::new("string_field", ColumnKind::Text))
                .column(ColumnMeta::new("int_field", ColumnKind::Integer).primary_key())
                .column(ColumnMeta::new("json_field", ColumnKind::Json)),
        )
    }

    #[test]
    fn test_defaults_from_table_name() {
        let reg = TableRegistration::new(entity(), RegisterOptions::default());
        assert_eq!(reg.graphql_name, "sample_table");
        assert_eq!(reg.description.as_deref(), Some("SAMPLE_TABLE"));
        assert_eq!(reg.root_field_name(), "sample_tables");
        assert!(!reg.pagination);
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let reg = TableRegistration::new(
            entity(),
            RegisterOptions {
                include_fields: Some(vec!["string_field".into(), "int_field".into()]),
                exclude_fields: vec!["int_field".into()],
                ..Default::default()
            },
        );
        assert!(reg.exposes_column("string_field"));
        assert!(!reg.exposes_column("int_field"));
        assert!(!reg.exposes_column("json_field"));
    }

    #[test]
    fn test_referenced_fields_are_deduplicated() {
        let mut default_order = IndexMap::new();
        default_order.insert("int_field".to_string(), Order::Asc);
        let reg = TableRegistration::new(
            entity(),
            RegisterOptions {
                filter_fields: vec!["int_field".into(), "string_field".into()],
                order_fields: vec!["int_field".into()],
                default_order,
                ..Default::default()
            },
        );
        assert_eq!(reg.referenced_fields(), vec!["int_field", "string_field"]);
    }

    #[test]
    fn test_options_deserialize_from_toml() {
        let options: RegisterOptions = toml::from_str(
            r#"
graphql_name = "Sample"
filter_fields = ["int_field"]
pagination = true
max_limit = 100

[default_order]
int_field = "DESC"
"#,
        )
        .unwrap();

        assert_eq!(options.graphql_name.as_deref(), Some("Sample"));
        assert!(options.pagination);
        assert_eq!(options.max_limit, Some(100));
        assert_eq!(options.default_order.get("int_field"), Some(&Order::Desc));
    }
}
