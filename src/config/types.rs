use crate::error::{Result, TablegraphError};
use crate::metadata::{
    Cardinality, ColumnKind, EntityMetadata, EnumType, Join, RelationshipMeta,
};
use crate::registration::RegisterOptions;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Register every table with default options, ignoring `expose` blocks
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub register_all: bool,

    #[serde(default, rename = "table")]
    pub tables: Vec<TableConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind the server to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interface to bind the server to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Relationship nesting ceiling; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_query_depth: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_query_depth: None,
        }
    }
}

fn default_port() -> u16 {
    4000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

/// One backing table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Backing table name
    pub name: String,

    /// CSV file or Delta table location (e.g. ./data/orders, s3://bucket/orders)
    pub path: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,

    /// Text columns holding enum names, keyed by column
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub enums: IndexMap<String, EnumConfig>,

    #[serde(default, rename = "relationship", skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipConfig>,

    /// Registration options; tables without one are loaded but not exposed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose: Option<RegisterOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumConfig {
    pub name: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    pub name: String,
    /// Backing table name of the related table
    pub target: String,
    pub cardinality: Cardinality,
    /// Column of this table
    pub local_key: String,
    /// Column of the target table
    pub remote_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through: Option<ThroughConfig>,
}

/// Link table of a many-to-many relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughConfig {
    pub table: String,
    /// Link column matching this table's `local_key`
    pub local_key: String,
    /// Link column matching the target's `remote_key`
    pub remote_key: String,
}

impl RelationshipConfig {
    pub fn to_meta(&self) -> RelationshipMeta {
        let join = match &self.through {
            None => Join::Direct {
                local_key: self.local_key.clone(),
                remote_key: self.remote_key.clone(),
            },
            Some(link) => Join::Through {
                table: link.table.clone(),
                local_key: self.local_key.clone(),
                link_local: link.local_key.clone(),
                link_remote: link.remote_key.clone(),
                remote_key: self.remote_key.clone(),
            },
        };
        RelationshipMeta {
            name: self.name.clone(),
            target: self.target.clone(),
            cardinality: self.cardinality,
            join,
        }
    }
}

impl TableConfig {
    /// Layer primary keys, enums and relationships onto loaded metadata
    pub fn apply(&self, mut entity: EntityMetadata) -> Result<EntityMetadata> {
        for key in &self.primary_key {
            let column = entity
                .columns
                .iter_mut()
                .find(|c| &c.name == key)
                .ok_or_else(|| {
                    TablegraphError::configuration(format!(
                        "Primary key {} does not exist in {}",
                        key, self.name
                    ))
                })?;
            column.primary_key = true;
        }

        for (name, enum_config) in &self.enums {
            let column = entity
                .columns
                .iter_mut()
                .find(|c| &c.name == name)
                .ok_or_else(|| {
                    TablegraphError::configuration(format!(
                        "Enum column {} does not exist in {}",
                        name, self.name
                    ))
                })?;
            if column.kind != ColumnKind::Text {
                return Err(TablegraphError::configuration(format!(
                    "Enum column {} of {} must hold text, found {}",
                    name, self.name, column.kind
                )));
            }
            column.kind = ColumnKind::enumeration(EnumType::new(
                &enum_config.name,
                enum_config.variants.iter().cloned(),
            ));
        }

        for relationship in &self.relationships {
            if entity.find_column(&relationship.local_key).is_none() {
                return Err(TablegraphError::configuration(format!(
                    "Relationship {} of {} uses missing column {}",
                    relationship.name, self.name, relationship.local_key
                )));
            }
            entity.relationships.push(relationship.to_meta());
        }

        Ok(entity)
    }
}

impl Config {
    /// Validate cross-table references
    pub fn validate(&self) -> Result<()> {
        let mut names: Vec<&str> = Vec::new();
        for table in &self.tables {
            if table.name.is_empty() {
                return Err(TablegraphError::configuration("Table name must not be empty"));
            }
            if names.contains(&table.name.as_str()) {
                return Err(TablegraphError::configuration(format!(
                    "Table {} is declared twice",
                    table.name
                )));
            }
            names.push(&table.name);
        }

        for table in &self.tables {
            for relationship in &table.relationships {
                if !names.contains(&relationship.target.as_str()) {
                    return Err(TablegraphError::configuration(format!(
                        "Relationship {} of {} targets undeclared table {}",
                        relationship.name, table.name, relationship.target
                    )));
                }
                if let Some(link) = &relationship.through {
                    if !names.contains(&link.table.as_str()) {
                        return Err(TablegraphError::configuration(format!(
                            "Relationship {} of {} goes through undeclared table {}",
                            relationship.name, table.name, link.table
                        )));
                    }
                }
            }
        }

        if self.server.max_query_depth == Some(0) {
            return Err(TablegraphError::configuration(
                "max_query_depth must be at least 1",
            ));
        }

        Ok(())
    }
}
