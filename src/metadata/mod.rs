/// Table metadata consumed by the schema builder
///
/// Describes the columns and relationships of a backing table independently of
/// where the table lives. Metadata is produced by hand, from a configuration
/// file, or from an Arrow schema (see [`from_arrow_schema`]).

mod arrow;

pub use arrow::from_arrow_schema;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Closed set of column kinds known to the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    DateTime,
    Time,
    Enum(Arc<EnumType>),
    Bytes,
    Json,
    /// A storage type with no schema counterpart, kept for error reporting
    Other(String),
}

impl ColumnKind {
    pub fn enumeration(enum_type: EnumType) -> Self {
        ColumnKind::Enum(Arc::new(enum_type))
    }

    /// Kinds a statement can sort by
    pub fn is_sortable(&self) -> bool {
        matches!(
            self,
            ColumnKind::Integer
                | ColumnKind::Float
                | ColumnKind::Text
                | ColumnKind::Date
                | ColumnKind::DateTime
                | ColumnKind::Time
                | ColumnKind::Enum(_)
                | ColumnKind::Boolean
        )
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Integer => write!(f, "integer"),
            ColumnKind::Float => write!(f, "float"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Boolean => write!(f, "boolean"),
            ColumnKind::Date => write!(f, "date"),
            ColumnKind::DateTime => write!(f, "datetime"),
            ColumnKind::Time => write!(f, "time"),
            ColumnKind::Enum(e) => write!(f, "enum {}", e.name),
            ColumnKind::Bytes => write!(f, "bytes"),
            ColumnKind::Json => write!(f, "json"),
            ColumnKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// An enumeration type: symbolic names with their underlying values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<EnumVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

impl EnumType {
    /// Build an enum whose values are numbered from 1 in declaration order
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants
                .into_iter()
                .enumerate()
                .map(|(i, v)| EnumVariant {
                    name: v.into(),
                    value: i as i64 + 1,
                })
                .collect(),
        }
    }

    pub fn variant_by_value(&self, value: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }

    pub fn variant_by_name(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub primary_key: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            primary_key: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// How rows of a relationship's target are matched to a source row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Join {
    /// `target.remote_key = source.local_key`
    Direct { local_key: String, remote_key: String },
    /// Many-to-many through a link table
    Through {
        table: String,
        local_key: String,
        link_local: String,
        link_remote: String,
        remote_key: String,
    },
}

impl Join {
    /// Column of the source row the join reads
    pub fn local_key(&self) -> &str {
        match self {
            Join::Direct { local_key, .. } | Join::Through { local_key, .. } => local_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipMeta {
    pub name: String,
    /// Backing table name of the related entity
    pub target: String,
    pub cardinality: Cardinality,
    pub join: Join,
}

/// Columns and relationships of one backing table
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    pub name: String,
    pub columns: Vec<ColumnMeta>,
    pub relationships: Vec<RelationshipMeta>,
}

impl EntityMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnMeta) -> Self {
        self.columns.push(column);
        self
    }

    pub fn relationship(mut self, relationship: RelationshipMeta) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn find_relationship(&self, name: &str) -> Option<&RelationshipMeta> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// True when `name` is either a column or a relationship
    pub fn has_field(&self, name: &str) -> bool {
        self.find_column(name).is_some() || self.find_relationship(name).is_some()
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}

/// A set of mapped entities, keyed by backing table name
#[derive(Debug, Clone, Default)]
pub struct MetadataContainer {
    entities: IndexMap<String, Arc<EntityMetadata>>,
}

impl MetadataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: EntityMetadata) -> Arc<EntityMetadata> {
        let entity = Arc::new(entity);
        self.entities.insert(entity.name.clone(), entity.clone());
        entity
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntityMetadata>> {
        self.entities.get(name).cloned()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<EntityMetadata>> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
