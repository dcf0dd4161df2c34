/// Query plans compiled from registrations
///
/// The catalog is produced once by the schema builder and shared read-only by
/// every resolver of the built schema.

use super::filters::FilterShape;
use crate::error::{Result, TablegraphError};
use crate::metadata::{Cardinality, ColumnMeta, EntityMetadata, Join, RelationshipMeta};
use crate::store::Order;

use indexmap::IndexMap;
use std::sync::Arc;

/// A filterable column and the operators it accepts
#[derive(Debug, Clone)]
pub struct FilterPlan {
    pub column: ColumnMeta,
    pub shape: FilterShape,
}

/// An exposed relationship, resolved to its target table
#[derive(Debug, Clone)]
pub struct RelationPlan {
    pub name: String,
    /// Exposed name of the target table
    pub target: String,
    pub cardinality: Cardinality,
    pub join: Join,
}

impl RelationPlan {
    pub fn new(meta: &RelationshipMeta, target: impl Into<String>) -> Self {
        Self {
            name: meta.name.clone(),
            target: target.into(),
            cardinality: meta.cardinality,
            join: meta.join.clone(),
        }
    }
}

/// Everything the resolver needs to know about one registered table
#[derive(Debug, Clone)]
pub struct TablePlan {
    pub graphql_name: String,
    pub entity: Arc<EntityMetadata>,
    pub columns: IndexMap<String, ColumnMeta>,
    pub filters: IndexMap<String, FilterPlan>,
    pub order_fields: Vec<String>,
    pub default_order: Vec<(String, Order)>,
    pub pagination: bool,
    pub default_limit: Option<i64>,
    pub max_limit: Option<i64>,
    pub relations: IndexMap<String, RelationPlan>,
}

impl TablePlan {
    /// Backing table name
    pub fn table(&self) -> &str {
        &self.entity.name
    }

    /// Column read when a selection names no columns of this table
    pub fn fallback_column(&self) -> Option<&str> {
        self.entity
            .primary_keys()
            .next()
            .or_else(|| self.entity.columns.first())
            .map(|c| c.name.as_str())
    }
}

/// All table plans of one built schema
#[derive(Debug, Default)]
pub struct Catalog {
    tables: IndexMap<String, Arc<TablePlan>>,
    max_depth: Option<usize>,
}

impl Catalog {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            tables: IndexMap::new(),
            max_depth,
        }
    }

    pub fn insert(&mut self, plan: TablePlan) {
        self.tables
            .insert(plan.graphql_name.clone(), Arc::new(plan));
    }

    pub fn table(&self, graphql_name: &str) -> Result<&Arc<TablePlan>> {
        self.tables.get(graphql_name).ok_or_else(|| {
            TablegraphError::query(format!("Table {} is not registered", graphql_name))
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<TablePlan>> {
        self.tables.values()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}
