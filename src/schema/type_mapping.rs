/// Column kind to GraphQL type mapping
///
/// Generated types are memoized in a [`TypeCache`] owned by one schema build,
/// so every table using the same kind shares one type definition and nothing
/// leaks between builds.

use crate::error::{Result, TablegraphError};
use crate::metadata::{ColumnKind, ColumnMeta, EnumType};

use async_graphql::dynamic::{Enum, EnumItem, TypeRef};
use indexmap::IndexMap;
use std::sync::Arc;

/// Primitive GraphQL scalars a column can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Float,
    String,
    Boolean,
    Date,
    DateTime,
    Time,
    Bytes,
    Json,
}

impl ScalarKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::Int => TypeRef::INT,
            ScalarKind::Float => TypeRef::FLOAT,
            ScalarKind::String => TypeRef::STRING,
            ScalarKind::Boolean => TypeRef::BOOLEAN,
            ScalarKind::Date => "Date",
            ScalarKind::DateTime => "DateTime",
            ScalarKind::Time => "Time",
            ScalarKind::Bytes => "Bytes",
            ScalarKind::Json => "JSON",
        }
    }

    /// Scalars that must be registered with the schema (not GraphQL built-ins)
    pub fn is_custom(&self) -> bool {
        !matches!(
            self,
            ScalarKind::Int | ScalarKind::Float | ScalarKind::String | ScalarKind::Boolean
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedKind {
    Scalar(ScalarKind),
    Enum(Arc<EnumType>),
}

/// A GraphQL type generated for a column kind
#[derive(Debug, PartialEq, Eq)]
pub struct GeneratedType {
    pub name: String,
    pub kind: GeneratedKind,
}

impl GeneratedType {
    /// Type reference, non-null unless the column is nullable
    pub fn type_ref(&self, nullable: bool) -> TypeRef {
        if nullable {
            TypeRef::named(&self.name)
        } else {
            TypeRef::named_nn(&self.name)
        }
    }

    /// Dynamic enum definition, for enum types
    pub fn enum_definition(&self) -> Option<Enum> {
        match &self.kind {
            GeneratedKind::Enum(e) => Some(
                e.variants
                    .iter()
                    .fold(Enum::new(&self.name), |def, v| def.item(EnumItem::new(&v.name))),
            ),
            GeneratedKind::Scalar(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeKey {
    Scalar(ScalarKind),
    Enum(String),
}

/// Memo of generated types for one schema build
#[derive(Debug, Default)]
pub struct TypeCache {
    types: IndexMap<TypeKey, Arc<GeneratedType>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a column to its generated type
    pub fn map(&mut self, column: &ColumnMeta) -> Result<Arc<GeneratedType>> {
        self.map_kind(&column.kind)
    }

    /// Map a column kind to its generated type
    ///
    /// Built-in kinds share one type per kind; enums share one type per enum
    /// name. Two different enums declared under one name are rejected.
    pub fn map_kind(&mut self, kind: &ColumnKind) -> Result<Arc<GeneratedType>> {
        let (key, generated) = match kind {
            ColumnKind::Enum(e) => (
                TypeKey::Enum(e.name.clone()),
                GeneratedKind::Enum(e.clone()),
            ),
            other => {
                let scalar = scalar_kind(other)?;
                (TypeKey::Scalar(scalar), GeneratedKind::Scalar(scalar))
            }
        };

        if let Some(existing) = self.types.get(&key) {
            if existing.kind != generated {
                return Err(TablegraphError::configuration(format!(
                    "Enum type '{}' is declared twice with different variants",
                    existing.name
                )));
            }
            return Ok(existing.clone());
        }

        let name = match &generated {
            GeneratedKind::Scalar(s) => s.type_name().to_string(),
            GeneratedKind::Enum(e) => e.name.clone(),
        };
        let ty = Arc::new(GeneratedType {
            name,
            kind: generated,
        });
        self.types.insert(key, ty.clone());
        Ok(ty)
    }

    /// Every type generated so far, in first-use order
    pub fn generated(&self) -> impl Iterator<Item = &Arc<GeneratedType>> {
        self.types.values()
    }
}

fn scalar_kind(kind: &ColumnKind) -> Result<ScalarKind> {
    let scalar = match kind {
        ColumnKind::Integer => ScalarKind::Int,
        ColumnKind::Float => ScalarKind::Float,
        ColumnKind::Text => ScalarKind::String,
        ColumnKind::Boolean => ScalarKind::Boolean,
        ColumnKind::Date => ScalarKind::Date,
        ColumnKind::DateTime => ScalarKind::DateTime,
        ColumnKind::Time => ScalarKind::Time,
        ColumnKind::Bytes => ScalarKind::Bytes,
        ColumnKind::Json => ScalarKind::Json,
        ColumnKind::Enum(_) | ColumnKind::Other(_) => {
            return Err(TablegraphError::UnsupportedType(format!(
                "{} (supported: integer, text, boolean, float, date, datetime, time, enum, bytes, json)",
                kind
            )))
        }
    };
    Ok(scalar)
}
