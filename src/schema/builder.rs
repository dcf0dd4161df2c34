/// GraphQL schema builder
///
/// This module provides the `SchemaBuilder` which composes the registered
/// tables into one dynamic schema. The build runs in two phases: every table
/// first claims its type name, then field bodies are filled in, so tables can
/// reference each other in any order and in cycles.

use super::catalog::{Catalog, FilterPlan, RelationPlan, TablePlan};
use super::filters::build_filter;
use super::resolver::{create_column_resolver, create_list_resolver, create_relation_resolver};
use super::scalars::{custom_scalar, order_enum, ORDER_ENUM};
use super::type_mapping::{GeneratedKind, TypeCache};
use super::validate::validate;
use crate::error::{Result, TablegraphError};
use crate::registration::TableRegistration;

use async_graphql::dynamic::{
    InputObject, InputValue, Object, Schema, SchemaBuilder as DynamicSchemaBuilder, Type, TypeRef,
};
use indexmap::IndexMap;
use std::sync::Arc;

const QUERY_TYPE: &str = "Query";

/// Type names the builder may generate besides table types
const RESERVED_NAMES: &[&str] = &[
    QUERY_TYPE,
    ORDER_ENUM,
    TypeRef::INT,
    TypeRef::FLOAT,
    TypeRef::STRING,
    TypeRef::BOOLEAN,
    TypeRef::ID,
    "Date",
    "DateTime",
    "Time",
    "Bytes",
    "JSON",
    "IntFilter",
    "FloatFilter",
    "StringFilter",
    "BoolFilter",
    "DateFilter",
    "DateTimeFilter",
    "TimeFilter",
];

/// Schema builder for generating the query schema from registrations
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    max_depth: Option<usize>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ceiling on relationship nesting; unbounded when `None`
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build the composite schema for a set of registrations
    pub fn build(&self, tables: &[TableRegistration]) -> Result<Schema> {
        if tables.is_empty() {
            return Err(TablegraphError::configuration("No tables registered"));
        }

        // Phase 1: claim names
        let mut exposed: IndexMap<&str, &str> = IndexMap::new();
        for table in tables {
            check_type_name(&table.graphql_name)?;
            if exposed.values().any(|name| *name == table.graphql_name) {
                return Err(TablegraphError::configuration(format!(
                    "Table name {} is registered twice",
                    table.graphql_name
                )));
            }
            if exposed
                .insert(&table.entity.name, &table.graphql_name)
                .is_some()
            {
                return Err(TablegraphError::configuration(format!(
                    "Table {} is registered twice",
                    table.entity.name
                )));
            }
        }

        // Phase 2: bodies
        let mut cache = TypeCache::new();
        let mut catalog = Catalog::new(self.max_depth);
        let mut objects = Vec::with_capacity(tables.len());
        let mut inputs: IndexMap<String, InputObject> = IndexMap::new();

        for table in tables {
            tracing::info!("Building schema for table: {}", table.graphql_name);
            validate(table)?;

            let (object, plan) = build_table(table, &exposed, &mut cache, &mut inputs)?;
            objects.push(object);
            catalog.insert(plan);
        }

        for ty in cache.generated() {
            if matches!(ty.kind, GeneratedKind::Enum(_))
                && (RESERVED_NAMES.contains(&ty.name.as_str())
                    || ty.name.starts_with("__")
                    || exposed.values().any(|name| *name == ty.name)
                    || inputs.contains_key(&ty.name))
            {
                return Err(TablegraphError::configuration(format!(
                    "Enum {} clashes with another type name",
                    ty.name
                )));
            }
        }

        let catalog = Arc::new(catalog);
        let mut query = Object::new(QUERY_TYPE);
        for plan in catalog.tables() {
            query = query.field(create_list_resolver(catalog.clone(), plan));
        }

        let mut builder = Schema::build(QUERY_TYPE, None, None);
        builder = register_generated(builder, &cache);
        if catalog.tables().any(|plan| !plan.order_fields.is_empty()) {
            builder = builder.register(order_enum());
        }
        for input in inputs.into_values() {
            builder = builder.register(input);
        }
        for object in objects {
            builder = builder.register(object);
        }
        builder = builder.register(query);

        let schema = builder.finish().map_err(|e| {
            TablegraphError::configuration(format!("Failed to build schema: {}", e))
        })?;

        tracing::info!("Schema built with {} tables", tables.len());
        Ok(schema)
    }
}

/// Names must be valid GraphQL names and not collide with generated types
fn check_type_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
    if !valid {
        return Err(TablegraphError::configuration(format!(
            "{} is not a valid GraphQL name",
            name
        )));
    }
    if RESERVED_NAMES.contains(&name)
        || name.starts_with("__")
        || name.ends_with("_filter")
        || name.ends_with("_order")
    {
        return Err(TablegraphError::configuration(format!(
            "Table name {} clashes with a generated type name",
            name
        )));
    }
    Ok(())
}

fn build_table(
    table: &TableRegistration,
    exposed: &IndexMap<&str, &str>,
    cache: &mut TypeCache,
    inputs: &mut IndexMap<String, InputObject>,
) -> Result<(Object, TablePlan)> {
    let entity = &table.entity;
    let mut object = Object::new(&table.graphql_name);
    if let Some(description) = &table.description {
        object = object.description(description);
    }

    let mut columns = IndexMap::new();
    let mut filters = IndexMap::new();
    let mut filter_input = InputObject::new(format!("{}_filter", table.graphql_name));

    for column in &entity.columns {
        let shown = table.exposes_column(&column.name);
        let filtered = table.filter_fields.contains(&column.name);
        if !shown && !filtered {
            continue;
        }

        let ty = cache.map(column)?;

        if shown {
            object = object.field(create_column_resolver(
                &column.name,
                ty.type_ref(column.nullable),
            ));
            columns.insert(column.name.clone(), column.clone());
        }

        if filtered {
            let shape = build_filter(&ty)?;
            filter_input =
                filter_input.field(InputValue::new(&column.name, TypeRef::named(&shape.name)));
            if !inputs.contains_key(&shape.name) {
                inputs.insert(shape.name.clone(), shape.input_object());
            }
            filters.insert(
                column.name.clone(),
                FilterPlan {
                    column: column.clone(),
                    shape,
                },
            );
        }
    }

    let mut relations = IndexMap::new();
    for name in &table.relationships {
        let meta = entity.find_relationship(name).ok_or_else(|| {
            TablegraphError::configuration(format!(
                "Field {} of {} is not a relationship",
                name, table.graphql_name
            ))
        })?;
        let target = exposed.get(meta.target.as_str()).ok_or_else(|| {
            TablegraphError::configuration(format!(
                "Relationship {} of {} targets {} which is not registered",
                name, table.graphql_name, meta.target
            ))
        })?;
        let relation = RelationPlan::new(meta, *target);
        object = object.field(create_relation_resolver(&relation));
        relations.insert(relation.name.clone(), relation);
    }

    if !filters.is_empty() {
        inputs.insert(format!("{}_filter", table.graphql_name), filter_input);
    }

    if !table.order_fields.is_empty() {
        let order_input = table
            .order_fields
            .iter()
            .fold(
                InputObject::new(format!("{}_order", table.graphql_name)),
                |input, field| input.field(InputValue::new(field, TypeRef::named(ORDER_ENUM))),
            );
        inputs.insert(format!("{}_order", table.graphql_name), order_input);
    }

    let plan = TablePlan {
        graphql_name: table.graphql_name.clone(),
        entity: entity.clone(),
        columns,
        filters,
        order_fields: table.order_fields.clone(),
        default_order: table
            .default_order
            .iter()
            .map(|(field, order)| (field.clone(), *order))
            .collect(),
        pagination: table.pagination,
        default_limit: table.default_limit,
        max_limit: table.max_limit,
        relations,
    };

    Ok((object, plan))
}

/// Register the custom scalars and enums the tables actually use
fn register_generated(mut builder: DynamicSchemaBuilder, cache: &TypeCache) -> DynamicSchemaBuilder {
    for ty in cache.generated() {
        let def: Option<Type> = match &ty.kind {
            GeneratedKind::Scalar(scalar) => custom_scalar(*scalar).map(Into::into),
            GeneratedKind::Enum(_) => ty.enum_definition().map(Into::into),
        };
        if let Some(def) = def {
            builder = builder.register(def);
        }
    }
    builder
}
