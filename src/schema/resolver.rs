/// GraphQL resolvers for table queries
///
/// The root list field of each table plans and executes the whole requested
/// tree itself: one statement for the table, then one dependent statement per
/// row and selected relationship. Rows are normalized into GraphQL values, and
/// the field resolvers of the object types only read from those values.

use super::args::TableQuery;
use super::catalog::{Catalog, RelationPlan, TablePlan};
use super::scalars::{format_date, format_datetime, format_time};
use crate::error::{Result, TablegraphError};
use crate::metadata::{Cardinality, ColumnKind, Join};
use crate::store::{Predicate, Row, SessionHandle, Statement, Value};

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, ResolverContext, TypeRef};
use async_graphql::{Name, SelectionField, Value as GqlValue};
use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use std::sync::Arc;

/// Requested sub-fields of one field, merged by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    fields: IndexMap<String, Selection>,
}

impl Selection {
    /// Collect the selection below a field, skipping introspection fields
    pub fn from_field(field: SelectionField<'_>) -> Self {
        let mut selection = Selection::default();
        for child in field.selection_set() {
            let name = child.name().to_string();
            if name.starts_with("__") {
                continue;
            }
            let nested = Selection::from_field(child);
            selection.fields.entry(name).or_default().merge(nested);
        }
        selection
    }

    fn merge(&mut self, other: Selection) {
        for (name, nested) in other.fields {
            self.fields.entry(name).or_default().merge(nested);
        }
    }

    pub fn field(mut self, name: impl Into<String>, nested: Selection) -> Self {
        self.fields.insert(name.into(), nested);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Selection> {
        self.fields.get(name)
    }
}

/// Relationship nesting of a selection, counting the table itself as 1
pub fn selection_depth(catalog: &Catalog, plan: &TablePlan, selection: &Selection) -> Result<usize> {
    let mut deepest = 0;
    for (name, nested) in &selection.fields {
        if let Some(relation) = plan.relations.get(name) {
            let target = catalog.table(&relation.target)?;
            deepest = deepest.max(selection_depth(catalog, target, nested)?);
        }
    }
    Ok(deepest + 1)
}

/// State threaded through one recursive resolution
#[derive(Clone)]
pub struct ResolveContext {
    pub catalog: Arc<Catalog>,
    pub session: SessionHandle,
    pub depth: usize,
}

impl ResolveContext {
    pub fn new(catalog: Arc<Catalog>, session: SessionHandle) -> Self {
        Self {
            catalog,
            session,
            depth: 1,
        }
    }

    /// Context for a relationship one level down
    pub fn descend(&self) -> Result<Self> {
        let depth = self.depth + 1;
        check_depth(depth, self.catalog.max_depth())?;
        Ok(Self {
            depth,
            ..self.clone()
        })
    }
}

fn check_depth(depth: usize, max: Option<usize>) -> Result<()> {
    match max {
        Some(max) if depth > max => Err(TablegraphError::query(format!(
            "Query depth {} exceeds the maximum depth of {}",
            depth, max
        ))),
        _ => Ok(()),
    }
}

/// Resolve a table's rows for a selection
///
/// Returns one GraphQL object per row with exactly the selected fields.
pub fn resolve_table<'a>(
    cx: &'a ResolveContext,
    plan: &'a TablePlan,
    selection: &'a Selection,
    query: TableQuery,
) -> BoxFuture<'a, Result<Vec<GqlValue>>> {
    async move {
        let statement = build_statement(plan, selection, query);
        let rows = cx.session.execute(&statement).await?;

        let mut objects = Vec::with_capacity(rows.len());
        for row in rows {
            let mut object = IndexMap::new();
            for name in selection.names() {
                if let Some(column) = plan.columns.get(name) {
                    let value = row.get(name).unwrap_or(&Value::Null);
                    object.insert(Name::new(name), normalize(&column.kind, value)?);
                } else if let Some(relation) = plan.relations.get(name) {
                    let nested = selection.get(name).cloned().unwrap_or_default();
                    let value = resolve_relation(&cx.descend()?, relation, &row, &nested).await?;
                    object.insert(Name::new(name), value);
                }
            }
            objects.push(GqlValue::Object(object));
        }
        Ok(objects)
    }
    .boxed()
}

fn build_statement(plan: &TablePlan, selection: &Selection, query: TableQuery) -> Statement {
    let mut columns: Vec<String> = Vec::new();
    for name in selection.names() {
        let column = if plan.columns.contains_key(name) {
            Some(name)
        } else {
            plan.relations.get(name).map(|r| r.join.local_key())
        };
        if let Some(column) = column {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    if columns.is_empty() {
        if let Some(column) = plan.fallback_column() {
            columns.push(column.to_string());
        }
    }

    let mut statement = Statement::select(plan.table(), columns);
    statement.predicates = query.predicates;
    statement.order_by = query.order;
    statement.offset = query.offset;
    statement.limit = query.limit;
    statement
}

async fn resolve_relation(
    cx: &ResolveContext,
    relation: &RelationPlan,
    row: &Row,
    selection: &Selection,
) -> Result<GqlValue> {
    let empty = match relation.cardinality {
        Cardinality::One => GqlValue::Null,
        Cardinality::Many => GqlValue::List(Vec::new()),
    };

    let key = match row.get(relation.join.local_key()) {
        Some(key) if !key.is_null() => key.clone(),
        _ => return Ok(empty),
    };

    let predicate = match &relation.join {
        Join::Direct { remote_key, .. } => Predicate::eq(remote_key, key),
        Join::Through {
            table,
            link_local,
            link_remote,
            remote_key,
            ..
        } => {
            let link = Statement::select(table, vec![link_remote.clone()])
                .filter(Predicate::eq(link_local, key));
            let keys: Vec<Value> = cx
                .session
                .execute(&link)
                .await?
                .into_iter()
                .filter_map(|mut r| r.shift_remove(link_remote.as_str()))
                .filter(|v| !v.is_null())
                .collect();
            if keys.is_empty() {
                return Ok(empty);
            }
            Predicate::in_list(remote_key, keys)
        }
    };

    let target = cx.catalog.table(&relation.target)?;
    let query = TableQuery {
        predicates: vec![predicate],
        order: target.default_order.clone(),
        offset: None,
        limit: match relation.cardinality {
            Cardinality::One => Some(1),
            Cardinality::Many => None,
        },
    };

    let mut objects = resolve_table(cx, target, selection, query).await?;
    Ok(match relation.cardinality {
        Cardinality::One if objects.is_empty() => GqlValue::Null,
        Cardinality::One => objects.swap_remove(0),
        Cardinality::Many => GqlValue::List(objects),
    })
}

/// Convert a stored value to its GraphQL form
///
/// Enums render as their symbolic name whether the store returned the name or
/// the underlying value.
pub fn normalize(kind: &ColumnKind, value: &Value) -> Result<GqlValue> {
    let out = match value {
        Value::Null => GqlValue::Null,
        Value::Enum(e) => GqlValue::Enum(Name::new(&e.name)),
        Value::Int(i) => match kind {
            ColumnKind::Enum(e) => match e.variant_by_value(*i) {
                Some(variant) => GqlValue::Enum(Name::new(&variant.name)),
                None => {
                    tracing::warn!("Unknown value {} for enum {}", i, e.name);
                    GqlValue::Null
                }
            },
            _ => GqlValue::from(*i),
        },
        Value::Text(s) => match kind {
            ColumnKind::Enum(_) => GqlValue::Enum(Name::new(s)),
            _ => GqlValue::String(s.clone()),
        },
        Value::Bool(b) => GqlValue::Boolean(*b),
        Value::Float(f) => async_graphql::Number::from_f64(*f)
            .map(GqlValue::Number)
            .unwrap_or(GqlValue::Null),
        Value::Date(d) => GqlValue::String(format_date(d)),
        Value::DateTime(dt) => GqlValue::String(format_datetime(dt)),
        Value::Time(t) => GqlValue::String(format_time(t)),
        Value::Bytes(b) => GqlValue::String(hex::encode(b)),
        Value::Json(j) => GqlValue::from_json(j.clone())
            .map_err(|e| TablegraphError::query(format!("Invalid JSON value: {}", e)))?,
    };
    Ok(out)
}

/// Create the `<name>s` root list field for a table
pub fn create_list_resolver(catalog: Arc<Catalog>, plan: &TablePlan) -> Field {
    let graphql_name = plan.graphql_name.clone();
    let field_name = format!("{}s", plan.graphql_name);

    let mut field = Field::new(
        field_name,
        TypeRef::named_list(&plan.graphql_name),
        move |ctx: ResolverContext| {
            let catalog = catalog.clone();
            let graphql_name = graphql_name.clone();

            FieldFuture::new(async move {
                let session = ctx
                    .data::<SessionHandle>()
                    .map_err(|_| "No session supplied for this query")?
                    .clone();
                let plan = catalog.table(&graphql_name)?;

                let query = TableQuery::from_args(plan, ctx.args.as_index_map())?;
                let selection = Selection::from_field(ctx.ctx.field());
                check_depth(selection_depth(&catalog, plan, &selection)?, catalog.max_depth())?;

                let cx = ResolveContext::new(catalog.clone(), session);
                let objects = resolve_table(&cx, plan, &selection, query).await?;

                Ok(Some(FieldValue::list(
                    objects.into_iter().map(FieldValue::owned_any),
                )))
            })
        },
    );

    if !plan.filters.is_empty() {
        field = field.argument(InputValue::new(
            "filter",
            TypeRef::named(format!("{}_filter", plan.graphql_name)),
        ));
    }

    if plan.pagination {
        let mut limit = InputValue::new("limit", TypeRef::named(TypeRef::INT));
        if let Some(default) = plan.default_limit {
            limit = limit.default_value(default);
        }
        field = field
            .argument(limit)
            .argument(InputValue::new("offset", TypeRef::named(TypeRef::INT)).default_value(0));
    }

    if !plan.order_fields.is_empty() {
        field = field.argument(InputValue::new(
            "order",
            TypeRef::named(format!("{}_order", plan.graphql_name)),
        ));
    }

    field
}

/// Field reading a scalar column from the parent row
pub fn create_column_resolver(name: &str, type_ref: TypeRef) -> Field {
    let column = name.to_string();

    Field::new(name, type_ref, move |ctx: ResolverContext| {
        let column = column.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<GqlValue>()?;

            if let GqlValue::Object(obj) = parent {
                if let Some(value) = obj.get(column.as_str()) {
                    if !matches!(value, GqlValue::Null) {
                        return Ok(Some(FieldValue::value(value.clone())));
                    }
                }
            }

            Ok(Some(FieldValue::NULL))
        })
    })
}

/// Field reading a resolved relationship from the parent row
pub fn create_relation_resolver(relation: &RelationPlan) -> Field {
    let name = relation.name.clone();
    let type_ref = match relation.cardinality {
        Cardinality::One => TypeRef::named(&relation.target),
        Cardinality::Many => TypeRef::named_list(&relation.target),
    };

    Field::new(relation.name.clone(), type_ref, move |ctx: ResolverContext| {
        let name = name.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<GqlValue>()?;

            let value = match parent {
                GqlValue::Object(obj) => obj.get(name.as_str()).cloned(),
                _ => None,
            };

            Ok(match value {
                Some(GqlValue::List(items)) => Some(FieldValue::list(
                    items.into_iter().map(FieldValue::owned_any),
                )),
                Some(GqlValue::Object(obj)) => Some(FieldValue::owned_any(GqlValue::Object(obj))),
                _ => None,
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnMeta, EntityMetadata, EnumType};
    use crate::store::{EnumValue, MemorySession, Order};

    fn plan(name: &str, table: &str, relations: Vec<RelationPlan>) -> TablePlan {
        let entity = Arc::new(
            EntityMetadata::new(table)
                .column(ColumnMeta::new("int_field", ColumnKind::Integer).primary_key())
                .column(ColumnMeta::new("parent_id", ColumnKind::Integer).nullable()),
        );
        TablePlan {
            graphql_name: name.to_string(),
            columns: entity.columns.iter().map(|c| (c.name.clone(), c.clone())).collect(),
            entity,
            filters: IndexMap::new(),
            order_fields: Vec::new(),
            default_order: vec![("int_field".to_string(), Order::Asc)],
            pagination: false,
            default_limit: None,
            max_limit: None,
            relations: relations.into_iter().map(|r| (r.name.clone(), r)).collect(),
        }
    }

    fn catalog(max_depth: Option<usize>) -> Arc<Catalog> {
        let children = RelationPlan {
            name: "children".to_string(),
            target: "node".to_string(),
            cardinality: Cardinality::Many,
            join: Join::Direct {
                local_key: "int_field".to_string(),
                remote_key: "parent_id".to_string(),
            },
        };
        let mut catalog = Catalog::new(max_depth);
        catalog.insert(plan("node", "NODE", vec![children]));
        Arc::new(catalog)
    }

    fn session() -> Arc<MemorySession> {
        Arc::new(MemorySession::new().with_table(
            "NODE",
            vec![
                [("int_field", Value::Int(1)), ("parent_id", Value::Null)],
                [("int_field", Value::Int(2)), ("parent_id", Value::Int(1))],
                [("int_field", Value::Int(3)), ("parent_id", Value::Int(1))],
            ]
            .into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
            .collect(),
        ))
    }

    fn nested(levels: usize) -> Selection {
        (0..levels).fold(Selection::default().field("int_field", Selection::default()), |inner, _| {
            Selection::default()
                .field("int_field", Selection::default())
                .field("children", inner)
        })
    }

    #[test]
    fn test_selection_depth_counts_relationships() {
        let catalog = catalog(None);
        let plan = catalog.table("node").unwrap();
        assert_eq!(selection_depth(&catalog, plan, &nested(0)).unwrap(), 1);
        assert_eq!(selection_depth(&catalog, plan, &nested(2)).unwrap(), 3);
    }

    #[test]
    fn test_depth_ceiling() {
        assert!(check_depth(2, Some(2)).is_ok());
        assert!(check_depth(3, Some(2)).is_err());
        assert!(check_depth(100, None).is_ok());
    }

    #[test]
    fn test_normalize_enum_by_value_and_name() {
        let kind = ColumnKind::enumeration(EnumType::new("SampleEnum", ["ODD", "EVEN"]));
        let even = GqlValue::Enum(Name::new("EVEN"));
        assert_eq!(normalize(&kind, &Value::Int(2)).unwrap(), even);
        assert_eq!(normalize(&kind, &Value::from("EVEN")).unwrap(), even);
        assert_eq!(
            normalize(&kind, &Value::Enum(EnumValue::new("EVEN", 2))).unwrap(),
            even
        );
        assert_eq!(normalize(&kind, &Value::Int(9)).unwrap(), GqlValue::Null);
    }

    #[test]
    fn test_normalize_bytes_as_hex() {
        assert_eq!(
            normalize(&ColumnKind::Bytes, &Value::Bytes(b"One".to_vec())).unwrap(),
            GqlValue::String("4f6e65".to_string())
        );
    }

    #[tokio::test]
    async fn test_resolve_nested_relationship() {
        let catalog = catalog(None);
        let session = session();
        let cx = ResolveContext::new(catalog.clone(), SessionHandle::Blocking(session.clone()));
        let plan = catalog.table("node").unwrap();

        let query = TableQuery {
            predicates: vec![Predicate::eq("int_field", Value::Int(1))],
            ..Default::default()
        };
        let objects = resolve_table(&cx, plan, &nested(1), query).await.unwrap();

        let json = GqlValue::List(objects).into_json().unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"int_field": 1, "children": [{"int_field": 2}, {"int_field": 3}]}
            ])
        );
        // The root statement reads the join key once, then one statement per parent row
        assert_eq!(session.executed().len(), 2);
        assert_eq!(session.executed()[0].columns, vec!["int_field".to_string()]);
    }

    #[tokio::test]
    async fn test_descend_past_ceiling_fails() {
        let catalog = catalog(Some(1));
        let cx = ResolveContext::new(catalog.clone(), SessionHandle::Blocking(session()));
        let plan = catalog.table("node").unwrap();

        let err = resolve_table(&cx, plan, &nested(1), TableQuery::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceeds the maximum depth of 1"));
    }
}
