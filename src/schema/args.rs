/// Root field arguments
///
/// Turns the `filter`, `order`, `limit` and `offset` arguments of a list field
/// into predicates, sort keys and bounds, coercing literals by column kind.

use super::catalog::{FilterPlan, TablePlan};
use super::scalars::{parse_date, parse_datetime, parse_time};
use crate::error::{Result, TablegraphError};
use crate::metadata::ColumnKind;
use crate::store::{EnumValue, FilterOp, Literal, Order, Predicate, Value};

use async_graphql::{Name, Value as GqlValue};
use indexmap::IndexMap;

/// Arguments of one list field, after validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableQuery {
    pub predicates: Vec<Predicate>,
    pub order: Vec<(String, Order)>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl TableQuery {
    /// Parse the arguments given to a table's root field
    ///
    /// Missing arguments fall back to the registration defaults.
    pub fn from_args(plan: &TablePlan, args: &IndexMap<Name, GqlValue>) -> Result<Self> {
        let predicates = match args.get("filter") {
            Some(GqlValue::Object(filter)) => parse_filter(plan, filter)?,
            Some(GqlValue::Null) | None => Vec::new(),
            Some(other) => {
                return Err(TablegraphError::query(format!(
                    "Filter must be an object, got {}",
                    other
                )))
            }
        };

        let order = match args.get("order") {
            Some(GqlValue::Object(order)) => parse_order(plan, order)?,
            _ => plan.default_order.clone(),
        };

        let limit = int_arg(args, "limit")?.or(plan.default_limit);
        if let Some(limit) = limit {
            check_limit(limit, plan.max_limit)?;
        }

        let offset = int_arg(args, "offset")?.unwrap_or(0);
        if offset < 0 {
            return Err(TablegraphError::query(format!(
                "Provided Offset is negative (Value: {}, Min: 0)",
                offset
            )));
        }

        Ok(Self {
            predicates,
            order,
            offset: (offset > 0).then_some(offset as usize),
            limit: limit.map(|l| l as usize),
        })
    }
}

fn int_arg(args: &IndexMap<Name, GqlValue>, name: &str) -> Result<Option<i64>> {
    match args.get(name) {
        Some(GqlValue::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| TablegraphError::query(format!("Argument {} must be an integer", name))),
        Some(GqlValue::Null) | None => Ok(None),
        Some(other) => Err(TablegraphError::query(format!(
            "Argument {} must be an integer, got {}",
            name, other
        ))),
    }
}

fn check_limit(limit: i64, max: Option<i64>) -> Result<()> {
    if limit < 1 || max.is_some_and(|max| limit > max) {
        let max = max.map_or_else(|| "none".to_string(), |m| m.to_string());
        return Err(TablegraphError::query(format!(
            "Provided Limit is out of bounds (Value: {}, Min: 1, Max: {})",
            limit, max
        )));
    }
    Ok(())
}

fn parse_filter(plan: &TablePlan, filter: &IndexMap<Name, GqlValue>) -> Result<Vec<Predicate>> {
    let mut predicates = Vec::new();

    for (field, operations) in filter {
        let target = plan.filters.get(field.as_str()).ok_or_else(|| {
            TablegraphError::query(format!(
                "Field {} cannot be filtered on {}",
                field, plan.graphql_name
            ))
        })?;

        let operations = match operations {
            GqlValue::Object(operations) => operations,
            GqlValue::Null => continue,
            other => {
                return Err(TablegraphError::query(format!(
                    "Filter for {} must be an object, got {}",
                    field, other
                )))
            }
        };

        for (op_name, literal) in operations {
            let op = FilterOp::from_name(op_name.as_str())
                .filter(|op| target.shape.supports(*op))
                .ok_or_else(|| {
                    TablegraphError::query(format!(
                        "Operator {} is not supported for {}",
                        op_name, field
                    ))
                })?;

            if let Some(literal) = coerce_literal(target, op, literal)? {
                predicates.push(Predicate::new(field.as_str(), op, literal));
            }
        }
    }

    Ok(predicates)
}

/// Null operands are ignored rather than compared
fn coerce_literal(target: &FilterPlan, op: FilterOp, literal: &GqlValue) -> Result<Option<Literal>> {
    let kind = &target.column.kind;
    match (op, literal) {
        (_, GqlValue::Null) => Ok(None),
        (FilterOp::In, GqlValue::List(items)) => {
            let values = items
                .iter()
                .filter(|item| !matches!(item, GqlValue::Null))
                .map(|item| coerce_value(kind, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(Literal::List(values)))
        }
        (FilterOp::In, item) => Ok(Some(Literal::List(vec![coerce_value(kind, item)?]))),
        (_, value) => Ok(Some(Literal::Value(coerce_value(kind, value)?))),
    }
}

/// Convert an input literal to a store value of the column's kind
pub fn coerce_value(kind: &ColumnKind, value: &GqlValue) -> Result<Value> {
    let coerced = match (kind, value) {
        (ColumnKind::Integer, GqlValue::Number(n)) => n.as_i64().map(Value::Int),
        (ColumnKind::Float, GqlValue::Number(n)) => n.as_f64().map(Value::Float),
        (ColumnKind::Text, GqlValue::String(s)) => Some(Value::Text(s.clone())),
        (ColumnKind::Boolean, GqlValue::Boolean(b)) => Some(Value::Bool(*b)),
        (ColumnKind::Date, GqlValue::String(s)) => parse_date(s).map(Value::Date),
        (ColumnKind::DateTime, GqlValue::String(s)) => parse_datetime(s).map(Value::DateTime),
        (ColumnKind::Time, GqlValue::String(s)) => parse_time(s).map(Value::Time),
        (ColumnKind::Enum(e), GqlValue::Enum(name)) => e
            .variant_by_name(name.as_str())
            .map(|v| Value::Enum(EnumValue::new(&v.name, v.value))),
        (ColumnKind::Enum(e), GqlValue::String(name)) => e
            .variant_by_name(name)
            .map(|v| Value::Enum(EnumValue::new(&v.name, v.value))),
        _ => None,
    };

    coerced.ok_or_else(|| {
        TablegraphError::query(format!("Value {} is not a valid {}", value, kind))
    })
}

fn parse_order(plan: &TablePlan, order: &IndexMap<Name, GqlValue>) -> Result<Vec<(String, Order)>> {
    let mut keys = Vec::new();
    for (field, direction) in order {
        if !plan.order_fields.iter().any(|f| f == field.as_str()) {
            return Err(TablegraphError::query(format!(
                "Field {} cannot be ordered on {}",
                field, plan.graphql_name
            )));
        }
        let direction = match direction {
            GqlValue::Null => continue,
            GqlValue::Enum(name) => Order::from_name(name.as_str()),
            GqlValue::String(name) => Order::from_name(name),
            _ => None,
        }
        .ok_or_else(|| {
            TablegraphError::query(format!("Invalid order direction {} for {}", direction, field))
        })?;
        keys.push((field.to_string(), direction));
    }
    Ok(keys)
}
