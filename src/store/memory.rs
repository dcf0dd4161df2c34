/// In-process table store
///
/// Holds rows per table and evaluates statements directly. Useful for embedding
/// the engine without a database and for exercising the planner in tests.

use super::statement::{FilterOp, Literal, Order, Predicate, Statement};
use super::value::{Row, Value};
use super::{AsyncSession, Session};
use crate::error::{Result, TablegraphError};

use async_trait::async_trait;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemorySession {
    tables: IndexMap<String, Vec<Row>>,
    executed: Mutex<Vec<Statement>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table's rows
    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.insert(table.into(), rows);
        self
    }

    pub fn insert(&mut self, table: impl Into<String>, row: Row) {
        self.tables.entry(table.into()).or_default().push(row);
    }

    /// Statements executed so far, oldest first
    pub fn executed(&self) -> Vec<Statement> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn run(&self, statement: &Statement) -> Result<Vec<Row>> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(statement.clone());
        }

        let rows = self
            .tables
            .get(&statement.table)
            .ok_or_else(|| TablegraphError::Store(format!("No such table '{}'", statement.table)))?;

        let mut matched: Vec<&Row> = Vec::new();
        for row in rows {
            if matches_all(row, &statement.predicates)? {
                matched.push(row);
            }
        }

        for (column, _) in &statement.order_by {
            check_column(rows, &statement.table, column)?;
        }
        matched.sort_by(|a, b| compare_rows(a, b, &statement.order_by));

        let offset = statement.offset.unwrap_or(0);
        let limit = statement.limit.unwrap_or(usize::MAX);

        let mut result = Vec::new();
        for row in matched.into_iter().skip(offset).take(limit) {
            let mut projected = Row::new();
            for column in &statement.columns {
                let value = row.get(column).ok_or_else(|| {
                    TablegraphError::Store(format!(
                        "No such column '{}' in table '{}'",
                        column, statement.table
                    ))
                })?;
                projected.insert(column.clone(), value.clone());
            }
            result.push(projected);
        }

        Ok(result)
    }
}

impl Session for MemorySession {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.run(statement)
    }
}

#[async_trait]
impl AsyncSession for MemorySession {
    async fn execute(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.run(statement)
    }
}

fn check_column(rows: &[Row], table: &str, column: &str) -> Result<()> {
    match rows.first() {
        Some(row) if !row.contains_key(column) => Err(TablegraphError::Store(format!(
            "No such column '{}' in table '{}'",
            column, table
        ))),
        _ => Ok(()),
    }
}

fn matches_all(row: &Row, predicates: &[Predicate]) -> Result<bool> {
    for predicate in predicates {
        let value = row.get(&predicate.column).ok_or_else(|| {
            TablegraphError::Store(format!("No such column '{}'", predicate.column))
        })?;
        if !matches(value, predicate)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// SQL semantics: comparisons against NULL never match
fn matches(value: &Value, predicate: &Predicate) -> Result<bool> {
    if value.is_null() {
        return Ok(false);
    }

    match (&predicate.op, &predicate.literal) {
        (FilterOp::In, Literal::List(items)) => {
            Ok(items.iter().any(|item| value.compare(item) == Some(Ordering::Equal)))
        }
        (FilterOp::In, Literal::Value(_)) | (_, Literal::List(_)) => Err(TablegraphError::Store(
            format!("Malformed predicate on '{}'", predicate.column),
        )),
        (op, Literal::Value(literal)) => match op {
            FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith => {
                let (Some(haystack), Some(needle)) = (value.as_text(), literal.as_text()) else {
                    return Ok(false);
                };
                Ok(match op {
                    FilterOp::Contains => haystack.contains(needle),
                    FilterOp::StartsWith => haystack.starts_with(needle),
                    _ => haystack.ends_with(needle),
                })
            }
            _ => {
                let Some(ordering) = value.compare(literal) else {
                    return Ok(false);
                };
                Ok(match op {
                    FilterOp::Eq => ordering == Ordering::Equal,
                    FilterOp::Ne => ordering != Ordering::Equal,
                    FilterOp::Gt => ordering == Ordering::Greater,
                    FilterOp::Ge => ordering != Ordering::Less,
                    FilterOp::Lt => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                })
            }
        },
    }
}

/// Nulls sort first ascending and last descending
fn compare_rows(a: &Row, b: &Row, order_by: &[(String, Order)]) -> Ordering {
    for (column, order) in order_by {
        let left = a.get(column).unwrap_or(&Value::Null);
        let right = b.get(column).unwrap_or(&Value::Null);
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
        };
        let ordering = match order {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
