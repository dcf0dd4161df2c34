use super::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ASC" => Some(Order::Asc),
            "DESC" => Some(Order::Desc),
            _ => None,
        }
    }
}

/// Comparison and membership operators accepted in a filter tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Ge => "ge",
            FilterOp::Lt => "lt",
            FilterOp::Le => "le",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "startswith",
            FilterOp::EndsWith => "endswith",
            FilterOp::In => "in",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "eq" => FilterOp::Eq,
            "ne" => FilterOp::Ne,
            "gt" => FilterOp::Gt,
            "ge" => FilterOp::Ge,
            "lt" => FilterOp::Lt,
            "le" => FilterOp::Le,
            "contains" => FilterOp::Contains,
            "startswith" => FilterOp::StartsWith,
            "endswith" => FilterOp::EndsWith,
            "in" => FilterOp::In,
            _ => return None,
        };
        Some(op)
    }
}

/// Right-hand side of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Value(Value),
    List(Vec<Value>),
}

/// `column <op> literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: FilterOp,
    pub literal: Literal,
}

impl Predicate {
    pub fn new(column: impl Into<String>, op: FilterOp, literal: Literal) -> Self {
        Self {
            column: column.into(),
            op,
            literal,
        }
    }

    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Self::new(column, FilterOp::Eq, Literal::Value(value))
    }

    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(column, FilterOp::In, Literal::List(values))
    }
}

/// A single-table read handed to an executor
///
/// Predicates are conjoined. Sort keys apply in order, then `offset` and
/// `limit` bound the result.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub table: String,
    pub columns: Vec<String>,
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<(String, Order)>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Statement {
    pub fn select(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            predicates: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Date(d) => write!(f, "'{}'", d),
            Value::DateTime(dt) => write!(f, "'{}'", dt),
            Value::Time(t) => write!(f, "'{}'", t),
            Value::Enum(e) => write!(f, "'{}'", e.name),
            Value::Bytes(b) => write!(f, "x'{}'", hex::encode(b)),
            Value::Json(j) => write!(f, "'{}'", j),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Literal::Value(v) => write!(f, "\"{}\" {} {}", self.column, self.op.as_str(), v),
            Literal::List(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(
                    f,
                    "\"{}\" {} ({})",
                    self.column,
                    self.op.as_str(),
                    items.join(", ")
                )
            }
        }
    }
}

/// SQL-like rendering, used for logging only
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self.columns.iter().map(|c| format!("\"{}\"", c)).collect();
        write!(f, "SELECT {} FROM \"{}\"", columns.join(", "), self.table)?;

        if !self.predicates.is_empty() {
            let predicates: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
            write!(f, " WHERE {}", predicates.join(" AND "))?;
        }

        if !self.order_by.is_empty() {
            let keys: Vec<String> = self
                .order_by
                .iter()
                .map(|(c, o)| format!("\"{}\" {}", c, o.as_str()))
                .collect();
            write!(f, " ORDER BY {}", keys.join(", "))?;
        }

        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {}", offset)?;
        }

        Ok(())
    }
}
