/// Filter input shapes
///
/// Each filterable scalar type gets one input object listing the operators it
/// supports. Shapes are named after the scalar (`IntFilter`, `StringFilter`,
/// ...) and enums get a per-enum shape (`<Enum>_filter`) so unrelated enums
/// never collide.

use super::type_mapping::{GeneratedKind, GeneratedType, ScalarKind};
use crate::error::{Result, TablegraphError};
use crate::metadata::ColumnKind;
use crate::store::FilterOp;

use async_graphql::dynamic::{InputObject, InputValue, TypeRef};

const ORDERED_OPS: &[FilterOp] = &[
    FilterOp::Eq,
    FilterOp::Ne,
    FilterOp::Gt,
    FilterOp::Ge,
    FilterOp::Lt,
    FilterOp::Le,
    FilterOp::In,
];

const TEXT_OPS: &[FilterOp] = &[
    FilterOp::Eq,
    FilterOp::Ne,
    FilterOp::Contains,
    FilterOp::StartsWith,
    FilterOp::EndsWith,
    FilterOp::In,
];

const BOOL_OPS: &[FilterOp] = &[FilterOp::Eq, FilterOp::Ne];

const ENUM_OPS: &[FilterOp] = &[FilterOp::Eq, FilterOp::Ne, FilterOp::In];

/// Operators and argument shape for one scalar type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterShape {
    pub name: String,
    /// Type name of a single operand
    pub operand: String,
    pub operators: &'static [FilterOp],
}

impl FilterShape {
    pub fn supports(&self, op: FilterOp) -> bool {
        self.operators.contains(&op)
    }

    /// `in` takes a list of the operand type; every other operator one value
    pub fn input_object(&self) -> InputObject {
        self.operators
            .iter()
            .fold(InputObject::new(&self.name), |input, op| {
                let ty = match op {
                    FilterOp::In => TypeRef::named_list(&self.operand),
                    _ => TypeRef::named(&self.operand),
                };
                input.field(InputValue::new(op.as_str(), ty))
            })
    }
}

/// Build the filter shape for a generated type
pub fn build_filter(ty: &GeneratedType) -> Result<FilterShape> {
    let (name, operators) = match &ty.kind {
        GeneratedKind::Scalar(scalar) => match scalar {
            ScalarKind::Int => ("IntFilter".to_string(), ORDERED_OPS),
            ScalarKind::Float => ("FloatFilter".to_string(), ORDERED_OPS),
            ScalarKind::Date => ("DateFilter".to_string(), ORDERED_OPS),
            ScalarKind::DateTime => ("DateTimeFilter".to_string(), ORDERED_OPS),
            ScalarKind::Time => ("TimeFilter".to_string(), ORDERED_OPS),
            ScalarKind::String => ("StringFilter".to_string(), TEXT_OPS),
            ScalarKind::Boolean => ("BoolFilter".to_string(), BOOL_OPS),
            ScalarKind::Bytes | ScalarKind::Json => {
                return Err(TablegraphError::configuration(format!(
                    "Filtering on {} is not supported (supported: int, str, bool, float, enum, datetime, date, time)",
                    scalar.type_name()
                )))
            }
        },
        GeneratedKind::Enum(e) => (format!("{}_filter", e.name), ENUM_OPS),
    };

    Ok(FilterShape {
        name,
        operand: ty.name.clone(),
        operators,
    })
}

/// Whether columns of this kind can appear in `filter_fields`
pub fn is_filterable(kind: &ColumnKind) -> bool {
    matches!(
        kind,
        ColumnKind::Integer
            | ColumnKind::Float
            | ColumnKind::Text
            | ColumnKind::Boolean
            | ColumnKind::Date
            | ColumnKind::DateTime
            | ColumnKind::Time
            | ColumnKind::Enum(_)
    )
}
