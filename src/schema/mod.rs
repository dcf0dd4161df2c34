/// GraphQL schema generation from table registrations
///
/// This module maps column kinds to GraphQL types, derives filter and order
/// inputs, validates registrations and builds the dynamic schema together with
/// the resolvers that plan and run statements against a session.

mod args;
mod builder;
mod catalog;
mod filters;
mod resolver;
mod scalars;
mod type_mapping;
mod validate;

pub use args::{coerce_value, TableQuery};
pub use builder::SchemaBuilder;
pub use catalog::{Catalog, FilterPlan, RelationPlan, TablePlan};
pub use filters::{build_filter, is_filterable, FilterShape};
pub use resolver::{normalize, resolve_table, selection_depth, ResolveContext, Selection};
pub use scalars::{
    custom_scalar, format_date, format_datetime, format_time, order_enum, parse_date,
    parse_datetime, parse_time, ORDER_ENUM,
};
pub use type_mapping::{GeneratedKind, GeneratedType, ScalarKind, TypeCache};
pub use validate::validate;
