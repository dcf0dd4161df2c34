/// Execution engine
///
/// [`Engine`] owns the registration lifecycle: tables are registered, the
/// schema is built exactly once, then queries run against it. [`SyncEngine`]
/// and [`AsyncEngine`] add query execution against a blocking or suspending
/// session and otherwise behave identically.

use crate::error::{Result, TablegraphError};
use crate::metadata::{EntityMetadata, MetadataContainer};
use crate::registration::{RegisterOptions, TableRegistration};
use crate::schema::SchemaBuilder;
use crate::store::{AsyncSession, Session, SessionHandle};

use async_graphql::dynamic::Schema;
use async_graphql::{PathSegment, Request, Response, Variables};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// One error reported by a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<serde_json::Value>,
}

/// Outcome of one query: data, errors, or both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub data: Option<serde_json::Value>,
    pub errors: Option<Vec<QueryError>>,
}

impl ExecutionResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_none()
    }
}

impl From<Response> for ExecutionResult {
    fn from(response: Response) -> Self {
        let errors: Vec<QueryError> = response
            .errors
            .into_iter()
            .map(|e| QueryError {
                message: e.message,
                path: e
                    .path
                    .into_iter()
                    .map(|segment| match segment {
                        PathSegment::Field(name) => serde_json::Value::String(name),
                        PathSegment::Index(i) => serde_json::Value::from(i),
                    })
                    .collect(),
            })
            .collect();

        let data = match response.data {
            async_graphql::Value::Null if !errors.is_empty() => None,
            data => data.into_json().ok(),
        };

        Self {
            data,
            errors: (!errors.is_empty()).then_some(errors),
        }
    }
}

/// Registration and schema state shared by both engine variants
#[derive(Default)]
pub struct Engine {
    max_query_depth: Option<usize>,
    tables: IndexMap<String, TableRegistration>,
    schema: Option<Schema>,
    sdl: Option<String>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit relationship nesting; the root table counts as depth 1
    pub fn with_max_query_depth(mut self, depth: usize) -> Self {
        self.max_query_depth = Some(depth);
        self
    }

    pub fn max_query_depth(&self) -> Option<usize> {
        self.max_query_depth
    }

    /// Register a table
    ///
    /// Only name and entity uniqueness are checked here; field references are
    /// validated when the schema is built.
    pub fn register(
        &mut self,
        entity: impl Into<Arc<EntityMetadata>>,
        options: RegisterOptions,
    ) -> Result<()> {
        if self.schema.is_some() {
            return Err(TablegraphError::configuration(
                "Cannot register tables after the schema has been built",
            ));
        }

        let table = TableRegistration::new(entity.into(), options);

        if self
            .tables
            .values()
            .any(|t| t.entity.name == table.entity.name)
        {
            return Err(TablegraphError::configuration(format!(
                "Table {} is already registered",
                table.entity.name
            )));
        }
        if self.tables.contains_key(&table.graphql_name) {
            return Err(TablegraphError::configuration(format!(
                "A table named {} is already registered",
                table.graphql_name
            )));
        }

        tracing::info!(
            "Registered table {} as {}",
            table.entity.name,
            table.graphql_name
        );
        self.tables.insert(table.graphql_name.clone(), table);
        Ok(())
    }

    /// Register every entity of a container with default options
    pub fn register_all_tables(&mut self, container: &MetadataContainer) -> Result<()> {
        for entity in container.entities() {
            self.register(entity.clone(), RegisterOptions::default())?;
        }
        Ok(())
    }

    /// Registered tables keyed by exposed name
    pub fn tables(&self) -> &IndexMap<String, TableRegistration> {
        &self.tables
    }

    pub fn is_built(&self) -> bool {
        self.schema.is_some()
    }

    /// Validate all registrations and build the schema
    pub fn build_schema(&mut self) -> Result<()> {
        if self.schema.is_some() {
            return Err(TablegraphError::configuration("Schema has already been built"));
        }

        let tables: Vec<TableRegistration> = self.tables.values().cloned().collect();
        let schema = SchemaBuilder::new()
            .max_depth(self.max_query_depth)
            .build(&tables)?;

        self.sdl = Some(schema.sdl());
        self.schema = Some(schema);
        Ok(())
    }

    /// Schema definition text of the built schema
    pub fn get_schema(&self) -> Result<&str> {
        self.sdl.as_deref().ok_or_else(not_built)
    }

    /// The built dynamic schema
    pub fn schema(&self) -> Result<&Schema> {
        self.schema.as_ref().ok_or_else(not_built)
    }

    async fn execute(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        session: SessionHandle,
    ) -> Result<ExecutionResult> {
        let schema = self.schema()?;

        let mut request = Request::new(query).data(session);
        if let Some(variables) = variables {
            request = request.variables(Variables::from_json(variables));
        }

        let response = schema.execute(request).await;
        if !response.errors.is_empty() {
            tracing::debug!("Query finished with {} errors", response.errors.len());
        }
        Ok(response.into())
    }
}

fn not_built() -> TablegraphError {
    TablegraphError::configuration("Schema has not been built yet")
}

/// Engine whose queries run against a blocking session
#[derive(Default)]
pub struct SyncEngine {
    engine: Engine,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_query_depth(self, depth: usize) -> Self {
        Self {
            engine: self.engine.with_max_query_depth(depth),
        }
    }

    /// Run a query on the calling thread
    ///
    /// Fails only when the schema has not been built; query problems are
    /// reported in the result's `errors`.
    pub fn execute_query(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        session: Arc<dyn Session>,
    ) -> Result<ExecutionResult> {
        futures::executor::block_on(self.engine.execute(
            query,
            variables,
            SessionHandle::Blocking(session),
        ))
    }
}

impl Deref for SyncEngine {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl DerefMut for SyncEngine {
    fn deref_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

/// Engine whose queries await a suspending session
#[derive(Default)]
pub struct AsyncEngine {
    engine: Engine,
}

impl AsyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_query_depth(self, depth: usize) -> Self {
        Self {
            engine: self.engine.with_max_query_depth(depth),
        }
    }

    /// Run a query, suspending at every statement
    pub async fn execute_query(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        session: Arc<dyn AsyncSession>,
    ) -> Result<ExecutionResult> {
        self.engine
            .execute(query, variables, SessionHandle::Suspending(session))
            .await
    }
}

impl Deref for AsyncEngine {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl DerefMut for AsyncEngine {
    fn deref_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}
