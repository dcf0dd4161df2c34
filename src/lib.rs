pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod registration;
pub mod schema;
pub mod store;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, ServerConfig, TableConfig};
pub use engine::{AsyncEngine, Engine, ExecutionResult, QueryError, SyncEngine};
pub use error::{Result, TablegraphError};
pub use metadata::{
    Cardinality, ColumnKind, ColumnMeta, EntityMetadata, EnumType, Join, MetadataContainer,
    RelationshipMeta,
};
pub use registration::{RegisterOptions, TableRegistration};
pub use schema::SchemaBuilder;
pub use store::{AsyncSession, DataFusionSession, MemorySession, Session};
