use thiserror::Error;

#[derive(Error, Debug)]
pub enum TablegraphError {
    /// Static misconfiguration raised during registration, build or introspection.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure raised while resolving one query field.
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Delta table error: {0}")]
    DeltaTable(#[from] deltalake::DeltaTableError),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("Config file error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TablegraphError {
    pub fn configuration(message: impl Into<String>) -> Self {
        TablegraphError::Configuration(message.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        TablegraphError::QueryExecution(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, TablegraphError::Configuration(_))
    }
}

impl From<toml::ser::Error> for TablegraphError {
    fn from(err: toml::ser::Error) -> Self {
        TablegraphError::Serialization(format!("TOML serialization error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, TablegraphError>;
