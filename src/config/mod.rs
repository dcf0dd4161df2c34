mod types;

pub use types::{
    Config, EnumConfig, RelationshipConfig, ServerConfig, TableConfig, ThroughConfig,
};

use crate::engine::Engine;
use crate::error::{Result, TablegraphError};
use crate::metadata::MetadataContainer;
use crate::store::DataFusionSession;
use std::fs;

/// Prefix of environment overrides, e.g. `TABLEGRAPH__SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "TABLEGRAPH";

/// Load configuration from a TOML file
///
/// `[server]` settings can be overridden from the environment.
pub fn load_config(path: &str) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|e| {
        TablegraphError::configuration(format!("Failed to read config file '{}': {}", path, e))
    })?;

    let mut config: Config = toml::from_str(&contents).map_err(|e| {
        TablegraphError::configuration(format!("Failed to parse config file '{}': {}", path, e))
    })?;

    apply_env_overrides(&mut config, env_source())?;
    config.validate()?;

    Ok(config)
}

fn env_source() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn apply_env_overrides(config: &mut Config, source: ::config::Environment) -> Result<()> {
    let env = ::config::Config::builder().add_source(source).build()?;

    if let Some(port) = env_override::<u16>(&env, "server.port")? {
        config.server.port = port;
    }
    if let Some(bind) = env_override::<String>(&env, "server.bind")? {
        config.server.bind = bind;
    }
    if let Some(depth) = env_override::<usize>(&env, "server.max_query_depth")? {
        config.server.max_query_depth = Some(depth);
    }

    Ok(())
}

/// Unset keys are `None`; values that fail to parse are errors
fn env_override<T: serde::de::DeserializeOwned>(
    env: &::config::Config,
    key: &str,
) -> Result<Option<T>> {
    match env.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(::config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Save configuration to a TOML file
pub fn save_config(config: &Config, path: &str) -> Result<()> {
    config.validate()?;

    let toml_string = toml::to_string_pretty(config)?;
    fs::write(path, toml_string).map_err(|e| {
        TablegraphError::configuration(format!("Failed to write config file '{}': {}", path, e))
    })?;

    Ok(())
}

/// Register every configured table with a DataFusion session and collect
/// the resulting metadata
pub async fn load_tables(config: &Config, session: &DataFusionSession) -> Result<MetadataContainer> {
    let mut container = MetadataContainer::new();

    for table in &config.tables {
        tracing::info!("Loading table {} from {}", table.name, table.path);
        session.register_table_from_path(&table.name, &table.path).await?;

        let entity = session.entity_metadata(&table.name).await?;
        container.add(table.apply(entity)?);
    }

    Ok(container)
}

/// Register the configured tables with an engine
///
/// With `register_all` every table is registered with default options;
/// otherwise only tables carrying an `expose` block are.
pub fn register_tables(config: &Config, container: &MetadataContainer, engine: &mut Engine) -> Result<()> {
    if config.register_all {
        return engine.register_all_tables(container);
    }

    for table in &config.tables {
        let Some(options) = &table.expose else {
            tracing::debug!("Table {} is not exposed", table.name);
            continue;
        };
        let entity = container.get(&table.name).ok_or_else(|| {
            TablegraphError::configuration(format!("Table {} has not been loaded", table.name))
        })?;
        engine.register(entity, options.clone())?;
    }

    Ok(())
}
