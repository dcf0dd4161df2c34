use tablegraph::config::Config;
use tablegraph::engine::AsyncEngine;
use tablegraph::error::Result;
use tablegraph::store::DataFusionSession;

/// Load every configured table and build an engine over the exposed ones
pub async fn build_engine(config: &Config, session: &DataFusionSession) -> Result<AsyncEngine> {
    let container = tablegraph::config::load_tables(config, session).await?;

    let mut engine = AsyncEngine::new();
    if let Some(depth) = config.server.max_query_depth {
        engine = engine.with_max_query_depth(depth);
    }

    tablegraph::config::register_tables(config, &container, &mut engine)?;
    tracing::info!("🔧 Building GraphQL schema for {} tables...", engine.tables().len());
    engine.build_schema()?;

    Ok(engine)
}

/// Run the schema command to print the generated schema
pub async fn run(config_path: String) -> Result<()> {
    tracing::info!("📖 Loading configuration from {}", config_path);
    let config = tablegraph::config::load_config(&config_path)?;

    let session = DataFusionSession::new();
    let engine = build_engine(&config, &session).await?;

    println!("{}", engine.get_schema()?);
    Ok(())
}
