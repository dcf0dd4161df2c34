use std::sync::Arc;

use tablegraph::error::Result;
use tablegraph::store::DataFusionSession;
use tablegraph::transport::{self, AsyncService};

/// Run the serve command to start the GraphQL server
pub async fn run(config_path: String, port: Option<u16>) -> Result<()> {
    tracing::info!("📖 Loading configuration from {}", config_path);
    let config = tablegraph::config::load_config(&config_path)?;

    let server_port = port.unwrap_or(config.server.port);

    let session = DataFusionSession::new();
    let engine = crate::cli::schema::build_engine(&config, &session).await?;

    tracing::info!("✅ Schema built successfully");
    if let Some(depth) = engine.max_query_depth() {
        tracing::info!("   Maximum query depth: {}", depth);
    }
    tracing::info!("💡 Press Ctrl+C to stop the server");

    let service = Arc::new(AsyncService::new(Arc::new(engine), Arc::new(session)));
    let app = transport::router(service, None);

    transport::serve(app, &config.server.bind, server_port).await
}
