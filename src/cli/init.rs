use tablegraph::error::Result;

/// Run the init command to generate an example configuration
///
/// With `data` the example CSV tables are written to that directory as well,
/// so the configuration can be served right away.
pub async fn run(output: Option<String>, data: Option<String>) -> Result<()> {
    let data_dir = data.clone().unwrap_or_else(|| "./data".to_string());

    if data.is_some() {
        tracing::info!("Writing example tables to {}", data_dir);
        crate::cli::example::write_example_data(&data_dir)?;
    }

    let config = crate::cli::example::example_config(&data_dir);
    tracing::info!("Created {} example tables:", config.tables.len());
    for table in &config.tables {
        match &table.expose {
            Some(options) => tracing::info!(
                "   {} exposed as {}",
                table.name,
                options.graphql_name.as_deref().unwrap_or(&table.name)
            ),
            None => tracing::info!("   {} (link table, not exposed)", table.name),
        }
    }

    if let Some(output_path) = output {
        tablegraph::config::save_config(&config, &output_path)?;
        tracing::info!("Generated example configuration: {}", output_path);
        tracing::info!("Start the server with 'tablegraph serve --config {}'", output_path);
    } else {
        let toml_string = toml::to_string_pretty(&config)?;
        println!("{}", toml_string);
        tracing::info!("Tip: add --output <file> to save to a file instead of stdout");
    }

    Ok(())
}
