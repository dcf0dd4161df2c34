use clap::{Parser, Subcommand};
use tablegraph::error::Result;

mod cli;

#[derive(Parser)]
#[command(name = "tablegraph")]
#[command(version = "0.1.0")]
#[command(about = "Turn relational tables into GraphQL query APIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an example configuration
    Init {
        /// Output config file path (if not specified, outputs to stdout)
        #[arg(long)]
        output: Option<String>,

        /// Also write the example CSV tables to this directory
        #[arg(long)]
        data: Option<String>,
    },

    /// Print the generated GraphQL schema
    Schema {
        /// Config file path
        #[arg(long, default_value = "tablegraph.toml")]
        config: String,
    },

    /// Start GraphQL server
    Serve {
        /// Config file path
        #[arg(long, default_value = "tablegraph.toml")]
        config: String,

        /// Server port, overriding the configured one
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output, data } => {
            cli::init::run(output, data).await?;
        }
        Commands::Schema { config } => {
            cli::schema::run(config).await?;
        }
        Commands::Serve { config, port } => {
            cli::serve::run(config, port).await?;
        }
    }

    Ok(())
}
