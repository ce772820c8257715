//! CLI entry point for the Kratos GraphRAG agent.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use kratos_core::config::Settings;
use kratos_graph::{GraphClient, GraphConfig};
use kratos_llm::ChatClient;
use kratos_pipeline::{Pipeline, PipelineOptions};

use kratos_agent::{create_router, AppState};

#[derive(Parser)]
#[command(name = "kratos")]
#[command(about = "Answer questions from a Neo4j knowledge graph with validated Cypher")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: kratos).
    #[arg(short, long, default_value = "kratos", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question and print the answer.
    Ask {
        question: String,
        /// Also print the generated query and row count.
        #[arg(long)]
        verbose: bool,
    },
    /// Validate a Cypher query against the live schema without running it.
    Validate { query: String },
    /// Print the schema snapshot as JSON.
    Schema,
    /// Serve the agent-to-agent HTTP protocol.
    Serve {
        /// Override the bind address from config.
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if matches!(cli.command, Command::Serve { .. }) {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let settings = Settings::load(&cli.config)?;
    let pipeline = Arc::new(build_pipeline(&settings).await?);

    match cli.command {
        Command::Ask { question, verbose } => {
            let state = pipeline.run(&question).await?;
            if verbose {
                eprintln!("intent: {}", state.intent);
                eprintln!("query:  {}", state.candidate_query);
                eprintln!("rows:   {}", state.rows.len());
            }
            println!("{}", state.answer);
        }
        Command::Validate { query } => {
            let outcome = pipeline.check_query(&query).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.is_accepted() {
                std::process::exit(1);
            }
        }
        Command::Schema => {
            let schema = pipeline.schema().await?;
            println!("{}", serde_json::to_string_pretty(schema.as_ref())?);
        }
        Command::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| settings.server.bind.clone());
            let router = create_router(AppState {
                pipeline,
                agent_id: settings.server.agent_id.clone(),
                protocol: settings.server.protocol.clone(),
            });

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(addr = %addr, "Kratos agent listening");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

async fn build_pipeline(settings: &Settings) -> anyhow::Result<Pipeline> {
    let llm = ChatClient::from_settings(&settings.llm)?;
    tracing::info!(model = %llm.model(), "Language model configured");

    let graph = GraphClient::connect(&GraphConfig::from(&settings.neo4j)).await?;

    Ok(Pipeline::new(
        Arc::new(graph),
        Arc::new(llm),
        PipelineOptions::from_settings(&settings.pipeline, &settings.server.agent_id),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
