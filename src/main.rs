use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyground::config::Config;
use storyground::pipeline::StoryPipeline;

mod commands;

#[derive(Parser)]
#[command(
    name = "storyground",
    version,
    about = "Story question answering grounded in a derived concept graph",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a story and build its concept graph
    Analyze {
        /// File containing the story text
        #[arg(short, long)]
        story_file: PathBuf,

        /// Existing session to analyze into (a new one is created otherwise)
        #[arg(long)]
        session: Option<String>,
    },

    /// Ask a question about an analyzed story
    Ask {
        /// Session id
        #[arg(long)]
        session: String,

        /// The question
        question: String,
    },

    /// Shortest path between two concepts
    Path {
        /// Session id
        #[arg(long)]
        session: String,

        from: String,
        to: String,
    },

    /// Concepts near a concept
    Neighbors {
        /// Session id
        #[arg(long)]
        session: String,

        concept: String,

        /// Maximum distance
        #[arg(long, default_value = "1")]
        hops: usize,
    },

    /// Relationships of a single concept
    Concept {
        /// Session id
        #[arg(long)]
        session: String,

        concept: String,
    },

    /// Manage sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Check a story for physics violations only
    Physics {
        /// File containing the story text
        #[arg(short, long)]
        story_file: PathBuf,

        /// Print the HTML report instead of plain text
        #[arg(long, default_value = "false")]
        html: bool,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List all sessions
    List,
    /// Show a session's history
    Show { id: String },
    /// Rename a session
    Rename { id: String, name: String },
    /// Delete a session
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());

    // Initialize tracing/logging
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    if let Err(e) = storyground::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics registration failed");
    }

    tracing::debug!("storyground starting");

    match cli.command {
        Commands::Analyze {
            story_file,
            session,
        } => {
            tracing::info!(story_file = %story_file.display(), session = ?session, "Starting analyze command");
            let pipeline = build_pipeline(&config).await?;
            commands::analyze(&pipeline, &story_file, session).await?;
        }

        Commands::Ask { session, question } => {
            let pipeline = build_pipeline(&config).await?;
            commands::ask(&pipeline, &session, &question).await?;
        }

        Commands::Path { session, from, to } => {
            let pipeline = build_pipeline(&config).await?;
            commands::path(&pipeline, &session, &from, &to).await?;
        }

        Commands::Neighbors {
            session,
            concept,
            hops,
        } => {
            let pipeline = build_pipeline(&config).await?;
            commands::neighbors(&pipeline, &session, &concept, hops).await?;
        }

        Commands::Concept { session, concept } => {
            let pipeline = build_pipeline(&config).await?;
            commands::concept(&pipeline, &session, &concept).await?;
        }

        Commands::Sessions { action } => {
            let pipeline = build_pipeline(&config).await?;
            match action {
                SessionAction::List => commands::list_sessions(&pipeline).await?,
                SessionAction::Show { id } => commands::show_session(&pipeline, &id).await?,
                SessionAction::Rename { id, name } => {
                    commands::rename_session(&pipeline, &id, &name).await?
                }
                SessionAction::Delete { id } => commands::delete_session(&pipeline, &id).await?,
            }
        }

        Commands::Physics { story_file, html } => {
            commands::physics(&story_file, html).await?;
        }
    }

    if let Ok(text) = storyground::metrics::gather_metrics() {
        tracing::debug!(metrics = %text, "Pipeline metrics");
    }

    Ok(())
}

async fn build_pipeline(config: &Config) -> Result<StoryPipeline> {
    StoryPipeline::from_config(config)
        .await
        .context("Failed to set up the pipeline")
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("storyground=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("storyground={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
