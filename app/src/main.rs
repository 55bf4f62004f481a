// In app/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine::{QueueConsumer, TradeEngine};
use serde_json::json;
use std::sync::Arc;
use task_queue::{ALERT_QUEUE, TRADE_UPDATE_QUEUE, Task};
use uuid::Uuid;
use web_server::AppState;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "An alert-driven trade execution service.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the HTTP API and the queue consumer together.
    Serve,

    /// Runs only the queue consumer (for a dedicated worker process).
    Worker,

    /// Queues a single alert for processing.
    ProcessAlert {
        /// The alert id to process.
        #[arg(short, long)]
        id: Uuid,
    },

    /// Queues a single trade for broker-status reconciliation.
    UpdateTrade {
        /// The trade id to reconcile.
        #[arg(short, long)]
        id: Uuid,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let settings = app_config::load_settings().context("Failed to load configuration")?;

    // The configured level applies everywhere except sqlx's per-query logs,
    // which drown everything else out at debug.
    let filter = tracing_subscriber::EnvFilter::try_new(format!(
        "{},sqlx::query=warn",
        settings.app.log_level
    ))
    .context("Invalid log_level in configuration")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    tracing::info!(environment = %settings.app.environment, "Starting trade engine application");

    let db = database::connect(&settings.database)
        .await
        .context("Failed to connect to the database")?;
    let queue = task_queue::connect(&settings.redis)
        .await
        .context("Failed to connect to Redis")?;
    let engine = Arc::new(TradeEngine::new(db.clone(), &settings));

    match cli.command {
        Commands::Serve => {
            let consumer = QueueConsumer::new(
                engine.clone(),
                queue.clone(),
                settings.engine.queue_poll_secs,
            );
            tokio::spawn(consumer.run());

            let state = AppState { db, queue, engine };
            web_server::run(settings.server, state).await?;
        }
        Commands::Worker => {
            let consumer =
                QueueConsumer::new(engine, queue, settings.engine.queue_poll_secs);
            consumer.run().await;
        }
        Commands::ProcessAlert { id } => {
            let task = Task::new(json!({ "alert_id": id.to_string() }), 1);
            queue.enqueue(ALERT_QUEUE, &task).await?;
            tracing::info!(alert_id = %id, "Alert queued for processing");
        }
        Commands::UpdateTrade { id } => {
            let task = Task::new(json!({ "trade_id": id.to_string() }), 1);
            queue.enqueue(TRADE_UPDATE_QUEUE, &task).await?;
            tracing::info!(trade_id = %id, "Trade queued for reconciliation");
        }
    }

    tracing::info!("Trade engine application has finished successfully.");

    Ok(())
}
