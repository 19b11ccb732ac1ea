//! vectormem CLI entry point.
//!
//! Binary name: `vmem`
//!
//! Parses CLI arguments, initializes tracing, loads the configuration,
//! wires the store, then dispatches to the command handler. Ctrl+C cancels
//! the in-flight operation.

mod cli;
mod state;

use clap::Parser;

use vectormem_core::memory::db::{ListOptions, SearchOptions};
use vectormem_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, tag_filters};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        verbosity: cli.verbose,
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(&cli.config).await?;
    state.cancel_on_ctrl_c();

    match cli.command {
        Commands::CreateIndex { name, dimension } => {
            cli::index::create_index(&state, &name, dimension, cli.json).await?;
        }

        Commands::Indexes => {
            cli::index::list_indexes(&state, cli.json).await?;
        }

        Commands::DeleteIndex { name, missing_ok } => {
            cli::index::delete_index(&state, &name, missing_ok, cli.json).await?;
        }

        Commands::Upsert {
            index,
            id,
            text,
            tags,
        } => {
            cli::record::upsert(&state, &index, &id, &text, &tags, cli.json).await?;
        }

        Commands::Search {
            index,
            query,
            limit,
            min_relevance,
            tags,
            with_embeddings,
        } => {
            let options = SearchOptions {
                filters: tag_filters(&tags),
                min_relevance,
                limit,
                with_embeddings,
            };
            cli::record::search(&state, &index, &query, options, cli.json).await?;
        }

        Commands::List {
            index,
            limit,
            tags,
            with_embeddings,
        } => {
            let options = ListOptions {
                filters: tag_filters(&tags),
                limit,
                with_embeddings,
            };
            cli::record::list(&state, &index, options, cli.json).await?;
        }

        Commands::Delete {
            index,
            id,
            missing_ok,
        } => {
            cli::record::delete(&state, &index, &id, missing_ok, cli.json).await?;
        }

        Commands::Demo => {
            cli::demo::run(&state, cli.json).await?;
        }
    }

    Ok(())
}
