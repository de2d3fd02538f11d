use clap::Parser;
use inquire::{error::InquireError, Text};
use tracing_subscriber::EnvFilter;

mod app;
mod catalog;
mod cli;
mod config;
mod embeddings;
mod render;
mod search;
#[cfg(test)]
mod tests;
mod web;

use app::App;
use config::Config;
use search::QueryResult;

const PROMPT: &str = "Search for dresses, tops, or t-shirts:";

fn print_result(result: &QueryResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", render::render_result(result));
    }
    Ok(())
}

/// Prompt for queries until an empty line, Ctrl+C or Esc.
fn interactive(app: &App, json: bool) -> anyhow::Result<()> {
    loop {
        let query = match Text::new(PROMPT).prompt() {
            Ok(query) => query,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(())
            }
            Err(err) => return Err(err.into()),
        };

        if query.trim().is_empty() {
            return Ok(());
        }

        let result = app.handle_search(&query)?;
        print_result(&result, json)?;
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    let config = Config::load()?;
    let app = App::from_config(&config)?;

    match args.command {
        cli::Command::Search { query, json } => match query {
            Some(query) => {
                let result = app.handle_search(&query)?;
                print_result(&result, json)
            }
            None => interactive(&app, json),
        },

        cli::Command::Load {} => {
            let catalog = app.catalog()?;
            println!(
                "{} products loaded from {} ({} dimensions)",
                catalog.len(),
                config.catalog_path.display(),
                catalog.dimensions()
            );
            Ok(())
        }

        cli::Command::Daemon { listen } => web::start_daemon(app, &listen),
    }
}
