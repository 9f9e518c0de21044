use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context};
use clap::Parser;
use homedir::my_home;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod history;
mod knowledge;
mod lock;
mod semantic;
mod storage;
#[cfg(test)]
mod tests;
mod web;

use config::Config;
use history::{ChatHistory, HistoryLog};
use semantic::RetrievalEngine;
use web::AskResponse;

/// `QABOT_BASE_PATH`, or `~/.local/share/qabot`.
fn base_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("QABOT_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .map_err(|err| anyhow::anyhow!("Could not determine home directory: {err:?}"))?
        .context("Home directory path is empty")?;
    Ok(home.join(".local").join("share").join("qabot"))
}

fn load_engine(config: &Config) -> anyhow::Result<Arc<RetrievalEngine>> {
    let engine = RetrievalEngine::from_config(&config.retrieval, config.base_path())
        .context("failed to initialize retrieval engine")?;
    Ok(Arc::new(engine))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = cli::Args::parse();

    let base_path = base_path()?;
    let mut config = Config::load_with(&base_path)
        .with_context(|| format!("failed to load config from {}", base_path.display()))?;

    let history: Arc<dyn HistoryLog> =
        Arc::new(ChatHistory::open(&base_path, config.history.max_records)?);

    match args.command {
        cli::Command::Serve { listen } => {
            if let Some(listen) = listen {
                config.server.listen = listen;
            }

            // everything slow happens here, before the listener is bound
            let engine = load_engine(&config)?;
            log::info!(
                "Backend ready with {} entries, threshold {}",
                engine.index().len(),
                engine.threshold()
            );

            web::start_daemon(engine, history, &config)
        }

        cli::Command::Ask {
            question,
            no_history,
        } => {
            let question = question.join(" ");
            if question.trim().is_empty() {
                bail!("Question cannot be empty");
            }

            let engine = load_engine(&config)?;
            let history = if no_history {
                None
            } else {
                Some(history.as_ref())
            };

            match AskResponse::answer(&engine, history, &question) {
                Some(response) => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                    Ok(())
                }
                None => bail!("Question cannot be empty"),
            }
        }

        cli::Command::History { limit } => {
            let limit = limit.unwrap_or(config.history.recent_limit);
            let records = history.recent(limit)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
    }
}
