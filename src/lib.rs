//! rsanctions library root.
//! Exposes the CLI parser, the high-level run() function and the
//! reconciliation engine (window evaluation, sanction ledger, job, lock).

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => {
            let path = cli
                .config_file
                .as_deref()
                .map(utils::path::expand_tilde)
                .unwrap_or_else(Config::config_file);
            cli::commands::config::handle(&cli.command, cfg, &path)
        }
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Run { .. } => cli::commands::run::handle(&cli.command, cfg),
        Commands::Schedule { .. } => cli::commands::schedule::handle(&cli.command, cfg),
        Commands::Sanctions { .. } => cli::commands::sanctions::handle(&cli.command, cfg),
        Commands::Events { .. } => cli::commands::events::handle(&cli.command, cfg),
    }
}

/// Entry point usato da main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    // 2️⃣ carica config UNA sola volta
    let mut cfg = match &cli.config_file {
        Some(path) => Config::load_from(&utils::path::expand_tilde(path))?,
        None => Config::load()?,
    };

    // 3️⃣ applica eventuale override del DB da riga di comando
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    // 4️⃣ passa tutto al dispatcher
    dispatch(&cli, &cfg)
}
