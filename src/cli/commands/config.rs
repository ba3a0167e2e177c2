use crate::config::Config;
use crate::config::migrate::{check_config_file, migrate_config_file};
use crate::core::tariff::{ConfigTariff, TariffPolicy};
use crate::errors::{AppError, AppResult};
use crate::models::cause::SanctionCause;
use crate::ui::messages::{error, info, success, warning};

use crate::cli::parser::Commands;
use std::path::Path;
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config, path: &Path) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        migrate,
        edit_config,
        editor,
    } = cmd
    {
        // ---- PRINT CONFIG ----
        if *print_config {
            println!("📄 Current configuration:\n");
            let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
            println!("{}", yaml);

            let tariff = ConfigTariff::from_config(cfg);
            for cause in SanctionCause::ALL {
                match tariff.amount_for(cause) {
                    Ok(amount) => info(format!("{:<12} {}", cause, amount)),
                    Err(e) => warning(format!("{:<12} {}", cause, e)),
                }
            }
        }

        // ---- CHECK CONFIG ----
        if *check {
            if !path.exists() {
                warning(format!(
                    "No configuration file at {} (defaults in use)",
                    path.display()
                ));
            } else {
                let problems = check_config_file(path)?;
                if problems.is_empty() {
                    success("Configuration file is complete.");
                } else {
                    for p in &problems {
                        warning(p);
                    }
                }
            }
        }

        // ---- MIGRATE CONFIG ----
        if *migrate {
            if path.exists() {
                if !migrate_config_file(path)? {
                    info("Configuration already up to date.");
                }
            } else {
                warning("No configuration file to migrate; run `init` first.");
            }
        }

        // ---- EDIT CONFIG ----
        if *edit_config {
            let default_editor = std::env::var("EDITOR")
                .or_else(|_| std::env::var("VISUAL"))
                .unwrap_or_else(|_| {
                    if cfg!(target_os = "windows") {
                        "notepad".to_string()
                    } else {
                        "nano".to_string()
                    }
                });

            // Se l’utente ha passato --editor, usiamo quello
            let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

            let edited = run_editor(&editor_to_use, path)
                || (editor_to_use != default_editor && {
                    warning(format!(
                        "Editor '{}' not available, falling back to '{}'",
                        editor_to_use, default_editor
                    ));
                    run_editor(&default_editor, path)
                });

            if edited {
                success("Configuration file edited successfully");
            } else {
                error("Failed to edit configuration file");
            }
        }
    }

    Ok(())
}

fn run_editor(editor: &str, path: &Path) -> bool {
    Command::new(editor)
        .arg(path)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
