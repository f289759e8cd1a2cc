//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
///
/// `config_path` is the `--config` override; the default location is used
/// when it is absent.
pub fn run_config(
    action: &ConfigAction,
    config_path: Option<&PathBuf>,
    settings: Settings,
) -> Result<()> {
    let path = config_path
        .cloned()
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            // Secrets may have been merged in from the environment; never
            // echo them back.
            let mut display = settings;
            display.api.openai_api_key = display.api.openai_key().map(|_| "<set>".to_string());
            display.api.openrouter_api_key =
                display.api.openrouter_key().map(|_| "<set>".to_string());
            display.api.unsplash_access_key =
                display.api.unsplash_key().map(|_| "<set>".to_string());

            let toml_str = toml::to_string_pretty(&display)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let mut root: toml::Value = if path.exists() {
                let content = std::fs::read_to_string(&path)?;
                content
                    .parse::<toml::Value>()
                    .map_err(|e| anyhow::anyhow!("Cannot parse {}: {}", path.display(), e))?
            } else {
                toml::Value::Table(toml::map::Map::new())
            };

            set_key(&mut root, key, parse_value(value))?;

            let serialized = toml::to_string_pretty(&root)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

            // Refuse to write a file the loader would choke on.
            toml::from_str::<Settings>(&serialized)
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, serialized)?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::info(&format!("Config file: {}", path.display()));
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !path.exists() {
                settings.save_to(&path)?;
                Output::info(&format!("Created default config at {:?}", path));
            }

            // Try to open in editor
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor).arg(&path).status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Set a dotted key like `pipeline.max_chars` inside a TOML document,
/// creating intermediate tables as needed.
fn set_key(root: &mut toml::Value, key: &str, new_value: toml::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Empty configuration key"))?;

    let mut current = root;
    for part in parents {
        current = match current {
            toml::Value::Table(table) => table
                .entry((*part).to_string())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new())),
            _ => return Err(anyhow::anyhow!("'{}' is not a table", part)),
        };
    }

    match current {
        toml::Value::Table(table) => {
            table.insert((*last).to_string(), new_value);
            Ok(())
        }
        _ => Err(anyhow::anyhow!("Cannot set '{}': parent is not a table", key)),
    }
}

/// Interpret a CLI value string as the closest TOML type.
fn parse_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}
