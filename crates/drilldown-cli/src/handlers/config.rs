//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde_json::json;
use std::path::Path;

/// Handle the config command
///
/// `explicit` is the `--config` path, if one was given.
pub fn handle_config(
    args: ConfigArgs,
    config: &Config,
    explicit: Option<&Path>,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Path => handle_config_path(explicit, output),
    }
}

fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?,
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    tracing::info!(path = %path.display(), "Wrote default configuration");
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to add registry overrides or change output defaults.")
}

fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let content = match args.format {
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    output.writeln(content.trim_end())
}

fn handle_config_path(explicit: Option<&Path>, output: &mut OutputWriter) -> Result<()> {
    let loaded = Config::resolve_path(explicit);
    let search = Config::default_config_paths();

    if output.format() != OutputFormat::Human {
        return output.data(&json!({
            "loaded": loaded.as_ref().map(|p| p.display().to_string()),
            "search_paths": search.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        }));
    }

    match &loaded {
        Some(path) => output.writeln(&format!("Loaded from: {}", path.display()))?,
        None => output.writeln("No configuration file found; using defaults")?,
    }

    output.section("Search Order")?;
    for path in &search {
        let marker = if path.exists() { "✓" } else { "✗" };
        output.writeln(&format!("{} {}", marker, path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConfigInitArgs;
    use tempfile::TempDir;

    fn writer() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    #[test]
    fn test_init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let init = |force| ConfigArgs {
            action: ConfigAction::Init(ConfigInitArgs {
                path: Some(path.clone()),
                force,
            }),
        };

        handle_config(init(false), &Config::default(), None, &mut writer()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());

        std::fs::write(&path, "default_now: 5\n").unwrap();
        handle_config(init(false), &Config::default(), None, &mut writer()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().default_now, Some(5));

        handle_config(init(true), &Config::default(), None, &mut writer()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().default_now, None);
    }

    #[test]
    fn test_show_every_format() {
        for format in [ConfigFormat::Toml, ConfigFormat::Json, ConfigFormat::Yaml] {
            let args = ConfigArgs {
                action: ConfigAction::Show(ConfigShowArgs { format }),
            };
            handle_config(args, &Config::default(), None, &mut writer()).unwrap();
        }
    }

    #[test]
    fn test_path_prefers_explicit_file() {
        let explicit = Path::new("/etc/drilldown/custom.yaml");
        assert_eq!(Config::resolve_path(Some(explicit)), Some(explicit.to_path_buf()));

        let args = ConfigArgs {
            action: ConfigAction::Path,
        };
        handle_config(args, &Config::default(), Some(explicit), &mut writer()).unwrap();
    }
}
