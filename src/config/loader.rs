//! Layered configuration loading
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. `/etc/makemcp/config.toml`
//! 3. `$XDG_CONFIG_HOME/makemcp/config.toml`
//! 4. `~/.makemcp.toml`
//! 5. `./.makemcp.toml`
//! 6. the file passed with `--config`
//! 7. `MAKEMCP_*` environment variables (`__` separates tables)

use std::path::PathBuf;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::model::Config;

const APP_NAME: &str = "makemcp";

/// `MAKEMCP_MAKE__TIMEOUT=30` sets `make.timeout`
const ENV_PREFIX: &str = "MAKEMCP_";

/// A resolved configuration and the files merged into it
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Lowest priority first
    pub sources: Vec<PathBuf>,
}

/// Candidate config file locations, lowest priority first
pub fn config_paths() -> Vec<PathBuf> {
    let dotfile = format!(".{}.toml", APP_NAME);
    let system = PathBuf::from("/etc").join(APP_NAME).join("config.toml");
    let xdg = dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"));
    let home = dirs::home_dir().map(|dir| dir.join(&dotfile));

    std::iter::once(system)
        .chain(xdg)
        .chain(home)
        .chain(std::iter::once(PathBuf::from(dotfile)))
        .collect()
}

/// Config files that exist and will be merged, lowest priority first
///
/// A missing `override_path` is logged and skipped.
pub fn config_sources(override_path: Option<&str>) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = config_paths().into_iter().filter(|p| p.is_file()).collect();

    if let Some(path) = override_path.map(PathBuf::from) {
        if path.is_file() {
            sources.push(path);
        } else {
            tracing::warn!(path = %path.display(), "config file not found; ignoring");
        }
    }

    sources
}

/// Load the merged configuration
pub fn load_config(override_path: Option<&str>) -> Result<Config> {
    load_config_with_sources(override_path).map(|loaded| loaded.config)
}

/// Load the merged configuration and report which files contributed
pub fn load_config_with_sources(override_path: Option<&str>) -> Result<LoadedConfig> {
    let sources = config_sources(override_path);

    let figment = sources
        .iter()
        .fold(
            Figment::from(Serialized::defaults(Config::default())),
            |figment, path| {
                tracing::debug!(path = %path.display(), "merging config file");
                figment.merge(Toml::file(path))
            },
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config = figment.extract().context("Failed to load configuration")?;

    Ok(LoadedConfig { config, sources })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_paths_order() {
        let paths = config_paths();

        assert!(paths.len() >= 2);
        assert_eq!(paths[0], PathBuf::from("/etc/makemcp/config.toml"));
        assert_eq!(paths.last().unwrap(), &PathBuf::from(".makemcp.toml"));
    }

    #[test]
    fn test_load_config_from_override() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("test-config.toml");

        fs::write(
            &config_path,
            r#"
            [make]
            timeout = 42
            max_concurrency = 7
            help_target = "usage"
            "#,
        )
        .unwrap();

        let loaded = load_config_with_sources(Some(config_path.to_str().unwrap())).unwrap();

        assert_eq!(loaded.config.make.timeout, 42);
        assert_eq!(loaded.config.make.max_concurrency, 7);
        assert_eq!(loaded.config.make.help_target, "usage");
        assert_eq!(loaded.sources.last(), Some(&config_path));
    }

    #[test]
    fn test_load_config_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("bad.toml");
        fs::write(&config_path, "[make]\ntimeout = \"soon\"\n").unwrap();

        assert!(load_config(Some(config_path.to_str().unwrap())).is_err());
    }

    #[test]
    fn test_env_override() {
        // Only this test touches server.name
        std::env::set_var("MAKEMCP_SERVER__NAME", "env-make");
        let config = load_config(None);
        std::env::remove_var("MAKEMCP_SERVER__NAME");

        assert_eq!(config.unwrap().server.name, "env-make");
    }

    #[test]
    fn test_missing_override_is_not_a_source() {
        let sources = config_sources(Some("/nonexistent/config.toml"));
        assert!(!sources.contains(&PathBuf::from("/nonexistent/config.toml")));

        assert!(load_config(Some("/nonexistent/config.toml")).is_ok());
    }

    #[test]
    fn test_directory_is_not_a_source() {
        let dir = TempDir::new().unwrap();
        let sources = config_sources(dir.path().to_str());
        assert!(!sources.contains(&dir.path().to_path_buf()));
    }
}
