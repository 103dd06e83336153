use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "libros")]
#[command(about = "Runs the libros book service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".libros")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    database: String,
    port: u16,
    #[serde(default = "default_mount_path")]
    mount_path: String,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_mount_path() -> String {
    "/api/books".to_string()
}

fn default_sync_interval() -> u64 {
    60
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_mount_path(&self) -> &str {
        &self.mount_path
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        if !config.app.mount_path.starts_with('/') {
            anyhow::bail!("app.mount_path must start with '/': {}", config.app.mount_path);
        }
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_yaml("app:\n  database: libros.db\n  port: 3000\n").unwrap();
        assert_eq!(cfg.app.get_db(), "libros.db");
        assert_eq!(cfg.app.get_port(), 3000);
        assert_eq!(cfg.app.get_mount_path(), "/api/books");
        assert_eq!(cfg.app.sync_interval_seconds, 60);
        assert!(cfg.app.turso_url.is_none());
    }

    #[test]
    fn test_default_value_substitution() {
        let yaml = "app:\n  database: ${LIBROS_TEST_UNSET_DB:-fallback.db}\n  port: ${LIBROS_TEST_UNSET_PORT:-8080}\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.app.get_db(), "fallback.db");
        assert_eq!(cfg.app.get_port(), 8080);
    }

    #[test]
    fn test_substitutes_set_variables() {
        let path = env::var("PATH").unwrap_or_default();
        let out = Config::substitute_env_vars("x: ${PATH}").unwrap();
        assert_eq!(out, format!("x: {}", path));
    }

    #[test]
    fn test_missing_variable_becomes_empty() {
        let out = Config::substitute_env_vars("a: '${LIBROS_TEST_DEFINITELY_UNSET}' b").unwrap();
        assert_eq!(out, "a: '' b");
    }

    #[test]
    fn test_mount_path_must_be_absolute() {
        let yaml = "app:\n  database: x.db\n  port: 1\n  mount_path: books\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}
