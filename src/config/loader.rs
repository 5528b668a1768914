use super::types::{Config, ServiceConfig};

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const CONFIG_ENV_VAR: &str = "GEOJSON_SERVER_CONFIG";

/// Command-line overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub port: Option<u16>,
    pub socket: Option<PathBuf>,
}

impl CliArgs {
    /// Parses `--config <path> --port <n> --socket <path>`; unknown flags are ignored.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value_of(&arg, args.next())?)),
                "--port" => {
                    let value = value_of(&arg, args.next())?;
                    parsed.port = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid --port value {:?}", value))?,
                    );
                }
                "--socket" => parsed.socket = Some(PathBuf::from(value_of(&arg, args.next())?)),
                other => tracing::debug!("Ignoring unknown argument {}", other),
            }
        }

        Ok(parsed)
    }

    /// Config file path: `--config`, then `$GEOJSON_SERVER_CONFIG`, then `config.json`.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

fn value_of(flag: &str, value: Option<String>) -> Result<String> {
    value.with_context(|| format!("{} requires a value", flag))
}

impl Config {
    /// Loads the configuration file, or writes the defaults to it when it does not exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Config::default();
        config
            .save(path)
            .with_context(|| format!("writing default configuration to {}", path.display()))?;
        tracing::info!("Wrote default configuration to {}", path.display());
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn apply_overrides(mut self, args: &CliArgs) -> Self {
        if let Some(port) = args.port {
            self.http.port = port;
        }
        if let Some(socket) = &args.socket {
            self.localsocket.file = socket.clone();
        }
        self
    }

    /// Validates and resolves the service definitions.
    pub fn service_configs(&self) -> Result<Vec<ServiceConfig>> {
        let mut configs = Vec::with_capacity(self.services.len());

        for (name, definition) in &self.services {
            if !definition.radius.is_finite() || definition.radius <= 0.0 {
                bail!(
                    "service {}: radius must be a positive number, got {}",
                    name,
                    definition.radius
                );
            }
            if definition.limit == 0 {
                bail!("service {}: limit must be greater than zero", name);
            }

            configs.push(ServiceConfig {
                name: name.clone(),
                file: definition.file.clone(),
                max_radius: definition.radius,
                max_results: definition.limit,
            });
        }

        Ok(configs)
    }
}
