use std::{collections::HashMap, path::Path};

use anyhow::bail;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_MAX_PATHS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeConfig {
    /// Upper bound on the diagnostic paths reported for one unresolved dependency.
    pub max_paths: usize,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        MaterializeConfig {
            max_paths: DEFAULT_MAX_PATHS,
        }
    }
}

impl MaterializeConfig {
    /// Reads the optional config file, then `RESOLVEGRAPH_*` environment variables.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        Self::from_raw(RawConfig::load(file, None)?)
    }

    fn from_raw(raw_config: RawConfig) -> anyhow::Result<Self> {
        let max_paths = raw_config.paths.max.unwrap_or(DEFAULT_MAX_PATHS);
        if max_paths == 0 {
            bail!("paths.max must be at least 1");
        }
        Ok(Self { max_paths })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    paths: PathsConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct PathsConfig {
    max: Option<usize>,
}

impl RawConfig {
    fn load(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).format(FileFormat::Toml));
        }
        builder
            .add_source(
                Environment::with_prefix("RESOLVEGRAPH")
                    .separator("_")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
