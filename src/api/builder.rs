use std::{env, error::Error, path::PathBuf};

use crate::{config::MaterializeConfig, Resolvegraph};

#[derive(Default)]
pub struct ResolvegraphBuilder {
    // All other paths are relative to `root`
    root: Option<PathBuf>,
    graph_file_name: Option<PathBuf>,
    config_file_path: Option<PathBuf>,
    max_paths: Option<usize>,
}

impl ResolvegraphBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Name of the graph descriptor toml file.
    ///
    /// Defaults to `graph.toml`.
    pub fn graph_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph_file_name = Some(path.into());
        self
    }

    /// Location of a resolvegraph configuration file.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Maximum number of diagnostic paths per unresolved dependency.
    /// It will override the configured `paths.max`.
    pub fn max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = Some(max_paths);
        self
    }

    pub fn try_build(self) -> Result<Resolvegraph, Box<dyn Error>> {
        let Self {
            root,
            graph_file_name,
            config_file_path,
            max_paths,
        } = self;
        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let graph_file_name = graph_file_name.unwrap_or_else(|| PathBuf::from("graph.toml"));

        let config_file_path = config_file_path.map(|path| root.join(path));
        let mut config = MaterializeConfig::load(config_file_path.as_deref())?;
        if let Some(max_paths) = max_paths {
            if max_paths == 0 {
                return Err("max paths must be at least 1".into());
            }
            config.max_paths = max_paths;
        }

        Ok(Resolvegraph {
            root,
            graph_file_name,
            config,
        })
    }
}
