use std::{
    error::Error,
    path::{Path, PathBuf},
};

use crate::{
    cli::command_handlers::{do_materialize, do_report},
    config::MaterializeConfig,
    result::ResolutionResult,
};

mod builder;

pub use builder::ResolvegraphBuilder;

pub struct Resolvegraph {
    root: PathBuf,
    graph_file_name: PathBuf,
    config: MaterializeConfig,
}

impl Resolvegraph {
    pub fn builder() -> ResolvegraphBuilder {
        ResolvegraphBuilder::default()
    }

    pub fn config(&self) -> &MaterializeConfig {
        &self.config
    }

    /// Loads the graph descriptor and materializes it into a resolution result
    pub fn materialize(&self) -> Result<ResolutionResult, Box<dyn Error>> {
        do_materialize(&self.root, &self.graph_file_name, self.config)
    }

    /// Materializes the graph and writes the result as TOML.
    /// Without an output file the TOML is returned instead.
    pub fn report(&self, output: Option<&Path>) -> Result<Option<String>, Box<dyn Error>> {
        let result = self.materialize()?;
        do_report(&result, &self.root, output)
    }
}
