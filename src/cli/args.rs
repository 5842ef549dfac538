use std::path::PathBuf;

use clap::Parser;

/// Materializes a resolved dependency graph and reports unresolved dependencies.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Project root directory. All other paths are relative to it.
    #[clap(short, long, default_value = ".")]
    pub root: PathBuf,
    /// Optional TOML configuration file.
    #[clap(short, long, env = "RESOLVEGRAPH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// Materializes the graph descriptor and writes the resolution result as TOML
    Materialize {
        /// Graph descriptor file
        #[clap(default_value = "graph.toml")]
        graph: PathBuf,
        /// Write the result to this file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// Maximum number of diagnostic paths reported per unresolved dependency
        #[clap(long)]
        max_paths: Option<usize>,
    },
}
