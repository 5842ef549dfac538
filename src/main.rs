use std::error::Error;

use clap::Parser;

use resolvegraph::{
    cli::args::{CliArgs, Command},
    Resolvegraph,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = CliArgs::parse();

    match cli_args.cmd {
        Command::Materialize {
            graph,
            output,
            max_paths,
        } => {
            let mut builder = Resolvegraph::builder()
                .root(cli_args.root)
                .graph_file_name(graph);
            if let Some(config) = cli_args.config {
                builder = builder.config_file(config);
            }
            if let Some(max_paths) = max_paths {
                builder = builder.max_paths(max_paths);
            }
            let resolvegraph = builder.try_build()?;

            if let Some(report) = resolvegraph.report(output.as_deref())? {
                print!("{}", report);
            }
            Ok(())
        }
    }
}
