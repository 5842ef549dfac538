use log::{debug, info, warn};

use crate::{
    config::MaterializeConfig,
    materializer::materialize,
    model::descriptor::GraphDescriptor,
    result::ResolutionResult,
};
use std::{error::Error, path::Path};

/// Handler to materialize command
/// Loads the graph descriptor and projects it into a resolution result
pub fn do_materialize(
    root: &Path,
    graph_file_name: &Path,
    config: MaterializeConfig,
) -> Result<ResolutionResult, Box<dyn Error>> {
    let graph_file_path = root.join(graph_file_name);
    let descriptor = GraphDescriptor::from_file(&graph_file_path)?;
    debug!(
        "Loaded {} nodes and {} edges from {}",
        descriptor.graph.node_count(),
        descriptor.graph.edge_count(),
        graph_file_path.display()
    );

    let result = materialize(&descriptor.graph, descriptor.root, config)?;
    for unresolved in &result.unresolved_dependencies {
        warn!("{}", unresolved);
    }
    Ok(result)
}

/// Writes the result as TOML to `output`, or returns it when there is no output file
pub fn do_report(
    result: &ResolutionResult,
    root: &Path,
    output: Option<&Path>,
) -> Result<Option<String>, Box<dyn Error>> {
    let report = result.to_toml()?;
    match output {
        Some(output) => {
            let output_path = root.join(output);
            std::fs::write(&output_path, report)?;
            info!("Wrote resolution result to {}", output_path.display());
            Ok(None)
        }
        None => Ok(Some(report)),
    }
}
