use std::path::Path;

use indexmap::IndexMap;
use log::{debug, error};
use serde::Deserialize;

use crate::model::{
    graph::{DependencyGraph, NodeIndex},
    module::{DependencyDeclaration, ModuleIdentifier, ModuleSelector, NodeId, ResolveFailure},
    ParseError,
};

const DEFAULT_CONFIGURATION: &str = "default";

/// A resolved graph loaded from a TOML file, with its designated root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDescriptor {
    pub graph: DependencyGraph,
    pub root: NodeIndex,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGraph {
    root: String,
    #[serde(default)]
    nodes: IndexMap<String, RawNode>,
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    module: ModuleIdentifier,
    configuration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEdge {
    from: String,
    to: Option<String>,
    requested: ModuleSelector,
    failure: Option<String>,
    declaration: Option<DependencyDeclaration>,
}

impl GraphDescriptor {
    pub fn from_file(path: &Path) -> Result<GraphDescriptor, ParseError> {
        debug!("Attempting to read graph descriptor from {}", path.display());
        let contents = std::fs::read_to_string(path)?;

        let descriptor = GraphDescriptor::from_toml_str(&contents);
        if let Err(err) = &descriptor {
            error!("Could not build a valid graph from {}: {err}", path.display())
        }
        descriptor
    }

    pub fn from_toml_str(data: &str) -> Result<GraphDescriptor, ParseError> {
        let raw = toml::from_str::<RawGraph>(data)?;

        let mut graph = DependencyGraph::new();
        let mut handles = IndexMap::with_capacity(raw.nodes.len());
        for (handle, node) in raw.nodes {
            let configuration = node
                .configuration
                .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string());
            let index = graph.add_node(NodeId::new(node.module, configuration))?;
            handles.insert(handle, index);
        }

        let lookup = |handle: &str| {
            handles
                .get(handle)
                .copied()
                .ok_or_else(|| ParseError::UnknownNode(handle.to_string()))
        };

        for edge in raw.edges {
            let source = lookup(&edge.from)?;
            match (edge.to, edge.failure) {
                (Some(to), None) => {
                    graph.add_edge(source, lookup(&to)?, edge.requested, edge.declaration)?;
                }
                (None, Some(failure)) => {
                    graph.add_failed_edge(
                        source,
                        edge.requested,
                        ResolveFailure::new(failure),
                        edge.declaration,
                    )?;
                }
                _ => return Err(ParseError::InvalidEdge(edge.from)),
            }
        }

        let root = handles
            .get(&raw.root)
            .copied()
            .ok_or(ParseError::UnknownRoot(raw.root))?;

        Ok(GraphDescriptor { graph, root })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_valid_graph() {
        let str = r#"
            root = "app"
            [nodes.app]
                module = "g:app:1.0"
                configuration = "runtime"
            [nodes.lib]
                module = "g:lib:1.1"
            [[edges]]
                from = "app"
                to = "lib"
                requested = "g:lib:1.+"
                declaration = "lib"
            [[edges]]
                from = "lib"
                requested = "g:gone:2.0"
                failure = "not found"
        "#;
        let descriptor = GraphDescriptor::from_toml_str(str).unwrap();
        let graph = &descriptor.graph;

        let root = graph.node(descriptor.root).unwrap();
        assert_eq!(
            root.id(),
            &NodeId::new(ModuleIdentifier::new("g", "app", "1.0"), "runtime")
        );
        let lib = graph
            .find(&NodeId::new(
                ModuleIdentifier::new("g", "lib", "1.1"),
                DEFAULT_CONFIGURATION,
            ))
            .unwrap();
        let edge = graph.incoming_edges(lib).next().unwrap();
        assert_eq!(edge.source(), descriptor.root);
        assert_eq!(edge.requested(), &ModuleSelector::new("g", "lib", "1.+"));
        assert_eq!(edge.declaration(), Some(&DependencyDeclaration::new("lib")));

        let failed = graph.outgoing_edges(lib).next().unwrap();
        assert_eq!(failed.target(), None);
        assert_eq!(failed.failure(), Some(&ResolveFailure::new("not found")));
    }

    #[test]
    fn load_fixture() {
        let path = project_root::get_project_root()
            .unwrap()
            .join(Path::new("resources/diamond.toml"));
        let descriptor = GraphDescriptor::from_file(&path).unwrap();
        assert_eq!(descriptor.graph.node_count(), 4);
        assert_eq!(descriptor.graph.edge_count(), 6);
    }

    #[test]
    fn reject_unknown_node() {
        let str = r#"
            root = "app"
            [nodes.app]
                module = "g:app:1.0"
            [[edges]]
                from = "app"
                to = "nowhere"
                requested = "g:nowhere:1.0"
        "#;
        let error = GraphDescriptor::from_toml_str(str).unwrap_err();
        assert!(matches!(error, ParseError::UnknownNode(node) if node == "nowhere"));
    }

    #[test]
    fn reject_unknown_root() {
        let str = r#"
            root = "missing"
            [nodes.app]
                module = "g:app:1.0"
        "#;
        let error = GraphDescriptor::from_toml_str(str).unwrap_err();
        assert!(matches!(error, ParseError::UnknownRoot(root) if root == "missing"));
    }

    #[test]
    fn reject_edge_with_target_and_failure() {
        let str = r#"
            root = "app"
            [nodes.app]
                module = "g:app:1.0"
            [nodes.lib]
                module = "g:lib:1.0"
            [[edges]]
                from = "app"
                to = "lib"
                requested = "g:lib:1.0"
                failure = "not found"
        "#;
        let error = GraphDescriptor::from_toml_str(str).unwrap_err();
        assert!(matches!(error, ParseError::InvalidEdge(from) if from == "app"));
    }

    #[test]
    fn reject_bad_module_identifier() {
        let str = r#"
            root = "app"
            [nodes.app]
                module = "no-version-here"
        "#;
        assert!(matches!(
            GraphDescriptor::from_toml_str(str),
            Err(ParseError::Toml(_))
        ));
    }

    #[test]
    fn reject_duplicate_node_ids() {
        let str = r#"
            root = "a"
            [nodes.a]
                module = "g:app:1.0"
            [nodes.b]
                module = "g:app:1.0"
        "#;
        assert!(matches!(
            GraphDescriptor::from_toml_str(str),
            Err(ParseError::Graph(_))
        ));
    }
}
