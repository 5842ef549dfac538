//! Projects a finished dependency graph into a [`ResolutionResult`].
//!
//! Materialization runs in four phases over a single, immutable graph:
//!
//! 1. [`Materializer::start`] records the root.
//! 2. [`Materializer::visit_node`] registers every node and collects the
//!    failures of its outgoing edges.
//! 3. [`Materializer::visit_edge`] attaches every node to each of its parents.
//! 4. [`Materializer::finish`] turns the collected failures into unresolved
//!    dependencies annotated with the paths that required them.
//!
//! [`materialize`] drives all four phases over the nodes reachable from the root.

pub mod failures;
pub mod paths;

use std::collections::{HashSet, VecDeque};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    config::MaterializeConfig,
    model::{
        graph::{DependencyGraph, NodeIndex},
        module::NodeId,
    },
    result::{
        BuildError, ResolutionResult, ResolvedConfigurationBuilder, ResultSink,
        UnresolvedDependency,
    },
};

use self::{failures::FailureAggregator, paths::PathResolver};

/// Misuse of the materialization protocol, or a graph inconsistent with it.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MaterializeError {
    #[error("Materialization has not been started")]
    NotStarted,
    #[error("Materialization was already started with root {0}")]
    AlreadyStarted(NodeId),
    #[error("Node {0} does not exist in the graph")]
    UnknownNode(NodeIndex),
    #[error("Node {0} was visited twice")]
    NodeVisitedTwice(NodeId),
    #[error("Edges of node {0} were visited twice")]
    EdgesVisitedTwice(NodeId),
    #[error("Edges of node {0} were visited before the node itself")]
    NodeNotVisited(NodeId),
    #[error("Node {child} is required by {source_node}, which was never visited")]
    UnvisitedSource { source_node: NodeId, child: NodeId },
    #[error("First level dependency {0} has no declaration")]
    MissingDeclaration(NodeId),
    #[error("Finished with root {actual}, but started with {expected}")]
    RootMismatch { expected: NodeId, actual: NodeId },
    #[error("Invalid resolution result: {0}")]
    Result(#[from] BuildError),
}

/// One materialization of `graph` into `sink`.
///
/// [`Materializer::finish`] consumes the materializer, so nothing can be
/// visited once the result is complete.
pub struct Materializer<'g, S> {
    graph: &'g DependencyGraph,
    sink: S,
    config: MaterializeConfig,
    root: Option<NodeIndex>,
    failures: FailureAggregator,
    visited_nodes: HashSet<NodeIndex>,
    visited_edges: HashSet<NodeIndex>,
}

impl<'g, S: ResultSink> Materializer<'g, S> {
    pub fn new(graph: &'g DependencyGraph, sink: S, config: MaterializeConfig) -> Self {
        Materializer {
            graph,
            sink,
            config,
            root: None,
            failures: FailureAggregator::new(),
            visited_nodes: HashSet::new(),
            visited_edges: HashSet::new(),
        }
    }

    pub fn start(&mut self, root: NodeIndex) -> Result<(), MaterializeError> {
        match self.root {
            None => {
                self.id(root)?;
                self.root = Some(root);
                Ok(())
            }
            Some(started) => Err(MaterializeError::AlreadyStarted(self.id(started)?.clone())),
        }
    }

    pub fn visit_node(&mut self, node: NodeIndex) -> Result<(), MaterializeError> {
        self.root()?;
        let graph = self.graph;
        let id = Self::node_id(graph, node)?;
        if !self.visited_nodes.insert(node) {
            return Err(MaterializeError::NodeVisitedTwice(id.clone()));
        }

        self.sink.register_resolved_node(id);
        for edge in graph.outgoing_edges(node) {
            if let Some(failure) = edge.failure() {
                debug!("{} failed to resolve {}: {}", id, edge.requested(), failure);
                self.failures.register(edge.requested(), failure, node);
            }
        }
        Ok(())
    }

    pub fn visit_edge(&mut self, node: NodeIndex) -> Result<(), MaterializeError> {
        let root = self.root()?;
        let graph = self.graph;
        let child = Self::node_id(graph, node)?;
        if !self.visited_nodes.contains(&node) {
            return Err(MaterializeError::NodeNotVisited(child.clone()));
        }
        if !self.visited_edges.insert(node) {
            return Err(MaterializeError::EdgesVisitedTwice(child.clone()));
        }

        debug!("Attaching {} to its parents", child);
        for edge in graph.incoming_edges(node) {
            let source = edge.source();
            let parent = Self::node_id(graph, source)?;
            if source != root && !self.visited_nodes.contains(&source) {
                return Err(MaterializeError::UnvisitedSource {
                    source_node: parent.clone(),
                    child: child.clone(),
                });
            }

            self.sink.attach_child(parent, child);
            if source == root {
                let declaration = edge
                    .declaration()
                    .ok_or_else(|| MaterializeError::MissingDeclaration(child.clone()))?;
                self.sink.register_first_level_dependency(declaration, child);
            }
        }
        Ok(())
    }

    /// Reports every failure and completes the result. Returns the sink.
    pub fn finish(mut self, root: NodeIndex) -> Result<S, MaterializeError> {
        let started = self.root()?;
        let graph = self.graph;
        let root_id = Self::node_id(graph, root)?;
        if started != root {
            return Err(MaterializeError::RootMismatch {
                expected: Self::node_id(graph, started)?.clone(),
                actual: root_id.clone(),
            });
        }
        let failure_count = self.failures.len();
        if !self.failures.is_empty() {
            let mut resolver = PathResolver::new(graph, root, self.config.max_paths);
            for (selector, broken) in std::mem::take(&mut self.failures).into_failures() {
                let paths = resolver.paths_to_all(broken.required_by.iter().copied());
                if paths.is_truncated() {
                    warn!(
                        "Only the first {} paths requiring {} are reported",
                        paths.len(),
                        selector
                    );
                }
                self.sink.register_unresolved_dependency(UnresolvedDependency {
                    selector,
                    failure: broken.failure,
                    paths_truncated: paths.is_truncated(),
                    paths: paths.into_paths(),
                });
            }
        }

        info!(
            "Materialized {} nodes of {} with {} unresolved dependencies",
            self.visited_nodes.len(),
            root_id,
            failure_count
        );
        self.sink.complete_resolution(root_id);
        Ok(self.sink)
    }

    fn root(&self) -> Result<NodeIndex, MaterializeError> {
        self.root.ok_or(MaterializeError::NotStarted)
    }

    fn id(&self, node: NodeIndex) -> Result<&'g NodeId, MaterializeError> {
        Self::node_id(self.graph, node)
    }

    fn node_id(
        graph: &'g DependencyGraph,
        node: NodeIndex,
    ) -> Result<&'g NodeId, MaterializeError> {
        graph
            .node(node)
            .map(|node| node.id())
            .ok_or(MaterializeError::UnknownNode(node))
    }
}

/// Nodes reachable from `root` through resolved edges, breadth first, each once.
pub fn reachable_nodes(graph: &DependencyGraph, root: NodeIndex) -> Vec<NodeIndex> {
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    let mut order = Vec::new();
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for target in graph.outgoing_edges(node).filter_map(|edge| edge.target()) {
            if seen.insert(target) {
                queue.push_back(target);
            }
        }
    }
    order
}

/// Runs every phase over the nodes reachable from `root`, feeding `sink`.
pub fn materialize_into<S: ResultSink>(
    graph: &DependencyGraph,
    root: NodeIndex,
    config: MaterializeConfig,
    sink: S,
) -> Result<S, MaterializeError> {
    let mut materializer = Materializer::new(graph, sink, config);
    materializer.start(root)?;
    let nodes = reachable_nodes(graph, root);
    for node in &nodes {
        materializer.visit_node(*node)?;
    }
    for node in &nodes {
        materializer.visit_edge(*node)?;
    }
    materializer.finish(root)
}

pub fn materialize(
    graph: &DependencyGraph,
    root: NodeIndex,
    config: MaterializeConfig,
) -> Result<ResolutionResult, MaterializeError> {
    let builder = materialize_into(graph, root, config, ResolvedConfigurationBuilder::new())?;
    Ok(builder.build()?)
}
