use std::{collections::HashMap, fmt::Display};

use thiserror::Error;

use super::module::{DependencyDeclaration, ModuleSelector, NodeId, ResolveFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct NodeIndex(usize);

impl Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct EdgeIndex(usize);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node {0} does not exist in the graph")]
    UnknownNode(NodeIndex),
    #[error("Node {0} was already added to the graph")]
    DuplicateNode(NodeId),
}

/// A resolved module configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    outgoing: Vec<EdgeIndex>,
    incoming: Vec<EdgeIndex>,
}

impl Node {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Dependencies declared by this node, in declaration order.
    pub fn outgoing(&self) -> &[EdgeIndex] {
        &self.outgoing
    }

    /// Resolved edges that selected this node.
    pub fn incoming(&self) -> &[EdgeIndex] {
        &self.incoming
    }
}

/// A dependency requirement. Exactly one of `target` and `failure` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    source: NodeIndex,
    target: Option<NodeIndex>,
    requested: ModuleSelector,
    failure: Option<ResolveFailure>,
    declaration: Option<DependencyDeclaration>,
}

impl Edge {
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    pub fn target(&self) -> Option<NodeIndex> {
        self.target
    }

    pub fn requested(&self) -> &ModuleSelector {
        &self.requested
    }

    pub fn failure(&self) -> Option<&ResolveFailure> {
        self.failure.as_ref()
    }

    /// Only populated for edges leaving the root.
    pub fn declaration(&self) -> Option<&DependencyDeclaration> {
        self.declaration.as_ref()
    }
}

/// An arena of nodes and edges produced by the conflict resolution engine.
///
/// The graph only grows; once handed to a materializer it is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    ids: HashMap<NodeId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId) -> Result<NodeIndex, GraphError> {
        if self.ids.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let index = NodeIndex(self.nodes.len());
        self.ids.insert(id.clone(), index);
        self.nodes.push(Node {
            id,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        });
        Ok(index)
    }

    /// Adds an edge that resolved `requested` to `target`.
    pub fn add_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        requested: ModuleSelector,
        declaration: Option<DependencyDeclaration>,
    ) -> Result<EdgeIndex, GraphError> {
        self.check(source)?;
        self.check(target)?;
        let index = self.push_edge(Edge {
            source,
            target: Some(target),
            requested,
            failure: None,
            declaration,
        });
        self.nodes[target.0].incoming.push(index);
        Ok(index)
    }

    /// Adds an edge whose `requested` module could not be resolved.
    pub fn add_failed_edge(
        &mut self,
        source: NodeIndex,
        requested: ModuleSelector,
        failure: ResolveFailure,
        declaration: Option<DependencyDeclaration>,
    ) -> Result<EdgeIndex, GraphError> {
        self.check(source)?;
        Ok(self.push_edge(Edge {
            source,
            target: None,
            requested,
            failure: Some(failure),
            declaration,
        }))
    }

    fn push_edge(&mut self, edge: Edge) -> EdgeIndex {
        let index = EdgeIndex(self.edges.len());
        self.nodes[edge.source.0].outgoing.push(index);
        self.edges.push(edge);
        index
    }

    fn check(&self, node: NodeIndex) -> Result<(), GraphError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(node))
        }
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    pub fn find(&self, id: &NodeId) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn outgoing_edges(&self, node: NodeIndex) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacent(node, Node::outgoing)
    }

    pub fn incoming_edges(&self, node: NodeIndex) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacent(node, Node::incoming)
    }

    fn adjacent(
        &self,
        node: NodeIndex,
        select: fn(&Node) -> &[EdgeIndex],
    ) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes
            .get(node.0)
            .map(select)
            .unwrap_or_default()
            .iter()
            .map(move |edge| &self.edges[edge.0])
    }
}
