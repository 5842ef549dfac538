//! Small graph builder shared by the unit tests.

use std::collections::HashMap;

use crate::model::{
    graph::{DependencyGraph, NodeIndex},
    module::{DependencyDeclaration, ModuleIdentifier, ModuleSelector, NodeId, ResolveFailure},
};

pub struct GraphFixture {
    pub graph: DependencyGraph,
    root: NodeIndex,
    names: HashMap<String, NodeIndex>,
}

impl GraphFixture {
    pub fn new(root: &str) -> Self {
        let mut graph = DependencyGraph::new();
        let index = graph.add_node(id(root)).unwrap();
        GraphFixture {
            graph,
            root: index,
            names: HashMap::from([(root.to_string(), index)]),
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.names.get(name) {
            return *index;
        }
        let index = self.graph.add_node(id(name)).unwrap();
        self.names.insert(name.to_string(), index);
        index
    }

    /// Root edges are declared under the target's name.
    pub fn edge(&mut self, from: &str, to: &str) -> &mut Self {
        let source = self.node(from);
        let target = self.node(to);
        let declaration = (source == self.root).then(|| DependencyDeclaration::new(to));
        self.graph
            .add_edge(source, target, selector(to), declaration)
            .unwrap();
        self
    }

    pub fn failed(&mut self, from: &str, requested: &str, message: &str) -> &mut Self {
        let source = self.node(from);
        let declaration = (source == self.root).then(|| DependencyDeclaration::new(requested));
        self.graph
            .add_failed_edge(
                source,
                requested.parse().unwrap(),
                ResolveFailure::new(message),
                declaration,
            )
            .unwrap();
        self
    }
}

pub fn module(name: &str) -> ModuleIdentifier {
    ModuleIdentifier::new("test", name, "1.0")
}

pub fn id(name: &str) -> NodeId {
    NodeId::new(module(name), "default")
}

pub fn selector(name: &str) -> ModuleSelector {
    ModuleSelector::new("test", name, "1.0")
}

pub fn path(names: &[&str]) -> Vec<ModuleIdentifier> {
    names.iter().map(|name| module(name)).collect()
}
