use std::fmt::Display;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use thiserror::Error;

use crate::{
    materializer::paths::DiagnosticPath,
    model::module::{DependencyDeclaration, ModuleSelector, NodeId, ResolveFailure},
};

/// Receives the materialized graph, one fact at a time.
pub trait ResultSink {
    fn register_resolved_node(&mut self, node: &NodeId);

    /// May be called with the same child for several parents.
    fn attach_child(&mut self, parent: &NodeId, child: &NodeId);

    fn register_first_level_dependency(
        &mut self,
        declaration: &DependencyDeclaration,
        child: &NodeId,
    );

    fn register_unresolved_dependency(&mut self, unresolved: UnresolvedDependency);

    /// Called exactly once, after every other call.
    fn complete_resolution(&mut self, root: &NodeId);
}

/// One requested module that could not be resolved, with every chain that required it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDependency {
    pub selector: ModuleSelector,
    pub failure: ResolveFailure,
    pub paths: Vec<DiagnosticPath>,
    pub paths_truncated: bool,
}

impl Display for UnresolvedDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Could not resolve {}: {}", self.selector, self.failure)?;
        if self.paths.is_empty() {
            return Ok(());
        }
        f.write_str("\nRequired by:")?;
        for path in &self.paths {
            f.write_str("\n    ")?;
            for (i, module) in path.iter().enumerate() {
                if i > 0 {
                    f.write_str(" > ")?;
                }
                write!(f, "{}", module)?;
            }
        }
        if self.paths_truncated {
            f.write_str("\n    ... further paths omitted")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub id: NodeId,
    pub parents: Vec<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstLevelDependency {
    pub declaration: DependencyDeclaration,
    pub id: NodeId,
}

/// The materialized graph: a tree with shared subtrees plus the failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub root: NodeId,
    pub dependencies: Vec<ResolvedDependency>,
    pub first_level_dependencies: Vec<FirstLevelDependency>,
    pub unresolved_dependencies: Vec<UnresolvedDependency>,
}

impl ResolutionResult {
    pub fn dependency(&self, id: &NodeId) -> Option<&ResolvedDependency> {
        self.dependencies.iter().find(|dependency| &dependency.id == id)
    }

    pub fn has_failures(&self) -> bool {
        !self.unresolved_dependencies.is_empty()
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let value = toml::Value::try_from(self)?;
        toml::to_string_pretty(&value)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("Resolution was never completed")]
    Incomplete,
    #[error("Child {child} attached to unregistered parent {parent}")]
    UnregisteredParent { parent: NodeId, child: NodeId },
    #[error("Node {0} was attached but never registered")]
    UnregisteredChild(NodeId),
}

#[derive(Debug, Default)]
struct Links {
    parents: IndexSet<NodeId>,
    children: IndexSet<NodeId>,
}

/// In-memory sink producing a [`ResolutionResult`].
#[derive(Debug, Default)]
pub struct ResolvedConfigurationBuilder {
    dependencies: IndexMap<NodeId, Links>,
    first_level: Vec<FirstLevelDependency>,
    unresolved: Vec<UnresolvedDependency>,
    root: Option<NodeId>,
    orphans: Vec<(NodeId, NodeId)>,
}

impl ResolvedConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Result<ResolutionResult, BuildError> {
        let root = self.root.ok_or(BuildError::Incomplete)?;
        if let Some((parent, child)) = self.orphans.into_iter().next() {
            return Err(if self.dependencies.contains_key(&child) {
                BuildError::UnregisteredParent { parent, child }
            } else {
                BuildError::UnregisteredChild(child)
            });
        }

        Ok(ResolutionResult {
            root,
            dependencies: self
                .dependencies
                .into_iter()
                .map(|(id, links)| ResolvedDependency {
                    id,
                    parents: links.parents.into_iter().collect(),
                    children: links.children.into_iter().collect(),
                })
                .collect(),
            first_level_dependencies: self.first_level,
            unresolved_dependencies: self.unresolved,
        })
    }
}

impl ResultSink for ResolvedConfigurationBuilder {
    fn register_resolved_node(&mut self, node: &NodeId) {
        self.dependencies.entry(node.clone()).or_default();
    }

    fn attach_child(&mut self, parent: &NodeId, child: &NodeId) {
        if !self.dependencies.contains_key(parent) || !self.dependencies.contains_key(child) {
            self.orphans.push((parent.clone(), child.clone()));
            return;
        }
        if let Some(links) = self.dependencies.get_mut(parent) {
            links.children.insert(child.clone());
        }
        if let Some(links) = self.dependencies.get_mut(child) {
            links.parents.insert(parent.clone());
        }
    }

    fn register_first_level_dependency(
        &mut self,
        declaration: &DependencyDeclaration,
        child: &NodeId,
    ) {
        self.first_level.push(FirstLevelDependency {
            declaration: declaration.clone(),
            id: child.clone(),
        });
    }

    fn register_unresolved_dependency(&mut self, unresolved: UnresolvedDependency) {
        self.unresolved.push(unresolved);
    }

    fn complete_resolution(&mut self, root: &NodeId) {
        self.root = Some(root.clone());
    }
}
