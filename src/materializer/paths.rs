use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use indexmap::{IndexMap, IndexSet};
use log::trace;

use crate::model::{
    graph::{DependencyGraph, NodeIndex},
    module::ModuleIdentifier,
};

/// Module identifiers from the root to a requiring node, root first.
pub type DiagnosticPath = Vec<ModuleIdentifier>;

/// A duplicate-free, bounded collection of diagnostic paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    paths: IndexSet<DiagnosticPath>,
    truncated: bool,
}

impl PathSet {
    /// Returns false once the set is full; the path is dropped and the set marked truncated.
    fn insert(&mut self, path: DiagnosticPath, max_paths: usize) -> bool {
        if self.paths.contains(&path) {
            return true;
        }
        if self.paths.len() >= max_paths {
            self.truncated = true;
            return false;
        }
        self.paths.insert(path);
        true
    }

    pub fn paths(&self) -> &IndexSet<DiagnosticPath> {
        &self.paths
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn into_paths(self) -> Vec<DiagnosticPath> {
        self.paths.into_iter().collect()
    }
}

/// The last step of a path. Everything before it is shared with the other
/// paths through the same parent.
struct PathLink {
    node: NodeIndex,
    parent: Option<Rc<PathLink>>,
}

impl Drop for PathLink {
    // Unlinks the chain iteratively so deep graphs do not exhaust the stack.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(link) = parent {
            parent = match Rc::try_unwrap(link) {
                Ok(mut link) => link.parent.take(),
                Err(_) => break,
            };
        }
    }
}

/// Memoized paths to one node, as links into the paths of its parents.
#[derive(Default)]
struct NodePaths {
    links: Vec<Rc<PathLink>>,
    truncated: bool,
}

enum Visit {
    Enter(NodeIndex),
    Exit(NodeIndex),
}

/// Enumerates the simple paths from the root down to arbitrary nodes by walking
/// incoming edges backwards.
///
/// The paths found for a node are memoized and reused by every node below it,
/// so a shared subgraph is walked once no matter how many diamonds lead to it.
/// A node stores one link per path, pointing at the path of its parent; module
/// identifiers are only copied out for the paths that get reported. Each node
/// keeps at most `max_paths` paths.
pub struct PathResolver<'g> {
    graph: &'g DependencyGraph,
    root: NodeIndex,
    max_paths: usize,
    memo: HashMap<NodeIndex, NodePaths>,
}

impl<'g> PathResolver<'g> {
    pub fn new(graph: &'g DependencyGraph, root: NodeIndex, max_paths: usize) -> Self {
        PathResolver {
            graph,
            root,
            max_paths: max_paths.max(1),
            memo: HashMap::new(),
        }
    }

    /// Paths to each of `targets`, keyed by target.
    pub fn paths_by_node(
        &mut self,
        targets: impl IntoIterator<Item = NodeIndex>,
    ) -> IndexMap<NodeIndex, PathSet> {
        targets
            .into_iter()
            .map(|target| (target, self.paths_to(target)))
            .collect()
    }

    /// Paths to any of `targets`, flattened into one set.
    pub fn paths_to_all(&mut self, targets: impl IntoIterator<Item = NodeIndex>) -> PathSet {
        let mut combined = PathSet::default();
        for target in targets {
            self.resolve(target);
            self.collect_into(target, &mut combined);
        }
        combined
    }

    pub fn paths_to(&mut self, target: NodeIndex) -> PathSet {
        self.paths_to_all([target])
    }

    fn resolve(&mut self, target: NodeIndex) {
        if self.memo.contains_key(&target) {
            return;
        }

        // Post-order walk towards the root: a node's paths are built once all of
        // its parents have theirs. Parents still in progress would close a cycle
        // and are skipped.
        let mut in_progress = HashSet::new();
        let mut stack = vec![Visit::Enter(target)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(node) => {
                    if self.memo.contains_key(&node) || in_progress.contains(&node) {
                        continue;
                    }
                    if node == self.root {
                        let root = Rc::new(PathLink { node, parent: None });
                        self.memo.insert(
                            node,
                            NodePaths {
                                links: vec![root],
                                truncated: false,
                            },
                        );
                        continue;
                    }
                    in_progress.insert(node);
                    stack.push(Visit::Exit(node));
                    for parent in self.parents(node) {
                        if !self.memo.contains_key(&parent) && !in_progress.contains(&parent) {
                            stack.push(Visit::Enter(parent));
                        }
                    }
                }
                Visit::Exit(node) => {
                    in_progress.remove(&node);
                    let paths = self.extend_parents(node);
                    trace!("Found {} paths to {}", paths.links.len(), node);
                    self.memo.insert(node, paths);
                }
            }
        }
    }

    fn collect_into(&self, target: NodeIndex, paths: &mut PathSet) {
        let Some(node_paths) = self.memo.get(&target) else {
            return;
        };
        paths.truncated |= node_paths.truncated;
        for link in &node_paths.links {
            if !paths.insert(self.expand(link), self.max_paths) {
                break;
            }
        }
    }

    fn expand(&self, link: &PathLink) -> DiagnosticPath {
        let mut path = Vec::new();
        let mut next = Some(link);
        while let Some(link) = next {
            if let Some(node) = self.graph.node(link.node) {
                path.push(node.id().module.clone());
            }
            next = link.parent.as_deref();
        }
        path.reverse();
        path
    }

    fn parents(&self, node: NodeIndex) -> IndexSet<NodeIndex> {
        self.graph
            .incoming_edges(node)
            .map(|edge| edge.source())
            .filter(|source| *source != node)
            .collect()
    }

    /// Paths through distinct parents end in distinct steps, so no deduplication
    /// is needed here.
    fn extend_parents(&self, node: NodeIndex) -> NodePaths {
        let mut paths = NodePaths::default();
        'parents: for parent in self.parents(node) {
            let Some(parent_paths) = self.memo.get(&parent) else {
                continue;
            };
            paths.truncated |= parent_paths.truncated;
            for parent_link in &parent_paths.links {
                if paths.links.len() >= self.max_paths {
                    paths.truncated = true;
                    break 'parents;
                }
                paths.links.push(Rc::new(PathLink {
                    node,
                    parent: Some(parent_link.clone()),
                }));
            }
        }
        paths
    }

    #[cfg(test)]
    fn stored_links(&self) -> usize {
        self.memo.values().map(|paths| paths.links.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::fixtures::{path, GraphFixture};

    use pretty_assertions::assert_eq;

    fn as_set(paths: &PathSet) -> HashSet<DiagnosticPath> {
        paths.paths().iter().cloned().collect()
    }

    fn diamond() -> GraphFixture {
        let mut fixture = GraphFixture::new("R");
        fixture
            .edge("R", "A")
            .edge("R", "B")
            .edge("A", "C")
            .edge("B", "C");
        fixture
    }

    /// `layers` diamonds stacked on top of each other, ending in `D{layers}`.
    fn stacked_diamonds(layers: usize) -> GraphFixture {
        let mut fixture = GraphFixture::new("D0");
        for layer in 0..layers {
            let top = format!("D{layer}");
            let bottom = format!("D{}", layer + 1);
            let left = format!("L{layer}");
            let right = format!("R{layer}");
            fixture
                .edge(&top, &left)
                .edge(&top, &right)
                .edge(&left, &bottom)
                .edge(&right, &bottom);
        }
        fixture
    }

    #[test]
    fn root_has_a_single_path() {
        let fixture = GraphFixture::new("R");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let paths = resolver.paths_to(fixture.root());
        assert_eq!(paths.paths().iter().cloned().collect::<Vec<_>>(), vec![path(&["R"])]);
    }

    #[test]
    fn direct_dependency_is_prefixed_by_root() {
        let mut fixture = GraphFixture::new("R");
        fixture.edge("R", "A");
        let a = fixture.node("A");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        assert_eq!(
            resolver.paths_to(a).paths().iter().cloned().collect::<Vec<_>>(),
            vec![path(&["R", "A"])]
        );
    }

    #[test]
    fn diamond_has_both_paths() {
        let mut fixture = diamond();
        let c = fixture.node("C");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let paths = resolver.paths_to(c);

        assert_eq!(
            as_set(&paths),
            HashSet::from([path(&["R", "A", "C"]), path(&["R", "B", "C"])])
        );
        assert!(!paths.is_truncated());
    }

    #[test]
    fn paths_to_all_combines_without_duplicates() {
        let mut fixture = diamond();
        let a = fixture.node("A");
        let c = fixture.node("C");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let paths = resolver.paths_to_all([c, a, c]);

        assert_eq!(paths.len(), 3);
        assert_eq!(
            as_set(&paths),
            HashSet::from([
                path(&["R", "A", "C"]),
                path(&["R", "B", "C"]),
                path(&["R", "A"]),
            ])
        );
    }

    #[test]
    fn paths_by_node_keeps_targets_apart() {
        let mut fixture = diamond();
        let a = fixture.node("A");
        let c = fixture.node("C");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let by_node = resolver.paths_by_node([a, c]);

        assert_eq!(by_node[&a].len(), 1);
        assert_eq!(by_node[&c].len(), 2);
    }

    #[test]
    fn stacked_diamonds_enumerate_every_path() {
        let mut fixture = stacked_diamonds(5);
        let bottom = fixture.node("D5");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let paths = resolver.paths_to(bottom);

        assert_eq!(paths.len(), 32);
        assert!(!paths.is_truncated());
        assert!(paths.paths().iter().all(|p| p.len() == 11));
    }

    #[test]
    fn wide_graphs_are_truncated() {
        let mut fixture = stacked_diamonds(12);
        let bottom = fixture.node("D12");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let paths = resolver.paths_to(bottom);

        assert_eq!(paths.len(), 100);
        assert!(paths.is_truncated());
        assert!(paths.paths().iter().all(|p| p.first() == Some(&path(&["D0"])[0])));
    }

    #[test]
    fn truncation_propagates_to_descendants() {
        let mut fixture = stacked_diamonds(3);
        fixture.edge("D3", "leaf");
        let leaf = fixture.node("leaf");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 4);
        let paths = resolver.paths_to(leaf);

        assert_eq!(paths.len(), 4);
        assert!(paths.is_truncated());
    }

    #[test]
    fn unreachable_node_has_no_paths() {
        let mut fixture = GraphFixture::new("R");
        fixture.edge("orphan", "X");
        let x = fixture.node("X");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let paths = resolver.paths_to(x);

        assert!(paths.is_empty());
        assert!(!paths.is_truncated());
    }

    #[test]
    fn deep_chain_shares_path_prefixes() {
        let depth = 4000;
        let mut fixture = GraphFixture::new("n0");
        for i in 0..depth {
            fixture.edge(&format!("n{i}"), &format!("n{}", i + 1));
        }
        let bottom = fixture.node(&format!("n{depth}"));
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let paths = resolver.paths_to(bottom);

        assert_eq!(paths.len(), 1);
        assert_eq!(paths.paths()[0].len(), depth + 1);
        assert_eq!(
            paths.paths()[0].last().map(|module| module.name.clone()),
            Some(format!("n{depth}"))
        );
        assert_eq!(resolver.stored_links(), depth + 1);
    }

    #[test]
    fn memoized_paths_are_reused_across_targets() {
        let mut fixture = stacked_diamonds(3);
        fixture.edge("D3", "x").edge("D3", "y");
        let x = fixture.node("x");
        let y = fixture.node("y");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        resolver.paths_to(x);
        let before = resolver.stored_links();
        let paths = resolver.paths_to(y);

        assert_eq!(paths.len(), 8);
        assert_eq!(resolver.stored_links(), before + 8);
    }

    #[test]
    fn cycles_terminate() {
        let mut fixture = GraphFixture::new("R");
        fixture.edge("R", "A").edge("A", "B").edge("B", "A").edge("B", "B");
        let b = fixture.node("B");
        let mut resolver = PathResolver::new(&fixture.graph, fixture.root(), 100);
        let paths = resolver.paths_to(b);

        assert_eq!(as_set(&paths), HashSet::from([path(&["R", "A", "B"])]));
    }
}
