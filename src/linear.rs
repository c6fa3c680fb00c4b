// src/linear.rs

use crate::model::*;
use crate::permanent::PermanentGraph;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

pub type RunId = usize;

/// A maximal chain of commits with exactly one child and one loaded parent each.
///
/// `upper` and `lower` are the boundary commits that stay visible when the run
/// is collapsed; `interior` is ordered top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearRun {
    pub upper: NodeId,
    pub lower: NodeId,
    pub interior: Vec<NodeId>,
}

/// Row-ordered projection of the permanent graph for one set of collapsed runs.
///
/// Rebuilt from scratch on every structural edit; `version` tells consumers which
/// build they are looking at.
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    version: u64,
    nodes: Vec<NodeId>,
    rows: HashMap<NodeId, RowIndex>,
    row_types: Vec<RowType>,
    up_edges: Vec<Vec<GraphEdge>>,
    down_edges: Vec<Vec<GraphEdge>>,
}

impl CompiledGraph {
    fn build<C>(
        permanent: &PermanentGraph<C>,
        runs: &[LinearRun],
        run_of: &[Option<RunId>],
        collapsed: &[bool],
        version: u64,
    ) -> Self {
        let hidden = |node: NodeId| run_of.get(node).copied().flatten().is_some_and(|run| collapsed[run]);

        let nodes: Vec<NodeId> = (0..permanent.loaded_count()).filter(|&node| !hidden(node)).collect();
        let rows: HashMap<NodeId, RowIndex> = nodes.iter().enumerate().map(|(row, &node)| (node, row)).collect();
        let row_types = nodes.iter().map(|&node| permanent.row_type(node).unwrap_or_default()).collect();
        let mut up_edges = vec![Vec::new(); nodes.len()];
        let mut down_edges = vec![Vec::new(); nodes.len()];

        for (row, &node) in nodes.iter().enumerate() {
            for &parent in permanent.parents(node) {
                let edge = if !permanent.is_loaded(parent) {
                    GraphEdge::new(node, parent, EdgeType::NotLoaded)
                } else if let Some(run) = run_of[parent].filter(|&run| collapsed[run]) {
                    GraphEdge::collapsed(node, runs[run].lower, parent)
                } else {
                    GraphEdge::new(node, parent, EdgeType::Normal)
                };
                if let Some(&down_row) = rows.get(&edge.down) {
                    up_edges[down_row].push(edge);
                }
                down_edges[row].push(edge);
            }
        }

        Self { version, nodes, rows, row_types, up_edges, down_edges }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_id(&self, row: RowIndex) -> Option<NodeId> {
        self.nodes.get(row).copied()
    }

    pub fn node_index(&self, node: NodeId) -> Option<RowIndex> {
        self.rows.get(&node).copied()
    }

    pub fn row_type(&self, row: RowIndex) -> Option<RowType> {
        self.row_types.get(row).copied()
    }

    /// Edges to children, ordered by child row.
    pub fn up_edges(&self, row: RowIndex) -> &[GraphEdge] {
        self.up_edges.get(row).map_or(&[], Vec::as_slice)
    }

    /// Edges to parents, first parent first.
    pub fn down_edges(&self, row: RowIndex) -> &[GraphEdge] {
        self.down_edges.get(row).map_or(&[], Vec::as_slice)
    }

    /// Visible node ids in row order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearGraphAction {
    /// Collapse the run the node is interior to, or the run the edge lies in
    Collapse(GraphElement),
    /// Expand the run behind a collapsed edge, or the run hiding a node
    Expand(GraphElement),
    CollapseAll,
    ExpandAll,
}

/// Which nodes a structural edit revealed and hid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphChanges {
    pub version: u64,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearGraphAnswer {
    pub selected_nodes: Option<BTreeSet<NodeId>>,
    pub jump_to: Option<NodeId>,
    pub changes: Option<GraphChanges>,
}

/// Owns the compiled graph and applies collapse/expand edits to it.
#[derive(Debug)]
pub struct LinearGraphController<C> {
    permanent: Arc<PermanentGraph<C>>,
    runs: Vec<LinearRun>,
    run_of: Vec<Option<RunId>>,
    collapsed: Vec<bool>,
    compiled: CompiledGraph,
}

impl<C> LinearGraphController<C> {
    pub fn new(permanent: Arc<PermanentGraph<C>>, collapse_linear_branches: bool) -> Self {
        let (runs, run_of) = find_linear_runs(&permanent);
        let collapsed = vec![collapse_linear_branches; runs.len()];
        let compiled = CompiledGraph::build(&permanent, &runs, &run_of, &collapsed, 0);
        debug!(runs = runs.len(), rows = compiled.nodes_count(), "compiled initial graph");
        Self { permanent, runs, run_of, collapsed, compiled }
    }

    pub fn compiled_graph(&self) -> &CompiledGraph {
        &self.compiled
    }

    pub fn permanent_graph(&self) -> &Arc<PermanentGraph<C>> {
        &self.permanent
    }

    pub fn linear_runs(&self) -> &[LinearRun] {
        &self.runs
    }

    pub fn collapsed_run_count(&self) -> usize {
        self.collapsed.iter().filter(|&&collapsed| collapsed).count()
    }

    /// The run `element` belongs to, if any. Collapsed edges map to the run they
    /// stand in for.
    pub fn run_of_element(&self, element: GraphElement) -> Option<RunId> {
        match element {
            GraphElement::Node(node) => self.interior_run(node),
            GraphElement::Edge(edge) => match edge.edge_type {
                EdgeType::Normal => self.interior_run(edge.up).or_else(|| self.interior_run(edge.down)),
                EdgeType::Collapsed => edge
                    .via
                    .and_then(|node| self.interior_run(node))
                    .filter(|&run| self.runs[run].upper == edge.up && self.runs[run].lower == edge.down),
                EdgeType::NotLoaded => None,
            },
        }
    }

    pub fn is_collapsed(&self, run: RunId) -> bool {
        self.collapsed.get(run).copied().unwrap_or(false)
    }

    /// Applies a structural edit. `selection` is the caller's selection before the
    /// edit; bulk edits hand back the part of it that is still visible.
    pub fn apply_action(&mut self, action: LinearGraphAction, selection: &BTreeSet<NodeId>) -> LinearGraphAnswer {
        match action {
            LinearGraphAction::Collapse(element) => match self.run_of_element(element) {
                Some(run) if !self.collapsed[run] => {
                    self.collapsed[run] = true;
                    let run = &self.runs[run];
                    let selected = BTreeSet::from([run.upper, run.lower]);
                    let removed = run.interior.clone();
                    let changes = self.recompile(Vec::new(), removed);
                    LinearGraphAnswer { selected_nodes: Some(selected), jump_to: None, changes: Some(changes) }
                }
                _ => LinearGraphAnswer::default(),
            },
            LinearGraphAction::Expand(element) => match self.run_of_element(element) {
                Some(run) if self.collapsed[run] => {
                    self.collapsed[run] = false;
                    let run = &self.runs[run];
                    let mut selected: BTreeSet<NodeId> = run.interior.iter().copied().collect();
                    selected.extend([run.upper, run.lower]);
                    let added = run.interior.clone();
                    let changes = self.recompile(added, Vec::new());
                    LinearGraphAnswer { selected_nodes: Some(selected), jump_to: None, changes: Some(changes) }
                }
                _ => LinearGraphAnswer::default(),
            },
            LinearGraphAction::CollapseAll => self.set_all(true, selection),
            LinearGraphAction::ExpandAll => self.set_all(false, selection),
        }
    }

    fn set_all(&mut self, collapse: bool, selection: &BTreeSet<NodeId>) -> LinearGraphAnswer {
        let mut moved = Vec::new();
        for (run, collapsed) in self.runs.iter().zip(self.collapsed.iter_mut()) {
            if *collapsed != collapse {
                *collapsed = collapse;
                moved.extend_from_slice(&run.interior);
            }
        }

        let changes = if moved.is_empty() {
            None
        } else {
            moved.sort_unstable();
            Some(if collapse { self.recompile(Vec::new(), moved) } else { self.recompile(moved, Vec::new()) })
        };
        let selected = selection.iter().copied().filter(|&node| self.compiled.node_index(node).is_some()).collect();
        LinearGraphAnswer { selected_nodes: Some(selected), jump_to: None, changes }
    }

    fn recompile(&mut self, added: Vec<NodeId>, removed: Vec<NodeId>) -> GraphChanges {
        let version = self.compiled.version + 1;
        self.compiled = CompiledGraph::build(&self.permanent, &self.runs, &self.run_of, &self.collapsed, version);
        debug!(
            version,
            rows = self.compiled.nodes_count(),
            added = added.len(),
            removed = removed.len(),
            "recompiled linear graph"
        );
        GraphChanges { version, added, removed }
    }

    fn interior_run(&self, node: NodeId) -> Option<RunId> {
        self.run_of.get(node).copied().flatten()
    }
}

fn is_interior<C>(permanent: &PermanentGraph<C>, node: NodeId) -> bool {
    permanent.is_loaded(node)
        && permanent.children(node).len() == 1
        && matches!(permanent.parents(node), [parent] if permanent.is_loaded(*parent))
}

fn find_linear_runs<C>(permanent: &PermanentGraph<C>) -> (Vec<LinearRun>, Vec<Option<RunId>>) {
    let mut runs = Vec::new();
    let mut run_of = vec![None; permanent.loaded_count()];

    for top in 0..permanent.loaded_count() {
        if !is_interior(permanent, top) {
            continue;
        }
        let upper = permanent.children(top)[0];
        if is_interior(permanent, upper) {
            continue;
        }

        let run_id = runs.len();
        let mut interior = Vec::new();
        let mut current = top;
        while is_interior(permanent, current) {
            run_of[current] = Some(run_id);
            interior.push(current);
            current = permanent.parents(current)[0];
        }
        runs.push(LinearRun { upper, lower: current, interior });
    }
    (runs, run_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::HeadPolicy;

    fn graph(input: &[(&'static str, &[&'static str])]) -> Arc<PermanentGraph<&'static str>> {
        let commits = input.iter().map(|&(id, parents)| GraphCommit::new(id, parents.to_vec())).collect();
        Arc::new(PermanentGraph::new(commits, HeadPolicy::Topmost).unwrap())
    }

    fn chain() -> Arc<PermanentGraph<&'static str>> {
        graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])])
    }

    // m
    // | x
    // | y
    // | z
    // |/
    // f
    // r
    fn branchy() -> Arc<PermanentGraph<&'static str>> {
        graph(&[
            ("m", &["f"]),
            ("x", &["y"]),
            ("y", &["z"]),
            ("z", &["f"]),
            ("f", &["r"]),
            ("r", &[]),
        ])
    }

    #[test]
    fn finds_maximal_runs() {
        let controller = LinearGraphController::new(chain(), false);
        assert_eq!(controller.linear_runs(), &[LinearRun { upper: 0, lower: 2, interior: vec![1] }]);

        let controller = LinearGraphController::new(branchy(), false);
        assert_eq!(controller.linear_runs(), &[LinearRun { upper: 1, lower: 4, interior: vec![2, 3] }]);
    }

    #[test]
    fn collapse_all_joins_boundaries_with_one_edge() {
        let mut controller = LinearGraphController::new(chain(), false);
        let answer = controller.apply_action(LinearGraphAction::CollapseAll, &BTreeSet::new());

        let changes = answer.changes.expect("graph changed");
        assert_eq!(changes.version, 1);
        assert_eq!(changes.removed, vec![1]);

        let compiled = controller.compiled_graph();
        assert_eq!(compiled.nodes(), &[0, 2]);
        assert_eq!(compiled.down_edges(0), &[GraphEdge::collapsed(0, 2, 1)]);
        assert_eq!(compiled.up_edges(1), &[GraphEdge::collapsed(0, 2, 1)]);
        assert_eq!(compiled.node_index(1), None);
    }

    #[test]
    fn bulk_actions_are_idempotent_and_keep_visible_selection() {
        let mut controller = LinearGraphController::new(branchy(), false);
        let selection = BTreeSet::from([0, 2, 4]);

        let first = controller.apply_action(LinearGraphAction::CollapseAll, &selection);
        assert!(first.changes.is_some());
        assert_eq!(first.selected_nodes, Some(BTreeSet::from([0, 4])));

        let again = controller.apply_action(LinearGraphAction::CollapseAll, &selection);
        assert_eq!(again.changes, None);
        assert_eq!(controller.compiled_graph().version(), 1);

        let expanded = controller.apply_action(LinearGraphAction::ExpandAll, &selection);
        assert_eq!(expanded.changes.map(|c| c.added), Some(vec![2, 3]));
        assert_eq!(expanded.selected_nodes, Some(selection));
        assert_eq!(controller.compiled_graph().nodes_count(), 6);
    }

    #[test]
    fn single_run_collapse_and_expand() {
        let mut controller = LinearGraphController::new(branchy(), false);
        let none = BTreeSet::new();

        let answer = controller.apply_action(LinearGraphAction::Collapse(GraphElement::Node(2)), &none);
        assert_eq!(answer.selected_nodes, Some(BTreeSet::from([1, 4])));
        assert_eq!(controller.compiled_graph().nodes(), &[0, 1, 4, 5]);

        // already collapsed
        let again = controller.apply_action(LinearGraphAction::Collapse(GraphElement::Node(2)), &none);
        assert_eq!(again, LinearGraphAnswer::default());

        let edge = GraphEdge::collapsed(1, 4, 2);
        let answer = controller.apply_action(LinearGraphAction::Expand(GraphElement::Edge(edge)), &none);
        assert_eq!(answer.selected_nodes, Some(BTreeSet::from([1, 2, 3, 4])));
        assert_eq!(answer.changes.map(|c| c.added), Some(vec![2, 3]));

        let expanded = controller.apply_action(LinearGraphAction::Expand(GraphElement::Edge(edge)), &none);
        assert_eq!(expanded.changes, None);
    }

    #[test]
    fn boundary_nodes_and_not_loaded_edges_do_not_collapse() {
        let mut controller = LinearGraphController::new(branchy(), false);
        let none = BTreeSet::new();
        let boundary = controller.apply_action(LinearGraphAction::Collapse(GraphElement::Node(4)), &none);
        assert_eq!(boundary.changes, None);

        let edge = GraphEdge::new(0, 4, EdgeType::Normal);
        let unrelated = controller.apply_action(LinearGraphAction::Collapse(GraphElement::Edge(edge)), &none);
        assert_eq!(unrelated.changes, None);

        let run_edge = GraphEdge::new(1, 2, EdgeType::Normal);
        let answer = controller.apply_action(LinearGraphAction::Collapse(GraphElement::Edge(run_edge)), &none);
        assert!(answer.changes.is_some());
    }

    #[test]
    fn expanding_through_a_hidden_node() {
        let mut controller = LinearGraphController::new(branchy(), true);
        assert_eq!(controller.compiled_graph().node_index(3), None);

        let answer = controller.apply_action(LinearGraphAction::Expand(GraphElement::Node(3)), &BTreeSet::new());
        assert_eq!(answer.selected_nodes, Some(BTreeSet::from([1, 2, 3, 4])));
        let changes = answer.changes.expect("run expanded");
        assert_eq!(changes.added, vec![2, 3]);
        assert!(changes.removed.is_empty());
        assert_eq!(controller.compiled_graph().node_index(3), Some(3));

        let visible = controller.apply_action(LinearGraphAction::Expand(GraphElement::Node(3)), &BTreeSet::new());
        assert_eq!(visible, LinearGraphAnswer::default());
    }

    // m
    // |\
    // a b
    // |/
    // r
    #[test]
    fn runs_sharing_both_boundaries_expand_independently() {
        let diamond = graph(&[("m", &["a", "b"]), ("a", &["r"]), ("b", &["r"]), ("r", &[])]);
        let mut controller = LinearGraphController::new(diamond, true);
        let none = BTreeSet::new();
        let edges = controller.compiled_graph().down_edges(0).to_vec();
        assert_eq!(edges, vec![GraphEdge::collapsed(0, 3, 1), GraphEdge::collapsed(0, 3, 2)]);

        let second = controller.apply_action(LinearGraphAction::Expand(GraphElement::Edge(edges[1])), &none);
        assert_eq!(second.changes.map(|c| c.added), Some(vec![2]));
        assert_eq!(controller.compiled_graph().nodes(), &[0, 2, 3]);

        let first = controller.apply_action(LinearGraphAction::Expand(GraphElement::Edge(edges[0])), &none);
        assert_eq!(first.changes.map(|c| c.added), Some(vec![1]));
        assert_eq!(controller.compiled_graph().nodes(), &[0, 1, 2, 3]);
    }

    #[test]
    fn not_loaded_parents_become_edges_without_rows() {
        let controller = LinearGraphController::new(graph(&[("a", &["b"]), ("b", &["gone"])]), true);
        let compiled = controller.compiled_graph();
        assert_eq!(compiled.nodes_count(), 2);
        assert_eq!(compiled.down_edges(1), &[GraphEdge::new(1, 2, EdgeType::NotLoaded)]);
        assert!(controller.linear_runs().is_empty());
    }
}
