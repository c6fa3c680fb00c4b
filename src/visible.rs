// src/visible.rs

use crate::action::ActionController;
use crate::error::{GraphError, Result};
use crate::linear::{CompiledGraph, LinearGraphAction, LinearGraphAnswer, LinearGraphController};
use crate::model::*;
use crate::options::GraphOptions;
use crate::permanent::PermanentGraph;
use crate::print::{PrintElement, PrintElementGenerator, PrintElementHandle, PrintElementKind, SelectionState};
use std::collections::BTreeSet;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Row-addressable view over a permanent graph.
///
/// Owns the selection and the print element generator; the generator is rebuilt
/// whenever the compiled graph version moves or the long-edge mode is set.
#[derive(Debug)]
pub struct VisibleGraph<C> {
    permanent: Arc<PermanentGraph<C>>,
    controller: LinearGraphController<C>,
    generator: PrintElementGenerator,
    show_long_edges: bool,
    pub(crate) selection: SelectionState,
}

/// One visible row. Commit ids are resolved up front, print elements on demand.
#[derive(Debug, Clone, Copy)]
pub struct RowInfo<'a, C> {
    graph: &'a VisibleGraph<C>,
    row: RowIndex,
    node: NodeId,
    commit: &'a C,
    head: &'a C,
    row_type: RowType,
}

impl<'a, C> RowInfo<'a, C> {
    pub fn row(&self) -> RowIndex {
        self.row
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn commit(&self) -> &'a C {
        self.commit
    }

    pub fn one_of_heads(&self) -> &'a C {
        self.head
    }

    pub fn row_type(&self) -> RowType {
        self.row_type
    }

    pub fn print_elements(&self) -> Vec<PrintElement> {
        self.graph.generator.print_elements(self.graph.compiled(), self.row, &self.graph.selection)
    }
}

impl<C: Clone + Eq + Hash> VisibleGraph<C> {
    /// Builds the permanent graph from provider output and compiles it.
    pub fn from_commits(commits: Vec<GraphCommit<C>>, options: &GraphOptions) -> Result<Self> {
        let permanent = PermanentGraph::new(commits, options.head_policy)?;
        Ok(Self::new(Arc::new(permanent), options))
    }

    /// Fails with `NotFound` for unknown commits and for commits hidden inside a
    /// collapsed run.
    pub fn row_index_of(&self, commit: &C) -> Result<RowIndex> {
        let node = self.permanent.node_id_of(commit)?;
        self.compiled().node_index(node).ok_or(GraphError::NotFound)
    }
}

impl<C> VisibleGraph<C> {
    pub fn new(permanent: Arc<PermanentGraph<C>>, options: &GraphOptions) -> Self {
        let controller = LinearGraphController::new(Arc::clone(&permanent), options.collapse_linear_branches);
        let show_long_edges = options.show_long_edges;
        let generator = PrintElementGenerator::new(controller.compiled_graph(), &permanent, show_long_edges);
        Self { permanent, controller, generator, show_long_edges, selection: SelectionState::default() }
    }

    pub fn visible_row_count(&self) -> usize {
        self.compiled().nodes_count()
    }

    pub fn row_info(&self, row: RowIndex) -> Result<RowInfo<'_, C>> {
        let count = self.visible_row_count();
        let node = self.compiled().node_id(row).ok_or(GraphError::InvalidRow { row, count })?;
        let commit = self.permanent.commit_id_of(node)?;
        let head = self.permanent.commit_id_of(self.permanent.head_node_of(node)?)?;
        let row_type = self.compiled().row_type(row).unwrap_or_default();
        Ok(RowInfo { graph: self, row, node, commit, head, row_type })
    }

    pub fn action_controller(&mut self) -> ActionController<'_, C> {
        ActionController::new(self)
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn permanent_graph(&self) -> &Arc<PermanentGraph<C>> {
        &self.permanent
    }

    pub fn linear_controller(&self) -> &LinearGraphController<C> {
        &self.controller
    }

    /// Compiled graph version the cached generator was built for.
    pub fn generator_version(&self) -> u64 {
        self.generator.version()
    }

    pub fn column_count(&self) -> usize {
        self.generator.column_count()
    }

    pub fn shows_long_edges(&self) -> bool {
        self.show_long_edges
    }

    /// Switches the long-edge mode and rebuilds the generator; handles issued
    /// under the previous mode stop resolving.
    pub(crate) fn set_long_edges(&mut self, show: bool) {
        self.show_long_edges = show;
        self.rebuild_generator();
    }

    pub(crate) fn resolve(&self, handle: PrintElementHandle) -> Result<(PrintElementKind, GraphElement)> {
        self.generator.resolve(self.compiled(), handle)
    }

    /// Runs a structural edit, adopts the selection it hands back and brings the
    /// generator up to the new graph version.
    pub(crate) fn apply_linear(&mut self, action: LinearGraphAction, previous: &BTreeSet<NodeId>) -> LinearGraphAnswer {
        let answer = self.controller.apply_action(action, previous);
        if let Some(nodes) = &answer.selected_nodes {
            self.selection.set_nodes(nodes.clone());
        }
        self.sync_generator();
        answer
    }

    fn sync_generator(&mut self) {
        if self.generator.version() != self.compiled().version() {
            self.rebuild_generator();
        }
    }

    fn rebuild_generator(&mut self) {
        let version = self.compiled().version();
        self.generator = PrintElementGenerator::new(self.controller.compiled_graph(), &self.permanent, self.show_long_edges);
        debug!(version, long_edges = self.show_long_edges, "regenerated print elements");
    }

    fn compiled(&self) -> &CompiledGraph {
        self.controller.compiled_graph()
    }
}
