// src/action.rs

use crate::linear::LinearGraphAction;
use crate::model::*;
use crate::print::{Direction, PrintElementHandle, PrintElementKind};
use crate::visible::VisibleGraph;
use std::collections::BTreeSet;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Hover,
    Click,
    ToggleCollapseAll,
    ToggleExpandAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorHint {
    Default,
    Pointer,
}

/// A gesture from the input layer, anchored to a previously emitted element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphAction {
    pub element: Option<PrintElementHandle>,
    pub kind: GestureKind,
}

impl GraphAction {
    pub fn hover(element: PrintElementHandle) -> Self {
        Self { element: Some(element), kind: GestureKind::Hover }
    }

    pub fn click(element: PrintElementHandle) -> Self {
        Self { element: Some(element), kind: GestureKind::Click }
    }

    pub fn collapse_all() -> Self {
        Self { element: None, kind: GestureKind::ToggleCollapseAll }
    }

    pub fn expand_all() -> Self {
        Self { element: None, kind: GestureKind::ToggleExpandAll }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphAnswer<C> {
    pub cursor: Option<CursorHint>,
    pub jump_to: Option<C>,
    pub handled: bool,
}

impl<C> GraphAnswer<C> {
    pub fn none() -> Self {
        Self { cursor: None, jump_to: None, handled: false }
    }

    fn handled(cursor: Option<CursorHint>) -> Self {
        Self { cursor, jump_to: None, handled: true }
    }
}

/// Translates gestures into selection changes, navigation and structural edits.
pub struct ActionController<'a, C> {
    graph: &'a mut VisibleGraph<C>,
}

impl<'a, C> ActionController<'a, C> {
    pub(crate) fn new(graph: &'a mut VisibleGraph<C>) -> Self {
        Self { graph }
    }
}

impl<C: Clone> ActionController<'_, C> {
    /// Clears the selection, then lets the gesture set whatever it implies.
    pub fn perform_action(&mut self, action: GraphAction) -> GraphAnswer<C> {
        let previous = std::mem::take(&mut self.graph.selection);
        trace!(kind = ?action.kind, "performing graph action");

        match action.kind {
            GestureKind::ToggleCollapseAll => self.bulk(LinearGraphAction::CollapseAll, previous.nodes()),
            GestureKind::ToggleExpandAll => self.bulk(LinearGraphAction::ExpandAll, previous.nodes()),
            GestureKind::Hover | GestureKind::Click => {
                let Some(handle) = action.element else {
                    return GraphAnswer::none();
                };
                let (kind, element) = match self.graph.resolve(handle) {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        warn!(%err, row = handle.row(), "ignoring gesture");
                        return GraphAnswer::none();
                    }
                };
                if let Some(answer) = self.perform_arrow_action(action.kind, kind, element) {
                    return answer;
                }
                match action.kind {
                    GestureKind::Click => self.click(element),
                    _ => GraphAnswer::none(),
                }
            }
        }
    }

    /// Collapses or expands every linear run outside the gesture path. Keeps the
    /// visible part of the current selection. Returns whether the graph changed.
    pub fn set_linear_branches_collapsed(&mut self, collapse: bool) -> bool {
        let action = if collapse { LinearGraphAction::CollapseAll } else { LinearGraphAction::ExpandAll };
        let previous = self.graph.selection.nodes().clone();
        self.graph.apply_linear(action, &previous).changes.is_some()
    }

    pub fn are_long_edges_hidden(&self) -> bool {
        !self.graph.shows_long_edges()
    }

    /// Switches between arrows and drawn-through long edges. Always rebuilds the
    /// print elements, so every handle issued before becomes stale.
    pub fn set_long_edges_hidden(&mut self, hidden: bool) {
        self.graph.set_long_edges(!hidden);
    }

    fn bulk(&mut self, action: LinearGraphAction, previous: &BTreeSet<NodeId>) -> GraphAnswer<C> {
        self.graph.apply_linear(action, previous);
        GraphAnswer::handled(None)
    }

    fn perform_arrow_action(
        &mut self,
        gesture: GestureKind,
        kind: PrintElementKind,
        element: GraphElement,
    ) -> Option<GraphAnswer<C>> {
        let PrintElementKind::Arrow { direction } = kind else {
            return None;
        };
        let GraphElement::Edge(edge) = element else {
            return None;
        };

        let target = match (edge.edge_type, direction) {
            (EdgeType::NotLoaded, _) | (EdgeType::Normal, Direction::Down) => edge.down,
            (EdgeType::Normal, Direction::Up) => edge.up,
            (EdgeType::Collapsed, _) => return None,
        };

        match gesture {
            GestureKind::Hover => {
                self.graph.selection.set_element(element);
                Some(GraphAnswer::handled(Some(CursorHint::Pointer)))
            }
            GestureKind::Click => {
                let commit = self.graph.permanent_graph().commit_id_of(target).ok()?.clone();
                Some(GraphAnswer { cursor: Some(CursorHint::Default), jump_to: Some(commit), handled: true })
            }
            _ => None,
        }
    }

    fn click(&mut self, element: GraphElement) -> GraphAnswer<C> {
        let action = match element {
            GraphElement::Edge(edge) if edge.edge_type == EdgeType::Collapsed => LinearGraphAction::Expand(element),
            _ => LinearGraphAction::Collapse(element),
        };
        let answer = self.graph.apply_linear(action, &BTreeSet::new());
        let jump_to = answer
            .jump_to
            .and_then(|node| self.graph.permanent_graph().commit_id_of(node).ok().cloned());
        GraphAnswer { cursor: None, jump_to, handled: answer.changes.is_some() }
    }
}
