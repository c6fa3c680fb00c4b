// src/permanent.rs

use crate::error::{GraphError, Result};
use crate::model::*;
use crate::options::HeadPolicy;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

const UNASSIGNED: Lane = Lane::MAX;

/// The fully loaded commit DAG. Immutable once built.
///
/// Node ids `0..loaded_count()` are the supplied commits in their topological
/// order. Parents that were referenced but not supplied get the ids that follow,
/// so their commit ids stay resolvable for navigation even though they never
/// become rows.
#[derive(Debug)]
pub struct PermanentGraph<C> {
    commits: Vec<C>,
    index: HashMap<C, NodeId>,
    loaded: usize,
    parents: Vec<Vec<NodeId>>,
    children: Vec<Vec<NodeId>>,
    row_types: Vec<RowType>,
    lanes: Vec<Lane>,
    lane_count: usize,
    heads: Vec<NodeId>,
}

impl<C: Clone + Eq + Hash> PermanentGraph<C> {
    pub fn new(input: Vec<GraphCommit<C>>, head_policy: HeadPolicy) -> Result<Self> {
        let loaded = input.len();
        let mut index = HashMap::with_capacity(loaded);
        for (i, commit) in input.iter().enumerate() {
            if index.insert(commit.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateCommit(i));
            }
        }

        let mut commits = Vec::with_capacity(loaded);
        let mut parents = Vec::with_capacity(loaded);
        let mut children = vec![Vec::new(); loaded];
        let mut row_types = Vec::with_capacity(loaded);
        let mut not_loaded = Vec::new();

        for (i, commit) in input.into_iter().enumerate() {
            let mut own_parents: Vec<NodeId> = Vec::with_capacity(commit.parents.len());
            for parent in commit.parents {
                let parent_id = match index.get(&parent) {
                    Some(&id) => id,
                    None => {
                        let id = loaded + not_loaded.len();
                        index.insert(parent.clone(), id);
                        not_loaded.push(parent);
                        id
                    }
                };
                if parent_id < loaded && parent_id <= i {
                    return Err(GraphError::NotTopological { child: i, parent: parent_id });
                }
                if own_parents.contains(&parent_id) {
                    continue;
                }
                if parent_id < loaded {
                    children[parent_id].push(i);
                }
                own_parents.push(parent_id);
            }
            commits.push(commit.id);
            parents.push(own_parents);
            row_types.push(commit.row_type);
        }
        commits.extend(not_loaded);

        let (lanes, lane_count) = assign_lanes(&parents, loaded);
        let heads = resolve_heads(&parents, &children, head_policy);
        debug!(loaded, not_loaded = commits.len() - loaded, lane_count, "built permanent graph");

        Ok(Self { commits, index, loaded, parents, children, row_types, lanes, lane_count, heads })
    }

    pub fn node_id_of(&self, commit: &C) -> Result<NodeId> {
        self.index.get(commit).copied().ok_or(GraphError::NotFound)
    }
}

impl<C> PermanentGraph<C> {
    pub fn commit_id_of(&self, node: NodeId) -> Result<&C> {
        self.commits.get(node).ok_or(GraphError::InvalidId(node))
    }

    /// One branch head that reaches `node`, chosen by the graph's [`HeadPolicy`].
    pub fn head_node_of(&self, node: NodeId) -> Result<NodeId> {
        self.heads.get(node).copied().ok_or(GraphError::InvalidId(node))
    }

    pub fn layout_lane(&self, node: NodeId) -> Result<Lane> {
        self.lanes.get(node).copied().ok_or(GraphError::InvalidId(node))
    }

    pub(crate) fn lane_of(&self, node: NodeId) -> Lane {
        self.lanes[node]
    }

    pub fn row_type(&self, node: NodeId) -> Result<RowType> {
        self.row_types.get(node).copied().ok_or(GraphError::InvalidId(node))
    }

    /// Parent ids, first parent first. May include not-loaded ids.
    pub fn parents(&self, node: NodeId) -> &[NodeId] {
        self.parents.get(node).map_or(&[], Vec::as_slice)
    }

    /// Loaded children, in ascending id order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children.get(node).map_or(&[], Vec::as_slice)
    }

    pub fn is_loaded(&self, node: NodeId) -> bool {
        node < self.loaded
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded
    }

    /// All node ids, not-loaded parents included.
    pub fn node_count(&self) -> usize {
        self.commits.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    /// Loaded nodes without children.
    pub fn heads(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().enumerate().filter(|(_, kids)| kids.is_empty()).map(|(node, _)| node)
    }
}

/// Walks first-parent chains in id order; every chain start opens a new lane.
fn assign_lanes(parents: &[Vec<NodeId>], loaded: usize) -> (Vec<Lane>, usize) {
    let mut lanes = vec![UNASSIGNED; loaded];
    let mut next = 0;
    for start in 0..loaded {
        if lanes[start] != UNASSIGNED {
            continue;
        }
        let mut current = start;
        loop {
            lanes[current] = next;
            match parents[current].first() {
                Some(&parent) if parent < loaded && lanes[parent] == UNASSIGNED => current = parent,
                _ => break,
            }
        }
        next += 1;
    }
    (lanes, next)
}

// Children always precede their parents, so one forward pass sees every child's
// head before the parent needs it.
fn resolve_heads(parents: &[Vec<NodeId>], children: &[Vec<NodeId>], policy: HeadPolicy) -> Vec<NodeId> {
    let mut heads: Vec<NodeId> = Vec::with_capacity(children.len());
    for (node, kids) in children.iter().enumerate() {
        let topmost = kids.iter().map(|&child| heads[child]).min();
        let head = match policy {
            HeadPolicy::Topmost => topmost,
            HeadPolicy::FirstParent => kids
                .iter()
                .filter(|&&child| parents[child].first() == Some(&node))
                .map(|&child| heads[child])
                .min()
                .or(topmost),
        };
        heads.push(head.unwrap_or(node));
    }
    heads
}
