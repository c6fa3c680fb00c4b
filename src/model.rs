// src/model.rs

/// Stable identity of a commit node for the lifetime of a permanent graph
pub type NodeId = usize;

/// Position of a node in the current compiled graph; only valid for one version
pub type RowIndex = usize;

/// Permanent layout lane (a first-parent chain)
pub type Lane = usize;

/// Classification of a visible row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowType {
    #[default]
    Normal,
    /// Placeholder row kept by higher-level filtering
    Unmatched,
}

/// A commit as handed over by the commit data provider.
///
/// Commits are supplied children-before-parents (heads first). Parents that are
/// not part of the supplied list are treated as not loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphCommit<C> {
    pub id: C,
    pub parents: Vec<C>,
    pub row_type: RowType,
}

impl<C> GraphCommit<C> {
    pub fn new(id: C, parents: Vec<C>) -> Self {
        Self { id, parents, row_type: RowType::Normal }
    }

    pub fn unmatched(mut self) -> Self {
        self.row_type = RowType::Unmatched;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeType {
    /// Parent-child relation between two loaded commits
    Normal,
    /// The parent exists but lies beyond the loaded window
    NotLoaded,
    /// Stands in for a hidden linear run of commits
    Collapsed,
}

impl EdgeType {
    /// Edges whose far end can be used as a navigation target.
    pub fn is_navigable(self) -> bool {
        matches!(self, EdgeType::Normal | EdgeType::NotLoaded)
    }
}

/// An edge of the compiled graph, oriented from child (`up`) to parent (`down`).
///
/// For `NotLoaded` edges `down` is the node id reserved for the missing parent; it
/// resolves to a commit id but never to a row. `Collapsed` edges remember the
/// first hidden commit in `via`, so runs sharing both boundaries stay apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphEdge {
    pub up: NodeId,
    pub down: NodeId,
    pub edge_type: EdgeType,
    pub via: Option<NodeId>,
}

impl GraphEdge {
    pub fn new(up: NodeId, down: NodeId, edge_type: EdgeType) -> Self {
        Self { up, down, edge_type, via: None }
    }

    /// Synthetic edge standing in for the hidden run that starts at `via`.
    pub fn collapsed(up: NodeId, down: NodeId, via: NodeId) -> Self {
        Self { up, down, edge_type: EdgeType::Collapsed, via: Some(via) }
    }

    /// The endpoint that is not `node`.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.up == node {
            self.down
        } else {
            self.up
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphElement {
    Node(NodeId),
    Edge(GraphEdge),
}
