// src/options.rs

/// How a row picks its "one of heads" label when several branch heads reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadPolicy {
    /// The reachable head that comes first in topological order
    #[default]
    Topmost,
    /// Prefer children that name the node as their first parent, then fall back
    /// to the topmost child
    FirstParent,
}

/// Settings for building a visible graph.
#[derive(Debug, Clone, Default)]
pub struct GraphOptions {
    pub head_policy: HeadPolicy,
    /// Start with every linear run collapsed
    pub collapse_linear_branches: bool,
    /// Draw long edges through the rows they cross instead of as arrows
    pub show_long_edges: bool,
}

impl GraphOptions {
    pub fn with_head_policy(mut self, head_policy: HeadPolicy) -> Self {
        self.head_policy = head_policy;
        self
    }

    pub fn collapsed(mut self, collapse: bool) -> Self {
        self.collapse_linear_branches = collapse;
        self
    }

    pub fn long_edges(mut self, show: bool) -> Self {
        self.show_long_edges = show;
        self
    }
}
