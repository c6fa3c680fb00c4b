// src/print.rs

use crate::error::{GraphError, Result};
use crate::linear::CompiledGraph;
use crate::model::*;
use crate::permanent::PermanentGraph;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintElementKind {
    /// The row's own commit
    Node,
    /// Half of an edge to the adjacent row, drawn toward `other_column`
    Segment { direction: Direction, other_column: usize },
    /// An edge whose other end is not on the adjacent row
    Arrow { direction: Direction },
}

impl PrintElementKind {
    pub fn is_arrow(self) -> bool {
        matches!(self, PrintElementKind::Arrow { .. })
    }

    // Top-to-bottom order inside one column
    fn order_key(self) -> (u8, usize) {
        match self {
            PrintElementKind::Segment { direction: Direction::Up, other_column } => (0, other_column),
            PrintElementKind::Arrow { direction: Direction::Up } => (1, 0),
            PrintElementKind::Node => (2, 0),
            PrintElementKind::Arrow { direction: Direction::Down } => (3, 0),
            PrintElementKind::Segment { direction: Direction::Down, other_column } => (4, other_column),
        }
    }
}

/// Opaque reference to an emitted print element.
///
/// Only valid for the compiled graph version and long-edge mode it was issued
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrintElementHandle {
    version: u64,
    long_edges: bool,
    row: RowIndex,
    index: usize,
}

impl PrintElementHandle {
    pub fn row(&self) -> RowIndex {
        self.row
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrintElement {
    pub row: RowIndex,
    pub column: usize,
    pub kind: PrintElementKind,
    /// Type of the edge behind segments and arrows
    pub edge_type: Option<EdgeType>,
    pub selected: bool,
    pub handle: PrintElementHandle,
}

/// Highlighted nodes plus at most one highlighted element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    nodes: BTreeSet<NodeId>,
    element: Option<GraphElement>,
}

impl SelectionState {
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.element = None;
    }

    pub fn set_nodes(&mut self, nodes: BTreeSet<NodeId>) {
        self.nodes = nodes;
    }

    /// Replaces the highlighted element; node highlights are untouched.
    pub fn set_element(&mut self, element: GraphElement) {
        self.element = Some(element);
    }

    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }

    pub fn element(&self) -> Option<GraphElement> {
        self.element
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.element.is_none()
    }

    pub fn is_selected(&self, element: GraphElement) -> bool {
        if self.element == Some(element) {
            return true;
        }
        match element {
            GraphElement::Node(node) => self.nodes.contains(&node),
            GraphElement::Edge(edge) => self.nodes.contains(&edge.up) && self.nodes.contains(&edge.down),
        }
    }
}

/// Computes the per-row geometry for one compiled graph version.
///
/// Every visible lane gets a column for the rows between its first and last
/// visible node, plus one row below for a trailing arrow; columns are reused
/// once a lane has ended. With long edges shown, a normal edge spanning several
/// rows is drawn through the rows it crosses instead of as a pair of arrows.
#[derive(Debug, Clone)]
pub struct PrintElementGenerator {
    version: u64,
    long_edges: bool,
    columns: Vec<usize>,
    crossings: Vec<Vec<Crossing>>,
    long_columns: HashMap<GraphEdge, usize>,
    column_count: usize,
}

/// A long edge passing through a row, with the columns it comes from and goes to.
#[derive(Debug, Clone, Copy)]
struct Crossing {
    edge: GraphEdge,
    column: usize,
    above: usize,
    below: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Track {
    Lane(Lane),
    Edge(usize),
}

struct RowEntry {
    column: usize,
    kind: PrintElementKind,
    element: GraphElement,
}

impl PrintElementGenerator {
    pub fn new<C>(graph: &CompiledGraph, permanent: &PermanentGraph<C>, long_edges: bool) -> Self {
        let mut spans: BTreeMap<Lane, (RowIndex, RowIndex)> = BTreeMap::new();
        for (row, &node) in graph.nodes().iter().enumerate() {
            spans.entry(permanent.lane_of(node)).and_modify(|span| span.1 = row).or_insert((row, row));
        }

        // A long edge stays in its lane when it can: either it is the lane's own
        // first-parent edge, or it leaves the last node of the child's lane.
        let long = if long_edges { long_normal_edges(graph) } else { Vec::new() };
        let mut tracks = Vec::with_capacity(long.len());
        for (index, &(top, bottom, edge)) in long.iter().enumerate() {
            let lane = permanent.lane_of(edge.up);
            let track = if lane == permanent.lane_of(edge.down) {
                Track::Lane(lane)
            } else {
                match spans.get_mut(&lane) {
                    Some(span) if span.1 == top => {
                        span.1 = bottom - 1;
                        Track::Lane(lane)
                    }
                    _ => Track::Edge(index),
                }
            };
            tracks.push(track);
        }

        let mut intervals: Vec<(RowIndex, RowIndex, Track)> =
            spans.into_iter().map(|(lane, (first, last))| (first, last + 1, Track::Lane(lane))).collect();
        for (&(top, bottom, _), &track) in long.iter().zip(&tracks) {
            if let Track::Edge(_) = track {
                intervals.push((top + 1, bottom - 1, track));
            }
        }
        intervals.sort_unstable();

        let mut track_columns = BTreeMap::new();
        let mut active: BinaryHeap<Reverse<(RowIndex, usize)>> = BinaryHeap::new();
        let mut free: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
        let mut column_count = 0;
        for (first, last, track) in intervals {
            while let Some(&Reverse((end, column))) = active.peek() {
                if end >= first {
                    break;
                }
                active.pop();
                free.push(Reverse(column));
            }
            let column = match free.pop() {
                Some(Reverse(column)) => column,
                None => {
                    column_count += 1;
                    column_count - 1
                }
            };
            active.push(Reverse((last, column)));
            track_columns.insert(track, column);
        }

        let columns: Vec<usize> =
            graph.nodes().iter().map(|&node| track_columns[&Track::Lane(permanent.lane_of(node))]).collect();
        let mut crossings = vec![Vec::new(); columns.len()];
        let mut long_columns = HashMap::with_capacity(long.len());
        for (&(top, bottom, edge), track) in long.iter().zip(&tracks) {
            let column = track_columns[track];
            for row in top + 1..bottom {
                let above = if row - 1 == top { columns[top] } else { column };
                let below = if row + 1 == bottom { columns[bottom] } else { column };
                crossings[row].push(Crossing { edge, column, above, below });
            }
            long_columns.insert(edge, column);
        }

        debug!(version = graph.version(), column_count, long_edges = long.len(), "built print element generator");
        Self { version: graph.version(), long_edges, columns, crossings, long_columns, column_count }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether long edges are drawn through the rows they cross.
    pub fn shows_long_edges(&self) -> bool {
        self.long_edges
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Column of the row's own node.
    pub fn column_of(&self, row: RowIndex) -> Option<usize> {
        self.columns.get(row).copied()
    }

    /// Elements for `row`, ordered by column. Empty for rows outside the graph.
    pub fn print_elements(&self, graph: &CompiledGraph, row: RowIndex, selection: &SelectionState) -> Vec<PrintElement> {
        debug_assert_eq!(graph.version(), self.version, "generator used with another graph version");
        self.row_entries(graph, row)
            .into_iter()
            .enumerate()
            .map(|(index, entry)| PrintElement {
                row,
                column: entry.column,
                kind: entry.kind,
                edge_type: match entry.element {
                    GraphElement::Edge(edge) => Some(edge.edge_type),
                    GraphElement::Node(_) => None,
                },
                selected: selection.is_selected(entry.element),
                handle: PrintElementHandle { version: self.version, long_edges: self.long_edges, row, index },
            })
            .collect()
    }

    /// Maps a handle issued by [`print_elements`](Self::print_elements) back to
    /// its kind and graph element.
    pub fn resolve(&self, graph: &CompiledGraph, handle: PrintElementHandle) -> Result<(PrintElementKind, GraphElement)> {
        if handle.version != self.version || handle.long_edges != self.long_edges || graph.version() != self.version {
            return Err(GraphError::InvalidElement);
        }
        self.row_entries(graph, handle.row)
            .into_iter()
            .nth(handle.index)
            .map(|entry| (entry.kind, entry.element))
            .ok_or(GraphError::InvalidElement)
    }

    fn row_entries(&self, graph: &CompiledGraph, row: RowIndex) -> Vec<RowEntry> {
        let (Some(node), Some(column)) = (graph.node_id(row), self.column_of(row)) else {
            return Vec::new();
        };

        let mut entries = vec![RowEntry { column, kind: PrintElementKind::Node, element: GraphElement::Node(node) }];
        for &edge in graph.up_edges(row) {
            let kind = match (graph.node_index(edge.up), self.long_columns.get(&edge)) {
                (Some(other), _) if other + 1 == row => {
                    PrintElementKind::Segment { direction: Direction::Up, other_column: self.columns[other] }
                }
                (_, Some(&other_column)) => PrintElementKind::Segment { direction: Direction::Up, other_column },
                _ => PrintElementKind::Arrow { direction: Direction::Up },
            };
            entries.push(RowEntry { column, kind, element: GraphElement::Edge(edge) });
        }
        for &edge in graph.down_edges(row) {
            let kind = match (graph.node_index(edge.down), self.long_columns.get(&edge)) {
                (Some(other), _) if other == row + 1 => {
                    PrintElementKind::Segment { direction: Direction::Down, other_column: self.columns[other] }
                }
                (_, Some(&other_column)) => PrintElementKind::Segment { direction: Direction::Down, other_column },
                _ => PrintElementKind::Arrow { direction: Direction::Down },
            };
            entries.push(RowEntry { column, kind, element: GraphElement::Edge(edge) });
        }
        for crossing in self.crossings.get(row).into_iter().flatten() {
            let element = GraphElement::Edge(crossing.edge);
            let up = PrintElementKind::Segment { direction: Direction::Up, other_column: crossing.above };
            let down = PrintElementKind::Segment { direction: Direction::Down, other_column: crossing.below };
            entries.push(RowEntry { column: crossing.column, kind: up, element });
            entries.push(RowEntry { column: crossing.column, kind: down, element });
        }

        entries.sort_by_key(|entry| (entry.column, entry.kind.order_key()));
        entries
    }
}

/// Normal edges whose ends are more than one row apart, as (child row, parent row, edge).
fn long_normal_edges(graph: &CompiledGraph) -> Vec<(RowIndex, RowIndex, GraphEdge)> {
    let mut long = Vec::new();
    for row in 0..graph.nodes_count() {
        for &edge in graph.down_edges(row) {
            if edge.edge_type != EdgeType::Normal {
                continue;
            }
            if let Some(bottom) = graph.node_index(edge.down).filter(|&bottom| bottom > row + 1) {
                long.push((row, bottom, edge));
            }
        }
    }
    long
}
