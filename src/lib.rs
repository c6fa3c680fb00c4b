// src/lib.rs

//! Interactive commit-history graph engine.
//!
//! A [`PermanentGraph`] holds the whole commit DAG. A [`LinearGraphController`]
//! projects it into rows, collapsing linear runs of commits on request, and a
//! [`PrintElementGenerator`] turns each row into lane geometry. [`VisibleGraph`]
//! ties the three together and hands out an [`ActionController`] that maps
//! pointer gestures on that geometry back onto the graph.

pub mod action;
pub mod error;
pub mod linear;
pub mod model;
pub mod options;
pub mod permanent;
pub mod print;
pub mod visible;

pub use action::{ActionController, CursorHint, GestureKind, GraphAction, GraphAnswer};
pub use error::{GraphError, Result};
pub use linear::{CompiledGraph, GraphChanges, LinearGraphAction, LinearGraphAnswer, LinearGraphController, LinearRun};
pub use model::{EdgeType, GraphCommit, GraphEdge, GraphElement, Lane, NodeId, RowIndex, RowType};
pub use options::{GraphOptions, HeadPolicy};
pub use permanent::PermanentGraph;
pub use print::{Direction, PrintElement, PrintElementGenerator, PrintElementHandle, PrintElementKind, SelectionState};
pub use visible::{RowInfo, VisibleGraph};
