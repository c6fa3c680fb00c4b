//! End-to-end behaviour of the visible graph and its action controller.

use git_lanes::*;
use std::collections::BTreeSet;

fn build(input: &[(&'static str, &[&'static str])]) -> VisibleGraph<&'static str> {
    let commits = input.iter().map(|&(id, parents)| GraphCommit::new(id, parents.to_vec())).collect();
    VisibleGraph::from_commits(commits, &GraphOptions::default()).unwrap()
}

fn element(graph: &VisibleGraph<&'static str>, row: RowIndex, kind: PrintElementKind) -> PrintElement {
    graph
        .row_info(row)
        .unwrap()
        .print_elements()
        .into_iter()
        .find(|element| element.kind == kind)
        .unwrap()
}

const DOWN_ARROW: PrintElementKind = PrintElementKind::Arrow { direction: Direction::Down };

#[test]
fn single_commit() {
    let graph = build(&[("A", &[])]);
    assert_eq!(graph.visible_row_count(), 1);
    assert_eq!(*graph.row_info(0).unwrap().commit(), "A");
    assert_eq!(*graph.row_info(0).unwrap().one_of_heads(), "A");
    assert_eq!(graph.row_index_of(&"A"), Ok(0));
    assert_eq!(graph.row_index_of(&"B"), Err(GraphError::NotFound));
    assert_eq!(
        graph.row_info(0).unwrap().print_elements().iter().map(|e| e.kind).collect::<Vec<_>>(),
        vec![PrintElementKind::Node]
    );
}

#[test]
fn linear_chain_collapses_to_its_endpoints() {
    let mut graph = build(&[("A", &["B"]), ("B", &["C"]), ("C", &[])]);

    graph.action_controller().perform_action(GraphAction::collapse_all());
    assert_eq!(graph.visible_row_count(), 2);
    assert_eq!(*graph.row_info(0).unwrap().commit(), "A");
    assert_eq!(*graph.row_info(1).unwrap().commit(), "C");
    assert_eq!(
        graph.linear_controller().compiled_graph().down_edges(0),
        &[GraphEdge::collapsed(0, 2, 1)]
    );
    let collapsed = element(&graph, 0, PrintElementKind::Segment { direction: Direction::Down, other_column: 0 });
    assert_eq!(collapsed.edge_type, Some(EdgeType::Collapsed));

    graph.action_controller().perform_action(GraphAction::expand_all());
    assert_eq!(graph.visible_row_count(), 3);
    let compiled = graph.linear_controller().compiled_graph();
    assert_eq!(compiled.down_edges(0), &[GraphEdge::new(0, 1, EdgeType::Normal)]);
    assert_eq!(compiled.down_edges(1), &[GraphEdge::new(1, 2, EdgeType::Normal)]);
}

#[test]
fn bulk_toggles_are_idempotent() {
    let mut graph = build(&[("A", &["B"]), ("B", &["C"]), ("C", &["D"]), ("D", &[])]);

    assert!(graph.action_controller().set_linear_branches_collapsed(true));
    let collapsed_rows = graph.visible_row_count();
    let version = graph.generator_version();
    assert!(!graph.action_controller().set_linear_branches_collapsed(true));
    graph.action_controller().perform_action(GraphAction::collapse_all());
    assert_eq!(graph.generator_version(), version);

    graph.action_controller().perform_action(GraphAction::expand_all());
    let expanded_rows = graph.visible_row_count();
    assert!(expanded_rows >= collapsed_rows);
    assert!(!graph.action_controller().set_linear_branches_collapsed(false));
}

#[test]
fn collapsed_interior_is_not_found_but_boundaries_are() {
    let mut graph = build(&[("A", &["B"]), ("B", &["C"]), ("C", &["D"]), ("D", &[])]);
    graph.action_controller().perform_action(GraphAction::collapse_all());

    assert_eq!(graph.row_index_of(&"A"), Ok(0));
    assert_eq!(graph.row_index_of(&"D"), Ok(1));
    assert_eq!(graph.row_index_of(&"B"), Err(GraphError::NotFound));
    assert_eq!(graph.row_index_of(&"C"), Err(GraphError::NotFound));
}

// M merges F; its first-parent edge to R skips over the feature branch.
//
// M
// |\
// | F
// | G
// |/
// R
fn merge() -> VisibleGraph<&'static str> {
    build(&[("M", &["R", "F"]), ("F", &["G"]), ("G", &["R"]), ("R", &[])])
}

#[test]
fn hover_on_a_long_edge_arrow() {
    let mut graph = merge();
    let rows = graph.visible_row_count();
    let arrow = element(&graph, 0, DOWN_ARROW);

    let answer = graph.action_controller().perform_action(GraphAction::hover(arrow.handle));
    assert_eq!(answer.cursor, Some(CursorHint::Pointer));
    assert!(answer.handled);
    assert_eq!(answer.jump_to, None);
    assert_eq!(graph.selection().element(), Some(GraphElement::Edge(GraphEdge::new(0, 3, EdgeType::Normal))));
    assert!(graph.selection().nodes().is_empty());
    assert_eq!(graph.visible_row_count(), rows);

    let selected: Vec<_> = (0..rows)
        .flat_map(|row| graph.row_info(row).unwrap().print_elements())
        .filter(|element| element.selected)
        .collect();
    assert_eq!(selected.len(), 2, "both arrows of the edge light up: {selected:?}");
}

#[test]
fn click_on_a_long_edge_arrow_navigates() {
    let mut graph = merge();
    let arrow = element(&graph, 0, DOWN_ARROW);
    graph.action_controller().perform_action(GraphAction::hover(arrow.handle));

    let answer = graph.action_controller().perform_action(GraphAction::click(arrow.handle));
    assert_eq!(answer.jump_to, Some("R"));
    assert!(graph.selection().is_empty());
    let target_row = graph.row_index_of(&answer.jump_to.unwrap()).unwrap();
    assert_eq!(target_row, 3);
}

#[test]
fn clicking_inside_a_branch_collapses_it_and_keeps_it_highlighted() {
    let mut graph = merge();
    let node = element(&graph, 1, PrintElementKind::Node);

    let answer = graph.action_controller().perform_action(GraphAction::click(node.handle));
    assert!(answer.handled);
    assert_eq!(graph.visible_row_count(), 2);
    assert_eq!(graph.selection().nodes(), &BTreeSet::from([0, 3]));
    assert_eq!(graph.row_index_of(&"F"), Err(GraphError::NotFound));

    // the handle was issued before the collapse
    assert_eq!(graph.action_controller().perform_action(GraphAction::click(node.handle)), GraphAnswer::none());
}

#[test]
fn invalid_rows_are_reported() {
    let graph = merge();
    assert_eq!(graph.row_info(4).unwrap_err(), GraphError::InvalidRow { row: 4, count: 4 });
}

#[test]
fn not_loaded_history_is_reachable_by_clicking_its_arrow() {
    let mut graph = build(&[("A", &["B"]), ("B", &["old"])]);
    let arrow = element(&graph, 1, DOWN_ARROW);
    assert_eq!(arrow.edge_type, Some(EdgeType::NotLoaded));

    let answer = graph.action_controller().perform_action(GraphAction::click(arrow.handle));
    assert_eq!(answer.jump_to, Some("old"));
    assert_eq!(graph.row_index_of(&"old"), Err(GraphError::NotFound));
}

#[test]
fn unmatched_rows_keep_their_type() {
    let commits = vec![GraphCommit::new("A", vec!["B"]).unmatched(), GraphCommit::new("B", vec![])];
    let graph = VisibleGraph::from_commits(commits, &GraphOptions::default()).unwrap();
    assert_eq!(graph.row_info(0).unwrap().row_type(), RowType::Unmatched);
    assert_eq!(graph.row_info(1).unwrap().row_type(), RowType::Normal);
}

#[test]
fn initial_collapse_policy() {
    let commits = vec![GraphCommit::new("A", vec!["B"]), GraphCommit::new("B", vec!["C"]), GraphCommit::new("C", vec![])];
    let graph = VisibleGraph::from_commits(commits, &GraphOptions::default().collapsed(true)).unwrap();
    assert_eq!(graph.visible_row_count(), 2);
    assert_eq!(graph.linear_controller().collapsed_run_count(), 1);
}

fn first_collapsed(graph: &VisibleGraph<&'static str>, row: RowIndex) -> PrintElement {
    graph
        .row_info(row)
        .unwrap()
        .print_elements()
        .into_iter()
        .find(|element| element.edge_type == Some(EdgeType::Collapsed))
        .unwrap()
}

#[test]
fn sibling_runs_with_shared_boundaries_expand_one_by_one() {
    let commits = vec![
        GraphCommit::new("M", vec!["A", "B"]),
        GraphCommit::new("A", vec!["R"]),
        GraphCommit::new("B", vec!["R"]),
        GraphCommit::new("R", vec![]),
    ];
    let mut graph = VisibleGraph::from_commits(commits, &GraphOptions::default().collapsed(true)).unwrap();
    assert_eq!(graph.visible_row_count(), 2);

    let first = first_collapsed(&graph, 0);
    assert!(graph.action_controller().perform_action(GraphAction::click(first.handle)).handled);
    assert_eq!(graph.visible_row_count(), 3);
    assert_eq!(graph.row_index_of(&"A"), Ok(1));

    let second = first_collapsed(&graph, 0);
    assert!(graph.action_controller().perform_action(GraphAction::click(second.handle)).handled);
    assert_eq!(graph.visible_row_count(), 4);
    assert_eq!(graph.row_index_of(&"B"), Ok(2));
}

#[test]
fn long_edges_can_be_drawn_through() {
    let mut graph = merge();
    graph.action_controller().set_long_edges_hidden(false);

    for row in 0..graph.visible_row_count() {
        let elements = graph.row_info(row).unwrap().print_elements();
        assert!(elements.iter().all(|element| !element.kind.is_arrow()), "row {row}: {elements:?}");
    }
    // M's edge to R passes the rows of F and G
    for row in 1..3 {
        let crossing = graph
            .row_info(row)
            .unwrap()
            .print_elements()
            .into_iter()
            .filter(|element| element.kind != PrintElementKind::Node && element.column == 0)
            .count();
        assert_eq!(crossing, 2);
    }

    graph.action_controller().set_long_edges_hidden(true);
    assert_eq!(element(&graph, 0, DOWN_ARROW).edge_type, Some(EdgeType::Normal));
}
