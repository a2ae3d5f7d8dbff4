//! StateGraph compile failure cases: unknown node, missing entry, dangling node, etc.

use std::sync::Arc;

use adaptive_rag::{CompilationError, StateGraph, END, START};

use crate::common::{NeverDecides, Next, Push, Tally, UntilDone};

/// **Scenario**: An edge to an unregistered node is rejected.
#[tokio::test]
async fn compile_fails_when_edge_refers_to_unknown_node() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(Push::new("a")))
        .add_edge(START, "a")
        .add_edge("a", "missing");

    match graph.compile() {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

/// **Scenario**: A branch target that is not a node is rejected.
#[tokio::test]
async fn compile_fails_when_branch_target_unknown() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(Push::new("a")))
        .add_edge(START, "a")
        .add_conditional_edges("a", UntilDone, |n| match n {
            Next::Again => "nowhere",
            Next::Stop => END,
        });

    match graph.compile() {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "nowhere"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

/// **Scenario**: A graph without an entry edge is rejected.
#[tokio::test]
async fn compile_fails_without_start_edge() {
    let mut graph = StateGraph::<Tally>::new();
    graph.add_node("a", Arc::new(Push::new("a"))).add_edge("a", END);
    assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));
}

/// **Scenario**: A node with no way forward is rejected.
#[tokio::test]
async fn compile_fails_when_node_has_no_outgoing_edge() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(Push::new("a")))
        .add_node("b", Arc::new(Push::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b");

    match graph.compile() {
        Err(CompilationError::MissingEdge(id)) => assert_eq!(id, "b"),
        other => panic!("expected MissingEdge, got {:?}", other.err()),
    }
}

/// **Scenario**: Two outgoing edges from one node are rejected.
#[tokio::test]
async fn compile_fails_on_duplicate_outgoing_edge() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(Push::new("a")))
        .add_edge(START, "a")
        .add_edge("a", END)
        .add_edge("a", END);

    match graph.compile() {
        Err(CompilationError::DuplicateEdge(id)) => assert_eq!(id, "a"),
        other => panic!("expected DuplicateEdge, got {:?}", other.err()),
    }
}

/// **Scenario**: A conditional edge over an empty decision type is rejected.
#[tokio::test]
async fn compile_fails_on_empty_branch() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(Push::new("a")))
        .add_edge(START, "a")
        .add_conditional_edges("a", NeverDecides, |never| match never {});

    match graph.compile() {
        Err(CompilationError::EmptyBranch(id)) => assert_eq!(id, "a"),
        other => panic!("expected EmptyBranch, got {:?}", other.err()),
    }
}
