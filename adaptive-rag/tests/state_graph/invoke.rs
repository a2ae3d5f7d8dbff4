//! Invoke and stream through the public API.

use std::collections::HashSet;
use std::sync::Arc;

use adaptive_rag::{RagError, StateGraph, StreamEvent, StreamMode, END, START};
use tokio_stream::StreamExt;

use crate::common::{Next, Push, Tally, UntilDone};

/// **Scenario**: A conditional loop runs until its condition says stop.
#[tokio::test]
async fn invoke_loops_until_condition_stops() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("work", Arc::new(Push::new("work")))
        .add_node("finish", Arc::new(Push::finishing("finish")))
        .add_edge(START, "work")
        .add_edge("work", "finish")
        .add_conditional_edges("finish", UntilDone, |n| match n {
            Next::Again => "work",
            Next::Stop => END,
        });
    let graph = graph.compile().expect("graph compiles");
    let out = graph.invoke(Tally::default()).await.unwrap();
    assert_eq!(out.visited, vec!["work", "finish"]);
    assert!(out.done);
}

/// **Scenario**: A loop that never finishes hits the configured step limit.
#[tokio::test]
async fn invoke_unbounded_loop_hits_step_limit() {
    let mut graph = StateGraph::<Tally>::new().with_max_steps(4);
    graph
        .add_node("work", Arc::new(Push::new("work")))
        .add_edge(START, "work")
        .add_conditional_edges("work", UntilDone, |n| match n {
            Next::Again => "work",
            Next::Stop => END,
        });
    let graph = graph.compile().expect("graph compiles");
    assert!(matches!(
        graph.invoke(Tally::default()).await,
        Err(RagError::RecursionLimit(4))
    ));
}

/// **Scenario**: The values stream ends with the same state invoke returns.
#[tokio::test]
async fn stream_last_value_matches_invoke() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(Push::new("a")))
        .add_node("b", Arc::new(Push::finishing("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    let graph = graph.compile().expect("graph compiles");

    let invoked = graph.invoke(Tally::default()).await.unwrap();
    let events: Vec<_> = graph
        .stream(Tally::default(), HashSet::from([StreamMode::Values]))
        .collect()
        .await;
    match events.last() {
        Some(StreamEvent::Values(last)) => assert_eq!(last, &invoked),
        other => panic!("expected final Values, got {:?}", other),
    }
}
