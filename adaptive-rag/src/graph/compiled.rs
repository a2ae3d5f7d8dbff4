//! Compiled state graph: immutable, supports invoke and stream.
//!
//! Built by `StateGraph::compile`. Holds nodes, the entry edge and one outgoing edge per
//! node. Execution is strictly sequential: a node only runs after its predecessor's
//! update has been merged into the state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::RagError;
use crate::stream::{StreamEvent, StreamMode};

use super::edge::Branch;
use super::logging;
use super::{GraphState, Node, RunContext, END, START};

/// Default number of node runs one invocation may perform.
pub const DEFAULT_MAX_STEPS: usize = 25;

/// Outgoing edge of a node (or of START).
pub(crate) enum Edge<S> {
    To(String),
    Branch(Arc<dyn Branch<S>>),
}

impl<S> Clone for Edge<S> {
    fn clone(&self) -> Self {
        match self {
            Edge::To(to) => Edge::To(to.clone()),
            Edge::Branch(branch) => Edge::Branch(Arc::clone(branch)),
        }
    }
}

/// Compiled graph: immutable structure, supports invoke and stream.
///
/// Created by `StateGraph::compile()`. Resolves the entry edge, then after each node
/// merges the node's update and follows that node's outgoing edge until END.
pub struct CompiledStateGraph<S: GraphState> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) entry: Edge<S>,
    pub(super) edges: HashMap<String, Edge<S>>,
    pub(super) max_steps: usize,
}

impl<S: GraphState> Clone for CompiledStateGraph<S> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            entry: self.entry.clone(),
            edges: self.edges.clone(),
            max_steps: self.max_steps,
        }
    }
}

impl<S: GraphState> CompiledStateGraph<S> {
    /// Follows `edge` from `from`: direct edges return their target, conditional edges
    /// evaluate their decision against the current state.
    async fn resolve(&self, from: &str, edge: &Edge<S>, state: &S) -> Result<String, RagError> {
        match edge {
            Edge::To(to) => Ok(to.clone()),
            Edge::Branch(branch) => {
                let (decision, target) = branch.next(state).await?;
                logging::log_decision(from, decision, target);
                Ok(target.to_string())
            }
        }
    }

    /// Shared run loop used by invoke() and the streaming variants: steps through nodes until END.
    async fn run_loop_inner(&self, state: &mut S, run_ctx: Option<&RunContext<S>>) -> Result<(), RagError> {
        logging::log_graph_start();
        let mut current_id = self.resolve(START, &self.entry, state).await?;
        let mut steps = 0;

        while current_id != END {
            if steps >= self.max_steps {
                return Err(RagError::RecursionLimit(self.max_steps));
            }
            steps += 1;

            let node = self
                .nodes
                .get(&current_id)
                .cloned()
                .ok_or_else(|| RagError::ExecutionFailed(format!("unknown node: {}", current_id)))?;

            logging::log_node_start(&current_id);
            let update = node.run(state).await?;
            logging::log_node_complete(&current_id);

            if let Some(ctx) = run_ctx {
                ctx.emit(StreamMode::Updates, || StreamEvent::Updates {
                    node_id: current_id.clone(),
                    update: update.clone(),
                })
                .await;
            }
            state.apply(update);
            if let Some(ctx) = run_ctx {
                ctx.emit(StreamMode::Values, || StreamEvent::Values(state.clone()))
                    .await;
            }

            let edge = self
                .edges
                .get(&current_id)
                .ok_or_else(|| RagError::ExecutionFailed(format!("no edge from node: {}", current_id)))?;
            current_id = self.resolve(&current_id, edge, state).await?;
        }

        logging::log_graph_complete(steps);
        Ok(())
    }

    /// Runs the graph with the given state until END and returns the final state.
    ///
    /// Any node or decision error aborts the run and is returned as-is.
    pub async fn invoke(&self, state: S) -> Result<S, RagError> {
        let mut state = state;
        if let Err(e) = self.run_loop_inner(&mut state, None).await {
            logging::log_graph_error(&e);
            return Err(e);
        }
        Ok(state)
    }

    /// Streams graph execution, emitting events via channel-backed Stream.
    ///
    /// Per node, `Updates` (the node's delta) is sent before `Values` (the merged state).
    /// On failure the error is logged and the stream ends early.
    pub fn stream(
        &self,
        state: S,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let run_ctx = RunContext {
            stream_tx: Some(tx),
            stream_mode: stream_mode.into(),
        };

        tokio::spawn(async move {
            let mut state = state;
            if let Err(e) = graph.run_loop_inner(&mut state, Some(&run_ctx)).await {
                logging::log_graph_error(&e);
            }
        });

        ReceiverStream::new(rx)
    }

    /// Runs the graph on the current task, handing every event to `on_event` as it is
    /// produced, and returns the final state or the error that stopped the run.
    pub async fn stream_with_callback<F>(
        &self,
        state: S,
        stream_mode: impl Into<HashSet<StreamMode>>,
        mut on_event: F,
    ) -> Result<S, RagError>
    where
        F: FnMut(StreamEvent<S>),
    {
        let (tx, mut rx) = mpsc::channel(128);
        let run_ctx = RunContext {
            stream_tx: Some(tx),
            stream_mode: stream_mode.into(),
        };

        let run = async move {
            let mut state = state;
            let result = self.run_loop_inner(&mut state, Some(&run_ctx)).await;
            // Closes the channel so the drain below ends.
            drop(run_ctx);
            result.map(|()| state)
        };
        let drain = async {
            while let Some(event) = rx.recv().await {
                on_event(event);
            }
        };
        let (result, ()) = tokio::join!(run, drain);
        if let Err(e) = &result {
            logging::log_graph_error(e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio_stream::StreamExt;

    use crate::graph::{Decision, EdgeCondition, StateGraph};

    /// Counter state: `value` is overwritten, `log` appended.
    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter {
        value: i32,
        log: Vec<String>,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct CounterUpdate {
        value: i32,
        entry: String,
    }

    impl GraphState for Counter {
        type Update = CounterUpdate;

        fn apply(&mut self, update: CounterUpdate) {
            self.value = update.value;
            self.log.push(update.entry);
        }
    }

    struct AddNode {
        id: &'static str,
        delta: i32,
    }

    #[async_trait]
    impl Node<Counter> for AddNode {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, state: &Counter) -> Result<CounterUpdate, RagError> {
            Ok(CounterUpdate {
                value: state.value + self.delta,
                entry: self.id.to_string(),
            })
        }
    }

    struct FailNode;

    #[async_trait]
    impl Node<Counter> for FailNode {
        fn id(&self) -> &str {
            "fail"
        }

        async fn run(&self, _state: &Counter) -> Result<CounterUpdate, RagError> {
            Err(RagError::Oracle("boom".into()))
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Parity {
        Even,
        Odd,
    }

    impl Decision for Parity {
        const ALL: &'static [Self] = &[Parity::Even, Parity::Odd];

        fn as_str(&self) -> &'static str {
            match self {
                Parity::Even => "even",
                Parity::Odd => "odd",
            }
        }
    }

    /// Decides on the parity of the current value; counts evaluations.
    #[derive(Default)]
    struct ByParity {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EdgeCondition<Counter> for ByParity {
        type Decision = Parity;

        async fn decide(&self, state: &Counter) -> Result<Parity, RagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(if state.value % 2 == 0 {
                Parity::Even
            } else {
                Parity::Odd
            })
        }
    }

    fn build_two_step_graph() -> CompiledStateGraph<Counter> {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("first", Arc::new(AddNode { id: "first", delta: 1 }))
            .add_node("second", Arc::new(AddNode { id: "second", delta: 2 }))
            .add_edge(START, "first")
            .add_edge("first", "second")
            .add_edge("second", END);
        graph.compile().expect("graph compiles")
    }

    fn build_branching_graph(calls: Arc<AtomicUsize>) -> CompiledStateGraph<Counter> {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("start_odd", Arc::new(AddNode { id: "start_odd", delta: 1 }))
            .add_node("even", Arc::new(AddNode { id: "even", delta: 10 }))
            .add_node("odd", Arc::new(AddNode { id: "odd", delta: 100 }))
            .add_edge(START, "start_odd")
            .add_conditional_edges("start_odd", ByParity { calls }, |p| match p {
                Parity::Even => "even",
                Parity::Odd => "odd",
            })
            .add_edge("even", END)
            .add_edge("odd", END);
        graph.compile().expect("graph compiles")
    }

    /// **Scenario**: invoke runs nodes in edge order and merges each update.
    #[tokio::test]
    async fn invoke_runs_linear_chain_and_merges_updates() {
        let graph = build_two_step_graph();
        let out = graph.invoke(Counter::default()).await.unwrap();
        assert_eq!(out.value, 3);
        assert_eq!(out.log, vec!["first".to_string(), "second".to_string()]);
    }

    /// **Scenario**: A conditional edge follows the decision taken on the merged state.
    #[tokio::test]
    async fn invoke_follows_conditional_edge() {
        let calls = Arc::new(AtomicUsize::new(0));
        let graph = build_branching_graph(calls.clone());
        let out = graph.invoke(Counter::default()).await.unwrap();
        // start_odd: 0+1=1 (odd) -> odd: 1+100
        assert_eq!(out.value, 101);
        assert_eq!(out.log, vec!["start_odd".to_string(), "odd".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let out = graph
            .invoke(Counter {
                value: 1,
                log: vec![],
            })
            .await
            .unwrap();
        assert_eq!(out.value, 12);
        assert_eq!(out.log.last().map(String::as_str), Some("even"));
    }

    /// **Scenario**: A conditional entry edge picks the first node without running any node first.
    #[tokio::test]
    async fn invoke_conditional_entry_edge() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("even", Arc::new(AddNode { id: "even", delta: 10 }))
            .add_node("odd", Arc::new(AddNode { id: "odd", delta: 100 }))
            .add_conditional_edges(START, ByParity { calls: calls.clone() }, |p| match p {
                Parity::Even => "even",
                Parity::Odd => "odd",
            })
            .add_edge("even", END)
            .add_edge("odd", END);
        let graph = graph.compile().expect("graph compiles");
        let out = graph.invoke(Counter::default()).await.unwrap();
        assert_eq!(out.log, vec!["even".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// **Scenario**: A node error aborts the run and no later node executes.
    #[tokio::test]
    async fn invoke_propagates_node_error() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("fail", Arc::new(FailNode))
            .add_node("after", Arc::new(AddNode { id: "after", delta: 1 }))
            .add_edge(START, "fail")
            .add_edge("fail", "after")
            .add_edge("after", END);
        let graph = graph.compile().expect("graph compiles");
        match graph.invoke(Counter::default()).await {
            Err(RagError::Oracle(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected Oracle error, got {:?}", other),
        }
    }

    /// **Scenario**: A cycle that never reaches END stops at the step limit.
    #[tokio::test]
    async fn invoke_cycle_hits_recursion_limit() {
        let mut graph = StateGraph::<Counter>::new().with_max_steps(5);
        graph
            .add_node("loop", Arc::new(AddNode { id: "loop", delta: 1 }))
            .add_edge(START, "loop")
            .add_edge("loop", "loop");
        let graph = graph.compile().expect("graph compiles");
        match graph.invoke(Counter::default()).await {
            Err(RagError::RecursionLimit(5)) => {}
            other => panic!("expected RecursionLimit(5), got {:?}", other),
        }
    }

    /// **Scenario**: stream(updates) emits per-node deltas in execution order.
    #[tokio::test]
    async fn stream_updates_emit_node_ids_in_order() {
        let graph = build_two_step_graph();
        let events: Vec<_> = graph
            .stream(Counter::default(), HashSet::from_iter([StreamMode::Updates]))
            .collect()
            .await;
        let ids: Vec<_> = events
            .iter()
            .map(|e| match e {
                StreamEvent::Updates { node_id, update } => {
                    assert_eq!(&update.entry, node_id);
                    node_id.clone()
                }
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(ids, vec!["first".to_string(), "second".to_string()]);
    }

    /// **Scenario**: stream(Values+Updates) emits Updates then Values per node; last Values is final.
    #[tokio::test]
    async fn stream_values_and_updates_both_enabled() {
        let graph = build_two_step_graph();
        let events: Vec<_> = graph
            .stream(
                Counter::default(),
                HashSet::from_iter([StreamMode::Values, StreamMode::Updates]),
            )
            .collect()
            .await;
        assert_eq!(events.len(), 4, "two nodes: two Updates + two Values");
        assert!(matches!(&events[0], StreamEvent::Updates { node_id, .. } if node_id == "first"));
        assert!(matches!(&events[1], StreamEvent::Values(s) if s.value == 1));
        assert!(matches!(&events[2], StreamEvent::Updates { node_id, .. } if node_id == "second"));
        assert!(matches!(&events[3], StreamEvent::Values(s) if s.value == 3));
    }

    /// **Scenario**: A failing node ends the stream early without panicking.
    #[tokio::test]
    async fn stream_failing_node_ends_stream() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("first", Arc::new(AddNode { id: "first", delta: 1 }))
            .add_node("fail", Arc::new(FailNode))
            .add_edge(START, "first")
            .add_edge("first", "fail")
            .add_edge("fail", END);
        let graph = graph.compile().expect("graph compiles");
        let events: Vec<_> = graph
            .stream(Counter::default(), HashSet::from_iter([StreamMode::Values]))
            .collect()
            .await;
        assert_eq!(events.len(), 1, "only the first node's Values");
    }

    /// **Scenario**: stream_with_callback hands every event over and returns the final state.
    #[tokio::test]
    async fn stream_with_callback_returns_final_state() {
        let graph = build_two_step_graph();
        let mut seen = Vec::new();
        let out = graph
            .stream_with_callback(
                Counter::default(),
                HashSet::from_iter([StreamMode::Updates]),
                |e| {
                    if let StreamEvent::Updates { node_id, .. } = e {
                        seen.push(node_id);
                    }
                },
            )
            .await
            .unwrap();
        assert_eq!(out.value, 3);
        assert_eq!(seen, vec!["first".to_string(), "second".to_string()]);
    }

    /// **Scenario**: stream_with_callback returns the node error after delivering earlier events.
    #[tokio::test]
    async fn stream_with_callback_surfaces_error() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("first", Arc::new(AddNode { id: "first", delta: 1 }))
            .add_node("fail", Arc::new(FailNode))
            .add_edge(START, "first")
            .add_edge("first", "fail")
            .add_edge("fail", END);
        let graph = graph.compile().expect("graph compiles");
        let mut count = 0;
        let result = graph
            .stream_with_callback(
                Counter::default(),
                HashSet::from_iter([StreamMode::Values]),
                |_| count += 1,
            )
            .await;
        assert!(matches!(result, Err(RagError::Oracle(_))));
        assert_eq!(count, 1);
    }
}
