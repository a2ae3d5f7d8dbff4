//! State graph: nodes, direct edges and conditional edges; compile, then invoke or stream.
//!
//! Aligns with LangGraph `StateGraph`: add nodes and edges, compile, then invoke with a
//! state. Nodes return partial updates that the engine merges into the running state;
//! conditional edges return a closed decision enum that is mapped to the next node.

mod compile_error;
mod compiled;
mod edge;
pub(crate) mod logging;
mod node;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::{CompiledStateGraph, DEFAULT_MAX_STEPS};
pub use edge::{Decision, EdgeCondition};
pub use node::{GraphState, Node};
pub use run_context::RunContext;
pub use state_graph::{StateGraph, END, START};
