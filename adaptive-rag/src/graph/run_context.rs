//! Run context passed into the run loop for streaming-aware execution.
//!
//! Holds the optional stream sender plus selected stream modes.

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::graph::GraphState;
use crate::stream::{StreamEvent, StreamMode};

#[derive(Clone)]
pub struct RunContext<S>
where
    S: GraphState,
{
    /// Optional sender for streaming events.
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    /// Enabled stream modes (Values, Updates).
    pub stream_mode: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: GraphState,
{
    /// Sends `event` when a sender is attached and `mode` is enabled. A dropped receiver is ignored.
    pub(crate) async fn emit(&self, mode: StreamMode, event: impl FnOnce() -> StreamEvent<S>) {
        if let Some(tx) = &self.stream_tx {
            if self.stream_mode.contains(&mode) {
                let _ = tx.send(event()).await;
            }
        }
    }
}
