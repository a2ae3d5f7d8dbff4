//! Conditional edges: a closed decision enum chosen from the state, mapped to a node id.

use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::RagError;

/// Closed set of outgoing labels for a conditional edge.
///
/// `ALL` lists every variant so `StateGraph::compile` can check that each one maps to a
/// registered node; the mapping itself is a `match`, so adding a variant without a target
/// fails to build.
pub trait Decision: Copy + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    /// Label used in logs.
    fn as_str(&self) -> &'static str;
}

/// Decision function evaluated after a node (or at START) to pick the next node.
///
/// May be async: routing can consult the judgment oracle.
#[async_trait]
pub trait EdgeCondition<S>: Send + Sync {
    type Decision: Decision;

    async fn decide(&self, state: &S) -> Result<Self::Decision, RagError>;
}

/// Type-erased conditional edge stored by the graph.
#[async_trait]
pub(crate) trait Branch<S>: Send + Sync {
    /// Evaluates the condition; returns (decision label, target node id).
    async fn next(&self, state: &S) -> Result<(&'static str, &'static str), RagError>;

    /// Every target reachable through this branch.
    fn targets(&self) -> Vec<&'static str>;
}

pub(crate) struct ConditionalEdge<S, C>
where
    C: EdgeCondition<S>,
{
    condition: C,
    targets: fn(C::Decision) -> &'static str,
    _state: PhantomData<fn(&S)>,
}

impl<S, C> ConditionalEdge<S, C>
where
    C: EdgeCondition<S>,
{
    pub(crate) fn new(condition: C, targets: fn(C::Decision) -> &'static str) -> Self {
        Self {
            condition,
            targets,
            _state: PhantomData,
        }
    }
}

#[async_trait]
impl<S, C> Branch<S> for ConditionalEdge<S, C>
where
    S: Send + Sync,
    C: EdgeCondition<S>,
{
    async fn next(&self, state: &S) -> Result<(&'static str, &'static str), RagError> {
        let decision = self.condition.decide(state).await?;
        Ok((decision.as_str(), (self.targets)(decision)))
    }

    fn targets(&self) -> Vec<&'static str> {
        <C::Decision as Decision>::ALL
            .iter()
            .map(|d| (self.targets)(*d))
            .collect()
    }
}
