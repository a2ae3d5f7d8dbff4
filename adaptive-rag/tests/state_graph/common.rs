//! Shared state and nodes for state graph integration tests.

use async_trait::async_trait;

use adaptive_rag::{Decision, EdgeCondition, GraphState, Node, RagError};

/// Appends node names; `done` is overwritten.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    pub visited: Vec<String>,
    pub done: bool,
}

#[derive(Clone, Debug)]
pub struct TallyUpdate {
    pub visited: String,
    pub done: Option<bool>,
}

impl GraphState for Tally {
    type Update = TallyUpdate;

    fn apply(&mut self, update: TallyUpdate) {
        self.visited.push(update.visited);
        if let Some(done) = update.done {
            self.done = done;
        }
    }
}

/// Records its own name; optionally marks the tally done.
pub struct Push {
    pub name: &'static str,
    pub finish: bool,
}

impl Push {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            finish: false,
        }
    }

    pub fn finishing(name: &'static str) -> Self {
        Self { name, finish: true }
    }
}

#[async_trait]
impl Node<Tally> for Push {
    fn id(&self) -> &str {
        self.name
    }

    async fn run(&self, _state: &Tally) -> Result<TallyUpdate, RagError> {
        Ok(TallyUpdate {
            visited: self.name.to_string(),
            done: self.finish.then_some(true),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Next {
    Again,
    Stop,
}

impl Decision for Next {
    const ALL: &'static [Self] = &[Next::Again, Next::Stop];

    fn as_str(&self) -> &'static str {
        match self {
            Next::Again => "again",
            Next::Stop => "stop",
        }
    }
}

/// Loops until the tally is done.
pub struct UntilDone;

#[async_trait]
impl EdgeCondition<Tally> for UntilDone {
    type Decision = Next;

    async fn decide(&self, state: &Tally) -> Result<Next, RagError> {
        Ok(if state.done { Next::Stop } else { Next::Again })
    }
}

/// Decision type with no variants.
#[derive(Clone, Copy, Debug)]
pub enum Never {}

impl Decision for Never {
    const ALL: &'static [Self] = &[];

    fn as_str(&self) -> &'static str {
        match *self {}
    }
}

pub struct NeverDecides;

#[async_trait]
impl EdgeCondition<Tally> for NeverDecides {
    type Decision = Never;

    async fn decide(&self, _state: &Tally) -> Result<Never, RagError> {
        Err(RagError::ExecutionFailed("no decision".into()))
    }
}
