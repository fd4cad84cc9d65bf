//! algos::traits — the iterate/update/check contract shared by all learning
//! algorithms, and its Running/Stopped state machine.
//!
//! Drivers step an algorithm with
//!
//! ```ignore
//! while algo.next().is_some() {
//!     algo.update(&x, &y)?;
//!     algo.check(step >= budget);
//! }
//! ```
//!
//! A `check(true)` marks the run as stopped; the next call to `next` consumes
//! the flag, returns `None`, and leaves the algorithm Running again so the same
//! instance can be reused for another pass.
use crate::{errors::ErmResult, tensor::types::Tensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Running,
    Stopped,
}

/// Stop flag consumed on the next advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopFlag {
    state: RunState,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Record the outcome of an external stopping condition.
    pub fn check(&mut self, cond: bool) {
        self.state = if cond { RunState::Stopped } else { RunState::Running };
    }

    /// `true` if iteration may continue. A pending stop is consumed and the
    /// flag returns to Running.
    pub fn advance(&mut self) -> bool {
        match self.state {
            RunState::Running => true,
            RunState::Stopped => {
                self.state = RunState::Running;
                false
            }
        }
    }
}

/// An iterative learning algorithm driving a model's parameters.
pub trait Algorithm {
    fn name(&self) -> &str;

    /// Perform one update of the model parameters on the batch `(x, y)`.
    fn update(&mut self, x: &Tensor, y: &Tensor) -> ErmResult<()>;

    /// Set or clear the stop flag from an external condition.
    fn check(&mut self, cond: bool);

    fn state(&self) -> RunState;
}
