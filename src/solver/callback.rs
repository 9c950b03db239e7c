use std::fmt;

use serde::Serialize;

use crate::domain::solution::Solution;

/// Phase of the search reported to the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    InitialAssign,
    RegretReassign,
    LocalSearch,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::InitialAssign => "initial assign",
            Phase::RegretReassign => "regret reassign",
            Phase::LocalSearch => "local search",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueResult {
    KeepGoing,
    /// Stop and return the best solution. Ignored until a solution exists.
    FinishNow,
    /// Abort immediately, possibly without a solution.
    UserCancelled,
}

/// Progress hook polled at every phase boundary.
pub trait ContinueCallback {
    fn continue_solving(
        &mut self,
        step: u64,
        phase: Phase,
        best: Option<&Solution>,
    ) -> ContinueResult;
}

/// Adapts a closure into a [`ContinueCallback`].
pub struct FnCallback<F>(F);

pub fn from_fn<F>(f: F) -> FnCallback<F>
where
    F: FnMut(u64, Phase, Option<&Solution>) -> ContinueResult,
{
    FnCallback(f)
}

impl<F> ContinueCallback for FnCallback<F>
where
    F: FnMut(u64, Phase, Option<&Solution>) -> ContinueResult,
{
    fn continue_solving(
        &mut self,
        step: u64,
        phase: Phase,
        best: Option<&Solution>,
    ) -> ContinueResult {
        (self.0)(step, phase, best)
    }
}

/// Keeps going for a fixed number of steps, then asks to finish.
#[derive(Debug, Clone, Copy)]
pub struct StepLimit {
    pub max_steps: u64,
}

impl StepLimit {
    pub fn new(max_steps: u64) -> Self {
        Self { max_steps }
    }
}

impl ContinueCallback for StepLimit {
    fn continue_solving(
        &mut self,
        step: u64,
        _phase: Phase,
        _best: Option<&Solution>,
    ) -> ContinueResult {
        if step < self.max_steps {
            ContinueResult::KeepGoing
        } else {
            ContinueResult::FinishNow
        }
    }
}
