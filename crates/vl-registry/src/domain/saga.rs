//! # Saga Runner
//!
//! The ledger applies single-key writes atomically but offers no multi-key
//! transaction. Multi-entity operations are therefore written as an ordered
//! list of steps, each with an optional compensating step:
//!
//! ```text
//! forward[0] ──→ forward[1] ──→ forward[2] ──✗
//!                                            │
//!      compensate[0] ←── compensate[1] ←─────┘
//! ```
//!
//! On the first failing forward step, the compensations of the steps that
//! already completed run in reverse order. If every compensation succeeds the
//! caller sees the original error. If any compensation fails, the caller sees
//! [`RegistryError::CompensationFailure`]; the remaining compensations are
//! still attempted.

use crate::domain::errors::RegistryError;
use tracing::{error, warn};

type StepFn<'a, C> = Box<dyn FnMut(&mut C) -> Result<(), RegistryError> + 'a>;

struct SagaStep<'a, C> {
    name: &'static str,
    forward: StepFn<'a, C>,
    compensate: Option<StepFn<'a, C>>,
}

/// Ordered list of (forward, compensate) pairs over a context `C`.
pub struct Saga<'a, C> {
    name: &'static str,
    steps: Vec<SagaStep<'a, C>>,
}

impl<'a, C> Saga<'a, C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Appends a reversible step.
    pub fn step<F, G>(mut self, name: &'static str, forward: F, compensate: G) -> Self
    where
        F: FnMut(&mut C) -> Result<(), RegistryError> + 'a,
        G: FnMut(&mut C) -> Result<(), RegistryError> + 'a,
    {
        self.steps.push(SagaStep {
            name,
            forward: Box::new(forward),
            compensate: Some(Box::new(compensate)),
        });
        self
    }

    /// Appends a step with nothing to undo. Only sensible as the last step.
    pub fn final_step<F>(mut self, name: &'static str, forward: F) -> Self
    where
        F: FnMut(&mut C) -> Result<(), RegistryError> + 'a,
    {
        self.steps.push(SagaStep {
            name,
            forward: Box::new(forward),
            compensate: None,
        });
        self
    }

    pub fn run(mut self, ctx: &mut C) -> Result<(), RegistryError> {
        for idx in 0..self.steps.len() {
            if let Err(cause) = (self.steps[idx].forward)(ctx) {
                let failed = self.steps[idx].name;
                warn!(
                    saga = self.name,
                    step = failed,
                    error = %cause,
                    "saga step failed, compensating {} completed step(s)",
                    idx
                );
                return Err(self.unwind(idx, failed, cause, ctx));
            }
        }
        Ok(())
    }

    fn unwind(
        &mut self,
        completed: usize,
        failed: &'static str,
        cause: RegistryError,
        ctx: &mut C,
    ) -> RegistryError {
        let saga = self.name;
        let mut compensation_error = None;

        for step in self.steps[..completed].iter_mut().rev() {
            let Some(compensate) = step.compensate.as_mut() else {
                continue;
            };
            if let Err(err) = compensate(ctx) {
                error!(
                    saga,
                    step = step.name,
                    error = %err,
                    "compensation failed, ledger state possibly inconsistent"
                );
                compensation_error.get_or_insert(err);
            }
        }

        match compensation_error {
            Some(compensation) => RegistryError::CompensationFailure {
                step: failed.to_string(),
                cause: Box::new(cause),
                compensation: Box::new(compensation),
            },
            None => cause,
        }
    }
}
