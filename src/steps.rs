//! Workflow steps
//!
//! Checkout and quotation submission are fixed sequences of collaborator calls. Each step is
//! either critical (its failure aborts the workflow) or best-effort (its failure is logged and
//! reported alongside an otherwise successful result).

use std::{fmt::Display, future::Future};

use tracing::warn;
use uuid::Uuid;

use crate::collaborators::CollaboratorError;

/// How a step's failure affects the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Failure aborts the workflow.
    Critical,

    /// Failure is recorded and the workflow continues.
    BestEffort,
}

/// A failed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure<S> {
    /// Step that failed
    pub step: S,

    /// Why it failed
    pub error: CollaboratorError,
}

/// How each step of a workflow treats failure.
///
/// Seeded from a workflow's step table; steps missing from the table are critical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPolicy<S> {
    table: Vec<(S, Criticality)>,
}

impl<S> StepPolicy<S>
where
    S: Copy + Eq + Display,
{
    /// A policy following `table`.
    pub fn new(table: &[(S, Criticality)]) -> Self {
        Self {
            table: table.to_vec(),
        }
    }

    /// How a failure of `step` is treated
    pub fn criticality(&self, step: S) -> Criticality {
        self.table
            .iter()
            .find(|(candidate, _)| *candidate == step)
            .map_or(Criticality::Critical, |(_, criticality)| *criticality)
    }

    /// The same policy with `step` treated as `criticality`.
    #[must_use]
    pub fn with(mut self, step: S, criticality: Criticality) -> Self {
        match self.table.iter_mut().find(|(candidate, _)| *candidate == step) {
            Some(entry) => entry.1 = criticality,
            None => self.table.push((step, criticality)),
        }

        self
    }

    /// Applies the policy to a finished step.
    ///
    /// Success yields the value. A best-effort failure is logged, pushed onto `failures` and
    /// yields `None`; a critical failure is returned for the caller to turn into a rejection.
    pub(crate) fn settle<T>(
        &self,
        step: S,
        correlation_id: Uuid,
        failures: &mut Vec<StepFailure<S>>,
        result: Result<T, CollaboratorError>,
    ) -> Result<Option<T>, StepFailure<S>> {
        match (result, self.criticality(step)) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(error), Criticality::BestEffort) => {
                record_failure(step, correlation_id, failures, error);
                Ok(None)
            }
            (Err(error), Criticality::Critical) => Err(StepFailure { step, error }),
        }
    }

    /// Awaits `call` and settles its result.
    pub(crate) async fn run<T, F>(
        &self,
        step: S,
        correlation_id: Uuid,
        failures: &mut Vec<StepFailure<S>>,
        call: F,
    ) -> Result<Option<T>, StepFailure<S>>
    where
        F: Future<Output = Result<T, CollaboratorError>>,
    {
        let result = call.await;

        self.settle(step, correlation_id, failures, result)
    }
}

/// Runs a side effect whose failure never undoes the change it follows.
pub(crate) async fn best_effort<S, F>(
    step: S,
    correlation_id: Uuid,
    failures: &mut Vec<StepFailure<S>>,
    call: F,
) where
    S: Copy + Display,
    F: Future<Output = Result<(), CollaboratorError>>,
{
    if let Err(error) = call.await {
        record_failure(step, correlation_id, failures, error);
    }
}

fn record_failure<S>(
    step: S,
    correlation_id: Uuid,
    failures: &mut Vec<StepFailure<S>>,
    error: CollaboratorError,
) where
    S: Copy + Display,
{
    warn!(
        step = %step,
        correlation_id = %correlation_id,
        %error,
        "best-effort step failed"
    );

    failures.push(StepFailure { step, error });
}
