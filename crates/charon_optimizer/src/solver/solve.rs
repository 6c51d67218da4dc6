use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use jiff::SignedDuration;
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{
    model::route_model::RouteModel,
    solver::{decision::DecisionAssignment, params::SolverParams},
};

/// The three solver outcomes besides success. They are distinct and never
/// interchangeable: an infeasible instance stays infeasible on retry, while
/// a timed-out or cancelled solve may be retried with a larger budget.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("no feasible assignment exists for {num_requests} requests and {num_vehicles} vehicles")]
    Infeasible {
        num_requests: usize,
        num_vehicles: usize,
    },
    #[error("solver exceeded its time budget of {budget}")]
    TimedOut { budget: SignedDuration },
    #[error("solve was cancelled")]
    Cancelled,
}

/// Shared state a backend must poll while solving: the wall-clock deadline
/// and the cooperative stop flag.
pub struct SolveContext {
    deadline: Option<Instant>,
    budget: Option<SignedDuration>,
    stop: Arc<AtomicBool>,
}

impl SolveContext {
    pub fn new(params: &SolverParams, stop: Arc<AtomicBool>) -> Self {
        let deadline = params
            .time_limit
            .map(|limit| Instant::now() + Duration::from_secs_f64(limit.as_secs_f64().max(0.0)));

        SolveContext {
            deadline,
            budget: params.time_limit,
            stop,
        }
    }

    pub fn unbounded() -> Self {
        SolveContext {
            deadline: None,
            budget: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns the error to surface if the solve should be aborted now.
    pub fn check(&self) -> Result<(), SolveError> {
        if self.is_cancelled() {
            return Err(SolveError::Cancelled);
        }
        if self.is_expired() {
            return Err(SolveError::TimedOut {
                budget: self.budget.expect("expired context has a budget"),
            });
        }
        Ok(())
    }
}

/// External collaborator contract: given the immutable model, produce a
/// feasible assignment of all variables or report why none was produced.
pub trait ModelSolver {
    fn solve(
        &self,
        model: &RouteModel,
        context: &SolveContext,
    ) -> Result<DecisionAssignment, SolveError>;
}

#[derive(Copy, Clone, Debug, Serialize, PartialEq, Eq)]
pub enum SolverStatus {
    Pending,
    Running,
    Completed,
}

/// Wraps a backend into a single synchronous, cancellable solve unit.
pub struct Solver<S> {
    backend: S,
    status: RwLock<SolverStatus>,
    stop: Arc<AtomicBool>,
}

impl<S: ModelSolver> Solver<S> {
    pub fn new(backend: S) -> Self {
        Solver {
            backend,
            status: RwLock::new(SolverStatus::Pending),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn solve(
        &self,
        model: &RouteModel,
        params: &SolverParams,
    ) -> Result<DecisionAssignment, SolveError> {
        *self.status.write() = SolverStatus::Running;
        info!(
            variables = model.num_variables(),
            constraints = model.constraints().len(),
            "solve started"
        );

        let context = SolveContext::new(params, Arc::clone(&self.stop));
        let result = self.backend.solve(model, &context);

        *self.status.write() = SolverStatus::Completed;
        match &result {
            Ok(_) => info!("solve finished with a feasible assignment"),
            Err(error) => info!(%error, "solve finished without an assignment"),
        }

        result
    }

    /// Requests cooperative cancellation of a running solve.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn status(&self) -> SolverStatus {
        *self.status.read()
    }
}
