//! ASA execution loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::annealer::Annealer;
use super::config::AsaConfig;
use super::types::{AnnealState, AsaProblem, Evaluation, Request};
use crate::error::Result;

/// Steps between two samples of the best objective in `cost_history`.
const HISTORY_INTERVAL: u64 = 100;

/// Result of an ASA run.
#[derive(Debug, Clone)]
pub struct AsaResult {
    /// The best parameters found.
    pub best: Vec<f64>,

    /// Objective at `best`.
    pub best_cost: f64,

    /// Calls to `Annealer::step`.
    pub steps: u64,

    /// Objective evaluations performed.
    pub evaluations: u64,

    /// Completed reanneals.
    pub reanneals: u64,

    /// Accepted candidates over the whole run.
    pub accepted: u64,

    /// Parameter temperatures when the run stopped.
    pub final_temperatures: Vec<f64>,

    /// Whether cancelled externally.
    pub cancelled: bool,

    /// Best objective sampled at regular intervals.
    pub cost_history: Vec<f64>,

    /// The annealer in its final state, e.g. for [`Annealer::save`].
    pub annealer: Annealer,
}

/// Drives an [`Annealer`] against an [`AsaProblem`] until it stops.
pub struct AsaRunner;

impl AsaRunner {
    /// Runs ASA optimization.
    pub fn run<P: AsaProblem>(problem: &P, config: &AsaConfig) -> Result<AsaResult> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs ASA with an optional cancellation token, checked between steps.
    pub fn run_with_cancel<P: AsaProblem>(
        problem: &P,
        config: &AsaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<AsaResult> {
        let mut annealer =
            Annealer::with_config(problem.initial_params(), &problem.ranges(), config.clone())?;
        if let Some(names) = problem.param_names() {
            annealer.set_param_names(names)?;
        }
        annealer.init()?;

        let mut evaluations = 0u64;
        let mut cancelled = false;
        let mut cost_history = Vec::new();

        loop {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }

            let evaluation = match annealer.request() {
                Some(Request::Candidate(x)) => {
                    evaluations += 1;
                    Evaluation::Candidate(problem.objective(x))
                }
                Some(Request::ReannealSet { x, x_plusdelta }) => {
                    let (f_x, f_x_plusdelta) = evaluate_reanneal_set(problem, x, x_plusdelta);
                    evaluations += 1 + u64::from(f_x.is_some());
                    Evaluation::ReannealSet { f_x, f_x_plusdelta }
                }
                None => break,
            };

            let state = annealer.step(evaluation)?;
            if annealer.steps() % HISTORY_INTERVAL == 0 {
                cost_history.push(annealer.f_x_best());
            }
            if state == AnnealState::ReadyToStop {
                break;
            }
        }

        // Final history entry
        if cost_history
            .last()
            .is_none_or(|&last| last != annealer.f_x_best())
        {
            cost_history.push(annealer.f_x_best());
        }

        Ok(AsaResult {
            best: annealer.x_best().to_vec(),
            best_cost: annealer.f_x_best(),
            steps: annealer.steps(),
            evaluations,
            reanneals: annealer.reanneals(),
            accepted: annealer.total_accepted(),
            final_temperatures: annealer.temperatures().to_vec(),
            cancelled,
            cost_history,
            annealer,
        })
    }
}

/// Evaluates both reanneal points in parallel. A fresh `f_x` costs no extra
/// wall time here, so the restored best point is re-evaluated.
#[cfg(feature = "parallel")]
fn evaluate_reanneal_set<P: AsaProblem>(
    problem: &P,
    x: &[f64],
    x_plusdelta: &[f64],
) -> (Option<f64>, f64) {
    let (f_x, f_x_plusdelta) =
        rayon::join(|| problem.objective(x), || problem.objective(x_plusdelta));
    (Some(f_x), f_x_plusdelta)
}

/// Evaluates only `x_plusdelta`; the annealer reuses its cached best
/// objective for `x`.
#[cfg(not(feature = "parallel"))]
fn evaluate_reanneal_set<P: AsaProblem>(
    problem: &P,
    _x: &[f64],
    x_plusdelta: &[f64],
) -> (Option<f64>, f64) {
    (None, problem.objective(x_plusdelta))
}
