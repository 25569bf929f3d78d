//! Protocol types shared by the annealer and its callers.

use serde::{Deserialize, Serialize};

/// What an [`Annealer`](super::Annealer) needs from its caller next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnnealState {
    #[default]
    Unknown,
    /// `init()` must be called.
    NeedToInit,
    /// The caller's evaluation has been absorbed and the step is running.
    NeedToStep,
    /// Evaluate the objective at `x_cand`.
    NeedToCompute,
    /// Evaluate the objective at `x_plusdelta` (and optionally at `x`) so
    /// the reanneal can complete.
    NeedToComputeSet,
    /// The run has finished.
    ReadyToStop,
}

/// The points the caller must evaluate before the next `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request<'a> {
    /// Evaluate the candidate; answer with [`Evaluation::Candidate`].
    Candidate(&'a [f64]),
    /// Evaluate `x_plusdelta` (and `x`, if not reusing the cached best);
    /// answer with [`Evaluation::ReannealSet`].
    ReannealSet {
        x: &'a [f64],
        x_plusdelta: &'a [f64],
    },
}

/// Objective values fed back into [`Annealer::step`](super::Annealer::step).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Objective at the requested candidate.
    Candidate(f64),
    /// Objectives for a reanneal. `f_x` is the objective at the restored
    /// best point; `None` reuses the cached best objective.
    ReannealSet { f_x: Option<f64>, f_x_plusdelta: f64 },
}

/// Acceptance statistics since the last reanneal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnealStats {
    /// Candidates better than the current point.
    pub num_improved: u64,
    /// Candidates no better than the current point.
    pub num_worse: u64,
    /// Worse candidates that were accepted anyway.
    pub num_worse_accepted: u64,
    /// Accepted candidates. `k_cost` in Ingber's papers.
    pub num_accepted: u64,
}

impl AnnealStats {
    /// Accepted vs. generated ratio. NaN before anything was generated.
    pub fn accepted_vs_generated(&self) -> f64 {
        self.num_accepted as f64 / (self.num_improved + self.num_worse) as f64
    }
}

/// A continuous objective for [`AsaRunner`](super::AsaRunner).
///
/// The runner plays the caller's role in the annealer protocol: it asks
/// the problem for its start point and bounds, then evaluates whatever the
/// annealer requests.
///
/// # Examples
///
/// ```
/// use u_anneal::asa::AsaProblem;
///
/// struct Sphere;
///
/// impl AsaProblem for Sphere {
///     fn initial_params(&self) -> Vec<f64> { vec![3.0, -2.0] }
///     fn ranges(&self) -> Vec<(f64, f64)> { vec![(-5.0, 5.0); 2] }
///     fn objective(&self, x: &[f64]) -> f64 { x.iter().map(|v| v * v).sum() }
/// }
/// ```
pub trait AsaProblem: Send + Sync {
    /// Starting point, one value per dimension.
    fn initial_params(&self) -> Vec<f64>;

    /// Closed search interval `[min, max]` for each dimension.
    fn ranges(&self) -> Vec<(f64, f64)>;

    /// Objective value at `x`.
    fn objective(&self, x: &[f64]) -> f64;

    /// Human-readable parameter names, saved with the run record.
    fn param_names(&self) -> Option<Vec<String>> {
        None
    }
}
