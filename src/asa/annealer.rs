//! The client-driven annealing state machine.
//!
//! # Algorithm
//!
//! Each call to [`Annealer::step`] runs, in order:
//!
//! 1. the stop check
//! 2. completion of a pending reanneal (tangent estimate, temperature rescale)
//! 3. the cooling schedule `T_i(k) = T_0,i exp(-c_i k^(1/D))`
//! 4. the acceptance check on the evaluated candidate
//! 5. generation of the next candidate
//! 6. the reanneal test
//!
//! # Reference
//!
//! Ingber, L. (1989). "Very fast simulated re-annealing", *Mathematical and
//! Computer Modelling* 12, 967-973.

use std::path::Path;

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::AsaConfig;
use super::history::History;
use super::types::{AnnealState, AnnealStats, Evaluation, Request};
use crate::error::{AnnealError, Result};
use crate::record::AnnealRecord;

/// Minimum number of steps between two reanneals.
const REANNEAL_MIN_GAP: u64 = 10;

/// Adaptive Simulated Annealing driven by the caller.
///
/// The annealer never evaluates the objective. It tells the caller which
/// point(s) to evaluate through [`request`](Self::request) and takes the
/// results in [`step`](Self::step).
///
/// # Examples
///
/// ```
/// use u_anneal::asa::{AnnealState, Annealer, AsaConfig, Evaluation, Request};
///
/// let config = AsaConfig::default().with_f_x_best_repeat_max(3).with_seed(1);
/// let mut annealer = Annealer::with_config(vec![8.0], &[(-10.0, 10.0)], config).unwrap();
/// annealer.init().unwrap();
///
/// let f = |x: &[f64]| x[0] * x[0];
/// while annealer.state() != AnnealState::ReadyToStop {
///     let evaluation = match annealer.request().unwrap() {
///         Request::Candidate(x) => Evaluation::Candidate(f(x)),
///         Request::ReannealSet { x_plusdelta, .. } => Evaluation::ReannealSet {
///             f_x: None,
///             f_x_plusdelta: f(x_plusdelta),
///         },
///     };
///     annealer.step(evaluation).unwrap();
/// }
/// assert!(annealer.f_x_best() < 64.0);
/// ```
#[derive(Debug, Clone)]
pub struct Annealer {
    config: AsaConfig,
    state: AnnealState,
    dim: usize,
    range_min: Vec<f64>,
    range_max: Vec<f64>,
    param_names: Vec<String>,

    x: Vec<f64>,
    f_x: f64,
    x_cand: Vec<f64>,
    f_x_cand: f64,
    x_best: Vec<f64>,
    f_x_best: f64,
    f_x_best_repeats: u32,
    x_plusdelta: Vec<f64>,
    f_x_plusdelta: f64,

    stats: AnnealStats,
    total_accepted: u64,
    reanneals: u64,
    steps: u64,
    last_reanneal_steps: u64,
    /// Ingber's step count, drives the cooling formula.
    k: u64,
    /// Expected final step count.
    k_f: u64,
    /// Steps since the last reanneal.
    k_r: u64,
    /// Working copy of `config.delta_param`; doubles on a zero tangent.
    delta_param: f64,

    t_k: Vec<f64>,
    t_0: Vec<f64>,
    t_f: Vec<f64>,
    c: Vec<f64>,
    c_cost: Vec<f64>,
    t_cost_0: Vec<f64>,
    t_cost: Vec<f64>,
    tangents: Vec<f64>,

    history: History,
    rng: StdRng,
}

impl Annealer {
    /// Creates an annealer with the default configuration.
    ///
    /// `ranges[i]` is the closed interval `[min, max]` searched in
    /// dimension `i`.
    pub fn new(initial: Vec<f64>, ranges: &[(f64, f64)]) -> Result<Self> {
        Self::with_config(initial, ranges, AsaConfig::default())
    }

    pub fn with_config(initial: Vec<f64>, ranges: &[(f64, f64)], config: AsaConfig) -> Result<Self> {
        if initial.is_empty() {
            return Err(AnnealError::Empty);
        }
        if initial.len() != ranges.len() {
            return Err(AnnealError::DimensionMismatch {
                params: initial.len(),
                ranges: ranges.len(),
            });
        }
        for (index, (&value, &(min, max))) in initial.iter().zip(ranges).enumerate() {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(AnnealError::InvalidRange { index, min, max });
            }
            if !(min..=max).contains(&value) {
                return Err(AnnealError::OutOfRange {
                    index,
                    value,
                    min,
                    max,
                });
            }
        }

        let dim = initial.len();
        let rng = create_rng(config.seed);
        let history = History::new(config.retention);
        Ok(Self {
            delta_param: config.delta_param,
            config,
            state: AnnealState::NeedToInit,
            dim,
            range_min: ranges.iter().map(|r| r.0).collect(),
            range_max: ranges.iter().map(|r| r.1).collect(),
            param_names: Vec::new(),
            x_cand: initial.clone(),
            x_best: initial.clone(),
            x_plusdelta: initial.clone(),
            x: initial,
            f_x: 0.0,
            f_x_cand: 0.0,
            f_x_best: 0.0,
            f_x_best_repeats: 0,
            f_x_plusdelta: 0.0,
            stats: AnnealStats::default(),
            total_accepted: 0,
            reanneals: 0,
            steps: 0,
            last_reanneal_steps: 0,
            k: 1,
            k_f: 0,
            k_r: 0,
            t_k: Vec::new(),
            t_0: Vec::new(),
            t_f: Vec::new(),
            c: Vec::new(),
            c_cost: Vec::new(),
            t_cost_0: Vec::new(),
            t_cost: Vec::new(),
            tangents: Vec::new(),
            history,
            rng,
        })
    }

    /// Replaces the configuration. Only allowed before [`init`](Self::init).
    pub fn set_config(&mut self, config: AsaConfig) -> Result<()> {
        self.expect_state(AnnealState::NeedToInit, "set_config")?;
        self.config = config;
        Ok(())
    }

    /// Names the parameters for [`save`](Self::save). One name per dimension.
    pub fn set_param_names(&mut self, names: Vec<String>) -> Result<()> {
        if names.len() != self.dim {
            return Err(AnnealError::InvalidConfig(format!(
                "expected {} parameter names, got {}",
                self.dim,
                names.len()
            )));
        }
        self.param_names = names;
        Ok(())
    }

    /// Derives the schedule constants from the configuration and asks for
    /// the objective at the initial point.
    pub fn init(&mut self) -> Result<()> {
        self.expect_state(AnnealState::NeedToInit, "init")?;
        self.config.validate().map_err(AnnealError::InvalidConfig)?;

        let d = self.dim as f64;
        let worst = if self.config.downhill {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        self.f_x = worst;
        self.f_x_best = worst;
        self.f_x_cand = worst;
        self.f_x_plusdelta = worst;
        self.x_cand.clone_from(&self.x);
        self.x_best.clone_from(&self.x);

        let m = -self.config.temperature_ratio_scale.ln();
        let n = self.config.temperature_anneal_scale.ln();
        self.t_0 = vec![1.0; self.dim];
        self.t_k = self.t_0.clone();
        self.c = vec![m * (-n / d).exp(); self.dim];
        self.t_f = self.t_0.iter().map(|t| t * (-m).exp()).collect();
        self.k_f = n.exp().round() as u64;
        self.c_cost = self
            .c
            .iter()
            .map(|c| c * self.config.cost_parameter_scale_ratio)
            .collect();
        self.t_cost_0 = self.c_cost.clone();
        self.t_cost = self.c_cost.clone();
        self.tangents = vec![1.0; self.dim];

        self.delta_param = self.config.delta_param;
        self.history = History::new(self.config.retention);
        self.rng = create_rng(self.config.seed);
        self.stats = AnnealStats::default();
        self.k = 1;
        self.k_r = 0;

        debug!(
            "annealer initialised: D = {}, c = {:.6}, c_cost = {:.6}, T_f = {:.3e}, k_f = {}",
            self.dim, self.c[0], self.c_cost[0], self.t_f[0], self.k_f
        );
        self.state = AnnealState::NeedToCompute;
        Ok(())
    }

    /// The points the caller must evaluate before the next step, if any.
    pub fn request(&self) -> Option<Request<'_>> {
        match self.state {
            AnnealState::NeedToCompute => Some(Request::Candidate(&self.x_cand)),
            AnnealState::NeedToComputeSet => Some(Request::ReannealSet {
                x: &self.x,
                x_plusdelta: &self.x_plusdelta,
            }),
            _ => None,
        }
    }

    /// Feeds back the requested objective values and advances one step.
    ///
    /// Returns the new state. Once it is [`AnnealState::ReadyToStop`] the
    /// run is over and further calls are a protocol error.
    pub fn step(&mut self, evaluation: Evaluation) -> Result<AnnealState> {
        let completing_reanneal = match (self.state, evaluation) {
            (AnnealState::NeedToCompute, Evaluation::Candidate(f)) => {
                check_objective(f)?;
                self.f_x_cand = f;
                false
            }
            (
                AnnealState::NeedToComputeSet,
                Evaluation::ReannealSet {
                    f_x,
                    f_x_plusdelta,
                },
            ) => {
                check_objective(f_x_plusdelta)?;
                if let Some(f) = f_x {
                    check_objective(f)?;
                    self.f_x = f;
                }
                self.f_x_plusdelta = f_x_plusdelta;
                true
            }
            (state @ (AnnealState::NeedToCompute | AnnealState::NeedToComputeSet), other) => {
                return Err(AnnealError::Protocol(format!(
                    "state {state:?} cannot accept {other:?}"
                )));
            }
            (state, _) => {
                return Err(AnnealError::Protocol(format!(
                    "step() called in state {state:?}"
                )));
            }
        };
        self.state = AnnealState::NeedToStep;

        self.steps += 1;
        if let Some(reason) = self.stop_check() {
            info!(
                "annealing finished after {} steps ({reason}); best objective {}",
                self.steps, self.f_x_best
            );
            self.state = AnnealState::ReadyToStop;
            return Ok(self.state);
        }

        if completing_reanneal {
            self.complete_reanneal()?;
        }

        self.cooling_schedule();
        // No fresh candidate was evaluated on a reanneal step.
        if !completing_reanneal {
            self.acceptance_check();
        }
        self.generate_next()?;
        self.k += 1;
        self.k_r += 1;

        self.state = if self.config.enable_reanneal && self.reanneal_test() {
            AnnealState::NeedToComputeSet
        } else {
            AnnealState::NeedToCompute
        };
        Ok(self.state)
    }

    /// Writes the run history and best point as a JSON record.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.record().save(path)
    }

    /// Snapshot of the persisted part of the run.
    pub fn record(&self) -> AnnealRecord {
        let (param_hist_accepted, f_param_hist_accepted) = self.history.accepted().to_vecs();
        let (param_hist_rejected, f_param_hist_rejected) = self.history.rejected().to_vecs();
        AnnealRecord {
            param_names: self.param_names.clone(),
            param_hist_accepted,
            f_param_hist_accepted,
            param_hist_rejected,
            f_param_hist_rejected,
            x_best: self.x_best.clone(),
            f_x_best: self.f_x_best,
        }
    }

    pub fn state(&self) -> AnnealState {
        self.state
    }

    pub fn config(&self) -> &AsaConfig {
        &self.config
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn ranges(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.range_min.iter().copied().zip(self.range_max.iter().copied())
    }

    /// Current accepted point.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn f_x(&self) -> f64 {
        self.f_x
    }

    /// Candidate awaiting evaluation.
    pub fn x_cand(&self) -> &[f64] {
        &self.x_cand
    }

    pub fn x_best(&self) -> &[f64] {
        &self.x_best
    }

    pub fn f_x_best(&self) -> f64 {
        self.f_x_best
    }

    pub fn f_x_best_repeats(&self) -> u32 {
        self.f_x_best_repeats
    }

    /// Perturbed point used to estimate tangents during a reanneal.
    pub fn x_plusdelta(&self) -> &[f64] {
        &self.x_plusdelta
    }

    /// Parameter temperatures `T_i(k)`.
    pub fn temperatures(&self) -> &[f64] {
        &self.t_k
    }

    /// Expected final temperatures `T_i(k_f)`.
    pub fn final_temperatures(&self) -> &[f64] {
        &self.t_f
    }

    /// Acceptance temperatures `T_cost`.
    pub fn cost_temperatures(&self) -> &[f64] {
        &self.t_cost
    }

    /// Tangents from the last reanneal.
    pub fn tangents(&self) -> &[f64] {
        &self.tangents
    }

    pub fn delta_param(&self) -> f64 {
        self.delta_param
    }

    pub fn stats(&self) -> AnnealStats {
        self.stats
    }

    /// Accepted candidates over the whole run.
    pub fn total_accepted(&self) -> u64 {
        self.total_accepted
    }

    pub fn reanneals(&self) -> u64 {
        self.reanneals
    }

    /// Calls to `step` so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn k(&self) -> u64 {
        self.k
    }

    pub fn k_f(&self) -> u64 {
        self.k_f
    }

    pub fn k_r(&self) -> u64 {
        self.k_r
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    fn expect_state(&self, expected: AnnealState, op: &str) -> Result<()> {
        if self.state != expected {
            return Err(AnnealError::Protocol(format!(
                "{op}() requires state {expected:?}, found {:?}",
                self.state
            )));
        }
        Ok(())
    }

    fn improves(&self, candidate: f64, reference: f64) -> bool {
        if self.config.downhill {
            candidate < reference
        } else {
            candidate > reference
        }
    }

    fn is_degenerate(&self, i: usize) -> bool {
        self.range_min[i] == self.range_max[i]
    }

    fn cooling_schedule(&mut self) {
        let inv_d = 1.0 / self.dim as f64;
        let k_pow = (self.k as f64).powf(inv_d);
        let acc_pow = (self.stats.num_accepted as f64).powf(inv_d);
        for i in 0..self.dim {
            self.t_k[i] = self.t_0[i] * (-self.c[i] * k_pow).exp();
            self.t_cost[i] = self.t_cost_0[i] * (-self.c_cost[i] * acc_pow).exp();
        }
        debug!(
            "T_i(k={} [{}]) = {:.6e} [T_f = {:.3e}]; T_cost(n_acc={}) = {:.6e}",
            self.k, self.k_f, self.t_k[0], self.t_f[0], self.stats.num_accepted, self.t_cost[0]
        );
    }

    fn acceptance_check(&mut self) {
        let better = self.improves(self.f_x_cand, self.f_x);
        if better {
            self.stats.num_improved += 1;
        } else {
            self.stats.num_worse += 1;
        }

        let delta = if self.config.downhill {
            self.f_x_cand - self.f_x
        } else {
            self.f_x - self.f_x_cand
        };
        let p = (-delta / (f64::EPSILON + mean(&self.t_cost))).exp();
        let u: f64 = self.rng.random();
        let accepted = p > u;
        trace!(
            "candidate {} p = {p:.4e}, delta = {delta:.4e}, accepted = {accepted}",
            if better { "better" } else { "worse" }
        );

        if !accepted {
            self.history.push_rejected(&self.x, self.f_x);
            return;
        }
        if !better {
            self.stats.num_worse_accepted += 1;
        }
        self.x.clone_from(&self.x_cand);
        self.f_x = self.f_x_cand;
        self.history.push_accepted(&self.x, self.f_x);

        if self.f_x_cand == self.f_x_best {
            self.f_x_best_repeats += 1;
        }
        if self.improves(self.f_x_cand, self.f_x_best) {
            self.x_best.clone_from(&self.x_cand);
            self.f_x_best = self.f_x_cand;
            self.f_x_best_repeats = 0;
        }
        self.stats.num_accepted += 1;
        self.total_accepted += 1;
    }

    /// Draws a new `x_cand` near `x` from the ASA generating distribution,
    /// redrawing the whole vector until every coordinate is in bounds.
    fn generate_next(&mut self) -> Result<()> {
        let attempts = self.config.max_generate_attempts;
        let mut cand = vec![0.0; self.dim];
        'draw: for _ in 0..attempts {
            for (i, value) in cand.iter_mut().enumerate() {
                let (lo, hi) = (self.range_min[i], self.range_max[i]);
                if lo == hi {
                    *value = lo;
                    continue;
                }
                let u: f64 = self.rng.random();
                let u2 = (2.0 * u - 1.0).abs();
                let t = self.t_k[i];
                let y = (u - 0.5).signum() * t * ((1.0 + 1.0 / t).powf(u2) - 1.0);
                let v = self.x[i] + y;
                if v < lo || v > hi {
                    continue 'draw;
                }
                *value = v;
            }
            self.x_cand = cand;
            return Ok(());
        }
        Err(AnnealError::GenerationExhausted { attempts })
    }

    /// Point near `x` for tangent estimation: `x * (1 + delta_param)`, or
    /// `x * (1 - delta_param)` where the former leaves the range.
    fn generate_delta_parameter(&self) -> Vec<f64> {
        let delta = self.delta_param;
        self.x
            .iter()
            .enumerate()
            .map(|(i, &xi)| {
                let (lo, hi) = (self.range_min[i], self.range_max[i]);
                let up = xi * (1.0 + delta);
                if (lo..=hi).contains(&up) {
                    return up;
                }
                let down = xi * (1.0 - delta);
                if (lo..=hi).contains(&down) {
                    return down;
                }
                // Both overshoot: take whichever clamped point moves further.
                let (up, down) = (up.clamp(lo, hi), down.clamp(lo, hi));
                if (up - xi).abs() >= (down - xi).abs() {
                    up
                } else {
                    down
                }
            })
            .collect()
    }

    fn reanneal_test(&mut self) -> bool {
        if self.steps.saturating_sub(self.last_reanneal_steps) < REANNEAL_MIN_GAP {
            return false;
        }
        if self.k_r < self.config.reanneal_after_steps
            && self.stats.accepted_vs_generated() >= self.config.acc_gen_reanneal_ratio
        {
            return false;
        }

        self.x.clone_from(&self.x_best);
        self.f_x = self.f_x_best;
        self.x_plusdelta = self.generate_delta_parameter();
        info!(
            "reannealing at step {} (k = {}, k_r = {}, accepted/generated = {:.3e})",
            self.steps,
            self.k,
            self.k_r,
            self.stats.accepted_vs_generated()
        );
        true
    }

    /// Rescales the parameter temperatures from the tangents at the best
    /// point and moves `k` to match.
    fn complete_reanneal(&mut self) -> Result<()> {
        self.last_reanneal_steps = self.steps;

        let active: Vec<usize> = (0..self.dim).filter(|&i| !self.is_degenerate(i)).collect();
        if active.is_empty() {
            self.reset_stats();
            return Ok(());
        }

        let df = self.f_x_plusdelta - self.f_x;
        for &i in &active {
            let tangent = df / (self.x_plusdelta[i] - self.x[i] + f64::EPSILON);
            if !tangent.is_finite() {
                return Err(AnnealError::NonFiniteTangent {
                    index: i,
                    value: tangent,
                });
            }
            self.tangents[i] = tangent;
        }

        if active.iter().any(|&i| self.tangents[i] == 0.0) {
            warn!(
                "zero tangent; doubling delta_param from {} to {}",
                self.delta_param,
                self.delta_param * 2.0
            );
            self.delta_param *= 2.0;
            return Ok(());
        }

        let max_tangent = active
            .iter()
            .map(|&i| self.tangents[i].abs())
            .fold(0.0, f64::max);
        let mut t_re = self.t_k.clone();
        for &i in &active {
            let t = (self.t_k[i] * (max_tangent / self.tangents[i])).abs();
            if !(t.is_finite() && t > 0.0) {
                return Err(AnnealError::NonPositiveTemperature { index: i, value: t });
            }
            t_re[i] = t;
        }

        let d = self.dim as i32;
        let k_re = (0..self.dim)
            .map(|i| ((self.t_0[i] / t_re[i]).ln().max(0.0) / self.c[i]).powi(d))
            .sum::<f64>()
            / self.dim as f64;
        let k_re = k_re as u64;

        info!(
            "reanneal done: mean T_i(k) {:.5e} -> {:.5e}, k {} -> {}",
            mean(&self.t_k),
            mean(&t_re),
            self.k,
            k_re
        );
        self.k = k_re;
        self.t_k = t_re;
        self.reanneals += 1;
        self.reset_stats();
        Ok(())
    }

    fn stop_check(&self) -> Option<&'static str> {
        if self.config.exit_at_t_f && self.t_k.iter().zip(&self.t_f).all(|(t, f)| t < f) {
            return Some("temperatures reached T_f");
        }
        if self.t_k[0] <= f64::EPSILON {
            return Some("parameter temperature exhausted");
        }
        if self.t_cost[0] <= f64::EPSILON {
            return Some("cost temperature exhausted");
        }
        if self.f_x_best_repeats >= self.config.f_x_best_repeat_max {
            return Some("best objective repeated");
        }
        if self.config.max_steps > 0 && self.steps >= self.config.max_steps {
            return Some("step limit reached");
        }
        if self.config.max_accepted > 0 && self.total_accepted >= self.config.max_accepted {
            return Some("accepted limit reached");
        }
        None
    }

    fn reset_stats(&mut self) {
        self.stats = AnnealStats::default();
        self.f_x_best_repeats = 0;
        self.k_r = 0;
    }
}

fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::random()),
    }
}

fn check_objective(f: f64) -> Result<()> {
    if f.is_nan() {
        return Err(AnnealError::NanObjective);
    }
    Ok(())
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}
