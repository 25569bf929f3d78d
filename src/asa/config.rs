//! ASA configuration.

use serde::{Deserialize, Serialize};

use super::history::HistoryRetention;

/// Tunable parameters of the adaptive annealing schedule.
///
/// The scale parameters carry the names used in Ingber's ASA code:
///
/// - `m = -ln(temperature_ratio_scale)`
/// - `n = ln(temperature_anneal_scale)`
/// - `c = m * exp(-n / D)`, the cooling control parameter
/// - `c_cost = c * cost_parameter_scale_ratio`
///
/// # Examples
///
/// ```
/// use u_anneal::asa::AsaConfig;
///
/// let config = AsaConfig::default()
///     .with_downhill(true)
///     .with_f_x_best_repeat_max(3)
///     .with_reanneal_after_steps(50)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsaConfig {
    /// Minimize the objective when `true`, maximize when `false`.
    pub downhill: bool,

    /// Ratio of final to initial parameter temperature, in (0, 1).
    pub temperature_ratio_scale: f64,

    /// Expected number of generated points over the run. Sets `n`.
    pub temperature_anneal_scale: f64,

    /// Scales the acceptance (cost) temperature relative to the parameter
    /// temperatures.
    pub cost_parameter_scale_ratio: f64,

    /// Reanneal when accepted/generated falls below this.
    pub acc_gen_reanneal_ratio: f64,

    /// Relative perturbation used to estimate tangents:
    /// `x_plusdelta = x * (1 +/- delta_param)`.
    pub delta_param: f64,

    /// Stop once the best objective has been matched this many times.
    pub f_x_best_repeat_max: u32,

    pub enable_reanneal: bool,

    /// Force a reanneal after this many steps, whatever the acceptance ratio.
    pub reanneal_after_steps: u64,

    /// Stop when every `T_i(k)` has dropped below its expected final value.
    pub exit_at_t_f: bool,

    /// Stop after this many calls to `step`. 0 = no limit.
    pub max_steps: u64,

    /// Stop after this many accepted candidates. 0 = no limit.
    pub max_accepted: u64,

    /// Upper bound on redraws when a candidate lands out of bounds.
    pub max_generate_attempts: usize,

    /// How much of the accepted/rejected history to keep.
    pub retention: HistoryRetention,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for AsaConfig {
    fn default() -> Self {
        Self {
            downhill: true,
            temperature_ratio_scale: 1e-5,
            temperature_anneal_scale: 100.0,
            cost_parameter_scale_ratio: 1.0,
            acc_gen_reanneal_ratio: 1e-6,
            delta_param: 0.01,
            f_x_best_repeat_max: 10,
            enable_reanneal: true,
            reanneal_after_steps: 100,
            exit_at_t_f: false,
            max_steps: 0,
            max_accepted: 0,
            max_generate_attempts: 10_000,
            retention: HistoryRetention::KeepAll,
            seed: None,
        }
    }
}

impl AsaConfig {
    pub fn with_downhill(mut self, downhill: bool) -> Self {
        self.downhill = downhill;
        self
    }

    pub fn with_temperature_ratio_scale(mut self, scale: f64) -> Self {
        self.temperature_ratio_scale = scale;
        self
    }

    pub fn with_temperature_anneal_scale(mut self, scale: f64) -> Self {
        self.temperature_anneal_scale = scale;
        self
    }

    pub fn with_cost_parameter_scale_ratio(mut self, ratio: f64) -> Self {
        self.cost_parameter_scale_ratio = ratio;
        self
    }

    pub fn with_acc_gen_reanneal_ratio(mut self, ratio: f64) -> Self {
        self.acc_gen_reanneal_ratio = ratio;
        self
    }

    pub fn with_delta_param(mut self, delta: f64) -> Self {
        self.delta_param = delta;
        self
    }

    pub fn with_f_x_best_repeat_max(mut self, n: u32) -> Self {
        self.f_x_best_repeat_max = n;
        self
    }

    pub fn with_reanneal(mut self, enable: bool) -> Self {
        self.enable_reanneal = enable;
        self
    }

    pub fn with_reanneal_after_steps(mut self, n: u64) -> Self {
        self.reanneal_after_steps = n;
        self
    }

    pub fn with_exit_at_t_f(mut self, exit: bool) -> Self {
        self.exit_at_t_f = exit;
        self
    }

    pub fn with_max_steps(mut self, n: u64) -> Self {
        self.max_steps = n;
        self
    }

    pub fn with_max_accepted(mut self, n: u64) -> Self {
        self.max_accepted = n;
        self
    }

    pub fn with_max_generate_attempts(mut self, n: usize) -> Self {
        self.max_generate_attempts = n;
        self
    }

    pub fn with_retention(mut self, retention: HistoryRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let floats = [
            ("temperature_ratio_scale", self.temperature_ratio_scale),
            ("temperature_anneal_scale", self.temperature_anneal_scale),
            ("cost_parameter_scale_ratio", self.cost_parameter_scale_ratio),
            ("acc_gen_reanneal_ratio", self.acc_gen_reanneal_ratio),
            ("delta_param", self.delta_param),
        ];
        if let Some((name, v)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} must be finite, got {v}"));
        }
        if self.temperature_ratio_scale <= 0.0 || self.temperature_ratio_scale >= 1.0 {
            return Err(format!(
                "temperature_ratio_scale must be in (0, 1), got {}",
                self.temperature_ratio_scale
            ));
        }
        if self.temperature_anneal_scale <= 0.0 {
            return Err("temperature_anneal_scale must be positive".into());
        }
        if self.cost_parameter_scale_ratio <= 0.0 {
            return Err("cost_parameter_scale_ratio must be positive".into());
        }
        if self.acc_gen_reanneal_ratio < 0.0 {
            return Err("acc_gen_reanneal_ratio must be non-negative".into());
        }
        if self.delta_param <= 0.0 {
            return Err("delta_param must be positive".into());
        }
        if self.f_x_best_repeat_max == 0 {
            return Err("f_x_best_repeat_max must be at least 1".into());
        }
        if self.max_generate_attempts == 0 {
            return Err("max_generate_attempts must be at least 1".into());
        }
        if let HistoryRetention::Window(0) = self.retention {
            return Err("history window must hold at least one entry".into());
        }
        Ok(())
    }
}
