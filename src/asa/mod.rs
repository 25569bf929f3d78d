//! Adaptive Simulated Annealing (ASA).
//!
//! Lester Ingber's Very Fast Simulated Re-Annealing as a client-driven
//! state machine. The caller owns the objective function: the
//! [`Annealer`] asks for objective values through [`Request`]s and takes
//! them back as [`Evaluation`]s, one [`step`](Annealer::step) at a time.
//! [`AsaRunner`] drives that loop for problems expressed as an
//! [`AsaProblem`].
//!
//! Per-dimension temperatures `T_i(k) = T_0,i exp(-c_i k^(1/D))` control
//! how far candidates are thrown, a separate acceptance temperature controls
//! how readily worse candidates are taken, and periodic reannealing rescales
//! the temperatures from finite-difference tangents at the best point.
//!
//! # References
//!
//! - Ingber, L. (1989). "Very fast simulated re-annealing", *Mathematical
//!   and Computer Modelling* 12, 967-973.
//! - Ingber, L. (1993). "Simulated annealing: Practice versus theory",
//!   *Mathematical and Computer Modelling* 18(11), 29-57.

mod annealer;
mod config;
mod history;
mod runner;
mod types;

pub use annealer::Annealer;
pub use config::AsaConfig;
pub use history::{History, HistoryRetention, Trail};
pub use runner::{AsaResult, AsaRunner};
pub use types::{AnnealState, AnnealStats, AsaProblem, Evaluation, Request};
