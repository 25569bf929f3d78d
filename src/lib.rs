//! Client-driven Adaptive Simulated Annealing.
//!
//! Implements Lester Ingber's Very Fast Simulated Re-Annealing (VFSR, later
//! ASA) for bounded continuous global optimization:
//!
//! - **Annealer**: an explicit state machine. The caller evaluates the
//!   objective wherever the annealer asks and feeds the values back; the
//!   annealer owns the cooling schedule, acceptance test, candidate
//!   generation and reannealing.
//! - **Runner**: a convenience loop for objectives that can be called
//!   directly, with cancellation and optional parallel evaluation.
//! - **Record**: JSON export/import of the accepted and rejected history.
//!
//! # Architecture
//!
//! The annealer never calls the objective itself and never blocks, so it
//! can be embedded in any evaluation strategy: remote workers, simulations
//! stepped elsewhere, or a plain closure via [`asa::AsaRunner`].

pub mod asa;
pub mod error;
pub mod record;

pub use error::{AnnealError, Result};
