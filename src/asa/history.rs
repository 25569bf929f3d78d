//! Accepted/rejected parameter history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How many history entries each trail keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryRetention {
    /// Keep every entry. Memory grows with the run.
    #[default]
    KeepAll,
    /// Keep only the most recent `n` entries of each trail.
    Window(usize),
}

/// An ordered sequence of parameter vectors with their objective values.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    params: VecDeque<Vec<f64>>,
    objectives: VecDeque<f64>,
    pushed: u64,
}

impl Trail {
    fn push(&mut self, x: &[f64], f: f64, retention: HistoryRetention) {
        self.params.push_back(x.to_vec());
        self.objectives.push_back(f);
        self.pushed += 1;
        if let HistoryRetention::Window(n) = retention {
            while self.params.len() > n {
                self.params.pop_front();
                self.objectives.pop_front();
            }
        }
    }

    /// Retained parameter vectors, oldest first.
    pub fn params(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.params.iter().map(Vec::as_slice)
    }

    /// Retained objective values, oldest first.
    pub fn objectives(&self) -> impl Iterator<Item = f64> + '_ {
        self.objectives.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Entries ever pushed, including those dropped by a window.
    pub fn total(&self) -> u64 {
        self.pushed
    }

    pub fn last(&self) -> Option<(&[f64], f64)> {
        Some((self.params.back()?.as_slice(), *self.objectives.back()?))
    }

    pub(crate) fn to_vecs(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        (
            self.params.iter().cloned().collect(),
            self.objectives.iter().copied().collect(),
        )
    }
}

/// Accepted and rejected trails of one run.
#[derive(Debug, Clone, Default)]
pub struct History {
    retention: HistoryRetention,
    accepted: Trail,
    rejected: Trail,
}

impl History {
    pub fn new(retention: HistoryRetention) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    pub(crate) fn push_accepted(&mut self, x: &[f64], f: f64) {
        self.accepted.push(x, f, self.retention);
    }

    pub(crate) fn push_rejected(&mut self, x: &[f64], f: f64) {
        self.rejected.push(x, f, self.retention);
    }

    pub fn accepted(&self) -> &Trail {
        &self.accepted
    }

    pub fn rejected(&self) -> &Trail {
        &self.rejected
    }

    pub fn retention(&self) -> HistoryRetention {
        self.retention
    }
}
