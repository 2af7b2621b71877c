//! Metrics.
//!
//! Metrics are monitoring helpers (they do not participate in backprop).

use std::collections::VecDeque;

use crate::{Error, Result};

/// Running mean over the most recent `capacity` values.
#[derive(Debug, Clone)]
pub struct LossWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl LossWindow {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "loss window capacity must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Push a value, evicting the oldest one once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Mean of the values currently in the window, or `None` if it is empty.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
