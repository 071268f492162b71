use std::collections::VecDeque;

use clam_common::Real;

use super::Window;
use crate::error::{DetectionError, DetectionResult};

/// Fixed-length moving window keeping a running sum of its values, outputs their mean.
#[derive(Default, Clone)]
pub struct SmoothingWindow {
    sum: Real,
    size: usize,
    window: VecDeque<Real>,
}

impl SmoothingWindow {
    pub fn new(size: usize) -> DetectionResult<Self> {
        if size == 0 {
            return Err(DetectionError::NonPositiveParameter {
                name: "window size",
                value: 0.0,
            });
        }
        Ok(SmoothingWindow {
            window: VecDeque::<Real>::with_capacity(size),
            size,
            ..Default::default()
        })
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.size
    }
}

impl Window for SmoothingWindow {
    type OutputType = Real;

    fn push(&mut self, value: Real) -> bool {
        if self.is_full() {
            self.sum -= self.window.pop_front().unwrap_or_default();
        }
        self.sum += value;
        self.window.push_back(value);
        self.is_full()
    }

    fn output(&self) -> Option<Real> {
        self.is_full().then(|| self.sum / self.size as Real)
    }
}
