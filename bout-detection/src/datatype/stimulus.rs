use clam_common::Real;
use serde::Serialize;

use crate::error::{DetectionResult, InputLocation, ensure_same_length};

/// Interval of an external stimulus, closed at both ends, in the timebase of the bouts.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StimulusWindow {
    pub start: Real,
    pub end: Real,
}

impl StimulusWindow {
    pub fn new(start: Real, end: Real) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: Real) -> bool {
        self.start <= time && time <= self.end
    }

    /// Pairs up stimulus onset and offset times.
    pub fn from_bounds(starts: &[Real], ends: &[Real]) -> DetectionResult<Vec<Self>> {
        ensure_same_length(InputLocation::StimulusWindowEnds, starts.len(), ends.len())?;
        Ok(starts
            .iter()
            .zip(ends)
            .map(|(&start, &end)| Self { start, end })
            .collect())
    }
}
