use clam_common::{Real, SampleIndex};

use super::Detector;
use crate::error::{DetectionError, DetectionResult};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
enum BoutState {
    /// Looking for an onset.
    #[default]
    Quiescent,
    /// Looking for an offset.
    Active,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoutEdge {
    /// Index of the last sample below threshold before the crossing.
    Onset(SampleIndex),
    /// One past the last sample at or above threshold.
    Offset(SampleIndex),
}

/// Hysteresis threshold-crossing detector.
///
/// An onset is committed at `i` when `signal[i] < min_thresh <= signal[i + 1]`.
/// An offset is committed at `i` when `signal[i] >= min_thresh` and each of the
/// following `min_spacing` samples is strictly below it. Onsets are only
/// accepted while quiescent and offsets only while active.
///
/// The offset test looks ahead, so the detector tracks the most recent sample
/// at or above threshold and the length of the quiet run after it, committing
/// the offset once the run reaches `min_spacing`.
#[derive(Clone, Debug)]
pub struct BoutDetector {
    min_thresh: Real,
    min_spacing: usize,
    state: BoutState,
    previous: Option<Real>,
    last_above: Option<SampleIndex>,
    quiet_run: usize,
}

impl BoutDetector {
    pub fn new(min_thresh: Real, min_spacing: usize) -> DetectionResult<Self> {
        if min_spacing == 0 {
            return Err(DetectionError::ZeroSpacing);
        }
        Ok(Self {
            min_thresh,
            min_spacing,
            state: BoutState::default(),
            previous: None,
            last_above: None,
            quiet_run: 0,
        })
    }

    fn is_above(&self, value: Real) -> bool {
        value >= self.min_thresh
    }

    fn is_onset(&self, value: Real) -> bool {
        self.previous
            .is_some_and(|previous| previous < self.min_thresh && self.is_above(value))
    }
}

impl Detector for BoutDetector {
    type TimeType = SampleIndex;
    type EventType = BoutEdge;

    fn signal(&mut self, index: SampleIndex, value: Real) -> Option<BoutEdge> {
        let onset = self.is_onset(value);
        self.previous = Some(value);

        if self.is_above(value) {
            self.last_above = Some(index);
            self.quiet_run = 0;
        } else {
            self.quiet_run += 1;
        }

        match self.state {
            BoutState::Quiescent if onset => {
                self.state = BoutState::Active;
                // `onset` implies a previous sample exists, so `index >= 1`.
                Some(BoutEdge::Onset(index - 1))
            }
            BoutState::Active if self.quiet_run == self.min_spacing => {
                let last_above = self.last_above?;
                self.state = BoutState::Quiescent;
                Some(BoutEdge::Offset(last_above + 1))
            }
            _ => None,
        }
    }

    fn finish(&mut self) -> Option<BoutEdge> {
        // A bout still active at the end of the trace has no offset.
        None
    }
}
