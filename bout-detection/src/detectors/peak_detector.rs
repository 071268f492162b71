use clam_common::Real;

use super::Detector;
use crate::{
    datatype::{Extremum, Peak},
    error::{DetectionError, DetectionResult},
};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
enum Seeking {
    #[default]
    Maximum,
    Minimum,
}

/// Hysteresis extremum tracker (Billauer's `peakdet`).
///
/// A maximum is committed once the signal falls more than `delta` below the
/// running maximum, a minimum once it rises more than `delta` above the
/// running minimum. Detection alternates between the two.
#[derive(Clone, Debug)]
pub struct PeakDetector {
    delta: Real,
    seeking: Seeking,
    max: Peak,
    min: Peak,
}

impl PeakDetector {
    pub fn new(delta: Real) -> DetectionResult<Self> {
        if !(delta > 0.0) {
            return Err(DetectionError::NonPositiveDelta(delta));
        }
        Ok(Self {
            delta,
            seeking: Seeking::default(),
            max: Peak::new(Real::NAN, Real::NEG_INFINITY),
            min: Peak::new(Real::NAN, Real::INFINITY),
        })
    }
}

impl Detector for PeakDetector {
    type TimeType = Real;
    type EventType = Extremum;

    fn signal(&mut self, position: Real, value: Real) -> Option<Extremum> {
        if value > self.max.value {
            self.max = Peak::new(position, value);
        }
        if value < self.min.value {
            self.min = Peak::new(position, value);
        }

        match self.seeking {
            Seeking::Maximum if value < self.max.value - self.delta => {
                let found = self.max;
                self.min = Peak::new(position, value);
                self.seeking = Seeking::Minimum;
                Some(Extremum::Maximum(found))
            }
            Seeking::Minimum if value > self.min.value + self.delta => {
                let found = self.min;
                self.max = Peak::new(position, value);
                self.seeking = Seeking::Maximum;
                Some(Extremum::Minimum(found))
            }
            _ => None,
        }
    }

    fn finish(&mut self) -> Option<Extremum> {
        // The running extremum at the end of the scan was never confirmed by a
        // sufficient swing, so it is not reported.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventFilter;

    #[test]
    fn rejects_non_positive_delta() {
        assert!(PeakDetector::new(0.0).is_err());
        assert!(PeakDetector::new(-1.0).is_err());
        assert!(PeakDetector::new(Real::NAN).is_err());
    }

    #[test]
    fn alternates_extrema() {
        let data = [0., 2., 1., 3., 0., 0.5, 0.2];
        let events: Vec<_> = data
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as Real, v))
            .events(PeakDetector::new(0.75).unwrap())
            .collect();
        assert_eq!(
            events,
            vec![
                Extremum::Maximum(Peak::new(1., 2.)),
                Extremum::Minimum(Peak::new(2., 1.)),
                Extremum::Maximum(Peak::new(3., 3.)),
            ]
        );
    }

    #[test]
    fn small_wiggles_are_ignored() {
        let data = [1.0, 1.1, 0.9, 1.05, 0.95, 1.0];
        let mut iter = data
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as Real, v))
            .events(PeakDetector::new(0.5).unwrap());
        assert_eq!(iter.next(), None);
    }
}
