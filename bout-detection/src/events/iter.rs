use clam_common::Real;

use crate::detectors::Detector;

#[derive(Clone)]
pub struct EventIter<I, D>
where
    I: Iterator<Item = (D::TimeType, Real)>,
    D: Detector,
{
    source: I,
    detector: D,
    finished: bool,
}

impl<I, D> Iterator for EventIter<I, D>
where
    I: Iterator<Item = (D::TimeType, Real)>,
    D: Detector,
{
    type Item = D::EventType;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        for (time, value) in &mut self.source {
            if let Some(event) = self.detector.signal(time, value) {
                return Some(event);
            }
        }
        self.finished = true;
        self.detector.finish()
    }
}

/// Drives a [Detector] over an iterator of `(time, value)` points.
pub trait EventFilter<I, D>
where
    I: Iterator<Item = (D::TimeType, Real)>,
    D: Detector,
{
    fn events(self, detector: D) -> EventIter<I, D>;
}

impl<I, D> EventFilter<I, D> for I
where
    I: Iterator<Item = (D::TimeType, Real)>,
    D: Detector,
{
    fn events(self, detector: D) -> EventIter<I, D> {
        EventIter {
            source: self,
            detector,
            finished: false,
        }
    }
}
