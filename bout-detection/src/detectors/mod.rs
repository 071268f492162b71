pub mod bout_detector;
pub mod peak_detector;

use clam_common::Real;

pub use bout_detector::{BoutDetector, BoutEdge};
pub use peak_detector::PeakDetector;

/// A stateful forward scan over `(time, value)` points.
///
/// `signal` is fed every point in order and returns an event whenever the
/// detector commits a transition. `finish` is called once after the last
/// point so that a detector holding a pending event can release it.
pub trait Detector: Clone {
    type TimeType: Copy;
    type EventType;

    fn signal(&mut self, time: Self::TimeType, value: Real) -> Option<Self::EventType>;

    fn finish(&mut self) -> Option<Self::EventType>;
}
