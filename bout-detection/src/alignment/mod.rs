//! Aligning external event times to a sampled trace and cropping the trace around them.

pub(crate) mod nearest;
pub(crate) mod significance;
pub(crate) mod triggered;

pub use nearest::nearest_index;
pub use significance::{CellSignificance, SignificanceReport, detect_significant_responses};
pub use triggered::{CellResponse, Crop, TriggerWindow, TriggeredResponse, triggered_response};
