pub(crate) mod bout;
pub(crate) mod peak;
pub(crate) mod stimulus;

pub use bout::{Bout, BoutIndex};
pub use peak::{Extremum, Peak, PeakSet};
pub use stimulus::StimulusWindow;
