//! Detection of behavioural bouts and peaks in sampled signals, and alignment
//! of other traces to the detected events.
//!
//! A signal is a slice of [Real] values, optionally conditioned (see
//! [conditioning]) before being segmented into bouts. Every bout feature is
//! derived from a [BoutIndex] and the signal's timestamps:
//! ```
//! use bout_detection::{BoutFeatures, detect_bouts};
//!
//! let signal: Vec<f64> = (0..50)
//!     .map(|i| if (20..30).contains(&i) { 1.0 } else { 0.0 })
//!     .collect();
//! let timestamps: Vec<f64> = (0..50).map(|i| i as f64 * 0.01).collect();
//!
//! let bouts = detect_bouts(&signal, 0.5, 0.6, 5)?;
//! assert_eq!(bouts.len(), 1);
//!
//! let features = BoutFeatures::extract(&signal, &timestamps, &bouts, 6)?;
//! assert_eq!(features.duration.len(), 1);
//! # Ok::<(), bout_detection::DetectionError>(())
//! ```
//!
//! The hysteresis scans are [detectors::Detector]s driven over `(time, value)`
//! points by the [EventFilter] iterator adaptor, in the same way the moving
//! [window]s are driven over samples by [WindowFilter].

pub mod alignment;
pub mod bouts;
pub mod conditioning;
pub(crate) mod datatype;
pub mod detectors;
pub(crate) mod error;
pub(crate) mod events;
pub mod features;
pub(crate) mod integrate;
pub mod latency;
pub mod peaks;
pub mod window;

pub use alignment::{
    CellResponse, CellSignificance, Crop, SignificanceReport, TriggerWindow, TriggeredResponse,
    detect_significant_responses, nearest_index, triggered_response,
};
pub use bouts::detect_bouts;
pub use clam_common::{Real, SampleIndex};
pub use conditioning::{LogicLevel, local_std, smoothen, ttl_edges};
pub use datatype::{Bout, BoutIndex, Extremum, Peak, PeakSet, StimulusWindow};
pub use error::{DetectionError, DetectionResult, InputLocation};
pub use events::{EventFilter, EventIter};
pub use features::{
    BoutFeatures, DEFAULT_ACCELERATION_POINTS, bout_acceleration, bout_displacement,
    bout_duration, inter_bout_interval, max_bout_velocity, mean_bout_velocity,
};
pub use integrate::simpson;
pub use latency::{
    ClampGate, DEFAULT_MOTOR_THRESHOLD, LatencyRecord, MAX_GRID_CENTERS, OptimalWindow,
    latency_clamped_flow_times, motor_free_flow_start_indices, optimal_latency_window,
    swim_latency,
};
pub use peaks::{filter_peaks_by_spacing, peakdet};
pub use window::WindowFilter;
