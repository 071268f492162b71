use clam_common::{Real, SampleIndex};
use thiserror::Error;

pub type DetectionResult<T> = Result<T, DetectionError>;

/// Names the argument a precondition violation was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum InputLocation {
    #[strum(to_string = "peakdet positions")]
    PeakPositions,
    #[strum(to_string = "bout index ends")]
    BoutEnds,
    #[strum(to_string = "bout signal")]
    BoutSignal,
    #[strum(to_string = "bout timestamps")]
    BoutTimestamps,
    #[strum(to_string = "bout displacement velocities")]
    DisplacementVelocities,
    #[strum(to_string = "simpson abscissae")]
    IntegrationAbscissae,
    #[strum(to_string = "triggered response cell selection")]
    CellSelection,
    #[strum(to_string = "stimulus window ends")]
    StimulusWindowEnds,
    #[strum(to_string = "motor-free flow ends")]
    FlowEnds,
}

#[derive(Debug, Error, PartialEq)]
pub enum DetectionError {
    #[error("Length mismatch in {location}: expected {expected} values, got {actual}")]
    LengthMismatch {
        location: InputLocation,
        expected: usize,
        actual: usize,
    },
    #[error("Input argument delta must be positive, got {0}")]
    NonPositiveDelta(Real),
    #[error("Minimum spacing must be at least one sample")]
    ZeroSpacing,
    #[error("Parameter {name} must be positive, got {value}")]
    NonPositiveParameter { name: &'static str, value: Real },
    #[error("Window [{lo}, {hi}) is empty or out of range")]
    InvalidWindow { lo: isize, hi: isize },
    #[error("Search range [{lo}, {hi}) must be finite and non-empty")]
    InvalidRange { lo: Real, hi: Real },
    #[error("Search grid of {count} centers exceeds the limit of {max}")]
    GridTooLarge { count: Real, max: usize },
    #[error("Reference timestamps are empty")]
    EmptyReference,
    #[error("Reference timestamps must be strictly increasing, sample {index} is not")]
    NonIncreasingReference { index: usize },
    #[error("Index {index} out of range in {location} of length {len}")]
    IndexOutOfRange {
        location: InputLocation,
        index: usize,
        len: usize,
    },
    #[error("Bout ({start}, {end}) out of range for {location} of length {len}")]
    BoutOutOfRange {
        location: InputLocation,
        start: SampleIndex,
        end: SampleIndex,
        len: usize,
    },
}

/// Fails with [DetectionError::LengthMismatch] unless `actual == expected`.
pub(crate) fn ensure_same_length(
    location: InputLocation,
    expected: usize,
    actual: usize,
) -> DetectionResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DetectionError::LengthMismatch {
            location,
            expected,
            actual,
        })
    }
}

/// Fails with [DetectionError::NonPositiveParameter] unless `value > 0`.
/// NaN is rejected.
pub(crate) fn ensure_positive(name: &'static str, value: Real) -> DetectionResult<Real> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(DetectionError::NonPositiveParameter { name, value })
    }
}
