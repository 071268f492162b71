//! Per-bout reducers.
//!
//! Every reducer skips bouts with zero length, so its output is index-aligned
//! with the non-empty bouts of the [BoutIndex] it was given. The exception is
//! [inter_bout_interval], which pairs each bout with its successor.

use clam_common::Real;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    datatype::BoutIndex,
    error::{DetectionError, DetectionResult, InputLocation, ensure_same_length},
    integrate::simpson,
};

/// Number of samples used to estimate bout acceleration unless stated otherwise.
pub const DEFAULT_ACCELERATION_POINTS: usize = 6;

/// Every feature of the bouts of one recording.
#[derive(Default, Clone, Debug, PartialEq, Serialize)]
pub struct BoutFeatures {
    pub duration: Vec<Real>,
    pub mean_velocity: Vec<Real>,
    pub max_velocity: Vec<Real>,
    pub displacement: Vec<Real>,
    pub acceleration: Vec<Real>,
    pub inter_bout_interval: Vec<Real>,
}

impl BoutFeatures {
    #[tracing::instrument(skip_all, fields(num_bouts = bouts.len(), num_samples = signal.len()))]
    pub fn extract(
        signal: &[Real],
        timestamps: &[Real],
        bouts: &BoutIndex,
        numpoints: usize,
    ) -> DetectionResult<Self> {
        let duration = bout_duration(bouts, timestamps)?;
        let mean_velocity = mean_bout_velocity(signal, bouts, timestamps)?;
        let displacement = bout_displacement(&duration, &mean_velocity)?;
        Ok(Self {
            max_velocity: max_bout_velocity(signal, bouts)?,
            acceleration: bout_acceleration(signal, bouts, numpoints)?,
            inter_bout_interval: inter_bout_interval(bouts, timestamps)?,
            duration,
            mean_velocity,
            displacement,
        })
    }
}

/// `timestamps[end] - timestamps[start]` of each bout.
pub fn bout_duration(bouts: &BoutIndex, timestamps: &[Real]) -> DetectionResult<Vec<Real>> {
    bouts.ensure_indexable(timestamps.len(), InputLocation::BoutTimestamps)?;
    Ok(bouts
        .non_empty()
        .filter_map(|bout| Some(timestamps.get(bout.end)? - timestamps.get(bout.start)?))
        .collect())
}

/// Area under the signal across each bout divided by the bout's duration.
pub fn mean_bout_velocity(
    signal: &[Real],
    bouts: &BoutIndex,
    timestamps: &[Real],
) -> DetectionResult<Vec<Real>> {
    ensure_same_length(InputLocation::BoutSignal, timestamps.len(), signal.len())?;
    bouts.ensure_indexable(timestamps.len(), InputLocation::BoutTimestamps)?;

    bouts
        .non_empty()
        .filter_map(|bout| {
            let y = signal.get(bout.range())?;
            let x = timestamps.get(bout.range())?;
            let duration = timestamps.get(bout.end)? - timestamps.get(bout.start)?;
            Some(simpson(y, x).map(|area| area / duration))
        })
        .collect()
}

/// Largest sample inside each bout.
pub fn max_bout_velocity(signal: &[Real], bouts: &BoutIndex) -> DetectionResult<Vec<Real>> {
    bouts.ensure_sliceable(signal.len(), InputLocation::BoutSignal)?;
    Ok(bouts
        .non_empty()
        .filter_map(|bout| signal.get(bout.range())?.iter().copied().reduce(Real::max))
        .collect())
}

/// Time from the end of each bout to the start of the next.
pub fn inter_bout_interval(bouts: &BoutIndex, timestamps: &[Real]) -> DetectionResult<Vec<Real>> {
    bouts.ensure_indexable(timestamps.len(), InputLocation::BoutTimestamps)?;
    Ok(bouts
        .iter()
        .tuple_windows()
        .filter(|(bout, _)| !bout.is_empty())
        .filter_map(|(bout, next)| Some(timestamps.get(next.start)? - timestamps.get(bout.end)?))
        .collect())
}

/// Mean velocity multiplied by duration, element by element.
pub fn bout_displacement(duration: &[Real], mean_velocity: &[Real]) -> DetectionResult<Vec<Real>> {
    ensure_same_length(
        InputLocation::DisplacementVelocities,
        duration.len(),
        mean_velocity.len(),
    )?;
    Ok(duration
        .iter()
        .zip(mean_velocity)
        .map(|(duration, velocity)| velocity * duration)
        .collect())
}

/// Mean slope over the first `numpoints` samples of each bout.
///
/// Bouts shorter than `numpoints` samples yield NaN.
pub fn bout_acceleration(
    signal: &[Real],
    bouts: &BoutIndex,
    numpoints: usize,
) -> DetectionResult<Vec<Real>> {
    if numpoints == 0 {
        return Err(DetectionError::NonPositiveParameter {
            name: "numpoints",
            value: 0.0,
        });
    }
    bouts.ensure_sliceable(signal.len(), InputLocation::BoutSignal)?;

    Ok(bouts
        .non_empty()
        .map(|bout| {
            if bout.len() < numpoints {
                tracing::trace!(%bout, numpoints, "Bout too short for acceleration");
                return Real::NAN;
            }
            match (signal.get(bout.start + numpoints), signal.get(bout.start)) {
                (Some(later), Some(first)) => (later - first) / numpoints as Real,
                _ => Real::NAN,
            }
        })
        .collect())
}
