//! Stateless transforms applied to a signal before detection.

use std::iter::repeat_n;

use clam_common::{Real, SampleIndex};
use itertools::Itertools;

use crate::{
    error::{DetectionError, DetectionResult},
    window::{SmoothingWindow, Stats, WindowFilter},
};

/// Voltage convention of a digital trigger line.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicLevel {
    /// High is 1 V, rescaled to the 5 V convention before edge detection.
    OneVolt,
    #[default]
    FiveVolt,
}

impl LogicLevel {
    fn scale(self) -> Real {
        match self {
            LogicLevel::OneVolt => 5.0,
            LogicLevel::FiveVolt => 1.0,
        }
    }
}

/// Sliding-window average with the same length as the input.
///
/// Samples beyond either end of `data` count as zero, and the window is
/// centred on each sample (biased one sample forward for even windows),
/// matching a `'same'` mode convolution with a flat kernel.
#[tracing::instrument(skip_all, level = "trace", fields(num_samples = data.len(), window = window))]
pub fn smoothen(data: &[Real], window: usize) -> DetectionResult<Vec<Real>> {
    let smoothing = SmoothingWindow::new(window)?;
    let lead = window - 1;
    let centre = lead / 2;

    Ok(repeat_n(0.0, lead)
        .chain(data.iter().copied())
        .chain(repeat_n(0.0, centre))
        .window(smoothing)
        .skip(centre)
        .take(data.len())
        .collect())
}

/// Population standard deviation of every full window of `window` samples.
///
/// Returns `data.len() - window + 1` values, or none if `data` is shorter than the window.
#[tracing::instrument(skip_all, level = "trace", fields(num_samples = data.len(), window = window))]
pub fn local_std(data: &[Real], window: usize) -> DetectionResult<Vec<Real>> {
    if window == 0 {
        return Err(DetectionError::NonPositiveParameter {
            name: "window size",
            value: 0.0,
        });
    }
    Ok(data
        .windows(window)
        .filter_map(Stats::from_slice)
        .map(|stats| stats.std_dev())
        .collect())
}

/// Rising and falling edges of a digital trigger line.
///
/// Index `i` in either output refers to the transition from sample `i` to `i + 1`.
/// With `begin_low`/`end_low` the first/last sample is forced low so that a line
/// which is already high at either end does not yield an unpaired edge.
#[tracing::instrument(skip_all, level = "trace", fields(num_samples = signal.len(), num_rising, num_falling))]
pub fn ttl_edges(
    signal: &[Real],
    logic_level: LogicLevel,
    begin_low: bool,
    end_low: bool,
) -> (Vec<SampleIndex>, Vec<SampleIndex>) {
    let scale = logic_level.scale();
    let mut levels: Vec<Real> = signal.iter().map(|v| v * scale).collect();

    if end_low {
        if let Some(last) = levels.last_mut().filter(|last| **last >= 1.0) {
            *last = 0.0;
        }
    }
    if begin_low {
        if let Some(first) = levels.first_mut().filter(|first| **first >= 1.0) {
            *first = 0.0;
        }
    }

    let mut rising = Vec::new();
    let mut falling = Vec::new();
    for (i, (before, after)) in levels.iter().tuple_windows().enumerate() {
        let step = (after - before).trunc();
        if step >= 1.0 {
            rising.push(i);
        } else if step <= -1.0 {
            falling.push(i);
        }
    }

    tracing::Span::current().record("num_rising", rising.len());
    tracing::Span::current().record("num_falling", falling.len());
    (rising, falling)
}
