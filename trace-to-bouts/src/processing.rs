use std::{borrow::Cow, fs, io::BufWriter, path::Path};

use anyhow::{Context, Result, bail};
use bout_detection::{
    BoutFeatures, BoutIndex, PeakSet, Real, detect_bouts, filter_peaks_by_spacing, peakdet,
    smoothen,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info};

use crate::{
    loader::load_raw_data,
    parameters::{AnalyseParameters, DetectionSettings, ParameterMap},
};

#[derive(Debug, Serialize)]
pub(crate) struct PeakReport {
    pub(crate) maxima: PeakSet,
    pub(crate) minima: PeakSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordingReport<'a> {
    pub(crate) id: &'a str,
    pub(crate) settings: &'a DetectionSettings,
    pub(crate) bouts: BoutIndex,
    pub(crate) features: BoutFeatures,
    pub(crate) peaks: Option<PeakReport>,
}

/// Timestamps of every sample, given explicitly or spaced `sample_period` apart.
fn sample_times(reference: Option<&[Real]>, num_samples: usize, sample_period: Real) -> Cow<'_, [Real]> {
    match reference {
        Some(reference) => Cow::Borrowed(reference),
        None => Cow::Owned(
            (0..num_samples)
                .map(|i| i as Real * sample_period)
                .collect(),
        ),
    }
}

#[tracing::instrument(skip_all, fields(id = id, num_samples = signal.len(), num_bouts))]
pub(crate) fn analyse_recording<'a>(
    id: &'a str,
    signal: &[Real],
    reference_timestamps: Option<&[Real]>,
    settings: &'a DetectionSettings,
    params: &AnalyseParameters,
) -> Result<RecordingReport<'a>> {
    let signal = match params.smoothing_window {
        Some(window) => Cow::Owned(smoothen(signal, window)?),
        None => Cow::Borrowed(signal),
    };
    let timestamps = sample_times(reference_timestamps, signal.len(), params.sample_period);

    let bouts = detect_bouts(
        &signal,
        settings.min_thresh,
        settings.max_thresh,
        settings.min_spacing,
    )?;
    tracing::Span::current().record("num_bouts", bouts.len());

    let features = BoutFeatures::extract(&signal, &timestamps, &bouts, settings.numpoints)
        .context("Timestamps do not match the recording")?;

    let peaks = params
        .peak_delta
        .map(|delta| -> Result<PeakReport> {
            let (maxima, minima) = peakdet(&signal, delta, Some(timestamps.as_ref()))?;
            let maxima = match params.peak_spacing {
                Some(spacing) => filter_peaks_by_spacing(&maxima, spacing),
                None => maxima,
            };
            Ok(PeakReport { maxima, minima })
        })
        .transpose()?;

    Ok(RecordingReport {
        id,
        settings,
        bouts,
        features,
        peaks,
    })
}

fn write_report(output_path: &Path, report: &RecordingReport) -> Result<()> {
    let path = output_path.join(format!("{}.json", report.id));
    let file = fs::File::create(&path).with_context(|| format!("Cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    Ok(())
}

/// Runs bout detection over every recording of the data directory and writes one report per recording.
///
/// A recording that fails is logged and does not stop the others.
pub(crate) fn analyse(params: &AnalyseParameters) -> Result<()> {
    let param_map = params
        .param_file
        .as_deref()
        .map(ParameterMap::load)
        .transpose()?;
    let settings = DetectionSettings::resolve(&params.detection, param_map.as_ref())?;
    info!(?settings, "Detection settings resolved");

    let mut recordings = load_raw_data(&params.data_path, &params.separator.0)?;
    let reference_timestamps = params
        .timestamp_id
        .as_ref()
        .map(|id| {
            recordings
                .remove(id)
                .with_context(|| format!("Timestamp recording '{id}' not found"))
        })
        .transpose()?;

    fs::create_dir_all(&params.output_path)
        .with_context(|| format!("Cannot create {}", params.output_path.display()))?;

    let num_failed = recordings
        .par_iter()
        .filter(|(id, signal)| {
            let result = analyse_recording(
                id,
                signal,
                reference_timestamps.as_deref(),
                &settings,
                params,
            )
            .and_then(|report| write_report(&params.output_path, &report));
            if let Err(e) = &result {
                error!(id = id.as_str(), "Analysis failed: {e:#}");
            }
            result.is_err()
        })
        .count();

    info!(num_recordings = recordings.len(), num_failed, "Analysis complete");
    ensure_any_succeeded(recordings.len(), num_failed)
}

/// An analysis in which every recording failed is itself a failure.
fn ensure_any_succeeded(num_recordings: usize, num_failed: usize) -> Result<()> {
    if num_recordings > 0 && num_failed == num_recordings {
        bail!("All {num_failed} recordings failed");
    }
    Ok(())
}
