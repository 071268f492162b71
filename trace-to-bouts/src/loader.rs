use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result, bail};
use bout_detection::Real;
use tracing::{debug, warn};

/// Splits `text` on `separator` and parses each fragment as a sample.
///
/// The text after the final separator is discarded, so every sample, the last
/// one included, must be followed by a separator.
pub(crate) fn parse_signal(text: &str, separator: &str) -> Result<Vec<Real>> {
    let mut fragments: Vec<&str> = text.split(separator).collect();
    fragments.pop();
    let signal = fragments
        .into_iter()
        .enumerate()
        .map(|(index, fragment)| {
            fragment
                .trim()
                .parse::<Real>()
                .with_context(|| format!("Sample {index} '{fragment}' is not a number"))
        })
        .collect::<Result<Vec<_>>>()?;
    if signal.is_empty() {
        bail!("No samples found, check the separator");
    }
    Ok(signal)
}

/// Loads every `.txt` recording in `directory`, keyed by file stem.
///
/// Recordings that cannot be read or parsed are reported and left out.
#[tracing::instrument(skip_all, fields(directory = %directory.display(), num_loaded))]
pub(crate) fn load_raw_data(directory: &Path, separator: &str) -> Result<BTreeMap<String, Vec<Real>>> {
    let pattern = directory.join("*.txt");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("Path {} is not valid UTF-8", directory.display()))?;

    let mut recordings = BTreeMap::new();
    for entry in glob::glob(pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!(path = %path.display(), "Recording name is not valid UTF-8, skipping");
            continue;
        };
        let signal = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))
            .and_then(|text| parse_signal(&text, separator));
        match signal {
            Ok(signal) => {
                debug!(id, num_samples = signal.len(), "Loaded recording");
                recordings.insert(id.to_owned(), signal);
            }
            Err(e) => warn!(id, "Error loading recording: {e:#}"),
        }
    }

    tracing::Span::current().record("num_loaded", recordings.len());
    Ok(recordings)
}
