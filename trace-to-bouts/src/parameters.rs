use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Error, Result};
use bout_detection::{DEFAULT_ACCELERATION_POINTS, Real};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

pub(crate) const DEFAULT_MIN_THRESH: Real = 0.05;
pub(crate) const DEFAULT_MAX_THRESH: Real = 0.15;
pub(crate) const DEFAULT_MIN_SPACING: usize = 7;

/// Text separating consecutive samples, with `\n` and `\t` escapes expanded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Separator(pub(crate) String);

impl FromStr for Separator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = s.replace("\\n", "\n").replace("\\t", "\t");
        if separator.is_empty() {
            anyhow::bail!("Separator must not be empty");
        }
        Ok(Self(separator))
    }
}

/// Settings read from a parameter file of `key: value` lines.
///
/// The key ends at the first `:` or tab, and the value starts one character
/// after the `:`. Lines shorter than two characters, newline included, are
/// ignored; later lines overwrite earlier lines with the same key.
#[derive(Default, Debug, Clone, PartialEq)]
pub(crate) struct ParameterMap(BTreeMap<String, String>);

impl FromStr for ParameterMap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut map = BTreeMap::new();
        for (number, line) in s.split_inclusive('\n').enumerate() {
            if line.len() <= 1 {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                warn!(line = number + 1, "Parameter line has no ':', skipping");
                continue;
            };
            let key = key.split_once('\t').map_or(key, |(key, _)| key);
            let mut value = value.chars();
            value.next();
            let value = value.as_str();
            let value = value.split_once('\n').map_or(value, |(value, _)| value);
            map.insert(key.to_owned(), value.to_owned());
        }
        Ok(Self(map))
    }
}

impl ParameterMap {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        fs::read_to_string(path)
            .with_context(|| format!("Cannot read parameter file {}", path.display()))?
            .parse()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub(crate) fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.get(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid value '{value}' for parameter '{key}'"))
            })
            .transpose()
    }

    /// True if every key of `reference` is present here with an identical value.
    pub(crate) fn matches(&self, reference: &ParameterMap) -> bool {
        reference
            .0
            .iter()
            .all(|(key, value)| self.get(key) == Some(value.as_str()))
    }
}

/// Detection thresholds given on the command line; each overrides the parameter file.
#[derive(Default, Debug, Clone, Args)]
pub(crate) struct DetectionArgs {
    /// Level the signal must rise to for a bout to start [default: 0.05]
    #[clap(long)]
    pub(crate) min_thresh: Option<Real>,

    /// Level a bout must exceed to be kept [default: 0.15]
    #[clap(long)]
    pub(crate) max_thresh: Option<Real>,

    /// Quiet samples needed to end a bout [default: 7]
    #[clap(long)]
    pub(crate) min_spacing: Option<usize>,

    /// Samples used to estimate bout acceleration [default: 6]
    #[clap(long)]
    pub(crate) numpoints: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct DetectionSettings {
    pub(crate) min_thresh: Real,
    pub(crate) max_thresh: Real,
    pub(crate) min_spacing: usize,
    pub(crate) numpoints: usize,
}

impl DetectionSettings {
    /// Takes each setting from the command line, else the parameter file, else its default.
    pub(crate) fn resolve(args: &DetectionArgs, params: Option<&ParameterMap>) -> Result<Self> {
        fn pick<T>(cli: Option<T>, params: Option<&ParameterMap>, key: &str, default: T) -> Result<T>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            if let Some(value) = cli {
                return Ok(value);
            }
            Ok(params
                .map(|params| params.get_parsed(key))
                .transpose()?
                .flatten()
                .unwrap_or(default))
        }

        Ok(Self {
            min_thresh: pick(args.min_thresh, params, "min_thresh", DEFAULT_MIN_THRESH)?,
            max_thresh: pick(args.max_thresh, params, "max_thresh", DEFAULT_MAX_THRESH)?,
            min_spacing: pick(args.min_spacing, params, "min_spacing", DEFAULT_MIN_SPACING)?,
            numpoints: pick(args.numpoints, params, "numpoints", DEFAULT_ACCELERATION_POINTS)?,
        })
    }
}

#[derive(Debug, Clone, Parser)]
pub(crate) struct AnalyseParameters {
    /// Directory holding one `.txt` file per recording
    #[clap(long)]
    pub(crate) data_path: PathBuf,

    /// Directory the per-recording JSON reports are written to
    #[clap(long)]
    pub(crate) output_path: PathBuf,

    /// Text between consecutive samples in a recording
    #[clap(long, default_value = ",\\n")]
    pub(crate) separator: Separator,

    /// Parameter file supplying detection settings not given on the command line
    #[clap(long)]
    pub(crate) param_file: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) detection: DetectionArgs,

    /// Width in samples of the moving average applied before detection
    #[clap(long)]
    pub(crate) smoothing_window: Option<usize>,

    /// Recording holding the timestamp of every sample
    #[clap(long)]
    pub(crate) timestamp_id: Option<String>,

    /// Time between samples, used when no timestamp recording is given
    #[clap(long, default_value = "1.0")]
    pub(crate) sample_period: Real,

    /// If set, local extrema differing by more than this are also reported
    #[clap(long)]
    pub(crate) peak_delta: Option<Real>,

    /// Minimum time between reported maxima
    #[clap(long, requires = "peak_delta")]
    pub(crate) peak_spacing: Option<Real>,
}

#[derive(Debug, Clone, Parser)]
pub(crate) struct CurateParameters {
    /// Directory searched recursively for `params.txt` files
    #[clap(long)]
    pub(crate) data_path: PathBuf,

    /// Parameter file every accepted experiment must agree with
    #[clap(long)]
    pub(crate) reference: PathBuf,

    /// Name of the experiment, used to name the output file
    #[clap(long)]
    pub(crate) experiment: String,

    /// Directory the list of accepted data paths is written to
    #[clap(long)]
    pub(crate) output_path: PathBuf,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    #[clap(about = "Detects bouts and their features in every recording of a directory.")]
    Analyse(AnalyseParameters),
    #[clap(
        about = "Lists the directories whose params.txt agrees with a reference parameter file."
    )]
    Curate(CurateParameters),
}
