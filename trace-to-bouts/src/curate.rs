use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::parameters::{CurateParameters, ParameterMap};

const PARAMETER_FILE_NAME: &str = "params.txt";

fn data_path_file(output_path: &Path, experiment: &str) -> PathBuf {
    output_path.join(format!("{experiment}_DataPath.txt"))
}

/// One directory per line, each ending in a path separator.
fn render_data_paths(directories: &[PathBuf]) -> String {
    directories
        .iter()
        .map(|directory| format!("{}{}\n", directory.display(), std::path::MAIN_SEPARATOR))
        .collect()
}

/// Directories below `data_path` whose parameter file agrees with `reference`.
#[tracing::instrument(skip_all, fields(data_path = %data_path.display(), num_candidates, num_accepted))]
fn find_matching_experiments(data_path: &Path, reference: &ParameterMap) -> Result<Vec<PathBuf>> {
    let pattern = data_path.join("**").join(PARAMETER_FILE_NAME);
    let pattern = pattern
        .to_str()
        .with_context(|| format!("Path {} is not valid UTF-8", data_path.display()))?;

    let candidates = glob::glob(pattern)?
        .filter_map(|entry| entry.inspect_err(|e| warn!("{e}")).ok())
        .collect::<Vec<_>>();
    tracing::Span::current().record("num_candidates", candidates.len());

    let accepted = candidates
        .into_iter()
        .filter(|path| match ParameterMap::load(path) {
            Ok(candidate) => {
                let accept = candidate.matches(reference);
                debug!(path = %path.display(), accept, "Compared parameter file");
                accept
            }
            Err(e) => {
                warn!("{e:#}");
                false
            }
        })
        .filter_map(|path| path.parent().map(Path::to_path_buf))
        .collect::<Vec<_>>();
    tracing::Span::current().record("num_accepted", accepted.len());
    Ok(accepted)
}

/// Writes the directories of every experiment run with the reference parameters.
pub(crate) fn curate(params: &CurateParameters) -> Result<()> {
    let reference = ParameterMap::load(&params.reference)?;
    let accepted = find_matching_experiments(&params.data_path, &reference)?;

    let output = data_path_file(&params.output_path, &params.experiment);
    fs::write(&output, render_data_paths(&accepted))
        .with_context(|| format!("Cannot write {}", output.display()))?;
    info!(
        num_accepted = accepted.len(),
        output = %output.display(),
        "Data paths written"
    );
    Ok(())
}
