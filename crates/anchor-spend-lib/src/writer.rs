use crate::data_structures::PresenterSummary;
use crate::error::{AttributionError, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Removes any previous result at `path` and creates missing parent directories.
///
/// Fails when the old file cannot be removed, typically because another
/// program still holds it open.
pub fn prepare_output(path: &Path) -> Result<()> {
    let output_error = |source: io::Error| AttributionError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            debug!(dir = %parent.display(), "creating output directory");
            fs::create_dir_all(parent).map_err(output_error)?;
        }
    }

    if path.exists() {
        fs::remove_file(path).map_err(output_error)?;
    }
    Ok(())
}

pub fn write_summaries(path: &Path, summaries: &[PresenterSummary]) -> Result<()> {
    prepare_output(path)?;

    let output_error = |source: io::Error| AttributionError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(|e| output_error(e.into()))?;
    for summary in summaries {
        writer.serialize(summary).map_err(|e| output_error(e.into()))?;
    }
    writer.flush().map_err(output_error)?;

    info!(path = %path.display(), rows = summaries.len(), "wrote presenter summary");
    Ok(())
}
