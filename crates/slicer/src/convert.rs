//! Model format conversion (3MF -> STL).
//!
//! The slicing pipeline works on STL; 3MF uploads are converted up front
//! so a conversion failure rejects the submission before a job exists.
//! Conversion is delegated to the slicer binary's `--export-stl` mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SlicerError;

/// Convert a 3MF model file to STL next to the original.
///
/// Returns the path of the new STL file. The original file is left in
/// place.
pub async fn convert_to_stl(
    binary: &str,
    model_path: &Path,
    timeout: Duration,
) -> Result<PathBuf, SlicerError> {
    if !model_path.exists() {
        return Err(SlicerError::ModelNotFound(
            model_path.to_string_lossy().to_string(),
        ));
    }

    let output_path = model_path.with_extension("stl");

    let mut cmd = tokio::process::Command::new(binary);
    cmd.arg("--export-stl")
        .arg("--output")
        .arg(&output_path)
        .arg(model_path)
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(SlicerError::NotFound(e)),
        Err(_) => return Err(SlicerError::Timeout(timeout.as_secs())),
    };

    if !output.status.success() {
        return Err(SlicerError::Conversion(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }
    if !output_path.exists() {
        return Err(SlicerError::Conversion(
            "converter produced no output file".to_string(),
        ));
    }

    tracing::debug!(
        from = %model_path.display(),
        to = %output_path.display(),
        "Converted model to STL"
    );

    Ok(output_path)
}
