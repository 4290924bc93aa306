/// Error type for slicer invocations.
///
/// Every variant fails the enclosing job; the distinction is surfaced in
/// the job's error message.
#[derive(Debug, thiserror::Error)]
pub enum SlicerError {
    #[error("slicer binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("model file not found: {0}")]
    ModelNotFound(String),

    #[error("slicer execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("slicer did not finish within {0}s")]
    Timeout(u64),

    #[error(
        "Model is too large to print ({size_x:.1} x {size_y:.1} x {size_z:.1} mm exceeds \
         {max_dimension:.0} mm build volume)"
    )]
    Oversized {
        size_x: f64,
        size_y: f64,
        size_z: f64,
        max_dimension: f64,
    },

    #[error("could not determine model dimensions from slicer output")]
    UndeterminableDimensions,

    #[error("failed to parse slicer output: {0}")]
    Parse(String),

    #[error("format conversion failed: {0}")]
    Conversion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
