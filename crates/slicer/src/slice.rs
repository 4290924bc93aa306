//! PrusaSlicer invocation and output parsing.
//!
//! Slicing happens in two passes, mirroring how the tool is driven from
//! the command line: `--info` to read the model's bounding box (cheap, no
//! G-code), then a full `--export-gcode` run with the requested infill
//! and support settings. Filament usage and print time are read back from
//! comment lines in the emitted G-code.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::error::SlicerError;

/// Default maximum printable dimension (Bambu Lab X1C build volume), mm.
pub const DEFAULT_MAX_DIMENSION_MM: f64 = 256.0;

/// Default deadline for a single slicer invocation.
pub const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Result of a successful slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceOutcome {
    /// Bounding box in millimetres.
    pub size_x: f64,
    pub size_y: f64,
    pub size_z: f64,
    /// Model volume in cm^3; 0 when the tool did not report one.
    pub volume_cm3: f64,
    pub filament_used_g: f64,
    /// Compound duration string, e.g. `"5h 30m"`.
    pub estimated_time: String,
    pub has_supports: bool,
}

/// Boundary trait for the external slicing tool.
///
/// The dispatcher only sees this trait; tests drive the pipeline with a
/// scripted implementation instead of a real slicer binary.
#[async_trait]
pub trait ModelSlicer: Send + Sync {
    /// Slice a stored model file with the given infill fraction and
    /// support setting.
    async fn slice(
        &self,
        filename: &str,
        fill_density: f64,
        enable_supports: bool,
    ) -> Result<SliceOutcome, SlicerError>;
}

// ---------------------------------------------------------------------------
// Production implementation
// ---------------------------------------------------------------------------

/// Configuration for the PrusaSlicer invocation.
#[derive(Debug, Clone)]
pub struct SlicerConfig {
    /// Slicer binary name or path (default `prusa-slicer`).
    pub binary: String,
    /// Printer profile bundle passed via `--load`.
    pub profile: PathBuf,
    /// Directory holding uploaded model files.
    pub model_dir: PathBuf,
    /// Maximum printable dimension in mm.
    pub max_dimension_mm: f64,
    /// Deadline for each external invocation.
    pub timeout: Duration,
}

/// [`ModelSlicer`] backed by the `prusa-slicer` command-line tool.
pub struct PrusaSlicer {
    config: SlicerConfig,
}

impl PrusaSlicer {
    pub fn new(config: SlicerConfig) -> Self {
        Self { config }
    }

    /// Run a slicer command, enforcing the configured deadline.
    ///
    /// The child is killed if the deadline elapses; there is no way to
    /// cancel a slice from the outside once started.
    async fn run(&self, cmd: &mut tokio::process::Command) -> Result<std::process::Output, SlicerError> {
        cmd.kill_on_drop(true);
        match tokio::time::timeout(self.config.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(SlicerError::NotFound(e)),
            Err(_) => Err(SlicerError::Timeout(self.config.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl ModelSlicer for PrusaSlicer {
    async fn slice(
        &self,
        filename: &str,
        fill_density: f64,
        enable_supports: bool,
    ) -> Result<SliceOutcome, SlicerError> {
        let model_path = self.config.model_dir.join(filename);
        if !model_path.exists() {
            return Err(SlicerError::ModelNotFound(
                model_path.to_string_lossy().to_string(),
            ));
        }

        // Pass 1: read the model's bounding box.
        let mut info_cmd = tokio::process::Command::new(&self.config.binary);
        info_cmd.arg("--info").arg(&model_path);
        let info = self.run(&mut info_cmd).await?;
        if !info.status.success() {
            return Err(SlicerError::ExecutionFailed {
                exit_code: info.status.code(),
                stderr: String::from_utf8_lossy(&info.stderr).to_string(),
            });
        }
        let info_stdout = String::from_utf8_lossy(&info.stdout);

        let (size_x, size_y, size_z) =
            parse_model_size(&info_stdout).ok_or(SlicerError::UndeterminableDimensions)?;
        check_dimensions(size_x, size_y, size_z, self.config.max_dimension_mm)?;
        let volume_cm3 = parse_model_volume_cm3(&info_stdout);

        // Pass 2: slice with the requested settings.
        let gcode_path = model_path.with_extension("gcode");
        let mut cmd = tokio::process::Command::new(&self.config.binary);
        cmd.arg("--load")
            .arg(&self.config.profile)
            .arg("--fill-density")
            .arg(format!("{fill_density}"))
            .arg("--export-gcode")
            .arg("--output")
            .arg(&gcode_path);
        if enable_supports {
            cmd.arg("--support-material").arg("--support-material-auto");
        }
        cmd.arg(&model_path);

        tracing::debug!(
            model = %model_path.display(),
            fill_density,
            enable_supports,
            "Invoking slicer"
        );

        let sliced = self.run(&mut cmd).await?;
        if !sliced.status.success() {
            return Err(SlicerError::ExecutionFailed {
                exit_code: sliced.status.code(),
                stderr: String::from_utf8_lossy(&sliced.stderr).to_string(),
            });
        }

        let gcode = tokio::fs::read_to_string(&gcode_path).await?;
        let stats = parse_gcode_stats(&gcode);
        if stats.filament_used_g <= 0.0 {
            return Err(SlicerError::Parse(
                "slicer reported no filament usage".to_string(),
            ));
        }

        Ok(SliceOutcome {
            size_x,
            size_y,
            size_z,
            volume_cm3,
            filament_used_g: stats.filament_used_g,
            estimated_time: stats.estimated_time,
            has_supports: enable_supports,
        })
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Filament and time figures read back from G-code comments.
#[derive(Debug, Clone, PartialEq)]
pub struct GcodeStats {
    pub filament_used_g: f64,
    pub estimated_time: String,
}

fn size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^size_x\s*=\s*(\S+)\s*$\n^size_y\s*=\s*(\S+)\s*$\n^size_z\s*=\s*(\S+)")
            .expect("size regex is valid")
    })
}

fn volume_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^volume\s*=\s*(\S+)").expect("volume regex is valid"))
}

/// Extract the bounding box from `prusa-slicer --info` output.
pub fn parse_model_size(info_output: &str) -> Option<(f64, f64, f64)> {
    let caps = size_re().captures(info_output)?;
    let x = caps[1].parse().ok()?;
    let y = caps[2].parse().ok()?;
    let z = caps[3].parse().ok()?;
    Some((x, y, z))
}

/// Extract the model volume from `--info` output, converted mm^3 -> cm^3.
///
/// Lenient: 0.0 when the tool did not print a volume line.
pub fn parse_model_volume_cm3(info_output: &str) -> f64 {
    volume_re()
        .captures(info_output)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|mm3| mm3 / 1000.0)
        .unwrap_or(0.0)
}

/// Reject any bounding box with a dimension beyond the build volume.
pub fn check_dimensions(
    size_x: f64,
    size_y: f64,
    size_z: f64,
    max_dimension: f64,
) -> Result<(), SlicerError> {
    if size_x > max_dimension || size_y > max_dimension || size_z > max_dimension {
        return Err(SlicerError::Oversized {
            size_x,
            size_y,
            size_z,
            max_dimension,
        });
    }
    Ok(())
}

/// Scan G-code comment lines for filament usage and estimated print time.
///
/// Missing lines leave the defaults (`0.0` grams, `"Unknown"`), matching
/// how the tool's own summary behaves on unusual profiles.
pub fn parse_gcode_stats(gcode: &str) -> GcodeStats {
    let mut stats = GcodeStats {
        filament_used_g: 0.0,
        estimated_time: "Unknown".to_string(),
    };
    for line in gcode.lines() {
        if line.contains("; total filament used [g] =") {
            if let Some(value) = line.split('=').nth(1) {
                stats.filament_used_g = value.trim().parse().unwrap_or(0.0);
            }
        } else if line.contains("; estimated printing time") {
            if let Some(value) = line.split('=').nth(1) {
                stats.estimated_time = value.trim().to_string();
            }
        }
    }
    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
