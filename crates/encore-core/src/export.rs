use crate::error::CoreError;
use crate::pipeline::ComparisonOutcome;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct AppVersion {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

/// Writes the report and both decoded note sets as JSON files into `dir`.
///
/// `generated.json` and `reference.json` can be fed back as cached inputs.
pub fn export_report_bundle(dir: &Path, outcome: &ComparisonOutcome) -> Result<(), CoreError> {
    fs::create_dir_all(dir).map_err(|e| CoreError::Io(e.to_string()))?;

    let app_version = AppVersion {
        name: "Encore".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let platform = PlatformInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    };

    write_json(&dir.join("app_version.json"), &app_version)?;
    write_json(&dir.join("platform.json"), &platform)?;
    write_json(&dir.join("report.json"), &outcome.report)?;
    write_json(&dir.join("generated.json"), &outcome.generated)?;
    write_json(&dir.join("reference.json"), &outcome.reference)?;

    debug!(dir = %dir.display(), "exported report bundle");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| CoreError::Serde(e.to_string()))?;
    fs::write(path, data).map_err(|e| CoreError::Io(e.to_string()))
}
