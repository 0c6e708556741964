use crate::error::{CoreError, Side};
use encore_domain_eval::{compare, ComparisonReport};
use encore_domain_score::{decode, require_notes, DecodedMidi, MidiSource};
use encore_ports::storage::SettingsDto;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Clone, Debug, Serialize)]
pub struct ComparisonOutcome {
    pub generated: DecodedMidi,
    pub reference: DecodedMidi,
    pub report: ComparisonReport,
}

/// Reads a source file: `.json` files are cached [`DecodedMidi`] values, anything else is SMF bytes.
pub fn load_source(path: &Path) -> Result<MidiSource, CoreError> {
    let data = fs::read(path).map_err(|e| CoreError::Io(format!("{}: {e}", path.display())))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let decoded: DecodedMidi =
            serde_json::from_slice(&data).map_err(|e| CoreError::Serde(e.to_string()))?;
        return Ok(MidiSource::Decoded(decoded));
    }
    Ok(MidiSource::Bytes(data))
}

pub fn decode_source(
    side: Side,
    source: MidiSource,
    require_non_empty: bool,
) -> Result<DecodedMidi, CoreError> {
    let decoded = decode(source).map_err(|source| CoreError::Import { side, source })?;
    if require_non_empty {
        require_notes(&decoded).map_err(|source| CoreError::Import { side, source })?;
    }

    let diagnostics = decoded.diagnostics;
    if diagnostics.tempo_defaulted {
        warn!(%side, "no tempo at tick 0, timing assumes 120 BPM until the first tempo event");
    }
    if diagnostics.unclosed_notes > 0 || diagnostics.orphan_note_offs > 0 {
        warn!(
            %side,
            unclosed = diagnostics.unclosed_notes,
            orphan_note_offs = diagnostics.orphan_note_offs,
            "midi has unpaired note events"
        );
    }
    Ok(decoded)
}

pub fn compare_sources(
    generated: MidiSource,
    reference: MidiSource,
    settings: &SettingsDto,
) -> Result<ComparisonOutcome, CoreError> {
    let generated = decode_source(Side::Generated, generated, settings.require_non_empty)?;
    let reference = decode_source(Side::Reference, reference, settings.require_non_empty)?;
    let report = compare(&generated.notes, &reference.notes, &settings.compare)?;

    info!(
        overall_score = report.overall_score,
        matched = report.matched_count,
        generated = report.generated_count,
        reference = report.reference_count,
        "comparison finished"
    );

    Ok(ComparisonOutcome {
        generated,
        reference,
        report,
    })
}

pub fn compare_paths(
    generated: &Path,
    reference: &Path,
    settings: &SettingsDto,
) -> Result<ComparisonOutcome, CoreError> {
    info!(
        generated = %generated.display(),
        reference = %reference.display(),
        "comparing"
    );
    compare_sources(load_source(generated)?, load_source(reference)?, settings)
}
