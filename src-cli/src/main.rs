mod args;

use args::{parse_args, Command, CompareArgs, USAGE};
use encore_core::{compare_paths, export_report_bundle, load_source, ComparisonOutcome};
use encore_domain_score::decode;
use encore_infra_storage_fs::FsStorage;
use encore_ports::settings::Metric;
use encore_ports::storage::{SettingsDto, StoragePort};
use std::env;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let argv: Vec<String> = env::args().skip(1).collect();
    let command = match parse_args(&argv) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            process::exit(2);
        }
    };

    let storage = FsStorage::default();
    let settings = match storage.load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings from {}: {e}", storage.settings_path().display());
            process::exit(1);
        }
    };
    init_tracing(&settings);

    if let Err(e) = run(command, &storage, settings) {
        error!(%e, "command failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(settings: &SettingsDto) {
    let fallback = settings.log_filter.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command, storage: &FsStorage, settings: SettingsDto) -> Result<(), String> {
    match command {
        Command::Compare(args) => run_compare(args, settings),
        Command::Decode { path } => {
            let source = load_source(&path).map_err(|e| e.to_string())?;
            let decoded = decode(source).map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&decoded).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
        Command::Config { reset } => {
            let settings = if reset {
                let defaults = SettingsDto::default();
                storage.save_settings(&defaults).map_err(|e| e.to_string())?;
                info!(path = %storage.settings_path().display(), "settings reset");
                defaults
            } else {
                settings
            };
            let json = serde_json::to_string_pretty(&settings).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
    }
}

fn run_compare(args: CompareArgs, mut settings: SettingsDto) -> Result<(), String> {
    if let Some(secs) = args.timing_tolerance {
        settings.compare.tolerances.timing_seconds = secs;
    }
    if let Some(semitones) = args.pitch_tolerance {
        settings.compare.tolerances.pitch_semitones = semitones;
    }
    settings.require_non_empty |= args.require_notes;

    let outcome =
        compare_paths(&args.generated, &args.reference, &settings).map_err(|e| e.to_string())?;

    if let Some(dir) = &args.out_dir {
        export_report_bundle(dir, &outcome).map_err(|e| e.to_string())?;
        info!(dir = %dir.display(), "report written");
    }

    if args.json {
        let json = serde_json::to_string_pretty(&outcome.report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

fn print_summary(outcome: &ComparisonOutcome) {
    let report = &outcome.report;
    println!("overall score        {:.3}", report.overall_score);
    println!(
        "notes                {} matched / {} generated / {} reference",
        report.matched_count, report.generated_count, report.reference_count
    );
    println!(
        "unmatched            {} generated, {} reference",
        report.unmatched_generated_count, report.unmatched_reference_count
    );
    println!("mean onset offset    {:+.3} s", report.mean_onset_delta);
    for metric in Metric::ALL {
        println!("{:<20} {:.3}", metric.name(), report.metrics.get(metric));
    }
    for (side, decoded) in [("generated", &outcome.generated), ("reference", &outcome.reference)] {
        let diagnostics = decoded.diagnostics;
        if diagnostics.tempo_defaulted || diagnostics.unclosed_notes > 0 {
            println!(
                "note: {side} input assumed default tempo={} and dropped {} unclosed notes",
                diagnostics.tempo_defaulted, diagnostics.unclosed_notes
            );
        }
    }
}
