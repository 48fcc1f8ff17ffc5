//! musren CLI entry point

use clap::Parser;
use musren::capabilities;
use musren::config::{Cli, Settings};
use musren::export;
use musren::pipeline::{self, PipelineResult};
use musren::Outcome;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    if let Some(journal) = &cli.undo {
        return run_undo(journal);
    }

    // Validate inputs
    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Probe external tools once, then build settings from CLI
    let capabilities = capabilities::probe(cli.fpcalc.as_deref());
    let settings = Settings::from_cli(&cli, capabilities);
    if let Err(e) = settings.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Run the pipeline
    match pipeline::run(&settings) {
        Ok(result) => {
            print_summary(&result);
            if result.summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = if cli.quiet {
        "error".to_string()
    } else {
        cli.log_level().to_string().to_lowercase()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    if !cli.input.exists() {
        return Err(format!(
            "Input path does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Examples:\n    musren ~/Music\n    musren -r -c -l ./downloads",
            cli.input.display()
        ));
    }

    for output in [&cli.report, &cli.journal].into_iter().flatten() {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(format!(
                    "Output directory does not exist: {}\n\n  Tip: Create it first: mkdir -p {}",
                    parent.display(),
                    parent.display()
                ));
            }
        }
    }

    Ok(())
}

fn run_undo(journal: &Path) -> ExitCode {
    match export::undo_journal(journal) {
        Ok(summary) => {
            println!();
            println!(
                "Restored {} files ({} left unchanged)",
                summary.restored,
                summary.skipped.len()
            );
            for (entry, reason) in &summary.skipped {
                println!("  {}: {}", entry.to.display(), reason);
            }
            if summary.skipped.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_summary(result: &PipelineResult) {
    if result.dry_run {
        return;
    }
    let summary = &result.summary;

    println!();
    println!(
        "Summary: {} renamed, {} tagged only, {} skipped, {} failed (of {} total)",
        summary.count(Outcome::Renamed),
        summary.count(Outcome::TaggedOnly),
        summary.count(Outcome::Skipped),
        summary.count(Outcome::Failed),
        result.total_files
    );

    if summary.has_failures() {
        println!();
        println!("Failed files:");
        for (path, reason) in summary.failures() {
            println!("  {}: {}", path.display(), reason);
        }
    }
}
