use clap::Parser;
use paidstamp::config::{Preset, StampOptions};
use paidstamp::document::{DocumentProvider, LopdfDocument};
use paidstamp::logging::{init_subscriber, LogFormat};
use paidstamp::processor::stamp_document;
use paidstamp::StampError;
use std::path::PathBuf;
use std::process::ExitCode;

/// Paidstamp - stamps a rotated "paid" marker next to the total on invoice PDFs
#[derive(Parser, Debug)]
#[command(name = "paidstamp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input PDF
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the stamped PDF
    #[arg(short, long)]
    output: PathBuf,

    /// Options override as a JSON object; malformed input means defaults
    #[arg(long, default_value = "")]
    options: String,

    /// Read the options override from a JSON or YAML file
    #[arg(long)]
    options_file: Option<PathBuf>,

    /// Option set the overrides are applied to
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    preset: Preset,

    /// Log output format (text or json)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Print a JSON placement report to stdout after saving
    #[arg(long)]
    report: bool,

    /// Plan pages concurrently
    #[arg(long)]
    parallel: bool,
}

/// Preset first, then the options file, then the inline blob.
fn resolve_options(args: &Args) -> Result<StampOptions, StampError> {
    let mut options = args.preset.options();
    if let Some(path) = &args.options_file {
        options = StampOptions::from_file(options, path)?;
    }
    Ok(StampOptions::parse_over(options, &args.options))
}

fn run(args: &Args) -> Result<(), StampError> {
    let options = resolve_options(args)?;

    let mut doc = LopdfDocument::load(&args.input)?;
    tracing::info!(
        input = %args.input.display(),
        pages = doc.page_count(),
        preset = ?args.preset,
        "document loaded"
    );

    let outcomes = stamp_document(&mut doc, &options, args.parallel)?;
    doc.save(&args.output)?;

    tracing::info!(
        output = %args.output.display(),
        pages = outcomes.len(),
        "stamped document saved"
    );

    if args.report {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_subscriber(args.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
