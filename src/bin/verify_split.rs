#![cfg(not(tarpaulin_include))]

use clap::Parser;
use conference_dashboard::loader::read_csv;
use conference_dashboard::verify::{compare, VerifyOptions};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "verify-split")]
#[command(about = "Check a CSV with split organizer columns against the original")]
struct Args {
    /// Original CSV with the organizer JSON column
    #[arg(long, default_value = "thematic_sessions_submissions.csv")]
    orig: PathBuf,
    /// CSV with the organizer column split into sub-fields
    #[arg(long, default_value = "new.csv")]
    new: PathBuf,
    /// Stop after this many diffs
    #[arg(long, default_value_t = 50)]
    max_diffs: usize,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let options = VerifyOptions {
        max_diffs: args.max_diffs,
        ..VerifyOptions::default()
    };

    let outcome = read_csv(&args.orig)
        .and_then(|o| read_csv(&args.new).map(|n| (o, n)))
        .and_then(|(o, n)| compare(&o, &n, &options));

    let (summary, diffs) = match outcome {
        Ok(result) => result,
        Err(e) => {
            error!("verification failed: {e}");
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    println!("Summary");
    println!("- orig_path: {}", args.orig.display());
    println!("- new_path: {}", args.new.display());
    println!("{summary}");

    if !diffs.is_empty() {
        println!("\nDiffs (showing {}):", diffs.len());
        for d in &diffs {
            println!("- id={} field={}", d.id, d.field);
            println!("  orig: {:?}", d.original);
            println!("  new : {:?}", d.new);
        }
    } else if summary.exit_code(&diffs) == 3 {
        println!("\nNo field-level diffs found, but ID sets differ.");
    } else {
        println!("\nOK: No differences detected for compared fields, and no rows lost/added.");
    }

    ExitCode::from(summary.exit_code(&diffs) as u8)
}
