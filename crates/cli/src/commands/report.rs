//! The report command: load a saved JSON report and render it in another
//! format. Round-tripping through JSON is lossless, so this works on any
//! report produced by the verify command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use attest_verifier::{ExportFormat, ReportExporter, VerificationReport};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// A JSON report produced by `attest verify --format json`
    #[arg(value_name = "REPORT")]
    pub input: PathBuf,

    /// Output format: json, sarif, console or html
    #[arg(short, long, default_value = "console")]
    pub format: String,

    /// Write the rendered report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: ReportArgs) -> Result<i32> {
    let format: ExportFormat = args.format.parse()?;

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading report {}", args.input.display()))?;
    let report: VerificationReport = serde_json::from_str(&content)
        .with_context(|| format!("parsing report {}", args.input.display()))?;

    let rendered = ReportExporter::new(&report).export(format)?;
    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{rendered}"),
    }

    Ok(0)
}
