//! The verify command: discover Python sources, run the pipeline over each,
//! export reports. A file that fails to parse is reported and skipped; the
//! remaining files are still verified.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::{error, info};
use walkdir::WalkDir;

use attest_verifier::{
    ExportFormat, HttpProvider, Pipeline, ReportExporter, VerificationReport, VerifierConfig,
};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Python file or directory to verify
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output format: json, sarif, console or html
    #[arg(short, long, default_value = "console")]
    pub format: String,

    /// Write the report here instead of stdout. With a directory input this
    /// is treated as a directory and one report is written per source file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable the model-assisted semantic tier
    #[arg(long)]
    pub llm: bool,

    /// Override the configured model id
    #[arg(long)]
    pub model: Option<String>,

    /// YAML configuration file (environment variables are used otherwise)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn execute(args: VerifyArgs) -> Result<i32> {
    let format: ExportFormat = args.format.parse()?;

    let mut config = match &args.config {
        Some(path) => VerifierConfig::from_yaml_file(path)?,
        None => VerifierConfig::from_env(),
    };
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }

    let files = discover_sources(&args.input)?;
    if files.is_empty() {
        bail!("no Python files found under {}", args.input.display());
    }

    let mut pipeline = Pipeline::new(config.clone());
    if args.llm {
        let provider = HttpProvider::new(
            "cerebras",
            &config.llm.endpoint,
            &config.llm.model,
            config.llm.api_key.clone(),
        )
        .with_timeout_secs(config.llm.timeout_seconds)
        .with_max_attempts(config.llm.max_attempts);
        pipeline = pipeline.with_provider(Arc::new(provider));
    }

    let mut reports = Vec::new();
    let mut failed_files = 0usize;

    for file in &files {
        match pipeline.verify_file(file).await {
            Ok(report) => reports.push((file.clone(), report)),
            Err(e) => {
                failed_files += 1;
                error!(file = %file.display(), error = %e, "verification failed");
                eprintln!("{} {}: {e}", "error:".red().bold(), file.display());
            }
        }
    }

    if reports.is_empty() {
        bail!("all {failed_files} input files failed to verify");
    }

    write_reports(&reports, format, args.output.as_deref())?;

    let critical = reports
        .iter()
        .filter(|(_, r)| r.has_critical_findings())
        .count();
    info!(
        files = reports.len(),
        failed = failed_files,
        critical_files = critical,
        "verification run complete"
    );

    Ok(if critical > 0 { 1 } else { 0 })
}

fn discover_sources(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map(|e| e == "py").unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}

fn write_reports(
    reports: &[(PathBuf, VerificationReport)],
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        None => {
            for (_, report) in reports {
                println!("{}", ReportExporter::new(report).export(format)?);
            }
        }
        Some(path) if reports.len() == 1 => {
            let content = ReportExporter::new(&reports[0].1).export(format)?;
            std::fs::write(path, content)
                .with_context(|| format!("writing report to {}", path.display()))?;
        }
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating report directory {}", dir.display()))?;
            for (file, report) in reports {
                let stem = file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("report");
                let target = dir.join(format!("{stem}.{}", extension(format)));
                let content = ReportExporter::new(report).export(format)?;
                std::fs::write(&target, content)
                    .with_context(|| format!("writing report to {}", target.display()))?;
            }
        }
    }
    Ok(())
}

fn extension(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Json => "json",
        ExportFormat::Sarif => "sarif",
        ExportFormat::Console => "txt",
        ExportFormat::Html => "html",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn discovers_only_python_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.py", "b.txt", "c.py"] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            writeln!(f, "x = 1").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/d.py"), "y = 2\n").unwrap();

        let files = discover_sources(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.py", "c.py", "d.py"]);
    }

    #[test]
    fn single_file_input_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("solo.py");
        std::fs::write(&file, "x = 1\n").unwrap();
        let files = discover_sources(&file).unwrap();
        assert_eq!(files, vec![file]);
    }
}
