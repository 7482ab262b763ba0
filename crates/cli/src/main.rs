use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{report::ReportArgs, verify::VerifyArgs};

#[derive(Parser)]
#[command(name = "attest")]
#[command(about = "Evidence-graded verification of Python functions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the functions in a file or directory of Python sources
    Verify(VerifyArgs),

    /// Re-render a previously saved JSON report in another format
    Report(ReportArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Verify(args) => {
            init_tracing(args.verbose);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::verify::execute(args))?
        }
        Commands::Report(args) => commands::report::execute(args)?,
    };

    std::process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
