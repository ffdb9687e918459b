//! nfce - NFC-e batch reporter
//!
//! Turns a ZIP archive of NFC-e XML documents into an XLSX report, or dumps
//! the records extracted from individual XML files.

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{Config, ReportOverrides};
use nfce_core::{parse_document, ParsedDocument};
use nfce_pipeline::process_with_options;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Check if verbose output is requested
    const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Log filter used when `RUST_LOG` is unset
    const fn default_log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "nfce",
    about = "Build XLSX reports from NFC-e XML archives",
    long_about = "Build XLSX reports from ZIP archives of NFC-e XML documents.\n\
                  \n\
                  Authorized invoices and cancellation events are extracted into a\n\
                  documents sheet, a CST/CFOP tax summary, a per-file status sheet and\n\
                  a list of breaks in the document numbering.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the XLSX report for a ZIP archive of NFC-e XML files
    #[command(long_about = "Build the XLSX report for a ZIP archive of NFC-e XML files.\n\
                      \n\
                      Members ending in .xml (any case) are processed in archive order.\n\
                      Files that fail to parse are listed in the Status sheet and do not\n\
                      stop the batch.\n\
                      \n\
                      Defaults can be set via .nfce.toml configuration file.")]
    Report {
        /// ZIP archive with the XML documents
        archive: PathBuf,

        /// Report path (default: "Dados NFC-e.xlsx" next to the archive)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Split summary rows by tax rate as well as CST and CFOP
        #[arg(long)]
        group_by_rate: bool,

        /// Excel number format for money cells (default: "R$ #,##0.00")
        #[arg(long, value_name = "FMT")]
        currency_format: Option<String>,
    },

    /// Print the records extracted from NFC-e XML files as JSON
    Inspect {
        /// XML files to parse
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// One successfully parsed file, as printed by `inspect`
#[derive(Debug, Serialize)]
struct Inspection {
    source: String,
    #[serde(flatten)]
    parsed: ParsedDocument,
}

fn init_logging(verbosity: Verbosity) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.default_log_filter()),
    )
    .target(env_logger::Target::Stderr)
    .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);
    init_logging(verbosity);

    // Load configuration files
    let (user_config, project_config) = Config::discover_configs();
    let config = Config::merge(user_config, project_config);

    match args.command {
        Commands::Report {
            archive,
            output,
            group_by_rate,
            currency_format,
        } => {
            let overrides = ReportOverrides {
                output,
                currency_format,
                group_by_rate,
            };
            report_command(archive, overrides, &config, verbosity)
        }
        Commands::Inspect { files } => inspect_command(&files, verbosity),
    }
}

fn report_command(
    archive: PathBuf,
    overrides: ReportOverrides,
    config: &Config,
    verbosity: Verbosity,
) -> Result<()> {
    let settings = config.report_settings(&archive, overrides);

    let blob = fs::read(&archive)
        .with_context(|| format!("Failed to read archive: {}", archive.display()))?;
    let outcome = process_with_options(&blob, &settings.options)
        .with_context(|| format!("Failed to process archive: {}", archive.display()))?;

    fs::write(&settings.output, &outcome.report)
        .with_context(|| format!("Failed to write report: {}", settings.output.display()))?;

    if !verbosity.should_show_output() {
        return Ok(());
    }

    if verbosity.is_verbose() {
        for status in &outcome.statuses {
            let label = if status.is_error() {
                status.outcome.label().red().bold()
            } else {
                status.outcome.label().green()
            };
            println!("  {label:>4}  {}", status.source_name);
        }
    }

    println!(
        "{} {} documents, {} failed, {} numbering gaps",
        "Processed:".green().bold(),
        outcome.document_count,
        outcome.error_count,
        outcome.gaps.len()
    );

    let failures: Vec<_> = outcome.statuses.iter().filter(|s| s.is_error()).collect();
    if !failures.is_empty() {
        println!("{}", "Failed files:".yellow().bold());
        for status in failures {
            let message = status.message.as_deref().unwrap_or("unknown error");
            println!("  {}: {message}", status.source_name);
        }
    }

    println!(
        "{} {}",
        "Report:".cyan().bold(),
        settings.output.display()
    );
    Ok(())
}

fn inspect_command(files: &[PathBuf], verbosity: Verbosity) -> Result<()> {
    let mut inspections = Vec::with_capacity(files.len());
    let mut failed = 0usize;

    for path in files {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

        match parse_document(&bytes) {
            Ok(parsed) => inspections.push(Inspection {
                source: path.display().to_string(),
                parsed,
            }),
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {e}", "Error:".red().bold(), path.display());
            }
        }
    }

    if verbosity.should_show_output() && !inspections.is_empty() {
        let json = serde_json::to_string_pretty(&inspections)
            .context("Failed to serialize records")?;
        println!("{json}");
    }

    if failed > 0 {
        bail!("{failed} of {} files could not be parsed", files.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::Verbose.default_log_filter(), "debug");
        assert!(!Verbosity::Quiet.should_show_output());
    }

    #[test]
    fn test_report_arguments() {
        let args = Args::try_parse_from([
            "nfce",
            "report",
            "notas.zip",
            "-o",
            "saida.xlsx",
            "--group-by-rate",
        ])
        .unwrap();

        match args.command {
            Commands::Report {
                archive,
                output,
                group_by_rate,
                currency_format,
            } => {
                assert_eq!(archive, PathBuf::from("notas.zip"));
                assert_eq!(output, Some(PathBuf::from("saida.xlsx")));
                assert!(group_by_rate);
                assert_eq!(currency_format, None);
            }
            Commands::Inspect { .. } => panic!("expected report command"),
        }
    }

    #[test]
    fn test_inspect_requires_files() {
        assert!(Args::try_parse_from(["nfce", "inspect"]).is_err());
    }
}
