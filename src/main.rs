//! twintree - find duplicate files and duplicate directory subtrees.
//!
//! Usage:
//!   twintree DIR               Report duplicates anywhere under DIR
//!   twintree DIR1 DIR2 [...]   Report duplicates present in at least two roots
//!   twintree --help            Show help

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use twintree_analyze::{AnalyzeConfig, DuplicateAnalyzer, DuplicateReport};

#[derive(Parser)]
#[command(
    name = "twintree",
    version,
    about = "Find duplicate files and directory subtrees",
    long_about = "twintree reports duplicate files and whole duplicate directories.\n\n\
                  With one root every duplicate below it is reported, relative to the \
                  root. With several roots only duplicates found in at least two of \
                  them are reported. A duplicated directory is reported once; the \
                  files inside it are not repeated."
)]
struct Cli {
    /// Roots to compare
    #[arg(required = true, num_args = 1..)]
    paths: Vec<PathBuf>,

    /// Log candidates skipped because they could not be read
    #[arg(long)]
    warn_unreadable: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = AnalyzeConfig::builder()
        .roots(cli.paths)
        .warn_unreadable(cli.warn_unreadable)
        .build()
        .context("Invalid arguments")?;

    let report = DuplicateAnalyzer::run(config).context("Scan failed")?;

    info!(
        groups = report.group_count,
        paths = report.total_duplicate_paths(),
        wasted = %format_size(report.total_wasted_space),
        "Duplicate search finished"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => write_text(&mut out, &report)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level comes from the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// One path per line, each group followed by a blank line.
fn write_text(out: &mut impl Write, report: &DuplicateReport) -> io::Result<()> {
    for group in &report.groups {
        for line in group.display_lines() {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use twintree_analyze::{DuplicateGroup, EntryKind, RootMode, StrongFingerprint};

    fn report(groups: Vec<DuplicateGroup>) -> DuplicateReport {
        DuplicateReport {
            mode: RootMode::Single,
            group_count: groups.len(),
            groups,
            nodes_indexed: 0,
            files_hashed: 0,
            skipped_unreadable: 0,
            unreadable: Vec::new(),
            total_wasted_space: 0,
        }
    }

    #[test]
    fn test_text_output_blocks() {
        let groups = vec![
            DuplicateGroup {
                depth: 1,
                kind: EntryKind::Directory,
                fingerprint: StrongFingerprint::new([1; 32]),
                size: 4,
                paths: vec![PathBuf::from("a"), PathBuf::from("b")],
                wasted_bytes: 4,
            },
            DuplicateGroup {
                depth: 0,
                kind: EntryKind::File,
                fingerprint: StrongFingerprint::new([2; 32]),
                size: 3,
                paths: vec![PathBuf::from("x.txt"), PathBuf::from("c/y.txt")],
                wasted_bytes: 3,
            },
        ];

        let mut out = Vec::new();
        write_text(&mut out, &report(groups)).unwrap();
        let text = String::from_utf8(out).unwrap();

        let sep = std::path::MAIN_SEPARATOR;
        assert_eq!(text, format!("a{sep}\nb{sep}\n\nx.txt\nc/y.txt\n\n"));
    }

    #[test]
    fn test_text_output_empty() {
        let mut out = Vec::new();
        write_text(&mut out, &report(Vec::new())).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_cli_requires_a_path() {
        assert!(Cli::try_parse_from(["twintree"]).is_err());

        let cli = Cli::try_parse_from(["twintree", "/a", "/b", "-vv", "--warn-unreadable"]).unwrap();
        assert_eq!(cli.paths.len(), 2);
        assert_eq!(cli.verbose, 2);
        assert!(cli.warn_unreadable);
        assert!(matches!(cli.format, OutputFormat::Text));
    }
}
