//! driveaudit - audit a remote drive for sharing, ownership and storage risks.
//!
//! Usage:
//!   driveaudit audit LISTING      Summary and flagged items
//!   driveaudit folders LISTING    Folder rollups (counts and sizes)
//!   driveaudit export LISTING     Export the full audit to JSON
//!   driveaudit folders --snapshot AUDIT.json   Report from an exported audit
//!   driveaudit --help             Show help

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use driveaudit_core::AuditConfig;
use driveaudit_report::{
    Flag, FolderReportConfig, FolderReporter, FolderSort, TrackedReportConfig, TrackedReporter,
};
use driveaudit_tree::{AuditTree, DriveAuditor, ListingStore};

#[derive(Parser)]
#[command(
    name = "driveaudit",
    version,
    about = "Audit a remote drive for sharing, ownership and storage risks",
    long_about = "driveaudit rebuilds the folder tree of a drive listing, resolves \
                  every folder's full path and flags items that are shared, \
                  foreign-owned, trashed, orphaned or unusually large."
)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Primary user (overrides the config file)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Audit a listing and show flagged items
    Audit {
        /// Listing file (JSON)
        listing: PathBuf,

        /// Read an audit written by `export` instead of a listing
        #[arg(long)]
        snapshot: bool,

        /// Only show items with this flag (e.g. "shared", "large_file")
        #[arg(long)]
        flag: Option<Flag>,

        /// Maximum number of items to show
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show folders with their descendant counts and sizes
    Folders {
        /// Listing file (JSON)
        listing: PathBuf,

        /// Read an audit written by `export` instead of a listing
        #[arg(long)]
        snapshot: bool,

        /// Hide folders with fewer descendants than this
        #[arg(short, long, default_value = "0")]
        min_children: u64,

        /// Sort by "path", "count" or "size"
        #[arg(short, long, default_value = "path")]
        sort: FolderSort,

        /// Maximum number of folders to show
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export the full audit to JSON
    Export {
        /// Listing file (JSON)
        listing: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
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
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref(), cli.user)?;

    match cli.command {
        Command::Audit {
            listing,
            snapshot,
            flag,
            top,
            format,
        } => {
            let tree = load_audit(&config, &listing, snapshot)?;
            run_audit(&tree, &listing, flag, top, format)?
        }
        Command::Folders {
            listing,
            snapshot,
            min_children,
            sort,
            top,
            format,
        } => {
            let tree = load_audit(&config, &listing, snapshot)?;
            run_folders(&tree, min_children, sort, top, format)?
        }
        Command::Export { listing, output } => run_export(&config, &listing, output)?,
    }

    Ok(())
}

/// Install the stderr log subscriber. `DRIVEAUDIT_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("DRIVEAUDIT_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, user: Option<String>) -> Result<AuditConfig> {
    let mut config = match path {
        Some(path) => AuditConfig::load(path).context("Failed to load config")?,
        None => match AuditConfig::default_path().filter(|p| p.exists()) {
            Some(default) => AuditConfig::load(&default)
                .with_context(|| format!("Failed to load {}", default.display()))?,
            None => AuditConfig::default(),
        },
    };
    if let Some(user) = user {
        config.primary_user = user;
    }
    if config.primary_user.is_empty() {
        tracing::warn!("no primary user configured; every item will count as not owned by you");
    }
    Ok(config)
}

/// Load a listing and run the audit.
fn audit_listing(config: &AuditConfig, listing: &Path) -> Result<AuditTree> {
    eprintln!("Auditing {}...", listing.display());

    let store = ListingStore::from_path(listing).context("Failed to read listing")?;
    let tree = DriveAuditor::new()
        .audit(config, &store, store.enumerate())
        .context("Audit failed")?;
    Ok(tree)
}

/// Run an audit, or load an exported one when `snapshot` is set.
fn load_audit(config: &AuditConfig, input: &Path, snapshot: bool) -> Result<AuditTree> {
    if !snapshot {
        return audit_listing(config, input);
    }
    let tree = AuditTree::load(input).context("Failed to read exported audit")?;
    tracing::info!(
        audited_at = %tree.audited_at,
        folders = tree.registry.len(),
        "loaded exported audit"
    );
    Ok(tree)
}

/// Display the summary and flagged items.
fn run_audit(
    tree: &AuditTree,
    listing: &Path,
    flag: Option<Flag>,
    top: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let report_config = TrackedReportConfig {
        only_flag: flag,
        max_rows: top,
    };
    let report = TrackedReporter::with_config(report_config).report(tree);

    match format {
        OutputFormat::Text => {
            let stats = &tree.stats;
            println!();
            println!("{}", "─".repeat(70));
            println!(" {} - {}", listing.display(), format_size(stats.total_size));
            println!(
                " {} items ({} files, {} folders), {} flagged",
                stats.items_recorded, stats.files_recorded, stats.folders_recorded, report.total_tracked
            );
            println!(
                " {} folder lookups ({} failed), {} permission fetches",
                stats.lazy_lookups, stats.lazy_failures, stats.permission_fetches
            );
            println!(" Audited in {:.2}s", tree.audit_duration.as_secs_f64());
            println!("{}", "─".repeat(70));
            println!();

            println!(" Flags:");
            for count in &report.flag_counts {
                println!("   {:<20} {:>8}", count.flag.to_string(), count.count);
            }
            println!();

            if report.is_empty() {
                println!(" No flagged items.");
            } else {
                for row in &report.rows {
                    let size = row.size.map(format_size).unwrap_or_else(|| "-".to_string());
                    println!(
                        " {:<50} {:>10}  {}",
                        truncate(&row.path, 50),
                        size,
                        row.flag_names().join(",")
                    );
                    if !row.sharing.users_domains_groups_with_access.is_empty() {
                        println!(
                            "   shared with: {}",
                            row.sharing.users_domains_groups_with_access.join(", ")
                        );
                    }
                }
            }

            if tree.has_warnings() {
                println!();
                println!("{} warning(s) during audit", tree.warnings.len());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Display folder rollups.
fn run_folders(
    tree: &AuditTree,
    min_children: u64,
    sort: FolderSort,
    top: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let report_config = FolderReportConfig::builder()
        .min_descendants(min_children)
        .sort_by(sort)
        .max_rows(top)
        .build()
        .context("Invalid folder report options")?;
    let report = FolderReporter::with_config(report_config).report(tree);

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Folder Report");
            println!(
                " {} folders ({} roots, {} orphans, {} unreachable)",
                report.total_folders, report.root_count, report.orphan_count, report.unreachable_count
            );
            println!("{}", "─".repeat(70));
            println!();

            if report.is_empty() {
                println!(" No folders match.");
            } else {
                println!(" {:>10} {:>10}  Path", "Items", "Size");
                for row in &report.rows {
                    println!(
                        " {:>10} {:>10}  {}",
                        row.descendant_count,
                        format_size(row.descendant_size),
                        row.path
                    );
                }
                if report.is_truncated() {
                    println!(
                        "  ... and {} more",
                        report.matching_folders - report.rows.len() as u64
                    );
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Export the full audit to JSON.
fn run_export(config: &AuditConfig, listing: &Path, output: Option<PathBuf>) -> Result<()> {
    let tree = audit_listing(config, listing)?;
    let json = serde_json::to_string_pretty(&tree)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max characters, keeping the tail of long paths.
fn truncate(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(len - (max_len - 1)).collect();
        format!("…{tail}")
    }
}
