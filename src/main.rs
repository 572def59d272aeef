mod cleaner;
mod error;
mod scanner;
mod selector;
mod workshop;

use clap::Parser;
use colored::Colorize;
use error::WorkshopError;
use indicatif::{ProgressBar, ProgressStyle};
use scanner::Subscription;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use workshop::WorkshopPaths;

const TITLE_WIDTH: usize = 48;

#[derive(Parser)]
#[command(name = "workshopclean")]
#[command(about = "List Steam workshop subscriptions by size and delete the ones you pick")]
#[command(version)]
struct Cli {
    /// Steam installation directory
    steam_path: PathBuf,

    /// Workshop app whose content folder is scanned
    #[arg(long, default_value = workshop::DEFAULT_APP_ID)]
    app_id: String,

    /// Show what would be deleted without deleting
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn build_display_item(index: usize, sub: &Subscription) -> String {
    let title = if sub.details.title.is_empty() {
        sub.details.folder_name.as_str()
    } else {
        sub.details.title.as_str()
    };
    let title = console::pad_str(title, TITLE_WIDTH, console::Alignment::Left, Some("..."));
    format!(
        "{:>4}: {}  {:>10}  {}",
        index,
        title,
        sub.size_human(),
        format!("[{}]", sub.details.kind).dimmed()
    )
}

fn progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn resolve_steam_path(path: &Path) -> Result<PathBuf, String> {
    path.canonicalize()
        .map_err(|e| format!("Invalid path: {}: {e}", path.display()))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let steam_path = resolve_steam_path(&cli.steam_path).unwrap_or_else(|msg| {
        eprintln!("{} {msg}", "error:".red().bold());
        std::process::exit(1);
    });

    let paths = WorkshopPaths::new(steam_path, &cli.app_id);
    let result = run(
        &cli,
        &paths,
        &mut io::stdout(),
        selector::read_indices,
        selector::read_yes_no,
    );
    if let Err(e) = result {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}

/// Scan, list, select, confirm, delete.
///
/// Operator input comes from `read_indices` and `confirm`, so nothing here
/// needs a terminal. `confirm` is not called for `--dry-run` or `--yes`.
fn run<W, I, C>(
    cli: &Cli,
    paths: &WorkshopPaths,
    out: &mut W,
    read_indices: I,
    confirm: C,
) -> Result<(), WorkshopError>
where
    W: Write,
    I: FnOnce() -> Result<Vec<i64>, WorkshopError>,
    C: FnOnce() -> Result<bool, WorkshopError>,
{
    let content_root = paths.content_root();

    writeln!(out, "{}\n\t{}", "Steam path:".bold(), paths.steam_root().display())?;
    writeln!(out, "{}\n\t{}\n", "Workshop content path:".bold(), content_root.display())?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(progress_style("{spinner:.cyan} {msg}"));
    spinner.set_message(format!("Scanning {}...", content_root.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let scanned = scanner::scan(&content_root);
    spinner.finish_and_clear();
    let inventory = scanned?;

    if inventory.is_empty() {
        writeln!(out, "{}", "No subscriptions found.".yellow())?;
        return Ok(());
    }

    writeln!(
        out,
        "Found {} subscriptions:\n",
        inventory.len().to_string().green().bold()
    )?;
    for (i, sub) in inventory.iter().enumerate() {
        writeln!(out, "{}", build_display_item(i, sub))?;
    }
    writeln!(
        out,
        "\n{} {}\n",
        "Total:".bold(),
        format_size(scanner::total_size(&inventory)).green().bold()
    )?;
    out.flush()?;

    let indices = read_indices()?;
    if indices.is_empty() {
        writeln!(out, "\n{}", "Nothing selected.".yellow())?;
        return Ok(());
    }

    // Every index is checked before anything is touched.
    let selected = selector::validate(&inventory, &indices)?;
    let to_delete: Vec<Subscription> = selected.iter().map(|&i| inventory[i].clone()).collect();

    writeln!(out, "\n{}", "Selected subscriptions:".bold())?;
    for (&i, sub) in selected.iter().zip(&to_delete) {
        writeln!(
            out,
            "{:>4}: {} {}",
            i,
            sub.details.title,
            format!("({})", sub.path.display()).dimmed()
        )?;
    }
    writeln!(
        out,
        "\n{} {}\n",
        "Space to reclaim:".bold(),
        format_size(scanner::total_size(&to_delete)).green().bold()
    )?;

    if cli.dry_run {
        writeln!(out, "{}", "Dry run - nothing will be deleted.".yellow())?;
        return Ok(());
    }

    out.flush()?;
    if !cli.yes && !confirm()? {
        writeln!(out, "\n{}", "Cancelled.".yellow())?;
        return Ok(());
    }

    writeln!(out, "\n{} {} subscriptions...", "Deleting".red().bold(), to_delete.len())?;
    out.flush()?;

    let bar = ProgressBar::new(to_delete.len() as u64);
    bar.set_style(progress_style("{bar:40.red/white} {pos}/{len} {msg}"));
    let result = cleaner::clean(
        to_delete,
        paths,
        |sub| {
            bar.println(format!("\t...Deleting {}", sub.details.title));
            bar.set_message(sub.details.title.clone());
        },
        |_| bar.inc(1),
    );
    bar.finish_and_clear();

    if !result.failed.is_empty() {
        writeln!(out, "\n{}", "Not deleted:".red())?;
        for (sub, err) in &result.failed {
            writeln!(out, "  {} - {}", sub.details.title, err)?;
        }
    }

    if !result.partial.is_empty() {
        writeln!(out, "\n{}", "Partially deleted:".red())?;
        for (sub, report) in &result.partial {
            writeln!(
                out,
                "  {} ({} removed, {} failed)",
                sub.details.title,
                report.removed.len(),
                report.failures.len()
            )?;
            for failure in &report.failures {
                writeln!(out, "    {} - {}", failure.path.display(), failure.error)?;
            }
        }
    }

    if !result.deleted.is_empty() {
        writeln!(
            out,
            "\n{} Cleaned {} in {} subscriptions",
            "Done!".green().bold(),
            format_size(result.total_cleaned()).green().bold(),
            result.deleted.len().to_string().green()
        )?;
    }

    Ok(())
}
