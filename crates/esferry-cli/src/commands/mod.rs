//! CLI command implementations

pub mod dump;
pub mod indices;
pub mod transfer;
pub mod transfer_index;

use crate::{Cli, CliError, Result};
use colored::Colorize;
use esferry_transfer::publish::{AmqpPublisher, DryRunPublisher, Publisher};
use esferry_transfer::{RunSummary, WorkUnit};
use std::sync::Arc;
use tracing::warn;

/// Parse date arguments into day units, skipping invalid ones with a warning
pub(crate) fn parse_date_units(dates: &[String]) -> Result<Vec<WorkUnit>> {
    let mut units = Vec::with_capacity(dates.len());

    for date in dates {
        match WorkUnit::day(date) {
            Ok(unit) => units.push(unit),
            Err(e) => {
                warn!(date = %date, error = %e, "skipping invalid date");
                eprintln!("{} Skipping '{}': not a YYYY-MM-DD date", "!".yellow(), date);
            },
        }
    }

    if units.is_empty() {
        return Err(CliError::usage(
            "no valid dates given; expected YYYY-MM-DD",
        ));
    }

    Ok(units)
}

/// Build the broker side: a confirm-mode AMQP connection, or the dry-run
/// publisher that never opens one
pub(crate) async fn build_publisher(cli: &Cli, dry_run: bool) -> Result<Arc<dyn Publisher>> {
    if dry_run {
        println!(
            "{} Dry run: counts are verified, nothing is published",
            "→".cyan()
        );
        return Ok(Arc::new(DryRunPublisher));
    }

    let publisher = AmqpPublisher::connect(&cli.amqp_url, &cli.amqp_target).await?;
    Ok(Arc::new(publisher))
}

/// Print the per-unit outcome lines and the run footer.
///
/// A run with aborted units becomes a `UnitsFailed` error, and with it a
/// non-zero exit.
pub(crate) fn print_summary(summary: &RunSummary, planned: usize, dry_run: bool) -> Result<()> {
    for report in &summary.committed {
        println!(
            "{} {}  {} docs in {:.1} min",
            "✓".green(),
            report.key,
            report.documents,
            report.elapsed.as_secs_f64() / 60.0
        );
    }
    for key in &summary.skipped {
        println!("{} {}  already transferred", "→".cyan(), key);
    }
    for (key, err) in &summary.failed {
        println!("{} {}  {}", "✗".red(), key, err);
    }

    if !summary.is_clean() {
        return Err(CliError::UnitsFailed {
            failed: summary.failed.len(),
            total: planned,
        });
    }

    let total_min = summary.elapsed.as_secs_f64() / 60.0;
    if dry_run {
        println!(
            "\n{} Dry run verified {} document(s) in {:.1} min; checkpoint untouched",
            "✓".green().bold(),
            summary.documents(),
            total_min
        );
    } else {
        println!(
            "\n{} Moved {} document(s) in {:.1} min",
            "✓".green().bold(),
            summary.documents(),
            total_min
        );
    }

    Ok(())
}
