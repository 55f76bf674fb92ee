//! Whole-index transfer through a staged dump
//!
//! Each index is staged to disk first, then replayed from the dump into the
//! broker. An index that is already checkpointed is neither staged nor
//! replayed, so an interrupted run resumes where it stopped.

use crate::commands::{build_publisher, print_summary};
use crate::{Cli, Result, TransferIndexArgs};
use colored::Colorize;
use esferry_transfer::dump::{self, DumpSource};
use esferry_transfer::indices::IndexCatalog;
use esferry_transfer::source::EsDocumentSource;
use esferry_transfer::{
    CheckpointLog, EsClient, RunSummary, TransferOptions, TransferPipeline,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn run(cli: &Cli, args: &TransferIndexArgs) -> Result<()> {
    let catalog = IndexCatalog::load(&args.catalog)?;
    let units = if !args.select.is_empty() {
        catalog.select(&args.select)?
    } else if let Some(until) = &args.until {
        catalog.until(until)?
    } else {
        catalog.units()
    };

    if units.is_empty() {
        println!(
            "{} Catalog {} lists no indices; nothing to do",
            "→".cyan(),
            args.catalog.display()
        );
        return Ok(());
    }

    let options = TransferOptions::new()
        .with_page_size(args.page_size)
        .with_batch_size(args.batch_size)
        .with_queue_capacity(args.queue_capacity)
        .with_report_every(args.report_every)
        .with_dry_run(args.dry_run)
        .with_continue_on_error(args.continue_on_error)
        .with_show_progress(true);

    let client = EsClient::with_env_auth(cli.es_url.clone())?;
    let stage_source = EsDocumentSource::new(client, &options);
    let replay = Arc::new(DumpSource::new(&args.stage_dir, args.page_size));
    let publisher = build_publisher(cli, args.dry_run).await?;
    let checkpoint = CheckpointLog::load(&args.checkpoint_file)?;

    info!(
        units = units.len(),
        stage_dir = %args.stage_dir.display(),
        "starting index transfer run"
    );
    println!(
        "{} Transferring {} index(es), staged under {}",
        "→".cyan(),
        units.len(),
        args.stage_dir.display()
    );

    let mut pipeline = TransferPipeline::new(replay, publisher, checkpoint, options);
    let mut total = RunSummary::default();

    for unit in &units {
        // Checkpointed indices need no dump; the pipeline records the skip.
        if !pipeline.checkpoint().contains(unit.key()) {
            match dump::stage_unit(&stage_source, unit, &args.stage_dir, true).await {
                Ok(staged) if staged.reused => {
                    println!(
                        "{} {}  reusing staged dump ({} docs)",
                        "→".cyan(),
                        unit.key(),
                        staged.documents
                    );
                },
                Ok(staged) => {
                    println!(
                        "{} {}  staged {} docs",
                        "↓".cyan(),
                        unit.key(),
                        staged.documents
                    );
                },
                Err(e) => {
                    error!(unit = %unit.key(), error = %e, "staging failed");
                    total.failed.push((unit.key().to_string(), e));
                    if args.continue_on_error {
                        continue;
                    }
                    break;
                },
            }
        }

        let summary = pipeline.run(std::slice::from_ref(unit)).await?;
        let committed = !summary.committed.is_empty();
        let clean = summary.is_clean();
        total.merge(summary);

        if committed && args.clean_after_upload && !args.dry_run {
            if let Err(e) = dump::clean_unit(&args.stage_dir, unit.key()).await {
                warn!(unit = %unit.key(), error = %e, "could not remove staged dump");
            }
        }

        if !clean && !args.continue_on_error {
            break;
        }
    }

    print_summary(&total, units.len(), args.dry_run)
}
