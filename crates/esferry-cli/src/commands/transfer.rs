//! Day-by-day transfer from the cluster into the broker

use crate::commands::{build_publisher, parse_date_units, print_summary};
use crate::{Cli, Result, TransferArgs};
use colored::Colorize;
use esferry_transfer::source::EsDocumentSource;
use esferry_transfer::{CheckpointLog, EsClient, TransferOptions, TransferPipeline};
use std::sync::Arc;
use tracing::info;

pub async fn run(cli: &Cli, args: &TransferArgs) -> Result<()> {
    let units = parse_date_units(&args.dates)?;

    let options = TransferOptions::new()
        .with_page_size(args.page_size)
        .with_batch_size(args.batch_size)
        .with_slices(args.slices)
        .with_queue_capacity(args.queue_capacity)
        .with_report_every(args.report_every)
        .with_index_pattern(&args.index_pattern)
        .with_time_field(&args.time_field)
        .with_dry_run(args.dry_run)
        .with_continue_on_error(args.continue_on_error)
        .with_show_progress(true);

    let client = EsClient::with_env_auth(cli.es_url.clone())?;
    let source = Arc::new(EsDocumentSource::new(client, &options));
    let publisher = build_publisher(cli, args.dry_run).await?;
    let checkpoint = CheckpointLog::load(&args.checkpoint_file)?;

    info!(
        units = units.len(),
        checkpoint = %args.checkpoint_file.display(),
        "starting transfer run"
    );
    println!(
        "{} Transferring {} day(s) from {}",
        "→".cyan(),
        units.len(),
        cli.es_url
    );

    let mut pipeline = TransferPipeline::new(source, publisher, checkpoint, options);
    let summary = pipeline.run(&units).await?;

    print_summary(&summary, units.len(), args.dry_run)
}
