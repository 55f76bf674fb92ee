//! Refresh the on-disk index catalog from the cluster

use crate::{Cli, IndicesArgs, Result};
use colored::Colorize;
use esferry_transfer::indices::IndexCatalog;
use esferry_transfer::progress::format_bytes;
use esferry_transfer::EsClient;

pub async fn run(cli: &Cli, args: &IndicesArgs) -> Result<()> {
    let client = EsClient::with_env_auth(cli.es_url.clone())?;
    let catalog = IndexCatalog::fetch(&client, &args.pattern).await?;

    if catalog.is_empty() {
        println!(
            "{} No indices match '{}' on {}",
            "→".cyan(),
            args.pattern,
            cli.es_url
        );
        return Ok(());
    }

    for (name, stats) in catalog.iter() {
        println!(
            "  {}  {} docs, {}",
            name,
            stats.docs_count,
            format_bytes(stats.store_bytes)
        );
    }

    catalog.save(&args.output)?;

    println!(
        "\n{} Cataloged {} index(es), {} document(s), {} into {}",
        "✓".green().bold(),
        catalog.len(),
        catalog.total_documents(),
        format_bytes(catalog.total_bytes()),
        args.output.display()
    );
    Ok(())
}
