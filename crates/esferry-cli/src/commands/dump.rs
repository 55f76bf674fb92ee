//! Stage days to disk without touching the broker

use crate::commands::parse_date_units;
use crate::{Cli, CliError, DumpArgs, Result};
use colored::Colorize;
use esferry_transfer::dump;
use esferry_transfer::source::EsDocumentSource;
use esferry_transfer::{EsClient, TransferOptions};
use tracing::error;

pub async fn run(cli: &Cli, args: &DumpArgs) -> Result<()> {
    let units = parse_date_units(&args.dates)?;

    let options = TransferOptions::new()
        .with_page_size(args.page_size)
        .with_index_pattern(&args.index_pattern)
        .with_time_field(&args.time_field);

    let client = EsClient::with_env_auth(cli.es_url.clone())?;
    let source = EsDocumentSource::new(client, &options);

    println!(
        "{} Staging {} day(s) under {}",
        "→".cyan(),
        units.len(),
        args.target.display()
    );

    let mut documents = 0u64;
    let mut failed = 0usize;
    for unit in &units {
        match dump::stage_unit(&source, unit, &args.target, true).await {
            Ok(staged) if staged.reused => {
                println!(
                    "{} {}  already staged ({} docs)",
                    "→".cyan(),
                    unit.key(),
                    staged.documents
                );
                documents += staged.documents;
            },
            Ok(staged) => {
                println!(
                    "{} {}  staged {} docs",
                    "✓".green(),
                    unit.key(),
                    staged.documents
                );
                documents += staged.documents;
            },
            Err(e) => {
                error!(unit = %unit.key(), error = %e, "staging failed");
                println!("{} {}  {}", "✗".red(), unit.key(), e);
                failed += 1;
            },
        }
    }

    if failed > 0 {
        return Err(CliError::UnitsFailed {
            failed,
            total: units.len(),
        });
    }

    println!(
        "\n{} Staged {} document(s) under {}",
        "✓".green().bold(),
        documents,
        args.target.display()
    );
    Ok(())
}
