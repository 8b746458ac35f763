//! `mender history`: inspect the fix-history log.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::cli::output::format_history_table;
use crate::domain::ports::FixHistoryRepository;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::{DatabaseConnection, SqliteFixHistoryRepository};

#[derive(Args)]
pub struct HistoryArgs {
    /// Project identifier
    pub project_id: String,

    /// Show only failed attempts
    #[arg(long)]
    pub failed: bool,

    /// Maximum entries to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Configuration file (defaults to mender.yaml + MENDER_* env)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: HistoryArgs, json: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let db = DatabaseConnection::from_config(&config.database).await?;
    db.migrate().await?;
    let repository = SqliteFixHistoryRepository::new(db.pool().clone());

    let mut entries = if args.failed {
        repository.failed_for_project(&args.project_id).await?
    } else {
        repository.for_project(&args.project_id).await?
    };
    entries.truncate(args.limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No fix history for project {}.", args.project_id);
    } else {
        println!("{}", format_history_table(&entries));
        println!(
            "\nShowing {} entr{}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" }
        );
    }

    db.close().await;
    Ok(())
}
