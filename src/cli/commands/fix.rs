//! `mender fix`: run one repair session against a local project file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::create_spinner;
use crate::domain::models::AppError;
use crate::infrastructure::analyzer::HeuristicAnalyzer;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::{DatabaseConnection, SqliteFixHistoryRepository};
use crate::infrastructure::fixer::HttpFixService;
use crate::infrastructure::probe::{HttpRuntimeProbe, NullRuntimeProbe};
use crate::infrastructure::store::InMemoryProjectStore;
use crate::services::RepairPipeline;

#[derive(Args)]
pub struct FixArgs {
    /// Project identifier (used for rate limiting and history)
    pub project_id: String,

    /// The error message to repair
    pub message: String,

    /// File exhibiting the error; its content is repaired in place
    #[arg(long)]
    pub file: PathBuf,

    /// Stack trace text accompanying the error
    #[arg(long)]
    pub stack: Option<String>,

    /// Line number of the error, when known
    #[arg(long)]
    pub line: Option<u32>,

    /// Column number of the error, when known
    #[arg(long)]
    pub column: Option<u32>,

    /// Rate limit key identifying the requesting user
    #[arg(long)]
    pub user: Option<String>,

    /// Run runtime checks against the configured preview host
    #[arg(long)]
    pub preview: bool,

    /// Configuration file (defaults to mender.yaml + MENDER_* env)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: FixArgs, json: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let store = Arc::new(InMemoryProjectStore::new());
    store
        .seed(&args.project_id, &content, Default::default())
        .await;

    let db = DatabaseConnection::from_config(&config.database).await?;
    db.migrate().await?;
    let history = Arc::new(SqliteFixHistoryRepository::new(db.pool().clone()));

    let fix_service = Arc::new(HttpFixService::new(
        &config.fix_service,
        &config.transport_retry,
    )?);
    let probe: Arc<dyn crate::domain::ports::RuntimeProbe> = if args.preview {
        Arc::new(HttpRuntimeProbe::new(&config.preview)?)
    } else {
        Arc::new(NullRuntimeProbe)
    };

    let pipeline = RepairPipeline::new(
        store.clone(),
        fix_service,
        Arc::new(HeuristicAnalyzer::new()),
        probe,
        history,
        &config,
    );

    let mut error = AppError::new(&args.message);
    error.stack = args.stack.clone();
    error.line = args.line;
    error.column = args.column;

    let spinner = (!json).then(|| create_spinner("Repairing..."));
    let result = pipeline
        .attempt_fix(&args.project_id, error, args.user.as_deref(), None)
        .await?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if result.success {
        // Write the repaired content back to the file the error came from.
        let repaired = store.get(&args.project_id).await?;
        std::fs::write(&args.file, &repaired.file_content)
            .with_context(|| format!("Failed to write {}", args.file.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.success {
        println!(
            "Fixed after {} attempt{}.",
            result.attempts.len(),
            if result.attempts.len() == 1 { "" } else { "s" }
        );
        if let Some(attempt) = result.attempts.last() {
            println!("  {}", attempt.fix.explanation);
        }
    } else {
        println!(
            "Could not fix after {} attempt{}.",
            result.attempts.len(),
            if result.attempts.len() == 1 { "" } else { "s" }
        );
        if let Some(recommendation) = &result.recommendation {
            println!("  Recommendation: {recommendation}");
        }
    }

    db.close().await;
    Ok(())
}
