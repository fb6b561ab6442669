//! Run a sync, a consistency scan and (optionally) a prune against Google Drive
//!
//! Run with:
//! ```bash
//! DRIVE_ACCESS_TOKEN=... cargo run -p core-service --example library_maintenance
//!
//! # Persist the index and scan reports, prune the reported ghosts
//! DRIVE_ACCESS_TOKEN=... LIBRARY_DB_PATH=./library.db \
//!   cargo run -p core-service --example library_maintenance -- ./reports prune
//! ```

use anyhow::Context;
use bridge_traits::log::LogLevel;
use core_auth::{CallerIdentity, Role, StaticTokenVerifier};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::LibraryConfig;
use core_service::bootstrap_desktop;
use std::env;
use std::sync::Arc;
use tracing::info;

const OPERATOR_TOKEN: &str = "local-maintenance";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    let access_token =
        env::var("DRIVE_ACCESS_TOKEN").context("DRIVE_ACCESS_TOKEN must be set")?;
    let args: Vec<String> = env::args().skip(1).collect();

    let mut builder = LibraryConfig::builder();
    if let Ok(path) = env::var("LIBRARY_DB_PATH") {
        builder = builder.database_path(path);
    }
    if let Ok(root) = env::var("LIBRARY_ROOT_FOLDER") {
        builder = builder.root_folder_id(root);
    }
    if let Some(dir) = args.first() {
        builder = builder.ghost_report_dir(dir);
    }
    let config = builder.build()?;

    let verifier = StaticTokenVerifier::new().with_token(
        OPERATOR_TOKEN,
        CallerIdentity::new("maintenance-cli", Role::Admin),
    );
    let service = bootstrap_desktop(config, access_token, Arc::new(verifier)).await?;
    let bearer = Some(OPERATOR_TOKEN);

    let stats = service.sync(bearer).await?;
    info!(?stats, "Sync complete");

    let scan = service.scan(bearer).await?;
    info!(
        ghost_count = scan.report.ghost_count,
        report = ?scan.report_path,
        "Scan complete"
    );
    for ghost in &scan.report.ghosts {
        println!("{}\t{}\t{}", ghost.id, ghost.name, ghost.last_synced_at);
    }

    if args.get(1).map(String::as_str) == Some("prune") && !scan.report.ghosts.is_empty() {
        let result = service
            .execute_prune(bearer, &scan.report.ghost_ids())
            .await?;
        info!(deleted = result.deleted_count, "Prune complete");
    }

    Ok(())
}
