//! Run and watch command implementations

use anyhow::{Context, Result};
use finsum::{ChangeProcessor, RetryingFeed};
use finsum_core::{ChangeNotification, ProcessorConfig};
use finsum_sqlite::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;

fn build_processor(
    db_path: &PathBuf,
    process_name: Option<String>,
) -> Result<ChangeProcessor<RetryingFeed<SqliteStore>, SqliteStore, SqliteStore, SqliteStore>> {
    let store = Arc::new(SqliteStore::open(db_path).context("Failed to open database")?);
    let mut config = ProcessorConfig::default();
    if let Some(name) = process_name {
        config = config.with_process_name(name);
    }
    let feed = Arc::new(RetryingFeed::new(store.clone(), config.retry.clone()));
    Ok(ChangeProcessor::new(
        feed,
        store.clone(),
        store.clone(),
        store,
        config,
    ))
}

pub fn execute(
    db_path: PathBuf,
    collection: String,
    scope: String,
    process_name: String,
) -> Result<()> {
    let processor = build_processor(&db_path, Some(process_name))?;
    let notification = ChangeNotification::new(collection, scope);

    let stats = processor
        .process(&notification)
        .context("Run failed")?;

    match stats.ending_cursor {
        Some(cursor) => {
            println!(
                "✓ Retrieved {} change(s), processed {} item(s), {} cell failure(s) in {:?}",
                stats.items_retrieved, stats.items_processed, stats.cells_failed, stats.duration
            );
            println!("Checkpoint: {}", cursor);
        }
        None => println!("Notification rejected - unknown collection"),
    }

    Ok(())
}

pub fn watch(
    db_path: PathBuf,
    collection: String,
    scope: String,
    interval_secs: u64,
) -> Result<()> {
    let processor = build_processor(&db_path, None)?;
    let notification = ChangeNotification::new(collection, scope);
    let interval = std::time::Duration::from_secs(interval_secs);

    println!("Watching {} every {}s... (Press Ctrl+C to stop)", notification.resource_id, interval_secs);
    loop {
        match processor.process(&notification) {
            Ok(stats) if stats.items_retrieved > 0 => {
                println!(
                    "Retrieved {} change(s), processed {} item(s) in {:?}",
                    stats.items_retrieved, stats.items_processed, stats.duration
                );
            }
            Ok(_) => {}
            Err(e) => {
                // Cursor has not moved; the next poll refetches the batch.
                tracing::error!("run failed: {}", e);
            }
        }
        std::thread::sleep(interval);
    }
}
