use crate::db::schema::SQLITE_INIT;
use crate::error::EpigraphError;
use crate::resolver::QuoteResolver;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Sentinel author for entries whose source data carries none.
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Ensures the quotes table exists and seeds it if and only if it is empty.
///
/// Table-ensure and inserts share one transaction; any failure rolls the
/// whole attempt back on drop and the next startup retries. A table that
/// already holds rows stops the procedure before the resolver is consulted.
pub async fn ensure_schema_and_seed(
    pool: &SqlitePool,
    resolver: &QuoteResolver,
) -> Result<(), EpigraphError> {
    let mut tx = pool.begin().await?;

    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(&mut *tx).await?;
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM quotes")
        .fetch_one(&mut *tx)
        .await?;
    if count > 0 {
        debug!(rows = count, "quotes table already seeded");
        tx.commit().await?;
        return Ok(());
    }

    let resolved = match resolver.resolve().await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(error = %e, "no quote data available for seeding");
            tx.commit().await?;
            return Ok(());
        }
    };

    if resolved.entries.is_empty() {
        warn!(source = %resolved.source, "resolved quote set is empty; nothing to seed");
        tx.commit().await?;
        return Ok(());
    }

    let inserted = resolved.entries.len();
    for entry in &resolved.entries {
        sqlx::query("INSERT INTO quotes (author, text) VALUES (?, ?)")
            .bind(entry.author.as_deref().unwrap_or(UNKNOWN_AUTHOR))
            .bind(&entry.text)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    info!(rows = inserted, source = %resolved.source, "quotes table seeded");
    Ok(())
}
