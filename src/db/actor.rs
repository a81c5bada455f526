use crate::config::BasicConfig;
use crate::db::bootstrap;
use crate::db::models::QuoteRow;
use crate::error::EpigraphError;
use crate::resolver::QuoteResolver;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde::Serialize;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Pick one quote uniformly at random, or None if the table is empty.
    RandomQuote(RpcReplyPort<Result<Option<QuoteRow>, EpigraphError>>),

    /// Current row count of the quotes table.
    CountQuotes(RpcReplyPort<Result<i64, EpigraphError>>),

    /// SQLite engine version string.
    EngineVersion(RpcReplyPort<Result<String, EpigraphError>>),

    /// Aggregate table statistics for diagnostics.
    TableStats(RpcReplyPort<Result<TableStats, EpigraphError>>),
}

/// Diagnostic view of the quotes table: counts and a small id/author sample,
/// never quote text.
#[derive(Debug, Clone, Serialize)]
pub struct TableStats {
    pub total_quotes: i64,
    pub sample: Vec<QuoteSample>,
    pub sqlite_version: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuoteSample {
    pub id: i64,
    pub author: String,
}

#[derive(Clone, Debug)]
pub struct DbHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbHandle {
    pub async fn random_quote(&self) -> Result<Option<QuoteRow>, EpigraphError> {
        ractor::call!(self.actor, DbActorMessage::RandomQuote)
            .map_err(|e| EpigraphError::Ractor(format!("DbActor RandomQuote RPC failed: {e}")))?
    }

    pub async fn count_quotes(&self) -> Result<i64, EpigraphError> {
        ractor::call!(self.actor, DbActorMessage::CountQuotes)
            .map_err(|e| EpigraphError::Ractor(format!("DbActor CountQuotes RPC failed: {e}")))?
    }

    pub async fn engine_version(&self) -> Result<String, EpigraphError> {
        ractor::call!(self.actor, DbActorMessage::EngineVersion)
            .map_err(|e| EpigraphError::Ractor(format!("DbActor EngineVersion RPC failed: {e}")))?
    }

    pub async fn table_stats(&self) -> Result<TableStats, EpigraphError> {
        ractor::call!(self.actor, DbActorMessage::TableStats)
            .map_err(|e| EpigraphError::Ractor(format!("DbActor TableStats RPC failed: {e}")))?
    }
}

pub struct DbActorArgs {
    pub database_url: String,
    pub resolver: QuoteResolver,
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = DbActorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(args.database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        // Best effort: a failed bootstrap leaves individual requests to fail
        // instead of the whole process.
        if let Err(e) = bootstrap::ensure_schema_and_seed(&pool, &args.resolver).await {
            warn!(error = %e, "schema/seed bootstrap failed; serving without seed data");
        }

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::RandomQuote(reply) => {
                let res = self.random_quote(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::CountQuotes(reply) => {
                let res = self.count_quotes(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::EngineVersion(reply) => {
                let res = self.engine_version(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::TableStats(reply) => {
                let res = self.table_stats(&state.pool).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn random_quote(&self, pool: &SqlitePool) -> Result<Option<QuoteRow>, EpigraphError> {
        let row = sqlx::query_as::<_, QuoteRow>(
            r#"
        SELECT id, author, text
        FROM quotes
        ORDER BY RANDOM()
        LIMIT 1
        "#,
        )
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn count_quotes(&self, pool: &SqlitePool) -> Result<i64, EpigraphError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM quotes")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    async fn engine_version(&self, pool: &SqlitePool) -> Result<String, EpigraphError> {
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(pool)
            .await?;
        Ok(version)
    }

    async fn table_stats(&self, pool: &SqlitePool) -> Result<TableStats, EpigraphError> {
        let total_quotes = self.count_quotes(pool).await?;
        let sample = sqlx::query_as::<_, QuoteSample>(
            r#"
        SELECT id, author
        FROM quotes
        ORDER BY id
        LIMIT 5
        "#,
        )
        .fetch_all(pool)
        .await?;
        let sqlite_version = self.engine_version(pool).await?;

        Ok(TableStats {
            total_quotes,
            sample,
            sqlite_version,
        })
    }
}

/// Spawn the database actor and return a cloneable handle.
///
/// An unset database URL is reported as [`EpigraphError::DatabaseNotConfigured`],
/// which callers treat as a skip, not a failure.
pub async fn spawn(cfg: &BasicConfig, resolver: QuoteResolver) -> Result<DbHandle, EpigraphError> {
    let database_url = cfg
        .configured_database_url()
        .ok_or(EpigraphError::DatabaseNotConfigured)?;

    let (actor, _jh) = ractor::Actor::spawn(
        None,
        DbActor,
        DbActorArgs {
            database_url: database_url.to_string(),
            resolver,
        },
    )
    .await
    .map_err(|e| EpigraphError::Ractor(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbHandle { actor })
}
