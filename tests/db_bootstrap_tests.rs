use async_trait::async_trait;
use base64::Engine as _;
use epigraph::EpigraphError;
use epigraph::config::{BasicConfig, EnvTier, SourcesConfig};
use epigraph::db;
use epigraph::resolver::QuoteResolver;
use epigraph::secrets::SecretStore;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_db(tag: &str) -> (PathBuf, String) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "epigraph-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    let url = format!("sqlite:{}", path.display());
    (path, url)
}

fn basic_with_db(url: &str) -> BasicConfig {
    BasicConfig {
        database_url: Some(url.to_string()),
        ..Default::default()
    }
}

/// A resolver fed through the inline-env path, so tests need no disk or
/// network fixtures.
fn inline_resolver(quotes: &serde_json::Value) -> QuoteResolver {
    let encoded = base64::engine::general_purpose::STANDARD
        .encode(serde_json::to_vec(quotes).expect("serialize quotes"));
    QuoteResolver::new(SourcesConfig {
        environment: EnvTier::Dev,
        quotes_data_base64: Some(encoded),
        ..Default::default()
    })
}

/// Records whether the secret store (and so the resolver chain) was reached.
struct FlagStore {
    called: Arc<AtomicBool>,
}

#[async_trait]
impl SecretStore for FlagStore {
    async fn fetch_secret(&self, _name: &str) -> Result<String, EpigraphError> {
        self.called.store(true, Ordering::SeqCst);
        Err(EpigraphError::SecretStore("should not be reached".to_string()))
    }
}

fn remove_db_files(path: &PathBuf) {
    let wal = PathBuf::from(format!("{}-wal", path.display()));
    let shm = PathBuf::from(format!("{}-shm", path.display()));
    let _ = fs::remove_file(&wal);
    let _ = fs::remove_file(&shm);
    let _ = fs::remove_file(path);
}

#[tokio::test]
async fn unset_database_url_is_a_distinguishable_skip() {
    let err = db::spawn(&BasicConfig::default(), inline_resolver(&json!([])))
        .await
        .expect_err("no database url configured");
    assert!(matches!(err, EpigraphError::DatabaseNotConfigured));

    let blank = BasicConfig {
        database_url: Some("   ".to_string()),
        ..Default::default()
    };
    let err = db::spawn(&blank, inline_resolver(&json!([])))
        .await
        .expect_err("blank database url configured");
    assert!(matches!(err, EpigraphError::DatabaseNotConfigured));
}

#[tokio::test]
async fn bootstrap_seeds_an_empty_database_exactly_once() {
    let (path, url) = temp_db("idempotent");

    let first = json!([
        { "author": "A", "text": "one" },
        { "text": "two" },
        { "author": "C", "text": "three" }
    ]);
    let db1 = db::spawn(&basic_with_db(&url), inline_resolver(&first))
        .await
        .expect("first boot");
    assert_eq!(db1.count_quotes().await.expect("count"), 3);

    // A second boot against the already-seeded database must be a no-op,
    // even with a different dataset on offer.
    let second = json!([
        { "author": "X", "text": "x1" },
        { "author": "X", "text": "x2" },
        { "author": "X", "text": "x3" },
        { "author": "X", "text": "x4" },
        { "author": "X", "text": "x5" }
    ]);
    let db2 = db::spawn(&basic_with_db(&url), inline_resolver(&second))
        .await
        .expect("second boot");
    assert_eq!(db2.count_quotes().await.expect("count"), 3);

    remove_db_files(&path);
}

#[tokio::test]
async fn missing_authors_are_stored_as_unknown() {
    let (path, url) = temp_db("unknown-author");

    let quotes = json!([
        { "author": "Named", "text": "with author" },
        { "text": "without author" }
    ]);
    let db = db::spawn(&basic_with_db(&url), inline_resolver(&quotes))
        .await
        .expect("boot");

    let stats = db.table_stats().await.expect("stats");
    assert_eq!(stats.total_quotes, 2);
    let authors: Vec<&str> = stats.sample.iter().map(|s| s.author.as_str()).collect();
    assert!(authors.contains(&"Named"));
    assert!(authors.contains(&"Unknown"));

    remove_db_files(&path);
}

#[tokio::test]
async fn seeded_table_stops_before_the_resolver_is_consulted() {
    let (path, url) = temp_db("preseeded");

    // Seed five rows out-of-band.
    let opts = SqliteConnectOptions::from_str(&url)
        .expect("valid url")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(opts)
        .await
        .expect("connect");
    for stmt in db::SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(&pool).await.expect("ddl");
    }
    for i in 0..5 {
        sqlx::query("INSERT INTO quotes (author, text) VALUES (?, ?)")
            .bind("pre")
            .bind(format!("row {i}"))
            .execute(&pool)
            .await
            .expect("insert");
    }
    pool.close().await;

    let called = Arc::new(AtomicBool::new(false));
    let resolver = QuoteResolver::with_store(
        SourcesConfig {
            environment: EnvTier::Staging,
            ..Default::default()
        },
        Arc::new(FlagStore {
            called: called.clone(),
        }),
    );

    let db = db::spawn(&basic_with_db(&url), resolver)
        .await
        .expect("boot over a seeded table");
    assert_eq!(db.count_quotes().await.expect("count"), 5);
    assert!(
        !called.load(Ordering::SeqCst),
        "resolver must not run when rows already exist"
    );

    remove_db_files(&path);
}

#[tokio::test]
async fn empty_resolution_creates_the_table_but_inserts_nothing() {
    let (path, url) = temp_db("empty-resolution");

    let db = db::spawn(&basic_with_db(&url), inline_resolver(&json!([])))
        .await
        .expect("boot");
    assert_eq!(db.count_quotes().await.expect("count"), 0);
    assert!(db.random_quote().await.expect("query").is_none());

    remove_db_files(&path);
}

#[tokio::test]
async fn dev_tier_seed_file_feeds_exactly_the_valid_quotes() {
    let (path, url) = temp_db("seed-file");

    let seed_path = PathBuf::from(format!("{}.seed.json", path.display()));
    let seed = json!([
        { "_comment": "docs only" },
        { "author": "A", "text": "one" },
        { "author": "B", "text": "two" },
        { "text": "three" }
    ]);
    fs::write(&seed_path, serde_json::to_vec(&seed).expect("serialize seed"))
        .expect("write seed file");

    let resolver = QuoteResolver::new(SourcesConfig {
        environment: EnvTier::Dev,
        seed_path: Some(seed_path.clone()),
        ..Default::default()
    });
    let db = db::spawn(&basic_with_db(&url), resolver)
        .await
        .expect("boot");
    assert_eq!(db.count_quotes().await.expect("count"), 3);

    let _ = fs::remove_file(&seed_path);
    remove_db_files(&path);
}

#[tokio::test]
async fn prod_secret_outage_leaves_the_table_empty() {
    let (path, url) = temp_db("prod-outage");

    let called = Arc::new(AtomicBool::new(false));
    let resolver = QuoteResolver::with_store(
        SourcesConfig {
            environment: EnvTier::Prod,
            ..Default::default()
        },
        Arc::new(FlagStore {
            called: called.clone(),
        }),
    );

    // Resolution fails; the bootstrap logs and serves with an empty table
    // rather than degrading to seed files.
    let db = db::spawn(&basic_with_db(&url), resolver)
        .await
        .expect("boot survives a secret outage");
    assert!(called.load(Ordering::SeqCst), "store must have been tried");
    assert_eq!(db.count_quotes().await.expect("count"), 0);

    remove_db_files(&path);
}

#[tokio::test]
async fn random_quote_returns_a_seeded_row() {
    let (path, url) = temp_db("random");

    let quotes = json!([
        { "author": "A", "text": "one" },
        { "author": "B", "text": "two" },
        { "author": "C", "text": "three" }
    ]);
    let db = db::spawn(&basic_with_db(&url), inline_resolver(&quotes))
        .await
        .expect("boot");

    for _ in 0..10 {
        let quote = db
            .random_quote()
            .await
            .expect("query")
            .expect("table is non-empty");
        assert!(["one", "two", "three"].contains(&quote.text.as_str()));
        assert!(quote.id >= 1);
    }

    remove_db_files(&path);
}
