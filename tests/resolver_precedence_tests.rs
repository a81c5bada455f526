use async_trait::async_trait;
use base64::Engine as _;
use epigraph::EpigraphError;
use epigraph::config::{EnvTier, SourcesConfig};
use epigraph::resolver::{QuoteResolver, QuoteSource};
use epigraph::secrets::SecretStore;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

struct StaticStore {
    payload: String,
}

#[async_trait]
impl SecretStore for StaticStore {
    async fn fetch_secret(&self, _name: &str) -> Result<String, EpigraphError> {
        Ok(self.payload.clone())
    }
}

struct FailingStore;

#[async_trait]
impl SecretStore for FailingStore {
    async fn fetch_secret(&self, _name: &str) -> Result<String, EpigraphError> {
        Err(EpigraphError::SecretStore("simulated outage".to_string()))
    }
}

fn encode(quotes: &serde_json::Value) -> String {
    let bytes = serde_json::to_vec(quotes).expect("serialize quotes");
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Writes a throwaway seed file and returns its path.
fn write_seed_file(tag: &str, quotes: &serde_json::Value) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "epigraph-seed-{tag}-{}-{}.json",
        std::process::id(),
        nanos
    ));
    fs::write(&path, serde_json::to_vec(quotes).expect("serialize seed")).expect("write seed file");
    path
}

fn three_quotes_and_a_marker() -> serde_json::Value {
    json!([
        { "_comment": "docs only" },
        { "author": "A", "text": "alpha" },
        { "author": "B", "text": "beta" },
        { "text": "gamma" }
    ])
}

#[tokio::test]
async fn prod_without_vault_is_a_hard_failure() {
    let seed = write_seed_file("prod-hard", &three_quotes_and_a_marker());
    let cfg = SourcesConfig {
        environment: EnvTier::Prod,
        // Even a valid inline payload must not rescue a misconfigured prod.
        quotes_data_base64: Some(encode(&json!([{ "text": "x" }]))),
        seed_path: Some(seed.clone()),
        ..Default::default()
    };

    let err = QuoteResolver::new(cfg)
        .resolve()
        .await
        .expect_err("prod without a vault endpoint must fail");
    assert!(matches!(err, EpigraphError::ProductionVaultRequired));

    let _ = fs::remove_file(seed);
}

#[tokio::test]
async fn demo_mode_overrides_the_production_constraint() {
    let seed = write_seed_file("demo-override", &three_quotes_and_a_marker());
    let cfg = SourcesConfig {
        demo_mode: true,
        environment: EnvTier::Prod,
        seed_path: Some(seed.clone()),
        ..Default::default()
    };

    let resolved = QuoteResolver::new(cfg.clone())
        .resolve()
        .await
        .expect("demo mode must load seed files even in prod");
    assert_eq!(resolved.source, QuoteSource::SeedFile);
    assert_eq!(resolved.entries.len(), 3);

    // Dropping the flag restores the hard failure.
    let cfg = SourcesConfig {
        demo_mode: false,
        ..cfg
    };
    let err = QuoteResolver::new(cfg)
        .resolve()
        .await
        .expect_err("without demo mode, prod misconfiguration must fail");
    assert!(matches!(err, EpigraphError::ProductionVaultRequired));

    let _ = fs::remove_file(seed);
}

#[tokio::test]
async fn inline_payload_preserves_order_and_drops_invalid_entries() {
    let cfg = SourcesConfig {
        environment: EnvTier::Dev,
        quotes_data_base64: Some(encode(&json!([
            { "author": "First", "text": "one" },
            { "author": "Skipped", "text": "" },
            { "author": "NoText" },
            { "text": "two" }
        ]))),
        ..Default::default()
    };

    let resolved = QuoteResolver::new(cfg).resolve().await.expect("inline payload");
    assert_eq!(resolved.source, QuoteSource::InlineEnv);
    let texts: Vec<&str> = resolved.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two"]);
    assert_eq!(resolved.entries[1].author, None);
}

#[tokio::test]
async fn malformed_inline_payload_falls_through_to_seed_files() {
    let seed = write_seed_file("inline-fallthrough", &three_quotes_and_a_marker());
    let cfg = SourcesConfig {
        environment: EnvTier::Dev,
        quotes_data_base64: Some("%%% not base64 %%%".to_string()),
        seed_path: Some(seed.clone()),
        ..Default::default()
    };

    let resolved = QuoteResolver::new(cfg)
        .resolve()
        .await
        .expect("decode failure is a step failure, not a hard error");
    assert_eq!(resolved.source, QuoteSource::SeedFile);
    assert_eq!(resolved.entries.len(), 3);

    let _ = fs::remove_file(seed);
}

#[tokio::test]
async fn secret_store_wins_when_configured_and_healthy() {
    let cfg = SourcesConfig {
        environment: EnvTier::Staging,
        ..Default::default()
    };
    let store = Arc::new(StaticStore {
        payload: encode(&json!([
            { "author": "Vault", "text": "stored quote" }
        ])),
    });

    let resolved = QuoteResolver::with_store(cfg, store)
        .resolve()
        .await
        .expect("secret store fetch");
    assert_eq!(resolved.source, QuoteSource::SecretStore);
    assert_eq!(resolved.entries.len(), 1);
    assert_eq!(resolved.entries[0].author.as_deref(), Some("Vault"));
}

#[tokio::test]
async fn prod_secret_failure_never_falls_back_to_seed_files() {
    let seed = write_seed_file("prod-no-fallback", &three_quotes_and_a_marker());
    let cfg = SourcesConfig {
        environment: EnvTier::Prod,
        seed_path: Some(seed.clone()),
        ..Default::default()
    };

    let err = QuoteResolver::with_store(cfg, Arc::new(FailingStore))
        .resolve()
        .await
        .expect_err("prod must not degrade to seed files");
    assert!(matches!(err, EpigraphError::SecretStore(_)));

    let _ = fs::remove_file(seed);
}

#[tokio::test]
async fn staging_secret_failure_falls_back_to_seed_files() {
    let seed = write_seed_file("staging-fallback", &three_quotes_and_a_marker());
    let cfg = SourcesConfig {
        environment: EnvTier::Staging,
        seed_path: Some(seed.clone()),
        ..Default::default()
    };

    let resolved = QuoteResolver::with_store(cfg, Arc::new(FailingStore))
        .resolve()
        .await
        .expect("non-prod tiers fall back after a store failure");
    assert_eq!(resolved.source, QuoteSource::SeedFile);
    assert_eq!(resolved.entries.len(), 3);

    let _ = fs::remove_file(seed);
}

#[tokio::test]
async fn staging_with_no_sources_is_unavailable() {
    let cfg = SourcesConfig {
        environment: EnvTier::Staging,
        ..Default::default()
    };

    let err = QuoteResolver::new(cfg)
        .resolve()
        .await
        .expect_err("staging has no direct seed fallback");
    assert!(matches!(err, EpigraphError::NoQuoteSource(_)));
}

#[tokio::test]
async fn unrecognized_tier_behaves_as_non_production() {
    let seed = write_seed_file("unrecognized-tier", &three_quotes_and_a_marker());
    let cfg = SourcesConfig {
        environment: EnvTier::parse("qa-west"),
        seed_path: Some(seed.clone()),
        ..Default::default()
    };

    let resolved = QuoteResolver::new(cfg)
        .resolve()
        .await
        .expect("unknown tiers fall back like dev");
    assert_eq!(resolved.source, QuoteSource::SeedFile);
    assert_eq!(resolved.entries.len(), 3);

    let _ = fs::remove_file(seed);
}
