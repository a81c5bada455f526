//! Tiered quote seed-data resolution.
//!
//! Exactly one source supplies the dataset, chosen by a fixed precedence:
//! demo override, inline encoded payload, secret store, on-disk seed files.
//! Production never degrades to seed files; the demo flag is the single
//! documented exception and is loudly logged. Only counts and the winning
//! source kind are ever logged here, never quote contents or secret values.

mod seed_file;

pub use seed_file::{candidate_seed_paths, load_from_candidates, load_from_seed_files};

use crate::config::SourcesConfig;
use crate::error::EpigraphError;
use crate::secrets::{KeyVaultStore, SecretStore};
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A single quote entry ready for seeding. `text` is guaranteed non-empty;
/// a missing author is substituted at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteEntry {
    pub author: Option<String>,
    pub text: String,
}

/// Which source supplied the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    SecretStore,
    InlineEnv,
    SeedFile,
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuoteSource::SecretStore => "secret-store",
            QuoteSource::InlineEnv => "inline-env",
            QuoteSource::SeedFile => "seed-file",
        })
    }
}

/// Outcome of a successful resolution. Built fresh on every attempt and
/// consumed immediately by the bootstrapper.
#[derive(Debug)]
pub struct ResolvedQuotes {
    pub source: QuoteSource,
    pub entries: Vec<QuoteEntry>,
}

pub struct QuoteResolver {
    cfg: SourcesConfig,
    store: Option<Arc<dyn SecretStore>>,
}

impl QuoteResolver {
    /// Builds a resolver whose secret store client (if any) is derived from
    /// the configured endpoint.
    pub fn new(cfg: SourcesConfig) -> Self {
        let store = cfg
            .key_vault_url
            .clone()
            .map(|url| Arc::new(KeyVaultStore::new(url)) as Arc<dyn SecretStore>);
        Self { cfg, store }
    }

    /// Builds a resolver with an injected secret store, regardless of the
    /// configured endpoint.
    pub fn with_store(cfg: SourcesConfig, store: Arc<dyn SecretStore>) -> Self {
        Self {
            cfg,
            store: Some(store),
        }
    }

    /// Runs the precedence chain and returns entries from the first source
    /// that succeeds.
    pub async fn resolve(&self) -> Result<ResolvedQuotes, EpigraphError> {
        let tier = &self.cfg.environment;
        info!(
            tier = %tier,
            demo_mode = self.cfg.demo_mode,
            secret_store = if self.store.is_some() { "set" } else { "not set" },
            inline_payload = if self.cfg.quotes_data_base64.is_some() { "set" } else { "not set" },
            "resolving quote seed source"
        );

        // Demo override. The one sanctioned way to serve static seed data in
        // production; it must be unmissable in the logs.
        if self.cfg.demo_mode {
            warn!("DEMO MODE ENABLED: loading quotes from seed files");
            warn!("demo mode is a documented data-handling exception and serves non-real data");
            let entries = load_from_seed_files(self.cfg.seed_path.as_deref())?;
            return Ok(ResolvedQuotes {
                source: QuoteSource::SeedFile,
                entries,
            });
        }

        // Hard production constraint: no secret store endpoint, no service.
        if tier.is_prod() && self.store.is_none() {
            error!("production tier without a secret store endpoint; refusing to resolve quotes");
            return Err(EpigraphError::ProductionVaultRequired);
        }

        // Inline payload for local development, tried before the store.
        if let Some(encoded) = self.cfg.quotes_data_base64.as_deref() {
            match decode_encoded_quotes(encoded) {
                Ok(entries) => {
                    info!(count = entries.len(), "loaded quotes from inline environment payload");
                    return Ok(ResolvedQuotes {
                        source: QuoteSource::InlineEnv,
                        entries,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "inline quote payload rejected; trying next source");
                }
            }
        }

        if let Some(store) = self.store.as_deref() {
            match self.fetch_from_store(store).await {
                Ok(entries) => {
                    info!(count = entries.len(), "loaded quotes from secret store");
                    return Ok(ResolvedQuotes {
                        source: QuoteSource::SecretStore,
                        entries,
                    });
                }
                Err(e) if tier.is_prod() => {
                    error!(error = %e, "secret store fetch failed in production; no fallback permitted");
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, "secret store fetch failed; falling back to seed files");
                    let entries = load_from_seed_files(self.cfg.seed_path.as_deref())?;
                    return Ok(ResolvedQuotes {
                        source: QuoteSource::SeedFile,
                        entries,
                    });
                }
            }
        }

        if tier.allows_seed_fallback() {
            warn!(tier = %tier, "no secure quote source configured; falling back to seed files");
            let entries = load_from_seed_files(self.cfg.seed_path.as_deref())?;
            return Ok(ResolvedQuotes {
                source: QuoteSource::SeedFile,
                entries,
            });
        }

        error!(tier = %tier, "no quote source configured");
        Err(EpigraphError::NoQuoteSource(tier.to_string()))
    }

    async fn fetch_from_store(
        &self,
        store: &dyn SecretStore,
    ) -> Result<Vec<QuoteEntry>, EpigraphError> {
        let raw = store.fetch_secret(&self.cfg.quotes_secret_name).await?;
        decode_encoded_quotes(&raw)
    }
}

/// Decodes a base64-wrapped JSON quote array (the inline-env and secret
/// store wire shape).
fn decode_encoded_quotes(encoded: &str) -> Result<Vec<QuoteEntry>, EpigraphError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    parse_quote_array(&bytes)
}

/// Parses a JSON quote array, dropping marker/comment objects and entries
/// without usable text. Order is preserved.
pub(crate) fn parse_quote_array(bytes: &[u8]) -> Result<Vec<QuoteEntry>, EpigraphError> {
    let raw: Vec<RawEntry> = serde_json::from_slice(bytes)?;
    Ok(raw.into_iter().filter_map(RawEntry::into_quote).collect())
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "_comment")]
    comment: Option<Value>,
}

impl RawEntry {
    fn into_quote(self) -> Option<QuoteEntry> {
        if self.comment.as_ref().is_some_and(is_truthy) {
            return None;
        }
        let text = self.text.filter(|t| !t.is_empty())?;
        Some(QuoteEntry {
            author: self.author.filter(|a| !a.is_empty()),
            text,
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_markers_and_textless_entries() {
        let payload = br#"[
            {"_comment": "docs only"},
            {"author": "A", "text": "first"},
            {"author": "B"},
            {"text": ""},
            {"text": "second"}
        ]"#;
        let entries = parse_quote_array(payload).expect("valid array");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "first");
        assert_eq!(entries[1].text, "second");
        assert_eq!(entries[1].author, None);
    }

    #[test]
    fn falsy_marker_does_not_exclude_an_entry() {
        let payload = br#"[{"_comment": false, "text": "kept"}]"#;
        let entries = parse_quote_array(payload).expect("valid array");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn non_array_payload_is_an_error() {
        assert!(parse_quote_array(br#"{"text": "x"}"#).is_err());
    }
}
