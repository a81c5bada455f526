//! Secret store access behind a trait seam.
//!
//! The production implementation speaks the Key Vault REST surface over
//! `reqwest`; tests substitute the trait with an in-memory store.

pub mod identity;

use crate::error::{EpigraphError, IsRetryable};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

use identity::AmbientCredential;

/// A key-value secret fetch. Implementations must never log secret values.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn fetch_secret(&self, name: &str) -> Result<String, EpigraphError>;
}

/// Key Vault REST client authenticated through the ambient credential chain.
pub struct KeyVaultStore {
    vault_url: Url,
    http: reqwest::Client,
    credential: AmbientCredential,
}

const VAULT_API_VERSION: &str = "7.4";

impl KeyVaultStore {
    pub fn new(vault_url: Url) -> Self {
        let http = build_vault_client();
        Self {
            credential: AmbientCredential::new(http.clone()),
            vault_url,
            http,
        }
    }

    async fn get_secret_once(&self, token: &str, name: &str) -> Result<String, EpigraphError> {
        let mut url = self.vault_url.join(&format!("secrets/{name}"))?;
        url.query_pairs_mut()
            .append_pair("api-version", VAULT_API_VERSION);

        let resp = self.http.get(url).bearer_auth(token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(EpigraphError::UpstreamStatus(status));
        }

        let body: VaultSecret = resp.json().await?;
        Ok(body.value)
    }
}

#[async_trait]
impl SecretStore for KeyVaultStore {
    async fn fetch_secret(&self, name: &str) -> Result<String, EpigraphError> {
        let token = self.credential.vault_token().await?;

        (|| async { self.get_secret_once(&token, name).await })
            .retry(retry_policy())
            .when(EpigraphError::is_retryable)
            .notify(|err: &EpigraphError, dur: Duration| {
                warn!("secret fetch retrying after error {}, sleeping {:?}", err, dur);
            })
            .await
    }
}

#[derive(Deserialize)]
struct VaultSecret {
    value: String,
}

fn retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default().with_max_times(3)
}

/// The original bounded neither the connect nor the request; both are
/// explicit here.
fn build_vault_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build reqwest client")
}
