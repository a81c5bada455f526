use crate::error::EpigraphError;
use oauth2::basic::BasicClient;
use oauth2::{ClientId, ClientSecret, Scope, TokenResponse, TokenUrl};
use serde::Deserialize;
use std::env;
use tracing::info;

/// Instance-metadata endpoint serving managed-identity tokens.
const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";

/// Resource/audience for vault access tokens.
const VAULT_RESOURCE: &str = "https://vault.azure.net";

/// Ambient identity chain: an explicit service principal from the
/// environment wins, otherwise the platform's managed identity is asked.
pub struct AmbientCredential {
    http: reqwest::Client,
}

impl AmbientCredential {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Acquire a bearer token scoped to the secret store.
    pub async fn vault_token(&self) -> Result<String, EpigraphError> {
        if let (Ok(client_id), Ok(client_secret), Ok(tenant)) = (
            env::var("AZURE_CLIENT_ID"),
            env::var("AZURE_CLIENT_SECRET"),
            env::var("AZURE_TENANT_ID"),
        ) {
            info!("acquiring vault token via service principal");
            return self
                .client_credentials_token(&client_id, &client_secret, &tenant)
                .await;
        }

        info!("acquiring vault token via managed identity");
        self.managed_identity_token().await
    }

    async fn client_credentials_token(
        &self,
        client_id: &str,
        client_secret: &str,
        tenant: &str,
    ) -> Result<String, EpigraphError> {
        let token_url = TokenUrl::new(format!(
            "https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token"
        ))?;

        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.to_string()))
            .set_token_uri(token_url);

        let resp = client
            .exchange_client_credentials()
            .add_scope(Scope::new(format!("{VAULT_RESOURCE}/.default")))
            .request_async(&self.http)
            .await
            .map_err(|e| EpigraphError::Credential(e.to_string()))?;

        Ok(resp.access_token().secret().clone())
    }

    async fn managed_identity_token(&self) -> Result<String, EpigraphError> {
        let resp = self
            .http
            .get(IMDS_TOKEN_URL)
            .header("Metadata", "true")
            .query(&[
                ("api-version", IMDS_API_VERSION),
                ("resource", VAULT_RESOURCE),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EpigraphError::Credential(format!(
                "managed identity endpoint answered {status}"
            )));
        }

        let body: ImdsToken = resp.json().await?;
        Ok(body.access_token)
    }
}

#[derive(Deserialize)]
struct ImdsToken {
    access_token: String,
}
