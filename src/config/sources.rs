use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Deployment environment tier driving the quote-source fallback policy.
///
/// Parsing is case-insensitive. Anything that does not match a known literal
/// is carried as [`EnvTier::Unrecognized`] and treated as non-production for
/// fallback purposes; an empty or absent value behaves as `dev`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvTier {
    Prod,
    Staging,
    Dev,
    Demo,
    Unrecognized(String),
}

impl EnvTier {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prod" => EnvTier::Prod,
            "staging" => EnvTier::Staging,
            "" | "dev" | "development" => EnvTier::Dev,
            "demo" => EnvTier::Demo,
            other => EnvTier::Unrecognized(other.to_string()),
        }
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, EnvTier::Prod)
    }

    /// Whether this tier may fall back to on-disk seed files when no secret
    /// store is configured. Staging is deliberately excluded: it only reaches
    /// seed files after a failed secret-store fetch.
    pub fn allows_seed_fallback(&self) -> bool {
        matches!(self, EnvTier::Dev | EnvTier::Demo | EnvTier::Unrecognized(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            EnvTier::Prod => "prod",
            EnvTier::Staging => "staging",
            EnvTier::Dev => "dev",
            EnvTier::Demo => "demo",
            EnvTier::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl Default for EnvTier {
    fn default() -> Self {
        EnvTier::Dev
    }
}

impl fmt::Display for EnvTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EnvTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EnvTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EnvTier::parse(&raw))
    }
}

/// Where the quote seed dataset comes from.
///
/// The resolver consults these settings in a fixed precedence order; see
/// `crate::resolver`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Explicit opt-in to static on-disk seed data, bypassing the production
    /// constraint. Intended for demos serving non-real data.
    /// TOML: `sources.demo_mode`, env: `DEMO_MODE`. Default: `false`.
    #[serde(default)]
    pub demo_mode: bool,

    /// Deployment tier.
    /// TOML: `sources.environment`, env: `ENVIRONMENT`. Default: `dev`.
    #[serde(default)]
    pub environment: EnvTier,

    /// Secret store endpoint. Presence enables the secret-store fetch path
    /// and is mandatory for the `prod` tier.
    /// TOML: `sources.key_vault_url`, env: `KEY_VAULT_URL`.
    #[serde(default)]
    pub key_vault_url: Option<Url>,

    /// Base64-encoded JSON quote array for local development.
    /// TOML: `sources.quotes_data_base64`, env: `QUOTES_DATA_BASE64`.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_opt_string_lax")]
    pub quotes_data_base64: Option<String>,

    /// Name of the secret holding the encoded quote dataset.
    /// TOML: `sources.quotes_secret_name`, env: `QUOTES_SECRET_NAME`.
    /// Default: `quotes-data`.
    #[serde(default = "default_secret_name")]
    pub quotes_secret_name: String,

    /// Optional seed file probed before the built-in candidate paths.
    /// TOML: `sources.seed_path`, env: `SEED_PATH`.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            demo_mode: false,
            environment: EnvTier::default(),
            key_vault_url: None,
            quotes_data_base64: None,
            quotes_secret_name: default_secret_name(),
            seed_path: None,
        }
    }
}

fn default_secret_name() -> String {
    "quotes-data".to_string()
}

fn deserialize_opt_string_lax<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;

    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        _ => Err(serde::de::Error::custom(
            "expected a string for sources.quotes_data_base64",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parse_is_case_insensitive() {
        assert_eq!(EnvTier::parse("PROD"), EnvTier::Prod);
        assert_eq!(EnvTier::parse("Staging"), EnvTier::Staging);
        assert_eq!(EnvTier::parse("development"), EnvTier::Dev);
        assert_eq!(EnvTier::parse(""), EnvTier::Dev);
    }

    #[test]
    fn unrecognized_tier_behaves_as_non_production() {
        let tier = EnvTier::parse("qa-west");
        assert_eq!(tier, EnvTier::Unrecognized("qa-west".to_string()));
        assert!(!tier.is_prod());
        assert!(tier.allows_seed_fallback());
    }

    #[test]
    fn staging_does_not_fall_back_directly() {
        assert!(!EnvTier::Staging.allows_seed_fallback());
        assert!(!EnvTier::Prod.allows_seed_fallback());
        assert!(EnvTier::Dev.allows_seed_fallback());
        assert!(EnvTier::Demo.allows_seed_fallback());
    }
}
