//! Operational tooling shared by the `cost-monitor` and `auto-cleanup`
//! binaries. Everything here is glue over the Azure CLI; the service itself
//! never touches this module.

pub mod azcli;
pub mod costs;
pub mod webhook;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum OpsError {
    #[error("azure cli exited with status {status}: {stderr}")]
    Cli { status: i32, stderr: String },

    #[error("failed to run azure cli: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse azure cli output: {0}")]
    Json(#[from] serde_json::Error),
}
