use super::OpsError;
use serde_json::Value;
use std::process::Command;

/// Runs `az` with the given arguments and parses its JSON output. Empty
/// output (e.g., `group delete --no-wait`) yields `Value::Null`.
pub fn az_json(args: &[&str]) -> Result<Value, OpsError> {
    let output = Command::new("az")
        .args(args)
        .args(["--output", "json"])
        .output()?;

    if !output.status.success() {
        return Err(OpsError::Cli {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Runs `az` with tsv output and returns the trimmed text.
pub fn az_text(args: &[&str]) -> Result<String, OpsError> {
    let output = Command::new("az")
        .args(args)
        .args(["--output", "tsv"])
        .output()?;

    if !output.status.success() {
        return Err(OpsError::Cli {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
