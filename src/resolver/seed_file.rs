use crate::error::EpigraphError;
use crate::resolver::{QuoteEntry, parse_quote_array};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Well-known container location for the packaged seed dataset.
const CONTAINER_SEED_PATH: &str = "/app/database/seed/quotes.json";

/// Ordered candidate locations for the seed file. An explicit override is
/// probed first, then the packaged copy, then container- and
/// working-directory-relative paths.
pub fn candidate_seed_paths(override_path: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(5);
    if let Some(p) = override_path {
        paths.push(p.to_path_buf());
    }
    paths.push(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("database")
            .join("seed")
            .join("quotes.json"),
    );
    paths.push(PathBuf::from(CONTAINER_SEED_PATH));
    paths.push(PathBuf::from("./database/seed/quotes.json"));
    paths.push(PathBuf::from("../database/seed/quotes.json"));
    paths
}

/// Loads quotes from the first candidate seed file that exists and parses.
pub fn load_from_seed_files(
    override_path: Option<&Path>,
) -> Result<Vec<QuoteEntry>, EpigraphError> {
    load_from_candidates(&candidate_seed_paths(override_path))
}

pub fn load_from_candidates(candidates: &[PathBuf]) -> Result<Vec<QuoteEntry>, EpigraphError> {
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match read_seed_file(path) {
            Ok(entries) => {
                info!(
                    path = %path.display(),
                    count = entries.len(),
                    "loaded quotes from seed file"
                );
                return Ok(entries);
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load seed file; trying next candidate"
                );
            }
        }
    }

    let attempted: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    error!(attempted = ?attempted, "no seed file found at any candidate path");
    Err(EpigraphError::SeedFilesMissing)
}

fn read_seed_file(path: &Path) -> Result<Vec<QuoteEntry>, EpigraphError> {
    let bytes = fs::read(path)?;
    parse_quote_array(&bytes)
}
