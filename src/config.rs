//! Ambient configuration: database URL from the environment (`dotenvy` +
//! `std::env`), and digest-definition JSON loading from a file path.

use std::fs;
use std::path::Path;

use crate::digest::DigestDef;
use crate::error::{Error, Result};

const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Loads `.env` (if present) and returns the configured database URL.
pub fn database_url() -> Result<String> {
    dotenvy::dotenv().ok();
    std::env::var(DATABASE_URL_VAR)
        .map_err(|_| Error::Other(format!("{DATABASE_URL_VAR} is not set")))
}

/// Resolves a `--digest-def` CLI argument to a definition: `None` falls
/// back to the default (trypsin, 0 missed cleavages, min 6 acids); `Some`
/// is read and parsed as a JSON file.
pub fn load_digest_def(path: Option<&Path>) -> Result<DigestDef> {
    match path {
        None => Ok(DigestDef::default()),
        Some(path) => {
            let contents = fs::read_to_string(path).map_err(|err| {
                Error::Other(format!("could not read digest definition '{}': {err}", path.display()))
            })?;
            DigestDef::from_json_str(&contents)
        }
    }
}
