//! Error kinds per the error-handling design: each variant carries its own
//! retry/abort policy, decided by the caller that matches on it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed FASTA record in '{file}': {reason}")]
    Parse { file: String, reason: String },

    #[error("sequence contains residue '{residue}' not in the mass table (sequence prefix: '{prefix}')")]
    BadResidue { residue: char, prefix: String },

    #[error("store error, retryable: {0}")]
    StoreTransient(#[source] postgres::Error),

    #[error("store error, fatal: {0}")]
    StoreFatal(#[source] postgres::Error),

    #[error("no digest matches the given definition")]
    DigestNotFound,

    #[error("unknown taxon '{0}'")]
    UnknownTaxon(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Classify a raw postgres error as transient (lock/deadlock/connection)
    /// or fatal (schema mismatch, integrity violation, anything else).
    pub fn from_postgres(err: postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            use postgres::error::SqlState;
            match *db_err.code() {
                SqlState::LOCK_NOT_AVAILABLE
                | SqlState::DEADLOCK_DETECTED
                | SqlState::SERIALIZATION_FAILURE
                | SqlState::CONNECTION_EXCEPTION
                | SqlState::CONNECTION_DOES_NOT_EXIST
                | SqlState::CONNECTION_FAILURE => Error::StoreTransient(err),
                _ => Error::StoreFatal(err),
            }
        } else {
            // Connection-level errors with no db_error are presumed transient.
            Error::StoreTransient(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
