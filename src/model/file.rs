//! File and FileDigest: File identity is the content hash, not a
//! surrogate key.

use crate::model::ids::DigestId;

#[derive(Debug, Clone)]
pub struct File {
    pub hash: String,
    pub basename: String,
}

#[derive(Debug, Clone)]
pub struct FileDigest {
    pub file_hash: String,
    pub digest_id: DigestId,
}
