//! Taxon and TaxonDigest.

use crate::model::ids::{DigestId, TaxonDigestId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Taxon {
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct TaxonDigest {
    pub id: TaxonDigestId,
    pub taxon_id: String,
    pub digest_id: DigestId,
}
