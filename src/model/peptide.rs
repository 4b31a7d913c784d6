//! Peptide: surrogate identity, unique `sequence`, monoisotopic `mass`.
//! Mirrors `Protein`. Digest-enzyme and missed-cleavage-count live on
//! `ProteinDigestPeptide` instead; a peptide's identity here is purely its
//! sequence, shared across digests and proteins.

use crate::model::ids::PeptideId;

#[derive(Debug, Clone, PartialEq)]
pub struct Peptide {
    pub id: PeptideId,
    pub sequence: String,
    pub mass: f64,
}

#[derive(Debug, Clone)]
pub struct NewPeptide {
    pub sequence: String,
    pub mass: f64,
}
