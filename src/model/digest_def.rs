//! Persistent Protease/Digest rows. Distinct from
//! `digest::protease::{ProteaseDef, DigestDef}`, which are the *unresolved*
//! structured definitions read from CLI/JSON; these are what the digest
//! registry resolves them to once persisted.

use crate::model::ids::DigestId;

#[derive(Debug, Clone, PartialEq)]
pub struct Protease {
    pub id: String,
    pub cleavage_rule: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub id: DigestId,
    pub protease_id: String,
    pub max_missed_cleavages: u32,
    pub min_acids: usize,
    pub max_acids: Option<usize>,
}
