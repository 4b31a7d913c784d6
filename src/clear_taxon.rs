//! Transactional deletion of all records scoped to a taxon. Shared entities
//! (Protein, Peptide, Digest, ProteinDigest, ProteinDigestPeptide, File,
//! FileDigest) are untouched.

use crate::error::Result;
use crate::store::StoreGateway;

/// Clears every taxon named in `taxon_ids`. Idempotent; an id with no
/// matching Taxon row is a no-op.
pub fn clear_taxons(gateway: &mut dyn StoreGateway, taxon_ids: &[String]) -> Result<()> {
    for taxon_id in taxon_ids {
        log::info!("clearing taxon '{taxon_id}'");
        gateway.delete_taxon_cascade(taxon_id)?;
    }
    Ok(())
}
