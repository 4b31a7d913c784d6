pub mod digest_def;
pub mod file;
pub mod ids;
pub mod peptide;
pub mod protein;
pub mod taxon;

pub use digest_def::{Digest, Protease};
pub use file::{File, FileDigest};
pub use ids::{DigestId, PeptideId, ProteinDigestId, ProteinId, TaxonDigestId};
pub use peptide::{NewPeptide, Peptide};
pub use protein::{NewProtein, Protein};
pub use taxon::{Taxon, TaxonDigest};
