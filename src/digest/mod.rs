pub mod amino_acid;
pub mod cleaver;
pub mod mass;
pub mod protease;

pub use cleaver::cleave;
pub use mass::sequence_mass;
pub use protease::DigestDef;
