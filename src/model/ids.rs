//! Surrogate-id newtypes, so a `ProteinId` can't be passed where a
//! `PeptideId` is expected. The store gateway converts to/from plain `i64`
//! at the query boundary rather than teaching `postgres` about these types
//! directly.

macro_rules! surrogate_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

surrogate_id!(ProteinId);
surrogate_id!(PeptideId);
surrogate_id!(DigestId);
surrogate_id!(ProteinDigestId);
surrogate_id!(TaxonDigestId);
