//! Digest definitions: the structured value the digest registry resolves to
//! a persistent digest identity.

use onig::Regex;
use serde::Deserialize;

use crate::error::Error;

pub const TRYPSIN_CLEAVAGE_RULE: &str = r"([KR](?=[^P]))|((?<=W)K(?=P))|((?<=M)R(?=P))";
pub const DEFAULT_MIN_ACIDS: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct ProteaseDef {
    pub id: String,
    pub cleavage_rule: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DigestDef {
    pub protease: ProteaseDef,
    #[serde(default)]
    pub max_missed_cleavages: u32,
    #[serde(default = "default_min_acids")]
    pub min_acids: usize,
    #[serde(default)]
    pub max_acids: Option<usize>,
}

fn default_min_acids() -> usize {
    DEFAULT_MIN_ACIDS
}

impl Default for DigestDef {
    fn default() -> Self {
        DigestDef {
            protease: ProteaseDef {
                id: "trypsin".to_owned(),
                cleavage_rule: TRYPSIN_CLEAVAGE_RULE.to_owned(),
            },
            max_missed_cleavages: 0,
            min_acids: DEFAULT_MIN_ACIDS,
            max_acids: None,
        }
    }
}

impl DigestDef {
    pub fn from_json_str(contents: &str) -> Result<Self, Error> {
        serde_json::from_str(contents)
            .map_err(|err| Error::Other(format!("could not parse digest definition: {err}")))
    }

    pub fn compiled_rule(&self) -> Result<Regex, Error> {
        Regex::new(&self.protease.cleavage_rule)
            .map_err(|err| Error::Other(format!("invalid cleavage rule regex: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_trypsin_zero_missed_min_six() {
        let def = DigestDef::default();
        assert_eq!(def.protease.id, "trypsin");
        assert_eq!(def.max_missed_cleavages, 0);
        assert_eq!(def.min_acids, 6);
        assert_eq!(def.max_acids, None);
    }

    #[test]
    fn parses_partial_json_with_defaults() {
        let def = DigestDef::from_json_str(
            r#"{"protease": {"id": "lysc", "cleavage_rule": "K(?=[^P])"}}"#,
        )
        .unwrap();
        assert_eq!(def.protease.id, "lysc");
        assert_eq!(def.max_missed_cleavages, 0);
        assert_eq!(def.min_acids, 6);
    }

    #[test]
    fn compiles_default_trypsin_rule() {
        assert!(DigestDef::default().compiled_rule().is_ok());
    }
}
