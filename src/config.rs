use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OLD_AGE_TEMPLATE: &str = "CONTRATO 2026 AP - PLANTILLA.docx";
pub const DEFAULT_SURVIVORSHIP_TEMPLATE: &str = "CONTRATO 2026 sobrevivencia -  plantilla.docx";

/// How placeholders in a template are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRegime {
    /// Literal `{TOKEN}` replacement plus fill-in-the-blank lines.
    Literal,
    /// `{{ key }}` rendering followed by beneficiary row expansion.
    #[default]
    Templated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub template_dir: PathBuf,
    pub old_age_disability_template: String,
    pub survivorship_template: String,
    pub regime: FillRegime,
    /// chrono format string for the current-date placeholder.
    pub date_format: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("."),
            old_age_disability_template: DEFAULT_OLD_AGE_TEMPLATE.to_string(),
            survivorship_template: DEFAULT_SURVIVORSHIP_TEMPLATE.to_string(),
            regime: FillRegime::default(),
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl ContractConfig {
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn with_regime(mut self, regime: FillRegime) -> Self {
        self.regime = regime;
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: ContractConfig =
            serde_json::from_str(r#"{"template_dir": "/srv/plantillas", "regime": "literal"}"#)
                .unwrap();

        assert_eq!(config.template_dir, PathBuf::from("/srv/plantillas"));
        assert_eq!(config.regime, FillRegime::Literal);
        assert_eq!(config.old_age_disability_template, DEFAULT_OLD_AGE_TEMPLATE);
        assert_eq!(config.date_format, "%d/%m/%Y");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contracts.json");
        fs::write(&path, r#"{"survivorship_template": "sobrevivencia.docx"}"#).unwrap();

        let config = ContractConfig::from_json_file(&path).unwrap();
        assert_eq!(config.survivorship_template, "sobrevivencia.docx");
        assert_eq!(config.regime, FillRegime::Templated);
    }
}
