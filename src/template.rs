use crate::config::ContractConfig;
use crate::error::{ContractError, Result};
use crate::schema::ContractType;
use log::error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub contract_type: ContractType,
    pub resolved_file_path: PathBuf,
}

pub struct TemplateResolver {
    config: ContractConfig,
}

impl TemplateResolver {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn file_name(&self, contract_type: ContractType) -> &str {
        match contract_type {
            ContractType::OldAgeOrDisability => &self.config.old_age_disability_template,
            ContractType::Survivorship => &self.config.survivorship_template,
        }
    }

    /// Fails with `TemplateNotFound` when the file is not on disk.
    pub fn resolve(&self, contract_type: ContractType) -> Result<TemplateDescriptor> {
        let path = self.config.template_dir.join(self.file_name(contract_type));

        if !path.is_file() {
            error!("Template not found at: {}", path.display());
            return Err(ContractError::TemplateNotFound { path });
        }

        Ok(TemplateDescriptor {
            contract_type,
            resolved_file_path: path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolves_each_contract_type() {
        let dir = tempfile::tempdir().unwrap();
        let config = ContractConfig {
            old_age_disability_template: "vejez.docx".to_string(),
            survivorship_template: "sobrevivencia.docx".to_string(),
            ..Default::default()
        }
        .with_template_dir(dir.path());
        fs::write(dir.path().join("vejez.docx"), b"x").unwrap();
        fs::write(dir.path().join("sobrevivencia.docx"), b"x").unwrap();

        let resolver = TemplateResolver::new(config);
        let old_age = resolver.resolve(ContractType::OldAgeOrDisability).unwrap();
        let survivorship = resolver.resolve(ContractType::Survivorship).unwrap();

        assert_eq!(old_age.resolved_file_path, dir.path().join("vejez.docx"));
        assert_eq!(
            survivorship.resolved_file_path,
            dir.path().join("sobrevivencia.docx")
        );
        assert_eq!(survivorship.contract_type, ContractType::Survivorship);
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ContractConfig::default().with_template_dir(dir.path());
        let resolver = TemplateResolver::new(config);

        let err = resolver.resolve(ContractType::Survivorship).unwrap_err();
        assert!(err.is_template_missing());
        assert!(err.to_string().contains("sobrevivencia"));
    }
}
