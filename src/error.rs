use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Template file not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Failed to write document from template {}: {source}", template.display())]
    DocumentWrite {
        template: PathBuf,
        #[source]
        source: Box<ContractError>,
    },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// True for the failures that mean no template was available at all.
    pub fn is_template_missing(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ContractError>;
