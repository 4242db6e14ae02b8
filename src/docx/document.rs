use super::model::{Paragraph, Table, PARAGRAPH, TABLE};
use super::package::DocxPackage;
use super::xml::{Element, XmlDocument};
use super::DocumentAdapter;
use crate::error::{ContractError, Result};
use std::fs;
use std::path::Path;

pub const MAIN_PART: &str = "word/document.xml";
const BODY: &str = "w:body";

/// A DOCX file with its main document part parsed for editing.
#[derive(Debug, Clone)]
pub struct Document {
    package: DocxPackage,
    xml: XmlDocument,
}

impl Document {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ContractError::TemplateNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = DocxPackage::from_bytes(bytes)?;
        let part = package.part(MAIN_PART).ok_or_else(|| {
            ContractError::MalformedDocument(format!("package has no {}", MAIN_PART))
        })?;
        let source = std::str::from_utf8(part)
            .map_err(|e| ContractError::MalformedDocument(format!("{}: {}", MAIN_PART, e)))?;
        let xml = XmlDocument::parse(source)?;

        if xml.root.child(BODY).is_none() {
            return Err(ContractError::MalformedDocument(format!(
                "{} has no {} element",
                MAIN_PART, BODY
            )));
        }

        Ok(Self { package, xml })
    }

    /// Serializes the edited main part back into a copy of the package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut package = self.package.clone();
        package.set_part(MAIN_PART, self.xml.to_xml().into_bytes());
        package.to_bytes()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    fn body(&self) -> Option<&Element> {
        self.xml.root.child(BODY)
    }

    fn body_mut(&mut self) -> Option<&mut Element> {
        self.xml.root.child_mut(BODY)
    }

    /// Visible text of body paragraphs and table cells in document order,
    /// one line per paragraph and one line per table row.
    pub fn text(&mut self) -> String {
        let mut lines = Vec::new();
        let Some(body) = self.body_mut() else {
            return String::new();
        };

        for element in body.elements_mut() {
            if element.is(PARAGRAPH) {
                lines.push(Paragraph::new(element).text());
            } else if element.is(TABLE) {
                lines.extend(Table::new(element).row_texts());
            }
        }

        lines.join("\n")
    }

    pub fn table_count(&self) -> usize {
        self.body()
            .map(|body| body.elements().filter(|el| el.is(TABLE)).count())
            .unwrap_or(0)
    }
}

impl DocumentAdapter for Document {
    fn paragraphs(&mut self) -> Vec<Paragraph<'_>> {
        match self.body_mut() {
            Some(body) => body
                .elements_mut()
                .filter(|el| el.is(PARAGRAPH))
                .map(Paragraph::new)
                .collect(),
            None => Vec::new(),
        }
    }

    fn tables(&mut self) -> Vec<Table<'_>> {
        match self.body_mut() {
            Some(body) => body
                .elements_mut()
                .filter(|el| el.is(TABLE))
                .map(Table::new)
                .collect(),
            None => Vec::new(),
        }
    }
}
