//! Template filling: literal tokens, `{{ key }}` rendering and beneficiary
//! row expansion.

mod expansion;
mod literal;
mod render;
mod substitute;

#[cfg(test)]
pub(crate) mod testing;

pub use expansion::{ExpansionOutcome, ROW_MARKER};
pub use render::{ContextRenderer, TagRenderer};

use crate::context::PlaceholderMap;
use crate::docx::{Document, DocumentAdapter};
use crate::error::{ContractError, Result};
use crate::schema::BeneficiaryRecord;
use log::{debug, error, warn};
use serde_json::Value;
use std::path::Path;

pub const BENEFICIARIES_KEY: &str = "beneficiaries";

pub struct DocumentFiller<R = TagRenderer> {
    renderer: R,
}

impl DocumentFiller<TagRenderer> {
    pub fn new() -> Self {
        Self {
            renderer: TagRenderer::new(),
        }
    }
}

impl Default for DocumentFiller<TagRenderer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ContextRenderer> DocumentFiller<R> {
    pub fn with_renderer(renderer: R) -> Self {
        Self { renderer }
    }

    /// Literal `{TOKEN}` replacement plus fill-in-the-blank lines. When
    /// beneficiaries are given, the table headed by `Parentesco`/`RUT` is
    /// filled row by row.
    pub fn fill_literal(
        &self,
        template: &Path,
        map: &PlaceholderMap,
        beneficiaries: Option<&[BeneficiaryRecord]>,
    ) -> Result<Vec<u8>> {
        let mut doc = open_template(template)?;
        literal::fill_document(&mut doc, map, beneficiaries);
        finish(&doc, template)
    }

    /// Renders `{{ key }}` tags from `context`, then expands the beneficiary
    /// row. Without an explicit list the context's `beneficiaries` array is
    /// used.
    pub fn fill_templated(
        &self,
        template: &Path,
        context: &Value,
        beneficiaries: Option<&[BeneficiaryRecord]>,
    ) -> Result<Vec<u8>> {
        let mut doc = open_template(template)?;

        let rendered = self.render_document(&mut doc, context);
        debug!("Rendered {} paragraphs from context", rendered);

        let from_context;
        let beneficiaries = match beneficiaries {
            Some(list) => list,
            None => {
                from_context = context_beneficiaries(context);
                from_context.as_slice()
            }
        };
        let outcome = expansion::expand_beneficiaries(&mut doc, beneficiaries);
        debug!("Beneficiary expansion: {:?}", outcome);

        finish(&doc, template)
    }

    /// Renders every body and table-cell paragraph. Returns how many changed.
    pub fn render_document<D: DocumentAdapter>(&self, doc: &mut D, context: &Value) -> usize {
        let render = |text: &str| self.renderer.render(text, context);
        let mut changed = 0;

        for mut paragraph in doc.paragraphs() {
            if substitute::substitute_paragraph(&mut paragraph, render) {
                changed += 1;
            }
        }
        for mut table in doc.tables() {
            for mut row in table.rows() {
                for mut cell in row.cells() {
                    for mut paragraph in cell.paragraphs() {
                        if substitute::substitute_paragraph(&mut paragraph, render) {
                            changed += 1;
                        }
                    }
                }
            }
        }

        changed
    }
}

fn context_beneficiaries(context: &Value) -> Vec<BeneficiaryRecord> {
    let Some(list) = context.get(BENEFICIARIES_KEY) else {
        return Vec::new();
    };
    match serde_json::from_value(list.clone()) {
        Ok(records) => records,
        Err(e) => {
            warn!("Ignoring malformed '{}' in context: {}", BENEFICIARIES_KEY, e);
            Vec::new()
        }
    }
}

fn open_template(template: &Path) -> Result<Document> {
    if !template.is_file() {
        error!("Template not found at: {}", template.display());
        return Err(ContractError::TemplateNotFound {
            path: template.to_path_buf(),
        });
    }

    Document::open(template).map_err(|e| {
        error!("Failed to open template {}: {}", template.display(), e);
        e
    })
}

fn finish(doc: &Document, template: &Path) -> Result<Vec<u8>> {
    doc.to_bytes().map_err(|e| {
        error!(
            "Failed to write document from template {}: {}",
            template.display(),
            e
        );
        ContractError::DocumentWrite {
            template: template.to_path_buf(),
            source: Box::new(e),
        }
    })
}
