use crate::docx::Document;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static LEFTOVER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{[^{}]*\}\}|\{[A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑ ]*\}").expect("valid regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Tokens from the caller's list still present in the output.
    pub leftover_tokens: Vec<String>,
    /// Any `{{ ... }}` or `{UPPER CASE}` tags still present.
    pub leftover_tags: Vec<String>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.leftover_tokens.is_empty() && self.leftover_tags.is_empty()
    }
}

/// Reopens a generated document and looks for placeholders that survived
/// filling. `None` means the output could not be read back at all.
pub fn audit_output(bytes: &[u8], tokens: &[&str]) -> Option<AuditReport> {
    let mut doc = match Document::from_bytes(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Output could not be verified: {}", e);
            return None;
        }
    };
    let text = doc.text();

    let leftover_tokens = tokens
        .iter()
        .filter(|token| text.contains(**token))
        .map(|token| token.to_string())
        .collect();

    let leftover_tags = LEFTOVER_TAG
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Some(AuditReport {
        leftover_tokens,
        leftover_tags,
    })
}
