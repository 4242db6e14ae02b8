//! Literal `{TOKEN}` filling for legacy contract templates.

use super::expansion::fill_free_paragraphs;
use super::substitute::rewrite_paragraph;
use crate::context::{
    PlaceholderMap, TOKEN_ADDRESS, TOKEN_AFFILIATE_ID, TOKEN_AFFILIATE_NAME, TOKEN_COMMUNE,
    TOKEN_DATE, TOKEN_PHONE,
};
use crate::docx::{DocumentAdapter, Paragraph, Table};
use crate::schema::BeneficiaryRecord;
use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

const BLANK_RUN: &str = "_____";

/// Label words that precede a blank line, with the token whose value goes
/// into the blank. Checked in order; the first usable one wins.
const BLANK_LABELS: [(&str, &str); 8] = [
    ("Nombre", TOKEN_AFFILIATE_NAME),
    ("Señor", TOKEN_AFFILIATE_NAME),
    ("RUT", TOKEN_AFFILIATE_ID),
    ("Dirección", TOKEN_ADDRESS),
    ("Domicilio", TOKEN_ADDRESS),
    ("Comuna", TOKEN_COMMUNE),
    ("Teléfono", TOKEN_PHONE),
    ("Fecha", TOKEN_DATE),
];

static BLANK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BLANK_LABELS
        .iter()
        .map(|(label, _)| {
            Regex::new(&format!(
                r"(?i)({}[^_\n]*?)[.\s]*_{{5,}}[_.]*",
                regex::escape(label)
            ))
            .expect("valid regex")
        })
        .collect()
});

fn replace_tokens(text: &str, map: &PlaceholderMap) -> String {
    let mut out = text.to_string();
    for (token, value) in map {
        if !value.is_empty() && out.contains(token.as_str()) {
            out = out.replace(token.as_str(), value);
        }
    }
    out
}

/// `Nombre: ________` becomes `Nombre: Juan Pérez`. Only the first label
/// with a value is applied.
fn fill_blanks(text: &str, map: &PlaceholderMap) -> String {
    if !text.contains(BLANK_RUN) {
        return text.to_string();
    }

    for ((_, token), pattern) in BLANK_LABELS.iter().zip(BLANK_PATTERNS.iter()) {
        let Some(value) = map.get(*token).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        return format!(
            "{}{} {}{}",
            &text[..whole.start()],
            label.as_str().trim_end(),
            value,
            &text[whole.end()..]
        );
    }

    text.to_string()
}

pub(crate) fn fill_paragraph(paragraph: &mut Paragraph<'_>, map: &PlaceholderMap) -> bool {
    rewrite_paragraph(paragraph, |text| fill_blanks(&replace_tokens(text, map), map))
}

pub(crate) fn fill_document<D: DocumentAdapter>(
    doc: &mut D,
    map: &PlaceholderMap,
    beneficiaries: Option<&[BeneficiaryRecord]>,
) {
    let mut changed = 0usize;

    for mut paragraph in doc.paragraphs() {
        if fill_paragraph(&mut paragraph, map) {
            changed += 1;
        }
    }

    for mut table in doc.tables() {
        for mut row in table.rows() {
            for mut cell in row.cells() {
                for mut paragraph in cell.paragraphs() {
                    if fill_paragraph(&mut paragraph, map) {
                        changed += 1;
                    }
                }
            }
        }
    }
    debug!("Literal fill rewrote {} paragraphs", changed);

    let Some(beneficiaries) = beneficiaries else {
        return;
    };
    fill_beneficiary_rows(doc, beneficiaries);
    let filled = fill_free_paragraphs(doc, beneficiaries);
    debug!("Filled beneficiary tags in {} free paragraphs", filled);
}

/// Index of the header row when the table looks like the beneficiary table.
fn beneficiary_header(table: &Table<'_>) -> Option<usize> {
    table.row_texts().iter().take(3).position(|text| {
        let text = text.to_lowercase();
        text.contains("parentesco") && text.contains("rut")
    })
}

/// Fills the rows below the beneficiary header positionally. Rows without a
/// beneficiary get their tags cleared. No rows are added.
fn fill_beneficiary_rows<D: DocumentAdapter>(doc: &mut D, beneficiaries: &[BeneficiaryRecord]) {
    let mut tables = doc.tables();
    let Some((table, header)) = tables
        .iter_mut()
        .find_map(|table| beneficiary_header(table).map(|header| (table, header)))
    else {
        if !beneficiaries.is_empty() {
            warn!("Beneficiary table not found in template");
        }
        return;
    };

    let empty = BeneficiaryRecord::default();
    let capacity = table.row_count().saturating_sub(header + 1);
    if beneficiaries.len() > capacity {
        warn!(
            "Template has room for {} beneficiaries, {} were dropped",
            capacity,
            beneficiaries.len() - capacity
        );
    }

    for (idx, mut row) in table.rows().into_iter().enumerate().skip(header + 1) {
        let record = beneficiaries.get(idx - header - 1).unwrap_or(&empty);
        for mut cell in row.cells() {
            for mut paragraph in cell.paragraphs() {
                rewrite_paragraph(&mut paragraph, |text| record.apply_tags(text));
            }
        }
    }
}
