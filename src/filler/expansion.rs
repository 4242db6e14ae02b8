//! Beneficiary row expansion for templated contracts.

use super::substitute::substitute_paragraph;
use crate::docx::{DocumentAdapter, Row, Table};
use crate::schema::{contains_beneficiary_tag, BeneficiaryRecord, TAG_NAME};
use log::{debug, warn};

/// The tag that marks the beneficiary template row.
pub const ROW_MARKER: &str = TAG_NAME;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionOutcome {
    pub template_row_found: bool,
    /// Rows appended after the template row.
    pub rows_added: usize,
    /// Body paragraphs outside tables that carried beneficiary tags.
    pub paragraphs_filled: usize,
}

fn fill_row(row: &mut Row<'_>, record: &BeneficiaryRecord) {
    for mut cell in row.cells() {
        for mut paragraph in cell.paragraphs() {
            substitute_paragraph(&mut paragraph, |text| record.apply_tags(text));
        }
    }
}

fn marker_row(table: &Table<'_>) -> Option<usize> {
    table
        .row_texts()
        .iter()
        .position(|text| text.contains(ROW_MARKER))
}

/// Fills the template row with the first beneficiary and appends one row per
/// remaining beneficiary. With no beneficiaries the row's tags are cleared
/// and the row is kept.
fn expand_table(table: &mut Table<'_>, index: usize, beneficiaries: &[BeneficiaryRecord]) -> usize {
    let empty = BeneficiaryRecord::default();

    let Some(blank) = table
        .row(index)
        .map(|row| row.text_copy(&row.cell_texts()))
    else {
        return 0;
    };

    if let Some(mut row) = table.row(index) {
        fill_row(&mut row, beneficiaries.first().unwrap_or(&empty));
    }

    let mut added = 0;
    for record in beneficiaries.iter().skip(1) {
        table.append_row(blank.clone());
        let last = table.row_count() - 1;
        if let Some(mut row) = table.row(last) {
            fill_row(&mut row, record);
        }
        added += 1;
    }
    added
}

/// Fills beneficiary tags in body paragraphs outside tables with the first
/// beneficiary, or clears them when there is none.
pub(crate) fn fill_free_paragraphs<D: DocumentAdapter>(
    doc: &mut D,
    beneficiaries: &[BeneficiaryRecord],
) -> usize {
    let first = beneficiaries.first().cloned().unwrap_or_default();
    let mut filled = 0;
    for mut paragraph in doc.paragraphs() {
        if !contains_beneficiary_tag(&paragraph.text()) {
            continue;
        }
        substitute_paragraph(&mut paragraph, |text| first.apply_tags(text));
        filled += 1;
    }
    filled
}

pub(crate) fn expand_beneficiaries<D: DocumentAdapter>(
    doc: &mut D,
    beneficiaries: &[BeneficiaryRecord],
) -> ExpansionOutcome {
    let mut outcome = ExpansionOutcome::default();

    for mut table in doc.tables() {
        let Some(index) = marker_row(&table) else {
            continue;
        };
        outcome.template_row_found = true;
        outcome.rows_added = expand_table(&mut table, index, beneficiaries);
        debug!(
            "Beneficiary template row {} filled, {} rows added",
            index, outcome.rows_added
        );
        break;
    }

    outcome.paragraphs_filled = fill_free_paragraphs(doc, beneficiaries);

    if !outcome.template_row_found && beneficiaries.len() > 1 {
        warn!(
            "No beneficiary table row in template; only the first of {} beneficiaries was written",
            beneficiaries.len()
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::Document;
    use crate::filler::testing::{cell_row, docx_with_body, paragraph};

    fn beneficiary(name: &str, rut: &str) -> BeneficiaryRecord {
        BeneficiaryRecord {
            name: name.to_string(),
            national_id: rut.to_string(),
            relationship: "Hijo".to_string(),
            ..Default::default()
        }
    }

    fn template() -> Vec<u8> {
        let body = format!(
            "<w:tbl>{}{}</w:tbl>",
            cell_row(&["Nombre", "RUT", "Parentesco"]),
            cell_row(&[
                "{NOMBRE BENEFICIARIO}",
                "{RUT BENEFICIARIO}",
                "{PARENTESCO BENEFICIARIO}",
            ]),
        );
        docx_with_body(&body)
    }

    #[test]
    fn test_rows_cloned_per_extra_beneficiary() {
        let mut doc = Document::from_bytes(&template()).unwrap();
        let beneficiaries = vec![
            beneficiary("Juan Perez", "11.111.111-1"),
            beneficiary("Ana Perez", "22.222.222-2"),
            beneficiary("Luis Perez", "33.333.333-3"),
        ];

        let outcome = expand_beneficiaries(&mut doc, &beneficiaries);
        assert!(outcome.template_row_found);
        assert_eq!(outcome.rows_added, 2);

        let rows = doc.tables()[0].row_texts();
        assert_eq!(
            rows,
            vec![
                "Nombre RUT Parentesco",
                "Juan Perez 11.111.111-1 Hijo",
                "Ana Perez 22.222.222-2 Hijo",
                "Luis Perez 33.333.333-3 Hijo",
            ]
        );
    }

    #[test]
    fn test_single_beneficiary_adds_no_rows() {
        let mut doc = Document::from_bytes(&template()).unwrap();
        let outcome = expand_beneficiaries(&mut doc, &[beneficiary("Juan Perez", "11.111.111-1")]);
        assert_eq!(outcome.rows_added, 0);
        assert_eq!(doc.tables()[0].row_count(), 2);
    }

    #[test]
    fn test_no_beneficiaries_clears_template_row() {
        let mut doc = Document::from_bytes(&template()).unwrap();
        let outcome = expand_beneficiaries(&mut doc, &[]);

        assert!(outcome.template_row_found);
        let rows = doc.tables()[0].row_texts();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].trim(), "");
    }

    #[test]
    fn test_free_paragraph_uses_first_beneficiary() {
        let body = format!(
            "{}{}",
            paragraph("Beneficiario: {NOMBRE BENEFICIARIO}, RUT {RUT BENEFICIARIO}"),
            paragraph("Sin etiquetas")
        );
        let mut doc = Document::from_bytes(&docx_with_body(&body)).unwrap();
        let outcome = expand_beneficiaries(
            &mut doc,
            &[
                beneficiary("Juan Perez", "11.111.111-1"),
                beneficiary("Ana Perez", "22.222.222-2"),
            ],
        );

        assert!(!outcome.template_row_found);
        assert_eq!(outcome.paragraphs_filled, 1);
        assert_eq!(
            doc.text(),
            "Beneficiario: Juan Perez, RUT 11.111.111-1\nSin etiquetas"
        );
    }
}
