//! Beneficiary table parsing.
//!
//! The report lists beneficiaries as a pipe-delimited Markdown table under the
//! "Antecedentes del beneficiario" section:
//!
//! ```text
//! ### 2) Antecedentes del beneficiario
//! | Nombre Completo | RUT | Parentesco | Sexo | Invalidez | Fecha de Nacimiento |
//! | :--- | :--- | :--- | :--- | :--- | :--- |
//! | Juan Perez | 11.111.111-1 | Hijo | M | N | 01/01/2000 |
//! ```
//!
//! A missing section or a section without a table yields no beneficiaries.

use crate::schema::BeneficiaryRecord;
use log::debug;

/// Section headings that introduce the beneficiary table, lowercase.
const SECTION_MARKERS: [&str; 2] = ["antecedentes del beneficiario", "beneficiary particulars"];

/// Safety valve against runaway tables, not a business limit.
pub const MAX_BENEFICIARIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    NationalId,
    Relationship,
    Sex,
    Disability,
    BirthDate,
}

/// Column order assumed when the table has no recognizable header.
const FALLBACK_COLUMNS: [Column; 6] = [
    Column::Name,
    Column::NationalId,
    Column::Relationship,
    Column::Sex,
    Column::Disability,
    Column::BirthDate,
];

pub fn parse_beneficiaries(markdown: &str) -> Vec<BeneficiaryRecord> {
    let Some(section) = section_after_marker(markdown) else {
        return Vec::new();
    };

    let rows: Vec<Vec<String>> = table_lines(section)
        .into_iter()
        .filter(|line| !is_separator_row(line))
        .map(split_cells)
        .collect();

    if rows.is_empty() {
        debug!("Beneficiary section found but no table beneath it");
        return Vec::new();
    }

    let (columns, data_rows) = match rows.iter().position(|cells| is_header_row(cells)) {
        Some(header_idx) => (header_columns(&rows[header_idx]), &rows[header_idx + 1..]),
        None => {
            debug!("No beneficiary table header recognized, assuming fixed column order");
            let columns: Vec<(Column, usize)> = FALLBACK_COLUMNS
                .iter()
                .enumerate()
                .map(|(idx, column)| (*column, idx))
                .collect();
            (columns, &rows[..])
        }
    };

    let beneficiaries: Vec<BeneficiaryRecord> = data_rows
        .iter()
        .map(|cells| build_record(cells, &columns))
        .filter(BeneficiaryRecord::has_identity)
        .take(MAX_BENEFICIARIES)
        .collect();

    debug!("Parsed {} beneficiaries from report", beneficiaries.len());
    beneficiaries
}

/// Text following the first occurrence of a section marker.
fn section_after_marker(markdown: &str) -> Option<&str> {
    // Lowercasing can change byte lengths for some characters, so search
    // line by line and slice the input at the marker line's end.
    let mut offset = 0;
    for line in markdown.split_inclusive('\n') {
        let lower = line.to_lowercase();
        if SECTION_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return Some(&markdown[offset + line.len()..]);
        }
        offset += line.len();
    }
    None
}

/// Headings, bold pseudo-headings (`**Modalidades**`) and `**Label:** value`
/// lines, bulleted or not.
fn is_section_break(line: &str) -> bool {
    if line.starts_with('#') {
        return true;
    }
    let content = ["* ", "- ", "+ "]
        .iter()
        .find_map(|bullet| line.strip_prefix(bullet))
        .unwrap_or(line)
        .trim_start();
    content.starts_with("**")
}

/// The first contiguous run of pipe-delimited lines. Searching stops at the
/// next section break if no table has started by then.
fn table_lines(section: &str) -> Vec<&str> {
    let mut lines = Vec::new();

    for line in section.lines() {
        let trimmed = line.trim();
        let is_row = trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|');

        if is_row {
            lines.push(trimmed);
        } else if !lines.is_empty() || is_section_break(trimmed) {
            break;
        }
    }

    lines
}

fn is_separator_row(line: &str) -> bool {
    line.chars()
        .all(|c| matches!(c, '|' | ':' | '-') || c.is_whitespace())
}

fn split_cells(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_header_row(cells: &[String]) -> bool {
    let joined = cells.join(" ").to_lowercase();
    joined.contains("nombre") && joined.contains("rut")
}

fn classify_header(cell: &str) -> Option<Column> {
    let text = cell.to_lowercase();
    if text.contains("nombre") {
        Some(Column::Name)
    } else if text.contains("rut") {
        Some(Column::NationalId)
    } else if text.contains("parentesco") {
        Some(Column::Relationship)
    } else if text.contains("sexo") {
        Some(Column::Sex)
    } else if text.contains("inv") {
        Some(Column::Disability)
    } else if text.contains("nac") || text.contains("f. nac") {
        Some(Column::BirthDate)
    } else {
        None
    }
}

/// Maps each canonical column to its cell index. When two header cells
/// classify the same way, the later one wins.
fn header_columns(header: &[String]) -> Vec<(Column, usize)> {
    let mut columns: Vec<(Column, usize)> = Vec::new();
    for (idx, cell) in header.iter().enumerate() {
        let Some(column) = classify_header(cell) else {
            continue;
        };
        match columns.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = idx,
            None => columns.push((column, idx)),
        }
    }
    columns
}

fn build_record(cells: &[String], columns: &[(Column, usize)]) -> BeneficiaryRecord {
    let mut record = BeneficiaryRecord::default();
    for (column, idx) in columns {
        let Some(value) = cells.get(*idx) else {
            continue;
        };
        let slot = match column {
            Column::Name => &mut record.name,
            Column::NationalId => &mut record.national_id,
            Column::Relationship => &mut record.relationship,
            Column::Sex => &mut record.sex,
            Column::Disability => &mut record.disability,
            Column::BirthDate => &mut record.birth_date,
        };
        *slot = value.clone();
    }
    record
}
