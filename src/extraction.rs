use crate::beneficiaries::parse_beneficiaries;
use crate::schema::{FieldLabel, FieldRecord, ReportData};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// Values the report generator leaves behind when it could not fill a field.
const UNRESOLVED_MARKERS: [&str; 2] = ["No informada", "[Extraer"];

/// Label variants for each field. Accented and unaccented spellings are both
/// accepted, as are the synonyms the report prompt has used over time.
fn label_pattern(label: FieldLabel) -> &'static str {
    match label {
        FieldLabel::FullName => r"Nombre Completo",
        FieldLabel::NationalId => r"RUT",
        FieldLabel::Address => r"(?:Direcci[óo]n|Domicilio)",
        FieldLabel::Commune => r"Comuna",
        FieldLabel::City => r"Ciudad",
        FieldLabel::Phone => r"Tel[ée]fono(?:\s*/\s*Celular)?",
        FieldLabel::Mobile => r"Celular",
        FieldLabel::Email => r"Correo[^*\n]*?",
        FieldLabel::MaritalStatus => r"Estado Civil",
        FieldLabel::NationalIdAlt => r"C[ée]dula[^*\n]*?",
        FieldLabel::BirthDate => r"Fecha de Nacimiento",
        FieldLabel::OriginFundManager => r"AFP de Origen",
        FieldLabel::HealthInstitution => r"Instituci[óo]n de Salud",
        FieldLabel::HealthSystem => r"Sistema de Salud",
        FieldLabel::RequestedPensionType => r"Tipo de Pensi[óo]n Solicitada",
        FieldLabel::OfferRequestDate => r"Fecha Solicitud de Ofertas",
        FieldLabel::RequestedModalities => r"Modalidades Solicitadas(?: al SCOMP)?",
        FieldLabel::DeceasedName => r"Causante Nombre",
        FieldLabel::DeceasedId => r"Causante RUT",
        FieldLabel::RequesterName => r"Consultante Nombre",
        FieldLabel::RequesterId => r"Consultante RUT",
        FieldLabel::Occupation => {
            r"(?:Profesi[óo]n u Oficio|Oficio|Profesi[óo]n|Ocupaci[óo]n)"
        }
    }
}

static FIELD_PATTERNS: LazyLock<Vec<(FieldLabel, Regex)>> = LazyLock::new(|| {
    FieldLabel::ALL
        .iter()
        .map(|label| {
            // `**Label:** value` with the colon inside or right after the bold marker.
            // The value never spills onto the next line.
            let pattern = format!(r"(?i)\*\*{}:?\*\*:?[ \t]*(.*)", label_pattern(*label));
            (*label, Regex::new(&pattern).expect("valid field regex"))
        })
        .collect()
});

static RUT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}\.\d{3}\.\d{3}-[\dkK])\b").expect("valid RUT regex"));

/// Pulls the labelled scalar fields out of a Markdown report.
///
/// Only the first match per field is kept. Values still carrying the
/// generator's "not informed" or "[Extraer" markers are dropped. When no
/// `**RUT:**` line yields a value, the first bare RUT in the text is used.
pub fn extract_fields(markdown: &str) -> FieldRecord {
    let mut record = FieldRecord::new();
    if markdown.trim().is_empty() {
        return record;
    }

    for (label, regex) in FIELD_PATTERNS.iter() {
        let Some(caps) = regex.captures(markdown) else {
            continue;
        };
        let value = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if is_resolved(value) {
            record.insert(*label, value);
        }
    }

    if !record.contains(FieldLabel::NationalId) {
        if let Some(rut) = find_first_rut(markdown) {
            debug!("RUT label missing, using first RUT found in text: {}", rut);
            record.insert(FieldLabel::NationalId, rut);
        }
    }

    debug!("Extracted {} fields from report", record.len());
    record
}

/// Runs both extractors over the same report.
pub fn extract_report(markdown: &str) -> ReportData {
    ReportData {
        fields: extract_fields(markdown),
        beneficiaries: parse_beneficiaries(markdown),
    }
}

pub fn find_first_rut(text: &str) -> Option<&str> {
    RUT_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn is_resolved(value: &str) -> bool {
    !value.is_empty() && !UNRESOLVED_MARKERS.iter().any(|m| value.contains(m))
}
