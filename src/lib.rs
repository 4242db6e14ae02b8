//! # Pension Contract Builder
//!
//! A library for turning AI-generated pension advisory reports (Chilean
//! AFP/SCOMP Markdown) into filled DOCX contracts.
//!
//! ## Core Concepts
//!
//! - **Report**: a Markdown string with `**Label:** value` lines and a
//!   beneficiary table under "Antecedentes del beneficiario"
//! - **Field Extraction**: labeled-pattern matching into a [`FieldRecord`]
//! - **Beneficiaries**: one [`BeneficiaryRecord`] per data row, in report order
//! - **Literal templates**: `{TOKEN}` placeholders and `Nombre: ______` blanks
//! - **Templated contracts**: `{{ key }}` tags plus one beneficiary row that is
//!   cloned for every additional beneficiary
//!
//! ## Example
//!
//! ```rust,ignore
//! use pension_contract_builder::*;
//!
//! let config = ContractConfig::default().with_template_dir("plantillas");
//! let generator = ContractGenerator::new(config);
//!
//! let report = std::fs::read_to_string("informe.md")?;
//! let contract = generator.generate(&report, ContractType::Survivorship)?;
//! std::fs::write(&contract.file_name, &contract.bytes)?;
//! ```

pub mod beneficiaries;
pub mod config;
pub mod context;
pub mod docx;
pub mod error;
pub mod extraction;
pub mod filler;
pub mod schema;
pub mod template;
pub mod verify;

pub use beneficiaries::{parse_beneficiaries, MAX_BENEFICIARIES};
pub use config::{ContractConfig, FillRegime};
pub use context::{build_placeholder_map, format_date, ContractContext, PlaceholderMap};
pub use docx::{Document, DocumentAdapter};
pub use error::{ContractError, Result};
pub use extraction::{extract_fields, extract_report, find_first_rut};
pub use filler::{ContextRenderer, DocumentFiller, ExpansionOutcome, TagRenderer};
pub use schema::*;
pub use template::{TemplateDescriptor, TemplateResolver};
pub use verify::{audit_output, AuditReport};

use chrono::{Local, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContract {
    pub bytes: Vec<u8>,
    /// Suggested download name, e.g. `Contrato_Final_Juan.docx`
    pub file_name: String,
    pub template: TemplateDescriptor,
}

/// Download name built from the first word of the affiliate's name.
pub fn output_file_name(fields: &FieldRecord) -> String {
    match fields
        .get(FieldLabel::FullName)
        .and_then(|name| name.split_whitespace().next())
    {
        Some(first) => format!("Contrato_Final_{}.docx", first),
        None => "Contrato_Final.docx".to_string(),
    }
}

pub struct ContractGenerator {
    resolver: TemplateResolver,
    filler: DocumentFiller,
}

impl ContractGenerator {
    pub fn new(config: ContractConfig) -> Self {
        Self {
            resolver: TemplateResolver::new(config),
            filler: DocumentFiller::new(),
        }
    }

    pub fn config(&self) -> &ContractConfig {
        self.resolver.config()
    }

    pub fn generate(&self, report: &str, contract_type: ContractType) -> Result<GeneratedContract> {
        self.generate_on(report, contract_type, Local::now().date_naive())
    }

    pub fn generate_on(
        &self,
        report: &str,
        contract_type: ContractType,
        date: NaiveDate,
    ) -> Result<GeneratedContract> {
        let data = extract_report(report);
        self.generate_from_data(&data, contract_type, date)
    }

    /// Fills the template for `contract_type` from already extracted data.
    /// Beneficiaries are only written into survivorship contracts.
    pub fn generate_from_data(
        &self,
        data: &ReportData,
        contract_type: ContractType,
        date: NaiveDate,
    ) -> Result<GeneratedContract> {
        let template = self.resolver.resolve(contract_type)?;
        let config = self.resolver.config();
        let beneficiaries =
            (contract_type == ContractType::Survivorship).then_some(data.beneficiaries.as_slice());

        info!(
            "Generating '{}' contract from {} ({} fields, {} beneficiaries)",
            contract_type.label(),
            template.resolved_file_path.display(),
            data.fields.len(),
            beneficiaries.map_or(0, <[BeneficiaryRecord]>::len)
        );

        let bytes = match config.regime {
            FillRegime::Literal => {
                let date = format_date(date, &config.date_format);
                let map = build_placeholder_map(&data.fields, contract_type, &date);
                self.filler
                    .fill_literal(&template.resolved_file_path, &map, beneficiaries)
            }
            FillRegime::Templated => {
                let context =
                    ContractContext::from_report(data, contract_type, date, &config.date_format)
                        .to_value()?;
                self.filler
                    .fill_templated(&template.resolved_file_path, &context, None)
            }
        }?;

        Ok(GeneratedContract {
            bytes,
            file_name: output_file_name(&data.fields),
            template,
        })
    }
}
