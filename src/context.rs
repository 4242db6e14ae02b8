use crate::schema::{BeneficiaryRecord, ContractType, FieldLabel, FieldRecord, ReportData};
use chrono::NaiveDate;
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Literal token -> replacement text for literal-placeholder templates.
pub type PlaceholderMap = BTreeMap<String, String>;

pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

pub const TOKEN_AFFILIATE_NAME: &str = "{NOMBRE AFILIADO}";
pub const TOKEN_AFFILIATE_ID: &str = "{RUT AFILIADO}";
pub const TOKEN_ADDRESS: &str = "{DIRECCIÓN}";
pub const TOKEN_COMMUNE: &str = "{COMUNA}";
pub const TOKEN_CITY: &str = "{CIUDAD}";
pub const TOKEN_MOBILE: &str = "{CELULAR}";
pub const TOKEN_PHONE: &str = "{TELEFONO}";
pub const TOKEN_EMAIL: &str = "{CORREO ELECTRÓNICO}";
pub const TOKEN_MARITAL_STATUS: &str = "{ESTADO CIVIL AFILIADO}";
pub const TOKEN_BIRTH_DATE: &str = "{FECHA DE NACIMIENTO AFILIADO}";
pub const TOKEN_OCCUPATION: &str = "{OFICIO AFILIADO}";
pub const TOKEN_FUND_MANAGER: &str = "{AFP DE ORIGEN}";
pub const TOKEN_HEALTH_SYSTEM: &str = "{SISTEMA DE SALUD}";
pub const TOKEN_PENSION_TYPE: &str = "{TIPO DE PENSIÓN}";
pub const TOKEN_DATE: &str = "{FECHA}";
pub const TOKEN_BARE_ID: &str = "{{RUT}}";
pub const TOKEN_DECEASED_NAME: &str = "{NOMBRE CAUSANTE}";
pub const TOKEN_DECEASED_ID: &str = "{RUT CAUSANTE}";
pub const TOKEN_REQUESTER_NAME: &str = "{NOMBRE CONSULTANTE}";
pub const TOKEN_REQUESTER_ID: &str = "{RUT CONSULTANTE}";

/// Formats `date`, falling back to `DEFAULT_DATE_FORMAT` when `format` is
/// not a valid chrono format string.
pub fn format_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_ok() {
        return out;
    }
    warn!("Invalid date format '{}', using {}", format, DEFAULT_DATE_FORMAT);
    date.format(DEFAULT_DATE_FORMAT).to_string()
}

fn affiliate_id(fields: &FieldRecord) -> String {
    fields
        .first_of(&[FieldLabel::NationalId, FieldLabel::NationalIdAlt])
        .unwrap_or_default()
        .to_string()
}

fn value(fields: &FieldRecord, labels: &[FieldLabel]) -> String {
    fields.first_of(labels).unwrap_or_default().to_string()
}

/// Builds the token map for literal-placeholder templates. Absent fields
/// map to empty strings, which the literal filler leaves untouched.
pub fn build_placeholder_map(
    fields: &FieldRecord,
    contract_type: ContractType,
    date: &str,
) -> PlaceholderMap {
    let id = affiliate_id(fields);
    let mut map = PlaceholderMap::new();

    let mut put = |token: &str, value: String| {
        map.insert(token.to_string(), value);
    };

    put(TOKEN_AFFILIATE_NAME, value(fields, &[FieldLabel::FullName]));
    put(TOKEN_AFFILIATE_ID, id.clone());
    put(TOKEN_ADDRESS, value(fields, &[FieldLabel::Address]));
    put(TOKEN_COMMUNE, value(fields, &[FieldLabel::Commune]));
    put(
        TOKEN_CITY,
        value(fields, &[FieldLabel::City, FieldLabel::Commune]),
    );
    put(
        TOKEN_MOBILE,
        value(fields, &[FieldLabel::Mobile, FieldLabel::Phone]),
    );
    put(TOKEN_PHONE, value(fields, &[FieldLabel::Phone]));
    put(TOKEN_EMAIL, value(fields, &[FieldLabel::Email]));
    put(TOKEN_MARITAL_STATUS, value(fields, &[FieldLabel::MaritalStatus]));
    put(TOKEN_BIRTH_DATE, value(fields, &[FieldLabel::BirthDate]));
    put(TOKEN_OCCUPATION, value(fields, &[FieldLabel::Occupation]));
    put(
        TOKEN_FUND_MANAGER,
        value(fields, &[FieldLabel::OriginFundManager]),
    );
    put(
        TOKEN_HEALTH_SYSTEM,
        value(
            fields,
            &[FieldLabel::HealthSystem, FieldLabel::HealthInstitution],
        ),
    );
    put(
        TOKEN_PENSION_TYPE,
        value(fields, &[FieldLabel::RequestedPensionType]),
    );
    put(TOKEN_DATE, date.to_string());
    put(TOKEN_BARE_ID, id);

    if contract_type == ContractType::Survivorship {
        put(TOKEN_DECEASED_NAME, value(fields, &[FieldLabel::DeceasedName]));
        put(TOKEN_DECEASED_ID, value(fields, &[FieldLabel::DeceasedId]));
        put(
            TOKEN_REQUESTER_NAME,
            value(fields, &[FieldLabel::RequesterName]),
        );
        put(TOKEN_REQUESTER_ID, value(fields, &[FieldLabel::RequesterId]));
    }

    map
}

/// Rendering context for `{{ key }}` templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContractContext {
    #[schemars(description = "Affiliate full name")]
    pub nombre_afiliado: String,
    #[schemars(description = "Affiliate RUT")]
    pub rut_afiliado: String,
    pub direccion_afiliado: String,
    pub comuna_afiliado: String,
    #[schemars(description = "City, or the commune when the report has no city")]
    pub ciudad_afiliado: String,
    pub telefono_afiliado: String,
    #[schemars(description = "Mobile number, or the phone when the report has no mobile")]
    pub celular_afiliado: String,
    pub email_afiliado: String,
    pub estado_civil_afiliado: String,
    pub fecha_nacimiento_afiliado: String,
    pub oficio_afiliado: String,
    pub afp_origen: String,
    #[schemars(description = "Health system, or the health institution as a fallback")]
    pub sistema_salud: String,
    pub tipo_pension: String,
    #[schemars(description = "Generation date, already formatted")]
    pub fecha_actual: String,
    pub nombre_causante: String,
    pub rut_causante: String,
    pub nombre_consultante: String,
    pub rut_consultante: String,
    #[schemars(description = "Beneficiaries in report order; only set for survivorship contracts")]
    pub beneficiaries: Vec<BeneficiaryRecord>,
}

impl ContractContext {
    pub fn from_report(
        data: &ReportData,
        contract_type: ContractType,
        date: NaiveDate,
        date_format: &str,
    ) -> Self {
        let fields = &data.fields;
        let survivorship = contract_type == ContractType::Survivorship;

        Self {
            nombre_afiliado: value(fields, &[FieldLabel::FullName]),
            rut_afiliado: affiliate_id(fields),
            direccion_afiliado: value(fields, &[FieldLabel::Address]),
            comuna_afiliado: value(fields, &[FieldLabel::Commune]),
            ciudad_afiliado: value(fields, &[FieldLabel::City, FieldLabel::Commune]),
            telefono_afiliado: value(fields, &[FieldLabel::Phone]),
            celular_afiliado: value(fields, &[FieldLabel::Mobile, FieldLabel::Phone]),
            email_afiliado: value(fields, &[FieldLabel::Email]),
            estado_civil_afiliado: value(fields, &[FieldLabel::MaritalStatus]),
            fecha_nacimiento_afiliado: value(fields, &[FieldLabel::BirthDate]),
            oficio_afiliado: value(fields, &[FieldLabel::Occupation]),
            afp_origen: value(fields, &[FieldLabel::OriginFundManager]),
            sistema_salud: value(
                fields,
                &[FieldLabel::HealthSystem, FieldLabel::HealthInstitution],
            ),
            tipo_pension: value(fields, &[FieldLabel::RequestedPensionType]),
            fecha_actual: format_date(date, date_format),
            nombre_causante: value(fields, &[FieldLabel::DeceasedName]),
            rut_causante: value(fields, &[FieldLabel::DeceasedId]),
            nombre_consultante: value(fields, &[FieldLabel::RequesterName]),
            rut_consultante: value(fields, &[FieldLabel::RequesterId]),
            beneficiaries: if survivorship {
                data.beneficiaries.clone()
            } else {
                Vec::new()
            },
        }
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ContractContext)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> FieldRecord {
        let mut fields = FieldRecord::new();
        fields.insert(FieldLabel::FullName, "María José Soto");
        fields.insert(FieldLabel::NationalIdAlt, "12.345.678-9");
        fields.insert(FieldLabel::Commune, "Ñuñoa");
        fields.insert(FieldLabel::Phone, "+56 2 2222 2222");
        fields.insert(FieldLabel::HealthInstitution, "Fonasa");
        fields.insert(FieldLabel::DeceasedName, "Pedro Soto");
        fields
    }

    #[test]
    fn test_placeholder_map_fallbacks() {
        let map = build_placeholder_map(
            &sample_fields(),
            ContractType::OldAgeOrDisability,
            "01/03/2026",
        );

        assert_eq!(map[TOKEN_AFFILIATE_ID], "12.345.678-9");
        assert_eq!(map[TOKEN_BARE_ID], "12.345.678-9");
        assert_eq!(map[TOKEN_CITY], "Ñuñoa");
        assert_eq!(map[TOKEN_MOBILE], "+56 2 2222 2222");
        assert_eq!(map[TOKEN_HEALTH_SYSTEM], "Fonasa");
        assert_eq!(map[TOKEN_DATE], "01/03/2026");
        assert_eq!(map[TOKEN_ADDRESS], "");
        assert!(!map.contains_key(TOKEN_DECEASED_NAME));
    }

    #[test]
    fn test_survivorship_adds_deceased_and_requester() {
        let map = build_placeholder_map(&sample_fields(), ContractType::Survivorship, "01/03/2026");
        assert_eq!(map[TOKEN_DECEASED_NAME], "Pedro Soto");
        assert_eq!(map[TOKEN_REQUESTER_ID], "");
    }

    #[test]
    fn test_context_carries_beneficiaries_only_for_survivorship() {
        let data = ReportData {
            fields: sample_fields(),
            beneficiaries: vec![BeneficiaryRecord {
                name: "Ana Soto".to_string(),
                ..Default::default()
            }],
        };
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let survivorship =
            ContractContext::from_report(&data, ContractType::Survivorship, date, "%d/%m/%Y");
        assert_eq!(survivorship.beneficiaries.len(), 1);
        assert_eq!(survivorship.fecha_actual, "01/03/2026");
        assert_eq!(survivorship.ciudad_afiliado, "Ñuñoa");

        let old_age =
            ContractContext::from_report(&data, ContractType::OldAgeOrDisability, date, "%Y-%m-%d");
        assert!(old_age.beneficiaries.is_empty());
        assert_eq!(old_age.fecha_actual, "2026-03-01");

        let value = survivorship.to_value().unwrap();
        assert_eq!(value["beneficiaries"][0]["nombre"], "Ana Soto");
        assert_eq!(value["rut_afiliado"], "12.345.678-9");
    }

    #[test]
    fn test_invalid_date_format_falls_back() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(format_date(date, "%Q"), "01/03/2026");
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = ContractContext::schema_as_json().unwrap();
        assert!(schema_json.contains("nombre_afiliado"));
        assert!(schema_json.contains("beneficiaries"));
        assert!(schema_json.contains("fecha_nacimiento"));
    }
}
