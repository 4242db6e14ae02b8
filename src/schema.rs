use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum FieldLabel {
    #[serde(rename = "Nombre Completo")]
    FullName,
    #[serde(rename = "RUT")]
    NationalId,
    #[serde(rename = "Dirección")]
    Address,
    #[serde(rename = "Comuna")]
    Commune,
    #[serde(rename = "Ciudad")]
    City,
    #[serde(rename = "Teléfono")]
    Phone,
    #[serde(rename = "Celular")]
    Mobile,
    #[serde(rename = "Correo Electrónico")]
    Email,
    #[serde(rename = "Estado Civil")]
    MaritalStatus,
    #[serde(rename = "Cédula de Identidad")]
    NationalIdAlt,
    #[serde(rename = "Fecha de Nacimiento")]
    BirthDate,
    #[serde(rename = "AFP de Origen")]
    OriginFundManager,
    #[serde(rename = "Institución de Salud")]
    HealthInstitution,
    #[serde(rename = "Sistema de Salud")]
    HealthSystem,
    #[serde(rename = "Tipo de Pensión Solicitada")]
    RequestedPensionType,
    #[serde(rename = "Fecha Solicitud de Ofertas")]
    OfferRequestDate,
    #[serde(rename = "Modalidades Solicitadas")]
    RequestedModalities,
    #[serde(rename = "Causante Nombre")]
    DeceasedName,
    #[serde(rename = "Causante RUT")]
    DeceasedId,
    #[serde(rename = "Consultante Nombre")]
    RequesterName,
    #[serde(rename = "Consultante RUT")]
    RequesterId,
    #[serde(rename = "Profesión u Oficio")]
    Occupation,
}

impl FieldLabel {
    pub const ALL: [FieldLabel; 22] = [
        FieldLabel::FullName,
        FieldLabel::NationalId,
        FieldLabel::Address,
        FieldLabel::Commune,
        FieldLabel::City,
        FieldLabel::Phone,
        FieldLabel::Mobile,
        FieldLabel::Email,
        FieldLabel::MaritalStatus,
        FieldLabel::NationalIdAlt,
        FieldLabel::BirthDate,
        FieldLabel::OriginFundManager,
        FieldLabel::HealthInstitution,
        FieldLabel::HealthSystem,
        FieldLabel::RequestedPensionType,
        FieldLabel::OfferRequestDate,
        FieldLabel::RequestedModalities,
        FieldLabel::DeceasedName,
        FieldLabel::DeceasedId,
        FieldLabel::RequesterName,
        FieldLabel::RequesterId,
        FieldLabel::Occupation,
    ];

    /// The key the report generator writes for this field.
    pub fn key(&self) -> &'static str {
        match self {
            FieldLabel::FullName => "Nombre Completo",
            FieldLabel::NationalId => "RUT",
            FieldLabel::Address => "Dirección",
            FieldLabel::Commune => "Comuna",
            FieldLabel::City => "Ciudad",
            FieldLabel::Phone => "Teléfono",
            FieldLabel::Mobile => "Celular",
            FieldLabel::Email => "Correo Electrónico",
            FieldLabel::MaritalStatus => "Estado Civil",
            FieldLabel::NationalIdAlt => "Cédula de Identidad",
            FieldLabel::BirthDate => "Fecha de Nacimiento",
            FieldLabel::OriginFundManager => "AFP de Origen",
            FieldLabel::HealthInstitution => "Institución de Salud",
            FieldLabel::HealthSystem => "Sistema de Salud",
            FieldLabel::RequestedPensionType => "Tipo de Pensión Solicitada",
            FieldLabel::OfferRequestDate => "Fecha Solicitud de Ofertas",
            FieldLabel::RequestedModalities => "Modalidades Solicitadas",
            FieldLabel::DeceasedName => "Causante Nombre",
            FieldLabel::DeceasedId => "Causante RUT",
            FieldLabel::RequesterName => "Consultante Nombre",
            FieldLabel::RequesterId => "Consultante RUT",
            FieldLabel::Occupation => "Profesión u Oficio",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|label| label.key() == key)
    }
}

/// Scalar fields pulled out of a report. A label is present only when the
/// report carried a usable value for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FieldRecord {
    values: BTreeMap<FieldLabel, String>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: FieldLabel, value: impl Into<String>) {
        self.values.insert(label, value.into());
    }

    pub fn get(&self, label: FieldLabel) -> Option<&str> {
        self.values.get(&label).map(String::as_str)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&str> {
        FieldLabel::from_key(key).and_then(|label| self.get(label))
    }

    pub fn contains(&self, label: FieldLabel) -> bool {
        self.values.contains_key(&label)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldLabel, &str)> {
        self.values.iter().map(|(label, value)| (*label, value.as_str()))
    }

    /// First non-empty value among `labels`, in order.
    pub fn first_of(&self, labels: &[FieldLabel]) -> Option<&str> {
        labels
            .iter()
            .filter_map(|label| self.get(*label))
            .find(|value| !value.is_empty())
    }
}

pub const TAG_NAME: &str = "{NOMBRE BENEFICIARIO}";
pub const TAG_NATIONAL_ID: &str = "{RUT BENEFICIARIO}";
pub const TAG_RELATIONSHIP: &str = "{PARENTESCO BENEFICIARIO}";
pub const TAG_SEX: &str = "{SEXO BENEFICIARIO}";
pub const TAG_DISABILITY: &str = "{INVALIDEZ BENEFICIARIO}";
pub const TAG_BIRTH_DATE: &str = "{FECHA NAC BENEFICIARIO}";
pub const TAG_BIRTH_DATE_LONG: &str = "{FECHA NACIMIENTO BENEFICIARIO}";

/// Every per-beneficiary tag a contract template may carry.
pub const BENEFICIARY_TAGS: [&str; 7] = [
    TAG_NAME,
    TAG_NATIONAL_ID,
    TAG_RELATIONSHIP,
    TAG_SEX,
    TAG_DISABILITY,
    TAG_BIRTH_DATE,
    TAG_BIRTH_DATE_LONG,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BeneficiaryRecord {
    #[serde(rename = "nombre", default)]
    #[schemars(description = "Full name of the beneficiary")]
    pub name: String,

    #[serde(rename = "rut", default)]
    #[schemars(description = "Chilean national ID (RUT), e.g. 11.111.111-1")]
    pub national_id: String,

    #[serde(rename = "parentesco", default)]
    #[schemars(description = "Relationship to the affiliate (Hijo, Cónyuge, ...)")]
    pub relationship: String,

    #[serde(rename = "sexo", default)]
    pub sex: String,

    #[serde(rename = "invalidez", default)]
    #[schemars(description = "Disability flag as written in the report (S/N)")]
    pub disability: String,

    #[serde(rename = "fecha_nacimiento", default)]
    pub birth_date: String,
}

impl BeneficiaryRecord {
    pub fn has_identity(&self) -> bool {
        !self.name.is_empty() || !self.national_id.is_empty()
    }

    pub fn tag_values(&self) -> [(&'static str, &str); 7] {
        [
            (TAG_NAME, self.name.as_str()),
            (TAG_NATIONAL_ID, self.national_id.as_str()),
            (TAG_RELATIONSHIP, self.relationship.as_str()),
            (TAG_SEX, self.sex.as_str()),
            (TAG_DISABILITY, self.disability.as_str()),
            (TAG_BIRTH_DATE, self.birth_date.as_str()),
            (TAG_BIRTH_DATE_LONG, self.birth_date.as_str()),
        ]
    }

    /// Replaces every beneficiary tag in `text` with this record's values.
    /// Empty values clear the tag.
    pub fn apply_tags(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (tag, value) in self.tag_values() {
            if out.contains(tag) {
                out = out.replace(tag, value);
            }
        }
        out
    }
}

pub fn contains_beneficiary_tag(text: &str) -> bool {
    BENEFICIARY_TAGS.iter().any(|tag| text.contains(tag))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ContractType {
    #[serde(rename = "Vejez o Invalidez")]
    OldAgeOrDisability,
    #[serde(rename = "Sobrevivencia")]
    Survivorship,
}

impl ContractType {
    /// Anything other than the old-age selector is treated as survivorship.
    pub fn from_selector(selector: &str) -> Self {
        if selector.trim() == "Vejez o Invalidez" {
            ContractType::OldAgeOrDisability
        } else {
            ContractType::Survivorship
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContractType::OldAgeOrDisability => "Vejez o Invalidez",
            ContractType::Survivorship => "Sobrevivencia",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub fields: FieldRecord,
    pub beneficiaries: Vec<BeneficiaryRecord>,
}

impl ReportData {
    /// Single flat mapping with beneficiaries keyed as `Beneficiario {i} ...`.
    pub fn to_flat_map(&self) -> BTreeMap<String, String> {
        let mut flat: BTreeMap<String, String> = self
            .fields
            .iter()
            .map(|(label, value)| (label.key().to_string(), value.to_string()))
            .collect();

        for (idx, beneficiary) in self.beneficiaries.iter().enumerate() {
            let n = idx + 1;
            let columns = [
                ("Nombre", &beneficiary.name),
                ("RUT", &beneficiary.national_id),
                ("Parentesco", &beneficiary.relationship),
                ("Sexo", &beneficiary.sex),
                ("Invalidez", &beneficiary.disability),
                ("Fecha de Nacimiento", &beneficiary.birth_date),
            ];
            for (column, value) in columns {
                flat.insert(format!("Beneficiario {} {}", n, column), value.clone());
            }
        }

        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_keys_round_trip() {
        for label in FieldLabel::ALL {
            assert_eq!(FieldLabel::from_key(label.key()), Some(label));
        }
        assert_eq!(FieldLabel::from_key("Unknown"), None);
    }

    #[test]
    fn test_field_record_serializes_with_report_keys() {
        let mut record = FieldRecord::new();
        record.insert(FieldLabel::NationalId, "22.222.222-2");
        record.insert(FieldLabel::Address, "Calle Falsa 123");

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"RUT\":\"22.222.222-2\""));
        assert!(json.contains("\"Dirección\":\"Calle Falsa 123\""));
        assert_eq!(record.get_by_key("RUT"), Some("22.222.222-2"));
    }

    #[test]
    fn test_beneficiary_serializes_with_context_keys() {
        let record = BeneficiaryRecord {
            name: "Maria Gonzalez".to_string(),
            national_id: "22.222.222-2".to_string(),
            relationship: "Conyuge".to_string(),
            ..Default::default()
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["nombre"], "Maria Gonzalez");
        assert_eq!(value["rut"], "22.222.222-2");
        assert_eq!(value["parentesco"], "Conyuge");
        assert_eq!(value["fecha_nacimiento"], "");
    }

    #[test]
    fn test_apply_tags_clears_missing_values() {
        let record = BeneficiaryRecord {
            name: "Pedro".to_string(),
            ..Default::default()
        };
        let text = "{NOMBRE BENEFICIARIO} / {RUT BENEFICIARIO} / {FECHA NACIMIENTO BENEFICIARIO}";
        assert_eq!(record.apply_tags(text), "Pedro /  / ");
    }

    #[test]
    fn test_contract_type_selector() {
        assert_eq!(
            ContractType::from_selector("Vejez o Invalidez"),
            ContractType::OldAgeOrDisability
        );
        assert_eq!(
            ContractType::from_selector("Sobrevivencia"),
            ContractType::Survivorship
        );
        assert_eq!(
            ContractType::from_selector("anything"),
            ContractType::Survivorship
        );
    }

    #[test]
    fn test_flat_map_numbers_beneficiaries_from_one() {
        let mut fields = FieldRecord::new();
        fields.insert(FieldLabel::FullName, "Juan Perez");
        let data = ReportData {
            fields,
            beneficiaries: vec![
                BeneficiaryRecord {
                    name: "Ana".to_string(),
                    ..Default::default()
                },
                BeneficiaryRecord {
                    name: "Luis".to_string(),
                    national_id: "9.800.454-8".to_string(),
                    ..Default::default()
                },
            ],
        };

        let flat = data.to_flat_map();
        assert_eq!(flat["Nombre Completo"], "Juan Perez");
        assert_eq!(flat["Beneficiario 1 Nombre"], "Ana");
        assert_eq!(flat["Beneficiario 2 RUT"], "9.800.454-8");
        assert_eq!(flat["Beneficiario 2 Sexo"], "");
    }
}
