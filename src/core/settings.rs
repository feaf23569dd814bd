use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Legal form of the business, which selects the income tax regime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[default]
    Individual,
    SmallCompany,
    Company,
}

impl BusinessType {
    pub fn is_company(self) -> bool {
        matches!(self, BusinessType::SmallCompany | BusinessType::Company)
    }

    pub fn display(self) -> &'static str {
        match self {
            BusinessType::Individual => "Individual",
            BusinessType::SmallCompany => "Small company",
            BusinessType::Company => "Company",
        }
    }
}

/// Per-account tax settings, edited through the settings form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxSettings {
    pub business_type: BusinessType,
    #[serde(default)]
    pub is_professional_service: bool,
    #[serde(default)]
    pub vat_registered: bool,
    #[serde(default)]
    pub tax_id: Option<String>,
}

pub fn read_settings_json<R: Read>(reader: R) -> anyhow::Result<TaxSettings> {
    let settings: TaxSettings = serde_json::from_reader(reader)?;
    Ok(settings)
}
