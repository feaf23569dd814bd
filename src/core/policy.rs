//! Tax policy data.
//!
//! Every rate, threshold and band used by the tax engine lives here as data so that
//! a new finance act means a new policy file, not a code change.

use super::settings::BusinessType;
use super::transaction::category_key;
use super::year::TaxYear;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy {version}: band table is empty")]
    NoBands { version: String },
    #[error("policy {version}: band {index} has non-positive width {width}")]
    InvalidBandWidth {
        version: String,
        index: usize,
        width: Decimal,
    },
    #[error("policy {version}: only the last band may be unbounded (band {index})")]
    UnboundedBandNotLast { version: String, index: usize },
    #[error("policy {version}: the last band must be unbounded")]
    LastBandBounded { version: String },
    #[error("policy {version}: {field} rate {rate} is outside 0..=1")]
    RateOutOfRange {
        version: String,
        field: String,
        rate: Decimal,
    },
    #[error("policy {version}: {field} must not be negative ({value})")]
    NegativeAmount {
        version: String,
        field: String,
        value: Decimal,
    },
    #[error("no policy in effect for tax year {0}")]
    NoPolicyForYear(TaxYear),
}

/// One slice of the progressive schedule. Bands are applied in order, each taxing
/// up to `width` of the income left after the previous bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxBand {
    /// Size of the slice; `None` for the final, unbounded band
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub width: Option<Decimal>,
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

impl TaxBand {
    pub fn new(width: Decimal, rate: Decimal) -> Self {
        TaxBand {
            width: Some(width),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        TaxBand { width: None, rate }
    }
}

/// Relief subtracted from gross income before the progressive bands apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReliefAllowance {
    /// Consolidated Relief Allowance:
    /// `max(floor, floor_rate * gross) + gross_rate * gross`
    Consolidated {
        #[schemars(with = "f64")]
        floor: Decimal,
        #[schemars(with = "f64")]
        floor_rate: Decimal,
        #[schemars(with = "f64")]
        gross_rate: Decimal,
    },
    Fixed {
        #[schemars(with = "f64")]
        amount: Decimal,
    },
    None,
}

impl ReliefAllowance {
    pub fn amount(&self, gross: Decimal) -> Decimal {
        let gross = gross.max(Decimal::ZERO);
        match self {
            ReliefAllowance::Consolidated {
                floor,
                floor_rate,
                gross_rate,
            } => (*floor)
                .max(gross * floor_rate)
                .saturating_add(gross * gross_rate),
            ReliefAllowance::Fixed { amount } => *amount,
            ReliefAllowance::None => Decimal::ZERO,
        }
    }
}

/// Which expenses reduce taxable income for a business type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeductionRule {
    AllExpenses,
    /// Only expenses whose category is listed (case-insensitive)
    Categories { categories: Vec<String> },
    NoDeductions,
}

impl DeductionRule {
    pub fn allows(&self, category: &str) -> bool {
        match self {
            DeductionRule::AllExpenses => true,
            DeductionRule::Categories { categories } => {
                let key = category_key(category);
                categories.iter().any(|c| category_key(c) == key)
            }
            DeductionRule::NoDeductions => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SmallCompanyRule {
    /// Small companies with year-to-date turnover strictly below this pay no income tax
    #[schemars(with = "f64")]
    pub turnover_threshold: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EducationTaxRule {
    /// Rate applied to assessable profit of company types
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ItLevyRule {
    /// Rate applied to profit before tax
    #[schemars(with = "f64")]
    pub rate: Decimal,
    /// Levy applies once year-to-date turnover reaches this amount
    #[schemars(with = "f64")]
    pub turnover_threshold: Decimal,
    /// Business types subject to the levy
    pub business_types: Vec<BusinessType>,
}

impl ItLevyRule {
    pub fn applies(&self, business_type: BusinessType, turnover_ytd: Decimal) -> bool {
        self.business_types.contains(&business_type) && turnover_ytd >= self.turnover_threshold
    }
}

/// A versioned set of tax rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxPolicy {
    pub version: String,
    /// First calendar year this policy applies to
    pub effective_year: i32,
    /// Personal income tax schedule
    pub bands: Vec<TaxBand>,
    pub relief: ReliefAllowance,
    /// Flat company income tax rate
    #[schemars(with = "f64")]
    pub company_rate: Decimal,
    pub small_company: SmallCompanyRule,
    pub education_tax: EducationTaxRule,
    pub it_levy: ItLevyRule,
    /// Deduction rule per business type; missing entries allow no deductions
    #[serde(default)]
    pub deductions: BTreeMap<BusinessType, DeductionRule>,
}

impl TaxPolicy {
    /// Nigerian rules as applied for 2024 (PITA bands, CRA, CITA, TET and NITDA levy).
    pub fn nigeria_2024() -> Self {
        let mut deductions = BTreeMap::new();
        deductions.insert(BusinessType::Individual, DeductionRule::AllExpenses);
        deductions.insert(BusinessType::SmallCompany, DeductionRule::AllExpenses);
        deductions.insert(BusinessType::Company, DeductionRule::AllExpenses);

        TaxPolicy {
            version: "NG-2024".to_string(),
            effective_year: 2020,
            bands: vec![
                TaxBand::new(dec!(300000), dec!(0.07)),
                TaxBand::new(dec!(300000), dec!(0.11)),
                TaxBand::new(dec!(500000), dec!(0.15)),
                TaxBand::new(dec!(500000), dec!(0.19)),
                TaxBand::new(dec!(1600000), dec!(0.21)),
                TaxBand::unbounded(dec!(0.24)),
            ],
            relief: ReliefAllowance::Consolidated {
                floor: dec!(200000),
                floor_rate: dec!(0.01),
                gross_rate: dec!(0.20),
            },
            company_rate: dec!(0.30),
            small_company: SmallCompanyRule {
                turnover_threshold: dec!(50000000),
            },
            education_tax: EducationTaxRule { rate: dec!(0.03) },
            it_levy: ItLevyRule {
                rate: dec!(0.01),
                turnover_threshold: dec!(100000000),
                business_types: vec![BusinessType::SmallCompany, BusinessType::Company],
            },
            deductions,
        }
    }

    pub fn deduction_rule(&self, business_type: BusinessType) -> &DeductionRule {
        self.deductions
            .get(&business_type)
            .unwrap_or(&DeductionRule::NoDeductions)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let version = || self.version.clone();

        if self.bands.is_empty() {
            return Err(PolicyError::NoBands { version: version() });
        }
        let last = self.bands.len() - 1;
        for (index, band) in self.bands.iter().enumerate() {
            match band.width {
                Some(width) if width <= Decimal::ZERO => {
                    return Err(PolicyError::InvalidBandWidth {
                        version: version(),
                        index,
                        width,
                    })
                }
                Some(_) if index == last => {
                    return Err(PolicyError::LastBandBounded { version: version() })
                }
                None if index != last => {
                    return Err(PolicyError::UnboundedBandNotLast {
                        version: version(),
                        index,
                    })
                }
                _ => {}
            }
            check_rate(&self.version, &format!("band {index}"), band.rate)?;
        }

        check_rate(&self.version, "company", self.company_rate)?;
        check_rate(&self.version, "education tax", self.education_tax.rate)?;
        check_rate(&self.version, "IT levy", self.it_levy.rate)?;
        check_non_negative(
            &self.version,
            "small company turnover threshold",
            self.small_company.turnover_threshold,
        )?;
        check_non_negative(
            &self.version,
            "IT levy turnover threshold",
            self.it_levy.turnover_threshold,
        )?;

        match &self.relief {
            ReliefAllowance::Consolidated {
                floor,
                floor_rate,
                gross_rate,
            } => {
                check_non_negative(&self.version, "relief floor", *floor)?;
                check_rate(&self.version, "relief floor", *floor_rate)?;
                check_rate(&self.version, "relief gross", *gross_rate)?;
            }
            ReliefAllowance::Fixed { amount } => {
                check_non_negative(&self.version, "relief amount", *amount)?;
            }
            ReliefAllowance::None => {}
        }
        Ok(())
    }
}

fn check_rate(version: &str, field: &str, rate: Decimal) -> Result<(), PolicyError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(PolicyError::RateOutOfRange {
            version: version.to_string(),
            field: field.to_string(),
            rate,
        });
    }
    Ok(())
}

fn check_non_negative(version: &str, field: &str, value: Decimal) -> Result<(), PolicyError> {
    if value < Decimal::ZERO {
        return Err(PolicyError::NegativeAmount {
            version: version.to_string(),
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

/// Policies keyed by the year they take effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyBook {
    pub policies: Vec<TaxPolicy>,
}

impl Default for PolicyBook {
    fn default() -> Self {
        PolicyBook {
            policies: vec![TaxPolicy::nigeria_2024()],
        }
    }
}

impl PolicyBook {
    /// Latest policy whose `effective_year` is not after `year`.
    pub fn for_year(&self, year: TaxYear) -> Result<&TaxPolicy, PolicyError> {
        self.policies
            .iter()
            .filter(|p| p.effective_year <= year.0)
            .max_by_key(|p| p.effective_year)
            .ok_or(PolicyError::NoPolicyForYear(year))
    }
}

/// Read a policy file holding either a single policy or a `{ "policies": [...] }` book.
pub fn read_policy_json<R: Read>(reader: R) -> anyhow::Result<PolicyBook> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PolicyFile {
        Book(PolicyBook),
        Single(Box<TaxPolicy>),
    }

    let book = match serde_json::from_reader(reader)? {
        PolicyFile::Book(book) => book,
        PolicyFile::Single(policy) => PolicyBook {
            policies: vec![*policy],
        },
    };
    log::debug!("loaded {} tax policies", book.policies.len());
    Ok(book)
}
