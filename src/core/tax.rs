use super::policy::{TaxBand, TaxPolicy};
use super::settings::{BusinessType, TaxSettings};
use rust_decimal::Decimal;
use serde::Serialize;

/// Figures the engine works from, both for the year to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaxInputs {
    /// Sum of income transactions
    pub turnover_ytd: Decimal,
    /// Turnover minus deductible expenses
    pub taxable_income: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaxLiability {
    pub income_tax: Decimal,
    pub education_tax: Decimal,
    pub it_levy: Decimal,
    pub total_tax: Decimal,
}

impl TaxLiability {
    /// `None` when the total does not fit in a `Decimal`.
    fn new(income_tax: Decimal, education_tax: Decimal, it_levy: Decimal) -> Option<Self> {
        let income_tax = income_tax.max(Decimal::ZERO).round_dp(2);
        let education_tax = education_tax.max(Decimal::ZERO).round_dp(2);
        let it_levy = it_levy.max(Decimal::ZERO).round_dp(2);
        let total_tax = income_tax.checked_add(education_tax)?.checked_add(it_levy)?;
        Some(TaxLiability {
            income_tax,
            education_tax,
            it_levy,
            total_tax,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EstimateStatus {
    Computed,
    NotComputable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxEstimate {
    #[serde(flatten)]
    pub status: EstimateStatus,
    pub small_business_qualified: bool,
    pub liability: TaxLiability,
}

impl TaxEstimate {
    pub fn not_computable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::warn!("tax liability not computable: {reason}");
        TaxEstimate {
            status: EstimateStatus::NotComputable { reason },
            small_business_qualified: false,
            liability: TaxLiability::default(),
        }
    }

    pub fn is_computed(&self) -> bool {
        self.status == EstimateStatus::Computed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VatLiability {
    pub vat_collected: Decimal,
    pub vat_paid: Decimal,
    /// Negative when more VAT was paid than collected (refund position)
    pub net_vat_liability: Decimal,
}

impl VatLiability {
    pub fn is_refund(&self) -> bool {
        self.net_vat_liability < Decimal::ZERO
    }
}

/// Tax on `income` under a progressive schedule after subtracting `relief`.
///
/// Each band taxes the slice of the remaining income it covers, in order, until
/// the income is used up. Any number of bands works; the last one is normally
/// unbounded.
pub fn progressive_tax(income: Decimal, relief: Decimal, bands: &[TaxBand]) -> Decimal {
    let mut remaining = (income - relief.max(Decimal::ZERO)).max(Decimal::ZERO);
    let mut tax = Decimal::ZERO;

    for band in bands {
        if remaining.is_zero() {
            break;
        }
        let slice = match band.width {
            Some(width) => remaining.min(width),
            None => remaining,
        };
        tax += slice * band.rate;
        remaining -= slice;
    }
    tax
}

/// Whether a business is exempt from income tax under the small company rule.
pub fn is_small_business_qualified(
    settings: &TaxSettings,
    turnover_ytd: Decimal,
    policy: &TaxPolicy,
) -> bool {
    settings.business_type == BusinessType::SmallCompany
        && turnover_ytd < policy.small_company.turnover_threshold
}

/// Income tax, education tax and IT levy for the year to date.
///
/// Never fails: missing settings, an invalid policy or negative inputs give a
/// zero liability marked as not computable.
pub fn calculate_tax_liability(
    inputs: &TaxInputs,
    settings: Option<&TaxSettings>,
    policy: &TaxPolicy,
) -> TaxEstimate {
    let Some(settings) = settings else {
        return TaxEstimate::not_computable("tax settings are missing");
    };
    if let Err(err) = policy.validate() {
        return TaxEstimate::not_computable(err.to_string());
    }
    if inputs.turnover_ytd < Decimal::ZERO || inputs.taxable_income < Decimal::ZERO {
        return TaxEstimate::not_computable(format!(
            "negative input (turnover {}, taxable income {})",
            inputs.turnover_ytd, inputs.taxable_income
        ));
    }

    let business_type = settings.business_type;
    let profit = inputs.taxable_income;
    let qualified = is_small_business_qualified(settings, inputs.turnover_ytd, policy);

    let income_tax = match business_type {
        _ if qualified => Decimal::ZERO,
        BusinessType::Individual => {
            let relief = policy.relief.amount(profit);
            progressive_tax(profit, relief, &policy.bands)
        }
        BusinessType::SmallCompany | BusinessType::Company => profit * policy.company_rate,
    };

    let education_tax = if business_type.is_company() && !qualified {
        profit * policy.education_tax.rate
    } else {
        Decimal::ZERO
    };

    let it_levy = if policy.it_levy.applies(business_type, inputs.turnover_ytd) {
        profit * policy.it_levy.rate
    } else {
        Decimal::ZERO
    };

    let Some(liability) = TaxLiability::new(income_tax, education_tax, it_levy) else {
        return TaxEstimate::not_computable("amounts overflow");
    };
    log::debug!(
        "{} under {}: turnover={}, taxable={}, small_company_exempt={}, total={}",
        business_type.display(),
        policy.version,
        inputs.turnover_ytd,
        profit,
        qualified,
        liability.total_tax
    );

    TaxEstimate {
        status: EstimateStatus::Computed,
        small_business_qualified: qualified,
        liability,
    }
}

pub fn calculate_vat_liability(vat_collected: Decimal, vat_paid: Decimal) -> VatLiability {
    VatLiability {
        vat_collected,
        vat_paid,
        net_vat_liability: vat_collected - vat_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings(business_type: BusinessType) -> TaxSettings {
        TaxSettings {
            business_type,
            ..TaxSettings::default()
        }
    }

    fn inputs(turnover_ytd: Decimal, taxable_income: Decimal) -> TaxInputs {
        TaxInputs {
            turnover_ytd,
            taxable_income,
        }
    }

    #[test]
    fn progressive_bands_after_relief() {
        let bands = TaxPolicy::nigeria_2024().bands;
        // 600000 left after relief: 300000 @ 7% + 300000 @ 11%
        let tax = progressive_tax(dec!(800000), dec!(200000), &bands);
        assert_eq!(tax, dec!(21000) + dec!(33000));
    }

    #[test]
    fn progressive_bands_reach_unbounded_band() {
        let bands = TaxPolicy::nigeria_2024().bands;
        let tax = progressive_tax(dec!(3500000), Decimal::ZERO, &bands);
        let expected = dec!(300000) * dec!(0.07)
            + dec!(300000) * dec!(0.11)
            + dec!(500000) * dec!(0.15)
            + dec!(500000) * dec!(0.19)
            + dec!(1600000) * dec!(0.21)
            + dec!(300000) * dec!(0.24);
        assert_eq!(tax, expected);
        assert_eq!(tax, dec!(632000));
    }

    #[test]
    fn progressive_band_partial_slice() {
        let bands = TaxPolicy::nigeria_2024().bands;
        assert_eq!(progressive_tax(dec!(100000), Decimal::ZERO, &bands), dec!(7000));
        assert_eq!(progressive_tax(dec!(450000), Decimal::ZERO, &bands), dec!(37500));
    }

    #[test]
    fn progressive_tax_is_zero_when_relief_exceeds_income() {
        let bands = TaxPolicy::nigeria_2024().bands;
        assert_eq!(progressive_tax(dec!(150000), dec!(200000), &bands), Decimal::ZERO);
        assert_eq!(progressive_tax(Decimal::ZERO, Decimal::ZERO, &bands), Decimal::ZERO);
    }

    #[test]
    fn progressive_tax_generalises_to_any_band_count() {
        let bands = vec![
            TaxBand::new(dec!(1000), dec!(0)),
            TaxBand::unbounded(dec!(0.5)),
        ];
        assert_eq!(progressive_tax(dec!(3000), Decimal::ZERO, &bands), dec!(1000));

        let single = vec![TaxBand::unbounded(dec!(0.1))];
        assert_eq!(progressive_tax(dec!(3000), dec!(1000), &single), dec!(200));
    }

    #[test]
    fn individual_uses_bands_and_consolidated_relief() {
        let policy = TaxPolicy::nigeria_2024();
        let estimate = calculate_tax_liability(
            &inputs(dec!(900000), dec!(800000)),
            Some(&settings(BusinessType::Individual)),
            &policy,
        );
        // CRA 360000 leaves 440000: 300000 @ 7% + 140000 @ 11%
        assert!(estimate.is_computed());
        assert_eq!(estimate.liability.income_tax, dec!(36400));
        assert_eq!(estimate.liability.education_tax, Decimal::ZERO);
        assert_eq!(estimate.liability.it_levy, Decimal::ZERO);
        assert_eq!(estimate.liability.total_tax, dec!(36400));
        assert!(!estimate.small_business_qualified);
    }

    #[test]
    fn small_company_below_threshold_pays_no_income_tax() {
        let policy = TaxPolicy::nigeria_2024();
        for turnover in [dec!(0), dec!(1), dec!(25000000), dec!(49999999.99)] {
            let estimate = calculate_tax_liability(
                &inputs(turnover, turnover),
                Some(&settings(BusinessType::SmallCompany)),
                &policy,
            );
            assert!(estimate.small_business_qualified, "turnover {turnover}");
            assert_eq!(estimate.liability.income_tax, Decimal::ZERO);
            assert_eq!(estimate.liability.total_tax, Decimal::ZERO);
        }
    }

    #[test]
    fn small_company_at_threshold_is_taxed_as_company() {
        let policy = TaxPolicy::nigeria_2024();
        let estimate = calculate_tax_liability(
            &inputs(dec!(50000000), dec!(10000000)),
            Some(&settings(BusinessType::SmallCompany)),
            &policy,
        );
        assert!(!estimate.small_business_qualified);
        assert_eq!(estimate.liability.income_tax, dec!(3000000));
        assert_eq!(estimate.liability.education_tax, dec!(300000));
        assert_eq!(estimate.liability.it_levy, Decimal::ZERO);
        assert_eq!(estimate.liability.total_tax, dec!(3300000));
    }

    #[test]
    fn company_is_never_small_business_qualified() {
        let policy = TaxPolicy::nigeria_2024();
        let estimate = calculate_tax_liability(
            &inputs(dec!(1000000), dec!(400000)),
            Some(&settings(BusinessType::Company)),
            &policy,
        );
        assert!(!estimate.small_business_qualified);
        assert_eq!(estimate.liability.income_tax, dec!(120000));
        assert_eq!(estimate.liability.education_tax, dec!(12000));
    }

    #[test]
    fn it_levy_applies_to_large_companies() {
        let policy = TaxPolicy::nigeria_2024();
        let estimate = calculate_tax_liability(
            &inputs(dec!(150000000), dec!(40000000)),
            Some(&settings(BusinessType::Company)),
            &policy,
        );
        assert_eq!(estimate.liability.income_tax, dec!(12000000));
        assert_eq!(estimate.liability.education_tax, dec!(1200000));
        assert_eq!(estimate.liability.it_levy, dec!(400000));
        assert_eq!(estimate.liability.total_tax, dec!(13600000));
    }

    #[test]
    fn missing_settings_is_not_computable() {
        let estimate = calculate_tax_liability(
            &inputs(dec!(1000), dec!(1000)),
            None,
            &TaxPolicy::nigeria_2024(),
        );
        assert!(!estimate.is_computed());
        assert_eq!(estimate.liability, TaxLiability::default());
    }

    #[test]
    fn invalid_policy_is_not_computable() {
        let mut policy = TaxPolicy::nigeria_2024();
        policy.bands.clear();
        let estimate = calculate_tax_liability(
            &inputs(dec!(1000000), dec!(1000000)),
            Some(&settings(BusinessType::Individual)),
            &policy,
        );
        assert!(matches!(
            estimate.status,
            EstimateStatus::NotComputable { .. }
        ));
        assert_eq!(estimate.liability.total_tax, Decimal::ZERO);
    }

    #[test]
    fn negative_inputs_are_not_computable() {
        let estimate = calculate_tax_liability(
            &inputs(dec!(1000), dec!(-1)),
            Some(&settings(BusinessType::Company)),
            &TaxPolicy::nigeria_2024(),
        );
        assert!(!estimate.is_computed());
        assert_eq!(estimate.liability.total_tax, Decimal::ZERO);
    }

    #[test]
    fn results_are_rounded_and_non_negative() {
        let policy = TaxPolicy::nigeria_2024();
        let estimate = calculate_tax_liability(
            &inputs(dec!(1000.555), dec!(1000.555)),
            Some(&settings(BusinessType::Company)),
            &policy,
        );
        let l = estimate.liability;
        assert_eq!(l.income_tax, dec!(300.17));
        assert_eq!(l.education_tax, dec!(30.02));
        assert_eq!(l.total_tax, l.income_tax + l.education_tax + l.it_levy);
        assert!(l.income_tax >= Decimal::ZERO && l.it_levy >= Decimal::ZERO);
    }

    #[test]
    fn identical_inputs_give_identical_estimates() {
        let policy = TaxPolicy::nigeria_2024();
        let s = settings(BusinessType::Individual);
        let i = inputs(dec!(7250000), dec!(6100000));
        let first = calculate_tax_liability(&i, Some(&s), &policy);
        let second = calculate_tax_liability(&i, Some(&s), &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn vat_nets_collected_against_paid() {
        let vat = calculate_vat_liability(dec!(7500), dec!(2500));
        assert_eq!(vat.net_vat_liability, dec!(5000));
        assert!(!vat.is_refund());

        let refund = calculate_vat_liability(dec!(1000), dec!(4000.50));
        assert_eq!(refund.net_vat_liability, dec!(-3000.50));
        assert!(refund.is_refund());

        for (collected, paid) in [(dec!(0), dec!(0)), (dec!(0), dec!(12)), (dec!(99.99), dec!(0.01))] {
            let vat = calculate_vat_liability(collected, paid);
            assert_eq!(vat.net_vat_liability, collected - paid);
        }
    }

    #[test]
    fn liability_total_overflow_is_not_computable() {
        let mut policy = TaxPolicy::nigeria_2024();
        policy.company_rate = Decimal::ONE;
        policy.education_tax.rate = Decimal::ONE;
        let estimate = calculate_tax_liability(
            &inputs(dec!(100000000), Decimal::MAX),
            Some(&settings(BusinessType::Company)),
            &policy,
        );
        assert_eq!(
            estimate.status,
            EstimateStatus::NotComputable {
                reason: "amounts overflow".to_string()
            }
        );
        assert_eq!(estimate.liability, TaxLiability::default());
    }
}
