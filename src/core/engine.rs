use super::amortization::compute_emi;
use super::error::{ConfigError, ValidationError};
use super::format::format_inr;
use super::types::{
    ComparisonResult, FormattedComparison, MAX_TENURE_YEARS, PurchaseInputs, RateConfig,
};

/// Compares both financing paths using the default rates.
pub fn compare(inputs: &PurchaseInputs) -> Result<ComparisonResult, ValidationError> {
    compare_with(inputs, &RateConfig::default())
}

/// Compares financing the ex-showroom price against financing the on-road
/// price for the same tenure and downpayment.
///
/// The ex-showroom path is credited with a residual value at the end of the
/// term. The on-road path carries insurance for every year after the first,
/// since the first year is bundled into the on-road price.
pub fn compare_with(
    inputs: &PurchaseInputs,
    rates: &RateConfig,
) -> Result<ComparisonResult, ValidationError> {
    validate_inputs(inputs)?;

    let tenure = inputs.tenure_years;
    let months = f64::from(tenure) * 12.0;

    let net_ex_showroom = inputs.ex_showroom_price - inputs.downpayment;
    let net_on_road = inputs.on_road_price - inputs.downpayment;

    let emi_ex_showroom = compute_emi(net_ex_showroom, rates.ex_showroom_rate_percent, tenure);
    let emi_on_road = compute_emi(net_on_road, rates.on_road_rate_percent, tenure);

    let residual_value_ex_showroom = net_ex_showroom * rates.residual_value_fraction;
    let total_insurance_cost = inputs.annual_insurance * f64::from(tenure - 1);

    let total_cost_ex_showroom =
        emi_ex_showroom * months + inputs.downpayment + residual_value_ex_showroom;
    let total_cost_on_road = emi_on_road * months + inputs.downpayment + total_insurance_cost;

    Ok(ComparisonResult {
        net_ex_showroom,
        net_on_road,
        emi_ex_showroom,
        residual_value_ex_showroom,
        total_cost_ex_showroom,
        emi_on_road,
        total_insurance_cost,
        total_cost_on_road,
        savings: total_cost_on_road - total_cost_ex_showroom,
    })
}

pub fn validate_inputs(inputs: &PurchaseInputs) -> Result<(), ValidationError> {
    if !inputs.ex_showroom_price.is_finite() || inputs.ex_showroom_price <= 0.0 {
        return Err(ValidationError::ExShowroomPrice);
    }

    if !inputs.on_road_price.is_finite() || inputs.on_road_price <= 0.0 {
        return Err(ValidationError::OnRoadPrice);
    }

    if inputs.tenure_years == 0 || inputs.tenure_years > MAX_TENURE_YEARS {
        return Err(ValidationError::TenureYears);
    }

    if !inputs.downpayment.is_finite() || inputs.downpayment < 0.0 {
        return Err(ValidationError::Downpayment);
    }

    if inputs.downpayment >= inputs.ex_showroom_price {
        return Err(ValidationError::DownpaymentCoversExShowroom);
    }

    if inputs.downpayment >= inputs.on_road_price {
        return Err(ValidationError::DownpaymentCoversOnRoad);
    }

    if !inputs.annual_insurance.is_finite() || inputs.annual_insurance < 0.0 {
        return Err(ValidationError::AnnualInsurance);
    }

    Ok(())
}

pub fn validate_rates(rates: &RateConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("ex-showroom rate", rates.ex_showroom_rate_percent),
        ("on-road rate", rates.on_road_rate_percent),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Rate { name, value });
        }
    }

    if !(0.0..=1.0).contains(&rates.residual_value_fraction) {
        return Err(ConfigError::ResidualValue(
            rates.residual_value_fraction * 100.0,
        ));
    }

    Ok(())
}

pub fn format_comparison(result: &ComparisonResult, tenure_years: u32) -> FormattedComparison {
    FormattedComparison {
        emi_ex_showroom: format_inr(result.emi_ex_showroom),
        residual_value_ex_showroom: format_inr(result.residual_value_ex_showroom),
        total_cost_ex_showroom: format_inr(result.total_cost_ex_showroom),
        emi_on_road: format_inr(result.emi_on_road),
        insurance_label: format!("Years 2-{tenure_years}"),
        total_insurance_cost: format_inr(result.total_insurance_cost),
        total_cost_on_road: format_inr(result.total_cost_on_road),
        savings: format_inr(result.savings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> PurchaseInputs {
        PurchaseInputs {
            ex_showroom_price: 1_000_000.0,
            on_road_price: 1_150_000.0,
            tenure_years: 5,
            downpayment: 200_000.0,
            annual_insurance: 15_000.0,
        }
    }

    #[test]
    fn sample_scenario_follows_cost_formulas() {
        let inputs = sample_inputs();
        let result = compare(&inputs).expect("valid inputs");

        assert_approx(result.net_ex_showroom, 800_000.0);
        assert_approx(result.net_on_road, 950_000.0);
        assert_eq!(result.emi_ex_showroom, compute_emi(800_000.0, 9.5, 5));
        assert_eq!(result.emi_on_road, compute_emi(950_000.0, 8.5, 5));
        assert_approx(result.residual_value_ex_showroom, 160_000.0);
        assert_approx(result.total_insurance_cost, 60_000.0);

        let expected_ex = result.emi_ex_showroom * 60.0 + 200_000.0 + 160_000.0;
        let expected_on = result.emi_on_road * 60.0 + 200_000.0 + 60_000.0;
        assert_approx(result.total_cost_ex_showroom, expected_ex);
        assert_approx(result.total_cost_on_road, expected_on);
        assert_approx(result.savings, expected_on - expected_ex);
        assert!((result.savings - 61_352.94).abs() < 0.01);
    }

    #[test]
    fn equal_rates_reproduce_single_rate_variant() {
        let rates = RateConfig {
            on_road_rate_percent: 9.5,
            ..RateConfig::default()
        };
        let result = compare_with(&sample_inputs(), &rates).expect("valid inputs");
        assert_eq!(result.emi_on_road, compute_emi(950_000.0, 9.5, 5));
    }

    #[test]
    fn single_year_tenure_has_no_insurance_cost() {
        let mut inputs = sample_inputs();
        inputs.tenure_years = 1;
        let result = compare(&inputs).expect("valid inputs");
        assert_eq!(result.total_insurance_cost, 0.0);
    }

    #[test]
    fn zero_downpayment_finances_full_prices() {
        let mut inputs = sample_inputs();
        inputs.downpayment = 0.0;
        let result = compare(&inputs).expect("valid inputs");
        assert_approx(result.net_ex_showroom, 1_000_000.0);
        assert_approx(result.net_on_road, 1_150_000.0);
    }

    #[test]
    fn long_tenures_and_tiny_rates_produce_finite_amounts() {
        let mut inputs = sample_inputs();
        inputs.tenure_years = 10_000;
        let result = compare(&inputs).expect("valid inputs");
        assert!(result.emi_ex_showroom.is_finite() && result.emi_ex_showroom > 0.0);
        assert!(result.emi_on_road.is_finite() && result.emi_on_road > 0.0);
        assert!(result.savings.is_finite());

        let rates = RateConfig {
            ex_showroom_rate_percent: 1e-13,
            on_road_rate_percent: 1e-13,
            ..RateConfig::default()
        };
        assert_eq!(validate_rates(&rates), Ok(()));
        let result = compare_with(&sample_inputs(), &rates).expect("valid inputs");
        assert!((result.emi_ex_showroom - 800_000.0 / 60.0).abs() < 1e-6);
        assert!((result.emi_on_road - 950_000.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let cases = [
            (
                PurchaseInputs {
                    ex_showroom_price: 0.0,
                    ..sample_inputs()
                },
                ValidationError::ExShowroomPrice,
            ),
            (
                PurchaseInputs {
                    on_road_price: -100.0,
                    ..sample_inputs()
                },
                ValidationError::OnRoadPrice,
            ),
            (
                PurchaseInputs {
                    tenure_years: 0,
                    ..sample_inputs()
                },
                ValidationError::TenureYears,
            ),
            (
                PurchaseInputs {
                    downpayment: 1_000_000.0,
                    ..sample_inputs()
                },
                ValidationError::DownpaymentCoversExShowroom,
            ),
            (
                PurchaseInputs {
                    downpayment: -1.0,
                    ..sample_inputs()
                },
                ValidationError::Downpayment,
            ),
            (
                PurchaseInputs {
                    annual_insurance: -5.0,
                    ..sample_inputs()
                },
                ValidationError::AnnualInsurance,
            ),
            (
                PurchaseInputs {
                    ex_showroom_price: f64::NAN,
                    ..sample_inputs()
                },
                ValidationError::ExShowroomPrice,
            ),
        ];

        for (inputs, expected) in cases {
            assert_eq!(compare(&inputs), Err(expected), "inputs: {inputs:?}");
        }
    }

    #[test]
    fn downpayment_must_stay_below_on_road_price() {
        // On-road cheaper than ex-showroom is unusual but must still be guarded.
        let inputs = PurchaseInputs {
            ex_showroom_price: 500_000.0,
            on_road_price: 400_000.0,
            downpayment: 400_000.0,
            ..sample_inputs()
        };
        assert_eq!(
            compare(&inputs),
            Err(ValidationError::DownpaymentCoversOnRoad)
        );
    }

    #[test]
    fn downpayment_boundary_one_unit_below_is_accepted() {
        let inputs = PurchaseInputs {
            ex_showroom_price: 1_000_000.0,
            on_road_price: 1_000_000.0,
            downpayment: 999_999.0,
            ..sample_inputs()
        };
        let result = compare(&inputs).expect("one unit financed");
        assert_approx(result.net_ex_showroom, 1.0);
        assert_approx(result.net_on_road, 1.0);

        let at_price = PurchaseInputs {
            downpayment: 1_000_000.0,
            ..inputs
        };
        assert!(compare(&at_price).is_err());
    }

    #[test]
    fn validate_rates_rejects_out_of_range_values() {
        assert!(validate_rates(&RateConfig::default()).is_ok());
        assert!(matches!(
            validate_rates(&RateConfig {
                ex_showroom_rate_percent: -1.0,
                ..RateConfig::default()
            }),
            Err(ConfigError::Rate { .. })
        ));
        assert!(matches!(
            validate_rates(&RateConfig {
                on_road_rate_percent: f64::INFINITY,
                ..RateConfig::default()
            }),
            Err(ConfigError::Rate { .. })
        ));
        assert_eq!(
            validate_rates(&RateConfig {
                residual_value_fraction: 1.5,
                ..RateConfig::default()
            }),
            Err(ConfigError::ResidualValue(150.0))
        );
    }

    #[test]
    fn format_comparison_renders_each_amount() {
        let result = compare(&sample_inputs()).expect("valid inputs");
        let formatted = format_comparison(&result, 5);
        assert_eq!(formatted.residual_value_ex_showroom, "₹1,60,000");
        assert_eq!(formatted.total_insurance_cost, "₹60,000");
        assert_eq!(formatted.emi_ex_showroom, "₹16,801");
        assert_eq!(formatted.emi_on_road, "₹19,491");
        assert_eq!(formatted.savings, "₹61,353");
        assert_eq!(formatted.insurance_label, "Years 2-5");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_compare_is_deterministic_and_consistent(
            ex_showroom in 100_000u32..5_000_000,
            on_road_extra in 0u32..800_000,
            tenure in 1u32..10,
            downpayment_pct in 0u32..95,
            insurance in 0u32..60_000
        ) {
            let ex_showroom = f64::from(ex_showroom);
            let inputs = PurchaseInputs {
                ex_showroom_price: ex_showroom,
                on_road_price: ex_showroom + f64::from(on_road_extra),
                tenure_years: tenure,
                downpayment: ex_showroom * f64::from(downpayment_pct) / 100.0,
                annual_insurance: f64::from(insurance),
            };

            let first = compare(&inputs).expect("generated inputs are valid");
            let second = compare(&inputs).expect("generated inputs are valid");
            prop_assert_eq!(first.savings.to_bits(), second.savings.to_bits());
            prop_assert_eq!(first, second);

            prop_assert!(first.emi_ex_showroom.is_finite() && first.emi_ex_showroom > 0.0);
            prop_assert!(first.emi_on_road.is_finite() && first.emi_on_road > 0.0);
            prop_assert!(first.total_cost_ex_showroom > inputs.downpayment);
            prop_assert!(first.total_cost_on_road > inputs.downpayment);
            prop_assert_eq!(
                first.savings,
                first.total_cost_on_road - first.total_cost_ex_showroom
            );
        }
    }
}
