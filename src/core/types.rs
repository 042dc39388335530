use serde::{Deserialize, Serialize};

use super::amortization::compute_emi;
use super::error::ValidationError;

pub const RATE_EX_SHOWROOM: f64 = 9.5;
pub const RATE_ON_ROAD: f64 = 8.5;
pub const RESIDUAL_VALUE_FRACTION: f64 = 0.20;

// Keeps `tenure_years * 12` inside u32.
pub const MAX_TENURE_YEARS: u32 = u32::MAX / 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
}

impl LoanTerms {
    pub fn months(&self) -> u32 {
        self.term_years * 12
    }

    pub fn emi(&self) -> f64 {
        compute_emi(self.principal, self.annual_rate_percent, self.term_years)
    }

    pub fn total_payable(&self) -> f64 {
        self.emi() * f64::from(self.months())
    }

    pub fn total_interest(&self) -> f64 {
        self.total_payable() - self.principal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInputs {
    pub ex_showroom_price: f64,
    pub on_road_price: f64,
    pub tenure_years: u32,
    pub downpayment: f64,
    pub annual_insurance: f64,
}

/// Loosely-typed purchase fields as they arrive from a form, query string or
/// price lookup. Missing downpayment and insurance count as zero; tenure may
/// arrive fractional and is rejected unless it is a whole number of years.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PurchaseDraft {
    pub ex_showroom_price: Option<f64>,
    pub on_road_price: Option<f64>,
    pub tenure_years: Option<f64>,
    pub downpayment: Option<f64>,
    pub annual_insurance: Option<f64>,
}

impl PurchaseDraft {
    pub fn into_inputs(self) -> Result<PurchaseInputs, ValidationError> {
        let ex_showroom_price = self
            .ex_showroom_price
            .ok_or(ValidationError::ExShowroomPrice)?;
        let on_road_price = self.on_road_price.ok_or(ValidationError::OnRoadPrice)?;
        let tenure = self.tenure_years.ok_or(ValidationError::TenureYears)?;
        if !tenure.is_finite()
            || tenure.fract() != 0.0
            || tenure <= 0.0
            || tenure > f64::from(MAX_TENURE_YEARS)
        {
            return Err(ValidationError::TenureYears);
        }

        Ok(PurchaseInputs {
            ex_showroom_price,
            on_road_price,
            tenure_years: tenure as u32,
            downpayment: self.downpayment.unwrap_or(0.0),
            annual_insurance: self.annual_insurance.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateConfig {
    pub ex_showroom_rate_percent: f64,
    pub on_road_rate_percent: f64,
    pub residual_value_fraction: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            ex_showroom_rate_percent: RATE_EX_SHOWROOM,
            on_road_rate_percent: RATE_ON_ROAD,
            residual_value_fraction: RESIDUAL_VALUE_FRACTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub net_ex_showroom: f64,
    pub net_on_road: f64,
    pub emi_ex_showroom: f64,
    pub residual_value_ex_showroom: f64,
    pub total_cost_ex_showroom: f64,
    pub emi_on_road: f64,
    pub total_insurance_cost: f64,
    pub total_cost_on_road: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedComparison {
    pub emi_ex_showroom: String,
    pub residual_value_ex_showroom: String,
    pub total_cost_ex_showroom: String,
    pub emi_on_road: String,
    pub insurance_label: String,
    pub total_insurance_cost: String,
    pub total_cost_on_road: String,
    pub savings: String,
}
