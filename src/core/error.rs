use thiserror::Error;

/// Message shown to a person when any purchase field is rejected.
pub const INVALID_INPUT_MESSAGE: &str =
    "Please enter valid values. Downpayment must be less than both prices.";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ValidationError {
    #[error("ex-showroom price must be a positive amount")]
    ExShowroomPrice,
    #[error("on-road price must be a positive amount")]
    OnRoadPrice,
    #[error("tenure must be a whole number of years greater than zero")]
    TenureYears,
    #[error("downpayment must be zero or more")]
    Downpayment,
    #[error("downpayment must be less than the ex-showroom price")]
    DownpaymentCoversExShowroom,
    #[error("downpayment must be less than the on-road price")]
    DownpaymentCoversOnRoad,
    #[error("annual insurance must be zero or more")]
    AnnualInsurance,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a finite rate >= 0, got {value}")]
    Rate { name: &'static str, value: f64 },
    #[error("residual value must be between 0 and 100 percent, got {0}")]
    ResidualValue(f64),
}
