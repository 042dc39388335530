mod amortization;
mod engine;
mod error;
mod format;
mod types;

pub use amortization::compute_emi;
pub use engine::{compare, compare_with, format_comparison, validate_inputs, validate_rates};
pub use error::{ConfigError, INVALID_INPUT_MESSAGE, ValidationError};
pub use format::format_inr;
pub use types::{
    ComparisonResult, FormattedComparison, LoanTerms, MAX_TENURE_YEARS, PurchaseDraft,
    PurchaseInputs, RATE_EX_SHOWROOM, RATE_ON_ROAD, RESIDUAL_VALUE_FRACTION, RateConfig,
};
