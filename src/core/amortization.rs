/// Fixed monthly installment that amortizes `principal` over `term_years`.
///
/// A zero rate falls back to straight-line repayment. Inputs are assumed
/// valid (positive principal and term, non-negative rate).
///
/// Evaluated as `P·r / (1 - (1+r)^-n)` through `ln_1p`/`exp_m1`, so rates too
/// small to move `1 + r` and terms long enough to overflow `(1+r)^n` stay
/// finite.
pub fn compute_emi(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    let months = f64::from(term_years) * 12.0;
    let monthly_rate = annual_rate_percent / 12.0 / 100.0;
    if monthly_rate == 0.0 {
        return principal / months;
    }

    let discount = -(-months * monthly_rate.ln_1p()).exp_m1();
    principal * monthly_rate / discount
}
