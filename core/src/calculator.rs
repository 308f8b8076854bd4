//! Unit calculator: one contract's commission from premium + carrier.
//!
//! RULES:
//!   - Pure: no I/O, no shared mutable state. Safe to call from any task.
//!   - Never fails: invalid input yields an `error`-status result.
//!   - `commission_type` is copied onto the result and never branches
//!     the arithmetic.

use crate::{
    calculation::{
        new_calculation_id, CalculationMetadata, CalculationStatus, CommissionCalculation,
    },
    error::ValidationError,
    rate_registry::{CommissionConfig, RateRegistry},
    types::ItemIdentifiers,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Fraction of gross commission the broker keeps after the override.
pub const RETENTION_RATE: f64 = 0.875;

/// Sanity ceiling on a monthly premium.
pub const MAX_MONTHLY_PREMIUM: f64 = 10_000.0;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A monthly premium as it arrives from the record store or a form:
/// either a number or free text such as "1 234,50 €".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PremiumInput {
    Amount(f64),
    Text(String),
}

impl From<f64> for PremiumInput {
    fn from(v: f64) -> Self {
        Self::Amount(v)
    }
}

impl From<i64> for PremiumInput {
    fn from(v: i64) -> Self {
        Self::Amount(v as f64)
    }
}

impl From<&str> for PremiumInput {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PremiumInput {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl PremiumInput {
    /// Clean, parse and range-check. Returns the monthly premium.
    pub fn validate(&self) -> Result<f64, ValidationError> {
        let value = match self {
            Self::Amount(v) => *v,
            Self::Text(raw) => parse_premium_text(raw)?,
        };
        if !value.is_finite() {
            return Err(ValidationError::NotFinite);
        }
        if value <= 0.0 {
            return Err(ValidationError::NonPositivePremium(value));
        }
        if value > MAX_MONTHLY_PREMIUM {
            return Err(ValidationError::PremiumAboveCeiling {
                premium: value,
                ceiling: MAX_MONTHLY_PREMIUM,
            });
        }
        Ok(value)
    }
}

/// ASCII-range signs plus the Unicode currency symbols block (€, ₹, ₽ ...).
fn is_currency_symbol(c: char) -> bool {
    matches!(c, '$' | '¢' | '£' | '¤' | '¥' | '\u{20A0}'..='\u{20CF}')
}

/// Drop a three-letter code ("EUR", "chf") glued to either end.
fn strip_currency_code(s: &str) -> &str {
    let is_code = |b: &[u8]| b.len() == 3 && b.iter().all(u8::is_ascii_alphabetic);

    let bytes = s.as_bytes();
    let s = if bytes.len() > 3 && is_code(&bytes[..3]) && !bytes[3].is_ascii_alphabetic() {
        &s[3..]
    } else {
        s
    };

    let bytes = s.as_bytes();
    let n = bytes.len();
    if n > 3 && is_code(&bytes[n - 3..]) && !bytes[n - 4].is_ascii_alphabetic() {
        &s[..n - 3]
    } else {
        s
    }
}

/// Strip currency symbols, currency codes and whitespace, turn a decimal
/// comma into a dot, then parse. Only plain decimal notation is accepted.
fn parse_premium_text(raw: &str) -> Result<f64, ValidationError> {
    let unparseable = || ValidationError::UnparseablePremium(raw.to_string());

    let stripped: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !is_currency_symbol(*c))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let cleaned = strip_currency_code(&stripped);

    if !cleaned.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+')) {
        return Err(unparseable());
    }
    cleaned.parse::<f64>().map_err(|_| unparseable())
}

/// Everything one calculation needs from its caller.
#[derive(Debug, Clone)]
pub struct CalculationRequest {
    pub carrier_name:    String,
    pub monthly_premium: PremiumInput,
    pub ids:             ItemIdentifiers,
}

impl CalculationRequest {
    pub fn new(carrier_name: &str, monthly_premium: impl Into<PremiumInput>) -> Self {
        Self {
            carrier_name: carrier_name.to_string(),
            monthly_premium: monthly_premium.into(),
            ids: ItemIdentifiers::default(),
        }
    }

    pub fn with_ids(mut self, ids: ItemIdentifiers) -> Self {
        self.ids = ids;
        self
    }
}

/// Compute one contract's commission. Validation runs in order:
/// premium format, premium range, then carrier lookup.
pub fn calculate(registry: &RateRegistry, request: &CalculationRequest) -> CommissionCalculation {
    match validate(registry, request) {
        Ok((premium, config)) => build_result(request, premium, config),
        Err(reason) => {
            log::debug!("calc: {} rejected: {reason}", request.ids.label());
            CommissionCalculation::failed(&request.carrier_name, &request.ids, reason.to_string())
        }
    }
}

fn validate<'r>(
    registry: &'r RateRegistry,
    request: &CalculationRequest,
) -> Result<(f64, &'r CommissionConfig), ValidationError> {
    let premium = request.monthly_premium.validate()?;
    let config = registry
        .lookup(&request.carrier_name)
        .ok_or_else(|| ValidationError::UnknownCarrier(request.carrier_name.clone()))?;
    Ok((premium, config))
}

fn build_result(
    request: &CalculationRequest,
    monthly_premium: f64,
    config: &CommissionConfig,
) -> CommissionCalculation {
    let year1 = config.rate_year1 / 100.0;
    let recurring = config.rate_recurring / 100.0;

    let annual_premium = monthly_premium * 12.0;
    let annual_commission = annual_premium * year1;
    let recurring_commission = annual_premium * recurring;

    CommissionCalculation {
        id:          new_calculation_id(),
        project_id:  request.ids.project_id.clone(),
        contact_id:  request.ids.contact_id.clone(),
        contract_id: request.ids.contract_id.clone(),
        carrier_name: request.carrier_name.clone(),
        monthly_premium,
        annual_premium,
        monthly_commission:       monthly_premium * year1,
        annual_commission,
        annual_commission_net:    annual_commission * RETENTION_RATE,
        recurring_commission,
        recurring_commission_net: recurring_commission * RETENTION_RATE,
        commission_type: Some(config.commission_type),
        calculated_at:   Utc::now(),
        status:          CalculationStatus::Calculated,
        errors:          Vec::new(),
        metadata: Some(CalculationMetadata {
            rate_year1:     config.rate_year1,
            rate_recurring: config.rate_recurring,
            retention_rate: RETENTION_RATE,
            engine_version: ENGINE_VERSION.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_french_formatted_amounts() {
        assert_eq!(parse_premium_text("1 234,50 €"), Ok(1234.5));
        assert_eq!(parse_premium_text("$ 99.90"), Ok(99.9));
        assert_eq!(parse_premium_text("\u{a0}45,00\u{a0}€"), Ok(45.0));
    }

    #[test]
    fn rejects_garbage_text() {
        assert!(matches!(
            parse_premium_text("12abc"),
            Err(ValidationError::UnparseablePremium(_))
        ));
        assert!(parse_premium_text("").is_err());
        assert!(parse_premium_text("1.234,56").is_err());
        assert!(parse_premium_text("1e3").is_err());
        assert!(parse_premium_text("inf").is_err());
    }

    #[test]
    fn strips_any_currency_symbol_or_code() {
        assert_eq!(parse_premium_text("₹100"), Ok(100.0));
        assert_eq!(parse_premium_text("₽ 75,5"), Ok(75.5));
        assert_eq!(parse_premium_text("99¢"), Ok(99.0));
        assert_eq!(parse_premium_text("100 EUR"), Ok(100.0));
        assert_eq!(parse_premium_text("CHF 100"), Ok(100.0));
        assert_eq!(parse_premium_text("eur 12,30"), Ok(12.3));
        assert!(parse_premium_text("EUROS 100").is_err());
    }

    #[test]
    fn range_checks_run_after_parsing() {
        assert_eq!(PremiumInput::from(f64::NAN).validate(), Err(ValidationError::NotFinite));
        assert!(matches!(
            PremiumInput::from("NaN").validate(),
            Err(ValidationError::UnparseablePremium(_))
        ));
        assert_eq!(
            PremiumInput::from("0").validate(),
            Err(ValidationError::NonPositivePremium(0.0))
        );
        assert!(matches!(
            PremiumInput::from(10_000.01).validate(),
            Err(ValidationError::PremiumAboveCeiling { .. })
        ));
        assert_eq!(PremiumInput::from(10_000.0).validate(), Ok(10_000.0));
    }
}
