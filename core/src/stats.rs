//! Portfolio statistics over a set of calculation results.
//!
//! Stats are a view: always recomputed from the full result set,
//! never patched field by field.

use crate::{
    calculation::{CalculationStatus, CommissionCalculation},
    rate_registry::normalize_carrier,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarrierStats {
    pub count:              usize,
    /// Sum of first-year commission net of retention.
    pub total_commission:   f64,
    pub average_commission: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommissionStats {
    pub total_monthly_commissions:   f64,
    pub total_annual_commissions:    f64,
    pub total_recurring_commissions: f64,
    /// Keyed by normalized carrier name; only `calculated` results count.
    pub by_carrier:       BTreeMap<String, CarrierStats>,
    pub total_count:      usize,
    pub calculated_count: usize,
    pub error_count:      usize,
    /// Percentage of results with `calculated` status; 0 when empty.
    pub success_rate:     f64,
}

pub fn aggregate(results: &[CommissionCalculation]) -> CommissionStats {
    let mut stats = CommissionStats {
        total_count: results.len(),
        ..Default::default()
    };

    for r in results {
        if !r.is_calculated() {
            if r.status == CalculationStatus::Error {
                stats.error_count += 1;
            }
            continue;
        }
        stats.calculated_count += 1;
        stats.total_monthly_commissions += r.monthly_commission;
        stats.total_annual_commissions += r.annual_commission_net;
        stats.total_recurring_commissions += r.recurring_commission_net;

        let entry = stats
            .by_carrier
            .entry(normalize_carrier(&r.carrier_name))
            .or_default();
        entry.count += 1;
        entry.total_commission += r.annual_commission_net;
    }

    for carrier in stats.by_carrier.values_mut() {
        carrier.average_commission = carrier.total_commission / carrier.count as f64;
    }

    stats.success_rate = if results.is_empty() {
        0.0
    } else {
        stats.calculated_count as f64 / results.len() as f64 * 100.0
    };

    stats
}
