//! Aggregation tests.

use commission_core::{
    calculation::{CalculationStatus, CommissionCalculation},
    calculator::{calculate, CalculationRequest},
    rate_registry::RateRegistry,
    stats::{aggregate, CommissionStats},
    types::ItemIdentifiers,
};

fn results(inputs: &[(&str, f64)]) -> Vec<CommissionCalculation> {
    let registry = RateRegistry::builtin();
    inputs
        .iter()
        .map(|(carrier, premium)| calculate(&registry, &CalculationRequest::new(carrier, *premium)))
        .collect()
}

#[test]
fn empty_input_yields_zeroed_stats() {
    let stats = aggregate(&[]);
    assert_eq!(stats, CommissionStats::default());
    assert_eq!(stats.success_rate, 0.0);
    assert!(stats.by_carrier.is_empty());
}

#[test]
fn totals_use_net_amounts_of_calculated_results() {
    let rs = results(&[("SPVIE", 100.0), ("SPVIE", 200.0), ("APRIL", 100.0)]);
    let stats = aggregate(&rs);

    // SPVIE: 40 + 80 monthly; APRIL: 30 monthly.
    assert!((stats.total_monthly_commissions - 150.0).abs() < 1e-9);
    // Net year one: SPVIE 420 + 840, APRIL 1200 * 0.30 * 0.875 = 315.
    assert!((stats.total_annual_commissions - 1575.0).abs() < 1e-9);
    // Net recurring: SPVIE 105 + 210, APRIL 1200 * 0.10 * 0.875 = 105.
    assert!((stats.total_recurring_commissions - 420.0).abs() < 1e-9);
}

#[test]
fn per_carrier_breakdown_merges_spellings() {
    let rs = results(&[("SPVIE", 100.0), ("spvie ", 200.0), ("APRIL", 100.0)]);
    let stats = aggregate(&rs);

    assert_eq!(stats.by_carrier.len(), 2);
    let spvie = &stats.by_carrier["SPVIE"];
    assert_eq!(spvie.count, 2);
    assert!((spvie.total_commission - 1260.0).abs() < 1e-9);
    assert!((spvie.average_commission - 630.0).abs() < 1e-9);
}

#[test]
fn success_rate_counts_errors_in_the_denominator() {
    let rs = results(&[
        ("SPVIE", 100.0),
        ("SPVIE", -1.0),
        ("UNKNOWN_CARRIER", 100.0),
        ("APRIL", 50.0),
    ]);
    let stats = aggregate(&rs);

    assert_eq!(stats.total_count, 4);
    assert_eq!(stats.calculated_count, 2);
    assert_eq!(stats.error_count, 2);
    assert_eq!(stats.success_rate, 50.0);
    assert!(!stats.by_carrier.contains_key("UNKNOWN_CARRIER"));
}

#[test]
fn all_errors_gives_zero_success_without_carrier_entries() {
    let failed = CommissionCalculation::failed("SPVIE", &ItemIdentifiers::default(), "timeout");
    let stats = aggregate(&[failed.clone(), failed]);
    assert_eq!(stats.success_rate, 0.0);
    assert_eq!(stats.error_count, 2);
    assert!(stats.by_carrier.is_empty());
}

#[test]
fn pending_results_count_only_in_the_total() {
    let mut pending = results(&[("SPVIE", 100.0)]).remove(0);
    pending.status = CalculationStatus::Pending;
    let stats = aggregate(&[pending]);
    assert_eq!(stats.total_count, 1);
    assert_eq!(stats.calculated_count, 0);
    assert_eq!(stats.error_count, 0);
    assert_eq!(stats.total_annual_commissions, 0.0);
}

#[test]
fn aggregate_is_pure() {
    let rs = results(&[("SPVIE", 12.5), ("ZENIOO", 99.0), ("AXA", 10.0), ("NEOLIANE", 300.0)]);
    assert_eq!(aggregate(&rs), aggregate(&rs));
}
