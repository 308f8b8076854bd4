//! Rate registry tests.

use commission_core::rate_registry::{
    normalize_carrier, CommissionConfig, CommissionType, RateRegistry,
};

#[test]
fn lookup_normalizes_case_and_whitespace() {
    let registry = RateRegistry::builtin();
    let config = registry.lookup("  Spvie\t").expect("SPVIE configured");
    assert_eq!(config.carrier, "SPVIE");
    assert_eq!(config.rate_year1, 40.0);
    assert_eq!(config.rate_recurring, 10.0);
}

#[test]
fn lookup_is_exact_after_normalization() {
    let registry = RateRegistry::builtin();
    assert!(registry.lookup("SPVI").is_none());
    assert!(registry.lookup("SPVIE SANTE").is_none());
    assert!(registry.lookup("MALAKOFF HUMANIS").is_some());
    assert!(registry.lookup("MALAKOFF  HUMANIS").is_none());
}

#[test]
fn inactive_carrier_is_not_found_but_still_stored() {
    let registry = RateRegistry::builtin();
    assert!(registry.lookup("AXA").is_none());
    assert!(registry.all().any(|c| c.carrier == "AXA" && !c.active));
}

#[test]
fn list_active_is_ordered_and_excludes_inactive() {
    let registry = RateRegistry::builtin();
    let active: Vec<&str> = registry.list_active().iter().map(|c| c.carrier.as_str()).collect();

    assert!(!active.contains(&"AXA"));
    let mut sorted = active.clone();
    sorted.sort();
    assert_eq!(active, sorted);
    assert_eq!(active.len(), registry.len() - 1);
}

#[test]
fn later_duplicate_replaces_earlier() {
    let registry = RateRegistry::from_configs([
        CommissionConfig::new("acme", 10.0, 5.0, CommissionType::Linear),
        CommissionConfig::new("ACME ", 20.0, 5.0, CommissionType::Precompte),
    ]);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.lookup("acme").map(|c| c.rate_year1), Some(20.0));
}

#[test]
fn json_rate_table_matches_builtin() {
    let data_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");
    let loaded = RateRegistry::load(data_dir).expect("load rate table");
    let builtin = RateRegistry::builtin();

    assert_eq!(loaded.len(), builtin.len());
    for config in builtin.all() {
        let other = loaded.all().find(|c| c.carrier == config.carrier).expect("same carriers");
        assert_eq!(other.rate_year1, config.rate_year1, "{}", config.carrier);
        assert_eq!(other.rate_recurring, config.rate_recurring, "{}", config.carrier);
        assert_eq!(other.commission_type, config.commission_type, "{}", config.carrier);
        assert_eq!(other.active, config.active, "{}", config.carrier);
    }
}

#[test]
fn out_of_range_rates_are_rejected_at_load() {
    let json = r#"{ "carriers": [
        { "carrier": "BAD", "rate_year1": 140.0, "rate_recurring": 10.0,
          "commission_type": "linear", "active": true }
    ] }"#;
    assert!(RateRegistry::from_json(json).is_err());
}

#[test]
fn normalize_uppercases_and_trims() {
    assert_eq!(normalize_carrier("  néoliane "), "NÉOLIANE");
    assert_eq!(CommissionType::parse("Precompte"), Some(CommissionType::Precompte));
    assert_eq!(CommissionType::parse("flat"), None);
}
