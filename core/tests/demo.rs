//! Demo portfolio generation must be reproducible.

use commission_core::{demo::generate_portfolio, rate_registry::RateRegistry};

#[test]
fn same_seed_produces_identical_portfolios() {
    let registry = RateRegistry::builtin();
    let a = generate_portfolio(0xC0FFEE, 50, &registry);
    let b = generate_portfolio(0xC0FFEE, 50, &registry);

    assert_eq!(a.projects, b.projects);
    assert_eq!(a.contracts, b.contracts);
}

#[test]
fn every_project_has_between_one_and_three_contracts() {
    let registry = RateRegistry::builtin();
    let portfolio = generate_portfolio(9, 40, &registry);

    assert_eq!(portfolio.projects.len(), 40);
    for project in &portfolio.projects {
        let n = portfolio
            .contracts
            .iter()
            .filter(|c| c.project_id.as_deref() == Some(project.id.as_str()))
            .count();
        assert!((1..=3).contains(&n), "project {} has {n} contracts", project.id);
    }
}

#[test]
fn generated_contracts_only_use_known_or_retired_carriers() {
    let registry = RateRegistry::builtin();
    let portfolio = generate_portfolio(21, 100, &registry);
    for c in &portfolio.contracts {
        assert!(
            registry.lookup(&c.carrier_name).is_some() || c.carrier_name == "Retired Mutual",
            "unexpected carrier {}",
            c.carrier_name
        );
    }
}
