//! Demo portfolio generator.
//!
//! Produces a reproducible set of projects and contracts for the runner
//! and for tests. A share of contracts is deliberately malformed (form
//! text premiums, out-of-range amounts, retired carriers) so a run shows
//! isolated failures in its statistics.

use crate::{
    calculator::PremiumInput,
    error::CommissionResult,
    gateway::{ContractRecord, ProjectRecord},
    rate_registry::RateRegistry,
    rng::DemoRng,
    store::CommissionStore,
};

#[derive(Debug, Clone, Default)]
pub struct DemoPortfolio {
    pub projects:  Vec<ProjectRecord>,
    pub contracts: Vec<ContractRecord>,
}

/// Share of contracts given a malformed premium or an unusable carrier.
const MALFORMED_SHARE: f64 = 0.08;

pub fn generate_portfolio(seed: u64, project_count: usize, registry: &RateRegistry) -> DemoPortfolio {
    let mut rng = DemoRng::new(seed);
    let carriers: Vec<String> = registry
        .list_active()
        .into_iter()
        .map(|c| c.carrier.clone())
        .collect();

    let mut portfolio = DemoPortfolio::default();
    for p in 0..project_count {
        let project = ProjectRecord {
            id:         format!("prj-{seed}-{p:04}"),
            contact_id: Some(format!("ct-{seed}-{p:04}")),
        };

        let contract_count = 1 + rng.next_u64_below(3);
        for c in 0..contract_count {
            let (carrier_name, monthly_premium) = if rng.chance(MALFORMED_SHARE) {
                malformed_contract(&mut rng, &carriers)
            } else {
                let carrier = rng.pick(&carriers).cloned().unwrap_or_default();
                (display_name(&carrier), plausible_premium(&mut rng))
            };
            portfolio.contracts.push(ContractRecord {
                id:         format!("{}-k{c}", project.id),
                project_id: Some(project.id.clone()),
                carrier_name,
                monthly_premium,
            });
        }
        portfolio.projects.push(project);
    }
    portfolio
}

/// Mixed case, as a sales form would store it.
fn display_name(carrier: &str) -> String {
    let mut chars = carrier.chars();
    match chars.next() {
        Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn plausible_premium(rng: &mut DemoRng) -> PremiumInput {
    let amount = (rng.range_f64(25.0, 350.0) * 100.0).round() / 100.0;
    if rng.chance(0.3) {
        PremiumInput::Text(format!("{} €", amount.to_string().replace('.', ",")))
    } else {
        PremiumInput::Amount(amount)
    }
}

fn malformed_contract(rng: &mut DemoRng, carriers: &[String]) -> (String, PremiumInput) {
    let carrier = rng.pick(carriers).cloned().unwrap_or_default();
    match rng.next_u64_below(4) {
        0 => (carrier, PremiumInput::Text("N/C".into())),
        1 => (carrier, PremiumInput::Amount(25_000.0)),
        2 => (carrier, PremiumInput::Amount(-12.5)),
        _ => ("Retired Mutual".into(), PremiumInput::Amount(80.0)),
    }
}

/// Insert a generated portfolio into the store.
pub fn seed_store(store: &CommissionStore, portfolio: &DemoPortfolio) -> CommissionResult<()> {
    for project in &portfolio.projects {
        store.insert_project(project)?;
    }
    for contract in &portfolio.contracts {
        store.insert_contract(contract)?;
    }
    log::info!(
        "demo: seeded {} projects, {} contracts",
        portfolio.projects.len(),
        portfolio.contracts.len()
    );
    Ok(())
}
