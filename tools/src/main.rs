//! commission-runner: headless driver for the commission engine.
//!
//! Usage:
//!   commission-runner --db book.db --data-dir ./data
//!   commission-runner --demo 200 --seed 7 --batch-size 25
//!   commission-runner --db book.db --project prj-1 --project prj-2
//!   commission-runner --what-if SPVIE "89,90 €"

use anyhow::Result;
use commission_core::{
    calculation::CommissionCalculation,
    config::DataDir,
    demo::{generate_portfolio, seed_store},
    engine::{CalculateAllOptions, CommissionEngine},
    stats::CommissionStats,
    store::CommissionStore,
};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let seed = parse_arg(&args, "--seed", 42u64);
    let demo = parse_arg(&args, "--demo", 0usize);
    let json = args.iter().any(|a| a == "--json");
    let projects: Vec<String> = args
        .windows(2)
        .filter(|w| w[0] == "--project")
        .map(|w| w[1].clone())
        .collect();

    let data = DataDir::load(data_dir)?;

    if let Some(pos) = args.iter().position(|a| a == "--what-if") {
        let carrier = args.get(pos + 1).map(String::as_str).unwrap_or_default();
        let premium = args.get(pos + 2).cloned().unwrap_or_default();
        let store = CommissionStore::in_memory()?;
        let engine = CommissionEngine::new(data.registry, Arc::new(store), data.engine);
        let result = engine.calculate_one(carrier, premium);
        print_what_if(&result, json)?;
        return Ok(());
    }

    let store = CommissionStore::open(db)?;
    store.migrate()?;

    if store.load_rate_registry()?.is_empty() {
        store.seed_carrier_configs(&data.registry)?;
    }
    let registry = store.load_rate_registry()?;

    if demo > 0 {
        let portfolio = generate_portfolio(seed, demo, &registry);
        seed_store(&store, &portfolio)?;
    }

    let mut config = data.engine;
    if let Some(size) = flag_value(&args, "--batch-size").and_then(|v| v.parse().ok()) {
        config.default_batch_size = size;
    }

    let store = Arc::new(store);
    let engine = CommissionEngine::new(registry, store.clone(), config);

    if !json {
        println!("commission-runner");
        println!("  db:         {db}");
        println!("  data_dir:   {data_dir}");
        println!("  batch size: {}", engine.config().default_batch_size);
        println!("  carriers:   {}", engine.list_configs().len());
        println!();
    }

    let results = if projects.is_empty() {
        let options = CalculateAllOptions {
            on_progress: Some(Box::new(move |done: usize, total: usize| {
                if !json {
                    println!("  progress: {done}/{total}");
                }
            })),
            ..Default::default()
        };
        engine.calculate_all(options).await?
    } else {
        let report = engine.calculate_for_projects(&projects).await?;
        for (project_id, reason) in &report.failed_projects {
            log::warn!("project {project_id} failed: {reason}");
        }
        report.results
    };

    engine.persist(&results).await?;
    let stats = engine.get_stats(&results);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats, store.calculation_count()?);
    }
    Ok(())
}

fn print_what_if(result: &CommissionCalculation, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("=== WHAT-IF ===");
    println!("  carrier:            {}", result.carrier_name);
    println!("  status:             {}", result.status.as_str());
    for e in &result.errors {
        println!("  error:              {e}");
    }
    println!("  monthly premium:    {:.2}", result.monthly_premium);
    println!("  annual premium:     {:.2}", result.annual_premium);
    println!("  monthly commission: {:.2}", result.monthly_commission);
    println!("  year 1 (gross/net): {:.2} / {:.2}", result.annual_commission, result.annual_commission_net);
    println!("  recurring (g/n):    {:.2} / {:.2}", result.recurring_commission, result.recurring_commission_net);
    Ok(())
}

fn print_summary(stats: &CommissionStats, stored: i64) {
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  results:        {}", stats.total_count);
    println!("  calculated:     {}", stats.calculated_count);
    println!("  errors:         {}", stats.error_count);
    println!("  success rate:   {:.1}%", stats.success_rate);
    println!("  stored rows:    {stored}");
    println!("  monthly total:  {:.2}", stats.total_monthly_commissions);
    println!("  year 1 net:     {:.2}", stats.total_annual_commissions);
    println!("  recurring net:  {:.2}", stats.total_recurring_commissions);

    println!();
    println!("=== BY CARRIER ===");
    if stats.by_carrier.is_empty() {
        println!("  (No calculated contracts)");
    }
    for (carrier, c) in &stats.by_carrier {
        println!(
            "  {carrier:<20} | {:>4} contracts | total {:>10.2} | avg {:>8.2}",
            c.count, c.total_commission, c.average_commission
        );
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
