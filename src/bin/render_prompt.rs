//! Prints the exact instruction sent to the generative model for one profile.
//!
//! Usage:
//!   render-prompt --amount 10000 --return 12 --risk medium \
//!     --period oneToFiveYears --assets "Equity, Debt" [--count 3]
//!
//! `FUND_CATALOG_PATH` selects a catalog file instead of the embedded one.

use anyhow::{anyhow, bail, Context};
use dotenvy::dotenv;
use fund_forecaster::catalog::FundCatalog;
use fund_forecaster::errors::AppError;
use fund_forecaster::profile::{self, RawProfile};
use fund_forecaster::prompt::PromptTemplate;
use serde_json::Value;
use std::path::PathBuf;

fn parse_args() -> anyhow::Result<(RawProfile, u8)> {
    let mut raw = RawProfile::default();
    let mut count: u8 = 3;

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| anyhow!("missing value for {}", flag))?;
        match flag.as_str() {
            "--amount" => raw.investment_amount = Some(Value::String(value)),
            "--return" => raw.expected_return = Some(Value::String(value)),
            "--risk" => raw.risk_tolerance = Some(Value::String(value)),
            "--period" => raw.investment_period = Some(Value::String(value)),
            "--assets" => raw.asset_allocation_preferences = Some(Value::String(value)),
            "--count" => {
                count = value
                    .parse()
                    .with_context(|| format!("--count must be a number, got '{}'", value))?;
                if !(1..=5).contains(&count) {
                    bail!("--count must be between 1 and 5");
                }
            }
            other => bail!("unknown flag {}", other),
        }
    }

    Ok((raw, count))
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let (raw, count) = parse_args()?;
    let profile = match profile::validate(&raw) {
        Ok(profile) => profile,
        Err(AppError::Validation(errors)) => {
            for error in &errors {
                eprintln!("{}: {}", error.field, error.message);
            }
            bail!("invalid profile");
        }
        Err(e) => return Err(anyhow!("{}", e)),
    };

    let catalog_path = std::env::var("FUND_CATALOG_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let today = chrono::Utc::now().date_naive();
    let catalog = FundCatalog::load(catalog_path.as_deref(), today)?;

    let template = PromptTemplate::new(&catalog, count);
    println!("# catalog fingerprint: {}", template.fingerprint());
    println!("# funds: {}", catalog.len());
    println!();
    print!("{}", template.render(&profile));

    Ok(())
}
