//! Static fund catalog and slug-based fund lookup.
//!
//! The catalog is loaded once at startup (from the embedded seed or from
//! `FUND_CATALOG_PATH`) and is never mutated afterwards. Every record is
//! addressed by its slug, which must equal `slugify(name)`.

use crate::errors::AppError;
use crate::models::{
    AllocationSlice, FundRecord, Holding, InvestmentStrategy, NavPoint, PeerComparison,
    PerformanceMetric, PortfolioChanges,
};
use anyhow::{anyhow, bail};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

const EMBEDDED_CATALOG: &str = include_str!("../data/fund_catalog.json");

/// Number of daily NAV points generated per fund.
pub const NAV_HISTORY_DAYS: i64 = 30;

fn non_alphanumeric_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"))
}

/// Converts a display name into its URL-safe slug.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single hyphen, then trims leading and trailing hyphens.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    non_alphanumeric_runs()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Seed shape of a fund: a `FundRecord` without NAV history, plus the scale
/// applied to the shared NAV curve.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundSeed {
    name: String,
    slug: String,
    aum: String,
    manager: String,
    investment_strategy: InvestmentStrategy,
    nav_scale: f64,
    holdings: Vec<Holding>,
    performance_metrics: Vec<PerformanceMetric>,
    peer_comparison: Vec<PeerComparison>,
    asset_allocation: Vec<AllocationSlice>,
    portfolio_changes: PortfolioChanges,
    strategic_positioning: String,
}

impl FundSeed {
    fn into_record(self, as_of: NaiveDate) -> FundRecord {
        FundRecord {
            nav_history: nav_history(as_of, self.nav_scale),
            name: self.name,
            slug: self.slug,
            aum: self.aum,
            manager: self.manager,
            investment_strategy: self.investment_strategy,
            holdings: self.holdings,
            performance_metrics: self.performance_metrics,
            peer_comparison: self.peer_comparison,
            asset_allocation: self.asset_allocation,
            portfolio_changes: self.portfolio_changes,
            strategic_positioning: self.strategic_positioning,
        }
    }
}

/// Daily NAV series for the `NAV_HISTORY_DAYS` days before `as_of`, oldest first.
fn nav_history(as_of: NaiveDate, scale: f64) -> Vec<NavPoint> {
    (0..NAV_HISTORY_DAYS)
        .map(|i| {
            let step = i as f64;
            let base = 100.0 + step * (step / 2.0).sin() * 5.0 + 2.5;
            NavPoint {
                date: as_of - Duration::days(NAV_HISTORY_DAYS - i),
                nav: (base * scale * 100.0).round() / 100.0,
            }
        })
        .collect()
}

/// Read-only, slug-indexed collection of fund records.
#[derive(Debug, Clone)]
pub struct FundCatalog {
    funds: Vec<FundRecord>,
    by_slug: HashMap<String, usize>,
}

impl FundCatalog {
    /// Builds a catalog from finished records, enforcing slug invariants.
    pub fn from_records(funds: Vec<FundRecord>) -> anyhow::Result<Self> {
        if funds.is_empty() {
            bail!("fund catalog is empty");
        }

        let mut by_slug = HashMap::with_capacity(funds.len());
        for (index, fund) in funds.iter().enumerate() {
            let expected = slugify(&fund.name);
            if fund.slug != expected {
                bail!(
                    "fund '{}' has slug '{}' but its name slugifies to '{}'",
                    fund.name,
                    fund.slug,
                    expected
                );
            }
            if by_slug.insert(fund.slug.clone(), index).is_some() {
                bail!("duplicate fund slug '{}'", fund.slug);
            }
        }

        Ok(Self { funds, by_slug })
    }

    /// Parses a JSON seed document, generating NAV history relative to `as_of`.
    pub fn from_json(json: &str, as_of: NaiveDate) -> anyhow::Result<Self> {
        let seeds: Vec<FundSeed> = serde_json::from_str(json)
            .map_err(|e| anyhow!("invalid fund catalog JSON: {}", e))?;
        Self::from_records(seeds.into_iter().map(|s| s.into_record(as_of)).collect())
    }

    /// The catalog compiled into the binary.
    pub fn embedded(as_of: NaiveDate) -> anyhow::Result<Self> {
        Self::from_json(EMBEDDED_CATALOG, as_of)
    }

    /// Loads the catalog from `path` when given, otherwise the embedded one.
    pub fn load(path: Option<&Path>, as_of: NaiveDate) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    anyhow!("failed to read fund catalog {}: {}", path.display(), e)
                })?;
                tracing::info!("Loading fund catalog from {}", path.display());
                Self::from_json(&json, as_of)
            }
            None => Self::embedded(as_of),
        }
    }

    pub fn funds(&self) -> &[FundRecord] {
        &self.funds
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    /// Every valid fund detail slug, in catalog order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.funds.iter().map(|fund| fund.slug.as_str())
    }

    /// Exact slug lookup.
    pub fn get(&self, slug: &str) -> Option<&FundRecord> {
        self.by_slug.get(slug).map(|&index| &self.funds[index])
    }

    /// Exact slug lookup that yields `NotFound` for unknown slugs.
    pub fn resolve(&self, slug: &str) -> Result<&FundRecord, AppError> {
        self.get(slug)
            .ok_or_else(|| AppError::NotFound(format!("Fund '{}' not found", slug)))
    }

    /// Looks a fund up by display name, tolerating case and punctuation drift.
    pub fn find_by_name(&self, name: &str) -> Option<&FundRecord> {
        self.get(&slugify(name))
    }
}
