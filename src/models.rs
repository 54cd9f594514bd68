use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============ Investor Profile ============

/// Investor risk appetite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

impl RiskTolerance {
    pub const ALL: [RiskTolerance; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Low => "low",
            RiskTolerance::Medium => "medium",
            RiskTolerance::High => "high",
        }
    }
}

impl FromStr for RiskTolerance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown risk tolerance '{}'", s))
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Investment horizon bucket.
///
/// Serialized with the camelCase names the generation prompt expects; the
/// hyphenated spellings are accepted as aliases on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentPeriod {
    #[serde(rename = "lessThanOneYear", alias = "under-1-year")]
    LessThanOneYear,
    #[serde(rename = "oneToFiveYears", alias = "1-to-5-years")]
    OneToFiveYears,
    #[serde(rename = "moreThanFiveYears", alias = "over-5-years")]
    MoreThanFiveYears,
}

impl InvestmentPeriod {
    pub const ALL: [InvestmentPeriod; 3] = [
        Self::LessThanOneYear,
        Self::OneToFiveYears,
        Self::MoreThanFiveYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentPeriod::LessThanOneYear => "lessThanOneYear",
            InvestmentPeriod::OneToFiveYears => "oneToFiveYears",
            InvestmentPeriod::MoreThanFiveYears => "moreThanFiveYears",
        }
    }

    fn alias(&self) -> &'static str {
        match self {
            InvestmentPeriod::LessThanOneYear => "under-1-year",
            InvestmentPeriod::OneToFiveYears => "1-to-5-years",
            InvestmentPeriod::MoreThanFiveYears => "over-5-years",
        }
    }
}

impl FromStr for InvestmentPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|period| period.as_str() == s || period.alias() == s)
            .ok_or_else(|| format!("unknown investment period '{}'", s))
    }
}

impl fmt::Display for InvestmentPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed asset-class enumeration offered to investors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Equity,
    Debt,
    Gold,
    Bonds,
    #[serde(rename = "REITs")]
    Reits,
    Commodities,
}

impl AssetClass {
    pub const ALL: [AssetClass; 6] = [
        Self::Equity,
        Self::Debt,
        Self::Gold,
        Self::Bonds,
        Self::Reits,
        Self::Commodities,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Equity => "Equity",
            AssetClass::Debt => "Debt",
            AssetClass::Gold => "Gold",
            AssetClass::Bonds => "Bonds",
            AssetClass::Reits => "REITs",
            AssetClass::Commodities => "Commodities",
        }
    }

    /// Case-insensitive match against the display labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated investor profile. Only `profile::validate` builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentProfile {
    pub investment_amount: f64,
    pub expected_return: f64,
    pub risk_tolerance: RiskTolerance,
    pub investment_period: InvestmentPeriod,
    /// Selected classes, in selection order, without duplicates.
    #[serde(serialize_with = "serialize_preferences")]
    pub asset_allocation_preferences: Vec<AssetClass>,
}

impl InvestmentProfile {
    /// Preferences as the single comma-joined string handed to the prompt.
    pub fn asset_preferences_wire(&self) -> String {
        self.asset_allocation_preferences
            .iter()
            .map(AssetClass::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn serialize_preferences<S>(prefs: &[AssetClass], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let joined = prefs
        .iter()
        .map(AssetClass::label)
        .collect::<Vec<_>>()
        .join(", ");
    serializer.serialize_str(&joined)
}

// ============ Generated Portfolios ============

/// One fund allocation inside a generated portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub fund_name: String,
    pub asset_class: String,
    pub percentage: f64,
}

/// A candidate portfolio produced by the generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPortfolio {
    pub portfolio_name: String,
    pub description: String,
    pub investments: Vec<Investment>,
}

/// The full model output; also the shape of an exported `portfolios.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub portfolios: Vec<GeneratedPortfolio>,
}

// ============ Fund Catalog Records ============

/// Single net-asset-value observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub company: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub metric: String,
    pub value: String,
    /// Peer-category average for the same metric.
    pub average: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerComparison {
    pub fund_name: String,
    pub pe_ratio: String,
    pub beta: f64,
    pub sharpe_ratio: f64,
    pub upside_ratio: f64,
    pub downside_ratio: f64,
}

/// Slice of a fund's asset allocation, with the chart color used to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub name: String,
    pub value: f64,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentStrategy {
    pub overview: String,
    pub one_year_return: String,
    pub three_year_return: String,
    pub five_year_return: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioChanges {
    pub sector_shifts: String,
    pub regulations: String,
    pub exit_load: String,
}

/// Static fund detail record served by the fund detail route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRecord {
    pub name: String,
    pub slug: String,
    pub aum: String,
    pub manager: String,
    pub investment_strategy: InvestmentStrategy,
    pub nav_history: Vec<NavPoint>,
    pub holdings: Vec<Holding>,
    pub performance_metrics: Vec<PerformanceMetric>,
    pub peer_comparison: Vec<PeerComparison>,
    pub asset_allocation: Vec<AllocationSlice>,
    pub portfolio_changes: PortfolioChanges,
    pub strategic_positioning: String,
}

impl FundRecord {
    /// Names of the asset classes this fund holds, in allocation order.
    pub fn asset_class_names(&self) -> impl Iterator<Item = &str> {
        self.asset_allocation.iter().map(|slice| slice.name.as_str())
    }

    /// Canonical spelling of `asset_class` if this fund carries it (case-insensitive).
    pub fn matching_asset_class(&self, asset_class: &str) -> Option<&str> {
        let wanted = asset_class.trim();
        self.asset_class_names()
            .find(|name| name.eq_ignore_ascii_case(wanted))
    }
}

/// Row of the fund index listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundSummary {
    pub name: String,
    pub slug: String,
    pub manager: String,
    pub aum: String,
    pub asset_classes: Vec<String>,
}

impl From<&FundRecord> for FundSummary {
    fn from(fund: &FundRecord) -> Self {
        Self {
            name: fund.name.clone(),
            slug: fund.slug.clone(),
            manager: fund.manager.clone(),
            aum: fund.aum.clone(),
            asset_classes: fund.asset_class_names().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_accepts_aliases() {
        assert_eq!(
            "1-to-5-years".parse::<InvestmentPeriod>().unwrap(),
            InvestmentPeriod::OneToFiveYears
        );
        assert_eq!(
            "moreThanFiveYears".parse::<InvestmentPeriod>().unwrap(),
            InvestmentPeriod::MoreThanFiveYears
        );
        assert!("forever".parse::<InvestmentPeriod>().is_err());
    }

    #[test]
    fn test_risk_is_exact() {
        assert_eq!("low".parse::<RiskTolerance>().unwrap(), RiskTolerance::Low);
        assert!("Low".parse::<RiskTolerance>().is_err());
        assert!("extreme".parse::<RiskTolerance>().is_err());
    }

    #[test]
    fn test_asset_class_labels() {
        assert_eq!(AssetClass::from_label("reits"), Some(AssetClass::Reits));
        assert_eq!(AssetClass::from_label(" Gold "), Some(AssetClass::Gold));
        assert_eq!(AssetClass::from_label("Cash"), None);
        assert_eq!(
            serde_json::to_string(&AssetClass::Reits).unwrap(),
            "\"REITs\""
        );
    }

    #[test]
    fn test_profile_serializes_preferences_as_string() {
        let profile = InvestmentProfile {
            investment_amount: 10000.0,
            expected_return: 12.0,
            risk_tolerance: RiskTolerance::Medium,
            investment_period: InvestmentPeriod::OneToFiveYears,
            asset_allocation_preferences: vec![AssetClass::Equity, AssetClass::Debt],
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["assetAllocationPreferences"], "Equity, Debt");
        assert_eq!(value["investmentPeriod"], "oneToFiveYears");
        assert_eq!(value["riskTolerance"], "medium");
    }

    #[test]
    fn test_generation_response_field_names() {
        let json = serde_json::json!({
            "portfolios": [{
                "portfolioName": "Balanced Growth",
                "description": "Mix",
                "investments": [
                    {"fundName": "HDFC Gold Fund", "assetClass": "Gold", "percentage": 40}
                ]
            }]
        });
        let parsed: GenerationResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.portfolios[0].investments[0].percentage, 40.0);
        assert_eq!(parsed.portfolios[0].portfolio_name, "Balanced Growth");
    }
}
