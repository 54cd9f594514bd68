//! Instruction text and output schema for the portfolio generation call.
//!
//! The catalog listing embedded in the instruction is part of the external
//! contract: any catalog change changes the instruction, which is why a
//! fingerprint of the listing is exposed for logging and health checks.

use crate::catalog::FundCatalog;
use crate::models::InvestmentProfile;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Deterministic listing of every catalog fund, in catalog order.
pub fn catalog_listing(catalog: &FundCatalog) -> String {
    let mut listing = String::new();
    for fund in catalog.funds() {
        let strategy = &fund.investment_strategy;
        let classes: Vec<&str> = fund.asset_class_names().collect();
        // Writing to a String cannot fail.
        let _ = write!(
            listing,
            "\n- Fund Name: {}\n  Manager: {}\n  Strategy: {}\n  1Y Return: {}\n  3Y Return: {}\n  5Y Return: {}\n  Asset Classes: {}\n",
            fund.name,
            fund.manager,
            strategy.overview,
            strategy.one_year_return,
            strategy.three_year_return,
            strategy.five_year_return,
            classes.join(", "),
        );
    }
    listing
}

/// SHA-256 (hex) of a catalog listing.
pub fn listing_fingerprint(listing: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(listing.as_bytes());
    hex::encode(hasher.finalize())
}

/// Prompt template bound to one catalog. Build once, reuse per request.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    listing: String,
    fingerprint: String,
    portfolio_count: u8,
}

impl PromptTemplate {
    pub fn new(catalog: &FundCatalog, portfolio_count: u8) -> Self {
        let listing = catalog_listing(catalog);
        let fingerprint = listing_fingerprint(&listing);
        Self {
            listing,
            fingerprint,
            portfolio_count,
        }
    }

    pub fn listing(&self) -> &str {
        &self.listing
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Full instruction for one profile.
    pub fn render(&self, profile: &InvestmentProfile) -> String {
        let count = self.portfolio_count;
        let plural = if count == 1 { "portfolio" } else { "portfolios" };

        format!(
            r#"You are a financial expert providing investment portfolio recommendations.

Based on the user's investment profile, generate {count} diversified investment {plural}.
Each portfolio should include a mix of mutual funds based on the user's asset allocation preferences.
Consider the user's risk tolerance, investment period, and expected return when creating the portfolios.

Here is the list of available funds and their details:
{listing}
You MUST select funds from the list above. Do not invent funds.
The 'assetClass' in your response for each investment MUST be one of the asset classes associated with the chosen fund from the list above.

User Investment Profile:
- Investment Amount: {amount}
- Expected Annual Return: {expected_return}%
- Risk Tolerance: {risk}
- Investment Period: {period}
- Asset Allocation Preferences: {preferences}

Generate a unique description for each portfolio that explains the reasoning behind the fund selection and how it aligns with the user's profile. Ensure the generated portfolios are well-diversified and strictly aligned with the user's preferences.

Output the portfolios in a JSON format.
"#,
            listing = self.listing,
            amount = profile.investment_amount,
            expected_return = profile.expected_return,
            risk = profile.risk_tolerance,
            period = profile.investment_period,
            preferences = profile.asset_preferences_wire(),
        )
    }
}

/// Declared output shape, in the schema dialect of the generateContent API.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "portfolios": {
                "type": "ARRAY",
                "description": "An array of investment portfolios.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "portfolioName": {
                            "type": "STRING",
                            "description": "The name of the portfolio."
                        },
                        "description": {
                            "type": "STRING",
                            "description": "A description of the portfolio strategy."
                        },
                        "investments": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "fundName": {
                                        "type": "STRING",
                                        "description": "The name of the mutual fund."
                                    },
                                    "assetClass": {
                                        "type": "STRING",
                                        "description": "The asset class of the mutual fund."
                                    },
                                    "percentage": {
                                        "type": "NUMBER",
                                        "description": "The percentage of the investment allocated to this fund."
                                    }
                                },
                                "required": ["fundName", "assetClass", "percentage"]
                            }
                        }
                    },
                    "required": ["portfolioName", "description", "investments"]
                }
            }
        },
        "required": ["portfolios"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetClass, InvestmentPeriod, RiskTolerance};
    use chrono::NaiveDate;

    fn catalog() -> FundCatalog {
        FundCatalog::embedded(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()).unwrap()
    }

    fn profile() -> InvestmentProfile {
        InvestmentProfile {
            investment_amount: 10000.0,
            expected_return: 12.0,
            risk_tolerance: RiskTolerance::Medium,
            investment_period: InvestmentPeriod::OneToFiveYears,
            asset_allocation_preferences: vec![AssetClass::Equity, AssetClass::Debt],
        }
    }

    #[test]
    fn test_listing_contains_every_fund() {
        let catalog = catalog();
        let listing = catalog_listing(&catalog);
        for fund in catalog.funds() {
            assert!(listing.contains(&format!("- Fund Name: {}\n", fund.name)));
        }
        assert!(listing.contains("Asset Classes: Indian Equity, Foreign Equity, Debt, Cash\n"));
        assert!(listing.contains("  1Y Return: 15.1%\n"));
    }

    #[test]
    fn test_listing_ignores_nav_dates() {
        let a = FundCatalog::embedded(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).unwrap();
        let b = FundCatalog::embedded(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).unwrap();
        assert_eq!(
            PromptTemplate::new(&a, 3).fingerprint(),
            PromptTemplate::new(&b, 3).fingerprint()
        );
    }

    #[test]
    fn test_render_interpolates_profile() {
        let template = PromptTemplate::new(&catalog(), 3);
        let text = template.render(&profile());

        assert!(text.contains("generate 3 diversified investment portfolios."));
        assert!(text.contains("- Investment Amount: 10000\n"));
        assert!(text.contains("- Expected Annual Return: 12%\n"));
        assert!(text.contains("- Risk Tolerance: medium\n"));
        assert!(text.contains("- Investment Period: oneToFiveYears\n"));
        assert!(text.contains("- Asset Allocation Preferences: Equity, Debt\n"));
        assert!(text.contains("You MUST select funds from the list above."));
        assert!(text.contains(template.listing()));
    }

    #[test]
    fn test_singular_count() {
        let text = PromptTemplate::new(&catalog(), 1).render(&profile());
        assert!(text.contains("generate 1 diversified investment portfolio.\n"));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fingerprint = listing_fingerprint("abc");
        assert_eq!(
            fingerprint,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_schema_requires_portfolios() {
        let schema = response_schema();
        assert_eq!(schema["required"][0], "portfolios");
        assert_eq!(
            schema["properties"]["portfolios"]["items"]["properties"]["investments"]["items"]
                ["properties"]["percentage"]["type"],
            "NUMBER"
        );
    }
}
