/// Portfolio generation service
///
/// Turns a validated profile into candidate portfolios:
/// 1. Render the instruction (catalog listing + profile) from the prompt template
/// 2. Call the generative model under a timeout and a circuit breaker
/// 3. Parse and structurally validate the output
/// 4. Reject empty results
/// 5. Cross-check every investment against the catalog (fidelity pass)
///
/// Failures are terminal for the request; nothing is retried here.
use crate::catalog::FundCatalog;
use crate::circuit_breaker::{create_model_circuit_breaker, ModelCircuitBreaker};
use crate::config::{Config, FidelityMode};
use crate::errors::AppError;
use crate::genai_client::{ModelRequest, PortfolioModel};
use crate::models::{GeneratedPortfolio, GenerationResponse, InvestmentProfile};
use crate::prompt::{response_schema, PromptTemplate};
use std::sync::Arc;
use std::time::Duration;

/// Tunables for `PortfolioGenerationService`.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub timeout: Duration,
    pub portfolio_count: u8,
    pub fidelity: FidelityMode,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            portfolio_count: 3,
            fidelity: FidelityMode::Filter,
        }
    }
}

impl From<&Config> for GenerationSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.generation_timeout_secs),
            portfolio_count: config.portfolio_count_hint,
            fidelity: config.fidelity_mode,
        }
    }
}

pub struct PortfolioGenerationService {
    catalog: Arc<FundCatalog>,
    model: Arc<dyn PortfolioModel>,
    template: PromptTemplate,
    breaker: ModelCircuitBreaker,
    settings: GenerationSettings,
}

impl PortfolioGenerationService {
    pub fn new(
        catalog: Arc<FundCatalog>,
        model: Arc<dyn PortfolioModel>,
        settings: GenerationSettings,
    ) -> Self {
        let template = PromptTemplate::new(&catalog, settings.portfolio_count);
        Self {
            catalog,
            model,
            template,
            breaker: create_model_circuit_breaker(),
            settings,
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn catalog(&self) -> &FundCatalog {
        &self.catalog
    }

    /// Generates portfolios for `profile`.
    ///
    /// Errors: `GenerationFailed` when the call errors, times out, is rejected
    /// by the circuit breaker, or yields malformed output (or, in `reject`
    /// mode, references funds outside the catalog); `EmptyResult` when no
    /// portfolio survives.
    pub async fn generate(
        &self,
        profile: &InvestmentProfile,
    ) -> Result<GenerationResponse, AppError> {
        let request = ModelRequest {
            instruction: self.template.render(profile),
            response_schema: response_schema(),
        };

        tracing::info!(
            "Generating portfolios via {} (risk: {}, period: {}, preferences: {})",
            self.model.name(),
            profile.risk_tolerance,
            profile.investment_period,
            profile.asset_preferences_wire()
        );

        let raw = self.call_model(&request).await?;
        let response = parse_model_output(&raw)?;

        if response.portfolios.is_empty() {
            return Err(AppError::EmptyResult);
        }

        let response = enforce_fidelity(response, &self.catalog, self.settings.fidelity)?;

        if response.portfolios.is_empty() {
            tracing::warn!("Every generated investment failed the catalog check");
            return Err(AppError::EmptyResult);
        }

        tracing::info!(
            "✓ Generated {} portfolio(s)",
            response.portfolios.len()
        );
        Ok(response)
    }

    async fn call_model(&self, request: &ModelRequest) -> Result<String, AppError> {
        let timeout = self.settings.timeout;
        let call = async {
            match tokio::time::timeout(timeout, self.model.generate(request)).await {
                Ok(result) => result,
                Err(_) => Err(AppError::GenerationFailed(format!(
                    "model call timed out after {}s",
                    timeout.as_secs_f64()
                ))),
            }
        };

        match failsafe::futures::CircuitBreaker::call(&self.breaker, call).await {
            Ok(raw) => Ok(raw),
            Err(failsafe::Error::Inner(AppError::GenerationFailed(msg))) => {
                Err(AppError::GenerationFailed(msg))
            }
            Err(failsafe::Error::Inner(e)) => Err(AppError::GenerationFailed(e.to_string())),
            Err(failsafe::Error::Rejected) => Err(AppError::GenerationFailed(
                "model circuit breaker is open; call rejected".to_string(),
            )),
        }
    }
}

/// Strips a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parses raw model text into a `GenerationResponse`.
///
/// Missing fields, wrong types, and negative percentages are all reported as
/// `GenerationFailed`. An empty `portfolios` array is *not* an error here.
pub fn parse_model_output(raw: &str) -> Result<GenerationResponse, AppError> {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return Err(AppError::GenerationFailed(
            "model returned an empty payload".to_string(),
        ));
    }

    let response: GenerationResponse = serde_json::from_str(cleaned).map_err(|e| {
        let snippet: String = cleaned.chars().take(200).collect();
        AppError::GenerationFailed(format!("malformed model output: {}. Raw: {}", e, snippet))
    })?;

    for portfolio in &response.portfolios {
        if let Some(bad) = portfolio
            .investments
            .iter()
            .find(|i| !i.percentage.is_finite() || i.percentage < 0.0)
        {
            return Err(AppError::GenerationFailed(format!(
                "portfolio '{}' allocates an invalid percentage {} to '{}'",
                portfolio.portfolio_name, bad.percentage, bad.fund_name
            )));
        }
    }

    Ok(response)
}

/// Cross-checks every investment against the catalog.
///
/// A fund matches by slug, and its asset class must be one of that fund's
/// allocation names (case-insensitive). Matches are rewritten to the catalog's
/// spelling. `Filter` drops mismatches and then any portfolio left without
/// investments; `Reject` fails on the first mismatch; `Off` passes through.
pub fn enforce_fidelity(
    response: GenerationResponse,
    catalog: &FundCatalog,
    mode: FidelityMode,
) -> Result<GenerationResponse, AppError> {
    if mode == FidelityMode::Off {
        return Ok(response);
    }

    let mut dropped = 0usize;
    let mut portfolios: Vec<GeneratedPortfolio> = Vec::with_capacity(response.portfolios.len());

    for mut portfolio in response.portfolios {
        let mut kept = Vec::with_capacity(portfolio.investments.len());

        for mut investment in portfolio.investments {
            let violation = match catalog.find_by_name(&investment.fund_name) {
                None => Some(format!("unknown fund '{}'", investment.fund_name)),
                Some(fund) => match fund.matching_asset_class(&investment.asset_class) {
                    None => Some(format!(
                        "fund '{}' does not hold asset class '{}'",
                        fund.name, investment.asset_class
                    )),
                    Some(asset_class) => {
                        investment.fund_name = fund.name.clone();
                        investment.asset_class = asset_class.to_string();
                        None
                    }
                },
            };

            match violation {
                None => kept.push(investment),
                Some(reason) if mode == FidelityMode::Reject => {
                    return Err(AppError::GenerationFailed(format!(
                        "portfolio '{}' failed the catalog check: {}",
                        portfolio.portfolio_name, reason
                    )));
                }
                Some(reason) => {
                    tracing::warn!(
                        "Dropping investment from '{}': {}",
                        portfolio.portfolio_name,
                        reason
                    );
                    dropped += 1;
                }
            }
        }

        if kept.is_empty() {
            tracing::warn!(
                "Dropping portfolio '{}': no investments left after catalog check",
                portfolio.portfolio_name
            );
            continue;
        }

        portfolio.investments = kept;
        portfolios.push(portfolio);
    }

    if dropped > 0 {
        tracing::info!("Catalog check dropped {} investment(s)", dropped);
    }

    Ok(GenerationResponse { portfolios })
}
