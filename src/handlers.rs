use crate::catalog::FundCatalog;
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::generation::{GenerationSettings, PortfolioGenerationService};
use crate::genai_client::PortfolioModel;
use crate::models::{AssetClass, FundRecord, FundSummary, GenerationResponse, InvestmentProfile};
use crate::profile::{self, RawProfile};
use crate::session::{SessionStore, SessionView, SESSION_HEADER};
use crate::transfer::{self, EXPORT_FILE_NAME};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Longest client-supplied session id that is accepted as-is.
const MAX_SESSION_ID_LEN: usize = 128;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The fund catalog, read-only for the life of the process.
    pub catalog: Arc<FundCatalog>,
    /// Generation pipeline (prompt, model, breaker, fidelity pass).
    pub generator: Arc<PortfolioGenerationService>,
    /// Per-session display state.
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, catalog: Arc<FundCatalog>, model: Arc<dyn PortfolioModel>) -> Self {
        let generator = Arc::new(PortfolioGenerationService::new(
            Arc::clone(&catalog),
            model,
            GenerationSettings::from(&config),
        ));
        let sessions = SessionStore::new(Duration::from_secs(config.session_ttl_secs));

        Self {
            config,
            catalog,
            generator,
            sessions,
        }
    }
}

/// Reads the caller's session id, minting a new one when absent or unusable.
fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_SESSION_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Attaches the session header to any response, successful or not.
fn with_session<T: IntoResponse>(session_id: String, result: Result<T, AppError>) -> Response {
    let headers = [(SESSION_HEADER, session_id)];
    match result {
        Ok(body) => (headers, body).into_response(),
        Err(err) => (headers, err).into_response(),
    }
}

/// Health check endpoint.
///
/// Reports the catalog size and the fingerprint of the catalog listing sent
/// with every generation request.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "fund-forecaster",
            "version": env!("CARGO_PKG_VERSION"),
            "catalog": {
                "funds": state.catalog.len(),
                "fingerprint": state.generator.template().fingerprint(),
            },
            "fidelityMode": state.config.fidelity_mode,
        })),
    )
}

/// GET /api/v1/asset-classes
pub async fn asset_classes() -> Json<Vec<&'static str>> {
    Json(AssetClass::ALL.iter().map(AssetClass::label).collect())
}

/// GET /api/v1/funds
///
/// Fund summaries in catalog order. Each `slug` is a valid detail path.
pub async fn list_funds(State(state): State<Arc<AppState>>) -> Json<Vec<FundSummary>> {
    Json(state.catalog.funds().iter().map(FundSummary::from).collect())
}

/// GET /api/v1/funds/:slug
///
/// # Returns
///
/// * `Result<Json<FundRecord>, AppError>` - The full fund record, or `NotFound`
///   when no fund carries exactly this slug.
pub async fn get_fund(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<FundRecord>, AppError> {
    tracing::info!("GET /funds/{}", slug);
    let fund = state.catalog.resolve(&slug)?;
    Ok(Json(fund.clone()))
}

/// POST /api/v1/profile/validate
///
/// Validates a raw profile without generating anything. Every failing field
/// is reported in one 422 response.
pub async fn validate_profile(
    payload: Result<Json<RawProfile>, JsonRejection>,
) -> Result<Json<InvestmentProfile>, AppError> {
    let Json(raw) = payload?;
    let profile = profile::validate(&raw)?;
    Ok(Json(profile))
}

/// POST /api/v1/portfolios/generate
///
/// Validates the profile, then runs one generation for the caller's session.
/// A validation failure leaves the session untouched. Once a generation
/// starts, the session shows `pending` until this submission completes; if a
/// newer submission started in the meantime, this caller gets `409 Conflict`
/// and the result is discarded.
pub async fn generate_portfolios(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RawProfile>, JsonRejection>,
) -> Response {
    let session_id = session_id(&headers);
    tracing::info!("POST /portfolios/generate - session {}", session_id);

    let result = match payload {
        Ok(Json(raw)) => run_generation(state, &session_id, &raw).await,
        Err(rejection) => Err(rejection.into()),
    };
    with_session(session_id, result.map(Json))
}

/// The submission runs on its own task so its outcome is recorded even when
/// the caller goes away before it finishes.
async fn run_generation(
    state: Arc<AppState>,
    session_id: &str,
    raw: &RawProfile,
) -> Result<GenerationResponse, AppError> {
    let profile = profile::validate(raw)?;

    let task_session = session_id.to_string();
    let submission = tokio::spawn(async move {
        let ticket = state.sessions.begin_submission(&task_session).await;
        let result = state.generator.generate(&profile).await;
        let recorded = state.sessions.complete(&task_session, ticket, &result).await;
        recorded.and(result)
    });

    submission
        .await
        .map_err(|e| AppError::InternalError(format!("Generation task failed: {}", e)))?
        .with_context(|| format!("Generation for session {}", session_id))
}

/// GET /api/v1/session
pub async fn get_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session_id = session_id(&headers);
    let view: SessionView = state.sessions.current(&session_id).await;
    with_session(session_id, Ok(Json(view)))
}

/// GET /api/v1/portfolios/export
///
/// Downloads the session's displayed portfolios as `portfolios.json`.
pub async fn export_portfolios(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let session_id = session_id(&headers);

    let result = async {
        let response = state
            .sessions
            .ready_response(&session_id)
            .await
            .ok_or_else(|| AppError::NotFound("No portfolios to export".to_string()))?;
        let body = transfer::export_json(&response)?;

        Ok::<_, AppError>((
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            body,
        ))
    }
    .await;

    with_session(session_id, result)
}

/// POST /api/v1/portfolios/import
///
/// Accepts a previously exported document. On failure the session keeps
/// whatever it was showing.
pub async fn import_portfolios(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let session_id = session_id(&headers);
    tracing::info!(
        "POST /portfolios/import - session {} ({} bytes)",
        session_id,
        body.len()
    );

    let result = async {
        let response = transfer::import_json(&body)?;
        tracing::info!("Imported {} portfolio(s)", response.portfolios.len());
        state
            .sessions
            .replace_from_import(&session_id, response.clone())
            .await;
        Ok::<_, AppError>(Json(response))
    }
    .await;

    with_session(session_id, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_id_uses_header() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("  abc-123 "));
        assert_eq!(session_id(&headers), "abc-123");
    }

    #[test]
    fn test_session_id_minted_when_missing_or_oversized() {
        let minted = session_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&minted).is_ok());

        let mut headers = HeaderMap::new();
        let long = "x".repeat(MAX_SESSION_ID_LEN + 1);
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&long).unwrap());
        assert!(Uuid::parse_str(&session_id(&headers)).is_ok());
    }

    #[tokio::test]
    async fn test_asset_classes_lists_all_labels() {
        let Json(labels) = asset_classes().await;
        assert_eq!(
            labels,
            vec!["Equity", "Debt", "Gold", "Bonds", "REITs", "Commodities"]
        );
    }
}
