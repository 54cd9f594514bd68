use crate::errors::AppError;
use crate::models::GenerationResponse;

/// File name offered for exported portfolios.
pub const EXPORT_FILE_NAME: &str = "portfolios.json";

/// Serializes portfolios as pretty-printed (2-space) JSON.
pub fn export_json(response: &GenerationResponse) -> Result<String, AppError> {
    serde_json::to_string_pretty(response)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize portfolios: {}", e)))
}

/// Parses an uploaded document back into portfolios.
///
/// Invalid UTF-8, invalid JSON, and JSON that does not match the portfolio
/// shape all yield `ImportFailed`.
pub fn import_json(bytes: &[u8]) -> Result<GenerationResponse, AppError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AppError::ImportFailed(format!("file is not valid UTF-8: {}", e)))?;

    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| AppError::ImportFailed(format!("file is not valid JSON: {}", e)))?;

    serde_json::from_value(value).map_err(|e| {
        AppError::ImportFailed(format!("file does not contain portfolios: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeneratedPortfolio, Investment};

    fn balanced_growth() -> GenerationResponse {
        GenerationResponse {
            portfolios: vec![GeneratedPortfolio {
                portfolio_name: "Balanced Growth".to_string(),
                description: "Gold hedge with large-cap equity".to_string(),
                investments: vec![
                    Investment {
                        fund_name: "HDFC Gold Fund".to_string(),
                        asset_class: "Gold".to_string(),
                        percentage: 40.0,
                    },
                    Investment {
                        fund_name: "Nippon India Large Cap Fund".to_string(),
                        asset_class: "Equity".to_string(),
                        percentage: 60.0,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_export_then_import_reproduces_portfolios() {
        let original = balanced_growth();
        let exported = export_json(&original).unwrap();
        let imported = import_json(exported.as_bytes()).unwrap();
        assert_eq!(imported, original);
    }

    #[test]
    fn test_export_is_indented() {
        let exported = export_json(&balanced_growth()).unwrap();
        assert!(exported.starts_with("{\n  \"portfolios\": [\n"));
        assert!(exported.contains("\"portfolioName\": \"Balanced Growth\""));
    }

    #[test]
    fn test_import_rejects_invalid_json() {
        assert!(matches!(
            import_json(b"{not json"),
            Err(AppError::ImportFailed(_))
        ));
    }

    #[test]
    fn test_import_rejects_invalid_utf8() {
        assert!(matches!(
            import_json(&[0xff, 0xfe, 0x00]),
            Err(AppError::ImportFailed(_))
        ));
    }

    #[test]
    fn test_import_rejects_wrong_shape() {
        assert!(matches!(
            import_json(br#"{"portfolios": [{"portfolioName": "x"}]}"#),
            Err(AppError::ImportFailed(_))
        ));
        assert!(matches!(
            import_json(b"[1, 2, 3]"),
            Err(AppError::ImportFailed(_))
        ));
    }
}
