/// Investor profile validation
///
/// Turns raw form input into an `InvestmentProfile`. Numbers may arrive as JSON
/// numbers or numeric strings; every failing field is reported, and no profile
/// is produced unless all fields pass.
use crate::errors::{AppError, FieldError, ValidationKind};
use crate::models::{AssetClass, InvestmentPeriod, InvestmentProfile, RiskTolerance};
use serde::Deserialize;
use serde_json::Value;

/// Unvalidated profile fields exactly as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    #[serde(default)]
    pub investment_amount: Option<Value>,
    #[serde(default)]
    pub expected_return: Option<Value>,
    #[serde(default)]
    pub risk_tolerance: Option<Value>,
    #[serde(default)]
    pub investment_period: Option<Value>,
    /// Either an array of labels or an already comma-joined string.
    #[serde(default)]
    pub asset_allocation_preferences: Option<Value>,
}

/// Coerces a JSON number or numeric string to a finite `f64`.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn as_text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn validate_amount(raw: &RawProfile) -> Result<f64, FieldError> {
    match coerce_number(raw.investment_amount.as_ref()) {
        Some(amount) if amount > 0.0 => Ok(amount),
        Some(_) => Err(FieldError::new(
            "investmentAmount",
            ValidationKind::InvalidAmount,
            "Amount must be positive.",
        )),
        None => Err(FieldError::new(
            "investmentAmount",
            ValidationKind::InvalidAmount,
            "Please enter an amount.",
        )),
    }
}

fn validate_return(raw: &RawProfile) -> Result<f64, FieldError> {
    match coerce_number(raw.expected_return.as_ref()) {
        Some(ret) if ret < 0.0 => Err(FieldError::new(
            "expectedReturn",
            ValidationKind::InvalidReturn,
            "Return cannot be negative.",
        )),
        Some(ret) if ret > 100.0 => Err(FieldError::new(
            "expectedReturn",
            ValidationKind::InvalidReturn,
            "Return cannot exceed 100%.",
        )),
        Some(ret) => Ok(ret),
        None => Err(FieldError::new(
            "expectedReturn",
            ValidationKind::InvalidReturn,
            "Please enter a return.",
        )),
    }
}

fn validate_risk(raw: &RawProfile) -> Result<RiskTolerance, FieldError> {
    as_text(raw.risk_tolerance.as_ref())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            FieldError::new(
                "riskTolerance",
                ValidationKind::InvalidEnum,
                "You need to select a risk tolerance level.",
            )
        })
}

fn validate_period(raw: &RawProfile) -> Result<InvestmentPeriod, FieldError> {
    as_text(raw.investment_period.as_ref())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            FieldError::new(
                "investmentPeriod",
                ValidationKind::InvalidEnum,
                "Please select an investment period.",
            )
        })
}

/// At least one label must come from the enumeration, otherwise the selection
/// is empty. Unknown labels next to valid ones are reported as `InvalidEnum`.
fn validate_preferences(raw: &RawProfile) -> Result<Vec<AssetClass>, FieldError> {
    const FIELD: &str = "assetAllocationPreferences";

    let labels: Vec<String> = match raw.asset_allocation_preferences.as_ref() {
        Some(Value::String(joined)) => joined.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(label) => label.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut selected: Vec<AssetClass> = Vec::new();
    let mut unknown: Vec<&str> = Vec::new();
    for label in labels.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        match AssetClass::from_label(label) {
            Some(class) if !selected.contains(&class) => selected.push(class),
            Some(_) => {}
            None => unknown.push(label),
        }
    }

    if selected.is_empty() {
        return Err(FieldError::new(
            FIELD,
            ValidationKind::EmptySelection,
            "You have to select at least one asset class.",
        ));
    }

    if !unknown.is_empty() {
        return Err(FieldError::new(
            FIELD,
            ValidationKind::InvalidEnum,
            format!("Unknown asset class '{}'.", unknown.join("', '")),
        ));
    }

    Ok(selected)
}

/// Validates a raw profile, returning every field error at once on failure.
pub fn validate(raw: &RawProfile) -> Result<InvestmentProfile, AppError> {
    let amount = validate_amount(raw);
    let expected_return = validate_return(raw);
    let risk = validate_risk(raw);
    let period = validate_period(raw);
    let preferences = validate_preferences(raw);

    match (amount, expected_return, risk, period, preferences) {
        (Ok(amount), Ok(expected_return), Ok(risk), Ok(period), Ok(preferences)) => {
            Ok(InvestmentProfile {
                investment_amount: amount,
                expected_return,
                risk_tolerance: risk,
                investment_period: period,
                asset_allocation_preferences: preferences,
            })
        }
        (amount, expected_return, risk, period, preferences) => {
            let errors: Vec<FieldError> = [
                amount.err(),
                expected_return.err(),
                risk.err(),
                period.err(),
                preferences.err(),
            ]
            .into_iter()
            .flatten()
            .collect();
            tracing::debug!("Profile rejected: {} field error(s)", errors.len());
            Err(AppError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawProfile {
        serde_json::from_value(value).unwrap()
    }

    fn kinds(err: AppError) -> Vec<(&'static str, ValidationKind)> {
        err.field_errors()
            .unwrap()
            .iter()
            .map(|e| (e.field, e.kind))
            .collect()
    }

    #[test]
    fn test_valid_profile() {
        let profile = validate(&raw(json!({
            "investmentAmount": 10000,
            "expectedReturn": 12,
            "riskTolerance": "medium",
            "investmentPeriod": "oneToFiveYears",
            "assetAllocationPreferences": ["Equity", "Debt"]
        })))
        .unwrap();

        assert_eq!(profile.investment_amount, 10000.0);
        assert_eq!(profile.risk_tolerance, RiskTolerance::Medium);
        assert_eq!(profile.asset_preferences_wire(), "Equity, Debt");
    }

    #[test]
    fn test_numeric_strings_coerce() {
        let profile = validate(&raw(json!({
            "investmentAmount": " 2500.50 ",
            "expectedReturn": "0",
            "riskTolerance": "low",
            "investmentPeriod": "under-1-year",
            "assetAllocationPreferences": "Gold, reits"
        })))
        .unwrap();

        assert_eq!(profile.investment_amount, 2500.5);
        assert_eq!(profile.expected_return, 0.0);
        assert_eq!(profile.investment_period, InvestmentPeriod::LessThanOneYear);
        assert_eq!(profile.asset_preferences_wire(), "Gold, REITs");
    }

    #[test]
    fn test_duplicates_keep_first_order() {
        let profile = validate(&raw(json!({
            "investmentAmount": 1,
            "expectedReturn": 100,
            "riskTolerance": "high",
            "investmentPeriod": "moreThanFiveYears",
            "assetAllocationPreferences": ["Commodities", "Equity", "commodities"]
        })))
        .unwrap();

        assert_eq!(profile.asset_preferences_wire(), "Commodities, Equity");
    }

    #[test]
    fn test_all_errors_reported() {
        let err = validate(&raw(json!({
            "investmentAmount": 0,
            "expectedReturn": 101,
            "riskTolerance": "extreme",
            "investmentPeriod": "forever",
            "assetAllocationPreferences": []
        })))
        .unwrap_err();

        assert_eq!(
            kinds(err),
            vec![
                ("investmentAmount", ValidationKind::InvalidAmount),
                ("expectedReturn", ValidationKind::InvalidReturn),
                ("riskTolerance", ValidationKind::InvalidEnum),
                ("investmentPeriod", ValidationKind::InvalidEnum),
                ("assetAllocationPreferences", ValidationKind::EmptySelection),
            ]
        );
    }

    #[test]
    fn test_missing_fields() {
        let err = validate(&RawProfile::default()).unwrap_err();
        assert_eq!(err.field_errors().unwrap().len(), 5);
    }

    #[test]
    fn test_negative_amount_and_return() {
        let err = validate(&raw(json!({
            "investmentAmount": -5,
            "expectedReturn": -1,
            "riskTolerance": "low",
            "investmentPeriod": "oneToFiveYears",
            "assetAllocationPreferences": ["Debt"]
        })))
        .unwrap_err();

        assert_eq!(
            kinds(err),
            vec![
                ("investmentAmount", ValidationKind::InvalidAmount),
                ("expectedReturn", ValidationKind::InvalidReturn),
            ]
        );
    }

    #[test]
    fn test_unknown_asset_class() {
        let err = validate(&raw(json!({
            "investmentAmount": 100,
            "expectedReturn": 8,
            "riskTolerance": "low",
            "investmentPeriod": "oneToFiveYears",
            "assetAllocationPreferences": ["Equity", "Crypto"]
        })))
        .unwrap_err();

        assert_eq!(
            kinds(err),
            vec![("assetAllocationPreferences", ValidationKind::InvalidEnum)]
        );
    }

    #[test]
    fn test_selection_without_known_classes_is_empty() {
        for prefs in [json!(["Crypto"]), json!("Crypto, Art"), json!([42, "nft"]), json!(7)] {
            let err = validate(&raw(json!({
                "investmentAmount": 100,
                "expectedReturn": 8,
                "riskTolerance": "low",
                "investmentPeriod": "oneToFiveYears",
                "assetAllocationPreferences": prefs
            })))
            .unwrap_err();

            assert_eq!(
                kinds(err),
                vec![("assetAllocationPreferences", ValidationKind::EmptySelection)]
            );
        }
    }

    #[test]
    fn test_blank_string_selection_is_empty() {
        let err = validate(&raw(json!({
            "investmentAmount": 100,
            "expectedReturn": 8,
            "riskTolerance": "low",
            "investmentPeriod": "oneToFiveYears",
            "assetAllocationPreferences": " , "
        })))
        .unwrap_err();

        assert_eq!(
            kinds(err),
            vec![("assetAllocationPreferences", ValidationKind::EmptySelection)]
        );
    }

    #[test]
    fn test_non_numeric_amount() {
        let err = validate(&raw(json!({
            "investmentAmount": "lots",
            "expectedReturn": true,
            "riskTolerance": "low",
            "investmentPeriod": "oneToFiveYears",
            "assetAllocationPreferences": ["Equity"]
        })))
        .unwrap_err();

        assert_eq!(
            kinds(err),
            vec![
                ("investmentAmount", ValidationKind::InvalidAmount),
                ("expectedReturn", ValidationKind::InvalidReturn),
            ]
        );
    }
}
