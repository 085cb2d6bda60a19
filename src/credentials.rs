//! Google Ads credentials: environment defaults merged with per-request overrides.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::types::lenient_string;

/// A possibly-incomplete set of credential values. Used both for the
/// environment defaults held in `Config` and for request overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialSet {
    #[serde(default)]
    pub developer_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub login_customer_id: Option<String>,
}

/// Complete credentials for one upstream client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Digits only.
    pub login_customer_id: Option<String>,
}

impl Credentials {
    /// Merge `overrides` over `defaults`. Empty override values are ignored.
    pub fn build(defaults: &CredentialSet, overrides: Option<&CredentialSet>) -> Result<Self> {
        let pick = |default: &Option<String>, over: Option<&Option<String>>| -> Option<String> {
            over.and_then(|o| o.as_deref())
                .filter(|v| !v.is_empty())
                .or(default.as_deref())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let developer_token = pick(&defaults.developer_token, overrides.map(|o| &o.developer_token));
        let client_id = pick(&defaults.client_id, overrides.map(|o| &o.client_id));
        let client_secret = pick(&defaults.client_secret, overrides.map(|o| &o.client_secret));
        let refresh_token = pick(&defaults.refresh_token, overrides.map(|o| &o.refresh_token));
        let login_customer_id = pick(&defaults.login_customer_id, overrides.map(|o| &o.login_customer_id))
            .and_then(|id| sanitize_customer_id(&id));

        let missing: Vec<&str> = [
            ("developer_token", developer_token.is_none()),
            ("client_id", client_id.is_none()),
            ("client_secret", client_secret.is_none()),
            ("refresh_token", refresh_token.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name)
        .collect();

        match (developer_token, client_id, client_secret, refresh_token) {
            (Some(developer_token), Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(Self {
                developer_token,
                client_id,
                client_secret,
                refresh_token,
                login_customer_id,
            }),
            _ => Err(AppError::Validation(format!(
                "Missing required credentials: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Strip dashes from a customer id ("123-456-7890" → "1234567890"). Empty → None.
pub fn sanitize_customer_id(id: &str) -> Option<String> {
    let cleaned: String = id.chars().filter(|c| *c != '-').collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_defaults() -> CredentialSet {
        CredentialSet {
            developer_token: Some("dev".into()),
            client_id: Some("cid".into()),
            client_secret: Some("secret".into()),
            refresh_token: Some("refresh".into()),
            login_customer_id: Some("123-456-7890".into()),
        }
    }

    #[test]
    fn defaults_only() {
        let c = Credentials::build(&full_defaults(), None).unwrap();
        assert_eq!(c.developer_token, "dev");
        assert_eq!(c.login_customer_id.as_deref(), Some("1234567890"));
    }

    #[test]
    fn overrides_replace_defaults() {
        let over = CredentialSet {
            developer_token: Some("dev2".into()),
            login_customer_id: Some("999-000".into()),
            ..Default::default()
        };
        let c = Credentials::build(&full_defaults(), Some(&over)).unwrap();
        assert_eq!(c.developer_token, "dev2");
        assert_eq!(c.client_id, "cid");
        assert_eq!(c.login_customer_id.as_deref(), Some("999000"));
    }

    #[test]
    fn empty_override_keeps_default() {
        let over = CredentialSet { client_secret: Some(String::new()), ..Default::default() };
        let c = Credentials::build(&full_defaults(), Some(&over)).unwrap();
        assert_eq!(c.client_secret, "secret");
    }

    #[test]
    fn missing_fields_are_listed_in_order() {
        let defaults = CredentialSet { client_id: Some("cid".into()), ..Default::default() };
        let err = Credentials::build(&defaults, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required credentials: developer_token, client_secret, refresh_token"
        );
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn customer_id_is_optional() {
        let mut defaults = full_defaults();
        defaults.login_customer_id = Some("--".into());
        let c = Credentials::build(&defaults, None).unwrap();
        assert!(c.login_customer_id.is_none());
    }

    #[test]
    fn numeric_customer_id_override_deserializes() {
        let over: CredentialSet = serde_json::from_str(r#"{"login_customer_id": 1234567890}"#).unwrap();
        assert_eq!(over.login_customer_id.as_deref(), Some("1234567890"));
    }
}
