//! Admin API key authentication extractor.
//!
//! Admin keys are configured as SHA-256 digests in `admin.api_key_hashes`;
//! the plain key never reaches configuration or logs.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::config::AdminConfig;
use crate::error::ApiError;
use shared::crypto::{digests_match, extract_key_prefix, sha256_hex};

const INVALID_KEY: &str = "Invalid or missing API key";

/// Authenticated admin key information.
#[derive(Debug, Clone)]
pub struct AdminKey {
    /// Key prefix for identification in logs (e.g., "testadmi").
    pub key_prefix: String,
}

impl AdminKey {
    /// Validates an admin key against the configured digests.
    pub fn validate(config: &AdminConfig, api_key: &str) -> Result<Self, ApiError> {
        let key_prefix = extract_key_prefix(api_key)
            .ok_or_else(|| ApiError::Unauthorized(INVALID_KEY.to_string()))?;

        let key_hash = sha256_hex(api_key);
        let known = config
            .api_key_hashes
            .iter()
            .any(|hash| digests_match(&hash.to_ascii_lowercase(), &key_hash));

        if !known {
            return Err(ApiError::Unauthorized(INVALID_KEY.to_string()));
        }

        Ok(AdminKey {
            key_prefix: key_prefix.to_string(),
        })
    }
}

/// Reads the key placed in request extensions by `require_admin`.
#[async_trait]
impl<S> FromRequestParts<S> for AdminKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminKey>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized(INVALID_KEY.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(key: &str) -> AdminConfig {
        AdminConfig {
            api_key_hashes: vec![sha256_hex(key)],
        }
    }

    #[test]
    fn test_validate_known_key() {
        let config = config_for("fx_testadminkey1");
        let admin = AdminKey::validate(&config, "fx_testadminkey1").unwrap();
        assert_eq!(admin.key_prefix, "testadmi");
    }

    #[test]
    fn test_validate_accepts_uppercase_digest() {
        let config = AdminConfig {
            api_key_hashes: vec![sha256_hex("fx_testadminkey1").to_ascii_uppercase()],
        };
        assert!(AdminKey::validate(&config, "fx_testadminkey1").is_ok());
    }

    #[test]
    fn test_validate_unknown_key() {
        let config = config_for("fx_testadminkey1");
        assert!(matches!(
            AdminKey::validate(&config, "fx_otheradminkey"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_shape() {
        let config = config_for("pm_testadminkey1");
        assert!(AdminKey::validate(&config, "pm_testadminkey1").is_err());
        assert!(AdminKey::validate(&config, "fx_short").is_err());
        assert!(AdminKey::validate(&config, "").is_err());
    }

    #[test]
    fn test_validate_with_no_configured_keys() {
        let config = AdminConfig {
            api_key_hashes: Vec::new(),
        };
        assert!(AdminKey::validate(&config, "fx_testadminkey1").is_err());
    }
}
