//! Shop roster configuration.
//!
//! One entry per physical store, loaded from a YAML file at startup and
//! passed explicitly to the orchestrator. Credentials are never part of the
//! roster; each shop's login blob lives in its own env var, named by
//! [`ShopConfig::credential_env_var`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Static configuration for one retail location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Short roster key, e.g. `"SC"`. Also names the credential env var.
    pub key: String,
    /// External numeric store code assigned by the POS, e.g. `"66220"`.
    pub code: String,
    /// Display name written into every persisted record.
    pub name: String,
    /// Login email for the POS fetch headers. May be overridden by the
    /// `user.email` field of the credential blob at run time.
    pub email: String,
}

impl ShopConfig {
    /// Name of the env var holding this shop's opaque credential blob.
    #[must_use]
    pub fn credential_env_var(&self) -> String {
        format!("TILLSYNC_POS_CRED_{}", self.key.to_uppercase())
    }
}

#[derive(Debug, Deserialize)]
pub struct ShopsFile {
    pub shops: Vec<ShopConfig>,
}

impl ShopsFile {
    /// Select the shops to process for a run.
    ///
    /// `None` selects the whole roster. `Some(keys)` selects only the listed
    /// keys, preserving roster order; unknown keys are silently ignored so a
    /// stale caller cannot abort a run.
    #[must_use]
    pub fn select(&self, keys: Option<&[String]>) -> Vec<ShopConfig> {
        match keys {
            None => self.shops.clone(),
            Some(keys) => self
                .shops
                .iter()
                .filter(|s| keys.iter().any(|k| k == &s.key))
                .cloned()
                .collect(),
        }
    }
}

/// Load and validate the shop roster from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_shops(path: &Path) -> Result<ShopsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ShopsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let shops_file: ShopsFile = serde_yaml::from_str(&content)?;

    validate_shops(&shops_file)?;

    Ok(shops_file)
}

fn validate_shops(shops_file: &ShopsFile) -> Result<(), ConfigError> {
    if shops_file.shops.is_empty() {
        return Err(ConfigError::Validation(
            "shops file must define at least one shop".to_string(),
        ));
    }

    let mut seen_keys = HashSet::new();
    let mut seen_codes = HashSet::new();

    for shop in &shops_file.shops {
        for (field, value) in [
            ("key", &shop.key),
            ("code", &shop.code),
            ("name", &shop.name),
            ("email", &shop.email),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "shop {field} must be non-empty"
                )));
            }
        }

        if !seen_keys.insert(shop.key.to_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate shop key: '{}'",
                shop.key
            )));
        }

        if !seen_codes.insert(shop.code.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate shop code: '{}' (from shop '{}')",
                shop.code, shop.key
            )));
        }
    }

    Ok(())
}
