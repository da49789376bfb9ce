//! # Configuration
//!
//! Rotation settings that are not part of a rotation request. Defaults suit the usual layout of a
//! single `jwks.json` document at the root of the container; each setting may be overridden by an
//! environment variable.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Err;
use crate::{tracerr, Result};

/// Default name of the published key set document.
pub const DEFAULT_KEY_SET_NAME: &str = "jwks.json";

/// Default value of the `purpose` tag applied to every key created.
pub const DEFAULT_KEY_PURPOSE: &str = "auto-rotate-test";

const JSON_CONTENT_TYPE: &str = "application/json";
const BACKUP_MARKER: &str = "bkp";

/// Rotation configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Canonical name of the key set document within its container.
    pub key_set_name: String,

    /// Value of the `purpose` tag applied to created keys.
    pub key_purpose_tag: String,

    /// Content type used when writing key set documents.
    pub content_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_set_name: DEFAULT_KEY_SET_NAME.to_string(),
            key_purpose_tag: DEFAULT_KEY_PURPOSE.to_string(),
            content_type: JSON_CONTENT_TYPE.to_string(),
        }
    }
}

impl Config {
    /// Build configuration from defaults overridden by environment variables.
    ///
    /// | Variable            | Description                                         |
    /// |---------------------|-----------------------------------------------------|
    /// | `JWKS_OBJECT_NAME`  | Name of the key set document (default `jwks.json`). |
    /// | `JWKS_KEY_PURPOSE`  | Value of the `purpose` tag on created keys.         |
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - A variable is set but blank or not valid unicode.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(name) = env_override("JWKS_OBJECT_NAME")? {
            config.key_set_name = name;
        }
        if let Some(purpose) = env_override("JWKS_KEY_PURPOSE")? {
            config.key_purpose_tag = purpose;
        }
        Ok(config)
    }

    /// Name of the backup written for the key set at `at`.
    ///
    /// The timestamp, `discriminator` and backup marker are inserted before the extension, so
    /// `jwks.json` backs up to `jwks-2026-10-19T08:00:00.000Z-3f2a9c1e.bkp.json`. Callers pass a
    /// fresh discriminator per backup so backups taken in the same millisecond do not collide.
    #[must_use]
    pub fn backup_name(&self, at: DateTime<Utc>, discriminator: &str) -> String {
        let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        match self.key_set_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => {
                format!("{stem}-{stamp}-{discriminator}.{BACKUP_MARKER}.{ext}")
            }
            _ => format!("{}-{stamp}-{discriminator}.{BACKUP_MARKER}", self.key_set_name),
        }
    }

    /// Edge cache paths to invalidate after a publish.
    #[must_use]
    pub fn invalidation_paths(&self) -> Vec<String> {
        vec![format!("/{}", self.key_set_name.trim_start_matches('/'))]
    }
}

fn env_override(var: &str) -> Result<Option<String>> {
    match std::env::var(var) {
        Ok(value) if value.trim().is_empty() => {
            tracerr!(Err::InvalidConfig, "{var} environment variable is set but blank")
        }
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => {
            tracerr!(Err::InvalidConfig, "{var} environment variable is not valid unicode")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, PoisonError};

    use chrono::TimeZone;

    use super::*;

    // Tests reading or changing the process environment hold this lock.
    static ENV: Mutex<()> = Mutex::new(());

    fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV.lock().unwrap_or_else(PoisonError::into_inner);
        for (var, value) in vars {
            match value {
                Some(value) => std::env::set_var(var, value),
                None => std::env::remove_var(var),
            }
        }
        let result = f();
        for (var, _) in vars {
            std::env::remove_var(var);
        }
        result
    }

    #[test]
    fn env_overrides_defaults() {
        let config = with_env(
            &[("JWKS_OBJECT_NAME", Some("keys.json")), ("JWKS_KEY_PURPOSE", Some("prod-signing"))],
            Config::from_env,
        )
        .expect("should load");

        assert_eq!(config.key_set_name, "keys.json");
        assert_eq!(config.key_purpose_tag, "prod-signing");
        assert_eq!(config.content_type, "application/json");
    }

    #[test]
    fn unset_env_keeps_defaults() {
        let config =
            with_env(&[("JWKS_OBJECT_NAME", None), ("JWKS_KEY_PURPOSE", None)], Config::from_env)
                .expect("should load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn blank_env_is_invalid_config() {
        let err = with_env(
            &[("JWKS_OBJECT_NAME", Some("  ")), ("JWKS_KEY_PURPOSE", None)],
            Config::from_env,
        )
        .expect_err("should fail");

        assert!(err.is(Err::InvalidConfig));
        assert!(err.to_string().contains("JWKS_OBJECT_NAME"));
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).single().expect("valid date")
    }

    #[test]
    fn backup_name_keeps_extension() {
        let config = Config::default();
        assert_eq!(
            config.backup_name(at(), "3f2a9c1e"),
            "jwks-2026-10-19T08:00:00.000Z-3f2a9c1e.bkp.json"
        );
    }

    #[test]
    fn backup_name_without_extension() {
        let config = Config {
            key_set_name: "keys".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.backup_name(at(), "3f2a9c1e"),
            "keys-2026-10-19T08:00:00.000Z-3f2a9c1e.bkp"
        );
    }

    #[test]
    fn backup_name_is_distinct_from_canonical() {
        let config = Config::default();
        assert_ne!(config.backup_name(at(), "3f2a9c1e"), config.key_set_name);
    }

    #[test]
    fn invalidation_path_is_rooted() {
        let config = Config::default();
        assert_eq!(config.invalidation_paths(), vec!["/jwks.json".to_string()]);

        let nested = Config {
            key_set_name: "/.well-known/jwks.json".to_string(),
            ..Config::default()
        };
        assert_eq!(nested.invalidation_paths(), vec!["/.well-known/jwks.json".to_string()]);
    }
}
