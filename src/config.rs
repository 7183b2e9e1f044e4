use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Longest accepted token lifetime: seven days.
pub const MAX_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Answer both unknown-user and wrong-password logins with the same body.
    pub login_generic_errors: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            ttl_minutes: match lookup("JWT_TTL_MINUTES") {
                Some(v) => v
                    .parse::<i64>()
                    .ok()
                    .filter(|m| (1..=MAX_TTL_MINUTES).contains(m))
                    .ok_or(ConfigError::Invalid {
                        name: "JWT_TTL_MINUTES",
                        value: v,
                    })?,
                None => 60,
            },
        };
        let login_generic_errors = match lookup("LOGIN_GENERIC_ERRORS").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOGIN_GENERIC_ERRORS",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            database_url,
            jwt,
            login_generic_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn loads_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/stitchbook"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");
        assert_eq!(cfg.jwt.secret, "s3cret");
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert!(!cfg.login_generic_errors);
    }

    #[test]
    fn missing_secret_fails_fast() {
        let err = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/stitchbook",
        )]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn blank_secret_is_missing() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/stitchbook"),
            ("JWT_SECRET", "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn rejects_bad_ttl_and_flag() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/stitchbook"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_MINUTES", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_TTL_MINUTES", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/stitchbook"),
            ("JWT_SECRET", "s3cret"),
            ("LOGIN_GENERIC_ERRORS", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "LOGIN_GENERIC_ERRORS", .. }));
    }

    #[test]
    fn generic_login_errors_flag() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/stitchbook"),
            ("JWT_SECRET", "s3cret"),
            ("LOGIN_GENERIC_ERRORS", "true"),
        ]))
        .expect("config should load");
        assert!(cfg.login_generic_errors);
    }

    #[test]
    fn ttl_above_bound_is_rejected() {
        let base = [
            ("DATABASE_URL", "postgres://localhost/stitchbook"),
            ("JWT_SECRET", "s3cret"),
        ];
        let max = MAX_TTL_MINUTES.to_string();
        let cfg = AppConfig::from_lookup(lookup_from(&[base[0], base[1], ("JWT_TTL_MINUTES", max.as_str())]))
            .expect("upper bound is accepted");
        assert_eq!(cfg.jwt.ttl_minutes, MAX_TTL_MINUTES);

        for value in ["10081", "1000000000000", "0", "-5"] {
            let err = AppConfig::from_lookup(lookup_from(&[
                base[0],
                base[1],
                ("JWT_TTL_MINUTES", value),
            ]))
            .unwrap_err();
            assert_eq!(
                err,
                ConfigError::Invalid {
                    name: "JWT_TTL_MINUTES",
                    value: value.to_string()
                }
            );
        }
    }
}
