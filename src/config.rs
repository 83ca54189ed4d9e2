use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::domain::order::StockPolicy;

/// One year.
const MAX_CART_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub gateway_url: String,
    pub key_id: String,
    /// Also the HMAC key for payment signatures.
    pub key_secret: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Emails are only logged when unset.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub payment: PaymentConfig,
    pub email: EmailConfig,
    pub cart_ttl: chrono::Duration,
    pub cart_sweep_interval: Duration,
    pub stock_policy: StockPolicy,
}

impl AppConfig {
    /// Reads configuration from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));
        let or_default =
            |name: &str, default: &str| optional(name).unwrap_or_else(|| default.to_string());

        let port = parse(&or_default("PORT", "8080"), "PORT")?;
        let cart_ttl_minutes: i64 =
            parse(&or_default("CART_TTL_MINUTES", "120"), "CART_TTL_MINUTES")?;
        if !(1..=MAX_CART_TTL_MINUTES).contains(&cart_ttl_minutes) {
            return Err(ConfigError::Invalid {
                var: "CART_TTL_MINUTES",
                reason: format!("must be between 1 and {MAX_CART_TTL_MINUTES}"),
            });
        }
        let sweep_secs: u64 = parse(
            &or_default("CART_SWEEP_INTERVAL_SECS", "600"),
            "CART_SWEEP_INTERVAL_SECS",
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "CART_SWEEP_INTERVAL_SECS",
                reason: "must be positive".to_string(),
            });
        }
        let stock_policy = or_default("STOCK_POLICY", "check_then_act")
            .parse::<StockPolicy>()
            .map_err(|reason| ConfigError::Invalid {
                var: "STOCK_POLICY",
                reason,
            })?;

        Ok(Self {
            host: or_default("HOST", "0.0.0.0"),
            port,
            database_url: required("DATABASE_URL")?,
            session_secret: required("SESSION_SECRET")?,
            payment: PaymentConfig {
                gateway_url: or_default("PAYMENT_GATEWAY_URL", "https://api.razorpay.com"),
                key_id: required("PAYMENT_KEY_ID")?,
                key_secret: required("PAYMENT_KEY_SECRET")?,
                currency: or_default("PAYMENT_CURRENCY", "INR"),
            },
            email: EmailConfig {
                api_url: optional("EMAIL_API_URL"),
                api_key: optional("EMAIL_API_KEY"),
                sender: or_default("EMAIL_SENDER", "noreply@example.com"),
            },
            cart_ttl: chrono::Duration::minutes(cart_ttl_minutes),
            cart_sweep_interval: Duration::from_secs(sweep_secs),
            stock_policy,
        })
    }
}

fn parse<T>(value: &str, var: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("SESSION_SECRET", "session"),
            ("PAYMENT_KEY_ID", "rzp_test_key"),
            ("PAYMENT_KEY_SECRET", "rzp_test_secret"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let cfg = load(&base()).expect("config should load");

        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.payment.currency, "INR");
        assert_eq!(cfg.cart_ttl, chrono::Duration::hours(2));
        assert_eq!(cfg.cart_sweep_interval, Duration::from_secs(600));
        assert_eq!(cfg.stock_policy, StockPolicy::CheckThenAct);
        assert!(cfg.email.api_url.is_none());
    }

    #[test]
    fn missing_payment_secret_is_reported() {
        let mut vars = base();
        vars.remove("PAYMENT_KEY_SECRET");
        let err = load(&vars).unwrap_err();
        assert_eq!(err.to_string(), "PAYMENT_KEY_SECRET must be set");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut vars = base();
        vars.insert("DATABASE_URL", "   ");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn invalid_port_and_policy_are_rejected() {
        let mut vars = base();
        vars.insert("PORT", "eighty");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));

        let mut vars = base();
        vars.insert("STOCK_POLICY", "yolo");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                var: "STOCK_POLICY",
                ..
            })
        ));
    }

    #[test]
    fn guarded_policy_and_ttl_are_read() {
        let mut vars = base();
        vars.insert("STOCK_POLICY", "guarded");
        vars.insert("CART_TTL_MINUTES", "30");
        let cfg = load(&vars).expect("config should load");
        assert_eq!(cfg.stock_policy, StockPolicy::Guarded);
        assert_eq!(cfg.cart_ttl, chrono::Duration::minutes(30));
    }

    #[test]
    fn ttl_outside_one_minute_to_one_year_is_rejected() {
        for ttl in ["0", "525601", "9223372036854775807"] {
            let mut vars = base();
            vars.insert("CART_TTL_MINUTES", ttl);
            assert!(
                matches!(
                    load(&vars),
                    Err(ConfigError::Invalid {
                        var: "CART_TTL_MINUTES",
                        ..
                    })
                ),
                "{ttl} should be rejected"
            );
        }

        let mut vars = base();
        vars.insert("CART_TTL_MINUTES", "525600");
        assert!(load(&vars).is_ok());
    }
}
