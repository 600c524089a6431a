use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Service configuration, read once at startup. Credentials and bot
/// identifiers are required; network knobs have defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_id: i32,
    pub api_hash: String,
    /// Base64 session blob produced by the login tool.
    pub session: String,
    /// Secondary persona attached for the duration of each flow.
    pub seller_bot: String,
    /// Default persona restored after each flow.
    pub primary_bot: String,
    pub host: String,
    pub port: u16,
    pub reply_timeout: Duration,
    pub download_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => bail!("{name} is not set"),
            }
        };

        let api_id: i32 = required("STARSELL_API_ID")?
            .parse()
            .context("STARSELL_API_ID must be numeric")?;
        let port: u16 = match lookup("STARSELL_PORT") {
            Some(value) => value.parse().context("STARSELL_PORT must be a port number")?,
            None => 8000,
        };
        let seconds = |name: &str, default: u64| -> Result<Duration> {
            let secs = match lookup(name) {
                Some(value) => value
                    .parse()
                    .with_context(|| format!("{name} must be a number of seconds"))?,
                None => default,
            };
            Ok(Duration::from_secs(secs))
        };

        Ok(Self {
            api_id,
            api_hash: required("STARSELL_API_HASH")?,
            session: required("STARSELL_SESSION")?,
            seller_bot: strip_at(required("STARSELL_SELLER_BOT")?),
            primary_bot: strip_at(required("STARSELL_PRIMARY_BOT")?),
            host: lookup("STARSELL_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            reply_timeout: seconds("STARSELL_REPLY_TIMEOUT_SECS", 30)?,
            download_timeout: seconds("STARSELL_DOWNLOAD_TIMEOUT_SECS", 60)?,
        })
    }
}

fn strip_at(username: String) -> String {
    username.trim_start_matches('@').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn minimal() -> HashMap<String, String> {
        env(&[
            ("STARSELL_API_ID", "12345"),
            ("STARSELL_API_HASH", "abcdef"),
            ("STARSELL_SESSION", "c2Vzc2lvbg=="),
            ("STARSELL_SELLER_BOT", "@sellerbot"),
            ("STARSELL_PRIMARY_BOT", "primarybot"),
        ])
    }

    fn load(vars: &HashMap<String, String>) -> Result<Config> {
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn applies_defaults_and_strips_leading_at() {
        let config = load(&minimal()).unwrap();

        assert_eq!(config.api_id, 12345);
        assert_eq!(config.seller_bot, "sellerbot");
        assert_eq!(config.primary_bot, "primarybot");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.reply_timeout, Duration::from_secs(30));
        assert_eq!(config.download_timeout, Duration::from_secs(60));
    }

    #[test]
    fn missing_required_variable_is_fatal() {
        let mut vars = minimal();
        vars.remove("STARSELL_SESSION");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("STARSELL_SESSION"));
    }

    #[test]
    fn non_numeric_app_id_is_fatal() {
        let mut vars = minimal();
        vars.insert("STARSELL_API_ID".into(), "not-a-number".into());

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("STARSELL_API_ID"));
    }

    #[test]
    fn overrides_are_honored() {
        let mut vars = minimal();
        vars.insert("STARSELL_PORT".into(), "9090".into());
        vars.insert("STARSELL_REPLY_TIMEOUT_SECS".into(), "5".into());

        let config = load(&vars).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.reply_timeout, Duration::from_secs(5));
    }
}
