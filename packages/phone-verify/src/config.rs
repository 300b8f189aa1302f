use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use twilio::TwilioOptions;

const DEFAULT_COUNTRY_CODE: &str = "91";
const DEFAULT_CHALLENGE_TTL_SECS: u64 = 600;
const DEFAULT_BOT_FILTER_CONTAINER: &str = "recaptcha-container";

/// Where and how the bot-filter widget is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotFilterConfig {
    pub container: String,
    pub visible: bool,
}

/// Verification flow configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyConfig {
    /// Country calling code without the leading `+`.
    pub country_code: String,
    /// How long an issued challenge is accepted before it is treated as expired.
    pub challenge_ttl: Duration,
    pub bot_filter: BotFilterConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            challenge_ttl: Duration::from_secs(DEFAULT_CHALLENGE_TTL_SECS),
            bot_filter: BotFilterConfig {
                container: DEFAULT_BOT_FILTER_CONTAINER.to_string(),
                visible: false,
            },
        }
    }
}

impl VerifyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let country_code = env::var("VERIFY_COUNTRY_CODE")
            .unwrap_or_else(|_| DEFAULT_COUNTRY_CODE.to_string())
            .trim_start_matches('+')
            .to_string();
        if country_code.is_empty() || !country_code.bytes().all(|b| b.is_ascii_digit()) {
            anyhow::bail!("VERIFY_COUNTRY_CODE must be numeric, got {:?}", country_code);
        }

        let ttl_secs: u64 = env::var("VERIFY_CHALLENGE_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_CHALLENGE_TTL_SECS.to_string())
            .parse()
            .context("VERIFY_CHALLENGE_TTL_SECS must be a valid number")?;

        let visible = match env::var("VERIFY_BOT_FILTER_VISIBLE") {
            Ok(raw) => parse_bool(&raw)
                .context("VERIFY_BOT_FILTER_VISIBLE must be true or false")?,
            Err(_) => false,
        };

        Ok(Self {
            country_code,
            challenge_ttl: Duration::from_secs(ttl_secs),
            bot_filter: BotFilterConfig {
                container: env::var("VERIFY_BOT_FILTER_CONTAINER")
                    .unwrap_or_else(|_| DEFAULT_BOT_FILTER_CONTAINER.to_string()),
                visible,
            },
        })
    }
}

/// Load Twilio Verify credentials from environment variables
pub fn twilio_options_from_env() -> Result<TwilioOptions> {
    let _ = dotenv();

    Ok(TwilioOptions {
        account_sid: env::var("TWILIO_ACCOUNT_SID").context("TWILIO_ACCOUNT_SID must be set")?,
        auth_token: env::var("TWILIO_AUTH_TOKEN").context("TWILIO_AUTH_TOKEN must be set")?,
        service_id: env::var("TWILIO_VERIFY_SERVICE_SID")
            .context("TWILIO_VERIFY_SERVICE_SID must be set")?,
        base_url: env::var("TWILIO_VERIFY_BASE_URL").ok(),
    })
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => anyhow::bail!("not a boolean: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_india_with_invisible_widget() {
        let config = VerifyConfig::default();
        assert_eq!(config.country_code, "91");
        assert_eq!(config.challenge_ttl, Duration::from_secs(600));
        assert!(!config.bot_filter.visible);
    }

    #[test]
    fn parses_boolean_flags() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool(" no ").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
