//! Minimal client for the Twilio Verify v2 API.
//!
//! Only the two calls an OTP flow needs: start a verification and check a code
//! against it. Errors keep Twilio's numeric error code so callers can classify
//! them.

use std::collections::HashMap;

pub mod models;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, error};

pub use crate::models::{ApiErrorBody, Channel, Verification, VerificationCheck};

const DEFAULT_BASE_URL: &str = "https://verify.twilio.com/v2";

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub service_id: String,
    /// Overrides the Verify API root (tests, regional edges).
    pub base_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum TwilioError {
    #[error("twilio api error {code:?} (http {status}): {message}")]
    Api {
        status: u16,
        code: Option<u32>,
        message: String,
    },

    #[error("request to twilio failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode twilio response: {0}")]
    Decode(String),
}

impl TwilioError {
    /// Build an `Api` error from a non-success status and its raw body.
    pub fn from_response_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => TwilioError::Api {
                status: parsed.status.unwrap_or(status.as_u16()),
                code: parsed.code,
                message: parsed
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            },
            Err(_) => TwilioError::Api {
                status: status.as_u16(),
                code: None,
                message: body.to_string(),
            },
        }
    }

    /// Twilio's numeric error code, when the API supplied one.
    pub fn api_code(&self) -> Option<u32> {
        match self {
            TwilioError::Api { code, .. } => *code,
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn service_url(&self, path: &str) -> String {
        let base = self
            .options
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!(
            "{base}/Services/{serv_id}/{path}",
            serv_id = self.options.service_id
        )
    }

    fn form_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers
    }

    /// Start a verification; Twilio sends the code over `channel`.
    pub async fn send_verification(
        &self,
        recipient: &str,
        channel: Channel,
    ) -> Result<Verification, TwilioError> {
        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", recipient);
        form_body.insert("Channel", channel.as_str());

        debug!(channel = channel.as_str(), "Starting Twilio verification");
        self.post_form(self.service_url("Verifications"), &form_body)
            .await
    }

    /// Check `code` against an existing verification.
    pub async fn check_verification(
        &self,
        verification_sid: &str,
        code: &str,
    ) -> Result<VerificationCheck, TwilioError> {
        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("VerificationSid", verification_sid);
        form_body.insert("Code", code);

        self.post_form(self.service_url("VerificationCheck"), &form_body)
            .await
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        form_body: &HashMap<&str, &str>,
    ) -> Result<T, TwilioError> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .headers(Self::form_headers())
            .form(form_body)
            .send()
            .await
            .map_err(|e| {
                error!("Request to Twilio failed: {}", e);
                TwilioError::Http(e)
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let err = TwilioError::from_response_body(status, &body);
            error!("Twilio error ({}): {}", status, err);
            return Err(err);
        }

        serde_json::from_str::<T>(&body).map_err(|e| TwilioError::Decode(e.to_string()))
    }
}
