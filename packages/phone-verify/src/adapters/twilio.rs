//! TwilioService adapter (implements ChallengeProvider)
//!
//! Translates Twilio Verify error codes into the provider-code vocabulary the
//! classification table understands.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use twilio::{Channel, TwilioError, TwilioService};

use crate::classify::{
    ProviderOperation, CODE_EXPIRED, INVALID_APP_CREDENTIAL, INVALID_PHONE_NUMBER,
    INVALID_VERIFICATION_CODE, TOO_MANY_REQUESTS,
};
use crate::traits::{ChallengeHandle, ChallengeProvider, ProviderError, WidgetHandle};

/// Wrapper around TwilioService that implements ChallengeProvider
pub struct TwilioChallengeProvider(pub Arc<TwilioService>);

impl TwilioChallengeProvider {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

/// Provider code for a Twilio failure during `operation`.
pub fn provider_code(operation: ProviderOperation, error: &TwilioError) -> &'static str {
    match (operation, error.api_code()) {
        // Invalid `To`, invalid number, landline
        (_, Some(60200 | 21211 | 60205)) => INVALID_PHONE_NUMBER,
        // Max send attempts, rate limited, max check attempts
        (_, Some(60203 | 20429 | 60202)) => TOO_MANY_REQUESTS,
        (_, Some(20003)) => INVALID_APP_CREDENTIAL,
        // Unknown service on issue; verification gone (expired or consumed) on confirm
        (ProviderOperation::Issue, Some(20404)) => INVALID_APP_CREDENTIAL,
        (ProviderOperation::Confirm, Some(20404)) => CODE_EXPIRED,
        _ => "unknown",
    }
}

fn to_provider_error(operation: ProviderOperation, error: TwilioError) -> ProviderError {
    ProviderError::new(provider_code(operation, &error), error.to_string())
}

#[async_trait]
impl ChallengeProvider for TwilioChallengeProvider {
    async fn issue_challenge(
        &self,
        full_phone_number: &str,
        human_proof: &WidgetHandle,
    ) -> Result<ChallengeHandle, ProviderError> {
        // Twilio Verify has no captcha gate of its own; the token is only traced
        debug!(widget = %human_proof, "Sending Twilio verification");
        let verification = self
            .0
            .send_verification(full_phone_number, Channel::for_recipient(full_phone_number))
            .await
            .map_err(|e| to_provider_error(ProviderOperation::Issue, e))?;

        Ok(ChallengeHandle::new(verification.sid))
    }

    async fn confirm_challenge(
        &self,
        handle: &ChallengeHandle,
        code: &str,
    ) -> Result<(), ProviderError> {
        let check = self
            .0
            .check_verification(handle.as_str(), code)
            .await
            .map_err(|e| to_provider_error(ProviderOperation::Confirm, e))?;

        if check.is_approved() {
            return Ok(());
        }
        match check.status.as_str() {
            "expired" | "canceled" => Err(ProviderError::new(
                CODE_EXPIRED,
                format!("verification {}", check.status),
            )),
            _ => Err(ProviderError::new(
                INVALID_VERIFICATION_CODE,
                "code did not match",
            )),
        }
    }
}
