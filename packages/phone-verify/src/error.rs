//! Verification error taxonomy.
//!
//! Every provider failure is mapped into [`VerificationError`] before it
//! reaches the flow (see [`crate::classify`]). Nothing here is fatal: each
//! variant is recoverable by the user through `send_challenge` or `resend`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum VerificationError {
    #[error("phone number must be exactly 10 digits")]
    InvalidPhoneNumber,

    #[error("verification code must be exactly 6 digits")]
    InvalidCodeFormat,

    #[error("a verification request is already in progress")]
    AlreadyInProgress,

    #[error("bot filter failed to initialize")]
    BotFilterInitFailed,

    #[error("too many verification attempts")]
    RateLimited,

    #[error("bot filter check was rejected by the provider")]
    BotFilterRejected,

    #[error("verification provider is misconfigured")]
    ProviderConfigError,

    #[error("verification code is incorrect")]
    InvalidCode,

    #[error("verification code has expired")]
    CodeExpired,

    #[error("verification failed")]
    Unknown,

    #[error("phone number is already verified")]
    AlreadyVerified,

    #[error("no active challenge; request a new code")]
    NoActiveChallenge,

    #[error("verification session is closed")]
    SessionClosed,

    #[error("verification request was cancelled")]
    Cancelled,
}

impl VerificationError {
    /// Message shown next to the phone field.
    pub fn user_message(&self) -> &'static str {
        match self {
            VerificationError::InvalidPhoneNumber => {
                "Please enter a valid 10-digit phone number."
            }
            VerificationError::InvalidCodeFormat => "Please enter the 6-digit code.",
            VerificationError::AlreadyInProgress => "Please wait, verification is in progress.",
            VerificationError::BotFilterInitFailed => {
                "Could not load the security check. Please refresh and try again."
            }
            VerificationError::RateLimited => "Too many attempts. Please try again later.",
            VerificationError::BotFilterRejected => {
                "Security check failed. Please try again."
            }
            VerificationError::ProviderConfigError => {
                "Phone verification is unavailable right now. Please contact us directly."
            }
            VerificationError::InvalidCode => "Invalid code. Please check and try again.",
            VerificationError::CodeExpired => "This code has expired. Please request a new one.",
            VerificationError::Unknown => "Failed to verify your phone number. Please try again.",
            VerificationError::AlreadyVerified => "Your phone number is already verified.",
            VerificationError::NoActiveChallenge => "Please request a new code.",
            VerificationError::SessionClosed | VerificationError::Cancelled => {
                "Verification was interrupted. Please start again."
            }
        }
    }
}
