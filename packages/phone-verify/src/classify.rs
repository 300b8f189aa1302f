//! Provider error code → [`VerificationError`] mapping.
//!
//! The flow never inspects provider codes itself; it asks this table. Codes
//! may carry an `auth/` namespace prefix, which is ignored.

use serde::{Deserialize, Serialize};

use crate::error::VerificationError;

/// Which provider call produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderOperation {
    Issue,
    Confirm,
}

pub const INVALID_PHONE_NUMBER: &str = "invalid-phone-number";
pub const TOO_MANY_REQUESTS: &str = "too-many-requests";
pub const CAPTCHA_CHECK_FAILED: &str = "captcha-check-failed";
pub const INVALID_APP_CREDENTIAL: &str = "invalid-app-credential";
pub const INVALID_VERIFICATION_CODE: &str = "invalid-verification-code";
pub const CODE_EXPIRED: &str = "code-expired";

const ISSUE_ERRORS: &[(&str, VerificationError)] = &[
    (INVALID_PHONE_NUMBER, VerificationError::InvalidPhoneNumber),
    (TOO_MANY_REQUESTS, VerificationError::RateLimited),
    (CAPTCHA_CHECK_FAILED, VerificationError::BotFilterRejected),
    (INVALID_APP_CREDENTIAL, VerificationError::ProviderConfigError),
];

const CONFIRM_ERRORS: &[(&str, VerificationError)] = &[
    (INVALID_VERIFICATION_CODE, VerificationError::InvalidCode),
    (CODE_EXPIRED, VerificationError::CodeExpired),
];

/// Map a provider error code to the flow's taxonomy. Unrecognized codes are `Unknown`.
pub fn classify(operation: ProviderOperation, code: &str) -> VerificationError {
    let code = code.trim();
    let code = code.strip_prefix("auth/").unwrap_or(code);
    let table = match operation {
        ProviderOperation::Issue => ISSUE_ERRORS,
        ProviderOperation::Confirm => CONFIRM_ERRORS,
    };

    table
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, error)| *error)
        .unwrap_or(VerificationError::Unknown)
}

/// The full table, for diagnostics.
pub fn known_codes(operation: ProviderOperation) -> &'static [(&'static str, VerificationError)] {
    match operation {
        ProviderOperation::Issue => ISSUE_ERRORS,
        ProviderOperation::Confirm => CONFIRM_ERRORS,
    }
}
