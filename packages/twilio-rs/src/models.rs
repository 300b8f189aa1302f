use serde::{Deserialize, Serialize};

/// Delivery channel for a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Email,
}

impl Channel {
    /// Pick the channel from the recipient format (email vs phone).
    pub fn for_recipient(recipient: &str) -> Self {
        if recipient.contains('@') {
            Channel::Email
        } else {
            Channel::Sms
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "sms",
            Channel::Email => "email",
        }
    }
}

/// Response of `POST /Services/{sid}/Verifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub sid: String,
    pub service_sid: String,
    pub to: String,
    pub channel: String,
    pub status: String,
    #[serde(default)]
    pub valid: bool,
}

/// Response of `POST /Services/{sid}/VerificationCheck`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub sid: String,
    pub status: String,
    #[serde(default)]
    pub valid: bool,
}

impl VerificationCheck {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}

/// Error body Twilio returns for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<u32>,
    pub message: Option<String>,
    pub more_info: Option<String>,
    pub status: Option<u16>,
}
