use crate::error::VerificationError;

/// Verification events - requests from the form and facts from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationEvent {
    /// User asked for a code to be sent
    SendRequested,

    /// Provider accepted the challenge
    ChallengeIssued,

    /// Bot filter or provider refused to issue a challenge
    SendFailed { reason: VerificationError },

    /// User submitted a code
    CodeSubmitted,

    /// Provider confirmed the code
    CodeConfirmed,

    /// Provider rejected the code
    ConfirmFailed { reason: VerificationError },

    /// Challenge outlived its TTL before a code was confirmed
    ChallengeExpired,

    /// User asked for a fresh code
    ResendRequested,

    /// Session is being discarded (teardown or phone number change)
    Reset,
}
