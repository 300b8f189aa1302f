// Collaborator contracts for the verification flow.
//
// These are INFRASTRUCTURE traits only. Implementations speak their own
// provider vocabulary; translation into VerificationError happens in classify.rs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Handles
// =============================================================================

/// Opaque reference to a pending challenge issued by a [`ChallengeProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeHandle(String);

impl ChallengeHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a rendered bot-filter widget. Doubles as the
/// proof-of-humanity token handed to the challenge provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetHandle(String);

impl WidgetHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Challenge Provider (Infrastructure - SMS/OTP)
// =============================================================================

/// Error returned by a challenge provider, carrying its own error code
/// (e.g. `auth/invalid-phone-number`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ChallengeProvider: Send + Sync {
    /// Send a one-time code to `full_phone_number` (`+<country><digits>`).
    async fn issue_challenge(
        &self,
        full_phone_number: &str,
        human_proof: &WidgetHandle,
    ) -> Result<ChallengeHandle, ProviderError>;

    /// Confirm `code` against a previously issued challenge.
    async fn confirm_challenge(
        &self,
        handle: &ChallengeHandle,
        code: &str,
    ) -> Result<(), ProviderError>;
}

// =============================================================================
// Bot Filter (Infrastructure - human verification widget)
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BotFilterError {
    /// Rendering failed. `partial` is set when a widget was created before the
    /// failure and still has to be disposed.
    #[error("bot filter render failed: {message}")]
    Render {
        message: String,
        partial: Option<WidgetHandle>,
    },

    #[error("bot filter dispose failed: {message}")]
    Dispose { message: String },
}

#[async_trait]
pub trait BotFilter: Send + Sync {
    /// Render a widget into `container`; resolves once it is ready.
    async fn render(
        &self,
        container: &str,
        options: RenderOptions,
    ) -> Result<WidgetHandle, BotFilterError>;

    /// Release a widget. Synchronous so it can run from `Drop`.
    fn dispose(&self, handle: WidgetHandle) -> Result<(), BotFilterError>;
}
