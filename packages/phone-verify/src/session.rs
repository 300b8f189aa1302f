use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::commands::VerificationCommand;
use crate::error::VerificationError;
use crate::events::VerificationEvent;
use crate::machine::{VerificationMachine, VerificationState};
use crate::traits::{ChallengeHandle, WidgetHandle};

/// What a form renders: current state and the last user-facing error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSnapshot {
    pub phone_number: String,
    pub state: VerificationState,
    pub last_error: Option<String>,
}

/// Handles released by a transition; disposed by the flow outside the session lock.
#[derive(Debug, Default)]
pub(crate) struct Released {
    pub widget: Option<WidgetHandle>,
    pub challenge: Option<ChallengeHandle>,
}

/// One phone-verification attempt, owned by a single form instance.
///
/// Owns at most one bot-filter widget and one challenge at a time.
#[derive(Debug, Default)]
pub struct VerificationSession {
    pub(crate) phone_number: String,
    pub(crate) code: Option<String>,
    pub(crate) last_error: Option<String>,
    pub(crate) challenge: Option<ChallengeHandle>,
    /// Number the current challenge was sent to.
    pub(crate) challenged_number: Option<String>,
    pub(crate) issued_at: Option<Instant>,
    pub(crate) bot_filter: Option<WidgetHandle>,
    pub(crate) verified_number: Option<String>,
    /// Bumped whenever in-flight provider responses must be ignored.
    pub(crate) generation: u64,
    pub(crate) closed: bool,
    machine: VerificationMachine,
}

impl VerificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VerificationState {
        self.machine.state()
    }

    pub fn snapshot(&self) -> VerificationSnapshot {
        VerificationSnapshot {
            phone_number: self.phone_number.clone(),
            state: self.machine.state(),
            last_error: self.last_error.clone(),
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<(), VerificationError> {
        if self.closed {
            Err(VerificationError::SessionClosed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        !self.closed && self.generation == generation
    }

    /// Record a rejection that does not change state.
    pub(crate) fn reject(&mut self, error: VerificationError) -> VerificationError {
        self.last_error = Some(error.user_message().to_string());
        error
    }

    /// Apply an event and take whatever handles the resulting command releases.
    ///
    /// A successful transition clears `last_error`.
    pub(crate) fn apply(
        &mut self,
        event: &VerificationEvent,
    ) -> Result<(Option<VerificationCommand>, Released), VerificationError> {
        let command = self.machine.decide(event)?;
        self.last_error = None;

        let mut released = Released::default();
        match command {
            Some(VerificationCommand::ReleaseBotFilter) => {
                released.widget = self.bot_filter.take();
            }
            Some(VerificationCommand::DiscardChallenge) => {
                released.challenge = self.take_challenge();
            }
            // A new challenge replaces whatever the last attempt left behind
            Some(VerificationCommand::ReleaseAll)
            | Some(VerificationCommand::NotifyVerified)
            | Some(VerificationCommand::IssueChallenge) => {
                released.widget = self.bot_filter.take();
                released.challenge = self.take_challenge();
            }
            Some(VerificationCommand::ConfirmCode) | None => {}
        }

        match event {
            VerificationEvent::SendFailed { reason } | VerificationEvent::ConfirmFailed { reason } => {
                self.last_error = Some(reason.user_message().to_string());
                self.code = None;
            }
            VerificationEvent::ChallengeExpired => {
                self.last_error = Some(VerificationError::CodeExpired.user_message().to_string());
                self.code = None;
            }
            _ => {}
        }

        Ok((command, released))
    }

    /// Discard everything tied to the current attempt and start a new generation.
    pub(crate) fn reset(&mut self) -> Released {
        let released = match self.apply(&VerificationEvent::Reset) {
            Ok((_, released)) => released,
            Err(_) => Released::default(),
        };
        self.code = None;
        self.last_error = None;
        self.verified_number = None;
        self.generation += 1;
        released
    }

    fn take_challenge(&mut self) -> Option<ChallengeHandle> {
        self.issued_at = None;
        self.challenged_number = None;
        self.challenge.take()
    }
}
