//! Verification state machine.
//!
//! Pure and synchronous: `decide` takes an event, updates the state and
//! returns the IO the caller has to perform. Events that are not allowed in
//! the current state are rejected with the error the user should see, and the
//! state is left untouched.

use serde::{Deserialize, Serialize};

use crate::commands::VerificationCommand;
use crate::error::VerificationError;
use crate::events::VerificationEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum VerificationState {
    #[default]
    Idle,
    Sending,
    AwaitingCode,
    Verifying,
    Verified,
    Failed(VerificationError),
}

impl VerificationState {
    /// A provider call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, VerificationState::Sending | VerificationState::Verifying)
    }

    /// A code can be submitted against the held challenge.
    pub fn accepts_code(&self) -> bool {
        matches!(
            self,
            VerificationState::AwaitingCode
                | VerificationState::Failed(VerificationError::InvalidCode)
        )
    }
}

#[derive(Debug, Default)]
pub struct VerificationMachine {
    state: VerificationState,
}

impl VerificationMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    pub fn decide(
        &mut self,
        event: &VerificationEvent,
    ) -> Result<Option<VerificationCommand>, VerificationError> {
        use VerificationCommand as Cmd;
        use VerificationState as S;

        let (next, command) = match (self.state, event) {
            (_, VerificationEvent::Reset) => (S::Idle, Some(Cmd::ReleaseAll)),

            (S::Verified, _) => return Err(VerificationError::AlreadyVerified),

            // Requests
            (S::Idle | S::Failed(_), VerificationEvent::SendRequested) => {
                (S::Sending, Some(Cmd::IssueChallenge))
            }
            (_, VerificationEvent::SendRequested) => {
                return Err(VerificationError::AlreadyInProgress)
            }

            (state, VerificationEvent::CodeSubmitted) if state.accepts_code() => {
                (S::Verifying, Some(Cmd::ConfirmCode))
            }
            (S::Sending | S::Verifying, VerificationEvent::CodeSubmitted) => {
                return Err(VerificationError::AlreadyInProgress)
            }
            (_, VerificationEvent::CodeSubmitted) => {
                return Err(VerificationError::NoActiveChallenge)
            }

            (S::Sending | S::Verifying, VerificationEvent::ResendRequested) => {
                return Err(VerificationError::AlreadyInProgress)
            }
            (_, VerificationEvent::ResendRequested) => (S::Idle, Some(Cmd::ReleaseAll)),

            (state, VerificationEvent::ChallengeExpired) if state.accepts_code() => (
                S::Failed(VerificationError::CodeExpired),
                Some(Cmd::DiscardChallenge),
            ),
            (_, VerificationEvent::ChallengeExpired) => {
                return Err(VerificationError::NoActiveChallenge)
            }

            // Facts
            (S::Sending, VerificationEvent::ChallengeIssued) => (S::AwaitingCode, None),
            (S::Sending, VerificationEvent::SendFailed { reason }) => {
                (S::Failed(*reason), Some(Cmd::ReleaseBotFilter))
            }
            (S::Verifying, VerificationEvent::CodeConfirmed) => {
                (S::Verified, Some(Cmd::NotifyVerified))
            }
            (S::Verifying, VerificationEvent::ConfirmFailed { reason }) => {
                // Only a wrong code leaves the challenge usable for another try
                let command = match reason {
                    VerificationError::InvalidCode => None,
                    _ => Some(Cmd::DiscardChallenge),
                };
                (S::Failed(*reason), command)
            }

            // A fact with no matching request in flight belongs to a discarded session
            (
                _,
                VerificationEvent::ChallengeIssued
                | VerificationEvent::SendFailed { .. }
                | VerificationEvent::CodeConfirmed
                | VerificationEvent::ConfirmFailed { .. },
            ) => return Err(VerificationError::Cancelled),
        };

        self.state = next;
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(events: &[VerificationEvent]) -> VerificationMachine {
        let mut machine = VerificationMachine::new();
        for event in events {
            machine.decide(event).unwrap();
        }
        machine
    }

    #[test]
    fn send_then_issue_awaits_code() {
        let mut machine = VerificationMachine::new();
        assert_eq!(
            machine.decide(&VerificationEvent::SendRequested),
            Ok(Some(VerificationCommand::IssueChallenge))
        );
        assert_eq!(machine.state(), VerificationState::Sending);

        assert_eq!(machine.decide(&VerificationEvent::ChallengeIssued), Ok(None));
        assert_eq!(machine.state(), VerificationState::AwaitingCode);
    }

    #[test]
    fn duplicate_send_is_rejected_while_in_flight() {
        let mut machine = machine_in(&[VerificationEvent::SendRequested]);
        assert_eq!(
            machine.decide(&VerificationEvent::SendRequested),
            Err(VerificationError::AlreadyInProgress)
        );
        assert_eq!(machine.state(), VerificationState::Sending);

        let mut machine = machine_in(&[
            VerificationEvent::SendRequested,
            VerificationEvent::ChallengeIssued,
        ]);
        assert_eq!(
            machine.decide(&VerificationEvent::SendRequested),
            Err(VerificationError::AlreadyInProgress)
        );
    }

    #[test]
    fn send_failure_releases_widget() {
        let mut machine = machine_in(&[VerificationEvent::SendRequested]);
        let command = machine
            .decide(&VerificationEvent::SendFailed {
                reason: VerificationError::RateLimited,
            })
            .unwrap();

        assert_eq!(command, Some(VerificationCommand::ReleaseBotFilter));
        assert_eq!(
            machine.state(),
            VerificationState::Failed(VerificationError::RateLimited)
        );
    }

    #[test]
    fn invalid_code_keeps_challenge_and_allows_retry() {
        let mut machine = machine_in(&[
            VerificationEvent::SendRequested,
            VerificationEvent::ChallengeIssued,
            VerificationEvent::CodeSubmitted,
        ]);
        let command = machine
            .decide(&VerificationEvent::ConfirmFailed {
                reason: VerificationError::InvalidCode,
            })
            .unwrap();
        assert_eq!(command, None);

        assert_eq!(
            machine.decide(&VerificationEvent::CodeSubmitted),
            Ok(Some(VerificationCommand::ConfirmCode))
        );
    }

    #[test]
    fn expired_code_discards_challenge_and_blocks_submit() {
        let mut machine = machine_in(&[
            VerificationEvent::SendRequested,
            VerificationEvent::ChallengeIssued,
            VerificationEvent::CodeSubmitted,
        ]);
        let command = machine
            .decide(&VerificationEvent::ConfirmFailed {
                reason: VerificationError::CodeExpired,
            })
            .unwrap();
        assert_eq!(command, Some(VerificationCommand::DiscardChallenge));

        assert_eq!(
            machine.decide(&VerificationEvent::CodeSubmitted),
            Err(VerificationError::NoActiveChallenge)
        );
        assert_eq!(
            machine.decide(&VerificationEvent::ResendRequested),
            Ok(Some(VerificationCommand::ReleaseAll))
        );
        assert_eq!(machine.state(), VerificationState::Idle);
    }

    #[test]
    fn verified_is_terminal_until_reset() {
        let mut machine = machine_in(&[
            VerificationEvent::SendRequested,
            VerificationEvent::ChallengeIssued,
            VerificationEvent::CodeSubmitted,
            VerificationEvent::CodeConfirmed,
        ]);
        assert_eq!(machine.state(), VerificationState::Verified);

        for event in [
            VerificationEvent::SendRequested,
            VerificationEvent::CodeSubmitted,
            VerificationEvent::ResendRequested,
        ] {
            assert_eq!(
                machine.decide(&event),
                Err(VerificationError::AlreadyVerified)
            );
        }

        machine.decide(&VerificationEvent::Reset).unwrap();
        assert_eq!(machine.state(), VerificationState::Idle);
    }

    #[test]
    fn stale_facts_are_rejected_without_mutation() {
        let mut machine = VerificationMachine::new();
        assert_eq!(
            machine.decide(&VerificationEvent::ChallengeIssued),
            Err(VerificationError::Cancelled)
        );
        assert_eq!(
            machine.decide(&VerificationEvent::CodeConfirmed),
            Err(VerificationError::Cancelled)
        );
        assert_eq!(machine.state(), VerificationState::Idle);
    }

    #[test]
    fn resend_is_rejected_while_verifying() {
        let mut machine = machine_in(&[
            VerificationEvent::SendRequested,
            VerificationEvent::ChallengeIssued,
            VerificationEvent::CodeSubmitted,
        ]);
        assert_eq!(
            machine.decide(&VerificationEvent::ResendRequested),
            Err(VerificationError::AlreadyInProgress)
        );
        assert_eq!(machine.state(), VerificationState::Verifying);
    }
}
