//! Phone verification flow.
//!
//! Drives one [`VerificationSession`] through challenge issuance and code
//! confirmation. The session lock is never held across a provider call: the
//! state machine rejects a second request while one is in flight, and every
//! response is checked against the session generation before it is applied,
//! so responses arriving after `teardown` or `resend` are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::classify::{classify, ProviderOperation};
use crate::config::VerifyConfig;
use crate::error::VerificationError;
use crate::events::VerificationEvent;
use crate::machine::VerificationState;
use crate::phone::{is_complete_phone_number, is_valid_code, mask, normalize_phone_number, qualify};
use crate::session::{Released, VerificationSession, VerificationSnapshot};
use crate::traits::{BotFilter, BotFilterError, ChallengeProvider, RenderOptions, WidgetHandle};

/// Invoked with the verified (10-digit) number, exactly once per session.
pub type VerifiedCallback = Box<dyn Fn(&str) + Send + Sync>;

pub struct PhoneVerificationFlow {
    session: Mutex<VerificationSession>,
    provider: Arc<dyn ChallengeProvider>,
    bot_filter: Arc<dyn BotFilter>,
    config: VerifyConfig,
    on_verified: Option<VerifiedCallback>,
    status: watch::Sender<VerificationSnapshot>,
}

impl PhoneVerificationFlow {
    pub fn new(
        provider: Arc<dyn ChallengeProvider>,
        bot_filter: Arc<dyn BotFilter>,
        config: VerifyConfig,
    ) -> Self {
        let session = VerificationSession::new();
        let (status, _) = watch::channel(session.snapshot());
        Self {
            session: Mutex::new(session),
            provider,
            bot_filter,
            config,
            on_verified: None,
            status,
        }
    }

    pub fn with_on_verified(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_verified = Some(Box::new(callback));
        self
    }

    fn session(&self) -> MutexGuard<'_, VerificationSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &VerificationSession) {
        self.status.send_replace(session.snapshot());
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn snapshot(&self) -> VerificationSnapshot {
        self.session().snapshot()
    }

    /// Receives a new snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<VerificationSnapshot> {
        self.status.subscribe()
    }

    pub fn state(&self) -> VerificationState {
        self.session().state()
    }

    pub fn last_error(&self) -> Option<String> {
        self.session().last_error.clone()
    }

    pub fn phone_number(&self) -> String {
        self.session().phone_number.clone()
    }

    /// The number that reached `Verified`, if any.
    pub fn verified_number(&self) -> Option<String> {
        self.session().verified_number.clone()
    }

    pub fn has_bot_filter_handle(&self) -> bool {
        self.session().bot_filter.is_some()
    }

    pub fn has_challenge_handle(&self) -> bool {
        self.session().challenge.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.session().closed
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Store the digits of `raw` (at most 10) and return them.
    ///
    /// Changing the number after it was verified starts a fresh session.
    pub fn set_phone_number(&self, raw: &str) -> String {
        let normalized = normalize_phone_number(raw);
        let released = {
            let mut session = self.session();
            let changed_after_verify = matches!(
                session.verified_number.as_deref(),
                Some(verified) if verified != normalized
            );
            let released = if changed_after_verify {
                info!(
                    "Phone number changed to {} after verification, resetting session",
                    mask(&normalized)
                );
                Some(session.reset())
            } else {
                None
            };
            session.phone_number = normalized.clone();
            self.publish(&session);
            released
        };
        if let Some(released) = released {
            self.release(released);
        }
        normalized
    }

    /// Render a bot filter and ask the provider to send a code.
    pub async fn send_challenge(&self) -> Result<(), VerificationError> {
        let (generation, phone, stale) = {
            let mut session = self.session();
            session.ensure_open()?;
            if !is_complete_phone_number(&session.phone_number) {
                let err = session.reject(VerificationError::InvalidPhoneNumber);
                self.publish(&session);
                return Err(err);
            }
            let stale = match session.apply(&VerificationEvent::SendRequested) {
                Ok((_, released)) => released,
                Err(err) => {
                    let err = session.reject(err);
                    self.publish(&session);
                    return Err(err);
                }
            };
            self.publish(&session);
            (session.generation, session.phone_number.clone(), stale)
        };

        // Never hold two widgets or two challenges at once
        self.release(stale);

        let options = RenderOptions {
            visible: self.config.bot_filter.visible,
        };
        let widget = match self
            .bot_filter
            .render(&self.config.bot_filter.container, options)
            .await
        {
            Ok(widget) => widget,
            Err(err) => {
                warn!("Bot filter render failed: {}", err);
                if let BotFilterError::Render {
                    partial: Some(partial),
                    ..
                } = err
                {
                    self.dispose_widget(partial);
                }
                return self.fail_send(generation, VerificationError::BotFilterInitFailed);
            }
        };

        {
            let mut session = self.session();
            if !session.is_current(generation) {
                drop(session);
                debug!("Session discarded while bot filter rendered, disposing widget");
                self.dispose_widget(widget);
                return Err(VerificationError::Cancelled);
            }
            session.bot_filter = Some(widget.clone());
        }

        let full_number = qualify(&self.config.country_code, &phone);
        debug!("Issuing challenge to {}", mask(&full_number));
        let issued = self.provider.issue_challenge(&full_number, &widget).await;

        match issued {
            Ok(challenge) => {
                let mut session = self.session();
                if !session.is_current(generation) {
                    debug!("Dropping challenge {} issued for a discarded session", challenge);
                    return Err(VerificationError::Cancelled);
                }
                session.challenge = Some(challenge);
                session.challenged_number = Some(phone);
                session.issued_at = Some(Instant::now());
                session.apply(&VerificationEvent::ChallengeIssued)?;
                self.publish(&session);
                info!("Verification code sent to {}", mask(&full_number));
                Ok(())
            }
            Err(err) => {
                let reason = classify(ProviderOperation::Issue, &err.code);
                warn!(code = %err.code, ?reason, "Challenge provider refused to send code: {}", err.message);
                self.fail_send(generation, reason)
            }
        }
    }

    /// Confirm a 6-digit code against the held challenge.
    pub async fn submit_code(&self, code: &str) -> Result<(), VerificationError> {
        let (generation, challenge, code) = {
            let mut session = self.session();
            session.ensure_open()?;
            if !is_valid_code(code) {
                let err = session.reject(VerificationError::InvalidCodeFormat);
                self.publish(&session);
                return Err(err);
            }

            let state = session.state();
            if state.accepts_code() {
                let expired = session
                    .issued_at
                    .map(|issued_at| issued_at.elapsed() >= self.config.challenge_ttl)
                    .unwrap_or(false);
                if expired || session.challenge.is_none() {
                    let (_, released) = session.apply(&VerificationEvent::ChallengeExpired)?;
                    self.publish(&session);
                    drop(session);
                    self.release(released);
                    info!("Challenge expired before a code was confirmed");
                    return Err(VerificationError::CodeExpired);
                }
            }

            if let Err(err) = session.apply(&VerificationEvent::CodeSubmitted) {
                let err = session.reject(err);
                self.publish(&session);
                return Err(err);
            }
            session.code = Some(code.to_string());
            self.publish(&session);

            match (session.challenge.clone(), session.code.clone()) {
                (Some(challenge), Some(code)) => (session.generation, challenge, code),
                // accepts_code() above guarantees a held challenge
                _ => return Err(VerificationError::NoActiveChallenge),
            }
        };

        let confirmed = self.provider.confirm_challenge(&challenge, &code).await;

        let (verified_number, released) = {
            let mut session = self.session();
            if !session.is_current(generation) {
                debug!("Dropping confirmation for a discarded session");
                return Err(VerificationError::Cancelled);
            }
            match confirmed {
                Ok(()) => {
                    let number = session
                        .challenged_number
                        .clone()
                        .unwrap_or_else(|| session.phone_number.clone());
                    let (_, released) = session.apply(&VerificationEvent::CodeConfirmed)?;
                    session.verified_number = Some(number.clone());
                    session.code = None;
                    self.publish(&session);
                    (number, released)
                }
                Err(err) => {
                    let reason = classify(ProviderOperation::Confirm, &err.code);
                    warn!(code = %err.code, ?reason, "Code confirmation failed: {}", err.message);
                    let (_, released) =
                        session.apply(&VerificationEvent::ConfirmFailed { reason })?;
                    self.publish(&session);
                    drop(session);
                    self.release(released);
                    return Err(reason);
                }
            }
        };

        self.release(released);
        info!("Phone number {} verified", mask(&verified_number));
        if let Some(callback) = &self.on_verified {
            callback(&verified_number);
        }
        Ok(())
    }

    /// Discard the current widget and challenge and send a fresh code.
    pub async fn resend(&self) -> Result<(), VerificationError> {
        let released = {
            let mut session = self.session();
            session.ensure_open()?;
            let released = match session.apply(&VerificationEvent::ResendRequested) {
                Ok((_, released)) => released,
                Err(err) => {
                    let err = session.reject(err);
                    self.publish(&session);
                    return Err(err);
                }
            };
            session.code = None;
            session.generation += 1;
            self.publish(&session);
            released
        };

        self.release(released);
        debug!("Resending verification code");
        self.send_challenge().await
    }

    /// Release everything the session holds and close it. Idempotent.
    ///
    /// Also runs on drop. Widget disposal failures are logged, never returned.
    pub fn teardown(&self) {
        let released = {
            let mut session = self.session();
            if session.closed {
                return;
            }
            let released = session.reset();
            session.closed = true;
            self.publish(&session);
            released
        };
        self.release(released);
        debug!("Verification session torn down");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn fail_send(&self, generation: u64, reason: VerificationError) -> Result<(), VerificationError> {
        let released = {
            let mut session = self.session();
            if !session.is_current(generation) {
                return Err(VerificationError::Cancelled);
            }
            let (_, released) = session.apply(&VerificationEvent::SendFailed { reason })?;
            self.publish(&session);
            released
        };
        self.release(released);
        Err(reason)
    }

    fn release(&self, released: Released) {
        if let Some(challenge) = released.challenge {
            debug!("Discarded challenge {}", challenge);
        }
        if let Some(widget) = released.widget {
            self.dispose_widget(widget);
        }
    }

    fn dispose_widget(&self, widget: WidgetHandle) {
        if let Err(err) = self.bot_filter.dispose(widget) {
            warn!("Failed to dispose bot filter widget: {}", err);
        }
    }
}

impl Drop for PhoneVerificationFlow {
    fn drop(&mut self) {
        self.teardown();
    }
}
