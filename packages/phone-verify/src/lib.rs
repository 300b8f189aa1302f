//! Phone-number OTP verification for form submissions.
//!
//! A [`PhoneVerificationFlow`] owns one verification session per form:
//! it renders a bot filter, asks a [`ChallengeProvider`] to send a code,
//! confirms the code the user types, and reports `{state, last_error}` back to
//! the form. Forms are only persisted once the flow reached
//! [`VerificationState::Verified`] (see [`forms::FormGate`]).
//!
//! Architecture (machines decide, effects execute):
//!   form → flow operation → `VerificationMachine::decide(event)` → command → provider IO
//!   → fact event fed back into the machine

pub mod adapters;
pub mod classify;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod flow;
pub mod forms;
pub mod machine;
pub mod phone;
pub mod session;
pub mod testing;
pub mod traits;

pub use classify::{classify, ProviderOperation};
pub use config::{BotFilterConfig, VerifyConfig};
pub use error::VerificationError;
pub use flow::PhoneVerificationFlow;
pub use forms::{FormError, FormGate, FormKind, RecordStore};
pub use machine::{VerificationMachine, VerificationState};
pub use phone::normalize_phone_number;
pub use session::{VerificationSession, VerificationSnapshot};
pub use traits::{
    BotFilter, BotFilterError, ChallengeHandle, ChallengeProvider, ProviderError, RenderOptions,
    WidgetHandle,
};
