//! Forms that require a verified phone number before they are persisted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::flow::PhoneVerificationFlow;
use crate::phone::{mask, qualify};

/// External document store the forms write to.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a document in `collection`, returning its id.
    async fn create(&self, collection: &str, record: Value) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Booking,
    Contact,
    FundApplication,
}

impl FormKind {
    pub fn collection(&self) -> &'static str {
        match self {
            FormKind::Booking => "bookings",
            FormKind::Contact => "contacts",
            FormKind::FundApplication => "applications",
        }
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("phone number has not been verified")]
    PhoneNotVerified,

    #[error("failed to serialize form record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to store form record: {0}")]
    Store(#[source] anyhow::Error),
}

/// Record written for a submitted form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedRecord {
    pub form_type: FormKind,
    pub phone: String,
    pub phone_verified: bool,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A form instance together with its verification session.
pub struct FormGate<S: RecordStore> {
    kind: FormKind,
    flow: PhoneVerificationFlow,
    store: Arc<S>,
    country_code: String,
}

impl<S: RecordStore> FormGate<S> {
    pub fn new(
        kind: FormKind,
        flow: PhoneVerificationFlow,
        store: Arc<S>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            flow,
            store,
            country_code: country_code.into(),
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn flow(&self) -> &PhoneVerificationFlow {
        &self.flow
    }

    /// Persist the draft; refused until the flow reached `Verified`.
    pub async fn submit(&self, fields: Map<String, Value>) -> Result<String, FormError> {
        let Some(phone) = self.flow.verified_number() else {
            warn!(form = ?self.kind, "Form submitted without a verified phone number");
            return Err(FormError::PhoneNotVerified);
        };

        let record = SubmittedRecord {
            form_type: self.kind,
            phone: qualify(&self.country_code, &phone),
            phone_verified: true,
            submitted_at: Utc::now(),
            fields,
        };
        let value = serde_json::to_value(&record)?;

        let id = self
            .store
            .create(self.kind.collection(), value)
            .await
            .map_err(FormError::Store)?;

        info!(form = ?self.kind, id = %id, "Stored form for {}", mask(&phone));
        Ok(id)
    }
}
