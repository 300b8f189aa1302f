// Test doubles - mock collaborators for exercising the verification flow
//
// Mocks record every call and return queued responses (or a default success).
// Provider calls can be held open with a gate to test in-flight behavior.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::forms::RecordStore;
use crate::traits::{
    BotFilter, BotFilterError, ChallengeHandle, ChallengeProvider, ProviderError, RenderOptions,
    WidgetHandle,
};

// =============================================================================
// Mock Challenge Provider
// =============================================================================

#[derive(Default)]
pub struct MockChallengeProvider {
    issue_responses: Mutex<VecDeque<Result<ChallengeHandle, ProviderError>>>,
    confirm_responses: Mutex<VecDeque<Result<(), ProviderError>>>,
    issue_calls: Mutex<Vec<(String, WidgetHandle)>>,
    confirm_calls: Mutex<Vec<(ChallengeHandle, String)>>,
    issued: AtomicUsize,
    issue_gate: Option<Arc<Notify>>,
    confirm_gate: Option<Arc<Notify>>,
    issue_started: Notify,
    confirm_started: Notify,
}

impl MockChallengeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next issue call.
    pub fn with_issue_error(self, code: &str) -> Self {
        self.push_issue_error(code);
        self
    }

    /// Same as [`Self::with_issue_error`], for a provider already shared with a flow.
    pub fn push_issue_error(&self, code: &str) {
        self.issue_responses
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::new(code, "mock issue failure")));
    }

    /// Queue a failure for the next confirm call.
    pub fn with_confirm_error(self, code: &str) -> Self {
        self.confirm_responses
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::new(code, "mock confirm failure")));
        self
    }

    /// Issue calls block until [`Self::release_issue`].
    pub fn with_held_issue(mut self) -> Self {
        self.issue_gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Confirm calls block until [`Self::release_confirm`].
    pub fn with_held_confirm(mut self) -> Self {
        self.confirm_gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release_issue(&self) {
        if let Some(gate) = &self.issue_gate {
            gate.notify_one();
        }
    }

    pub fn release_confirm(&self) {
        if let Some(gate) = &self.confirm_gate {
            gate.notify_one();
        }
    }

    /// Resolves once an issue call has reached the provider.
    pub async fn wait_issue_started(&self) {
        self.issue_started.notified().await;
    }

    /// Resolves once a confirm call has reached the provider.
    pub async fn wait_confirm_started(&self) {
        self.confirm_started.notified().await;
    }

    /// Full phone numbers passed to issue, in call order.
    pub fn issue_calls(&self) -> Vec<String> {
        self.issue_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(phone, _)| phone.clone())
            .collect()
    }

    /// Widgets presented as proof of humanity, in call order.
    pub fn proof_tokens(&self) -> Vec<WidgetHandle> {
        self.issue_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, widget)| widget.clone())
            .collect()
    }

    pub fn confirm_calls(&self) -> Vec<(ChallengeHandle, String)> {
        self.confirm_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChallengeProvider for MockChallengeProvider {
    async fn issue_challenge(
        &self,
        full_phone_number: &str,
        human_proof: &WidgetHandle,
    ) -> Result<ChallengeHandle, ProviderError> {
        self.issue_calls
            .lock()
            .unwrap()
            .push((full_phone_number.to_string(), human_proof.clone()));
        self.issue_started.notify_one();

        if let Some(gate) = &self.issue_gate {
            gate.notified().await;
        }

        let queued = self.issue_responses.lock().unwrap().pop_front();
        match queued {
            Some(response) => response,
            None => {
                let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(ChallengeHandle::new(format!("challenge-{n}")))
            }
        }
    }

    async fn confirm_challenge(
        &self,
        handle: &ChallengeHandle,
        code: &str,
    ) -> Result<(), ProviderError> {
        self.confirm_calls
            .lock()
            .unwrap()
            .push((handle.clone(), code.to_string()));
        self.confirm_started.notify_one();

        if let Some(gate) = &self.confirm_gate {
            gate.notified().await;
        }

        let queued = self.confirm_responses.lock().unwrap().pop_front();
        queued.unwrap_or(Ok(()))
    }
}

// =============================================================================
// Mock Bot Filter
// =============================================================================

#[derive(Default)]
pub struct MockBotFilter {
    live: Mutex<HashSet<WidgetHandle>>,
    max_live: AtomicUsize,
    rendered: AtomicUsize,
    render_failures: Mutex<VecDeque<bool>>,
    fail_dispose: AtomicBool,
    render_gate: Option<Arc<Notify>>,
    render_started: Notify,
}

impl MockBotFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next render fails without creating a widget.
    pub fn with_render_failure(self) -> Self {
        self.render_failures.lock().unwrap().push_back(false);
        self
    }

    /// Next render creates a widget, then fails.
    pub fn with_partial_render_failure(self) -> Self {
        self.render_failures.lock().unwrap().push_back(true);
        self
    }

    /// Every dispose call errors (and leaves the widget live).
    pub fn with_failing_dispose(self) -> Self {
        self.fail_dispose.store(true, Ordering::SeqCst);
        self
    }

    /// Render calls block until [`Self::release_render`].
    pub fn with_held_render(mut self) -> Self {
        self.render_gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release_render(&self) {
        if let Some(gate) = &self.render_gate {
            gate.notify_one();
        }
    }

    /// Resolves once a render call has started.
    pub async fn wait_render_started(&self) {
        self.render_started.notified().await;
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    /// Highest number of simultaneously live widgets seen.
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn rendered(&self) -> usize {
        self.rendered.load(Ordering::SeqCst)
    }

    fn create_widget(&self) -> WidgetHandle {
        let n = self.rendered.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = WidgetHandle::new(format!("widget-{n}"));
        let mut live = self.live.lock().unwrap();
        live.insert(handle.clone());
        self.max_live.fetch_max(live.len(), Ordering::SeqCst);
        handle
    }
}

#[async_trait]
impl BotFilter for MockBotFilter {
    async fn render(
        &self,
        _container: &str,
        _options: RenderOptions,
    ) -> Result<WidgetHandle, BotFilterError> {
        self.render_started.notify_one();
        if let Some(gate) = &self.render_gate {
            gate.notified().await;
        }

        let failure = self.render_failures.lock().unwrap().pop_front();
        match failure {
            None => Ok(self.create_widget()),
            Some(partial) => Err(BotFilterError::Render {
                message: "mock render failure".to_string(),
                partial: partial.then(|| self.create_widget()),
            }),
        }
    }

    fn dispose(&self, handle: WidgetHandle) -> Result<(), BotFilterError> {
        if self.fail_dispose.load(Ordering::SeqCst) {
            return Err(BotFilterError::Dispose {
                message: "mock dispose failure".to_string(),
            });
        }
        self.live.lock().unwrap().remove(&handle);
        Ok(())
    }
}

// =============================================================================
// In-memory Record Store
// =============================================================================

#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Vec<(String, String, Value)>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(collection, record)` pairs in insertion order.
    pub fn records(&self) -> Vec<(String, Value)> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(collection, _, record)| (collection.clone(), record.clone()))
            .collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, collection: &str, record: Value) -> anyhow::Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.records
            .lock()
            .unwrap()
            .push((collection.to_string(), id.clone(), record));
        Ok(id)
    }
}
