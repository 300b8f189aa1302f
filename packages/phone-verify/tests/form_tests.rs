//! Form submission gated on phone verification.

use std::sync::Arc;

use phone_verify::testing::{InMemoryRecordStore, MockBotFilter, MockChallengeProvider};
use phone_verify::{FormError, FormGate, FormKind, PhoneVerificationFlow, VerifyConfig};
use serde_json::{json, Map, Value};

fn gate(kind: FormKind, store: Arc<InMemoryRecordStore>) -> FormGate<InMemoryRecordStore> {
    let flow = PhoneVerificationFlow::new(
        Arc::new(MockChallengeProvider::new()),
        Arc::new(MockBotFilter::new()),
        VerifyConfig::default(),
    );
    FormGate::new(kind, flow, store, "91")
}

fn booking_fields() -> Map<String, Value> {
    let Value::Object(fields) = json!({
        "name": "Asha",
        "guests": 4,
        "date": "2026-11-02",
    }) else {
        unreachable!()
    };
    fields
}

#[tokio::test]
async fn unverified_form_is_not_persisted() {
    let store = Arc::new(InMemoryRecordStore::new());
    let form = gate(FormKind::Booking, store.clone());
    form.flow().set_phone_number("9876543210");

    let err = form.submit(booking_fields()).await.unwrap_err();

    assert!(matches!(err, FormError::PhoneNotVerified));
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn verified_form_is_stored_with_qualified_phone() {
    let store = Arc::new(InMemoryRecordStore::new());
    let form = gate(FormKind::Booking, store.clone());
    form.flow().set_phone_number("9876543210");
    form.flow().send_challenge().await.unwrap();
    form.flow().submit_code("123456").await.unwrap();

    let id = form.submit(booking_fields()).await.unwrap();
    assert!(!id.is_empty());

    let records = store.records();
    assert_eq!(records.len(), 1);
    let (collection, record) = &records[0];
    assert_eq!(collection, "bookings");
    assert_eq!(record["formType"], "booking");
    assert_eq!(record["phone"], "+919876543210");
    assert_eq!(record["phoneVerified"], true);
    assert_eq!(record["guests"], 4);
    assert!(record.get("submittedAt").is_some());
}

#[test]
fn each_form_writes_to_its_own_collection() {
    assert_eq!(FormKind::Booking.collection(), "bookings");
    assert_eq!(FormKind::Contact.collection(), "contacts");
    assert_eq!(FormKind::FundApplication.collection(), "applications");
}
