//! Integration tests for the form facade.
//!
//! These tests drive complete forms the way a host would, covering:
//! 1. Field dirty tracking and reset
//! 2. Dynamic list structure and positional dirtiness
//! 3. Validation ordering and gating
//! 4. The submit pipeline, including concurrent submissions
//! 5. Change notifications

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use reform_rs_core::{ReformResult, SETTINGS};
use reform_rs_forms::list::ListAction;
use reform_rs_forms::validation::ValidationDictionary;
use reform_rs_forms::validators::{matches, not_empty, unique_in_list};
use reform_rs_forms::{
    DynamicList, Field, FieldBag, Form, FormError, FormEvent, Item, SubmitOutcome, Validates,
};
use reform_rs_test::assertions::{
    assert_clean, assert_dirty, assert_field_error, assert_submit_error_paths,
};
use reform_rs_test::{CallCounter, GatedHandler, RecordingHandler};

// ============================================================================
// Shared helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Card {
    card_number: String,
    cvv: String,
}

#[derive(Debug, Deserialize)]
struct Checkout {
    title: String,
    cards: Vec<Card>,
}

fn card(number: &str, cvv: &str) -> Item {
    json!({"cardNumber": number, "cvv": cvv})
        .as_object()
        .unwrap()
        .clone()
}

fn card_list() -> DynamicList {
    DynamicList::new(vec![card("4242", "422")], || card("", "")).with_validation(
        ValidationDictionary::from([
            (
                "cardNumber".to_string(),
                Validates::from(vec![
                    not_empty("Card number is required"),
                    unique_in_list("cardNumber", "Card already added"),
                ]),
            ),
            (
                "cvv".to_string(),
                matches(r"^\d{3,4}$", "CVV must be 3 or 4 digits").unwrap().into(),
            ),
        ]),
    )
}

fn checkout(handler: impl reform_rs_forms::SubmitHandler + 'static) -> Form {
    Form::builder("checkout")
        .field(
            "title",
            Field::new("A").with_validation(not_empty("Title is required")),
        )
        .dynamic_list("cards", card_list())
        .on_submit(handler)
        .build()
}

// ============================================================================
// 1. Field dirty tracking and reset
// ============================================================================

#[test]
fn test_title_edit_and_reset() {
    let form = checkout(RecordingHandler::new());
    form.change("title", "B").unwrap();
    assert!(form.field("title").unwrap().dirty());
    assert_dirty(&form);

    form.reset();
    let title = form.field("title").unwrap();
    assert_eq!(title.value(), "A");
    assert!(!title.dirty());
    assert!(title.error().is_none());
    assert_clean(&form);
}

#[test]
fn test_change_sequences_ending_at_original_are_clean() {
    let sequences: [&[&str]; 4] = [
        &["A"],
        &["B", "A"],
        &["", "AA", "A"],
        &["B", "C", "D", "E", "A"],
    ];
    for sequence in sequences {
        let form = checkout(RecordingHandler::new());
        for value in sequence {
            form.change("title", *value).unwrap();
        }
        assert_clean(&form);
    }
}

#[test]
fn test_nested_groups_compose() {
    let form = Form::builder("product")
        .fields(
            FieldBag::new().with(
                "variants",
                vec![FieldBag::new().with(
                    "price",
                    FieldBag::new().with("amount", Field::new(10)),
                )],
            ),
        )
        .build();

    form.update(|state| {
        state
            .fields_mut()
            .field_at_mut(&["variants", "0", "price", "amount"])
            .unwrap()
            .on_change(12);
    });
    assert_dirty(&form);
    assert_eq!(form.values()["variants"][0]["price"]["amount"], 12);

    form.make_clean();
    assert_clean(&form);
    assert_eq!(form.values()["variants"][0]["price"]["amount"], 12);
}

// ============================================================================
// 2. Dynamic lists
// ============================================================================

#[test]
fn test_reset_and_reinitialize_restore_length() {
    let action_sequences: Vec<Vec<ListAction>> = vec![
        vec![ListAction::RemoveItem(0)],
        vec![
            ListAction::AddItem {
                items: vec![card("1", "111"), card("2", "222")],
                at: None,
            },
            ListAction::MoveItem { from: 2, to: 0 },
        ],
        vec![
            ListAction::UpdateField {
                index: 0,
                key: "cvv".into(),
                value: json!("999"),
            },
            ListAction::RemoveItem(0),
            ListAction::AddItem {
                items: vec![card("3", "333")],
                at: Some(0),
            },
        ],
    ];

    for actions in action_sequences {
        let mut list = card_list();
        for action in actions.clone() {
            list.base_mut().dispatch(action).unwrap();
        }
        list.reset();
        assert_eq!(list.len(), list.base().state().initial().len());
        assert!(!list.dirty());

        let mut list = card_list();
        for action in actions {
            list.base_mut().dispatch(action).unwrap();
        }
        let fresh = vec![card("5", "555"), card("6", "666")];
        list.base_mut().dispatch(ListAction::Reinitialize(fresh)).unwrap();
        assert_eq!(list.len(), 2);
        assert!(!list.dirty());
    }
}

#[test]
fn test_remove_then_add_is_positional() {
    let initial = vec![card("1", "111"), card("2", "222")];

    let mut list = DynamicList::new(initial.clone(), || card("", ""));
    list.remove_item(0).unwrap();
    list.insert_item(0, initial[0].clone()).unwrap();
    assert_eq!(list.values(), initial);
    assert!(!list.dirty());

    let mut list = DynamicList::new(initial.clone(), || card("", ""));
    list.remove_item(0).unwrap();
    list.insert_item(1, initial[0].clone()).unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.dirty());
}

#[test]
fn test_reordering_identical_items_is_clean() {
    let mut list = DynamicList::new(vec![card("1", "111"), card("1", "111")], || card("", ""));
    list.move_item(0, 1).unwrap();
    assert!(!list.dirty());

    let mut list = DynamicList::new(vec![card("1", "111"), card("2", "222")], || card("", ""));
    list.move_item(0, 1).unwrap();
    assert!(list.dirty());
}

#[test]
fn test_structural_errors_fail_loudly() {
    let form = checkout(RecordingHandler::new());
    assert!(form.list_mut("cards", |l| l.remove_item(3)).unwrap().is_err());
    assert!(form.list_mut("cards", |l| l.move_item(0, 1)).unwrap().is_err());
    assert!(form.list_mut("missing", DynamicList::add_item).is_err());
    assert_eq!(form.read(|s| s.list("cards").unwrap().len()), 1);
}

#[test]
fn test_reconcile_with_host_supplied_items() {
    let form = checkout(RecordingHandler::new());
    form.list_mut("cards", |l| l.base_mut().on_change(0, "cvv", "000"))
        .unwrap()
        .unwrap();

    let changes = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&changes);
    form.events().connect(
        "renderer",
        Arc::new(move |event: &FormEvent| {
            if *event == FormEvent::Changed {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );

    let same = vec![card("4242", "422")];
    assert!(!form.reconcile_list("cards", &same).unwrap());
    assert_eq!(changes.load(Ordering::SeqCst), 0);
    assert_dirty(&form);

    let replaced = vec![card("1111", "111"), card("2222", "222")];
    assert!(form.reconcile_list("cards", &replaced).unwrap());
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert_clean(&form);
    assert_eq!(form.read(|s| s.list("cards").unwrap().len()), 2);

    assert!(form.reconcile_list("missing", &same).is_err());
    assert_eq!(changes.load(Ordering::SeqCst), 1);
}

// ============================================================================
// 3. Validation
// ============================================================================

#[test]
fn test_validation_short_circuits() {
    let first = CallCounter::new();
    let second = CallCounter::new();
    let form = Form::builder("profile")
        .field(
            "name",
            Field::new("Ada").with_validation(vec![first.failing("always"), second.passing()]),
        )
        .build();

    form.blur("name").unwrap();
    form.validate();
    assert_eq!(first.count(), 2);
    assert_eq!(second.count(), 0);
    assert_field_error(&form, "name", Some("always"));
}

#[test]
fn test_list_validators_see_the_whole_list() {
    let form = checkout(RecordingHandler::new());
    form.list_mut("cards", |l: &mut DynamicList| -> ReformResult<()> {
        l.add_item();
        l.base_mut().on_change(1, "cardNumber", "4242")?;
        l.base_mut().on_change(1, "cvv", "12")?;
        l.base_mut().on_blur(1, "cardNumber")
    })
    .unwrap()
    .unwrap();

    let error = form.read(|s| {
        s.list("cards")
            .unwrap()
            .base()
            .field(1, "cardNumber")
            .unwrap()
            .error()
            .map(str::to_string)
    });
    assert_eq!(error.as_deref(), Some("Card already added"));

    let paths: Vec<_> = form
        .validate()
        .iter()
        .filter_map(FormError::field_path)
        .collect();
    assert_eq!(paths, vec!["cards.0.cardNumber", "cards.1.cardNumber", "cards.1.cvv"]);
}

// ============================================================================
// 4. Submit pipeline
// ============================================================================

#[tokio::test]
async fn test_invalid_form_never_reaches_handler() {
    let handler = RecordingHandler::new();
    let form = checkout(handler.clone());
    form.change("title", "").unwrap();

    let outcome = form.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Invalid(ref errors) if errors.len() == 1));
    assert_eq!(handler.call_count(), 0);
    assert_submit_error_paths(&form, &["title"]);
    assert_field_error(&form, "title", Some("Title is required"));
    assert!(!form.submitting());
}

#[tokio::test]
async fn test_handler_receives_typed_values() {
    let handler = RecordingHandler::new();
    let form = checkout(handler.clone());
    form.change("title", "Groceries").unwrap();

    assert_eq!(form.submit().await, SubmitOutcome::Succeeded);
    let values: Checkout = serde_json::from_value(handler.last_values().unwrap()).unwrap();
    assert_eq!(values.title, "Groceries");
    assert_eq!(
        values.cards,
        vec![Card {
            card_number: "4242".into(),
            cvv: "422".into()
        }]
    );

    let typed: Checkout = form.values_as().unwrap();
    assert_eq!(typed.title, "Groceries");
}

#[tokio::test]
async fn test_concurrent_submit_invokes_handler_once() {
    let handler = GatedHandler::new();
    let form = checkout(handler.clone());

    let first = tokio::spawn({
        let form = form.clone();
        async move { form.submit().await }
    });
    handler.entered().await;
    assert!(form.submitting());

    assert_eq!(form.submit().await, SubmitOutcome::Skipped);

    handler.release();
    assert_eq!(first.await.unwrap(), SubmitOutcome::Succeeded);
    assert_eq!(handler.call_count(), 1);
    assert!(!form.submitting());
}

#[tokio::test]
async fn test_joined_submits_invoke_handler_once() {
    let handler = GatedHandler::new();
    let form = checkout(handler.clone());

    let (first, second) = tokio::join!(form.submit(), async {
        let outcome = form.submit().await;
        handler.release();
        outcome
    });
    assert_eq!(first, SubmitOutcome::Succeeded);
    assert_eq!(second, SubmitOutcome::Skipped);
    assert_eq!(handler.call_count(), 1);
}

#[tokio::test]
async fn test_timed_out_submit_does_not_block_the_next() {
    let handler = GatedHandler::new();
    let form = checkout(handler.clone());

    let attempt = tokio::time::timeout(std::time::Duration::from_millis(50), form.submit()).await;
    assert!(attempt.is_err());
    assert!(!form.submitting());

    handler.release();
    assert_eq!(form.submit().await, SubmitOutcome::Succeeded);
    assert_eq!(handler.call_count(), 2);
    assert!(!form.submitting());
}

#[tokio::test]
async fn test_panicking_validator_does_not_block_the_next_submit() {
    let handler = RecordingHandler::new();
    let form = Form::builder("profile")
        .field(
            "name",
            Field::new("boom").with_validation(Validates::simple(|value: &Value| {
                assert_ne!(value, "boom", "validator bug");
                None
            })),
        )
        .on_submit(handler.clone())
        .build();

    let outcome = form.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Failed(ref errors) if errors.len() == 1));
    assert!(!form.submitting());
    assert_eq!(handler.call_count(), 0);

    form.change("name", "Ada").unwrap();
    assert_eq!(form.submit().await, SubmitOutcome::Succeeded);
    assert_eq!(handler.call_count(), 1);
}

#[tokio::test]
async fn test_clean_after_submit() {
    let form = Form::builder("checkout")
        .field("title", Field::new("A"))
        .dynamic_list("cards", card_list())
        .on_submit(RecordingHandler::new())
        .make_clean_after_submit(true)
        .build();

    form.change("title", "B").unwrap();
    form.list_mut("cards", |l| l.base_mut().on_change(0, "cvv", "123"))
        .unwrap()
        .unwrap();
    assert_dirty(&form);

    assert!(form.submit().await.is_success());
    assert_clean(&form);
    assert_eq!(form.field("title").unwrap().value(), "B");
    assert_eq!(form.values()["cards"][0]["cvv"], "123");
}

#[tokio::test]
async fn test_form_stays_dirty_without_clean_after_submit() {
    let form = checkout(RecordingHandler::new());
    form.change("title", "B").unwrap();
    assert!(form.submit().await.is_success());
    assert_dirty(&form);
}

#[tokio::test]
async fn test_failed_submit_propagates_errors() {
    let handler = RecordingHandler::failing(vec![
        FormError::for_field(["cards", "0", "cardNumber"], "Card declined"),
        FormError::for_field(["title"], "Title already used"),
        FormError::new("Payment failed"),
    ]);
    let form = checkout(handler.clone());

    let outcome = form.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Failed(ref errors) if errors.len() == 3));
    assert_submit_error_paths(&form, &["cards.0.cardNumber", "title", ""]);
    assert_field_error(&form, "title", Some("Title already used"));
    let card_error = form.read(|s| {
        s.list("cards")
            .unwrap()
            .base()
            .field(0, "cardNumber")
            .unwrap()
            .error()
            .map(str::to_string)
    });
    assert_eq!(card_error.as_deref(), Some("Card declined"));

    form.reset();
    assert!(form.submit_errors().is_empty());
    assert_field_error(&form, "title", None);
}

#[tokio::test]
async fn test_rejection_becomes_generic_error() {
    let form = checkout(RecordingHandler::rejecting("connection reset"));
    let outcome = form.submit().await;
    let expected = FormError::new(SETTINGS.get().generic_submit_error.clone());
    assert_eq!(outcome, SubmitOutcome::Failed(vec![expected.clone()]));
    assert_eq!(form.submit_errors(), vec![expected]);
    assert!(!form.submitting());
}

#[tokio::test]
async fn test_next_submit_clears_previous_errors() {
    let handler = RecordingHandler::failing(vec![FormError::new("try again")]);
    let form = checkout(handler.clone());
    form.submit().await;
    assert_eq!(form.submit_errors().len(), 1);

    handler.respond_with(Ok(reform_rs_forms::SubmitResult::success()));
    assert!(form.submit().await.is_success());
    assert!(form.submit_errors().is_empty());
}

// ============================================================================
// 5. Change notifications
// ============================================================================

#[tokio::test]
async fn test_events_follow_mutations() {
    let form = checkout(RecordingHandler::new());
    let changes = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let (c, f) = (Arc::clone(&changes), Arc::clone(&finished));
    form.events().connect(
        "host",
        Arc::new(move |event: &FormEvent| match event {
            FormEvent::Changed => {
                c.fetch_add(1, Ordering::SeqCst);
            }
            FormEvent::SubmitFinished(_) => {
                f.fetch_add(1, Ordering::SeqCst);
            }
            FormEvent::SubmitStarted => {}
        }),
    );

    form.change("title", "B").unwrap();
    form.blur("title").unwrap();
    form.list_mut("cards", DynamicList::add_item).unwrap();
    assert_eq!(changes.load(Ordering::SeqCst), 3);

    form.submit().await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(changes.load(Ordering::SeqCst), 4);
}

#[test]
fn test_receivers_may_read_the_form() {
    let form = checkout(RecordingHandler::new());
    let seen = Arc::new(std::sync::Mutex::new(Vec::<Value>::new()));
    let (reader, sink) = (form.clone(), Arc::clone(&seen));
    form.events().connect(
        "reader",
        Arc::new(move |_: &FormEvent| {
            sink.lock().unwrap().push(reader.values()["title"].clone());
        }),
    );

    form.change("title", "B").unwrap();
    form.change("title", "C").unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![json!("B"), json!("C")]);
}
