use anki_courier::domain::model::{CardPreview, ConfirmDecision, DeckPreset};
use anki_courier::domain::ports::Confirmer;
use anki_courier::{
    AnkiConnectClient, CardSubmission, FileSlot, PresetStore, Result, SubmissionOutcome,
    SubmissionWorkflow,
};
use async_trait::async_trait;
use httpmock::prelude::*;
use std::sync::Mutex;
use tempfile::TempDir;

struct ScriptedConfirmer {
    decision: ConfirmDecision,
    seen: Mutex<Option<CardPreview>>,
}

impl ScriptedConfirmer {
    fn new(decision: ConfirmDecision) -> Self {
        Self {
            decision,
            seen: Mutex::new(None),
        }
    }

    fn seen_preview(&self) -> CardPreview {
        self.seen
            .lock()
            .unwrap()
            .clone()
            .expect("confirmer was never reached")
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, preview: &CardPreview) -> Result<ConfirmDecision> {
        *self.seen.lock().unwrap() = Some(preview.clone());
        Ok(self.decision)
    }
}

fn spanish_preset() -> DeckPreset {
    DeckPreset {
        deck_id: 1,
        deck_name: "Spanish::Vocab".to_string(),
        purpose: "Everyday Spanish vocabulary".to_string(),
        model_name: "Basic".to_string(),
        front_guide: "Spanish word or phrase".to_string(),
        back_guide: "English translation".to_string(),
        front_example: "hablar".to_string(),
        back_example: "to speak".to_string(),
    }
}

async fn store_in(temp_dir: &TempDir) -> PresetStore<FileSlot> {
    let store = PresetStore::new(FileSlot::new(temp_dir.path()));
    store.upsert(spanish_preset()).await.unwrap();
    store
}

fn submission(deck_id: i64) -> CardSubmission {
    CardSubmission {
        deck_id,
        front: "hablar".to_string(),
        back: "to speak".to_string(),
        tags: None,
    }
}

fn mock_version(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "version"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": 6, "error": null}));
    })
}

#[tokio::test]
async fn test_approved_submission_creates_note_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir).await;

    let server = MockServer::start();
    mock_version(&server);
    let find_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "findNotes"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": [], "error": null}));
    });
    let add_mock = server.mock(|when, then| {
        when.method(POST).path("/").json_body_partial(
            r#"{
                "action": "addNote",
                "params": {
                    "note": {
                        "deckName": "Spanish::Vocab",
                        "modelName": "Basic",
                        "fields": {"Front": "hablar", "Back": "to speak"},
                        "options": {"allowDuplicate": false}
                    }
                }
            }"#,
        );
        then.status(200)
            .json_body(serde_json::json!({"result": 1496198395707i64, "error": null}));
    });

    let client = AnkiConnectClient::new(server.base_url());
    let confirmer = ScriptedConfirmer::new(ConfirmDecision::CreateNew);
    let workflow = SubmissionWorkflow::new(&client, &store);

    let outcome = workflow.run(&submission(1), &confirmer).await;

    assert_eq!(outcome, SubmissionOutcome::Created(1496198395707));
    find_mock.assert();
    add_mock.assert();

    let preview = confirmer.seen_preview();
    assert_eq!(preview.deck_name, "Spanish::Vocab");
    assert!(preview.duplicates.is_empty());
}

#[tokio::test]
async fn test_update_existing_issues_no_create_call() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir).await;

    let server = MockServer::start();
    mock_version(&server);
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "findNotes"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": [1501], "error": null}));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "notesInfo"}"#);
        then.status(200).json_body(serde_json::json!({
            "result": [{
                "noteId": 1501,
                "modelName": "Basic",
                "tags": [],
                "fields": {"Front": {"value": "hablar", "order": 0}}
            }],
            "error": null
        }));
    });
    let add_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "addNote"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": 999i64, "error": null}));
    });
    let update_mock = server.mock(|when, then| {
        when.method(POST).path("/").json_body_partial(
            r#"{
                "action": "updateNoteFields",
                "params": {"note": {"id": 1501, "fields": {"Front": "hablar", "Back": "to speak"}}}
            }"#,
        );
        then.status(200)
            .json_body(serde_json::json!({"result": null, "error": null}));
    });

    let client = AnkiConnectClient::new(server.base_url());
    let confirmer = ScriptedConfirmer::new(ConfirmDecision::UpdateExisting(1501));
    let workflow = SubmissionWorkflow::new(&client, &store);

    let outcome = workflow.run(&submission(1), &confirmer).await;

    assert_eq!(outcome, SubmissionOutcome::Updated(1501));
    update_mock.assert();
    assert_eq!(add_mock.hits(), 0);

    let preview = confirmer.seen_preview();
    assert_eq!(preview.duplicates.len(), 1);
    assert_eq!(preview.duplicates[0].note_id, 1501);
}

#[tokio::test]
async fn test_unknown_destination_never_reaches_the_peer_with_a_write() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir).await;

    let server = MockServer::start();
    mock_version(&server);
    let write_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "addNote"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": 1i64, "error": null}));
    });

    let client = AnkiConnectClient::new(server.base_url());
    let confirmer = ScriptedConfirmer::new(ConfirmDecision::CreateNew);
    let workflow = SubmissionWorkflow::new(&client, &store);

    let outcome = workflow.run(&submission(42), &confirmer).await;

    match outcome {
        SubmissionOutcome::Rejected(reason) => {
            assert!(reason.contains("unknown destination"), "{}", reason)
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(write_mock.hits(), 0);
}

#[tokio::test]
async fn test_peer_down_rejects_with_startup_guidance() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir).await;

    // 沒有任何服務監聽這個位址
    let client = AnkiConnectClient::new("http://127.0.0.1:9");
    let confirmer = ScriptedConfirmer::new(ConfirmDecision::CreateNew);
    let workflow = SubmissionWorkflow::new(&client, &store);

    let outcome = workflow.run(&submission(1), &confirmer).await;

    match outcome {
        SubmissionOutcome::Rejected(reason) => {
            assert!(reason.contains("peer unavailable"), "{}", reason);
            assert!(reason.contains("AnkiConnect"), "{}", reason);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_duplicate_search_still_reaches_confirmation() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir).await;

    let server = MockServer::start();
    mock_version(&server);
    // findNotes 掛了，但流程必須照常走完
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "findNotes"}"#);
        then.status(500);
    });
    let add_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "addNote"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": 77i64, "error": null}));
    });

    let client = AnkiConnectClient::new(server.base_url());
    let confirmer = ScriptedConfirmer::new(ConfirmDecision::CreateNew);
    let workflow = SubmissionWorkflow::new(&client, &store);

    let outcome = workflow.run(&submission(1), &confirmer).await;

    assert_eq!(outcome, SubmissionOutcome::Created(77));
    add_mock.assert();
    assert!(confirmer.seen_preview().duplicates.is_empty());
}

#[tokio::test]
async fn test_cancellation_leaves_peer_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir).await;

    let server = MockServer::start();
    mock_version(&server);
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "findNotes"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": [], "error": null}));
    });
    let add_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "addNote"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": 1i64, "error": null}));
    });

    let client = AnkiConnectClient::new(server.base_url());
    let confirmer = ScriptedConfirmer::new(ConfirmDecision::Cancel);
    let workflow = SubmissionWorkflow::new(&client, &store);

    let outcome = workflow.run(&submission(1), &confirmer).await;

    assert_eq!(outcome, SubmissionOutcome::Cancelled);
    assert_eq!(add_mock.hits(), 0);
}

#[tokio::test]
async fn test_commit_failure_surfaces_peer_message_verbatim() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir).await;

    let server = MockServer::start();
    mock_version(&server);
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "findNotes"}"#);
        then.status(200)
            .json_body(serde_json::json!({"result": [], "error": null}));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .json_body_partial(r#"{"action": "addNote"}"#);
        then.status(200).json_body(
            serde_json::json!({"result": null, "error": "cannot create note because it is a duplicate"}),
        );
    });

    let client = AnkiConnectClient::new(server.base_url());
    let confirmer = ScriptedConfirmer::new(ConfirmDecision::CreateNew);
    let workflow = SubmissionWorkflow::new(&client, &store);

    let outcome = workflow.run(&submission(1), &confirmer).await;

    match outcome {
        SubmissionOutcome::Rejected(reason) => {
            assert!(reason.contains("duplicate"), "{}", reason);
            assert!(reason.contains("Verify"), "{}", reason);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}
