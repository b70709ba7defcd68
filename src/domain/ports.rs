use crate::domain::model::{CardPreview, ConfirmDecision, NoteInfo};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Typed surface of the peer's JSON action protocol. One implementation
/// talks to AnkiConnect over loopback HTTP; tests supply their own.
///
/// `add_note` and `update_note_fields` are not idempotent and must never be
/// retried automatically on ambiguous failure.
#[async_trait]
pub trait NoteGateway: Send + Sync {
    /// Protocol liveness probe.
    async fn version(&self) -> Result<i64>;

    async fn deck_names_and_ids(&self) -> Result<HashMap<String, i64>>;

    /// Create a note and return its peer-assigned id. The peer's own
    /// duplicate guard stays engaged (`allowDuplicate: false`).
    async fn add_note(
        &self,
        deck_name: &str,
        model_name: &str,
        fields: &HashMap<String, String>,
        tags: &[String],
    ) -> Result<i64>;

    /// Full-text search returning matching note ids.
    async fn find_notes(&self, query: &str) -> Result<Vec<i64>>;

    /// Batch detail lookup by note id.
    async fn notes_info(&self, note_ids: &[i64]) -> Result<Vec<NoteInfo>>;

    /// Overwrite the fields of a single existing note.
    async fn update_note_fields(
        &self,
        note_id: i64,
        fields: &HashMap<String, String>,
    ) -> Result<()>;

    async fn model_names(&self) -> Result<Vec<String>>;

    async fn model_field_names(&self, model_name: &str) -> Result<Vec<String>>;
}

/// Opaque durable string slot the preset list is serialized into.
pub trait KeyValueSlot: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The human approval suspend point. Implementations block for as long as
/// they like; a caller-imposed timeout must resolve to `Cancel`.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, preview: &CardPreview) -> Result<ConfirmDecision>;
}
