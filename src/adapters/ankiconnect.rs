use crate::domain::model::NoteInfo;
use crate::domain::ports::NoteGateway;
use crate::utils::error::{CourierError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// AnkiConnect 協定版本，所有請求都帶這個值
pub const PROTOCOL_VERSION: u32 = 6;

/// Default AnkiConnect listen address.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8765";

/// Client for the AnkiConnect JSON action protocol.
///
/// Every call goes through [`AnkiConnectClient::invoke`], which performs one
/// `{action, version, params}` exchange. Null results are exceptional at this
/// layer; "no matches" is an empty array, never null.
#[derive(Debug, Clone)]
pub struct AnkiConnectClient {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct ActionRequest<'a> {
    action: &'a str,
    version: u32,
    params: Value,
}

#[derive(Deserialize)]
struct ActionResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// notesInfo 回傳的欄位外型：{"value": ..., "order": ...}，order 不使用
#[derive(Deserialize)]
struct RawField {
    value: String,
}

#[derive(Deserialize)]
struct RawNoteInfo {
    #[serde(rename = "noteId", default)]
    note_id: i64,
    #[serde(rename = "modelName", default)]
    model_name: String,
    #[serde(default)]
    fields: HashMap<String, RawField>,
    #[serde(default)]
    tags: Vec<String>,
}

impl AnkiConnectClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform one protocol exchange and return the raw `result` value.
    ///
    /// Transport failures and non-success HTTP statuses become
    /// `PeerUnavailable`; a non-null `error` field becomes `PeerActionError`.
    /// The result may legitimately be null for a few actions
    /// (`updateNoteFields`); callers that expect a value go through
    /// [`expect_result`].
    pub async fn invoke(&self, action: &str, params: Value) -> Result<Value> {
        let request = ActionRequest {
            action,
            version: PROTOCOL_VERSION,
            params,
        };

        tracing::debug!(action, "invoking AnkiConnect");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| CourierError::PeerUnavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CourierError::PeerUnavailable {
                message: format!("HTTP status {}", status),
            });
        }

        let body: ActionResponse =
            response
                .json()
                .await
                .map_err(|e| CourierError::PeerUnavailable {
                    message: format!("invalid response body: {}", e),
                })?;

        if let Some(error) = body.error {
            return Err(CourierError::PeerActionError { message: error });
        }

        Ok(body.result)
    }
}

/// Reject a null result where the action is expected to produce a value.
fn expect_result(action: &str, value: Value) -> Result<Value> {
    if value.is_null() {
        return Err(CourierError::PeerEmptyResult {
            action: action.to_string(),
        });
    }
    Ok(value)
}

#[async_trait]
impl NoteGateway for AnkiConnectClient {
    async fn version(&self) -> Result<i64> {
        let result = expect_result("version", self.invoke("version", json!({})).await?)?;
        Ok(serde_json::from_value(result)?)
    }

    async fn deck_names_and_ids(&self) -> Result<HashMap<String, i64>> {
        let result = expect_result(
            "deckNamesAndIds",
            self.invoke("deckNamesAndIds", json!({})).await?,
        )?;
        Ok(serde_json::from_value(result)?)
    }

    async fn add_note(
        &self,
        deck_name: &str,
        model_name: &str,
        fields: &HashMap<String, String>,
        tags: &[String],
    ) -> Result<i64> {
        // Anki 自己的重複防護保持開啟
        let params = json!({
            "note": {
                "deckName": deck_name,
                "modelName": model_name,
                "fields": fields,
                "options": { "allowDuplicate": false },
                "tags": tags,
            }
        });
        let result = expect_result("addNote", self.invoke("addNote", params).await?)?;
        Ok(serde_json::from_value(result)?)
    }

    async fn find_notes(&self, query: &str) -> Result<Vec<i64>> {
        let params = json!({ "query": query });
        let result = expect_result("findNotes", self.invoke("findNotes", params).await?)?;
        Ok(serde_json::from_value(result)?)
    }

    async fn notes_info(&self, note_ids: &[i64]) -> Result<Vec<NoteInfo>> {
        let params = json!({ "notes": note_ids });
        let result = expect_result("notesInfo", self.invoke("notesInfo", params).await?)?;
        let raw: Vec<RawNoteInfo> = serde_json::from_value(result)?;
        Ok(raw
            .into_iter()
            .map(|info| NoteInfo {
                note_id: info.note_id,
                model_name: info.model_name,
                fields: info
                    .fields
                    .into_iter()
                    .map(|(name, field)| (name, field.value))
                    .collect(),
                tags: info.tags,
            })
            .collect())
    }

    async fn update_note_fields(
        &self,
        note_id: i64,
        fields: &HashMap<String, String>,
    ) -> Result<()> {
        let params = json!({
            "note": {
                "id": note_id,
                "fields": fields,
            }
        });
        // updateNoteFields 成功時 result 是 null，不走 expect_result
        self.invoke("updateNoteFields", params).await?;
        Ok(())
    }

    async fn model_names(&self) -> Result<Vec<String>> {
        let result = expect_result("modelNames", self.invoke("modelNames", json!({})).await?)?;
        Ok(serde_json::from_value(result)?)
    }

    async fn model_field_names(&self, model_name: &str) -> Result<Vec<String>> {
        let params = json!({ "modelName": model_name });
        let result = expect_result(
            "modelFieldNames",
            self.invoke("modelFieldNames", params).await?,
        )?;
        Ok(serde_json::from_value(result)?)
    }
}
