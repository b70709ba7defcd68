use crate::adapters::preset_store::PresetStore;
use crate::core::{duplicates, markdown};
use crate::domain::model::{
    CardPreview, CardSubmission, ConfirmDecision, DeckPreset, DuplicateCandidate,
    SubmissionOutcome,
};
use crate::domain::ports::{Confirmer, KeyValueSlot, NoteGateway};
use crate::utils::error::{CourierError, Result};
use crate::utils::validation;
use std::collections::HashMap;
use std::fmt;

/// 工作流程的階段，依序執行，僅用於日誌與除錯
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    ConnectingToPeer,
    ResolvingDestination,
    Normalizing,
    CheckingDuplicates,
    AwaitingConfirmation,
    Committing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::ConnectingToPeer => "connecting-to-peer",
            Stage::ResolvingDestination => "resolving-destination",
            Stage::Normalizing => "normalizing",
            Stage::CheckingDuplicates => "checking-duplicates",
            Stage::AwaitingConfirmation => "awaiting-confirmation",
            Stage::Committing => "committing",
        };
        f.write_str(name)
    }
}

/// Everything assembled before the confirmation suspend point.
#[derive(Debug, Clone)]
pub struct PreparedCard {
    pub preset: DeckPreset,
    /// Field name/value pairs with normalized content, in wire order.
    pub fields: Vec<(String, String)>,
    pub tags: Vec<String>,
    pub duplicates: Vec<DuplicateCandidate>,
}

impl PreparedCard {
    pub fn preview(&self) -> CardPreview {
        CardPreview {
            deck_name: self.preset.deck_name.clone(),
            model_name: self.preset.model_name.clone(),
            fields: self.fields.clone(),
            tags: self.tags.clone(),
            duplicates: self.duplicates.clone(),
        }
    }

    fn field_map(&self) -> HashMap<String, String> {
        self.fields.iter().cloned().collect()
    }
}

/// Drives one card submission from raw input to a terminal outcome.
///
/// Stages run strictly in order; every run re-reads the preset store so
/// edits made through the configuration side are picked up, and the store is
/// read once more right before the commit call in case the preset was
/// removed while the confirmation was pending. No call is ever retried.
pub struct SubmissionWorkflow<'a, G: NoteGateway, S: KeyValueSlot> {
    gateway: &'a G,
    presets: &'a PresetStore<S>,
}

impl<'a, G: NoteGateway, S: KeyValueSlot> SubmissionWorkflow<'a, G, S> {
    pub fn new(gateway: &'a G, presets: &'a PresetStore<S>) -> Self {
        Self { gateway, presets }
    }

    /// Run the pre-confirmation stages and assemble the preview.
    ///
    /// This is also the confirmation-prompt generator exposed to the
    /// assistant layer: same input, no mutation, structured preview out.
    pub async fn prepare(&self, submission: &CardSubmission) -> Result<PreparedCard> {
        // 任何 I/O 之前先驗證輸入
        tracing::debug!(stage = %Stage::Validating, deck_id = submission.deck_id, "starting submission");
        validation::validate_positive_id("deck_id", submission.deck_id)?;
        validation::validate_non_empty_string("front", &submission.front)?;
        validation::validate_non_empty_string("back", &submission.back)?;

        tracing::debug!(stage = %Stage::ConnectingToPeer, "probing AnkiConnect");
        self.gateway.version().await?;

        tracing::debug!(stage = %Stage::ResolvingDestination, "loading presets");
        let all = self.presets.get_all().await?;
        if all.is_empty() {
            return Err(CourierError::ConfigurationMissing);
        }
        let preset = all
            .into_iter()
            .find(|preset| preset.deck_id == submission.deck_id)
            .ok_or(CourierError::DestinationUnknown {
                deck_id: submission.deck_id,
            })?;

        tracing::debug!(stage = %Stage::Normalizing, "converting content");
        let front = markdown::normalize(&submission.front);
        let back = markdown::normalize(&submission.back);
        let tags = split_tags(submission.tags.as_deref());

        // 用原始（未轉換）的正面內容搜尋，轉換後的 HTML 會搜不到手打的卡片
        tracing::debug!(stage = %Stage::CheckingDuplicates, deck = %preset.deck_name, "searching peer");
        let duplicates =
            duplicates::find_possible_duplicates(self.gateway, &preset.deck_name, &submission.front)
                .await;

        Ok(PreparedCard {
            preset,
            fields: vec![("Front".to_string(), front), ("Back".to_string(), back)],
            tags,
            duplicates,
        })
    }

    /// Full workflow: prepare, await the human decision, commit.
    pub async fn run<C: Confirmer>(
        &self,
        submission: &CardSubmission,
        confirmer: &C,
    ) -> SubmissionOutcome {
        let prepared = match self.prepare(submission).await {
            Ok(prepared) => prepared,
            Err(e) => return reject(e),
        };

        tracing::debug!(
            stage = %Stage::AwaitingConfirmation,
            candidates = prepared.duplicates.len(),
            "waiting for approval"
        );
        let decision = match confirmer.confirm(&prepared.preview()).await {
            Ok(decision) => decision,
            Err(e) => return reject(e),
        };

        match decision {
            ConfirmDecision::Cancel => {
                tracing::info!("submission cancelled before commit");
                SubmissionOutcome::Cancelled
            }
            ConfirmDecision::CreateNew => self.commit(&prepared, None).await,
            ConfirmDecision::UpdateExisting(note_id) => self.commit(&prepared, Some(note_id)).await,
        }
    }

    async fn commit(&self, prepared: &PreparedCard, update_id: Option<i64>) -> SubmissionOutcome {
        tracing::debug!(stage = %Stage::Committing, update = update_id.is_some(), "committing");

        // 等待確認期間 preset 可能被移除，提交前重新驗證
        match self.presets.find_by_id(prepared.preset.deck_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return reject(CourierError::DestinationUnknown {
                    deck_id: prepared.preset.deck_id,
                })
            }
            Err(e) => return reject(e),
        }

        let fields = prepared.field_map();
        let result = match update_id {
            None => self
                .gateway
                .add_note(
                    &prepared.preset.deck_name,
                    &prepared.preset.model_name,
                    &fields,
                    &prepared.tags,
                )
                .await
                .map(SubmissionOutcome::Created),
            Some(note_id) => self
                .gateway
                .update_note_fields(note_id, &fields)
                .await
                .map(|_| SubmissionOutcome::Updated(note_id)),
        };

        match result {
            Ok(outcome) => {
                tracing::info!("{}", outcome.message());
                outcome
            }
            // 提交失敗原文保留，不自動重試：逾時後重送可能造成重複卡片
            Err(e) => reject(CourierError::CommitFailed {
                message: e.to_string(),
            }),
        }
    }
}

/// Assistant-facing submission operation: run the full workflow and reduce
/// the terminal state to one status string.
pub async fn submit_card<G: NoteGateway, S: KeyValueSlot, C: Confirmer>(
    gateway: &G,
    presets: &PresetStore<S>,
    submission: &CardSubmission,
    confirmer: &C,
) -> String {
    SubmissionWorkflow::new(gateway, presets)
        .run(submission, confirmer)
        .await
        .message()
}

/// Discovery operation: the configured destinations, or a structured error
/// when none exist yet. Reads only the preset store, so it works with Anki
/// closed.
pub async fn list_destinations<S: KeyValueSlot>(
    presets: &PresetStore<S>,
) -> Result<Vec<DeckPreset>> {
    let all = presets.get_all().await?;
    if all.is_empty() {
        return Err(CourierError::ConfigurationMissing);
    }
    Ok(all)
}

fn split_tags(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

fn reject(e: CourierError) -> SubmissionOutcome {
    tracing::warn!("submission rejected: {}", e);
    SubmissionOutcome::Rejected(format!(
        "{}. {}",
        e.user_friendly_message(),
        e.recovery_suggestion()
    ))
}
