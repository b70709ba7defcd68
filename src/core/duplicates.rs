use crate::domain::model::DuplicateCandidate;
use crate::domain::ports::NoteGateway;
use crate::utils::error::{CourierError, Result};

/// Search the destination deck for notes that plausibly match the submitted
/// front content and resolve them to full field detail.
///
/// The query uses the raw, pre-normalization front text; searching for the
/// converted HTML would miss notes typed by hand. Advisory only: any failure
/// degrades to "no duplicates found" instead of aborting the workflow.
pub async fn find_possible_duplicates<G: NoteGateway>(
    gateway: &G,
    deck_name: &str,
    raw_front: &str,
) -> Vec<DuplicateCandidate> {
    match lookup(gateway, deck_name, raw_front).await {
        Ok(candidates) => candidates,
        Err(e) => {
            let absorbed = CourierError::DuplicateCheckFailed {
                message: e.to_string(),
            };
            tracing::warn!(deck = deck_name, "{}; continuing without candidates", absorbed);
            Vec::new()
        }
    }
}

async fn lookup<G: NoteGateway>(
    gateway: &G,
    deck_name: &str,
    raw_front: &str,
) -> Result<Vec<DuplicateCandidate>> {
    let query = build_query(deck_name, raw_front);
    tracing::debug!(query = %query, "searching for duplicates");

    let note_ids = gateway.find_notes(&query).await?;
    if note_ids.is_empty() {
        return Ok(Vec::new());
    }

    // 依 peer 回傳的順序保留候選
    let infos = gateway.notes_info(&note_ids).await?;
    Ok(infos
        .into_iter()
        .map(|info| DuplicateCandidate {
            note_id: info.note_id,
            fields: info.fields,
        })
        .collect())
}

fn build_query(deck_name: &str, raw_front: &str) -> String {
    format!("deck:\"{}\" {}", deck_name, raw_front.trim())
}
