use crate::domain::model::DeckPreset;
use crate::domain::ports::KeyValueSlot;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// 預設清單存放的固定 key
pub const PRESET_SLOT_KEY: &str = "deck_presets.json";

/// Persists the ordered preset list as a single JSON blob in one slot.
///
/// Every operation is a read-modify-write of the whole blob; two concurrent
/// writers can overwrite each other's change. Intended use is single-user,
/// single-process, so this non-atomicity is accepted rather than solved.
pub struct PresetStore<S: KeyValueSlot> {
    slot: S,
}

impl<S: KeyValueSlot> PresetStore<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    /// 讀出全部預設；slot 不存在時回傳空清單
    pub async fn get_all(&self) -> Result<Vec<DeckPreset>> {
        match self.slot.get(PRESET_SLOT_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn set_all(&self, presets: &[DeckPreset]) -> Result<()> {
        let raw = serde_json::to_string_pretty(presets)?;
        self.slot.set(PRESET_SLOT_KEY, &raw).await
    }

    pub async fn find_by_id(&self, deck_id: i64) -> Result<Option<DeckPreset>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .find(|preset| preset.deck_id == deck_id))
    }

    /// Replace any preset with the same deck id, then append.
    pub async fn upsert(&self, preset: DeckPreset) -> Result<()> {
        let mut presets = self.get_all().await?;
        presets.retain(|existing| existing.deck_id != preset.deck_id);
        presets.push(preset);
        self.set_all(&presets).await
    }

    /// Returns whether a preset was actually removed.
    pub async fn remove_by_id(&self, deck_id: i64) -> Result<bool> {
        let mut presets = self.get_all().await?;
        let before = presets.len();
        presets.retain(|existing| existing.deck_id != deck_id);
        let removed = presets.len() != before;
        if removed {
            self.set_all(&presets).await?;
        }
        Ok(removed)
    }
}

/// File-backed slot: each key maps to one file under the base directory.
#[derive(Debug, Clone)]
pub struct FileSlot {
    base_path: PathBuf,
}

impl FileSlot {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl KeyValueSlot for FileSlot {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let full_path = Path::new(&self.base_path).join(key);
        match fs::read_to_string(&full_path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(key);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, value)?;
        Ok(())
    }
}
