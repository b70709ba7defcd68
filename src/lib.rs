pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::ankiconnect::AnkiConnectClient;
pub use crate::adapters::preset_store::{FileSlot, PresetStore};
pub use crate::config::CliConfig;
pub use crate::core::submit::{list_destinations, submit_card, SubmissionWorkflow};
pub use crate::domain::model::{
    CardPreview, CardSubmission, ConfirmDecision, DeckPreset, SubmissionOutcome,
};
pub use crate::utils::error::{CourierError, Result};
