// Adapters layer: concrete implementations for external systems
// (AnkiConnect HTTP client, preset persistence).

pub mod ankiconnect;
pub mod preset_store;
