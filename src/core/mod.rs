pub mod duplicates;
pub mod markdown;
pub mod submit;

pub use crate::domain::model::{
    CardPreview, CardSubmission, ConfirmDecision, DeckPreset, DuplicateCandidate, NoteInfo,
    SubmissionOutcome,
};
pub use crate::domain::ports::{Confirmer, KeyValueSlot, NoteGateway};
pub use crate::utils::error::Result;
pub use submit::{list_destinations, submit_card, PreparedCard, Stage, SubmissionWorkflow};
