use thiserror::Error;

#[derive(Error, Debug)]
pub enum CourierError {
    #[error("AnkiConnect unreachable: {message}")]
    PeerUnavailable { message: String },

    #[error("AnkiConnect action failed: {message}")]
    PeerActionError { message: String },

    #[error("AnkiConnect returned a null result for action '{action}'")]
    PeerEmptyResult { action: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Validation error: {field}: {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Configuration error: {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("No destination decks are configured")]
    ConfigurationMissing,

    #[error("Unknown destination deck id: {deck_id}")]
    DestinationUnknown { deck_id: i64 },

    #[error("Duplicate check failed: {message}")]
    DuplicateCheckFailed { message: String },

    #[error("Commit failed: {message}")]
    CommitFailed { message: String },
}

/// 錯誤分類，用於日誌與統計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Network,
    Peer,
    Processing,
}

/// 錯誤嚴重程度，決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CourierError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CourierError::ValidationError { .. } => ErrorCategory::Validation,
            CourierError::ConfigValidationError { .. }
            | CourierError::ConfigurationMissing
            | CourierError::DestinationUnknown { .. } => ErrorCategory::Configuration,
            CourierError::PeerUnavailable { .. } => ErrorCategory::Network,
            CourierError::PeerActionError { .. }
            | CourierError::PeerEmptyResult { .. }
            | CourierError::DuplicateCheckFailed { .. }
            | CourierError::CommitFailed { .. } => ErrorCategory::Peer,
            CourierError::SerializationError(_) | CourierError::IoError(_) => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 重複檢查失敗只是警告，流程會繼續
            CourierError::DuplicateCheckFailed { .. } => ErrorSeverity::Low,
            CourierError::PeerUnavailable { .. }
            | CourierError::ConfigurationMissing
            | CourierError::DestinationUnknown { .. } => ErrorSeverity::Medium,
            CourierError::ValidationError { .. }
            | CourierError::ConfigValidationError { .. }
            | CourierError::PeerActionError { .. }
            | CourierError::PeerEmptyResult { .. }
            | CourierError::CommitFailed { .. } => ErrorSeverity::High,
            CourierError::SerializationError(_) | CourierError::IoError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 給使用者的修復建議
    pub fn recovery_suggestion(&self) -> String {
        match self {
            CourierError::PeerUnavailable { .. } => {
                "Start Anki and make sure the AnkiConnect add-on is installed and listening, then retry".to_string()
            }
            CourierError::PeerActionError { .. } | CourierError::CommitFailed { .. } => {
                "Verify that the note type and the destination deck still exist in Anki, then retry".to_string()
            }
            CourierError::PeerEmptyResult { .. } => {
                "The AnkiConnect add-on may be outdated; check that it speaks protocol version 6".to_string()
            }
            CourierError::ValidationError { .. } => {
                "Correct the input and submit again".to_string()
            }
            CourierError::ConfigValidationError { .. } => {
                "Fix the configuration value and restart".to_string()
            }
            CourierError::ConfigurationMissing => {
                "Add at least one destination preset with 'anki-courier preset add' before submitting".to_string()
            }
            CourierError::DestinationUnknown { .. } => {
                "Run 'anki-courier decks' to list the configured destinations and retry with one of their ids".to_string()
            }
            CourierError::DuplicateCheckFailed { .. } => {
                "The duplicate search is advisory; the submission can proceed without it".to_string()
            }
            CourierError::SerializationError(_) => {
                "The stored preset data may be corrupt; re-create the presets".to_string()
            }
            CourierError::IoError(_) => "Check file permissions and disk space".to_string(),
        }
    }

    /// 給使用者的簡短錯誤訊息（不含內部細節）
    pub fn user_friendly_message(&self) -> String {
        match self {
            CourierError::PeerUnavailable { .. } => {
                "peer unavailable: Anki is not reachable".to_string()
            }
            CourierError::ConfigurationMissing => {
                "not configured: no destination decks have been set up yet".to_string()
            }
            CourierError::DestinationUnknown { deck_id } => {
                format!("unknown destination: no preset for deck id {}", deck_id)
            }
            CourierError::ValidationError { field, reason } => {
                format!("invalid input: {}: {}", field, reason)
            }
            CourierError::CommitFailed { message } => format!("commit failed: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        let err = CourierError::DuplicateCheckFailed {
            message: "search failed".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);

        let err = CourierError::PeerUnavailable {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_user_friendly_messages_name_the_failure() {
        let err = CourierError::DestinationUnknown { deck_id: 42 };
        assert!(err.user_friendly_message().contains("unknown destination"));
        assert!(err.recovery_suggestion().contains("decks"));

        let err = CourierError::ConfigurationMissing;
        assert!(err.user_friendly_message().contains("not configured"));
    }
}
