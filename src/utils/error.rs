use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid {entity}.{field}: {reason}")]
    ValidationError {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Failed to decode {kind}{}: {message}", line_suffix(.line))]
    DecodeError {
        kind: String,
        line: Option<usize>,
        message: String,
    },

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: String, id: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {})", l)).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Integrity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl MarketError {
    pub fn validation(entity: &str, field: &str, reason: impl Into<String>) -> Self {
        MarketError::ValidationError {
            entity: entity.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::ZipError(_) | MarketError::IoError(_) => ErrorCategory::Io,
            MarketError::CsvError(_)
            | MarketError::SerializationError(_)
            | MarketError::DecodeError { .. }
            | MarketError::ValidationError { .. } => ErrorCategory::Data,
            MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            MarketError::DuplicateId { .. } | MarketError::InvalidTransition { .. } => {
                ErrorCategory::Integrity
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Integrity => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MarketError::IoError(_) => "Check that the file exists and that you have permission to read/write it",
            MarketError::ZipError(_) => "Make sure the output directory is writable and has free space",
            MarketError::CsvError(_) => "Check the exported fields for unsupported characters",
            MarketError::SerializationError(_) | MarketError::DecodeError { .. } => {
                "Check that the input is valid JSON and that status values are spelled correctly"
            }
            MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. } => "Fix the value in the TOML configuration file",
            MarketError::ValidationError { .. } => "Correct the record field and run the check again",
            MarketError::DuplicateId { .. } => "Every record of the same kind needs a distinct id",
            MarketError::InvalidTransition { .. } => "Sold listings cannot change status any more",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarketError::IoError(e) => format!("File access failed: {}", e),
            MarketError::DecodeError { kind, line: Some(line), .. } => {
                format!("Could not read the {} on line {}", kind, line)
            }
            MarketError::DecodeError { kind, .. } => format!("Could not read the {} record", kind),
            MarketError::ValidationError { entity, field, reason } => {
                format!("The {} has an invalid {}: {}", entity, field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_mentions_line() {
        let err = MarketError::DecodeError {
            kind: "message".to_string(),
            line: Some(3),
            message: "expected value".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to decode message (line 3): expected value");
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_severity_by_category() {
        let dup = MarketError::DuplicateId {
            kind: "user".to_string(),
            id: "u1".to_string(),
        };
        assert_eq!(dup.severity(), ErrorSeverity::Medium);

        let io = MarketError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);
    }
}
